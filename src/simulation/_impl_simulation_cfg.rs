use crate::simulation::{Simulation, NB_MUTABLE};
use std::fmt::{Display, Error, Formatter};

/// The `Display` of a `Simulation` is the content of its `.cfg` file.
///
/// The global constants come first (starting with `$nb_mutable`), followed by the initial
/// states, an empty line, the engine parameters, the `is_internal` flags of all nodes
/// and finally the reference states.
impl Display for Simulation {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        writeln!(f, "${} = {};", NB_MUTABLE, self.mutations.len())?;
        for (name, value) in &self.globals {
            writeln!(f, "${name} = {value};")?;
        }
        self.network.write_istate(f)?;
        writeln!(f)?;
        for (name, value) in &self.parameters {
            writeln!(f, "{name} = {value};")?;
        }
        for id in self.network.nodes() {
            let node = self.network.get_node(id);
            writeln!(
                f,
                "{}.is_internal = {};",
                node.get_name(),
                u8::from(node.is_internal())
            )?;
        }
        for (name, value) in &self.refstate {
            writeln!(f, "{}.refstate = {};", name, u8::from(*value))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::simulation::Simulation;
    use crate::{Network, Node};
    use pretty_assertions::assert_eq;

    #[test]
    fn simulation_to_cfg() {
        let network = Network::new(vec![
            Node::new("A", "!B").unwrap(),
            Node::new("B", "A").unwrap(),
        ])
        .unwrap();
        let mut sim = Simulation::new(network);
        sim.mutate("B", "ON").unwrap();
        sim.update_parameter("$k", 1.5).unwrap();
        sim.update_parameter("max_time", 20.0).unwrap();
        sim.set_istate("A", [0.0, 1.0]).unwrap();
        sim.set_internal("B", true).unwrap();
        sim.set_reference_state("A", true).unwrap();

        let expected = "$nb_mutable = 1;\n\
            $High_B = 1;\n\
            $Low_B = 0;\n\
            $k = 1.5;\n\
            [A].istate = 0[0], 1[1];\n\
            [B].istate = 0.5[0], 0.5[1];\n\
            \n\
            discrete_time = 0;\n\
            display_traj = 0;\n\
            max_time = 20;\n\
            sample_count = 10000;\n\
            seed_pseudorandom = 0;\n\
            statdist_cluster_threshold = 1;\n\
            statdist_similarity_cache_max_size = 20000;\n\
            statdist_traj_count = 0;\n\
            thread_count = 1;\n\
            time_tick = 0.1;\n\
            use_physrandgen = 1;\n\
            A.is_internal = 0;\n\
            B.is_internal = 1;\n\
            A.refstate = 1;\n";
        assert_eq!(expected, sim.to_string());
    }

    #[test]
    fn mutated_network_to_bnd() {
        let network = Network::new(vec![Node::new("A", "A").unwrap()]).unwrap();
        let mut sim = Simulation::new(network);
        sim.mutate("A", "OFF").unwrap();
        let expected = "Node A {\n\
            \tlogic = A;\n\
            \trate_up = ($Low_A ? 0.0 : ($High_A ? (1e308 / 1.0) : (@logic ? 1.0 : 0.0)));\n\
            \trate_down = ($High_A ? 0.0 : ($Low_A ? (1e308 / 1.0) : (@logic ? 0.0 : 1.0)));\n\
            }\n\
            \n";
        assert_eq!(expected, sim.network().to_string());
    }
}
