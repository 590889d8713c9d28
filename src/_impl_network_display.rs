use crate::{Network, Node};
use std::fmt::{Display, Error, Formatter};

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        writeln!(f, "Node {} {{", self.get_name())?;
        if let Some(logic) = self.get_logic() {
            writeln!(f, "\tlogic = {logic};")?;
        }
        writeln!(f, "\trate_up = {};", self.rate_up())?;
        writeln!(f, "\trate_down = {};", self.rate_down())?;
        write!(f, "}}")
    }
}

/// The `Display` of a `Network` is the content of its `.bnd` file.
impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        for id in self.nodes() {
            writeln!(f, "{}", self.get_node(id))?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Network {
    /// Write the initial states of all nodes in the `.cfg` syntax.
    pub fn write_istate(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        for id in self.nodes() {
            let [inactive, active] = self.get_istate(id);
            writeln!(
                f,
                "[{}].istate = {}[0], {}[1];",
                self.get_node_name(id),
                inactive,
                active
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Network, Node};

    #[test]
    fn network_to_bnd() {
        let network = Network::new(vec![
            Node::new("A", "!B").unwrap(),
            Node::with_rates("B", None, "A ? 2.0 : 0.0", "1.0").unwrap(),
        ])
        .unwrap();
        let expected = "Node A {\n\
            \tlogic = !B;\n\
            \trate_up = (@logic ? 1.0 : 0.0);\n\
            \trate_down = (@logic ? 0.0 : 1.0);\n\
            }\n\
            \n\
            Node B {\n\
            \trate_up = (A ? 2.0 : 0.0);\n\
            \trate_down = 1.0;\n\
            }\n\
            \n";
        assert_eq!(expected, network.to_string());
    }
}
