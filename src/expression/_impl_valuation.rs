use crate::expression::Valuation;

impl Valuation {
    /// Create an empty `Valuation`.
    pub fn new() -> Valuation {
        Valuation::default()
    }

    /// Set the Boolean value of a node.
    pub fn with_node(mut self, name: &str, value: bool) -> Valuation {
        self.set_node(name, value);
        self
    }

    /// Set the value of a global parameter (`name` is given without the `$` prefix).
    pub fn with_parameter(mut self, name: &str, value: f64) -> Valuation {
        self.set_parameter(name, value);
        self
    }

    /// Set the value of a node attribute (`name` is given without the `@` prefix).
    pub fn with_attribute(mut self, name: &str, value: f64) -> Valuation {
        self.set_attribute(name, value);
        self
    }

    pub fn set_node(&mut self, name: &str, value: bool) {
        self.nodes.insert(name.to_string(), value);
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) {
        self.parameters.insert(name.to_string(), value);
    }

    pub fn set_attribute(&mut self, name: &str, value: f64) {
        self.attributes.insert(name.to_string(), value);
    }

    pub fn get_node(&self, name: &str) -> Option<bool> {
        self.nodes.get(name).copied()
    }

    pub fn get_parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    pub fn get_attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }
}
