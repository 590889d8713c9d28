//! Compound state labels reported by the simulator.
//!
//! A compound state is the set of active (observable) nodes, written as node names joined
//! by `" -- "`, e.g. `"Mdm2C -- p53"`. The state where no node is active is reported
//! as `"<nil>"`. The simulator does not guarantee any particular order of the names within
//! a label, so labels should be canonicalized (names sorted) before they are compared.

use crate::{MabossError, ID_REGEX};
use std::collections::HashSet;

/// Label of the state in which no node is active.
pub const NIL_STATE: &str = "<nil>";

/// Separator of node names in a compound state label.
pub const SEPARATOR: &str = " -- ";

/// Split a label into its node names. The `NIL_STATE` has no nodes.
pub fn label_nodes(label: &str) -> Vec<&str> {
    if label == NIL_STATE {
        Vec::new()
    } else {
        label.split(SEPARATOR).collect()
    }
}

/// Sort the node names of a label, so that labels with the same set of active nodes
/// are equal.
pub fn canonicalize(label: &str) -> String {
    if label == NIL_STATE {
        return NIL_STATE.to_string();
    }
    let mut nodes = label_nodes(label);
    nodes.sort_unstable();
    nodes.join(SEPARATOR)
}

/// Build a canonical label from a collection of active node names.
pub fn make_label<S: AsRef<str>>(active: &[S]) -> String {
    if active.is_empty() {
        return NIL_STATE.to_string();
    }
    let mut nodes = active.iter().map(|it| it.as_ref()).collect::<Vec<_>>();
    nodes.sort_unstable();
    nodes.join(SEPARATOR)
}

/// Check that a label is either the `NIL_STATE` or a list of distinct valid node names
/// separated by the `SEPARATOR`.
pub fn check_label(label: &str) -> Result<(), MabossError> {
    if label == NIL_STATE {
        return Ok(());
    }
    if label.is_empty() {
        return Err(MabossError::MalformedExport(
            "Empty state label.".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for node in label.split(SEPARATOR) {
        if !ID_REGEX.is_match(node) {
            return Err(MabossError::MalformedExport(format!(
                "Invalid node `{node}` in state label `{label}`."
            )));
        }
        if !seen.insert(node) {
            return Err(MabossError::MalformedExport(format!(
                "Node `{node}` appears more than once in state label `{label}`."
            )));
        }
    }
    Ok(())
}
