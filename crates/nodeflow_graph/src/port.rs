// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Wildcard data type that connects to every other data type.
pub const DATA_TYPE_ANY: &str = "any";

/// Unique identifier for a port.
///
/// Ids are plain strings so hosts can supply their own; [`PortId::new`]
/// generates a random one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(String);

impl PortId {
    /// Create a new random port ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PortId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for PortId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl PortDirection {
    /// The other direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// A port on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Host-defined data type; [`DATA_TYPE_ANY`] matches everything.
    pub data_type: String,
    /// Whether multiple connections may attach to this port
    pub multi_connect: bool,
}

impl Port {
    /// Create a new input port with a random id.
    pub fn input(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Input,
            data_type: data_type.into(),
            multi_connect: false,
        }
    }

    /// Create a new output port with a random id. Outputs fan out by
    /// default.
    pub fn output(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Output,
            data_type: data_type.into(),
            multi_connect: true,
        }
    }

    /// Replace the id with a host-supplied one.
    pub fn with_id(mut self, id: impl Into<PortId>) -> Self {
        self.id = id.into();
        self
    }

    /// Override whether multiple connections may attach.
    pub fn with_multi_connect(mut self, multi_connect: bool) -> Self {
        self.multi_connect = multi_connect;
        self
    }

    /// Whether a connection between this port and `other` is valid:
    /// opposite directions and compatible data types.
    pub fn compatible_with(&self, other: &Port) -> bool {
        if self.direction == other.direction {
            return false;
        }
        data_types_compatible(&self.data_type, &other.data_type)
    }
}

/// Whether two data types may be connected.
pub fn data_types_compatible(a: &str, b: &str) -> bool {
    a == DATA_TYPE_ANY || b == DATA_TYPE_ANY || a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_directions_required() {
        let a = Port::output("out", "float");
        let b = Port::input("in", "float");
        assert!(a.compatible_with(&b));
        assert!(!a.compatible_with(&Port::output("other", "float")));
    }

    #[test]
    fn test_any_matches_everything() {
        let a = Port::output("out", DATA_TYPE_ANY);
        let b = Port::input("in", "texture");
        assert!(a.compatible_with(&b));
        assert!(!Port::output("out", "float").compatible_with(&b));
    }

    #[test]
    fn test_host_supplied_ids_round_trip() {
        let port = Port::input("in", "float").with_id("lhs");
        assert_eq!(port.id.as_str(), "lhs");
        let json = serde_json::to_string(&port.id).unwrap();
        assert_eq!(json, "\"lhs\"");
    }
}
