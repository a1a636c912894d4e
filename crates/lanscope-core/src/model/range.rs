use serde::{Deserialize, Serialize};

use crate::matcher::Cidr;

/// A saved, human-labelled address range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRange {
    pub id: String,
    pub name: String,
    /// CIDR expression, e.g. `192.168.1.0/24`.
    pub range: String,
}

impl AddressRange {
    /// The strictly parsed range, or `None` for a malformed expression
    /// saved by another client.
    pub fn cidr(&self) -> Option<Cidr> {
        self.range.parse().ok()
    }
}
