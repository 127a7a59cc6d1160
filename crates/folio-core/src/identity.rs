//! Identity of the caller on whose behalf a cached view is computed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated principal of the current request.
///
/// Handed explicitly to the memoization layer so that per-user cache keys
/// can be resolved without reaching into ambient request state. An absent
/// principal (`None`) stands for an anonymous caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier (the account's user id).
    pub id: String,
    /// Role name, e.g. `admin` or `reader`.
    pub role: String,
}

impl Principal {
    /// Creates a principal from anything printable.
    pub fn new(id: impl ToString, role: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            role: role.to_string(),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.role)
    }
}
