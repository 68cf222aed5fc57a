use serde::{Deserialize, Serialize};
use std::fmt;

/// Optimistic-concurrency token mirrored from the backend.
///
/// Compared before replaying a last-write-wins update to detect that remote
/// state moved while the operation sat in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Result<Self, String> {
        if value < 0 {
            return Err("Version cannot be negative".to_string());
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}
