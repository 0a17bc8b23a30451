use std::fmt;
use std::str::FromStr;

use crate::lib::humanize::parse_bytes;

/// Additional memory to reserve on every node, as typed on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryAmount {
    bytes: i64,
    label: String,
}

impl MemoryAmount {
    pub fn new(bytes: i64, label: impl Into<String>) -> Self {
        Self {
            bytes,
            label: label.into(),
        }
    }

    pub fn bytes(&self) -> i64 {
        self.bytes
    }

    /// The text the amount was parsed from, used in column headers
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for MemoryAmount {
    fn default() -> Self {
        Self::new(0, "0")
    }
}

impl fmt::Display for MemoryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl FromStr for MemoryAmount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = parse_bytes(s).map_err(|e| {
            format!(
                "Invalid memory amount: '{}' ({}). Use a size such as 512MiB, 1.5GB or 1073741824",
                s, e
            )
        })?;
        Ok(Self::new(bytes, s.trim()))
    }
}
