//! Capability sets: which operations a handler accepts.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use patternfs_core_store::{Error, Operation};

/// A set of [`Operation`]s.
///
/// ```rust
/// use patternfs_pattern_store::Capabilities;
/// use patternfs_core_store::Operation;
///
/// let caps: Capabilities = "read|delete".parse().unwrap();
/// assert!(caps.contains(Operation::Read));
/// assert!(!caps.contains(Operation::Write));
/// assert_eq!(caps, Capabilities::READ | Capabilities::DELETE);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const READ: Capabilities = Capabilities(0b001);
    pub const WRITE: Capabilities = Capabilities(0b010);
    pub const DELETE: Capabilities = Capabilities(0b100);
    pub const ALL: Capabilities = Capabilities(0b111);

    /// The single-operation set for `op`.
    pub const fn of(op: Operation) -> Self {
        match op {
            Operation::Read => Self::READ,
            Operation::Write => Self::WRITE,
            Operation::Delete => Self::DELETE,
        }
    }

    /// Check if `op` is in the set.
    pub fn contains(self, op: Operation) -> bool {
        self.0 & Self::of(op).0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        Capabilities(self.0 | rhs.0)
    }
}

impl From<Operation> for Capabilities {
    fn from(op: Operation) -> Self {
        Self::of(op)
    }
}

impl FromStr for Capabilities {
    type Err = Error;

    /// Parse `|` or `,` separated operation names.
    ///
    /// Accepts `read`/`get`, `write`/`set`, `delete`/`del`, and `*`/`all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut caps = Capabilities::NONE;
        for name in s.split(['|', ',']).map(str::trim).filter(|n| !n.is_empty()) {
            caps = caps
                | match name.to_ascii_lowercase().as_str() {
                    "read" | "get" => Capabilities::READ,
                    "write" | "set" => Capabilities::WRITE,
                    "delete" | "del" => Capabilities::DELETE,
                    "*" | "all" => Capabilities::ALL,
                    other => {
                        return Err(Error::Config {
                            message: format!("unknown operation '{}'", other),
                        })
                    }
                };
        }
        if caps.is_empty() {
            return Err(Error::Config {
                message: format!("no operations in '{}'", s),
            });
        }
        Ok(caps)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [Operation::Read, Operation::Write, Operation::Delete]
            .into_iter()
            .filter(|op| self.contains(*op))
            .map(|op| match op {
                Operation::Read => "read",
                Operation::Write => "write",
                Operation::Delete => "delete",
            })
            .collect();
        write!(f, "{}", names.join("|"))
    }
}
