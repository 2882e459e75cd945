//! Identifiers for blocks and labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a block or a label
///
/// Blocks and labels can be keyed by names or by numbers. Application enums
/// take part by implementing `From<TheirEnum> for Id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier
    Int(i64),
    /// Named identifier
    Name(String),
}

impl Id {
    /// Get the name, if this is a named identifier
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Id::Name(name) => Some(name),
            Id::Int(_) => None,
        }
    }

    /// Get the number, if this is a numeric identifier
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Id::Int(n) => Some(*n),
            Id::Name(_) => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(n) => write!(f, "{}", n),
            Id::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Id::Name(name.to_string())
    }
}

impl From<String> for Id {
    fn from(name: String) -> Self {
        Id::Name(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Id::Name(name.clone())
    }
}

impl From<&Id> for Id {
    fn from(id: &Id) -> Self {
        id.clone()
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Id {
                fn from(n: $t) -> Self {
                    Id::Int(i64::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Id {
    fn from(n: usize) -> Self {
        Id::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Id {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}
