//! Target CPU architecture sets
//!
//! An [`AbiSet`] is a set of Android ABI names. The empty set is the
//! distinguished `universal` value: no native code, any architecture.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// ABI names recognised in native library directories
pub const KNOWN_ABIS: &[&str] = &[
    "armeabi",
    "armeabi-v7a",
    "arm64-v8a",
    "x86",
    "x86_64",
    "mips",
    "mips64",
];

/// A set of target architectures
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AbiSet {
    abis: BTreeSet<String>,
}

impl AbiSet {
    /// The universal set (no native code / any architecture)
    pub fn universal() -> Self {
        Self::default()
    }

    pub fn is_universal(&self) -> bool {
        self.abis.is_empty()
    }

    pub fn contains(&self, abi: &str) -> bool {
        self.abis.contains(abi)
    }

    pub fn insert(&mut self, abi: impl Into<String>) {
        self.abis.insert(abi.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.abis.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.abis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abis.is_empty()
    }

    /// Whether `self` holds an architecture the `target` set does not accept.
    ///
    /// A universal target accepts everything.
    pub fn exceeds(&self, target: &AbiSet) -> bool {
        !target.is_universal() && self.abis.iter().any(|abi| !target.contains(abi))
    }

    pub fn union(&self, other: &AbiSet) -> AbiSet {
        Self {
            abis: self.abis.union(&other.abis).cloned().collect(),
        }
    }

    /// Architectures in `self` that the `target` set rejects
    pub fn rejected_by<'a>(&'a self, target: &'a AbiSet) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |abi| !target.is_universal() && !target.contains(abi))
    }
}

impl<S: Into<String>> FromIterator<S> for AbiSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            abis: iter
                .into_iter()
                .map(Into::into)
                .filter(|abi: &String| !abi.is_empty())
                .collect(),
        }
    }
}

impl fmt::Display for AbiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(","))
    }
}

impl FromStr for AbiSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split(',').map(str::trim).collect())
    }
}

// Stored as a comma-separated string so cache records stay flat.
impl Serialize for AbiSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AbiSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.split(',').map(str::trim).collect())
    }
}
