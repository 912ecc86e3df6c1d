use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Evaluability guarantee of a supplier.
///
/// Variants are ordered from least to most committal, so `Determinism::Absent < Determinism::Deterministic`. The
/// classification belongs to the supplier, not to any single call, and is what callers use to decide whether a
/// produced value may be cached, and for how long.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Determinism {
    /// A value can never be produced. Every call fails with the absent condition.
    Absent,

    /// The value may differ between calls. Callers must not cache it.
    NonDeterministic,

    /// The value is stable for the lifetime of the supplier instance, but a different instance may produce a different
    /// value.
    InstanceDeterministic,

    /// The value is permanently stable, and safe to cache forever, including across instances.
    Deterministic,
}

impl Determinism {
    /// Returns `true` if this is [`Determinism::Absent`].
    pub const fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns `true` if a value may be produced.
    pub const fn is_present(self) -> bool {
        !self.is_absent()
    }

    /// Returns `true` if repeated calls on the same instance are guaranteed to yield the same value.
    pub const fn is_deterministic(self) -> bool {
        matches!(self, Self::InstanceDeterministic | Self::Deterministic)
    }

    /// Returns `true` if this is [`Determinism::NonDeterministic`].
    pub const fn is_non_deterministic(self) -> bool {
        matches!(self, Self::NonDeterministic)
    }

    /// Combines two classifications into the classification of a value derived from both.
    ///
    /// A derived value is only as stable as its least stable input, and a value derived from an absent input is itself
    /// absent, so this is the lesser of the two.
    pub fn combine(self, other: Self) -> Self {
        self.min(other)
    }

    /// Returns the cache policy this classification permits.
    pub const fn cache_policy(self) -> CachePolicy {
        match self {
            Self::Absent => CachePolicy::AssumeAbsent,
            Self::NonDeterministic => CachePolicy::Recompute,
            Self::InstanceDeterministic => CachePolicy::CachePerInstance,
            Self::Deterministic => CachePolicy::CacheForever,
        }
    }

    /// Returns the string form of this classification.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::NonDeterministic => "non_deterministic",
            Self::InstanceDeterministic => "instance_deterministic",
            Self::Deterministic => "deterministic",
        }
    }
}

impl fmt::Display for Determinism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown determinism name.
#[derive(Debug, Snafu)]
#[snafu(display("unknown determinism '{}'", name))]
pub struct ParseDeterminismError {
    name: String,
}

impl FromStr for Determinism {
    type Err = ParseDeterminismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absent" => Ok(Self::Absent),
            "non_deterministic" => Ok(Self::NonDeterministic),
            "instance_deterministic" => Ok(Self::InstanceDeterministic),
            "deterministic" => Ok(Self::Deterministic),
            _ => ParseDeterminismSnafu { name: s }.fail(),
        }
    }
}

/// What a caller may do with a value, given the classification of the supplier that produced it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// There is no value to cache, and there never will be.
    AssumeAbsent,

    /// The value must be recomputed on every use.
    Recompute,

    /// The value may be cached for as long as the supplier instance that produced it is alive.
    CachePerInstance,

    /// The value may be cached indefinitely.
    CacheForever,
}
