use std::fmt;
use std::num::NonZeroU32;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rpc::Value;

/// Remote organization identifier.
pub type OrgId = i64;

/// Ordered measurements of one workload run, in issuance order.
pub type RunResult = Vec<ActionRecord>;

/// Number of back-to-back invocations folded into one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Repeats(NonZeroU32);

impl Repeats {
    pub const ONE: Self = Self(NonZeroU32::MIN);
    /// Repeat count used for list calls and logins.
    pub const DEFAULT: Self = match NonZeroU32::new(10) {
        Some(value) => Self(value),
        None => Self::ONE,
    };

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Repeats {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Repeats {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(ConfigError::InvalidRepeats { value })
    }
}

impl TryFrom<u32> for Repeats {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<Repeats> for u32 {
    fn from(value: Repeats) -> Self {
        value.get()
    }
}

impl From<Repeats> for i64 {
    fn from(value: Repeats) -> Self {
        Self::from(value.get())
    }
}

impl fmt::Display for Repeats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One measured remote call.
///
/// `end` is derived from `start` plus a monotonic elapsed time, so it never
/// precedes `start` even if the wall clock steps backwards mid-call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub method: String,
    pub args: Vec<Value>,
    pub repeats: Repeats,
    pub output_size: u64,
    pub start: SystemTime,
    pub end: SystemTime,
}

impl ActionRecord {
    #[must_use]
    pub fn new(
        method: &str,
        args: Vec<Value>,
        repeats: Repeats,
        output_size: u64,
        start: SystemTime,
        elapsed: Duration,
    ) -> Self {
        Self {
            method: method.to_owned(),
            args,
            repeats,
            output_size,
            start,
            end: start.checked_add(elapsed).unwrap_or(start),
        }
    }

    /// Wall time covering all repeats.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end.duration_since(self.start).unwrap_or_default()
    }

    /// Cost of a single invocation.
    #[must_use]
    pub fn average(&self) -> Duration {
        self.duration()
            .checked_div(self.repeats.get())
            .unwrap_or_default()
    }
}
