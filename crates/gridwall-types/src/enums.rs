//! Enumeration types shared by the server and the web client.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Rate-limit mode
// ---------------------------------------------------------------------------

/// The rate-limit policy chosen at startup.
///
/// Configuration accepts `cooldown` (or `timed`) and `single_shot`. On the
/// wire the cooldown mode is reported as `timed`, which is what the web
/// client expects from `can_submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RateMode {
    /// A fixed wait between successive accepted submissions per identity.
    #[default]
    #[serde(rename = "timed", alias = "cooldown")]
    Cooldown,
    /// Exactly one accepted submission per identity.
    #[serde(rename = "single_shot")]
    SingleShot,
}

impl RateMode {
    /// The name used in configuration files and log lines.
    pub const fn as_config_str(self) -> &'static str {
        match self {
            Self::Cooldown => "cooldown",
            Self::SingleShot => "single_shot",
        }
    }
}

impl fmt::Display for RateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_config_str())
    }
}

/// Error returned when a string does not name a [`RateMode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rate mode `{0}` (expected `cooldown` or `single_shot`)")]
pub struct ParseRateModeError(pub String);

impl FromStr for RateMode {
    type Err = ParseRateModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cooldown" | "timed" => Ok(Self::Cooldown),
            "single_shot" | "single-shot" | "singleshot" => Ok(Self::SingleShot),
            other => Err(ParseRateModeError(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Rejection codes
// ---------------------------------------------------------------------------

/// Machine-readable reason a submission was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum RejectCode {
    /// `cellIndex` was missing, not an integer, or out of range.
    InvalidIndex,
    /// `char` was missing, not a string, or empty.
    InvalidChar,
    /// The connection's cooldown has not expired or its single shot is spent.
    RateLimited,
}
