//! Error types for the availability core.
//!
//! Most of the core is total: malformed slots are dropped, unparseable contract
//! hours read as zero and an empty crew is simply not ready. The variants here
//! cover inputs that are structurally wrong and must be reported to the caller.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors returned by the strict entry points of the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotaError {
    #[error("Malformed slot key: {0:?} (expected \"DD/MM/YYYY HHMM\")")]
    MalformedSlotKey(String),
    #[error("Invalid block: start {start} is not before end {end}")]
    InvalidBlock {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("Invalid week window: start {start} is after end {end}")]
    InvalidWeekWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("Unknown skill tag: {0}")]
    UnknownSkillTag(String),
}

pub type RotaResult<T> = Result<T, RotaError>;
