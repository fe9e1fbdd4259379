//! Availability core for crew and appliance rota data.
//!
//! Turns sampled 15-minute availability slots into continuous blocks, status
//! signals ("available now", "next available", "available for"), week-bounded
//! hour totals, and the crew readiness verdict that gates appliance dispatch.
//!
//! Every derivation is a pure function of its inputs and an explicit `now`.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod intervals;
pub mod logging;
pub mod models;
pub mod readiness;
pub mod skills;
pub mod slot_key;
pub mod week;

#[cfg(feature = "python")]
mod python;

pub use aggregator::{
    aggregate, aggregate_entities, derive_status, format_hours, undetermined_entities,
    AggregatedStatus, AvailableFor, EntityAvailability,
};
pub use config::{EngineConfig, GapPolicy, ReadinessConfig};
pub use error::{RotaError, RotaResult};
pub use intervals::{block_at, build_blocks, build_blocks_with, remaining_at};
pub use models::{
    AvailabilityBlock, Entity, EntityId, EntitySlots, Equipment, Personnel, SlotMap, Timestamp,
};
pub use readiness::{
    dispatch_verdict, evaluate, DispatchVerdict, ReadinessResult, RuleOutcomes, SkillCounts,
};
pub use skills::{ParsedSkills, SkillSet, SkillTag};
pub use slot_key::{format_slot_key, parse_slot_key};
pub use week::{
    merge_blocks, merge_intervals, parse_contract_hours, week_hours, weekly_stats, WeekHours,
    WeekWindow, WeeklyStats,
};
