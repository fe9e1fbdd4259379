//! Configuration types for the availability core.

use chrono::{Duration, Weekday};
use rustc_hash::FxHashSet;

use crate::logging::VERBOSITY_SILENT;
use crate::models::Equipment;

/// Width of one sampled slot, in minutes.
pub const SLOT_MINUTES: i64 = 15;

/// Availability runs at least this long are reported as unbounded.
pub const AVAILABILITY_CAP_HOURS: i64 = 72;

/// Name of the equipment unit subject to readiness evaluation.
pub const DEFAULT_APPLIANCE_NAME: &str = "P22P6";

/// Role codes that count as senior crew.
pub const DEFAULT_SENIOR_ROLES: [&str; 4] = ["FFC", "CC", "WC", "CM"];

/// How a missing slot key between two sampled slots is treated when building blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GapPolicy {
    /// A missing key carries no signal; blocks stay open across the gap.
    #[default]
    Tolerant,
    /// Any break in slot contiguity closes the open block.
    Breaking,
}

/// Rule-engine configuration for readiness evaluation.
#[derive(Clone, Debug)]
pub struct ReadinessConfig {
    /// Role codes treated as senior (FFC and above).
    pub senior_roles: FxHashSet<String>,
    /// Whether a senior role alone counts towards the TTR total.
    pub senior_counts_as_ttr: bool,
    /// Minimum number of available personnel.
    pub min_crew: usize,
    /// Minimum number of BA wearers who are not TTR-counted.
    pub min_ba_non_ttr: usize,
}

impl ReadinessConfig {
    pub fn is_senior(&self, role: &str) -> bool {
        self.senior_roles.contains(role)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            senior_roles: DEFAULT_SENIOR_ROLES.iter().map(|r| r.to_string()).collect(),
            senior_counts_as_ttr: false,
            min_crew: 4,
            min_ba_non_ttr: 2,
        }
    }
}

/// Configuration shared by every derivation in the core.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Width of one slot
    pub slot: Duration,
    /// Runs reaching this length are reported as `AvailableFor::Unbounded`
    pub availability_cap: Duration,
    /// First day of the accounting week
    pub week_start: Weekday,
    /// Treatment of missing slot keys in block construction
    pub gap_policy: GapPolicy,
    /// Equipment unit whose dispatch depends on crew readiness
    pub appliance_name: String,
    /// Readiness rule configuration
    pub readiness: ReadinessConfig,
    /// Logging verbosity (see `logging`)
    pub verbosity: u8,
}

impl EngineConfig {
    /// Whether this equipment unit is gated by the readiness rules.
    pub fn is_readiness_subject(&self, equipment: &Equipment) -> bool {
        equipment.name == self.appliance_name
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot: Duration::minutes(SLOT_MINUTES),
            availability_cap: Duration::hours(AVAILABILITY_CAP_HOURS),
            week_start: Weekday::Mon,
            gap_policy: GapPolicy::default(),
            appliance_name: DEFAULT_APPLIANCE_NAME.to_string(),
            readiness: ReadinessConfig::default(),
            verbosity: VERBOSITY_SILENT,
        }
    }
}
