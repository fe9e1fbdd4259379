//! Multi-fetch aggregation and current-status derivation.
//!
//! Slot maps for the same entity arrive from several fetches (one per day
//! fetched, refetched on every refresh). They are merged last-writer-wins into
//! one canonical map, from which the status signals are derived against an
//! explicit reference time.

use chrono::Duration;
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::config::{EngineConfig, GapPolicy, AVAILABILITY_CAP_HOURS};
use crate::intervals::build_blocks;
use crate::models::{AvailabilityBlock, EntitySlots, SlotMap, Timestamp};
use crate::{log_changes, log_debug};

/// Length of an upcoming availability run.
///
/// The display form of `Unbounded` is `">72h"` whatever cap produced it;
/// hosts configuring a different `EngineConfig::availability_cap` format the
/// sentinel themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvailableFor {
    /// The run ends after this long.
    Bounded(Duration),
    /// The run reaches the availability cap; its end is not reported.
    Unbounded,
}

impl AvailableFor {
    /// Classify a run length against the cap.
    pub fn capped(length: Duration, cap: Duration) -> Self {
        if length >= cap {
            Self::Unbounded
        } else {
            Self::Bounded(length)
        }
    }

    /// Run length in hours, rounded to 2 decimal places. `None` when unbounded.
    pub fn hours(&self) -> Option<f64> {
        match self {
            Self::Bounded(d) => Some(round_hours(*d)),
            Self::Unbounded => None,
        }
    }
}

impl fmt::Display for AvailableFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(d) => f.write_str(&format_hours(*d)),
            Self::Unbounded => write!(f, ">{}h", AVAILABILITY_CAP_HOURS),
        }
    }
}

impl Serialize for AvailableFor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Hours in a duration, rounded to 2 decimal places.
pub fn round_hours(d: Duration) -> f64 {
    let hours = d.num_seconds() as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

/// Display form of a duration in hours, e.g. `"7.98h"`.
pub fn format_hours(d: Duration) -> String {
    format!("{:.2}h", round_hours(d))
}

/// Point-in-time status of one entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedStatus {
    pub available_now: bool,
    pub next_available: Option<Timestamp>,
    pub next_available_until: Option<Timestamp>,
    pub available_for: Option<AvailableFor>,
}

impl AggregatedStatus {
    /// Whether the end of the next run is known, or known to lie past the cap.
    ///
    /// An undetermined status means more days need fetching.
    pub fn is_determined(&self) -> bool {
        self.next_available_until.is_some()
            || matches!(self.available_for, Some(AvailableFor::Unbounded))
    }
}

/// Merge slot maps for one entity, later maps overwriting earlier ones.
///
/// Callers order the maps oldest fetch first.
pub fn aggregate<'a, I>(maps: I) -> SlotMap
where
    I: IntoIterator<Item = &'a SlotMap>,
{
    let mut merged = SlotMap::new();
    for map in maps {
        merged.overlay(map);
    }
    merged
}

/// Derive the status signals of one entity at `now`.
pub fn derive_status(slots: &SlotMap, now: Timestamp, config: &EngineConfig) -> AggregatedStatus {
    let mut status = AggregatedStatus::default();
    let Some(first) = slots.first() else {
        return status;
    };

    // The covering slot, or the first one when `now` precedes every sample
    status.available_now = slots.slot_at_or_before(now).unwrap_or(first).1;

    let Some((start, _)) = slots.iter_from(now).find(|(_, available)| *available) else {
        log_debug!(config.verbosity, "no available slot at or after {}", now);
        return status;
    };
    status.next_available = Some(start);

    let mut last_available = start;
    for (ts, available) in slots.iter_from(start).skip(1) {
        // Under the breaking policy a missing key ends the run after the last sample's span
        let gap_end = last_available + config.slot;
        let gap = config.gap_policy == GapPolicy::Breaking && ts != gap_end;
        let (ts, available) = if gap { (gap_end, false) } else { (ts, available) };

        let elapsed = ts - start;
        if elapsed >= config.availability_cap {
            log_debug!(config.verbosity, "run from {} reached the cap at {}", start, ts);
            status.available_for = Some(AvailableFor::Unbounded);
            return status;
        }
        if !available {
            log_debug!(config.verbosity, "run from {} ends at {}", start, ts);
            status.next_available_until = Some(ts);
            status.available_for = Some(AvailableFor::Bounded(elapsed));
            return status;
        }
        last_available = ts;
    }

    // Samples ran out mid-run
    status.available_for = Some(AvailableFor::Bounded(last_available - start));
    status
}

/// Canonical availability of one named entity after aggregation.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityAvailability {
    pub name: String,
    pub slots: SlotMap,
    pub blocks: Vec<AvailabilityBlock>,
    pub status: AggregatedStatus,
}

/// Aggregate per-fetch entity lists (oldest fetch first) into one entry per entity.
///
/// Entities keep the order in which they were first seen.
pub fn aggregate_entities(
    fetches: &[Vec<EntitySlots>],
    now: Timestamp,
    config: &EngineConfig,
) -> Vec<EntityAvailability> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut grouped: Vec<(&str, Vec<&SlotMap>)> = Vec::new();

    for fetch in fetches {
        for entity in fetch {
            let idx = *index.entry(entity.name.as_str()).or_insert_with(|| {
                grouped.push((entity.name.as_str(), Vec::new()));
                grouped.len() - 1
            });
            grouped[idx].1.push(&entity.slots);
        }
    }

    let result: Vec<EntityAvailability> = grouped
        .into_iter()
        .map(|(name, maps)| {
            let slots = aggregate(maps);
            let blocks = build_blocks(&slots, config);
            let status = derive_status(&slots, now, config);
            EntityAvailability {
                name: name.to_string(),
                slots,
                blocks,
                status,
            }
        })
        .collect();

    log_changes!(
        config.verbosity,
        "aggregated {} fetch(es) into {} entities",
        fetches.len(),
        result.len()
    );
    result
}

/// Names of entities whose next run end is still unknown.
pub fn undetermined_entities(entities: &[EntityAvailability]) -> Vec<&str> {
    entities
        .iter()
        .filter(|e| !e.status.is_determined())
        .map(|e| e.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn t(day: u32, hour: u32, min: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn slots(entries: &[(&str, bool)]) -> SlotMap {
        SlotMap::try_from_raw(entries.iter().copied()).unwrap()
    }

    /// Contiguous run of `n` slots from `start`, all with the same flag.
    fn run(start: Timestamp, n: i64, available: bool) -> Vec<(Timestamp, bool)> {
        (0..n)
            .map(|i| (start + Duration::minutes(15 * i), available))
            .collect()
    }

    #[test]
    fn test_aggregate_later_fetch_wins() {
        let older = slots(&[("01/01/2025 0800", true), ("01/01/2025 0815", true)]);
        let newer = slots(&[("01/01/2025 0815", false), ("01/01/2025 0830", true)]);

        let merged = aggregate([&older, &newer]);
        assert_eq!(merged.get(&t(1, 8, 0)), Some(true));
        assert_eq!(merged.get(&t(1, 8, 15)), Some(false));
        assert_eq!(merged.get(&t(1, 8, 30)), Some(true));

        let reversed = aggregate([&newer, &older]);
        assert_eq!(reversed.get(&t(1, 8, 15)), Some(true));
    }

    #[test]
    fn test_aggregate_empty_input() {
        assert!(aggregate(std::iter::empty::<&SlotMap>()).is_empty());
    }

    #[test]
    fn test_status_empty_slots() {
        let status = derive_status(&SlotMap::new(), t(1, 8, 0), &EngineConfig::default());
        assert_eq!(status, AggregatedStatus::default());
        assert!(!status.is_determined());
    }

    #[test]
    fn test_status_available_now_with_bounded_run() {
        let map = slots(&[
            ("01/01/2025 0800", true),
            ("01/01/2025 0815", true),
            ("01/01/2025 0830", false),
        ]);
        let status = derive_status(&map, t(1, 8, 0), &EngineConfig::default());
        assert!(status.available_now);
        assert_eq!(status.next_available, Some(t(1, 8, 0)));
        assert_eq!(status.next_available_until, Some(t(1, 8, 30)));
        assert_eq!(
            status.available_for,
            Some(AvailableFor::Bounded(Duration::minutes(30)))
        );
        assert!(status.is_determined());
    }

    #[test]
    fn test_status_mid_slot_uses_covering_slot() {
        let map = slots(&[
            ("01/01/2025 0800", true),
            ("01/01/2025 0815", false),
            ("01/01/2025 0830", true),
            ("01/01/2025 0845", false),
        ]);
        let status = derive_status(&map, t(1, 8, 10), &EngineConfig::default());
        assert!(status.available_now);
        assert_eq!(status.next_available, Some(t(1, 8, 30)));
        assert_eq!(status.next_available_until, Some(t(1, 8, 45)));
    }

    #[test]
    fn test_status_now_before_all_samples_uses_first_slot() {
        let map = slots(&[("01/01/2025 0800", false), ("01/01/2025 0815", true)]);
        let status = derive_status(&map, t(1, 6, 0), &EngineConfig::default());
        assert!(!status.available_now);
        assert_eq!(status.next_available, Some(t(1, 8, 15)));
    }

    #[test]
    fn test_status_now_after_all_samples() {
        let map = slots(&[("01/01/2025 0800", true), ("01/01/2025 0815", true)]);
        let status = derive_status(&map, t(3, 0, 0), &EngineConfig::default());
        assert!(status.available_now);
        assert_eq!(status.next_available, None);
        assert_eq!(status.next_available_until, None);
        assert_eq!(status.available_for, None);
    }

    #[test]
    fn test_status_run_reaching_end_of_samples() {
        let map: SlotMap = run(t(1, 8, 0), 5, true).into_iter().collect();
        let status = derive_status(&map, t(1, 8, 0), &EngineConfig::default());
        assert_eq!(status.next_available, Some(t(1, 8, 0)));
        assert_eq!(status.next_available_until, None);
        assert_eq!(
            status.available_for,
            Some(AvailableFor::Bounded(Duration::hours(1)))
        );
        assert!(!status.is_determined());
    }

    #[test]
    fn test_cap_boundary_exactly_72h_is_unbounded() {
        let start = t(1, 0, 0);
        let mut map: SlotMap = run(start, 72 * 4, true).into_iter().collect();
        map.insert(start + Duration::hours(72), false);

        let status = derive_status(&map, start, &EngineConfig::default());
        assert_eq!(status.available_for, Some(AvailableFor::Unbounded));
        assert_eq!(status.next_available_until, None);
        assert!(status.is_determined());
        assert_eq!(status.available_for.unwrap().to_string(), ">72h");
    }

    #[test]
    fn test_cap_boundary_71h59m_is_bounded() {
        let start = t(1, 0, 0);
        let mut map: SlotMap = run(start, 72 * 4, true).into_iter().collect();
        let end = start + Duration::hours(71) + Duration::minutes(59);
        map.insert(end, false);

        let status = derive_status(&map, start, &EngineConfig::default());
        let expected = Duration::hours(71) + Duration::minutes(59);
        assert_eq!(status.available_for, Some(AvailableFor::Bounded(expected)));
        assert_eq!(status.next_available_until, Some(end));
        assert_eq!(status.available_for.unwrap().to_string(), "71.98h");
    }

    #[test]
    fn test_cap_crossed_mid_run_stops_the_walk() {
        let start = t(1, 0, 0);
        let mut map: SlotMap = run(start, 100 * 4, true).into_iter().collect();
        map.insert(start + Duration::hours(100), false);

        let status = derive_status(&map, start, &EngineConfig::default());
        assert_eq!(status.available_for, Some(AvailableFor::Unbounded));
        assert_eq!(status.next_available_until, None);
    }

    #[test]
    fn test_cap_takes_priority_over_end_of_samples() {
        let start = t(1, 0, 0);
        let map: SlotMap = run(start, 73 * 4, true).into_iter().collect();

        let status = derive_status(&map, start, &EngineConfig::default());
        assert_eq!(status.available_for, Some(AvailableFor::Unbounded));
        assert_eq!(status.next_available_until, None);
        assert!(status.is_determined());
    }

    #[test]
    fn test_breaking_policy_ends_run_at_missing_key() {
        let config = EngineConfig {
            gap_policy: GapPolicy::Breaking,
            ..EngineConfig::default()
        };
        let map = slots(&[
            ("01/01/2025 0800", true),
            ("01/01/2025 0900", true),
            ("01/01/2025 0915", false),
        ]);

        let status = derive_status(&map, t(1, 8, 0), &config);
        assert_eq!(status.next_available, Some(t(1, 8, 0)));
        assert_eq!(status.next_available_until, Some(t(1, 8, 15)));
        assert_eq!(
            status.available_for,
            Some(AvailableFor::Bounded(Duration::minutes(15)))
        );

        // Agrees with the blocks built under the same policy
        let blocks = build_blocks(&map, &config);
        assert_eq!(
            crate::intervals::remaining_at(&blocks, t(1, 8, 0), config.availability_cap),
            status.available_for
        );

        // The tolerant default bridges the same gap
        let tolerant = derive_status(&map, t(1, 8, 0), &EngineConfig::default());
        assert_eq!(tolerant.next_available_until, Some(t(1, 9, 15)));
    }

    #[test]
    fn test_breaking_policy_contiguous_run_unchanged() {
        let config = EngineConfig {
            gap_policy: GapPolicy::Breaking,
            ..EngineConfig::default()
        };
        let map = slots(&[
            ("01/01/2025 0800", true),
            ("01/01/2025 0815", true),
            ("01/01/2025 0830", false),
        ]);
        assert_eq!(
            derive_status(&map, t(1, 8, 0), &config),
            derive_status(&map, t(1, 8, 0), &EngineConfig::default())
        );
    }

    #[test]
    fn test_available_for_display_and_hours() {
        let bounded = AvailableFor::Bounded(Duration::minutes(479));
        assert_eq!(bounded.to_string(), "7.98h");
        assert_eq!(bounded.hours(), Some(7.98));
        assert_eq!(AvailableFor::Unbounded.hours(), None);
        assert_eq!(format_hours(Duration::minutes(90)), "1.50h");
    }

    #[test]
    fn test_status_serializes_for_payloads() {
        let map = slots(&[("01/01/2025 0800", true), ("01/01/2025 0830", false)]);
        let status = derive_status(&map, t(1, 8, 0), &EngineConfig::default());
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["available_now"], true);
        assert_eq!(json["available_for"], "0.50h");
        assert_eq!(json["next_available_until"], "2025-01-01T08:30:00");
    }

    #[test]
    fn test_aggregate_entities_groups_by_name() {
        let day1 = vec![
            EntitySlots::new("SMITH, J", slots(&[("01/01/2025 0800", true)])),
            EntitySlots::new("JONES, A", slots(&[("01/01/2025 0800", false)])),
        ];
        let day2 = vec![
            EntitySlots::new(
                "JONES, A",
                slots(&[("01/01/2025 0815", true), ("01/01/2025 0830", false)]),
            ),
            EntitySlots::new(
                "BROWN, K",
                slots(&[("01/01/2025 0800", true), ("01/01/2025 0815", false)]),
            ),
            EntitySlots::new("SMITH, J", slots(&[("01/01/2025 0815", false)])),
        ];

        let result = aggregate_entities(&[day1, day2], t(1, 8, 0), &EngineConfig::default());
        let names: Vec<&str> = result.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["SMITH, J", "JONES, A", "BROWN, K"]);

        let smith = &result[0];
        assert_eq!(smith.slots.len(), 2);
        assert_eq!(smith.blocks.len(), 1);
        assert_eq!(smith.blocks[0].as_pair(), (t(1, 8, 0), t(1, 8, 15)));
        assert!(smith.status.available_now);

        let jones = &result[1];
        assert!(!jones.status.available_now);
        assert_eq!(jones.status.next_available, Some(t(1, 8, 15)));
        assert_eq!(jones.status.next_available_until, Some(t(1, 8, 30)));

        assert!(undetermined_entities(&result).is_empty());
    }

    #[test]
    fn test_undetermined_entities() {
        let fetch = vec![
            EntitySlots::new(
                "OPEN, A",
                slots(&[("01/01/2025 0800", true), ("01/01/2025 0815", true)]),
            ),
            EntitySlots::new(
                "DONE, B",
                slots(&[("01/01/2025 0800", true), ("01/01/2025 0815", false)]),
            ),
            EntitySlots::new("NEVER, C", slots(&[("01/01/2025 0800", false)])),
        ];
        let result = aggregate_entities(&[fetch], t(1, 8, 0), &EngineConfig::default());
        assert_eq!(undetermined_entities(&result), vec!["OPEN, A", "NEVER, C"]);
    }

    fn keyed_map(keys: Vec<(i64, bool)>) -> SlotMap {
        keys.into_iter()
            .map(|(idx, a)| (t(1, 0, 0) + Duration::minutes(15 * idx), a))
            .collect()
    }

    proptest! {
        #[test]
        fn prop_disjoint_maps_aggregate_in_any_order(
            entries in proptest::collection::btree_map(0i64..200, any::<bool>(), 0..80),
            split in any::<proptest::sample::Index>(),
        ) {
            let entries: Vec<(i64, bool)> = entries.into_iter().collect();
            let at = if entries.is_empty() { 0 } else { split.index(entries.len()) };
            let (left, right) = entries.split_at(at);
            let a = keyed_map(left.to_vec());
            let b = keyed_map(right.to_vec());
            prop_assert_eq!(aggregate([&a, &b]), aggregate([&b, &a]));
        }
    }
}
