//! Core data types for the availability core.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{RotaError, RotaResult};
use crate::log_checks;
use crate::skills::SkillSet;
use crate::slot_key::{format_slot_key, parse_slot_key};

/// Naive local time on the 15-minute grid.
pub type Timestamp = NaiveDateTime;

/// Storage identity of a person or equipment unit.
pub type EntityId = i64;

/// Sampled availability of one entity, keyed by slot start.
///
/// Keys are unique and iteration is always in ascending time order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotMap {
    slots: BTreeMap<Timestamp, bool>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ingestion keys, dropping any key that does not parse.
    pub fn from_raw<I, K>(raw: I, verbosity: u8) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        let mut slots = BTreeMap::new();
        let mut dropped = 0usize;
        for (key, available) in raw {
            match parse_slot_key(key.as_ref()) {
                Ok(ts) => {
                    slots.insert(ts, available);
                }
                Err(_) => {
                    dropped += 1;
                    log_checks!(verbosity, slot = key.as_ref(), "dropping malformed slot key");
                }
            }
        }
        if dropped > 0 {
            log_checks!(verbosity, "dropped {} malformed slot(s), kept {}", dropped, slots.len());
        }
        Self { slots }
    }

    /// Build from ingestion keys, failing on the first key that does not parse.
    pub fn try_from_raw<I, K>(raw: I) -> RotaResult<Self>
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        let slots = raw
            .into_iter()
            .map(|(key, available)| parse_slot_key(key.as_ref()).map(|ts| (ts, available)))
            .collect::<RotaResult<BTreeMap<_, _>>>()?;
        Ok(Self { slots })
    }

    /// Render back into ingestion key form.
    pub fn to_raw(&self) -> BTreeMap<String, bool> {
        self.slots
            .iter()
            .map(|(ts, available)| (format_slot_key(*ts), *available))
            .collect()
    }

    pub fn insert(&mut self, ts: Timestamp, available: bool) -> Option<bool> {
        self.slots.insert(ts, available)
    }

    pub fn get(&self, ts: &Timestamp) -> Option<bool> {
        self.slots.get(ts).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in ascending time order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Timestamp, bool)> + '_ {
        self.slots.iter().map(|(ts, available)| (*ts, *available))
    }

    /// Slots starting at or after `from`, in ascending time order.
    pub fn iter_from(&self, from: Timestamp) -> impl Iterator<Item = (Timestamp, bool)> + '_ {
        self.slots
            .range(from..)
            .map(|(ts, available)| (*ts, *available))
    }

    /// Last slot starting at or before `ts`.
    pub fn slot_at_or_before(&self, ts: Timestamp) -> Option<(Timestamp, bool)> {
        self.slots
            .range(..=ts)
            .next_back()
            .map(|(ts, available)| (*ts, *available))
    }

    pub fn first(&self) -> Option<(Timestamp, bool)> {
        self.slots.first_key_value().map(|(ts, available)| (*ts, *available))
    }

    /// Overwrite this map's entries with `other`'s (last writer wins).
    pub fn overlay(&mut self, other: &SlotMap) {
        self.slots.extend(other.slots.iter().map(|(ts, a)| (*ts, *a)));
    }
}

impl FromIterator<(Timestamp, bool)> for SlotMap {
    fn from_iter<T: IntoIterator<Item = (Timestamp, bool)>>(iter: T) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

/// One maximal run of available time, half-open `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl AvailabilityBlock {
    /// Create a block, rejecting empty or inverted intervals.
    pub fn new(start: Timestamp, end: Timestamp) -> RotaResult<Self> {
        if start >= end {
            return Err(RotaError::InvalidBlock { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `ts` falls inside `[start, end)`.
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts < self.end
    }

    pub fn as_pair(&self) -> (Timestamp, Timestamp) {
        (self.start, self.end)
    }
}

/// A member of crew.
#[derive(Clone, Debug, PartialEq)]
pub struct Personnel {
    pub id: EntityId,
    pub name: String,
    /// Rank code, e.g. "WC", "FFC", "FFT"
    pub role: String,
    pub skills: SkillSet,
    /// Skill tokens outside the known taxonomy; never counted by the rules
    pub unrecognised_skills: Vec<String>,
    /// Contract hours as recorded upstream, e.g. "56" or "42h"
    pub contract_hours: String,
}

impl Personnel {
    /// Create a person from the upstream role code and space-delimited skill list.
    pub fn new(id: EntityId, name: &str, role: &str, skills: &str, contract_hours: &str) -> Self {
        let parsed = SkillSet::parse_lenient(skills);
        Self {
            id,
            name: name.to_string(),
            role: role.trim().to_string(),
            skills: parsed.skills,
            unrecognised_skills: parsed.unrecognised,
            contract_hours: contract_hours.to_string(),
        }
    }
}

/// An equipment unit (appliance).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equipment {
    pub id: EntityId,
    pub name: String,
}

impl Equipment {
    pub fn new(id: EntityId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Anything whose availability is sampled.
#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Personnel(Personnel),
    Equipment(Equipment),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Personnel(p) => p.id,
            Self::Equipment(e) => e.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Personnel(p) => &p.name,
            Self::Equipment(e) => &e.name,
        }
    }
}

/// Slots for one named entity from a single fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntitySlots {
    pub name: String,
    pub slots: SlotMap,
}

impl EntitySlots {
    pub fn new(name: &str, slots: SlotMap) -> Self {
        Self {
            name: name.to_string(),
            slots,
        }
    }
}
