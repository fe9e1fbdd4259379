//! Interval union and week-bounded hour accounting.

use chrono::{Datelike, Duration, NaiveTime, Weekday};
use serde::Serialize;

use crate::error::{RotaError, RotaResult};
use crate::models::{AvailabilityBlock, Timestamp};

/// Merge overlapping or touching intervals into a sorted, disjoint list.
pub fn merge_intervals<T: Ord + Copy>(intervals: &[(T, T)]) -> Vec<(T, T)> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|(start, _)| *start);

    let mut merged: Vec<(T, T)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// `merge_intervals` over availability blocks.
pub fn merge_blocks(blocks: &[AvailabilityBlock]) -> Vec<AvailabilityBlock> {
    let pairs: Vec<(Timestamp, Timestamp)> = blocks.iter().map(|b| b.as_pair()).collect();
    merge_intervals(&pairs)
        .into_iter()
        .map(|(start, end)| AvailabilityBlock { start, end })
        .collect()
}

/// Accounting week, both ends inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl WeekWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> RotaResult<Self> {
        if start > end {
            return Err(RotaError::InvalidWeekWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The week containing `now`: `week_start` 00:00:00 to the last day 23:59:59.
    pub fn containing(now: Timestamp, week_start: Weekday) -> Self {
        let days_back = (7 + now.weekday().num_days_from_monday()
            - week_start.num_days_from_monday())
            % 7;
        let start = (now.date() - Duration::days(days_back as i64)).and_time(NaiveTime::MIN);
        Self {
            start,
            end: start + Duration::days(7) - Duration::seconds(1),
        }
    }

    /// Clip an interval to this window, `None` when nothing is left.
    fn clip(&self, start: Timestamp, end: Timestamp) -> Option<(Timestamp, Timestamp)> {
        let clipped = (start.max(self.start), end.min(self.end));
        (clipped.0 < clipped.1).then_some(clipped)
    }
}

/// Planned and achieved hours for one entity in one week.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WeekHours {
    /// Merged availability inside the week
    pub planned: f64,
    /// Portion of `planned` at or before `now`
    pub achieved: f64,
}

/// Weekly totals for one person.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WeeklyStats {
    pub hours_planned: f64,
    pub hours_achieved: f64,
    pub hours_remaining: f64,
}

fn total_hours(intervals: &[(Timestamp, Timestamp)]) -> f64 {
    merge_intervals(intervals)
        .iter()
        .map(|(start, end)| (*end - *start).num_seconds() as f64 / 3600.0)
        .sum()
}

/// Planned and achieved hours of `blocks` inside `window`, as of `now`.
pub fn week_hours(blocks: &[AvailabilityBlock], window: &WeekWindow, now: Timestamp) -> WeekHours {
    let planned: Vec<(Timestamp, Timestamp)> = blocks
        .iter()
        .filter_map(|b| window.clip(b.start, b.end))
        .collect();
    let achieved: Vec<(Timestamp, Timestamp)> = planned
        .iter()
        .filter(|(start, _)| *start < now)
        .map(|(start, end)| (*start, (*end).min(now)))
        .collect();

    WeekHours {
        planned: total_hours(&planned),
        achieved: total_hours(&achieved),
    }
}

/// Weekly totals for one person with the given contract hours string.
pub fn weekly_stats(
    blocks: &[AvailabilityBlock],
    window: &WeekWindow,
    now: Timestamp,
    contract_hours: &str,
) -> WeeklyStats {
    let hours = week_hours(blocks, window, now);
    WeeklyStats {
        hours_planned: hours.planned,
        hours_achieved: hours.achieved,
        hours_remaining: (parse_contract_hours(contract_hours) - hours.achieved).max(0.0),
    }
}

/// Leading number of a contract hours string; 0 when there is none.
pub fn parse_contract_hours(s: &str) -> f64 {
    let token = s.split_whitespace().next().unwrap_or("");
    let numeric: String = token
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric
        .parse::<f64>()
        .ok()
        .filter(|h| h.is_finite())
        .unwrap_or(0.0)
}
