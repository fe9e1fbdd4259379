//! Slot-to-block conversion and queries over availability blocks.
//!
//! A sampled "available" slot stands for availability across its whole
//! 15-minute span, so a block closes at the start of the first unavailable
//! slot, and a run that is still open when the samples end extends one slot
//! past the last sample.

use chrono::Duration;

use crate::aggregator::AvailableFor;
use crate::config::{EngineConfig, GapPolicy};
use crate::log_debug;
use crate::models::{AvailabilityBlock, SlotMap, Timestamp};
use crate::week::merge_blocks;

/// Convert one entity's slots into sorted, non-overlapping availability blocks.
pub fn build_blocks(slots: &SlotMap, config: &EngineConfig) -> Vec<AvailabilityBlock> {
    build_blocks_with(slots, config.slot, config.gap_policy, config.verbosity)
}

/// `build_blocks` with explicit slot width and gap policy.
pub fn build_blocks_with(
    slots: &SlotMap,
    slot: Duration,
    gap_policy: GapPolicy,
    verbosity: u8,
) -> Vec<AvailabilityBlock> {
    let mut blocks = Vec::new();
    let mut block_start: Option<Timestamp> = None;
    let mut previous: Option<Timestamp> = None;

    for (ts, available) in slots.iter() {
        // A missing key between two samples ends the run at the last sample's span.
        if gap_policy == GapPolicy::Breaking {
            if let (Some(start), Some(prev)) = (block_start, previous) {
                let expected = prev + slot;
                if ts != expected {
                    log_debug!(verbosity, "gap after {}, closing block at {}", prev, expected);
                    blocks.push(AvailabilityBlock {
                        start,
                        end: expected,
                    });
                    block_start = None;
                }
            }
        }

        match (available, block_start) {
            (true, None) => {
                log_debug!(verbosity, "opened block at {}", ts);
                block_start = Some(ts);
            }
            (false, Some(start)) => {
                log_debug!(verbosity, "closed block {} -> {}", start, ts);
                blocks.push(AvailabilityBlock { start, end: ts });
                block_start = None;
            }
            _ => {}
        }
        previous = Some(ts);
    }

    if let (Some(start), Some(last)) = (block_start, previous) {
        let end = last + slot;
        log_debug!(verbosity, "closed final block {} -> {}", start, end);
        blocks.push(AvailabilityBlock { start, end });
    }

    log_debug!(
        verbosity,
        "converted {} slot(s) into {} block(s)",
        slots.len(),
        blocks.len()
    );
    blocks
}

/// Find the merged block covering `now`, if any.
///
/// Touching blocks (as stored day by day) are treated as one run.
pub fn block_at(blocks: &[AvailabilityBlock], now: Timestamp) -> Option<AvailabilityBlock> {
    let merged = merge_blocks(blocks);
    let idx = merged.partition_point(|b| b.end <= now);
    merged.get(idx).copied().filter(|b| b.contains(now))
}

/// Remaining availability of the block covering `now`, capped at `cap`.
///
/// Returns `None` when no block covers `now`.
pub fn remaining_at(
    blocks: &[AvailabilityBlock],
    now: Timestamp,
    cap: Duration,
) -> Option<AvailableFor> {
    block_at(blocks, now).map(|block| AvailableFor::capped(block.end - now, cap))
}
