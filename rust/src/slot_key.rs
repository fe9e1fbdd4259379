//! Slot key codec for the `"DD/MM/YYYY HHMM"` keys produced by ingestion.

use chrono::NaiveDateTime;

use crate::error::{RotaError, RotaResult};
use crate::models::Timestamp;

const SLOT_KEY_FORMAT: &str = "%d/%m/%Y %H%M";

/// Parse a slot key such as `"01/01/2025 0800"`.
pub fn parse_slot_key(key: &str) -> RotaResult<Timestamp> {
    NaiveDateTime::parse_from_str(key.trim(), SLOT_KEY_FORMAT)
        .map_err(|_| RotaError::MalformedSlotKey(key.to_string()))
}

/// Format a timestamp back into slot key form.
pub fn format_slot_key(ts: Timestamp) -> String {
    ts.format(SLOT_KEY_FORMAT).to_string()
}
