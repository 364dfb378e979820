//! Sequence counter model: source of truth for the next document number.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row per numbering domain (document kind), read-modify-written
/// under a row lock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SequenceCounter {
    pub kind: String,
    pub prefix: String,
    pub next_number: i64,
}
