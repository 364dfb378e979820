//! Commission records ("primes") owed to a transitaire or representative.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const BENEFICIARY_TRANSITAIRE: &str = "transitaire";
pub const BENEFICIARY_REPRESENTANT: &str = "representant";

/// Commission status. Paid commissions are immutable; only pending rows
/// are deleted and recreated when a document's commission amounts change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimeStatus {
    Pending,
    Paid,
}

impl PrimeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimeStatus::Pending => "pending",
            PrimeStatus::Paid => "paid",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "paid" => PrimeStatus::Paid,
            _ => PrimeStatus::Pending,
        }
    }
}

/// Commission record owned by a document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prime {
    pub prime_id: Uuid,
    pub document_id: Uuid,
    pub beneficiary_kind: String,
    pub beneficiary_id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}
