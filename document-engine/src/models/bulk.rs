//! Bulk (conventional cargo) lot models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted bulk lot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BulkLot {
    pub lot_id: Uuid,
    pub document_id: Uuid,
    pub numero_lot: String,
    pub description: String,
    pub quantite: Decimal,
    pub prix_unitaire: Decimal,
    pub total: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Inbound bulk lot. A missing lot number is synthesized as `LOT-{n}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotInput {
    #[serde(default)]
    pub numero_lot: Option<String>,
    #[serde(default, alias = "designation")]
    pub description: Option<String>,
    #[serde(default)]
    pub quantite: Option<Decimal>,
    #[serde(default)]
    pub prix_unitaire: Option<Decimal>,
}
