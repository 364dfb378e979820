//! Independent service operation models (transport, rental, storage, ...).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted independent operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceOperation {
    pub operation_id: Uuid,
    pub document_id: Uuid,
    pub operation_type: String,
    pub description: Option<String>,
    pub quantite: Decimal,
    pub prix_unitaire: Decimal,
    pub total: Decimal,
    pub lieu_depart: Option<String>,
    pub lieu_arrivee: Option<String>,
    pub date_debut: Option<NaiveDate>,
    pub date_fin: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
}

/// Inbound independent operation.
///
/// For rental and storage operations the quantity may be derived from the
/// start/end date pair when not supplied explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationInput {
    #[serde(default, alias = "type_operation", alias = "type")]
    pub operation_type: Option<String>,
    #[serde(default, alias = "designation")]
    pub description: Option<String>,
    #[serde(default)]
    pub quantite: Option<Decimal>,
    #[serde(default)]
    pub prix_unitaire: Option<Decimal>,
    #[serde(default)]
    pub lieu_depart: Option<String>,
    #[serde(default)]
    pub lieu_arrivee: Option<String>,
    #[serde(default)]
    pub date_debut: Option<NaiveDate>,
    #[serde(default)]
    pub date_fin: Option<NaiveDate>,
}
