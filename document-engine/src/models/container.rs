//! Container line models: a container row owning zero or more operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted container line. The base price contributes to the subtotal
/// even when the container owns no operations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContainerLine {
    pub line_id: Uuid,
    pub document_id: Uuid,
    pub numero: String,
    pub taille: String,
    pub description: Option<String>,
    pub prix_base: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Persisted operation owned by a container line.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContainerOperation {
    pub operation_id: Uuid,
    pub line_id: Uuid,
    pub operation_type: String,
    pub quantite: Decimal,
    pub prix_unitaire: Decimal,
    pub total: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Inbound container line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerInput {
    #[serde(default, alias = "numero_conteneur")]
    pub numero: Option<String>,
    #[serde(default)]
    pub taille: Option<String>,
    #[serde(default, alias = "designation")]
    pub description: Option<String>,
    #[serde(default, alias = "prix_base")]
    pub prix_unitaire: Option<Decimal>,
    #[serde(default)]
    pub operations: Vec<ContainerOperationInput>,
}

/// Inbound operation on a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerOperationInput {
    #[serde(default, alias = "type_operation", alias = "type")]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub quantite: Option<Decimal>,
    #[serde(default)]
    pub prix_unitaire: Option<Decimal>,
}
