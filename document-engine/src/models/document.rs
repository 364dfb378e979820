//! Document model: the billable header shared by work orders and invoices.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::bulk::LotInput;
use crate::models::container::ContainerInput;
use crate::models::operation::OperationInput;

/// Document kind: pre-billing work order or billing invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    WorkOrder,
    Invoice,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::WorkOrder => "work_order",
            DocumentKind::Invoice => "invoice",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "invoice" => DocumentKind::Invoice,
            _ => DocumentKind::WorkOrder,
        }
    }

    /// Numbering prefix for the kind (`OT-2026-0001`, `FAC-2026-0001`).
    pub fn number_prefix(&self) -> &'static str {
        match self {
            DocumentKind::WorkOrder => "OT",
            DocumentKind::Invoice => "FAC",
        }
    }

    /// Invoices are created directly as issued; there is no draft state.
    pub fn initial_status(&self) -> DocumentStatus {
        match self {
            DocumentKind::WorkOrder => DocumentStatus::InProgress,
            DocumentKind::Invoice => DocumentStatus::Issued,
        }
    }
}

/// Document status across both kinds.
///
/// Work orders move `in_progress -> completed | invoiced`; invoices move
/// `issued -> partially_paid -> paid`. `cancelled` is reachable from any
/// state through the external cancellation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    InProgress,
    Completed,
    Invoiced,
    Issued,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::InProgress => "in_progress",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Invoiced => "invoiced",
            DocumentStatus::Issued => "issued",
            DocumentStatus::PartiallyPaid => "partially_paid",
            DocumentStatus::Paid => "paid",
            DocumentStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "completed" => DocumentStatus::Completed,
            "invoiced" => DocumentStatus::Invoiced,
            "issued" => DocumentStatus::Issued,
            "partially_paid" => DocumentStatus::PartiallyPaid,
            "paid" => DocumentStatus::Paid,
            "cancelled" => DocumentStatus::Cancelled,
            _ => DocumentStatus::InProgress,
        }
    }
}

/// Line-item category. Determines which line set a document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Container,
    Bulk,
    IndependentOps,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Container => "container",
            DocumentCategory::Bulk => "bulk",
            DocumentCategory::IndependentOps => "independent_ops",
        }
    }

    /// Fixed lookup table for the inbound `type_document` values. Legacy
    /// clients send the French category names; unknown values fall back
    /// to Container.
    pub fn from_string(s: &str) -> Self {
        match s {
            "bulk" | "conventionnel" | "vrac" => DocumentCategory::Bulk,
            "independent_ops" | "operation_independante" | "operations" => {
                DocumentCategory::IndependentOps
            }
            _ => DocumentCategory::Container,
        }
    }
}

/// Discount applied to the pre-tax subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    None,
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::None => "none",
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "percentage" | "pourcentage" => DiscountType::Percentage,
            "fixed" | "fixe" => DiscountType::Fixed,
            _ => DiscountType::None,
        }
    }
}

/// Billable document header.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub document_id: Uuid,
    pub kind: String,
    pub numero: String,
    pub category: String,
    pub status: String,
    pub non_assujetti: bool,
    pub client_id: Uuid,
    pub source_document_id: Option<Uuid>,
    pub transitaire_id: Option<Uuid>,
    pub representant_id: Option<Uuid>,
    pub armateur_id: Option<Uuid>,
    pub numero_bl: Option<String>,
    pub date_creation: NaiveDate,
    pub date_echeance: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub discount_amount: Decimal,
    pub vat_amount: Decimal,
    pub css_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub deleted_utc: Option<DateTime<Utc>>,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_string(&self.kind)
    }

    pub fn category(&self) -> DocumentCategory {
        DocumentCategory::from_string(&self.category)
    }

    pub fn status(&self) -> DocumentStatus {
        DocumentStatus::from_string(&self.status)
    }

    pub fn discount_type(&self) -> DiscountType {
        DiscountType::from_string(&self.discount_type)
    }
}

/// Inbound create/modify payload.
///
/// Serde aliases absorb the historical field names still sent by older
/// clients (`type_document`, `bl_numero`, `date_facture`, ...), so the
/// rest of the engine only ever sees the canonical names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentInput {
    #[serde(default, alias = "type_document")]
    pub category: Option<String>,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub source_document_id: Option<Uuid>,
    #[serde(default)]
    pub transitaire_id: Option<Uuid>,
    #[serde(default)]
    pub representant_id: Option<Uuid>,
    #[serde(default)]
    pub armateur_id: Option<Uuid>,
    #[serde(default, alias = "bl_numero")]
    pub numero_bl: Option<String>,
    #[serde(default, alias = "date", alias = "date_facture")]
    pub date_creation: Option<NaiveDate>,
    #[serde(default, alias = "date_validite")]
    pub date_echeance: Option<NaiveDate>,
    #[serde(default)]
    pub non_assujetti: Option<bool>,
    #[serde(default, alias = "remise_type")]
    pub discount_type: Option<String>,
    #[serde(default, alias = "remise_valeur")]
    pub discount_value: Option<Decimal>,
    #[serde(default)]
    pub prime_transitaire: Option<Decimal>,
    #[serde(default)]
    pub prime_representant: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "conteneurs")]
    pub containers: Option<Vec<ContainerInput>>,
    #[serde(default)]
    pub lots: Option<Vec<LotInput>>,
    #[serde(default)]
    pub operations: Option<Vec<OperationInput>>,
}

/// A document's line items in the shape of exactly one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineSet {
    Container(Vec<ContainerInput>),
    Bulk(Vec<LotInput>),
    IndependentOps(Vec<OperationInput>),
}

impl LineSet {
    pub fn category(&self) -> DocumentCategory {
        match self {
            LineSet::Container(_) => DocumentCategory::Container,
            LineSet::Bulk(_) => DocumentCategory::Bulk,
            LineSet::IndependentOps(_) => DocumentCategory::IndependentOps,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            LineSet::Container(v) => v.is_empty(),
            LineSet::Bulk(v) => v.is_empty(),
            LineSet::IndependentOps(v) => v.is_empty(),
        }
    }
}
