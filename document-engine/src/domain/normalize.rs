//! Inbound payload normalization for document creation.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    DiscountType, DocumentCategory, DocumentInput, DocumentKind, LineSet,
};

/// Invoice due dates default to creation date + 30 days.
const DEFAULT_DUE_DAYS: i64 = 30;

/// A create payload with aliases resolved, defaults applied and the line
/// set extracted from the header.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    pub category: DocumentCategory,
    pub client_id: Option<Uuid>,
    pub source_document_id: Option<Uuid>,
    pub transitaire_id: Option<Uuid>,
    pub representant_id: Option<Uuid>,
    pub armateur_id: Option<Uuid>,
    pub numero_bl: Option<String>,
    pub date_creation: NaiveDate,
    pub date_echeance: Option<NaiveDate>,
    pub non_assujetti: bool,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub prime_transitaire: Decimal,
    pub prime_representant: Decimal,
    pub notes: Option<String>,
    pub lines: Option<LineSet>,
}

/// Normalize a create payload.
///
/// The category decides which of the three inbound line arrays is kept;
/// the other two are discarded. `today` is injected so the defaulting
/// rules stay testable.
pub fn normalize(kind: DocumentKind, input: DocumentInput, today: NaiveDate) -> NormalizedDocument {
    let category = input
        .category
        .as_deref()
        .map(DocumentCategory::from_string)
        .unwrap_or(DocumentCategory::Container);

    let date_creation = input.date_creation.unwrap_or(today);
    let date_echeance = match (kind, input.date_echeance) {
        (DocumentKind::Invoice, None) => Some(date_creation + Duration::days(DEFAULT_DUE_DAYS)),
        (_, explicit) => explicit,
    };

    let lines = match category {
        DocumentCategory::Container => input.containers.map(LineSet::Container),
        DocumentCategory::Bulk => input.lots.map(LineSet::Bulk),
        DocumentCategory::IndependentOps => input.operations.map(LineSet::IndependentOps),
    };

    NormalizedDocument {
        category,
        client_id: input.client_id,
        source_document_id: input.source_document_id,
        transitaire_id: input.transitaire_id,
        representant_id: input.representant_id,
        armateur_id: input.armateur_id,
        numero_bl: input.numero_bl,
        date_creation,
        date_echeance,
        non_assujetti: input.non_assujetti.unwrap_or(false),
        discount_type: input
            .discount_type
            .as_deref()
            .map(DiscountType::from_string)
            .unwrap_or(DiscountType::None),
        discount_value: input.discount_value.unwrap_or(Decimal::ZERO),
        prime_transitaire: input.prime_transitaire.unwrap_or(Decimal::ZERO),
        prime_representant: input.prime_representant.unwrap_or(Decimal::ZERO),
        notes: input.notes,
        lines,
    }
}

/// Extract the line set matching a given category from a modify payload.
pub fn lines_for_category(input: &DocumentInput, category: DocumentCategory) -> Option<LineSet> {
    match category {
        DocumentCategory::Container => input.containers.clone().map(LineSet::Container),
        DocumentCategory::Bulk => input.lots.clone().map(LineSet::Bulk),
        DocumentCategory::IndependentOps => input.operations.clone().map(LineSet::IndependentOps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LotInput;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn creation_date_defaults_to_today() {
        let normalized = normalize(DocumentKind::WorkOrder, DocumentInput::default(), today());
        assert_eq!(normalized.date_creation, today());
        assert_eq!(normalized.date_echeance, None);
    }

    #[test]
    fn invoice_due_date_defaults_to_creation_plus_30_days() {
        let normalized = normalize(DocumentKind::Invoice, DocumentInput::default(), today());
        assert_eq!(
            normalized.date_echeance,
            Some(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap())
        );
    }

    #[test]
    fn explicit_due_date_is_kept() {
        let explicit = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        let input = DocumentInput {
            date_echeance: Some(explicit),
            ..Default::default()
        };
        let normalized = normalize(DocumentKind::Invoice, input, today());
        assert_eq!(normalized.date_echeance, Some(explicit));
    }

    #[test]
    fn category_defaults_to_container() {
        let normalized = normalize(DocumentKind::WorkOrder, DocumentInput::default(), today());
        assert_eq!(normalized.category, DocumentCategory::Container);
    }

    #[test]
    fn only_the_selected_category_lines_are_kept() {
        let input = DocumentInput {
            category: Some("conventionnel".to_string()),
            lots: Some(vec![LotInput {
                description: Some("riz en sacs".to_string()),
                ..Default::default()
            }]),
            containers: Some(vec![Default::default()]),
            ..Default::default()
        };
        let normalized = normalize(DocumentKind::WorkOrder, input, today());
        assert_eq!(normalized.category, DocumentCategory::Bulk);
        match normalized.lines {
            Some(LineSet::Bulk(lots)) => assert_eq!(lots.len(), 1),
            other => panic!("expected bulk lines, got {:?}", other),
        }
    }
}
