//! Document creation and modification integration tests.

mod common;

use common::{container_payload, create_test_client, dec, spawn_app};
use document_engine::models::{
    DocumentInput, DocumentKind, DocumentStatus, LotInput,
};
use rust_decimal::Decimal;
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn create_work_order_computes_full_money_pipeline() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Lifecycle Client").await;

    let mut input = container_payload(client_id);
    input.discount_type = Some("percentage".to_string());
    input.discount_value = Some(dec("10"));

    let document = app
        .factory
        .create(DocumentKind::WorkOrder, input, None)
        .await
        .expect("Failed to create work order");

    assert!(document.numero.starts_with("OT-"));
    assert_eq!(document.status(), DocumentStatus::InProgress);
    assert_eq!(document.subtotal, dec("70000"));
    assert_eq!(document.discount_amount, dec("7000.00"));
    assert_eq!(document.vat_amount, dec("11340.00"));
    assert_eq!(document.css_amount, dec("630.00"));
    assert_eq!(document.total, dec("74970.00"));
    assert_eq!(document.amount_paid, Decimal::ZERO);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn invoices_are_created_directly_as_issued() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Issued Client").await;

    let invoice = app
        .factory
        .create(DocumentKind::Invoice, container_payload(client_id), None)
        .await
        .expect("Failed to create invoice");

    assert!(invoice.numero.starts_with("FAC-"));
    assert_eq!(invoice.status(), DocumentStatus::Issued);
    // Due date defaults to creation + 30 days
    let due = invoice.date_echeance.expect("missing due date");
    assert_eq!(due - invoice.date_creation, chrono::Duration::days(30));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn exempt_document_carries_zero_taxes() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Exempt Client").await;

    let mut input = container_payload(client_id);
    input.non_assujetti = Some(true);

    let document = app
        .factory
        .create(DocumentKind::Invoice, input, None)
        .await
        .expect("Failed to create exempt invoice");

    assert_eq!(document.vat_amount, Decimal::ZERO);
    assert_eq!(document.css_amount, Decimal::ZERO);
    assert_eq!(document.total, dec("70000.00"));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn validation_failure_rejects_before_any_write() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Invalid Client").await;

    // Container category with an empty line array
    let input = DocumentInput {
        category: Some("container".to_string()),
        client_id: Some(client_id),
        containers: Some(vec![]),
        ..Default::default()
    };

    let result = app.factory.create(DocumentKind::WorkOrder, input, None).await;
    assert!(matches!(
        result,
        Err(engine_core::error::AppError::Validation(_))
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn modify_replaces_lines_and_recalculates() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Modify Client").await;

    let document = app
        .factory
        .create(DocumentKind::WorkOrder, container_payload(client_id), None)
        .await
        .expect("Failed to create work order");
    assert_eq!(document.subtotal, dec("70000"));

    // Replace the container set with a cheaper one
    let mut update = container_payload(client_id);
    update.containers.as_mut().unwrap()[0].prix_unitaire = Some(dec("30000"));
    update.containers.as_mut().unwrap()[0].operations.clear();

    let updated = app
        .factory
        .modify(document.document_id, update)
        .await
        .expect("Failed to modify work order");

    assert_eq!(updated.subtotal, dec("30000.00"));
    assert_eq!(updated.numero, document.numero);

    let lines = app
        .db
        .get_container_lines(document.document_id)
        .await
        .expect("Failed to load lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].prix_base, dec("30000"));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn category_switch_discards_old_line_set() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Switch Client").await;

    let document = app
        .factory
        .create(DocumentKind::WorkOrder, container_payload(client_id), None)
        .await
        .expect("Failed to create work order");

    let update = DocumentInput {
        category: Some("bulk".to_string()),
        lots: Some(vec![LotInput {
            description: Some("sacs de riz".to_string()),
            quantite: Some(dec("100")),
            prix_unitaire: Some(dec("250")),
            ..Default::default()
        }]),
        ..Default::default()
    };

    let updated = app
        .factory
        .modify(document.document_id, update)
        .await
        .expect("Failed to switch category");

    assert_eq!(updated.category, "bulk");
    assert_eq!(updated.subtotal, dec("25000.00"));

    let old_lines = app
        .db
        .get_container_lines(document.document_id)
        .await
        .expect("Failed to load lines");
    assert!(old_lines.is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn category_switch_without_new_lines_is_rejected() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Switch Reject Client").await;

    let document = app
        .factory
        .create(DocumentKind::WorkOrder, container_payload(client_id), None)
        .await
        .expect("Failed to create work order");

    let update = DocumentInput {
        category: Some("bulk".to_string()),
        ..Default::default()
    };

    let result = app.factory.modify(document.document_id, update).await;
    assert!(matches!(
        result,
        Err(engine_core::error::AppError::BadRequest(_))
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn recalculate_totals_is_idempotent() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Recalc Client").await;

    let document = app
        .factory
        .create(DocumentKind::Invoice, container_payload(client_id), None)
        .await
        .expect("Failed to create invoice");

    let once = app
        .factory
        .recalculate_totals(document.document_id)
        .await
        .expect("First recalculation failed");
    let twice = app
        .factory
        .recalculate_totals(document.document_id)
        .await
        .expect("Second recalculation failed");

    assert_eq!(once.subtotal, twice.subtotal);
    assert_eq!(once.total, twice.total);
    assert_eq!(once.total, document.total);
}
