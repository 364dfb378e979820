//! Commission record, soft-delete and event integration tests.

mod common;

use common::{container_payload, create_test_client, dec, spawn_app};
use document_engine::models::{DocumentKind, PrimeStatus};
use document_engine::services::DocumentEvent;
use serial_test::serial;
use uuid::Uuid;

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn invoice_with_commission_amounts_creates_pending_primes() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Prime Client").await;

    let mut input = container_payload(client_id);
    input.transitaire_id = Some(Uuid::new_v4());
    input.representant_id = Some(Uuid::new_v4());
    input.prime_transitaire = Some(dec("5000"));
    input.prime_representant = Some(dec("2500"));

    let invoice = app
        .factory
        .create(DocumentKind::Invoice, input, None)
        .await
        .expect("Failed to create invoice");

    let primes = app
        .db
        .get_primes(invoice.document_id)
        .await
        .expect("Failed to load primes");

    assert_eq!(primes.len(), 2);
    assert!(primes
        .iter()
        .all(|p| PrimeStatus::from_string(&p.status) == PrimeStatus::Pending));
    assert!(primes
        .iter()
        .any(|p| p.beneficiary_kind == "transitaire" && p.amount == dec("5000")));
    assert!(primes
        .iter()
        .any(|p| p.beneficiary_kind == "representant" && p.amount == dec("2500")));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn commission_without_beneficiary_is_skipped() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "No Beneficiary Client").await;

    // Amount supplied but no transitaire on the document
    let mut input = container_payload(client_id);
    input.prime_transitaire = Some(dec("5000"));

    let invoice = app
        .factory
        .create(DocumentKind::Invoice, input, None)
        .await
        .expect("Failed to create invoice");

    let primes = app
        .db
        .get_primes(invoice.document_id)
        .await
        .expect("Failed to load primes");
    assert!(primes.is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn modifying_commissions_replaces_pending_rows() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Prime Modify Client").await;
    let transitaire_id = Uuid::new_v4();

    let mut input = container_payload(client_id);
    input.transitaire_id = Some(transitaire_id);
    input.prime_transitaire = Some(dec("5000"));

    let invoice = app
        .factory
        .create(DocumentKind::Invoice, input, None)
        .await
        .expect("Failed to create invoice");

    let mut update = container_payload(client_id);
    update.transitaire_id = Some(transitaire_id);
    update.prime_transitaire = Some(dec("8000"));

    app.factory
        .modify(invoice.document_id, update)
        .await
        .expect("Failed to modify invoice");

    let primes = app
        .db
        .get_primes(invoice.document_id)
        .await
        .expect("Failed to load primes");
    assert_eq!(primes.len(), 1);
    assert_eq!(primes[0].amount, dec("8000"));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn soft_deleted_documents_disappear_from_reads() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Delete Client").await;

    let invoice = app
        .factory
        .create(DocumentKind::Invoice, container_payload(client_id), None)
        .await
        .expect("Failed to create invoice");

    app.factory
        .soft_delete(invoice.document_id)
        .await
        .expect("Failed to soft-delete invoice");

    let reloaded = app
        .db
        .get_document(invoice.document_id)
        .await
        .expect("Failed to read document");
    assert!(reloaded.is_none());

    // Outstanding amount is gone from the balance
    let balance = app
        .db
        .get_client_balance(client_id)
        .await
        .expect("Failed to read balance");
    assert_eq!(balance, rust_decimal::Decimal::ZERO);
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn paid_documents_cannot_be_deleted() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Paid Delete Client").await;

    let invoice = app
        .factory
        .create(DocumentKind::Invoice, container_payload(client_id), None)
        .await
        .expect("Failed to create invoice");
    app.factory
        .record_payment(invoice.document_id, dec("100"))
        .await
        .expect("Failed to record payment");

    let result = app.factory.soft_delete(invoice.document_id).await;
    assert!(matches!(
        result,
        Err(engine_core::error::AppError::Conflict(_))
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn lifecycle_operations_emit_domain_events() {
    let app = spawn_app().await;
    let client_id = create_test_client(&app.db, "Events Client").await;
    let mut receiver = app.factory.events().subscribe();

    let work_order = app
        .factory
        .create(DocumentKind::WorkOrder, container_payload(client_id), None)
        .await
        .expect("Failed to create work order");

    match receiver.recv().await.expect("missing event") {
        DocumentEvent::Created {
            kind,
            document_id,
            numero,
        } => {
            assert_eq!(kind, DocumentKind::WorkOrder);
            assert_eq!(document_id, work_order.document_id);
            assert_eq!(numero, work_order.numero);
        }
        other => panic!("expected Created event, got {:?}", other),
    }

    let invoice = app
        .factory
        .convert(work_order.document_id, None)
        .await
        .expect("Failed to convert work order");

    match receiver.recv().await.expect("missing event") {
        DocumentEvent::Created { document_id, .. } => {
            assert_eq!(document_id, invoice.document_id)
        }
        other => panic!("expected Created event, got {:?}", other),
    }
    match receiver.recv().await.expect("missing event") {
        DocumentEvent::Converted {
            work_order_id,
            invoice_id,
        } => {
            assert_eq!(work_order_id, work_order.document_id);
            assert_eq!(invoice_id, invoice.document_id);
        }
        other => panic!("expected Converted event, got {:?}", other),
    }
}
