//! Common test utilities for document-engine integration tests.
//!
//! These tests need a running PostgreSQL reachable through
//! `TEST_DATABASE_URL`; they are `#[ignore]`d so the default test run
//! stays hermetic.

use document_engine::models::{ContainerInput, ContainerOperationInput, DocumentInput};
use document_engine::services::{Database, DocumentFactory, EventBus, TaxConfigProvider};
use rust_decimal::Decimal;
use std::sync::{Arc, Once};
use std::time::Duration;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,document_engine=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestApp {
    pub db: Database,
    pub factory: DocumentFactory,
    pub tax_config: Arc<TaxConfigProvider>,
}

/// Connect to the test database, run migrations and build a factory.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run integration tests");

    let db = Database::new(&database_url, 5, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");

    let tax_config = Arc::new(TaxConfigProvider::new(db.clone(), Duration::from_secs(300)));
    let factory = DocumentFactory::new(db.clone(), tax_config.clone(), EventBus::default());

    TestApp {
        db,
        factory,
        tax_config,
    }
}

/// Insert a client row and return its id.
pub async fn create_test_client(db: &Database, name: &str) -> Uuid {
    let client_id = Uuid::new_v4();
    sqlx::query("INSERT INTO clients (client_id, name) VALUES ($1, $2)")
        .bind(client_id)
        .bind(name)
        .execute(db.pool())
        .await
        .expect("Failed to insert test client");
    client_id
}

pub fn dec(s: &str) -> Decimal {
    s.parse().expect("invalid decimal literal")
}

/// One container at 50,000 base plus a 2 x 10,000 handling operation:
/// pre-tax subtotal 70,000.
pub fn container_payload(client_id: Uuid) -> DocumentInput {
    DocumentInput {
        category: Some("container".to_string()),
        client_id: Some(client_id),
        containers: Some(vec![ContainerInput {
            numero: Some("MSKU1234567".to_string()),
            taille: Some("40'".to_string()),
            prix_unitaire: Some(dec("50000")),
            operations: vec![ContainerOperationInput {
                operation_type: Some("manutention".to_string()),
                quantite: Some(dec("2")),
                prix_unitaire: Some(dec("10000")),
            }],
            ..Default::default()
        }]),
        ..Default::default()
    }
}
