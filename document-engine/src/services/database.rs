//! Database access for the document engine.

use engine_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, Postgres};
use sqlx::Transaction;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    BulkLot, ContainerLine, ContainerOperation, Document, MonthlyTaxAggregate, Prime,
    ServiceOperation,
};

/// Column list shared by every document query so `RETURNING`/`SELECT`
/// shapes stay in sync with the `Document` struct.
pub(crate) const DOCUMENT_COLUMNS: &str = "document_id, kind, numero, category, status, \
    non_assujetti, client_id, source_document_id, transitaire_id, representant_id, armateur_id, \
    numero_bl, date_creation, date_echeance, subtotal, discount_type, discount_value, \
    discount_amount, vat_amount, css_amount, total, amount_paid, notes, created_by, \
    created_utc, updated_utc, deleted_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "document-engine"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Begin a transaction for one atomic lifecycle operation.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })
    }

    // -------------------------------------------------------------------------
    // Document reads
    // -------------------------------------------------------------------------

    /// Get a document by ID. Soft-deleted documents are not returned.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, AppError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = $1 AND deleted_utc IS NULL"
        );
        sqlx::query_as::<_, Document>(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get document: {}", e)))
    }

    /// Get a document by its human-facing number.
    #[instrument(skip(self), fields(numero = %numero))]
    pub async fn get_document_by_numero(&self, numero: &str) -> Result<Option<Document>, AppError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE numero = $1 AND deleted_utc IS NULL"
        );
        sqlx::query_as::<_, Document>(&sql)
            .bind(numero)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get document: {}", e)))
    }

    // -------------------------------------------------------------------------
    // Line reads
    // -------------------------------------------------------------------------

    /// Get the container lines of a document.
    pub async fn get_container_lines(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<ContainerLine>, AppError> {
        sqlx::query_as::<_, ContainerLine>(
            r#"
            SELECT line_id, document_id, numero, taille, description, prix_base, created_utc
            FROM container_lines
            WHERE document_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get container lines: {}", e))
        })
    }

    /// Get the operations owned by a container line.
    pub async fn get_container_operations(
        &self,
        line_id: Uuid,
    ) -> Result<Vec<ContainerOperation>, AppError> {
        sqlx::query_as::<_, ContainerOperation>(
            r#"
            SELECT operation_id, line_id, operation_type, quantite, prix_unitaire, total, created_utc
            FROM container_operations
            WHERE line_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(line_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get container operations: {}", e))
        })
    }

    /// Get the bulk lots of a document.
    pub async fn get_bulk_lots(&self, document_id: Uuid) -> Result<Vec<BulkLot>, AppError> {
        sqlx::query_as::<_, BulkLot>(
            r#"
            SELECT lot_id, document_id, numero_lot, description, quantite, prix_unitaire, total, created_utc
            FROM bulk_lots
            WHERE document_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get bulk lots: {}", e)))
    }

    /// Get the independent operations of a document.
    pub async fn get_service_operations(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<ServiceOperation>, AppError> {
        sqlx::query_as::<_, ServiceOperation>(
            r#"
            SELECT operation_id, document_id, operation_type, description, quantite, prix_unitaire,
                total, lieu_depart, lieu_arrivee, date_debut, date_fin, created_utc
            FROM service_operations
            WHERE document_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get service operations: {}", e))
        })
    }

    // -------------------------------------------------------------------------
    // Side entities
    // -------------------------------------------------------------------------

    /// Get the commission records owned by a document.
    pub async fn get_primes(&self, document_id: Uuid) -> Result<Vec<Prime>, AppError> {
        sqlx::query_as::<_, Prime>(
            r#"
            SELECT prime_id, document_id, beneficiary_kind, beneficiary_id, amount, status, created_utc
            FROM primes
            WHERE document_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get primes: {}", e)))
    }

    /// Get the derived balance of a client.
    pub async fn get_client_balance(&self, client_id: Uuid) -> Result<Decimal, AppError> {
        sqlx::query_scalar::<_, Decimal>("SELECT balance FROM clients WHERE client_id = $1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to get client balance: {}", e))
            })?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client {} not found", client_id)))
    }

    /// Get one monthly tax aggregate row, if present.
    pub async fn get_monthly_aggregate(
        &self,
        year: i32,
        month: i32,
        tax_code: &str,
    ) -> Result<Option<MonthlyTaxAggregate>, AppError> {
        sqlx::query_as::<_, MonthlyTaxAggregate>(
            r#"
            SELECT year, month, tax_code, taxable_base, tax_amount, updated_utc
            FROM monthly_tax_aggregates
            WHERE year = $1 AND month = $2 AND tax_code = $3
            "#,
        )
        .bind(year)
        .bind(month)
        .bind(tax_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get tax aggregate: {}", e))
        })
    }
}
