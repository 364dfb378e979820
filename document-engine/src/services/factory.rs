//! Document lifecycle factory: one orchestrator for both document kinds.
//!
//! Every public operation runs as a single database transaction; the
//! document header, its line rows, commission records, the monthly tax
//! ledger and the client balance commit or roll back together. Domain
//! events are emitted only after a successful commit.

use chrono::{Datelike, Utc};
use engine_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::money::compute_document_totals;
use crate::domain::normalize::{lines_for_category, normalize, NormalizedDocument};
use crate::models::{
    DiscountType, Document, DocumentCategory, DocumentInput, DocumentKind, DocumentStatus,
    LineSet, PrimeStatus, BENEFICIARY_REPRESENTANT, BENEFICIARY_TRANSITAIRE,
};
use crate::services::calculators::calculator_for;
use crate::services::database::DOCUMENT_COLUMNS;
use crate::services::{sequence, tax_ledger, Database, DocumentEvent, EventBus, TaxConfigProvider};

/// Lifecycle factory for work orders and invoices.
pub struct DocumentFactory {
    db: Database,
    tax_config: Arc<TaxConfigProvider>,
    events: EventBus,
}

impl DocumentFactory {
    pub fn new(db: Database, tax_config: Arc<TaxConfigProvider>, events: EventBus) -> Self {
        Self {
            db,
            tax_config,
            events,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    /// Create a document. Validation runs before the transaction opens so
    /// a rejected payload never consumes a sequence number.
    #[instrument(skip(self, input), fields(kind = kind.as_str()))]
    pub async fn create(
        &self,
        kind: DocumentKind,
        input: DocumentInput,
        created_by: Option<Uuid>,
    ) -> Result<Document, AppError> {
        let normalized = normalize(kind, input, Utc::now().date_naive());
        self.validate_lines(&normalized)?;

        let mut tx = self.db.begin().await?;
        let document = self.create_in_tx(&mut tx, kind, normalized, created_by).await?;
        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit create: {}", e))
        })?;

        info!(document_id = %document.document_id, numero = %document.numero, "document created");
        self.events.emit(DocumentEvent::Created {
            kind,
            document_id: document.document_id,
            numero: document.numero.clone(),
        });

        Ok(document)
    }

    // -------------------------------------------------------------------------
    // Modify
    // -------------------------------------------------------------------------

    /// Apply header updates and, when line payloads are present,
    /// destructively replace the line set. Switching category discards
    /// every other line set; the new category's lines must be supplied.
    #[instrument(skip(self, input), fields(document_id = %document_id))]
    pub async fn modify(
        &self,
        document_id: Uuid,
        input: DocumentInput,
    ) -> Result<Document, AppError> {
        let mut tx = self.db.begin().await?;
        let before = self.get_locked(&mut tx, document_id).await?;

        let new_category = input
            .category
            .as_deref()
            .map(DocumentCategory::from_string)
            .unwrap_or_else(|| before.category());
        let category_changed = new_category != before.category();

        let lines = lines_for_category(&input, new_category);
        if category_changed && lines.is_none() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Switching category to {} requires the matching line payload",
                new_category.as_str()
            )));
        }
        if let Some(ref line_set) = lines {
            let errors = calculator_for(new_category).validate(line_set);
            if !errors.is_empty() {
                return Err(AppError::Validation(errors));
            }
        }

        // Reconcile the tax ledger: the pre-edit contribution comes out,
        // the post-edit one goes back in after recalculation.
        if before.kind() == DocumentKind::Invoice {
            tax_ledger::remove_document(&mut tx, &before).await?;
        }

        let updated = self.update_header(&mut tx, &before, &input, new_category).await?;

        if category_changed {
            for category in [
                DocumentCategory::Container,
                DocumentCategory::Bulk,
                DocumentCategory::IndependentOps,
            ] {
                calculator_for(category).delete_lines(&mut tx, document_id).await?;
            }
        } else if lines.is_some() {
            calculator_for(new_category).delete_lines(&mut tx, document_id).await?;
        }
        if let Some(ref line_set) = lines {
            calculator_for(new_category)
                .create_lines(&mut tx, document_id, line_set)
                .await?;
        }

        let updated = self.apply_totals(&mut tx, &updated).await?;

        if updated.kind() == DocumentKind::Invoice
            && (input.prime_transitaire.is_some() || input.prime_representant.is_some())
        {
            self.delete_pending_primes(&mut tx, document_id).await?;
            self.create_primes(
                &mut tx,
                &updated,
                input.prime_transitaire.unwrap_or(Decimal::ZERO),
                input.prime_representant.unwrap_or(Decimal::ZERO),
            )
            .await?;
        }

        self.recompute_client_balance(&mut tx, before.client_id).await?;
        if updated.client_id != before.client_id {
            self.recompute_client_balance(&mut tx, updated.client_id).await?;
        }

        if updated.kind() == DocumentKind::Invoice {
            tax_ledger::add_document(&mut tx, &updated).await?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit modify: {}", e))
        })?;

        info!(document_id = %document_id, "document modified");
        self.events.emit(DocumentEvent::Modified {
            kind: updated.kind(),
            document_id,
        });

        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Convert
    // -------------------------------------------------------------------------

    /// Convert a work order into an invoice. The work order's line set is
    /// re-projected losslessly, the invoice is created through the normal
    /// path, and the source is marked invoiced in the same transaction.
    #[instrument(skip(self), fields(work_order_id = %work_order_id))]
    pub async fn convert(
        &self,
        work_order_id: Uuid,
        created_by: Option<Uuid>,
    ) -> Result<Document, AppError> {
        let mut tx = self.db.begin().await?;
        let work_order = self.get_locked(&mut tx, work_order_id).await?;

        if work_order.kind() != DocumentKind::WorkOrder {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Only work orders can be converted, {} is an invoice",
                work_order.numero
            )));
        }
        match work_order.status() {
            DocumentStatus::Cancelled | DocumentStatus::Invoiced => {
                return Err(AppError::IllegalTransition {
                    current: work_order.status.clone(),
                    attempted: DocumentStatus::Invoiced.as_str().to_string(),
                })
            }
            _ => {}
        }

        let lines = calculator_for(work_order.category())
            .project_for_conversion(&mut tx, work_order_id)
            .await?;

        let today = Utc::now().date_naive();
        let normalized = NormalizedDocument {
            category: work_order.category(),
            client_id: Some(work_order.client_id),
            source_document_id: Some(work_order.document_id),
            transitaire_id: work_order.transitaire_id,
            representant_id: work_order.representant_id,
            armateur_id: work_order.armateur_id,
            numero_bl: work_order.numero_bl.clone(),
            date_creation: today,
            date_echeance: Some(today + chrono::Duration::days(30)),
            non_assujetti: work_order.non_assujetti,
            discount_type: work_order.discount_type(),
            discount_value: work_order.discount_value,
            prime_transitaire: Decimal::ZERO,
            prime_representant: Decimal::ZERO,
            notes: work_order.notes.clone(),
            lines: Some(lines),
        };

        let invoice = self
            .create_in_tx(&mut tx, DocumentKind::Invoice, normalized, created_by)
            .await?;

        sqlx::query("UPDATE documents SET status = $2, updated_utc = NOW() WHERE document_id = $1")
            .bind(work_order_id)
            .bind(DocumentStatus::Invoiced.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to mark work order: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit conversion: {}", e))
        })?;

        info!(
            work_order = %work_order.numero,
            invoice = %invoice.numero,
            "work order converted"
        );
        self.events.emit(DocumentEvent::Created {
            kind: DocumentKind::Invoice,
            document_id: invoice.document_id,
            numero: invoice.numero.clone(),
        });
        self.events.emit(DocumentEvent::Converted {
            work_order_id,
            invoice_id: invoice.document_id,
        });

        Ok(invoice)
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// Record a payment against a document and move its status across the
    /// threshold rules.
    #[instrument(skip(self), fields(document_id = %document_id, amount = %amount))]
    pub async fn record_payment(
        &self,
        document_id: Uuid,
        amount: Decimal,
    ) -> Result<Document, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Payment amount must be positive, got {}",
                amount
            )));
        }

        let mut tx = self.db.begin().await?;
        let document = self.get_locked(&mut tx, document_id).await?;

        if document.status() == DocumentStatus::Cancelled {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot record a payment against cancelled document {}",
                document.numero
            )));
        }

        let new_paid = document.amount_paid + amount;
        let new_status = match document.kind() {
            DocumentKind::Invoice => {
                if new_paid >= document.total {
                    DocumentStatus::Paid
                } else {
                    DocumentStatus::PartiallyPaid
                }
            }
            DocumentKind::WorkOrder => {
                // Full payment completes the work order unless it was
                // already invoiced.
                if new_paid >= document.total && document.status() != DocumentStatus::Invoiced {
                    DocumentStatus::Completed
                } else {
                    document.status()
                }
            }
        };

        let sql = format!(
            "UPDATE documents SET amount_paid = $2, status = $3, updated_utc = NOW()
             WHERE document_id = $1
             RETURNING {DOCUMENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Document>(&sql)
            .bind(document_id)
            .bind(new_paid)
            .bind(new_status.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to record payment: {}", e))
            })?;

        if updated.kind() == DocumentKind::Invoice {
            self.recompute_client_balance(&mut tx, updated.client_id).await?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit payment: {}", e))
        })?;

        info!(
            document_id = %document_id,
            amount = %amount,
            status = %updated.status,
            "payment recorded"
        );
        self.events.emit(DocumentEvent::PaymentRecorded {
            kind: updated.kind(),
            document_id,
            amount,
        });

        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Duplicate
    // -------------------------------------------------------------------------

    /// Deep-copy a document: header (identity, number, status and paid
    /// amount reset) plus its full line set, re-created through the
    /// normal create path with a fresh number.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn duplicate(
        &self,
        document_id: Uuid,
        created_by: Option<Uuid>,
    ) -> Result<Document, AppError> {
        let mut tx = self.db.begin().await?;
        let source = self.get_locked(&mut tx, document_id).await?;
        let kind = source.kind();

        let lines = calculator_for(source.category())
            .project_for_conversion(&mut tx, document_id)
            .await?;

        let today = Utc::now().date_naive();
        let normalized = NormalizedDocument {
            category: source.category(),
            client_id: Some(source.client_id),
            source_document_id: None,
            transitaire_id: source.transitaire_id,
            representant_id: source.representant_id,
            armateur_id: source.armateur_id,
            numero_bl: source.numero_bl.clone(),
            date_creation: today,
            date_echeance: match kind {
                DocumentKind::Invoice => Some(today + chrono::Duration::days(30)),
                DocumentKind::WorkOrder => None,
            },
            non_assujetti: source.non_assujetti,
            discount_type: source.discount_type(),
            discount_value: source.discount_value,
            prime_transitaire: Decimal::ZERO,
            prime_representant: Decimal::ZERO,
            notes: source.notes.clone(),
            lines: Some(lines),
        };

        let copy = self.create_in_tx(&mut tx, kind, normalized, created_by).await?;
        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit duplicate: {}", e))
        })?;

        info!(source = %source.numero, copy = %copy.numero, "document duplicated");
        self.events.emit(DocumentEvent::Created {
            kind,
            document_id: copy.document_id,
            numero: copy.numero.clone(),
        });

        Ok(copy)
    }

    // -------------------------------------------------------------------------
    // Recalculation and soft delete
    // -------------------------------------------------------------------------

    /// Recompute every money field from the persisted lines. Idempotent:
    /// a second call without line changes writes identical values.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn recalculate_totals(&self, document_id: Uuid) -> Result<Document, AppError> {
        let mut tx = self.db.begin().await?;
        let before = self.get_locked(&mut tx, document_id).await?;

        if before.kind() == DocumentKind::Invoice {
            tax_ledger::remove_document(&mut tx, &before).await?;
        }
        let updated = self.apply_totals(&mut tx, &before).await?;
        if updated.kind() == DocumentKind::Invoice {
            tax_ledger::add_document(&mut tx, &updated).await?;
        }
        self.recompute_client_balance(&mut tx, updated.client_id).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit recalculation: {}", e))
        })?;

        Ok(updated)
    }

    /// Soft-delete a document. Numbers are never reused and paid
    /// documents are kept for audit history.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn soft_delete(&self, document_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        let document = self.get_locked(&mut tx, document_id).await?;

        if document.amount_paid > Decimal::ZERO {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Document {} has recorded payments and cannot be deleted",
                document.numero
            )));
        }

        if document.kind() == DocumentKind::Invoice {
            tax_ledger::remove_document(&mut tx, &document).await?;
        }

        sqlx::query(
            "UPDATE documents SET deleted_utc = NOW(), updated_utc = NOW() WHERE document_id = $1",
        )
        .bind(document_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to soft-delete document: {}", e))
        })?;

        self.recompute_client_balance(&mut tx, document.client_id).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit delete: {}", e))
        })?;

        info!(numero = %document.numero, "document soft-deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn validate_lines(&self, normalized: &NormalizedDocument) -> Result<(), AppError> {
        let empty = match normalized.category {
            DocumentCategory::Container => LineSet::Container(Vec::new()),
            DocumentCategory::Bulk => LineSet::Bulk(Vec::new()),
            DocumentCategory::IndependentOps => LineSet::IndependentOps(Vec::new()),
        };
        let lines = normalized.lines.as_ref().unwrap_or(&empty);
        let errors = calculator_for(normalized.category).validate(lines);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    /// Shared create path used by `create`, `convert` and `duplicate`.
    /// Runs inside the caller's transaction; emits nothing.
    async fn create_in_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        kind: DocumentKind,
        normalized: NormalizedDocument,
        created_by: Option<Uuid>,
    ) -> Result<Document, AppError> {
        let client_id = normalized.client_id.ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("client_id is required to create a document"))
        })?;

        let numero =
            sequence::next_document_number(tx, kind, normalized.date_creation.year()).await?;

        let sql = format!(
            r#"
            INSERT INTO documents (
                document_id, kind, numero, category, status, non_assujetti, client_id,
                source_document_id, transitaire_id, representant_id, armateur_id, numero_bl,
                date_creation, date_echeance, discount_type, discount_value, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );
        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(Uuid::new_v4())
            .bind(kind.as_str())
            .bind(&numero)
            .bind(normalized.category.as_str())
            .bind(kind.initial_status().as_str())
            .bind(normalized.non_assujetti)
            .bind(client_id)
            .bind(normalized.source_document_id)
            .bind(normalized.transitaire_id)
            .bind(normalized.representant_id)
            .bind(normalized.armateur_id)
            .bind(&normalized.numero_bl)
            .bind(normalized.date_creation)
            .bind(normalized.date_echeance)
            .bind(normalized.discount_type.as_str())
            .bind(normalized.discount_value)
            .bind(&normalized.notes)
            .bind(created_by)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert document: {}", e))
            })?;

        if let Some(ref lines) = normalized.lines {
            calculator_for(normalized.category)
                .create_lines(tx, document.document_id, lines)
                .await?;
        }

        let document = self.apply_totals(tx, &document).await?;

        if kind == DocumentKind::Invoice {
            self.create_primes(
                tx,
                &document,
                normalized.prime_transitaire,
                normalized.prime_representant,
            )
            .await?;
        }

        self.recompute_client_balance(tx, client_id).await?;

        // Work orders are pre-billing; only invoices feed the tax ledger.
        if kind == DocumentKind::Invoice {
            tax_ledger::add_document(tx, &document).await?;
        }

        Ok(document)
    }

    async fn get_locked(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        document_id: Uuid,
    ) -> Result<Document, AppError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE document_id = $1 AND deleted_utc IS NULL
             FOR UPDATE"
        );
        sqlx::query_as::<_, Document>(&sql)
            .bind(document_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to lock document: {}", e))
            })?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Document {} not found", document_id))
            })
    }

    async fn update_header(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        before: &Document,
        input: &DocumentInput,
        category: DocumentCategory,
    ) -> Result<Document, AppError> {
        let discount_type = input
            .discount_type
            .as_deref()
            .map(|s| DiscountType::from_string(s).as_str().to_string());

        let sql = format!(
            r#"
            UPDATE documents
            SET category = $2,
                client_id = COALESCE($3, client_id),
                transitaire_id = COALESCE($4, transitaire_id),
                representant_id = COALESCE($5, representant_id),
                armateur_id = COALESCE($6, armateur_id),
                numero_bl = COALESCE($7, numero_bl),
                date_creation = COALESCE($8, date_creation),
                date_echeance = COALESCE($9, date_echeance),
                non_assujetti = COALESCE($10, non_assujetti),
                discount_type = COALESCE($11, discount_type),
                discount_value = COALESCE($12, discount_value),
                notes = COALESCE($13, notes),
                updated_utc = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Document>(&sql)
            .bind(before.document_id)
            .bind(category.as_str())
            .bind(input.client_id)
            .bind(input.transitaire_id)
            .bind(input.representant_id)
            .bind(input.armateur_id)
            .bind(&input.numero_bl)
            .bind(input.date_creation)
            .bind(input.date_echeance)
            .bind(input.non_assujetti)
            .bind(discount_type)
            .bind(input.discount_value)
            .bind(&input.notes)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update document: {}", e))
            })
    }

    /// Recompute discount, taxes and total from the persisted lines and
    /// write every money field in a single update.
    async fn apply_totals(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        document: &Document,
    ) -> Result<Document, AppError> {
        let gross = calculator_for(document.category())
            .subtotal(tx, document.document_id)
            .await?;
        let config = self.tax_config.get().await?;

        let totals = compute_document_totals(
            gross,
            document.discount_type(),
            document.discount_value,
            document.non_assujetti,
            &config,
        );

        let sql = format!(
            r#"
            UPDATE documents
            SET subtotal = $2,
                discount_amount = $3,
                vat_amount = $4,
                css_amount = $5,
                total = $6,
                updated_utc = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Document>(&sql)
            .bind(document.document_id)
            .bind(totals.subtotal)
            .bind(totals.discount_amount)
            .bind(totals.taxes.vat)
            .bind(totals.taxes.css)
            .bind(totals.total)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to write totals: {}", e))
            })
    }

    async fn create_primes(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        document: &Document,
        prime_transitaire: Decimal,
        prime_representant: Decimal,
    ) -> Result<(), AppError> {
        let beneficiaries = [
            (
                BENEFICIARY_TRANSITAIRE,
                document.transitaire_id,
                prime_transitaire,
            ),
            (
                BENEFICIARY_REPRESENTANT,
                document.representant_id,
                prime_representant,
            ),
        ];

        for (kind, beneficiary_id, amount) in beneficiaries {
            let Some(beneficiary_id) = beneficiary_id else {
                continue;
            };
            if amount <= Decimal::ZERO {
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO primes (prime_id, document_id, beneficiary_kind, beneficiary_id, amount, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(document.document_id)
            .bind(kind)
            .bind(beneficiary_id)
            .bind(amount)
            .bind(PrimeStatus::Pending.as_str())
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert prime: {}", e))
            })?;
        }

        Ok(())
    }

    /// Paid commissions are immutable; only pending rows are replaced.
    async fn delete_pending_primes(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        document_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM primes WHERE document_id = $1 AND status = $2")
            .bind(document_id)
            .bind(PrimeStatus::Pending.as_str())
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete pending primes: {}", e))
            })?;
        Ok(())
    }

    /// Derived balance: issued invoice totals minus amounts paid, over
    /// non-cancelled, non-deleted invoices.
    async fn recompute_client_balance(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        client_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE clients
            SET balance = COALESCE((
                    SELECT SUM(total - amount_paid)
                    FROM documents
                    WHERE client_id = $1
                      AND kind = 'invoice'
                      AND status <> 'cancelled'
                      AND deleted_utc IS NULL
                ), 0),
                updated_utc = NOW()
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to recompute client balance: {}", e))
        })?;
        Ok(())
    }
}
