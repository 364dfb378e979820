//! Unique sequential document numbers under concurrent creators.
//!
//! The counter row lock is the correctness mechanism; the existence probe
//! is a defensive secondary check against numbers written outside the
//! counter (imports, restored backups).

use engine_core::error::AppError;
use sqlx::{Postgres, Transaction};
use tracing::{debug, instrument};

use crate::models::{DocumentKind, SequenceCounter};

/// Format a document number: `{prefix}-{year}-{NNNN}`, gap-tolerant,
/// never reused.
pub fn format_number(prefix: &str, year: i32, number: i64) -> String {
    format!("{}-{}-{:04}", prefix, year, number)
}

/// Parse the sequence part of a number for the given prefix and year.
pub fn parse_sequence(numero: &str, prefix: &str, year: i32) -> Option<i64> {
    numero
        .strip_prefix(&format!("{}-{}-", prefix, year))?
        .parse()
        .ok()
}

/// Generate the next unique number for a document kind within the
/// enclosing transaction.
///
/// Acquires an exclusive row lock on the counter, so concurrent creators
/// serialize here and nowhere else. A lock timeout surfaces as a
/// retryable conflict with no number consumed.
#[instrument(skip(tx))]
pub async fn next_document_number(
    tx: &mut Transaction<'_, Postgres>,
    kind: DocumentKind,
    year: i32,
) -> Result<String, AppError> {
    let counter = lock_counter(tx, kind).await?;

    // Numbers may exist beyond the counter; never go backwards. The scan
    // includes soft-deleted documents so their numbers are not resurrected.
    let pattern = format!("{}-{}-%", counter.prefix, year);
    let rows: Vec<String> =
        sqlx::query_scalar("SELECT numero FROM documents WHERE kind = $1 AND numero LIKE $2")
            .bind(kind.as_str())
            .bind(&pattern)
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to scan existing numbers: {}", e))
            })?;

    let highest = rows
        .iter()
        .filter_map(|n| parse_sequence(n, &counter.prefix, year))
        .max()
        .unwrap_or(0);

    let mut candidate = counter.next_number.max(highest + 1);

    // Defensive uniqueness probe; the row lock already prevents races.
    loop {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM documents WHERE numero = $1)")
                .bind(format_number(&counter.prefix, year, candidate))
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to probe number: {}", e))
                })?;
        if !exists {
            break;
        }
        candidate += 1;
    }

    sqlx::query("UPDATE sequence_counters SET next_number = $2 WHERE kind = $1")
        .bind(kind.as_str())
        .bind(candidate + 1)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to advance counter: {}", e))
        })?;

    let numero = format_number(&counter.prefix, year, candidate);
    debug!(numero = %numero, "document number reserved");
    Ok(numero)
}

async fn lock_counter(
    tx: &mut Transaction<'_, Postgres>,
    kind: DocumentKind,
) -> Result<SequenceCounter, AppError> {
    let select =
        "SELECT kind, prefix, next_number FROM sequence_counters WHERE kind = $1 FOR UPDATE";

    let existing = sqlx::query_as::<_, SequenceCounter>(select)
        .bind(kind.as_str())
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_lock_error)?;

    if let Some(counter) = existing {
        return Ok(counter);
    }

    // First document of this kind: seed the counter, then take the lock.
    sqlx::query(
        "INSERT INTO sequence_counters (kind, prefix, next_number) VALUES ($1, $2, 1)
         ON CONFLICT (kind) DO NOTHING",
    )
    .bind(kind.as_str())
    .bind(kind.number_prefix())
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to seed counter: {}", e)))?;

    sqlx::query_as::<_, SequenceCounter>(select)
        .bind(kind.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(map_lock_error)
}

fn map_lock_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some("55P03") => {
            AppError::Conflict(anyhow::anyhow!("Sequence counter is locked, retry later"))
        }
        _ => AppError::DatabaseError(anyhow::anyhow!("Failed to lock counter: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_zero_padded_to_four_digits() {
        assert_eq!(format_number("FAC", 2026, 7), "FAC-2026-0007");
        assert_eq!(format_number("OT", 2026, 1234), "OT-2026-1234");
        // Beyond four digits the number keeps growing, no truncation
        assert_eq!(format_number("FAC", 2026, 12345), "FAC-2026-12345");
    }

    #[test]
    fn parse_sequence_roundtrips_and_rejects_foreign_numbers() {
        assert_eq!(parse_sequence("FAC-2026-0042", "FAC", 2026), Some(42));
        assert_eq!(parse_sequence("FAC-2025-0042", "FAC", 2026), None);
        assert_eq!(parse_sequence("OT-2026-0042", "FAC", 2026), None);
        assert_eq!(parse_sequence("FAC-2026-abcd", "FAC", 2026), None);
    }
}
