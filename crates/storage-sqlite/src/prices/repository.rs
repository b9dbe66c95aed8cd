use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::model::{PriceBarDB, SymbolMetadataDB, DATE_FORMAT};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::price_history::dsl as price_history_dsl;
use crate::schema::symbol_metadata::dsl as symbol_metadata_dsl;
use fundfolio_core::quotes::{PriceBar, PriceStore, SymbolMetadata};
use fundfolio_core::Result;

/// SQLite-backed [`PriceStore`].
///
/// Mutations go through the serialized writer actor; reads use the pool
/// directly. Symbol metadata is refreshed in the same transaction as the
/// bars it describes.
pub struct PriceRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PriceRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Recomputes coverage metadata for one symbol from its stored bars.
///
/// Runs inside the writer's transaction so bars and metadata never diverge.
fn refresh_metadata(conn: &mut SqliteConnection, symbol: &str) -> Result<()> {
    let (first, last, count) = price_history_dsl::price_history
        .filter(price_history_dsl::symbol.eq(symbol))
        .select((
            diesel::dsl::min(price_history_dsl::date),
            diesel::dsl::max(price_history_dsl::date),
            count_star(),
        ))
        .first::<(Option<String>, Option<String>, i64)>(conn)
        .map_err(StorageError::QueryFailed)?;

    match (first, last) {
        (Some(first_date), Some(last_date)) => {
            let row = SymbolMetadataDB {
                symbol: symbol.to_string(),
                first_date,
                last_date,
                last_updated: Utc::now().to_rfc3339(),
                total_records: count,
            };
            diesel::replace_into(symbol_metadata_dsl::symbol_metadata)
                .values(&row)
                .execute(conn)
                .map_err(StorageError::QueryFailed)?;
        }
        _ => {
            diesel::delete(
                symbol_metadata_dsl::symbol_metadata
                    .filter(symbol_metadata_dsl::symbol.eq(symbol)),
            )
            .execute(conn)
            .map_err(StorageError::QueryFailed)?;
        }
    }
    Ok(())
}

#[async_trait]
impl PriceStore for PriceRepository {
    async fn upsert_bars(&self, bars: &[PriceBar]) -> Result<usize> {
        if bars.is_empty() {
            return Ok(0);
        }

        let db_rows: Vec<PriceBarDB> = bars.iter().map(PriceBarDB::from).collect();
        let symbols: BTreeSet<String> = bars.iter().map(|b| b.symbol.clone()).collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut total_upserted = 0;
                for chunk in db_rows.chunks(1_000) {
                    total_upserted += diesel::replace_into(price_history_dsl::price_history)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::QueryFailed)?;
                }
                for symbol in &symbols {
                    refresh_metadata(conn, symbol)?;
                }
                Ok(total_upserted)
            })
            .await
    }

    async fn delete_symbol(&self, symbol: &str) -> Result<usize> {
        let symbol = symbol.to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let count = diesel::delete(
                    price_history_dsl::price_history
                        .filter(price_history_dsl::symbol.eq(&symbol)),
                )
                .execute(conn)
                .map_err(StorageError::QueryFailed)?;
                diesel::delete(
                    symbol_metadata_dsl::symbol_metadata
                        .filter(symbol_metadata_dsl::symbol.eq(&symbol)),
                )
                .execute(conn)
                .map_err(StorageError::QueryFailed)?;
                Ok(count)
            })
            .await
    }

    fn latest_bar(&self, symbol: &str) -> Result<Option<PriceBar>> {
        let mut conn = get_connection(&self.pool)?;

        let result = price_history_dsl::price_history
            .filter(price_history_dsl::symbol.eq(symbol))
            .order(price_history_dsl::date.desc())
            .first::<PriceBarDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(result.map(PriceBar::from))
    }

    fn bar_on_or_before(&self, symbol: &str, as_of: NaiveDate) -> Result<Option<PriceBar>> {
        let mut conn = get_connection(&self.pool)?;
        let as_of_str = as_of.format(DATE_FORMAT).to_string();

        let result = price_history_dsl::price_history
            .filter(price_history_dsl::symbol.eq(symbol))
            .filter(price_history_dsl::date.le(&as_of_str))
            .order(price_history_dsl::date.desc())
            .first::<PriceBarDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(result.map(PriceBar::from))
    }

    fn bars_in_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let mut conn = get_connection(&self.pool)?;

        let start_str = start.format(DATE_FORMAT).to_string();
        let end_str = end.format(DATE_FORMAT).to_string();

        let results = price_history_dsl::price_history
            .filter(price_history_dsl::symbol.eq(symbol))
            .filter(price_history_dsl::date.ge(&start_str))
            .filter(price_history_dsl::date.le(&end_str))
            .order(price_history_dsl::date.asc())
            .load::<PriceBarDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(PriceBar::from).collect())
    }

    fn metadata(&self, symbol: &str) -> Result<Option<SymbolMetadata>> {
        let mut conn = get_connection(&self.pool)?;

        let result = symbol_metadata_dsl::symbol_metadata
            .filter(symbol_metadata_dsl::symbol.eq(symbol))
            .first::<SymbolMetadataDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(result.map(SymbolMetadata::from))
    }

    fn all_metadata(&self) -> Result<Vec<SymbolMetadata>> {
        let mut conn = get_connection(&self.pool)?;

        let results = symbol_metadata_dsl::symbol_metadata
            .order(symbol_metadata_dsl::symbol.asc())
            .load::<SymbolMetadataDB>(&mut conn)
            .into_core()?;

        Ok(results.into_iter().map(SymbolMetadata::from).collect())
    }
}
