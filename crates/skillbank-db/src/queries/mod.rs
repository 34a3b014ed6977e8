//! Query helpers. Free functions take a `&Connection` so workflows can call
//! them on an open transaction; the `impl Database` blocks wrap the read-only
//! ones for callers outside a transaction.

pub mod balances;
pub mod charges;
pub mod notifications;
pub mod payments;
pub mod users;
pub mod withdrawals;

use std::str::FromStr;

use rusqlite::Row;
use rusqlite::types::Type;
use skillbank_types::models::ParseTagError;

/// Read a TEXT column and parse it into one of the tagged enums.
pub(crate) fn tag<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseTagError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Upper bound applied to every list query.
pub const MAX_PAGE: u32 = 200;

pub(crate) fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE)
}
