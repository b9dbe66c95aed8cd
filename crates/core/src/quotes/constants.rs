//! Price synchronization constants.

/// Default number of days per fetch window when splitting a range.
pub const DEFAULT_BATCH_DAYS: i64 = 100;

/// Delay between consecutive fetch windows for the same symbol.
/// Keeps the engine under upstream per-symbol rate limits.
pub const INTER_BATCH_DELAY_MS: u64 = 500;

/// Delay between symbols during a bulk fetch.
pub const INTER_SYMBOL_DELAY_MS: u64 = 1_000;

/// Maximum attempts for a single fetch window before giving up on it.
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between retries of a failed window.
pub const RETRY_BASE_DELAY_MS: u64 = 250;

/// Banco Central series codes for indexer data.
pub const BCB_SERIES_IPCA: u32 = 433;
pub const BCB_SERIES_SELIC: u32 = 4390;
pub const BCB_SERIES_CDI: u32 = 4391;
