//! Engine-wide constants.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal precision used when rounding intermediate calculations.
pub const DECIMAL_PRECISION: u32 = 6;

/// Precision used for displayed monetary amounts.
pub const MONEY_PRECISION: u32 = 2;

/// Trading days per year, used for annualization.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// sqrt(252), used to annualize daily volatility.
pub const SQRT_TRADING_DAYS: Decimal = dec!(15.874507866);

/// Calendar days per year for pro-rata fee accrual.
pub const DAYS_PER_YEAR: Decimal = dec!(365);

/// Average calendar days per year, used for bond accrual in years.
pub const DAYS_PER_YEAR_FRACTIONAL: Decimal = dec!(365.25);

/// Default annual management fee rate (2%).
pub const DEFAULT_MANAGEMENT_FEE_RATE: Decimal = dec!(0.02);

/// Default performance fee rate on gains above the high-water mark (20%).
pub const DEFAULT_PERFORMANCE_FEE_RATE: Decimal = dec!(0.20);

/// Annual rate substituted when an indexer series has a gap (5%).
pub const INDEXER_FALLBACK_ANNUAL_RATE: Decimal = dec!(0.05);

/// Default reporting currency.
pub const DEFAULT_BASE_CURRENCY: &str = "BRL";

/// Tolerance for NAV allocation conservation checks, in currency units.
pub const ALLOCATION_TOLERANCE: Decimal = dec!(0.01);
