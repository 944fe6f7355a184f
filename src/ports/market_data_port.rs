//! Market data access port trait.

use crate::domain::error::StocksimError;
use crate::domain::ohlcv::Bar;
use crate::domain::quote::Quote;
use chrono::NaiveDate;

/// Source of quotes and daily history.
///
/// Failures surface as [`StocksimError::ProviderUnavailable`]. Implementations
/// never substitute generated data for a failed fetch.
pub trait MarketDataPort {
    fn get_quote(&self, ticker: &str) -> Result<Quote, StocksimError>;

    /// Daily bars with `start <= date <= end`, ascending by date.
    fn get_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, StocksimError>;
}
