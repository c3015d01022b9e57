//! Price history port trait.

use crate::domain::error::TitanError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait PriceDataPort {
    /// Adjusted daily closes for `ticker` within `[start_date, end_date]`.
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, TitanError>;

    fn list_tickers(&self) -> Result<Vec<String>, TitanError>;
}
