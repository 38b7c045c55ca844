//! Conversion of absolute category values into shares of the row total.

use crate::errors::{NZCalcError, NZCalcResult};
use crate::timeseries::{FloatValue, TimeseriesTable, Year};
use ndarray::Array1;

/// Name of the retained row-total column
pub const TOTAL_COLUMN: &str = "Total";

/// Category shares of a row total, plus the total itself.
///
/// A row whose observed values sum to zero has no meaningful shares. Those rows are
/// kept as NaN and recorded in [`SharesTable::zero_total_years`]; reading a category
/// share out of a table with such rows fails with [`NZCalcError::ZeroTotal`].
/// The total column is always readable.
#[derive(Debug, Clone, PartialEq)]
pub struct SharesTable {
    table: TimeseriesTable,
    zero_total_years: Vec<Year>,
}

impl SharesTable {
    pub fn years(&self) -> &[Year] {
        self.table.years()
    }

    /// Categories excluding the total column
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.table.categories().filter(|c| *c != TOTAL_COLUMN)
    }

    pub fn total(&self) -> NZCalcResult<&Array1<FloatValue>> {
        self.table.column(TOTAL_COLUMN)
    }

    pub fn zero_total_years(&self) -> &[Year] {
        &self.zero_total_years
    }

    pub fn is_usable(&self) -> bool {
        self.zero_total_years.is_empty()
    }

    /// Shares for one category, or the total when `category` is [`TOTAL_COLUMN`]
    pub fn column(&self, category: &str) -> NZCalcResult<&Array1<FloatValue>> {
        if category != TOTAL_COLUMN {
            if let Some(year) = self.zero_total_years.first() {
                return Err(NZCalcError::ZeroTotal { year: *year });
            }
        }
        self.table.column(category)
    }

    /// The whole table, only if every row had a non-zero total
    pub fn table(&self) -> NZCalcResult<&TimeseriesTable> {
        match self.zero_total_years.first() {
            Some(year) => Err(NZCalcError::ZeroTotal { year: *year }),
            None => Ok(&self.table),
        }
    }

    /// A single-column table for one category, ready for extrapolation
    pub fn category_table(&self, category: &str) -> NZCalcResult<TimeseriesTable> {
        let values = self.column(category)?.clone();
        TimeseriesTable::from_columns(self.table.years().to_vec(), [(category, values)])
    }
}

/// Convert a cleaned table into shares of each row's total.
///
/// Missing cells stay missing and do not contribute to the total.
pub fn normalise(table: &TimeseriesTable) -> NZCalcResult<SharesTable> {
    if table.has_column(TOTAL_COLUMN) {
        return Err(NZCalcError::InvalidTable(format!(
            "input already contains a '{TOTAL_COLUMN}' column"
        )));
    }

    let totals = table.row_totals();
    let zero_total_years: Vec<Year> = table
        .years()
        .iter()
        .zip(totals.iter())
        .filter(|(_, t)| **t == 0.0)
        .map(|(y, _)| *y)
        .collect();
    if !zero_total_years.is_empty() {
        log::warn!(
            "Row totals are zero for {:?}; shares for those years are undefined",
            zero_total_years
        );
    }

    let mut shares = TimeseriesTable::new(table.years().to_vec())?;
    for (name, values) in table.iter() {
        let column = Array1::from_iter(values.iter().zip(totals.iter()).map(|(v, t)| {
            if *t == 0.0 {
                FloatValue::NAN
            } else {
                v / t
            }
        }));
        shares.set_column(name, column)?;
    }
    shares.set_column(TOTAL_COLUMN, totals)?;

    Ok(SharesTable {
        table: shares,
        zero_total_years,
    })
}
