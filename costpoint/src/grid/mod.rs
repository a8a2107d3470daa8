//! Coordinate resolution: which grid cell a date and charge code land in.

mod charge_codes;
mod date_columns;

pub use charge_codes::*;
pub use date_columns::*;

use tracing::info;

use crate::domain::{CellRef, SkipReason, TimeEntry};
use crate::page::{HostPage, PageError, DATE_HEADER_CLASS};

/// Both lookup tables for one run. Only valid for the grid as it was rendered when
/// [`resolve_layout`] read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub dates: DateColumnMap,
    pub charge_codes: ChargeCodeRowMap,
}

impl GridLayout {
    pub fn new(dates: DateColumnMap, charge_codes: ChargeCodeRowMap) -> Self {
        Self {
            dates,
            charge_codes,
        }
    }

    pub fn cell_for(&self, entry: &TimeEntry) -> Result<CellRef, SkipReason> {
        let column = self
            .dates
            .column(&entry.date)
            .ok_or_else(|| SkipReason::UnmappedDate(entry.date.clone()))?;
        let row = self
            .charge_codes
            .row(&entry.charge_code)
            .ok_or_else(|| SkipReason::UnmappedChargeCode(entry.charge_code.clone()))?;

        Ok(CellRef::new(row, column))
    }
}

/// Reads the date headers and charge code inputs off the page.
pub async fn resolve_layout<P>(page: &P) -> Result<GridLayout, PageError>
where
    P: HostPage + ?Sized,
{
    let headers = page.elements_with_class(DATE_HEADER_CLASS).await?;
    let dates = DateColumnMap::from_headers(&headers);

    let inputs = page.inputs().await?;
    let charge_codes = ChargeCodeRowMap::from_inputs(&inputs);

    info!(
        dates = dates.len(),
        offset = dates.offset(),
        charge_codes = charge_codes.len(),
        "Resolved grid layout"
    );

    Ok(GridLayout::new(dates, charge_codes))
}
