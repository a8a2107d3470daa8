use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::{debug, warn};

use crate::domain::DATE_FORMAT;
use crate::page::TextElement;

static DATE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}/\d{2}/\d{2}\b").expect("valid date pattern"));
static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\D*$").expect("valid id pattern"));

/// Maps `MM/DD/YY` dates to the 1-based column of the hours cells under them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateColumnMap {
    columns: HashMap<String, u32>,
    offset: u32,
}

impl DateColumnMap {
    /// Builds the map from the date headers currently rendered.
    ///
    /// Headers are ordered by the number embedded in their id, since the host does not
    /// insert them left to right. Columns scrolled out of view are not rendered at all,
    /// so the visible headers are shifted by [`pay_period_offset`] of the first one.
    pub fn from_headers(headers: &[TextElement]) -> Self {
        let mut dated: Vec<(u64, String)> = headers
            .iter()
            .filter_map(|header| {
                let Some(date) = DATE_TEXT.find(&header.text) else {
                    debug!(id = %header.id, "Header carries no date");
                    return None;
                };
                let position = header_position(&header.id)?;
                Some((position, date.as_str().to_string()))
            })
            .collect();
        dated.sort_by_key(|(position, _)| *position);

        let Some(first_day) = dated.first().and_then(|(_, date)| day_of_month(date)) else {
            return Self::default();
        };
        let offset = pay_period_offset(first_day);

        let mut columns = HashMap::with_capacity(dated.len());
        let mut next_column = 1 + offset;
        for (_, date) in dated {
            if columns.contains_key(&date) {
                warn!(date = %date, "Duplicate date header");
                continue;
            }
            columns.insert(date, next_column);
            next_column += 1;
        }

        Self { columns, offset }
    }

    pub fn column(&self, date: &str) -> Option<u32> {
        self.columns.get(date.trim()).copied()
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.columns.iter().map(|(date, column)| (date.as_str(), *column))
    }
}

/// Days between the start of the bi-monthly pay period (the 1st or the 16th) and `day`.
pub fn pay_period_offset(day: u32) -> u32 {
    if day >= 16 {
        day - 16
    } else {
        day.saturating_sub(1)
    }
}

fn header_position(id: &str) -> Option<u64> {
    let Some(digits) = TRAILING_NUMBER.captures(id).and_then(|caps| caps.get(1)) else {
        warn!(id, "Date header id has no numeric part");
        return None;
    };
    match digits.as_str().parse() {
        Ok(position) => Some(position),
        Err(e) => {
            warn!(id, error = %e, "Date header id number is unusable");
            None
        }
    }
}

fn day_of_month(date: &str) -> Option<u32> {
    match NaiveDate::parse_from_str(date, DATE_FORMAT) {
        Ok(date) => Some(date.day()),
        Err(e) => {
            warn!(date, error = %e, "First visible header is not a calendar date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(id: &str, text: &str) -> TextElement {
        TextElement {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn offset_follows_pay_period_start() {
        assert_eq!(pay_period_offset(1), 0);
        assert_eq!(pay_period_offset(5), 4);
        assert_eq!(pay_period_offset(15), 14);
        assert_eq!(pay_period_offset(16), 0);
        assert_eq!(pay_period_offset(20), 4);
        assert_eq!(pay_period_offset(31), 15);
    }

    #[test]
    fn maps_period_start_to_first_column() {
        let map = DateColumnMap::from_headers(&[
            header("hdr_0", "Tue\n01/16/24"),
            header("hdr_1", "Wed\n01/17/24"),
        ]);

        assert_eq!(map.column("01/16/24"), Some(1));
        assert_eq!(map.column("01/17/24"), Some(2));
        assert_eq!(map.offset(), 0);
    }

    #[test]
    fn sorts_by_embedded_id_not_dom_order() {
        let map = DateColumnMap::from_headers(&[
            header("hdr_10", "01/04/24"),
            header("hdr_2", "01/02/24"),
            header("hdr_3", "01/03/24"),
        ]);

        assert_eq!(map.column("01/02/24"), Some(2));
        assert_eq!(map.column("01/03/24"), Some(3));
        assert_eq!(map.column("01/04/24"), Some(4));
    }

    #[test]
    fn scrolled_grid_is_shifted_by_offset() {
        let map = DateColumnMap::from_headers(&[
            header("h20", "01/20/24"),
            header("h21", "01/21/24"),
            header("h22", "01/22/24"),
        ]);

        assert_eq!(map.offset(), 4);
        assert_eq!(map.column("01/20/24"), Some(5));

        let mut columns: Vec<u32> = map.iter().map(|(_, c)| c).collect();
        columns.sort();
        assert_eq!(columns, vec![5, 6, 7]);
    }

    #[test]
    fn skips_headers_without_date_or_id() {
        let map = DateColumnMap::from_headers(&[
            header("total", "Total"),
            header("nodigits", "01/01/24"),
            header("h1", "01/01/24"),
        ]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.column("01/01/24"), Some(1));
    }

    #[test]
    fn four_digit_years_are_not_truncated() {
        let map = DateColumnMap::from_headers(&[
            header("h0", "01/16/2024"),
            header("h1", "Wed\n01/17/24"),
        ]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.column("01/16/20"), None);
        assert_eq!(map.column("01/17/24"), Some(2));
    }

    #[test]
    fn oversized_id_number_is_skipped() {
        let map = DateColumnMap::from_headers(&[
            header("h99999999999999999999999", "01/16/24"),
            header("h1", "01/17/24"),
        ]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.column("01/16/24"), None);
    }

    #[test]
    fn no_headers_gives_empty_map() {
        assert!(DateColumnMap::from_headers(&[]).is_empty());
    }
}
