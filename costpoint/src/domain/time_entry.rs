use serde::{de, Deserialize, Deserializer, Serialize};

/// Format of every date the grid and the entry source exchange, e.g. `01/16/24`.
pub const DATE_FORMAT: &str = "%m/%d/%y";

/// A pending time entry as delivered by the entry source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// `MM/DD/YY`, matched verbatim against the grid's date headers.
    pub date: String,
    pub charge_code: String,
    #[serde(deserialize_with = "deserialize_hours")]
    pub hours: f64,
    #[serde(default, deserialize_with = "deserialize_notes")]
    pub notes: String,
}

impl TimeEntry {
    pub fn new(
        date: impl Into<String>,
        charge_code: impl Into<String>,
        hours: f64,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            charge_code: charge_code.into(),
            hours,
            notes: notes.into(),
        }
    }

    /// The hours as they are typed into a grid cell.
    pub fn hours_text(&self) -> String {
        format_hours(self.hours)
    }
}

/// Costpoint shows hours with two decimals, so that is what gets typed.
pub fn format_hours(hours: f64) -> String {
    format!("{:.2}", hours)
}

/// Whether a cell's hours text shows `hours` as it would be typed, so `1.33` matches
/// `1.333`. Empty or unparseable text never matches.
pub fn hours_match(cell_text: &str, hours: f64) -> bool {
    cell_text
        .trim()
        .parse::<f64>()
        .map(|value| format_hours(value) == format_hours(hours))
        .unwrap_or(false)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHours {
    Number(f64),
    Text(String),
}

fn deserialize_hours<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawHours::deserialize(deserializer)? {
        RawHours::Number(hours) => Ok(hours),
        RawHours::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid hours value: {:?}", text))),
    }
}

fn deserialize_notes<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_string_hours_and_missing_notes() {
        let raw = r#"[
            {"date": "01/16/24", "charge_code": "ADMIN", "hours": "7.50"},
            {"date": "01/17/24", "charge_code": "DEV", "hours": 2, "notes": "standup"},
            {"date": "01/18/24", "charge_code": "DEV", "hours": 1.25, "notes": null}
        ]"#;

        let entries: Vec<TimeEntry> = serde_json::from_str(raw).unwrap();

        assert_eq!(entries[0], TimeEntry::new("01/16/24", "ADMIN", 7.5, ""));
        assert_eq!(entries[1], TimeEntry::new("01/17/24", "DEV", 2.0, "standup"));
        assert_eq!(entries[2].notes, "");
    }

    #[test]
    fn rejects_non_numeric_hours() {
        let raw = r#"{"date": "01/16/24", "charge_code": "ADMIN", "hours": "lots"}"#;
        assert!(serde_json::from_str::<TimeEntry>(raw).is_err());
    }

    #[test]
    fn hours_are_typed_with_two_decimals() {
        assert_eq!(TimeEntry::new("01/16/24", "ADMIN", 7.5, "").hours_text(), "7.50");
        assert_eq!(format_hours(8.0), "8.00");
    }

    #[test]
    fn hours_match_compares_numerically() {
        assert!(hours_match("7.5", 7.5));
        assert!(hours_match(" 7.50 ", 7.5));
        assert!(!hours_match("", 0.0));
        assert!(!hours_match("8.00", 7.5));
    }

    #[test]
    fn hours_match_compares_at_typed_precision() {
        assert!(hours_match("1.33", 1.333));
        assert!(hours_match("0.67", 2.0 / 3.0));
        assert!(!hours_match("1.33", 1.336));
    }
}
