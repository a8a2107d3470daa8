use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::page::InputElement;

static CHARGE_CODE_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UDT02_ID-_(\d+)_E$").expect("valid charge code pattern"));

/// Maps charge codes to the 0-based grid row they are entered on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChargeCodeRowMap {
    rows: HashMap<String, u32>,
}

impl ChargeCodeRowMap {
    /// Reads the row number out of each charge code input id and keys it by the
    /// input's value. Inputs that are not charge code inputs are ignored, as are
    /// empty rows.
    pub fn from_inputs(inputs: &[InputElement]) -> Self {
        let mut rows = HashMap::new();

        for input in inputs {
            let Some(row) = CHARGE_CODE_INPUT
                .captures(&input.id)
                .and_then(|caps| caps[1].parse::<u32>().ok())
            else {
                continue;
            };

            let code = input.value.trim();
            if code.is_empty() {
                continue;
            }

            if let Some(previous) = rows.insert(code.to_string(), row) {
                warn!(charge_code = code, previous, row, "Charge code appears on several rows");
            }
        }

        Self { rows }
    }

    pub fn row(&self, charge_code: &str) -> Option<u32> {
        self.rows.get(charge_code.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
