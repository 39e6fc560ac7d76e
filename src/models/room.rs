use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// Integers up to 2^53 are exact in an f64
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A single cell value after type coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Coerce a raw cell into a boolean or number where it parses cleanly.
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();

        if value.eq_ignore_ascii_case("true") {
            return FieldValue::Bool(true);
        }
        if value.eq_ignore_ascii_case("false") {
            return FieldValue::Bool(false);
        }

        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => FieldValue::Number(number),
            _ => FieldValue::Text(value.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One room tab of the spreadsheet, reduced to its identifying columns and
/// the remaining non-empty cells of its first data row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSheetRecord {
    pub room_id: String,
    pub room_type: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl RoomSheetRecord {
    /// Build a record from sheet rows (first row as headers).
    ///
    /// Returns `None` when the sheet has no data row, lacks a room id or room
    /// type column, or leaves either of those cells empty.
    pub fn from_sheet_rows(rows: &[Vec<String>]) -> Option<Self> {
        let (headers, data) = match rows {
            [headers, data, ..] => (headers, data),
            _ => return None,
        };

        let id_column = find_column(headers, "room id", "id")?;
        let type_column = find_column(headers, "room type", "type")?;

        let cell = |idx: usize| data.get(idx).map(|s| s.trim()).unwrap_or_default();

        let room_id = cell(id_column);
        let room_type = cell(type_column);
        if room_id.is_empty() || room_type.is_empty() {
            return None;
        }

        let fields = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != id_column && *idx != type_column)
            .filter_map(|(idx, header)| {
                let key = normalize_key(header);
                let value = cell(idx);
                match key.is_empty() || value.is_empty() {
                    true => None,
                    false => Some((key, FieldValue::parse(value))),
                }
            })
            .collect();

        Some(RoomSheetRecord {
            room_id: room_id.to_string(),
            room_type: room_type.to_string(),
            fields,
        })
    }
}

/// Lowercase the header and join its words with underscores.
pub fn normalize_key(header: &str) -> String {
    header
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Exact header matches win over headers that merely contain `label`.
fn find_column(headers: &[String], label: &str, short: &str) -> Option<usize> {
    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    headers
        .iter()
        .position(|h| h == label || h == short)
        .or_else(|| headers.iter().position(|h| h.contains(label)))
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;

    pub(crate) fn rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    pub(crate) fn mock_room_rows(n: u32) -> Vec<Vec<String>> {
        let room_id = format!("R{}", n);
        rows(&[
            &["Room ID", "Room Type", "Smoke Alarm Count"],
            &[room_id.as_str(), "Bedroom", "1"],
        ])
    }

    pub(crate) fn mock_room(n: u32) -> RoomSheetRecord {
        RoomSheetRecord {
            room_id: format!("R{}", n),
            room_type: "Bedroom".to_string(),
            fields: BTreeMap::from([(
                "smoke_alarm_count".to_string(),
                FieldValue::Number(1.0),
            )]),
        }
    }
}
