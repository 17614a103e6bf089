// crates/core/src/table.rs
//! Untyped tabular result for ad-hoc SQL.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// RFC 4180 CSV with a header row; nulls become empty fields.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| escape_csv_field(c)).collect();
        out.push_str(&header.join(","));
        out.push_str("\r\n");
        for row in &self.rows {
            let fields: Vec<String> = row
                .iter()
                .map(|v| escape_csv_field(&cell_text(v)))
                .collect();
            out.push_str(&fields.join(","));
            out.push_str("\r\n");
        }
        out
    }
}

/// Display text of a cell: strings unquoted, null empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csv_escapes_and_nulls() {
        let table = Table {
            columns: vec!["brand".into(), "revenue".into()],
            rows: vec![
                vec![json!("Acme, Inc."), json!(1250.5)],
                vec![json!("Say \"hi\""), Value::Null],
            ],
        };
        assert_eq!(
            table.to_csv(),
            "brand,revenue\r\n\"Acme, Inc.\",1250.5\r\n\"Say \"\"hi\"\"\",\r\n"
        );
    }

    #[test]
    fn test_empty_table_csv_has_header_only() {
        let table = Table::new(vec!["a".into()]);
        assert!(table.is_empty());
        assert_eq!(table.to_csv(), "a\r\n");
    }
}
