//! Column model for the listing tables.
//!
//! Each column declares how its cells render when the column is defined,
//! so rows are never inspected to pick a renderer. Sorting, filtering and
//! pagination belong to whatever table widget displays these cells.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::product::format_price;

/// Rows per page the listing tables start with.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// How every cell of a column is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Text,
    /// Money, formatted like the detail card.
    Price,
    Boolean,
    Progress,
}

/// A column of a listing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    /// Field of the row object this column reads.
    pub key: String,
    pub cell: CellKind,
}

/// A resolved cell, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellView {
    Text(String),
    Status { active: bool, label: &'static str },
    /// Percentage, clamped to 0..=100.
    Progress(u8),
}

impl ColumnDef {
    pub fn new(header: impl Into<String>, key: impl Into<String>, cell: CellKind) -> Self {
        Self {
            header: header.into(),
            key: key.into(),
            cell,
        }
    }

    /// Render this column's cell for one row.
    pub fn render(&self, row: &Value) -> CellView {
        let value = row.get(&self.key).unwrap_or(&Value::Null);
        match self.cell {
            CellKind::Text => CellView::Text(text_of(value)),
            CellKind::Price => CellView::Text(price_of(value)),
            CellKind::Boolean => {
                let active = value.as_bool().unwrap_or(false);
                CellView::Status {
                    active,
                    label: if active { "Active" } else { "Inactive" },
                }
            }
            CellKind::Progress => {
                let pct = value.as_f64().unwrap_or(0.0).clamp(0.0, 100.0);
                CellView::Progress(pct.round() as u8)
            }
        }
    }
}

/// Numbers and numeric text as `$x.xx`; anything else is shown as is.
fn price_of(value: &Value) -> String {
    let amount = match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => return s.clone(),
        },
        other => return other.to_string(),
    };
    format_price(amount)
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl std::fmt::Display for CellView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellView::Text(s) => f.write_str(s),
            CellView::Status { label, .. } => f.write_str(label),
            CellView::Progress(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Columns of the product listing table.
pub fn product_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("NAME", "name", CellKind::Text),
        ColumnDef::new("MODEL", "model", CellKind::Text),
        ColumnDef::new("PRICE", "price", CellKind::Price),
        ColumnDef::new("LOCATION", "location", CellKind::Text),
        ColumnDef::new("CATEGORY", "category", CellKind::Text),
        ColumnDef::new("FEATURED", "isFeatured", CellKind::Boolean),
    ]
}

/// Render one row against a set of columns.
pub fn render_row(columns: &[ColumnDef], row: &Value) -> Vec<CellView> {
    columns.iter().map(|c| c.render(row)).collect()
}
