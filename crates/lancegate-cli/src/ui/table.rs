//! Table rendering for CLI output using comfy-table.
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `lancegate tables` | `render_tables_table()` |
//! | `lancegate search` | `render_search_table()` |

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};

use lancegate_core::{SearchHit, TableInfo};

use super::color::terminal_width;
use super::format::{format_distance, truncate_str};

/// Render the table listing for `lancegate tables`.
///
/// # Example Output
///
/// ```text
/// TABLE        DIM   ROWS
/// docs         384     42
/// notes          3      2
/// ```
pub fn render_tables_table(tables: &[TableInfo]) -> String {
    if tables.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);

    table.set_header(vec![
        Cell::new("TABLE"),
        Cell::new("DIM").set_alignment(CellAlignment::Right),
        Cell::new("ROWS").set_alignment(CellAlignment::Right),
    ]);

    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(10)), // TABLE
        ColumnConstraint::LowerBoundary(Width::Fixed(5)),  // DIM
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),  // ROWS
    ]);

    for info in tables {
        table.add_row(vec![
            Cell::new(truncate_str(&info.name, 40)),
            Cell::new(info.dimension).set_alignment(CellAlignment::Right),
            Cell::new(info.rows).set_alignment(CellAlignment::Right),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render search hits for `lancegate search`.
///
/// Text and metadata are truncated to fit the terminal width.
///
/// # Example Output
///
/// ```text
/// #   DISTANCE   TEXT      METADATA
/// 1   0.0000     a         {"source":"cli"}
/// 2   1.4142     b         -
/// ```
pub fn render_search_table(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return String::new();
    }

    // Rank and distance columns take roughly 16 characters
    let available = terminal_width().saturating_sub(16).max(20);
    let text_width = available * 3 / 5;
    let meta_width = available - text_width;

    let mut table = Table::new();
    table.load_preset(NOTHING);

    table.set_header(vec![
        Cell::new("#").set_alignment(CellAlignment::Right),
        Cell::new("DISTANCE").set_alignment(CellAlignment::Right),
        Cell::new("TEXT"),
        Cell::new("METADATA"),
    ]);

    for (idx, hit) in hits.iter().enumerate() {
        let text = hit
            .text
            .as_deref()
            .map(|t| truncate_str(&t.replace('\n', " "), text_width))
            .unwrap_or_else(|| "-".to_string());
        let metadata = hit
            .metadata
            .as_ref()
            .map(|m| truncate_str(&m.to_string(), meta_width))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(idx + 1).set_alignment(CellAlignment::Right),
            Cell::new(format_distance(hit.distance)).set_alignment(CellAlignment::Right),
            Cell::new(text),
            Cell::new(metadata),
        ]);
    }

    table.trim_fmt().to_string()
}
