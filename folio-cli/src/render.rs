//! Plain-text table output.

use folio_table::TableController;
use folio_table::memory::JsonRecord;
use serde_json::Value;

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders the current page with a header row and a pagination footer.
pub fn table(table: &TableController<JsonRecord>) -> String {
    let columns = table.columns();
    let rows = table.rows();

    let header: Vec<String> = columns
        .iter()
        .map(|c| match table.sort() {
            Some(sort) if sort.column == c.key() => format!("{} ({})", c.label(), sort.direction.as_str()),
            _ => c.label().to_string(),
        })
        .collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell_text(&c.value(row.data()))).collect())
        .collect();

    let widths: Vec<usize> = (0..columns.len())
        .map(|i| {
            body.iter()
                .map(|cells| cells[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(body.len() + 3);
    out.push(line(header.as_slice()));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.extend(body.iter().map(|cells| line(cells.as_slice())));

    let pagination = table.pagination();
    out.push(format!(
        "page {} of {} ({} records)",
        table.filters().page,
        pagination.pages_num,
        pagination.total
    ));
    out.join("\n")
}

/// Renders one record as `field: value` lines.
pub fn record(record: &JsonRecord) -> String {
    record
        .iter()
        .map(|(field, value)| format!("{field}: {}", cell_text(value)))
        .collect::<Vec<_>>()
        .join("\n")
}
