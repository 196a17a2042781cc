use crate::code::CodeRenderer;
use crate::record::{RowRecord, Sheet};
use serde::Serialize;
use std::fmt::Write;

/// One body row of the table: the visible cells plus the code payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub payload: String,
}

/// The rendered table surface
///
/// Built as a pure function of (column list, rows, identifier field). The
/// same value feeds the HTML view and the PNG export, so an export captures
/// exactly what is on screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub code_header: String,
    pub rows: Vec<TableRow>,
}

/// Code payload of a row: the value at `identifier_field`, or empty
pub fn code_payload(row: &RowRecord, identifier_field: &str) -> String {
    row.get(identifier_field).unwrap_or_default().to_string()
}

impl TableView {
    /// Lays out `sheet` with one code per row keyed by `identifier_field`
    ///
    /// Columns missing from a row render as empty cells.
    ///
    /// # Arguments
    /// * `sheet` - Decoded rows and column list
    /// * `identifier_field` - Column supplying each row's payload
    /// * `code_header` - Label of the trailing code column
    pub fn build(sheet: &Sheet, identifier_field: &str, code_header: &str) -> Self {
        let rows = sheet
            .rows
            .iter()
            .map(|row| TableRow {
                cells: sheet
                    .columns
                    .iter()
                    .map(|column| row.get(column).unwrap_or_default().to_string())
                    .collect(),
                payload: code_payload(row, identifier_field),
            })
            .collect();

        TableView {
            columns: sheet.columns.clone(),
            code_header: code_header.to_string(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header labels including the code column
    pub fn header_labels(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.code_header.as_str()))
    }

    /// Renders the table as an HTML fragment with inline SVG codes
    ///
    /// Returns an empty string for an empty table, mirroring the page which
    /// shows nothing until rows are loaded.
    pub fn to_html(&self, codes: &CodeRenderer) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut html = String::from("<table id=\"qr-table\" class=\"qr-table\">\n<thead><tr>");
        for label in self.header_labels() {
            let _ = write!(html, "<th>{}</th>", escape_html(label));
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        for row in &self.rows {
            html.push_str("<tr>");
            for cell in &row.cells {
                let _ = write!(html, "<td>{}</td>", escape_html(cell));
            }
            let _ = write!(
                html,
                "<td class=\"code\" data-payload=\"{}\">{}</td>",
                escape_html(&row.payload),
                codes.render_svg(&row.payload)
            );
            html.push_str("</tr>\n");
        }

        html.push_str("</tbody>\n</table>");
        html
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> Sheet {
        Sheet::from_rows(vec![
            [("ID", "A1"), ("Name", "X")].into_iter().collect(),
            [("ID", "A2"), ("Name", "Y")].into_iter().collect(),
        ])
    }

    #[test]
    fn payload_follows_identifier_field() {
        let sheet = sample_sheet();

        let by_id = TableView::build(&sheet, "ID", "QR Code");
        let payloads: Vec<_> = by_id.rows.iter().map(|r| r.payload.as_str()).collect();
        assert_eq!(payloads, vec!["A1", "A2"]);

        let by_name = TableView::build(&sheet, "Name", "QR Code");
        let payloads: Vec<_> = by_name.rows.iter().map(|r| r.payload.as_str()).collect();
        assert_eq!(payloads, vec!["X", "Y"]);
    }

    #[test]
    fn absent_field_gives_empty_payload() {
        let view = TableView::build(&sample_sheet(), "識別コード", "QR Code");
        assert!(view.rows.iter().all(|r| r.payload.is_empty()));
        assert_eq!(view.rows.len(), 2);
    }

    #[test]
    fn missing_cells_render_empty() {
        let sheet = Sheet::from_rows(vec![
            [("ID", "A1"), ("Name", "X")].into_iter().collect(),
            [("ID", "A2")].into_iter().collect(),
        ]);
        let view = TableView::build(&sheet, "ID", "QR Code");

        assert_eq!(view.rows[1].cells, vec!["A2".to_string(), String::new()]);
    }

    #[test]
    fn payload_may_come_from_a_key_outside_the_columns() {
        let sheet = Sheet::from_rows(vec![
            [("ID", "A1")].into_iter().collect(),
            [("ID", "A2"), ("Serial", "S-2")].into_iter().collect(),
        ]);
        let view = TableView::build(&sheet, "Serial", "QR Code");

        assert_eq!(view.columns, vec!["ID"]);
        assert_eq!(view.rows[0].payload, "");
        assert_eq!(view.rows[1].payload, "S-2");
    }

    #[test]
    fn header_ends_with_code_column() {
        let view = TableView::build(&sample_sheet(), "ID", "QR Code");
        let labels: Vec<_> = view.header_labels().collect();
        assert_eq!(labels, vec!["ID", "Name", "QR Code"]);
    }

    #[test]
    fn html_escapes_cell_text() {
        let sheet = Sheet::from_rows(vec![
            [("ID", "<b>&\"1\"</b>")].into_iter().collect(),
        ]);
        let html = TableView::build(&sheet, "ID", "QR Code").to_html(&CodeRenderer::new(50));

        assert!(html.contains("&lt;b&gt;&amp;&quot;1&quot;&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
        assert_eq!(html.matches("<svg").count(), 1);
    }

    #[test]
    fn empty_table_renders_nothing() {
        let view = TableView::build(&Sheet::default(), "ID", "QR Code");
        assert!(view.is_empty());
        assert_eq!(view.to_html(&CodeRenderer::default()), "");
    }
}
