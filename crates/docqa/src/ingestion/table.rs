//! Plain-text rendering of slide tables
//!
//! The first row is the header. Rows are printed under a zero-based row index
//! with right-aligned columns separated by two spaces, the layout analysts
//! are used to seeing from dataframe dumps.

use crate::error::{Error, Result};

const COLUMN_GAP: usize = 2;

/// Render a table grid. Returns `Ok(None)` for a table without rows.
///
/// Rows whose width differs from the header are rejected.
pub fn render_table(rows: &[Vec<String>]) -> Result<Option<String>> {
    let Some((header, body)) = rows.split_first() else {
        return Ok(None);
    };

    if let Some(bad) = body.iter().position(|row| row.len() != header.len()) {
        return Err(Error::internal(format!(
            "{} columns passed, row {} has {} values",
            header.len(),
            bad,
            body[bad].len()
        )));
    }

    let header: Vec<String> = header.iter().map(|h| escape_cell(h)).collect();

    if body.is_empty() {
        return Ok(Some(format!(
            "Empty DataFrame\nColumns: [{}]\nIndex: []",
            header.join(", ")
        )));
    }

    let body: Vec<Vec<String>> = body
        .iter()
        .map(|row| row.iter().map(|cell| escape_cell(cell)).collect())
        .collect();

    let index_width = (body.len() - 1).to_string().len();
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(col, name)| {
            body.iter()
                .map(|row| width(&row[col]))
                .chain(std::iter::once(width(name)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(body.len() + 1);

    let mut line = " ".repeat(index_width);
    for (name, w) in header.iter().zip(&widths) {
        push_cell(&mut line, name, *w);
    }
    lines.push(line);

    for (i, row) in body.iter().enumerate() {
        let mut line = format!("{:<width$}", i, width = index_width);
        for (cell, w) in row.iter().zip(&widths) {
            push_cell(&mut line, cell, *w);
        }
        lines.push(line);
    }

    Ok(Some(lines.join("\n")))
}

fn push_cell(line: &mut String, value: &str, column_width: usize) {
    let pad = COLUMN_GAP + column_width - width(value);
    line.extend(std::iter::repeat(' ').take(pad));
    line.push_str(value);
}

fn width(value: &str) -> usize {
    value.chars().count()
}

// Control characters are printed escaped so each row stays on one line.
fn escape_cell(value: &str) -> String {
    value
        .replace('\t', "\\t")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_render_simple_table() {
        let rows = grid(&[&["a", "b"], &["x", "yy"]]);
        let rendered = render_table(&rows).unwrap().unwrap();
        assert_eq!(rendered, "   a   b\n0  x  yy");
    }

    #[test]
    fn test_render_wide_header() {
        let rows = grid(&[&["Produit", "Prix"], &["Stylo", "2"], &["Cahier", "12"]]);
        let rendered = render_table(&rows).unwrap().unwrap();
        assert_eq!(
            rendered,
            "   Produit  Prix\n0    Stylo     2\n1   Cahier    12"
        );
    }

    #[test]
    fn test_header_only_table() {
        let rows = grid(&[&["Nom", "Rôle"]]);
        let rendered = render_table(&rows).unwrap().unwrap();
        assert_eq!(rendered, "Empty DataFrame\nColumns: [Nom, Rôle]\nIndex: []");
    }

    #[test]
    fn test_empty_and_ragged_tables() {
        assert!(render_table(&[]).unwrap().is_none());
        let ragged = grid(&[&["a", "b"], &["only one"]]);
        assert!(render_table(&ragged).is_err());
    }

    #[test]
    fn test_multiline_cell_is_escaped() {
        let rows = grid(&[&["k"], &["l1\nl2"]]);
        let rendered = render_table(&rows).unwrap().unwrap();
        assert_eq!(rendered, "        k\n0  l1\\nl2");
    }
}
