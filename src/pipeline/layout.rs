//! Best-effort table detection from positioned text.
//!
//! pdfium reports text as segments with bounding boxes but knows nothing about
//! tables. We rebuild rows from segments sharing a baseline, split each row
//! into cells wherever the horizontal gap is wide, and call any run of at
//! least two consecutive rows a table when the first row has ≥ 2 cells and
//! every later row has ≥ 2 cells that each line up with one of its columns.
//! Columns a later row leaves out become empty cells.
//!
//! Coordinates are PDF points with the origin at the bottom-left, so a larger
//! `bottom` is higher on the page.

use crate::markdown::Table;

/// Baselines closer than this belong to the same row.
const ROW_TOLERANCE: f32 = 3.0;
/// A horizontal gap at least this wide starts a new cell.
const CELL_GAP: f32 = 10.0;
/// Cell left edges in consecutive rows must agree within this distance.
const COLUMN_ALIGNMENT: f32 = 8.0;

/// A run of text with its bounding box on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, left: f32, right: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            left,
            right,
            bottom,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Cell {
    text: String,
    left: f32,
}

/// Find tables among the fragments of one page, top to bottom.
pub fn detect_tables(fragments: &[TextFragment]) -> Vec<Table> {
    let rows: Vec<Vec<Cell>> = group_rows(fragments).into_iter().map(split_cells).collect();

    let mut tables = Vec::new();
    let mut run: Vec<&Vec<Cell>> = Vec::new();

    for row in &rows {
        let continues = match run.first() {
            Some(first) => aligned(first, row),
            None => false,
        };

        if !continues {
            flush(&mut run, &mut tables);
        }
        if row.len() >= 2 {
            run.push(row);
        }
    }
    flush(&mut run, &mut tables);

    tables
}

fn flush(run: &mut Vec<&Vec<Cell>>, tables: &mut Vec<Table>) {
    if let [header, ..] = run.as_slice() {
        if run.len() >= 2 {
            let rows = run.iter().map(|cells| spread(header, cells)).collect();
            tables.push(Table::new(rows));
        }
    }
    run.clear();
}

/// Lay `row` out under the header's columns, leaving gaps empty.
fn spread(header: &[Cell], row: &[Cell]) -> Vec<String> {
    let mut out = vec![String::new(); header.len()];
    for (cell, column) in row.iter().zip(column_indices(header, row).unwrap_or_default()) {
        out[column] = cell.text.clone();
    }
    out
}

/// The header column each cell of `row` sits under, if every cell matches a
/// distinct column and the columns keep their left-to-right order.
fn column_indices(header: &[Cell], row: &[Cell]) -> Option<Vec<usize>> {
    let mut indices = Vec::with_capacity(row.len());
    let mut next = 0;
    for cell in row {
        let offset = header[next..]
            .iter()
            .position(|h| (h.left - cell.left).abs() <= COLUMN_ALIGNMENT)?;
        indices.push(next + offset);
        next += offset + 1;
    }
    Some(indices)
}

/// At least two cells, each under its own header column.
fn aligned(header: &[Cell], row: &[Cell]) -> bool {
    row.len() >= 2 && row.len() <= header.len() && column_indices(header, row).is_some()
}

/// Group fragments into rows, top row first, each row sorted left to right.
fn group_rows(fragments: &[TextFragment]) -> Vec<Vec<&TextFragment>> {
    let mut sorted: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .collect();
    sorted.sort_by(|a, b| b.bottom.total_cmp(&a.bottom).then(a.left.total_cmp(&b.left)));

    let mut rows: Vec<Vec<&TextFragment>> = Vec::new();
    for fragment in sorted {
        match rows.last_mut() {
            Some(row) if (row[0].bottom - fragment.bottom).abs() <= ROW_TOLERANCE => {
                row.push(fragment)
            }
            _ => rows.push(vec![fragment]),
        }
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.left.total_cmp(&b.left));
    }
    rows
}

fn split_cells(row: Vec<&TextFragment>) -> Vec<Cell> {
    let mut cells: Vec<Cell> = Vec::new();
    let mut prev_right = f32::NEG_INFINITY;

    for fragment in row {
        let text = fragment.text.trim();
        let gap = fragment.left - prev_right;
        match cells.last_mut() {
            Some(cell) if gap < CELL_GAP => {
                if gap > 1.0 {
                    cell.text.push(' ');
                }
                cell.text.push_str(text);
            }
            _ => cells.push(Cell {
                text: text.to_string(),
                left: fragment.left,
            }),
        }
        prev_right = prev_right.max(fragment.right);
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, left: f32, right: f32, bottom: f32) -> TextFragment {
        TextFragment::new(text, left, right, bottom)
    }

    #[test]
    fn two_by_two_grid_is_a_table() {
        let fragments = vec![
            frag("Name", 72.0, 100.0, 700.0),
            frag("Qty", 200.0, 220.0, 700.5),
            frag("Apple", 72.0, 105.0, 686.0),
            frag("3", 200.0, 206.0, 686.0),
        ];
        let tables = detect_tables(&fragments);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].rows,
            vec![vec!["Name".to_string(), "Qty".into()], vec!["Apple".into(), "3".into()]]
        );
    }

    #[test]
    fn prose_is_not_a_table() {
        let fragments = vec![
            frag("Hello", 72.0, 100.0, 700.0),
            frag("world", 103.0, 130.0, 700.0),
            frag("Second line of prose", 72.0, 190.0, 686.0),
        ];
        assert!(detect_tables(&fragments).is_empty());
    }

    #[test]
    fn close_fragments_merge_into_one_cell() {
        let fragments = vec![
            frag("Unit", 72.0, 90.0, 700.0),
            frag("price", 93.0, 115.0, 700.0),
            frag("Total", 200.0, 225.0, 700.0),
            frag("4.50", 72.0, 90.0, 686.0),
            frag("9.00", 200.0, 218.0, 686.0),
        ];
        let tables = detect_tables(&fragments);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0], vec!["Unit price".to_string(), "Total".into()]);
    }

    #[test]
    fn misaligned_columns_break_the_run() {
        let fragments = vec![
            frag("a", 72.0, 80.0, 700.0),
            frag("b", 200.0, 208.0, 700.0),
            frag("c", 72.0, 80.0, 686.0),
            frag("d", 300.0, 308.0, 686.0),
        ];
        assert!(detect_tables(&fragments).is_empty());
    }

    #[test]
    fn row_with_empty_cell_stays_in_table() {
        let fragments = vec![
            frag("a", 72.0, 80.0, 700.0),
            frag("b", 150.0, 158.0, 700.0),
            frag("c", 230.0, 238.0, 700.0),
            frag("1", 72.0, 80.0, 686.0),
            frag("3", 231.0, 239.0, 686.0),
            frag("4", 73.0, 81.0, 672.0),
            frag("5", 149.0, 157.0, 672.0),
            frag("6", 230.0, 238.0, 672.0),
        ];
        let tables = detect_tables(&fragments);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].rows,
            vec![
                vec!["a".to_string(), "b".into(), "c".into()],
                vec!["1".into(), String::new(), "3".into()],
                vec!["4".into(), "5".into(), "6".into()],
            ]
        );
    }

    #[test]
    fn row_wider_than_header_starts_a_new_run() {
        let fragments = vec![
            frag("a", 72.0, 80.0, 700.0),
            frag("b", 200.0, 208.0, 700.0),
            frag("1", 72.0, 80.0, 686.0),
            frag("2", 200.0, 208.0, 686.0),
            frag("3", 300.0, 308.0, 686.0),
        ];
        let tables = detect_tables(&fragments);
        assert!(tables.is_empty(), "got {tables:?}");
    }

    #[test]
    fn prose_between_two_tables_splits_them() {
        let fragments = vec![
            frag("a", 72.0, 80.0, 700.0),
            frag("b", 200.0, 208.0, 700.0),
            frag("1", 72.0, 80.0, 686.0),
            frag("2", 200.0, 208.0, 686.0),
            frag("Some paragraph text", 72.0, 180.0, 660.0),
            frag("x", 72.0, 80.0, 640.0),
            frag("y", 150.0, 158.0, 640.0),
            frag("z", 72.0, 80.0, 626.0),
            frag("w", 150.0, 158.0, 626.0),
        ];
        let tables = detect_tables(&fragments);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].rows[0], vec!["x".to_string(), "y".into()]);
    }

    #[test]
    fn blank_fragments_are_ignored() {
        let fragments = vec![frag("  ", 72.0, 80.0, 700.0), frag("", 200.0, 208.0, 700.0)];
        assert!(detect_tables(&fragments).is_empty());
    }
}
