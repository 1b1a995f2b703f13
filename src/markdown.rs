//! Markdown document assembly shared by every backend.
//!
//! ```text
//! # <title>
//!
//! *Converted from: <file name>*
//!
//! ---
//!
//! ## Page 1
//!
//! <page text>
//!
//! ### Table 1 (Page 1)
//!
//! | a | b |
//! | --- | --- |
//! | 1 | 2 |
//! ```

/// A table detected on a page. The first row is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }
}

/// Extracted content of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    /// 1-indexed page number.
    pub number: usize,
    /// Page text, or page Markdown for the vision backend.
    pub text: String,
    pub tables: Vec<Table>,
}

/// Assemble the final document.
///
/// Pages with blank text get no `## Page N` section, but their tables are
/// still emitted. Table numbers restart on every page.
pub fn render_document(title: &str, source_name: &str, pages: &[PageContent]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", title));
    out.push_str(&format!("*Converted from: {}*\n\n", source_name));
    out.push_str("---\n\n");

    for page in pages {
        let text = page.text.trim();
        if !text.is_empty() {
            out.push_str(&format!("## Page {}\n\n", page.number));
            out.push_str(text);
            out.push_str("\n\n");
        }

        for (i, table) in page.tables.iter().enumerate() {
            let rendered = table_to_markdown(&table.rows);
            if rendered.is_empty() {
                continue;
            }
            out.push_str(&format!("### Table {} (Page {})\n\n", i + 1, page.number));
            out.push_str(&rendered);
            out.push_str("\n\n");
        }
    }

    out
}

/// Render rows as a GFM pipe table.
///
/// Returns an empty string when there is no header row. Data rows that are
/// empty are skipped; a `|` inside a cell is escaped.
pub fn table_to_markdown(rows: &[Vec<String>]) -> String {
    let Some(header) = rows.first().filter(|h| !h.is_empty()) else {
        return String::new();
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(pipe_row(header.iter().map(String::as_str)));
    lines.push(pipe_row(header.iter().map(|_| "---")));
    for row in rows.iter().skip(1).filter(|r| !r.is_empty()) {
        lines.push(pipe_row(row.iter().map(String::as_str)));
    }
    lines.join("\n")
}

fn pipe_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let cells: Vec<String> = cells.map(|c| c.trim().replace('|', "\\|")).collect();
    format!("| {} |", cells.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn header_byline_and_rule() {
        let md = render_document("report", "report.pdf", &[]);
        assert_eq!(md, "# report\n\n*Converted from: report.pdf*\n\n---\n\n");
    }

    #[test]
    fn three_page_document_with_table() {
        let pages = vec![
            PageContent {
                number: 1,
                text: "Hello".into(),
                tables: vec![],
            },
            PageContent {
                number: 2,
                text: String::new(),
                tables: vec![Table::new(vec![row(&["Name", "Qty"]), row(&["Apple", "3"])])],
            },
            PageContent {
                number: 3,
                text: "   ".into(),
                tables: vec![],
            },
        ];
        let md = render_document("sample", "sample.pdf", &pages);

        assert!(md.contains("## Page 1\n\nHello\n"), "got:\n{md}");
        assert!(!md.contains("## Page 2"), "blank page text gets no section");
        assert!(!md.contains("## Page 3"));
        assert!(
            md.contains("### Table 1 (Page 2)\n\n| Name | Qty |\n| --- | --- |\n| Apple | 3 |"),
            "got:\n{md}"
        );
    }

    #[test]
    fn table_numbers_restart_per_page() {
        let t = || Table::new(vec![row(&["a", "b"]), row(&["1", "2"])]);
        let pages = vec![
            PageContent {
                number: 1,
                text: "x".into(),
                tables: vec![t(), t()],
            },
            PageContent {
                number: 2,
                text: "y".into(),
                tables: vec![t()],
            },
        ];
        let md = render_document("t", "t.pdf", &pages);
        assert!(md.contains("### Table 1 (Page 1)"));
        assert!(md.contains("### Table 2 (Page 1)"));
        assert!(md.contains("### Table 1 (Page 2)"));
        assert!(!md.contains("### Table 2 (Page 2)"));
    }

    #[test]
    fn empty_cells_and_rows() {
        let rows = vec![row(&["a", "", "c"]), vec![], row(&["", "2", ""])];
        assert_eq!(
            table_to_markdown(&rows),
            "| a |  | c |\n| --- | --- | --- |\n|  | 2 |  |"
        );
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert_eq!(table_to_markdown(&[]), "");
        assert_eq!(table_to_markdown(&[vec![]]), "");
    }

    #[test]
    fn pipes_in_cells_are_escaped() {
        let rows = vec![row(&["a|b"]), row(&["c"])];
        assert!(table_to_markdown(&rows).starts_with("| a\\|b |"));
    }
}
