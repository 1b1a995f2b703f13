//! Post-processing: deterministic cleanup of VLM page Markdown.
//!
//! Even well-prompted models wrap their answer in fences, emit `\r\n`, sprinkle
//! zero-width characters or forget a table's separator row. Each rule below is
//! a pure `&str → String` pass; order matters only in that fences are stripped
//! and line endings normalised before any line-based rule runs.

use once_cell::sync::Lazy;
use regex::Regex;

/// Shallowest heading level allowed inside a page section (`## Page N` is
/// level 2).
const MIN_PAGE_HEADING: usize = 3;

/// Apply all rules to one page of VLM output. The result has no leading or
/// trailing blank lines.
pub fn clean_page(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = demote_headings(&s);
    let s = fix_missing_table_separator(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\n(.*)\n```$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})(\s+.*)$").unwrap());

/// Push headings below the page heading, keeping their relative order.
/// Lines inside code fences are left alone.
fn demote_headings(input: &str) -> String {
    let lines = mark_fenced(input);
    let shallowest = lines
        .iter()
        .filter(|(_, fenced)| !fenced)
        .filter_map(|(l, _)| RE_HEADING.captures(l).map(|c| c[1].len()))
        .min();
    let Some(shallowest) = shallowest.filter(|&l| l < MIN_PAGE_HEADING) else {
        return input.to_string();
    };
    let shift = MIN_PAGE_HEADING - shallowest;

    lines
        .into_iter()
        .map(|(line, fenced)| match RE_HEADING.captures(line) {
            Some(caps) if !fenced => {
                let level = (caps[1].len() + shift).min(6);
                format!("{}{}", "#".repeat(level), &caps[2])
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pair each line with whether it sits inside a code fence. Fence lines
/// themselves count as fenced.
fn mark_fenced(input: &str) -> Vec<(&str, bool)> {
    let mut in_code = false;
    input
        .lines()
        .map(|line| {
            let fence = line.trim_start().starts_with("```");
            if fence {
                in_code = !in_code;
            }
            (line, in_code || fence)
        })
        .collect()
}

/// Insert a `| --- |` row after a table header that lacks one.
fn fix_missing_table_separator(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut result: Vec<String> = Vec::with_capacity(lines.len() + 4);

    for (i, line) in lines.iter().enumerate() {
        result.push(line.to_string());

        let starts_table = is_table_row(line)
            && !is_separator_row(line)
            && !lines.get(i.wrapping_sub(1)).is_some_and(|p| is_table_row(p));
        let next = lines.get(i + 1).copied().unwrap_or("");
        if starts_table && is_table_row(next) && !is_separator_row(next) {
            let cols = line.trim().trim_matches('|').split('|').count();
            result.push(format!("|{}", " --- |".repeat(cols)));
        }
    }

    result.join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() > 2 && t.starts_with('|') && t.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    is_table_row(line)
        && line
            .trim()
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_markdown_fences("```markdown\nHello\nWorld\n```"), "Hello\nWorld");
        assert_eq!(strip_markdown_fences("```\nHello\n```\n"), "Hello");
        assert_eq!(strip_markdown_fences("Hello"), "Hello");
    }

    #[test]
    fn test_demote_headings_keeps_relative_levels() {
        let out = demote_headings("# Title\ntext\n## Sub\n#### Deep");
        assert_eq!(out, "### Title\ntext\n#### Sub\n###### Deep");
    }

    #[test]
    fn test_already_deep_headings_unchanged() {
        let input = "### Section\n#### Sub";
        assert_eq!(demote_headings(input), input);
    }

    #[test]
    fn test_headings_inside_code_untouched() {
        let out = demote_headings("# Title\n```\n# comment\n```");
        assert_eq!(out, "### Title\n```\n# comment\n```");
    }

    #[test]
    fn test_fenced_comment_does_not_deepen_demotion() {
        let out = demote_headings("## Title\n```\n# comment\n```\n### Sub");
        assert_eq!(out, "### Title\n```\n# comment\n```\n#### Sub");
    }

    #[test]
    fn test_only_fenced_headings_leave_input_unchanged() {
        let input = "```\n# comment\n```";
        assert_eq!(demote_headings(input), input);
    }

    #[test]
    fn test_missing_separator_inserted() {
        let out = fix_missing_table_separator("| A | B |\n| 1 | 2 |");
        assert_eq!(out, "| A | B |\n| --- | --- |\n| 1 | 2 |");
    }

    #[test]
    fn test_existing_separator_kept() {
        let input = "| A | B |\n| --- | --- |\n| 1 | 2 |\n| 3 | 4 |";
        assert_eq!(fix_missing_table_separator(input), input);
    }

    #[test]
    fn test_invisible_chars_removed() {
        assert_eq!(remove_invisible_chars("a\u{200B}b\u{FEFF}c"), "abc");
    }

    #[test]
    fn test_clean_page_full() {
        let input = "```markdown\n# Title\r\n\r\n\r\n\r\nSome text   \n| A | B |\n| 1 | 2 |\n```";
        let out = clean_page(input);
        assert!(out.starts_with("### Title\n\nSome text\n"), "got: {out:?}");
        assert!(out.contains("| --- | --- |"));
        assert!(!out.contains("\n\n\n"));
        assert!(!out.ends_with('\n'));
    }
}
