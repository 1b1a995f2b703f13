//! System prompt for the vision backend.
//!
//! Kept apart from the request code so prompt changes never touch retry or
//! error handling, and so tests can inspect the prompt directly.

/// Instructions sent with every page image.
///
/// The page's Markdown is embedded under a `## Page N` heading of the final
/// document; [`crate::pipeline::postprocess`] demotes whatever headings the
/// model still produces.
pub const PAGE_SYSTEM_PROMPT: &str = r#"You are an expert document converter. Convert the PDF page image to clean Markdown.

Follow these rules precisely:

1. TEXT
   - Preserve ALL text content in natural reading order
   - Correct recognition errors only when you are completely certain

2. STRUCTURE
   - Use ### for the largest heading on the page, #### and ##### below it
   - Use - for unordered lists and 1. 2. 3. for ordered lists
   - Use **bold** and *italic* to match visual emphasis

3. TABLES
   - Convert tables to GFM pipe tables with a header row and a --- separator row

4. IGNORE
   - Page numbers, repeated headers and footers, decorative lines

5. OUTPUT
   - Output ONLY the Markdown content
   - Do NOT wrap the output in ```markdown fences
   - Do NOT add commentary"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_forbids_fences_and_top_level_headings() {
        assert!(PAGE_SYSTEM_PROMPT.contains("Do NOT wrap"));
        assert!(PAGE_SYSTEM_PROMPT.contains("Use ### for the largest heading"));
    }
}
