//! Transform registry
//!
//! A fixed table maps every [`OperationId`] to a pure function plus the
//! metadata the UI needs to render a button for it. Functions are either
//! applied to each line independently (`PerLine`) or once to the whole text
//! (`WholeText`, e.g. sort and dedupe).
//!
//! # Line splitting
//!
//! All operations split on `\r?\n` and rejoin with `\n`, so a `\r` that
//! precedes a newline is dropped. A lone `\r` without a following `\n` is
//! ordinary line content.

pub mod case;
pub mod cleanup;
pub mod search;
pub mod sort;
pub mod wrapping;

use serde::Serialize;

use crate::errors::TransformError;
use crate::models::{OperationGroup, OperationId};

pub use search::{search_replace, SearchReplaceOptions};
pub use sort::{Collation, SortDirection, SortOptions};

/// How a transform consumes its input
#[derive(Clone, Copy)]
pub enum TransformFn {
    /// Applied to every line; results are rejoined with `\n`
    PerLine(fn(&str) -> String),
    /// Applied once to the whole text
    WholeText(fn(&str) -> String),
}

/// Registry entry: id, display metadata and the function itself
pub struct OperationDescriptor {
    pub id: OperationId,
    pub group: OperationGroup,
    pub title: &'static str,
    pub description: &'static str,
    pub transform: TransformFn,
}

impl OperationDescriptor {
    pub fn applies_per_line(&self) -> bool {
        matches!(self.transform, TransformFn::PerLine(_))
    }

    /// Run the transform over `text`
    pub fn apply(&self, text: &str) -> String {
        match self.transform {
            TransformFn::PerLine(f) => map_lines(text, f),
            TransformFn::WholeText(f) => f(text),
        }
    }

    /// Apply the per-line function to a single line.
    ///
    /// Returns `None` for whole-text transforms.
    pub fn apply_line(&self, line: &str) -> Option<String> {
        match self.transform {
            TransformFn::PerLine(f) => Some(f(line)),
            TransformFn::WholeText(_) => None,
        }
    }

    pub fn info(&self) -> OperationInfo {
        OperationInfo {
            id: self.id,
            group: self.group,
            group_title: self.group.title(),
            title: self.title,
            description: self.description,
            applies_per_line: self.applies_per_line(),
        }
    }
}

/// Serializable view of a descriptor for the UI
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    pub id: OperationId,
    pub group: OperationGroup,
    pub group_title: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub applies_per_line: bool,
}

macro_rules! op {
    ($id:ident, $group:ident, $title:expr, $description:expr, $kind:ident($f:path)) => {
        OperationDescriptor {
            id: OperationId::$id,
            group: OperationGroup::$group,
            title: $title,
            description: $description,
            transform: TransformFn::$kind($f),
        }
    };
}

static OPERATIONS: [OperationDescriptor; 23] = [
    // Case
    op!(Uppercase, Case, "All uppercase",
        "Convert every character to uppercase: apple Pie → APPLE PIE",
        PerLine(case::uppercase)),
    op!(Lowercase, Case, "All lowercase",
        "Convert every character to lowercase: apple PIE → apple pie",
        PerLine(case::lowercase)),
    op!(TitleCase, Case, "Title case",
        "Capitalize the first letter of every word: apple pie → Apple Pie",
        PerLine(case::title_case)),
    op!(SentenceCase, Case, "Sentence case",
        "Capitalize only the first letter of the line: apple PIE → Apple pie",
        PerLine(case::sentence_case)),

    // Symbols / wrapping
    op!(AddPlusPrefix, Wrapping, "Add + prefix",
        "Put a + before each word: apple pie → +apple +pie",
        PerLine(wrapping::add_plus_prefix)),
    op!(RemovePlusPrefix, Wrapping, "Remove + prefix",
        "Strip leading + signs from words: +apple +pie → apple pie",
        PerLine(wrapping::remove_plus_prefix)),
    op!(AddQuotes, Wrapping, "Wrap with quotes",
        "Wrap each line in double quotes: apple pie → \"apple pie\"",
        PerLine(wrapping::add_quotes)),
    op!(AddBrackets, Wrapping, "Wrap with brackets",
        "Wrap each line in square brackets: apple pie → [apple pie]",
        PerLine(wrapping::add_brackets)),
    op!(AddDashPrefix, Wrapping, "Add dash prefix",
        "Prefix each line with a dash: apple pie → -apple pie",
        PerLine(wrapping::add_dash_prefix)),
    op!(AddDashBracketsPrefix, Wrapping, "Add -[...] wrapper",
        "Wrap each line as -[text]: apple pie → -[apple pie]",
        PerLine(wrapping::add_dash_brackets_prefix)),
    op!(AddDashQuotesPrefix, Wrapping, "Add -\"...\" wrapper",
        "Wrap each line as -\"text\": apple pie → -\"apple pie\"",
        PerLine(wrapping::add_dash_quotes_prefix)),

    // Cleanup
    op!(TrimSpaces, Cleanup, "Trim spaces",
        "Remove extra spaces at the start, end and between words",
        PerLine(cleanup::trim_spaces)),
    op!(RemoveTabs, Cleanup, "Remove tabs",
        "Replace every tab (\\t) with a space",
        PerLine(cleanup::remove_tabs)),
    op!(RemoveAfterDash, Cleanup, "Remove text after \"-\"",
        "Drop everything from the first \" -\": apple pie - cherry → apple pie",
        PerLine(cleanup::remove_after_dash)),
    op!(ReplaceSpacesWithUnderscore, Cleanup, "Spaces → underscore",
        "Turn every run of whitespace into an underscore",
        PerLine(cleanup::replace_spaces_with_underscore)),
    op!(RemoveSpecialChars, Cleanup, "Remove special chars",
        "Strip the symbols ()\\~!@#$%^&*_=+[]{}|;':\",./<>?`-",
        PerLine(cleanup::remove_special_chars)),
    op!(ReplaceSpecialCharsWithSpaces, Cleanup, "Special chars → spaces",
        "Replace the same symbols with spaces",
        PerLine(cleanup::replace_special_chars_with_spaces)),

    // Sorting & uniqueness
    op!(SortAsc, Sort, "Sort A → Z",
        "Sort lines ascending using Latin collation",
        WholeText(sort::sort_asc_latin)),
    op!(SortDesc, Sort, "Sort Z → A",
        "Sort lines descending using Latin collation",
        WholeText(sort::sort_desc_latin)),
    op!(SortAscCyrillic, Sort, "Sort А → Я",
        "Sort lines ascending using Cyrillic-aware collation",
        WholeText(sort::sort_asc_cyrillic)),
    op!(SortDescCyrillic, Sort, "Sort Я → А",
        "Sort lines descending using Cyrillic-aware collation",
        WholeText(sort::sort_desc_cyrillic)),
    op!(RemoveDuplicates, Sort, "Remove duplicates",
        "Keep the first occurrence of every line",
        WholeText(sort::remove_duplicates)),
    op!(RemoveEmptyLines, Sort, "Remove empty lines",
        "Drop lines that are empty or contain only whitespace",
        WholeText(sort::remove_empty_lines)),
];

/// All operations in registry order
pub fn list_operations() -> &'static [OperationDescriptor] {
    &OPERATIONS
}

/// Look up the descriptor for a known id
pub fn descriptor(id: OperationId) -> &'static OperationDescriptor {
    // OPERATIONS is laid out in declaration order of OperationId
    &OPERATIONS[id as usize]
}

/// Apply a typed operation
pub fn apply_operation(id: OperationId, text: &str) -> String {
    descriptor(id).apply(text)
}

/// Apply an operation by its wire name
pub fn apply(operation: &str, text: &str) -> Result<String, TransformError> {
    let id: OperationId = operation.parse()?;
    Ok(apply_operation(id, text))
}

/// Like [`apply`], but an unknown id degrades to returning `text` unchanged
pub fn apply_or_original(operation: &str, text: &str) -> String {
    match apply(operation, text) {
        Ok(result) => result,
        Err(e) => {
            log::warn!("{}; returning text unchanged", e);
            text.to_string()
        }
    }
}

/// Split on `\r?\n`
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    for line in &mut lines[..last] {
        if let Some(stripped) = line.strip_suffix('\r') {
            *line = stripped;
        }
    }
    lines
}

/// Map `f` over every line and rejoin with `\n`
pub fn map_lines(text: &str, f: impl Fn(&str) -> String) -> String {
    split_lines(text)
        .into_iter()
        .map(f)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_matches_id_order() {
        for (descriptor, id) in list_operations().iter().zip(OperationId::ALL) {
            assert_eq!(descriptor.id, id);
        }
        assert_eq!(list_operations().len(), OperationId::ALL.len());
    }

    #[test]
    fn test_groups_are_contiguous() {
        let groups: Vec<OperationGroup> = list_operations().iter().map(|d| d.group).collect();
        let mut seen = Vec::new();
        for group in groups {
            if seen.last() != Some(&group) {
                assert!(!seen.contains(&group), "group {:?} split in two", group);
                seen.push(group);
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_split_lines_drops_cr_before_newline() {
        assert_eq!(split_lines("a\r\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines(""), vec![""]);
        assert_eq!(split_lines("\n"), vec!["", ""]);
        // A trailing lone carriage return is content
        assert_eq!(split_lines("a\r"), vec!["a\r"]);
    }

    #[test]
    fn test_per_line_normalizes_crlf() {
        assert_eq!(apply("add_brackets", "a\r\nb").unwrap(), "[a]\n[b]");
    }

    #[test]
    fn test_wrapping_empty_text() {
        assert_eq!(apply("add_brackets", "").unwrap(), "[]");
        assert_eq!(apply("add_quotes", "").unwrap(), "\"\"");
        assert_eq!(apply("add_dash_brackets_prefix", "\n").unwrap(), "-[]\n-[]");
    }

    #[test]
    fn test_unknown_operation() {
        assert_eq!(
            apply("shuffle", "abc"),
            Err(TransformError::UnknownOperationKind("shuffle".into()))
        );
        assert_eq!(apply_or_original("shuffle", "abc"), "abc");
    }

    #[test]
    fn test_whole_text_has_no_line_form() {
        assert!(descriptor(OperationId::SortAsc).apply_line("b").is_none());
        assert_eq!(
            descriptor(OperationId::Uppercase).apply_line("b").as_deref(),
            Some("B")
        );
    }

    #[test]
    fn test_info_serializes_camel_case() {
        let json = serde_json::to_value(descriptor(OperationId::AddQuotes).info()).unwrap();
        assert_eq!(json["id"], "add_quotes");
        assert_eq!(json["group"], "Wrapping");
        assert_eq!(json["appliesPerLine"], true);
    }
}
