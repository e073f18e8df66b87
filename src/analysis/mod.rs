//! Text analysis
//!
//! Descriptive metrics for the editor's status panel plus the small helpers
//! used to describe what an operation changed.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::models::TextMetrics;
use crate::transforms::split_lines;

/// Compute line, character and word counts for `text`.
///
/// Lines are split on `\n` only, matching how the editor numbers lines, so a
/// `\r\n` file counts its carriage returns as characters. Character count is
/// in Unicode scalar values. A line is empty when it is blank after trimming.
pub fn analyze(text: &str) -> TextMetrics {
    let mut metrics = TextMetrics {
        total_characters: text.chars().count(),
        ..Default::default()
    };

    for line in text.split('\n') {
        metrics.total_lines += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            metrics.empty_lines += 1;
        } else {
            metrics.non_empty_lines += 1;
            metrics.word_count += trimmed.split_whitespace().count();
        }
    }

    metrics
}

/// Line counts using the registry's `\r?\n` split
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStats {
    pub total: usize,
    pub non_empty: usize,
    pub empty: usize,
}

pub fn line_stats(text: &str) -> LineStats {
    let lines = split_lines(text);
    let non_empty = lines.iter().filter(|line| !line.trim().is_empty()).count();

    LineStats {
        total: lines.len(),
        non_empty,
        empty: lines.len() - non_empty,
    }
}

/// Number of lines, with the empty string counting as zero
pub fn line_count(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        split_lines(text).len()
    }
}

/// Tidy freshly typed or pasted text: tabs become two spaces, trailing
/// whitespace is stripped from each line and from the end of the text.
pub fn normalize_text(text: &str) -> String {
    let joined = split_lines(text)
        .into_iter()
        .map(|line| line.replace('\t', "  ").trim_end_matches([' ', '\t']).to_string())
        .collect::<Vec<_>>()
        .join("\n");

    joined.trim_end().to_string()
}

/// Set-based comparison of two line lists
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDifference {
    /// Lines in `processed` that never appear in `original`
    pub added: usize,
    /// Lines in `original` that never appear in `processed`
    pub removed: usize,
    /// `max(added, removed)`
    pub changed: usize,
}

pub fn text_difference<S: AsRef<str>>(original: &[S], processed: &[S]) -> TextDifference {
    let original_set: FxHashSet<&str> = original.iter().map(AsRef::as_ref).collect();
    let processed_set: FxHashSet<&str> = processed.iter().map(AsRef::as_ref).collect();

    let added = processed
        .iter()
        .map(AsRef::as_ref)
        .filter(|line: &&str| !original_set.contains(line))
        .count();
    let removed = original
        .iter()
        .map(AsRef::as_ref)
        .filter(|line: &&str| !processed_set.contains(line))
        .count();

    TextDifference {
        added,
        removed,
        changed: added.max(removed),
    }
}

/// Human-readable duration: `—` for missing, `12ms` under a second, `1.50s` above
pub fn format_execution_time(ms: Option<f64>) -> String {
    match ms {
        None => "—".to_string(),
        Some(ms) if ms.is_nan() => "—".to_string(),
        Some(ms) if ms <= 0.0 => "0ms".to_string(),
        Some(ms) if ms < 1000.0 => format!("{:.0}ms", ms),
        Some(ms) => format!("{:.2}s", ms / 1000.0),
    }
}

/// Group digits in thousands with commas: `1234567` → `1,234,567`
pub fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_basic() {
        let metrics = analyze("apple pie\n\n  cherry  \n");
        assert_eq!(metrics.total_lines, 4);
        assert_eq!(metrics.non_empty_lines, 2);
        assert_eq!(metrics.empty_lines, 2);
        assert_eq!(metrics.word_count, 3);
        assert_eq!(metrics.total_characters, 22);
    }

    #[test]
    fn test_analyze_empty_text_is_one_empty_line() {
        let metrics = analyze("");
        assert_eq!(metrics.total_lines, 1);
        assert_eq!(metrics.empty_lines, 1);
        assert_eq!(metrics.word_count, 0);
        assert_eq!(metrics.total_characters, 0);
    }

    #[test]
    fn test_analyze_does_not_split_on_carriage_return() {
        let metrics = analyze("a\r\nb");
        assert_eq!(metrics.total_lines, 2);
        assert_eq!(metrics.total_characters, 4);
    }

    #[test]
    fn test_analyze_handles_nul_and_emoji() {
        let metrics = analyze("a\0b 😀\n👍🏽");
        assert_eq!(metrics.total_lines, 2);
        assert_eq!(metrics.word_count, 3);
        assert_eq!(metrics.total_characters, 8);
    }

    #[test]
    fn test_line_counts_stay_consistent() {
        let metrics = analyze(" \nx\n\n");
        assert_eq!(metrics.total_lines, metrics.non_empty_lines + metrics.empty_lines);
    }

    #[test]
    fn test_line_stats_and_count() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("a\r\nb"), 2);
        assert_eq!(
            line_stats("a\r\n \nb"),
            LineStats { total: 3, non_empty: 2, empty: 1 }
        );
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("a\tb  \r\nc \n\n"), "a  b\nc");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_text_difference() {
        let diff = text_difference(&["a", "b", "c"], &["a", "B"]);
        assert_eq!(diff, TextDifference { added: 1, removed: 2, changed: 2 });
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_execution_time(None), "—");
        assert_eq!(format_execution_time(Some(0.0)), "0ms");
        assert_eq!(format_execution_time(Some(12.4)), "12ms");
        assert_eq!(format_execution_time(Some(1500.0)), "1.50s");
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
