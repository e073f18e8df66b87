//! Search & replace
//!
//! Literal or regular-expression replacement applied line by line. A pattern
//! that does not compile fails the whole call before any line is touched.

use regex::{Captures, NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::map_lines;
use crate::errors::TransformError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchReplaceOptions {
    pub search: String,
    pub replace: String,
    pub use_regex: bool,
    pub case_sensitive: bool,
}

impl SearchReplaceOptions {
    pub fn literal(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
            use_regex: false,
            case_sensitive: true,
        }
    }

    pub fn regex(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
            use_regex: true,
            case_sensitive: true,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }
}

enum Matcher<'a> {
    Exact(&'a str),
    Pattern(Regex),
}

fn build_matcher(options: &SearchReplaceOptions) -> Result<Matcher<'_>, TransformError> {
    if !options.use_regex && options.case_sensitive {
        return Ok(Matcher::Exact(&options.search));
    }

    let pattern = if options.use_regex {
        options.search.clone()
    } else {
        regex::escape(&options.search)
    };

    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map(Matcher::Pattern)
        .map_err(|e| TransformError::InvalidPattern {
            pattern: options.search.clone(),
            message: e.to_string(),
        })
}

/// One piece of a parsed replacement template
#[derive(Debug, PartialEq, Eq)]
enum Piece {
    Text(String),
    Group(usize),
    Before,
    After,
}

/// Parse a browser-style replacement string against `regex`.
///
/// `$&` is the whole match, `$1`..`$99` are groups, `$<name>` is a named
/// group, `` $` `` and `$'` are the text before and after the match, and
/// `$$` is a dollar sign. Two digits are read as one group only when that
/// group exists, so `$10` with a single group is group 1 followed by `0`.
/// A `$` that starts none of these stays in the output as text.
fn parse_replacement(replace: &str, regex: &Regex) -> Vec<Piece> {
    let groups = regex.captures_len() - 1;
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut rest = replace;

    while let Some(pos) = rest.find('$') {
        text.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];

        let (piece, consumed) = match rest.as_bytes().first() {
            Some(b'$') => (None, 1),
            Some(b'&') => (Some(Piece::Group(0)), 1),
            Some(b'`') => (Some(Piece::Before), 1),
            Some(b'\'') => (Some(Piece::After), 1),
            Some(b'0'..=b'9') => match group_reference(rest.as_bytes(), groups) {
                Some((index, len)) => (Some(Piece::Group(index)), len),
                None => (None, 0),
            },
            Some(b'<') => match named_group(rest, regex) {
                Some((index, len)) => (Some(Piece::Group(index)), len),
                None => (None, 0),
            },
            _ => (None, 0),
        };
        rest = &rest[consumed..];

        match piece {
            Some(piece) => {
                if !text.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut text)));
                }
                pieces.push(piece);
            }
            None => text.push('$'),
        }
    }

    text.push_str(rest);
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    pieces
}

/// Group index and digits consumed for a `$` followed by a digit
fn group_reference(digits: &[u8], groups: usize) -> Option<(usize, usize)> {
    let first = usize::from(digits[0] - b'0');
    if let Some(second) = digits.get(1).filter(|d| d.is_ascii_digit()) {
        let index = first * 10 + usize::from(second - b'0');
        if (1..=groups).contains(&index) {
            return Some((index, 2));
        }
    }
    (1..=groups).contains(&first).then_some((first, 1))
}

/// Group index and bytes consumed for `<name>` when `name` is a group
fn named_group(rest: &str, regex: &Regex) -> Option<(usize, usize)> {
    let end = rest.find('>')?;
    let name = &rest[1..end];
    regex
        .capture_names()
        .position(|group| group == Some(name))
        .map(|index| (index, end + 1))
}

fn render(pieces: &[Piece], caps: &Captures, line: &str) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Group(index) => out.push_str(caps.get(*index).map_or("", |m| m.as_str())),
            Piece::Before => out.push_str(caps.get(0).map_or("", |m| &line[..m.start()])),
            Piece::After => out.push_str(caps.get(0).map_or("", |m| &line[m.end()..])),
        }
    }
    out
}

/// Replace every occurrence of `options.search` in `text`.
///
/// An empty search string returns the text unchanged. In literal mode the
/// replacement is inserted verbatim; in regex mode it follows the browser's
/// `String.prototype.replace` tokens.
pub fn search_replace(text: &str, options: &SearchReplaceOptions) -> Result<String, TransformError> {
    if options.search.is_empty() {
        return Ok(text.to_string());
    }

    let matcher = build_matcher(options)?;
    let result = match &matcher {
        Matcher::Exact(search) => map_lines(text, |line| line.replace(*search, &options.replace)),
        Matcher::Pattern(regex) if options.use_regex => {
            let pieces = parse_replacement(&options.replace, regex);
            map_lines(text, |line| {
                regex
                    .replace_all(line, |caps: &Captures| render(&pieces, caps, line))
                    .into_owned()
            })
        }
        Matcher::Pattern(regex) => map_lines(text, |line| {
            regex.replace_all(line, NoExpand(options.replace.as_str())).into_owned()
        }),
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_case_sensitive() {
        let options = SearchReplaceOptions::literal("a", "o");
        assert_eq!(search_replace("banana\nA", &options).unwrap(), "bonono\nA");
    }

    #[test]
    fn test_literal_case_insensitive() {
        let options = SearchReplaceOptions::literal("apple", "pear").case_insensitive();
        assert_eq!(search_replace("Apple APPLE", &options).unwrap(), "pear pear");
    }

    #[test]
    fn test_literal_treats_metacharacters_verbatim() {
        let options = SearchReplaceOptions::literal("a.b", "$1").case_insensitive();
        assert_eq!(search_replace("a.b axb", &options).unwrap(), "$1 axb");
    }

    #[test]
    fn test_regex_with_captures() {
        let options = SearchReplaceOptions::regex(r"(\w+)@(\w+)", "$2 at $1");
        assert_eq!(search_replace("me@home", &options).unwrap(), "home at me");

        let options = SearchReplaceOptions::regex(r"\d+", "<$&>");
        assert_eq!(search_replace("a1b22", &options).unwrap(), "a<1>b<22>");
    }

    #[test]
    fn test_group_followed_by_text() {
        let options = SearchReplaceOptions::regex(r"(\w+)@(\w+)", "$2x");
        assert_eq!(search_replace("me@home", &options).unwrap(), "homex");

        let options = SearchReplaceOptions::regex(r"(\w+)@(\w+)", "$1abc");
        assert_eq!(search_replace("me@home", &options).unwrap(), "meabc");
    }

    #[test]
    fn test_two_digit_group_needs_that_many_groups() {
        let options = SearchReplaceOptions::regex("(a)", "$10");
        assert_eq!(search_replace("a", &options).unwrap(), "a0");

        let pattern = "(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)";
        let options = SearchReplaceOptions::regex(pattern, "$10");
        assert_eq!(search_replace("abcdefghij", &options).unwrap(), "j");
    }

    #[test]
    fn test_dollar_tokens_without_a_group_stay_literal() {
        let options = SearchReplaceOptions::regex(r"(\w+)@(\w+)", "$$1 $3 ${x} $");
        assert_eq!(search_replace("me@home", &options).unwrap(), "$1 $3 ${x} $");
    }

    #[test]
    fn test_named_group_and_surrounding_text() {
        let options = SearchReplaceOptions::regex(r"(?P<user>\w+)@", "[$<user>]");
        assert_eq!(search_replace("me@home", &options).unwrap(), "[me]home");

        let options = SearchReplaceOptions::regex("-", "<$`|$'>");
        assert_eq!(search_replace("ab-cd", &options).unwrap(), "ab<ab|cd>cd");
    }

    #[test]
    fn test_regex_is_applied_per_line() {
        let options = SearchReplaceOptions::regex("^", "- ");
        assert_eq!(search_replace("a\r\nb", &options).unwrap(), "- a\n- b");
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let options = SearchReplaceOptions::regex("(unclosed", "x");
        let err = search_replace("text", &options).unwrap_err();
        assert!(matches!(err, TransformError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_empty_search_is_a_no_op() {
        let options = SearchReplaceOptions::literal("", "x");
        assert_eq!(search_replace("a\r\nb", &options).unwrap(), "a\r\nb");
    }
}
