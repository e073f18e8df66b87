//! Sorting and uniqueness transforms
//!
//! Sorting compares lines at the base level: case and Latin diacritics are
//! ignored, so `Apple`, `apple` and `Àpple` collate equal and keep their
//! input order. Letters with no decomposition sort with their base letter
//! (`ł` as `l`, `ø` as `o`, `ß` as `ss`). Lines are composed (NFC) first, so
//! a decomposed `и` + breve is the letter `й`. Two collations decide how scripts interleave:
//!
//! - `Latin`: punctuation, digits, Latin letters, then Cyrillic
//! - `Cyrillic`: punctuation, digits, Cyrillic letters, then Latin
//!
//! Cyrillic letters follow the Ukrainian alphabet with the Russian-only
//! letters slotted in, so `ґ`, `є`, `і`, `ї` and `й` are distinct letters
//! rather than accented variants.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::char::{decompose_canonical, is_combining_mark};
use unicode_normalization::UnicodeNormalization;

use super::split_lines;

const CYRILLIC_ALPHABET: &str = "абвгґдеёєжзиіїйклмнопрстуфхцчшщъыьэюя";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collation {
    #[default]
    #[serde(alias = "en-US", alias = "en")]
    Latin,
    #[serde(alias = "uk-UA", alias = "uk", alias = "ru-RU", alias = "ru")]
    Cyrillic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOptions {
    pub direction: SortDirection,
    pub collation: Collation,
}

impl SortOptions {
    pub fn new(direction: SortDirection, collation: Collation) -> Self {
        Self { direction, collation }
    }
}

/// One collation element: script class, then rank within the class
type Element = (u8, u32);

const CLASS_SYMBOL: u8 = 0;
const CLASS_DIGIT: u8 = 1;
const CLASS_OTHER: u8 = 4;

fn script_class(is_latin: bool, collation: Collation) -> u8 {
    match (collation, is_latin) {
        (Collation::Latin, true) | (Collation::Cyrillic, false) => 2,
        (Collation::Latin, false) | (Collation::Cyrillic, true) => 3,
    }
}

fn push_elements(ch: char, collation: Collation, key: &mut Vec<Element>) {
    for lower in ch.to_lowercase() {
        if let Some(rank) = CYRILLIC_ALPHABET.chars().position(|c| c == lower) {
            key.push((script_class(false, collation), rank as u32));
            continue;
        }

        if let Some(base) = latin_base(lower) {
            key.extend(base.chars().map(|c| element_for(c, collation)));
            continue;
        }

        // Combining marks are ignorable at the base level
        decompose_canonical(lower, |base| {
            if !is_combining_mark(base) {
                key.push(element_for(base, collation));
            }
        });
    }
}

/// Base letters for Latin letters that carry no canonical decomposition
fn latin_base(ch: char) -> Option<&'static str> {
    let base = match ch {
        'ł' | 'ŀ' => "l",
        'ø' => "o",
        'đ' | 'ð' => "d",
        'ħ' => "h",
        'ı' => "i",
        'ŧ' => "t",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        'þ' => "th",
        _ => return None,
    };
    Some(base)
}

fn element_for(ch: char, collation: Collation) -> Element {
    if ch.is_ascii_lowercase() {
        return (script_class(true, collation), ch as u32 - 'a' as u32);
    }
    if let Some(digit) = ch.to_digit(10) {
        return (CLASS_DIGIT, digit);
    }
    if ('\u{0400}'..='\u{04FF}').contains(&ch) {
        // Cyrillic outside the alphabet table sorts after it, by code point
        return (script_class(false, collation), ch as u32);
    }
    if ch.is_alphabetic() {
        return (CLASS_OTHER, ch as u32);
    }
    (CLASS_SYMBOL, ch as u32)
}

/// Base-level collation key for a line
pub fn collation_key(line: &str, collation: Collation) -> Vec<Element> {
    let mut key = Vec::with_capacity(line.len());
    for ch in line.nfc() {
        push_elements(ch, collation, &mut key);
    }
    key
}

/// Compare two lines under `collation`
pub fn compare(a: &str, b: &str, collation: Collation) -> Ordering {
    collation_key(a, collation).cmp(&collation_key(b, collation))
}

/// Sort the non-blank lines of `text`.
///
/// Blank lines are dropped. Descending order is the exact reverse of the
/// ascending order of the same input.
pub fn sort_lines(text: &str, options: SortOptions) -> String {
    let mut lines: Vec<&str> = split_lines(text)
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect();

    lines.sort_by_cached_key(|line| collation_key(line, options.collation));
    if options.direction == SortDirection::Descending {
        lines.reverse();
    }

    lines.join("\n")
}

pub fn sort_asc_latin(text: &str) -> String {
    sort_lines(text, SortOptions::new(SortDirection::Ascending, Collation::Latin))
}

pub fn sort_desc_latin(text: &str) -> String {
    sort_lines(text, SortOptions::new(SortDirection::Descending, Collation::Latin))
}

pub fn sort_asc_cyrillic(text: &str) -> String {
    sort_lines(text, SortOptions::new(SortDirection::Ascending, Collation::Cyrillic))
}

pub fn sort_desc_cyrillic(text: &str) -> String {
    sort_lines(text, SortOptions::new(SortDirection::Descending, Collation::Cyrillic))
}

/// Keep the first occurrence of every line; comparison is exact, not trimmed
pub fn remove_duplicates(text: &str) -> String {
    let mut seen = FxHashSet::default();
    split_lines(text)
        .into_iter()
        .filter(|line| seen.insert(*line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop lines that are empty or whitespace-only
pub fn remove_empty_lines(text: &str) -> String {
    split_lines(text)
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_ascending_latin() {
        assert_eq!(sort_asc_latin("b\na\nc"), "a\nb\nc");
    }

    #[test]
    fn test_sort_is_case_and_accent_insensitive() {
        assert_eq!(compare("Apple", "apple", Collation::Latin), Ordering::Equal);
        assert_eq!(compare("école", "ecole", Collation::Latin), Ordering::Equal);
        // Equal keys keep input order
        assert_eq!(sort_asc_latin("b\nApple\napple"), "Apple\napple\nb");
    }

    #[test]
    fn test_descending_is_reverse_of_ascending() {
        let input = "pear\nApple\napple\nfig";
        let asc = sort_asc_latin(input);
        let reversed: Vec<&str> = asc.split('\n').rev().collect();
        assert_eq!(sort_desc_latin(input), reversed.join("\n"));
    }

    #[test]
    fn test_script_order_depends_on_collation() {
        assert_eq!(sort_asc_latin("яблуко\napple"), "apple\nяблуко");
        assert_eq!(sort_asc_cyrillic("apple\nяблуко"), "яблуко\napple");
    }

    #[test]
    fn test_ukrainian_letters_are_distinct() {
        // г < ґ < д and и < і < ї < й < к
        assert_eq!(sort_asc_cyrillic("д\nґ\nг"), "г\nґ\nд");
        assert_eq!(sort_asc_cyrillic("к\nй\nї\nі\nи"), "и\nі\nї\nй\nк");
        assert_ne!(compare("й", "и", Collation::Cyrillic), Ordering::Equal);
    }

    #[test]
    fn test_letters_without_decomposition_sort_with_their_base() {
        assert_eq!(sort_asc_latin("zebra\nŁódź\nmango\nжук"), "Łódź\nmango\nzebra\nжук");
        assert_eq!(compare("łódź", "lodz", Collation::Latin), Ordering::Equal);
        assert_eq!(compare("Øre", "ore", Collation::Latin), Ordering::Equal);
        assert_eq!(compare("Đakovo", "dakovo", Collation::Latin), Ordering::Equal);
        assert_eq!(compare("Æther", "aether", Collation::Latin), Ordering::Equal);
        assert_eq!(compare("Straße", "strasse", Collation::Latin), Ordering::Equal);
        assert_eq!(sort_asc_latin("ssa\nßb\nsr"), "sr\nssa\nßb");
    }

    #[test]
    fn test_decomposed_cyrillic_matches_composed() {
        assert_eq!(compare("и\u{0306}", "й", Collation::Cyrillic), Ordering::Equal);
        assert_eq!(compare("И\u{0306}ого", "його", Collation::Cyrillic), Ordering::Equal);
        assert_eq!(compare("е\u{0308}", "ё", Collation::Cyrillic), Ordering::Equal);
        assert_eq!(sort_asc_cyrillic("к\nи\u{0306}\nи"), "и\nи\u{0306}\nк");
    }

    #[test]
    fn test_digits_before_letters() {
        assert_eq!(sort_asc_latin("b\n2\n10"), "10\n2\nb");
    }

    #[test]
    fn test_sort_drops_blank_lines() {
        assert_eq!(sort_asc_latin(""), "");
        assert_eq!(sort_asc_latin("   "), "");
        assert_eq!(sort_asc_latin("only"), "only");
        assert_eq!(sort_asc_latin("b\n\n a"), " a\nb");
    }

    #[test]
    fn test_remove_duplicates_keeps_first_seen() {
        assert_eq!(remove_duplicates("a\na\nb"), "a\nb");
        assert_eq!(remove_duplicates("b\na\nb\na"), "b\na");
        // Not trimmed
        assert_eq!(remove_duplicates("a\na \na"), "a\na ");
        assert_eq!(remove_duplicates(""), "");
    }

    #[test]
    fn test_remove_empty_lines() {
        assert_eq!(remove_empty_lines("b\na\nc\n\n"), "b\na\nc");
        assert_eq!(remove_empty_lines(" \n\t\n"), "");
    }
}
