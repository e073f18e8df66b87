// Property tests over the transform registry, history and cache

use std::cmp::Ordering;

use proptest::prelude::*;
use serde_json::json;
use unicode_normalization::UnicodeNormalization;

use phrase_editor_wasm::cache::OperationCache;
use phrase_editor_wasm::transforms::sort::{compare, sort_lines};
use phrase_editor_wasm::transforms::{
    apply, list_operations, search_replace, split_lines, Collation, SearchReplaceOptions, SortDirection, SortOptions,
};
use phrase_editor_wasm::undo::HistoryStack;

/// Lines drawn from mixed Latin, Cyrillic, digits and punctuation
fn phrase_text() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Zа-яА-ЯіїєґІЇЄҐ0-9 ,.!\"'()+\\-\t]{0,12}", 0..12)
        .prop_map(|lines| lines.join("\n"))
}

/// Latin lines mixing plain, accented and undecomposable letters
fn extended_latin_text() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-ZłŁøØđĐæÆœŒßþÞıéÉüñ ]{0,10}", 0..12).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn every_operation_returns_a_string(text in phrase_text()) {
        for descriptor in list_operations() {
            let result = apply(descriptor.id.as_str(), &text);
            prop_assert!(result.is_ok(), "{} failed", descriptor.id);
        }
    }

    #[test]
    fn cleanup_and_case_operations_are_idempotent(text in phrase_text()) {
        for op in ["trim_spaces", "uppercase", "lowercase", "remove_duplicates", "remove_empty_lines"] {
            let once = apply(op, &text).unwrap();
            let twice = apply(op, &once).unwrap();
            prop_assert_eq!(&once, &twice, "{} is not idempotent", op);
        }
    }

    #[test]
    fn remove_duplicates_keeps_first_occurrences_in_order(text in phrase_text()) {
        let output = apply("remove_duplicates", &text).unwrap();
        let out_lines = split_lines(&output);

        let mut expected: Vec<&str> = Vec::new();
        for line in split_lines(&text) {
            if !expected.contains(&line) {
                expected.push(line);
            }
        }
        prop_assert_eq!(out_lines, expected);
    }

    #[test]
    fn ascending_sort_is_ordered_and_descending_is_its_reverse(
        text in prop_oneof![phrase_text(), extended_latin_text()],
        cyrillic in any::<bool>(),
    ) {
        let collation = if cyrillic { Collation::Cyrillic } else { Collation::Latin };
        let asc = sort_lines(&text, SortOptions::new(SortDirection::Ascending, collation));
        let desc = sort_lines(&text, SortOptions::new(SortDirection::Descending, collation));

        let asc_lines: Vec<&str> = if asc.is_empty() { Vec::new() } else { split_lines(&asc) };
        for pair in asc_lines.windows(2) {
            prop_assert_ne!(compare(pair[0], pair[1], collation), Ordering::Greater);
        }

        let mut reversed = asc_lines.clone();
        reversed.reverse();
        let desc_lines: Vec<&str> = if desc.is_empty() { Vec::new() } else { split_lines(&desc) };
        prop_assert_eq!(desc_lines, reversed);
    }

    #[test]
    fn extended_latin_sorts_with_latin_letters(word in "[a-zA-ZłŁøØđĐæÆœŒßþÞı]{1,8}") {
        prop_assert_eq!(compare(&word, "а", Collation::Latin), Ordering::Less);
        prop_assert_eq!(compare(&word, "а", Collation::Cyrillic), Ordering::Greater);
    }

    #[test]
    fn decomposed_cyrillic_collates_as_composed(word in "[а-яієїґЙЇ]{1,8}") {
        let decomposed: String = word.nfd().collect();
        prop_assert_eq!(compare(&decomposed, &word, Collation::Cyrillic), Ordering::Equal);
        prop_assert_eq!(compare(&decomposed, &word, Collation::Latin), Ordering::Equal);
    }

    #[test]
    fn numbered_group_can_be_followed_by_text(
        user in "[a-z]{1,6}",
        host in "[a-z]{1,6}",
        suffix in "[a-z0-9]{1,4}",
    ) {
        let options = SearchReplaceOptions::regex(r"([a-z]+)@([a-z]+)", format!("$2{}", suffix));
        let result = search_replace(&format!("{}@{}", user, host), &options).unwrap();
        prop_assert_eq!(result, format!("{}{}", host, suffix));
    }

    #[test]
    fn history_cursor_stays_in_bounds(
        steps in prop::collection::vec(0u8..3, 0..64),
        max_entries in 1usize..8,
    ) {
        let mut history = HistoryStack::new(max_entries);
        for (i, step) in steps.into_iter().enumerate() {
            match step {
                0 => history.push(i.to_string()),
                1 => { history.undo(); }
                _ => { history.redo(); }
            }
            prop_assert!(!history.is_empty());
            prop_assert!(history.len() <= max_entries);
            prop_assert!(history.current_index() < history.len());
            prop_assert_eq!(history.can_undo(), history.current_index() > 0);
            prop_assert_eq!(history.can_redo(), history.current_index() + 1 < history.len());
        }
    }

    #[test]
    fn cache_returns_what_was_stored(text in phrase_text(), result in ".{0,64}") {
        let mut cache = OperationCache::new(1024 * 1024, 60_000);
        let options = json!({ "search": "a", "useRegex": false });

        cache.set(&text, "search_replace", &options, result.clone());
        prop_assert_eq!(cache.get(&text, "search_replace", &options), Some(result));

        cache.clear();
        prop_assert_eq!(cache.get(&text, "search_replace", &options), None);
    }
}
