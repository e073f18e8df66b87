//! Operation identifiers and grouping
//!
//! `OperationId` is the closed set of line/text transforms the editor knows
//! about. Ids travel over the worker protocol and into persisted metrics as
//! their snake_case names (`"sort_asc"`, `"add_brackets"`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TransformError;

/// Every registered transform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationId {
    // Case
    Uppercase,
    Lowercase,
    TitleCase,
    SentenceCase,

    // Wrapping
    AddPlusPrefix,
    RemovePlusPrefix,
    AddQuotes,
    AddBrackets,
    AddDashPrefix,
    AddDashBracketsPrefix,
    AddDashQuotesPrefix,

    // Cleanup
    TrimSpaces,
    RemoveTabs,
    RemoveAfterDash,
    ReplaceSpacesWithUnderscore,
    RemoveSpecialChars,
    ReplaceSpecialCharsWithSpaces,

    // Sorting & uniqueness
    SortAsc,
    SortDesc,
    SortAscCyrillic,
    SortDescCyrillic,
    RemoveDuplicates,
    RemoveEmptyLines,
}

impl OperationId {
    /// All ids in registry order
    pub const ALL: [OperationId; 23] = [
        OperationId::Uppercase,
        OperationId::Lowercase,
        OperationId::TitleCase,
        OperationId::SentenceCase,
        OperationId::AddPlusPrefix,
        OperationId::RemovePlusPrefix,
        OperationId::AddQuotes,
        OperationId::AddBrackets,
        OperationId::AddDashPrefix,
        OperationId::AddDashBracketsPrefix,
        OperationId::AddDashQuotesPrefix,
        OperationId::TrimSpaces,
        OperationId::RemoveTabs,
        OperationId::RemoveAfterDash,
        OperationId::ReplaceSpacesWithUnderscore,
        OperationId::RemoveSpecialChars,
        OperationId::ReplaceSpecialCharsWithSpaces,
        OperationId::SortAsc,
        OperationId::SortDesc,
        OperationId::SortAscCyrillic,
        OperationId::SortDescCyrillic,
        OperationId::RemoveDuplicates,
        OperationId::RemoveEmptyLines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationId::Uppercase => "uppercase",
            OperationId::Lowercase => "lowercase",
            OperationId::TitleCase => "title_case",
            OperationId::SentenceCase => "sentence_case",
            OperationId::AddPlusPrefix => "add_plus_prefix",
            OperationId::RemovePlusPrefix => "remove_plus_prefix",
            OperationId::AddQuotes => "add_quotes",
            OperationId::AddBrackets => "add_brackets",
            OperationId::AddDashPrefix => "add_dash_prefix",
            OperationId::AddDashBracketsPrefix => "add_dash_brackets_prefix",
            OperationId::AddDashQuotesPrefix => "add_dash_quotes_prefix",
            OperationId::TrimSpaces => "trim_spaces",
            OperationId::RemoveTabs => "remove_tabs",
            OperationId::RemoveAfterDash => "remove_after_dash",
            OperationId::ReplaceSpacesWithUnderscore => "replace_spaces_with_underscore",
            OperationId::RemoveSpecialChars => "remove_special_chars",
            OperationId::ReplaceSpecialCharsWithSpaces => "replace_special_chars_with_spaces",
            OperationId::SortAsc => "sort_asc",
            OperationId::SortDesc => "sort_desc",
            OperationId::SortAscCyrillic => "sort_asc_cyrillic",
            OperationId::SortDescCyrillic => "sort_desc_cyrillic",
            OperationId::RemoveDuplicates => "remove_duplicates",
            OperationId::RemoveEmptyLines => "remove_empty_lines",
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationId {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| TransformError::UnknownOperationKind(s.to_string()))
    }
}

/// UI grouping of operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationGroup {
    Case,
    Wrapping,
    Cleanup,
    Sort,
}

impl OperationGroup {
    /// Heading shown above the group's buttons
    pub fn title(&self) -> &'static str {
        match self {
            OperationGroup::Case => "Case",
            OperationGroup::Wrapping => "Symbols/Wrapping",
            OperationGroup::Cleanup => "Cleanup",
            OperationGroup::Sort => "Sorting & Uniqueness",
        }
    }
}

/// Name under which a completed operation is reported in metrics.
///
/// Covers every registry id plus `search_replace`, which is not a registry
/// transform but still produces metrics and history entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum OperationIdentifier {
    Transform(OperationId),
    SearchReplace,
}

impl OperationIdentifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationIdentifier::Transform(id) => id.as_str(),
            OperationIdentifier::SearchReplace => "search_replace",
        }
    }
}

impl From<OperationId> for OperationIdentifier {
    fn from(id: OperationId) -> Self {
        OperationIdentifier::Transform(id)
    }
}

impl From<OperationIdentifier> for String {
    fn from(id: OperationIdentifier) -> Self {
        id.as_str().to_string()
    }
}

impl TryFrom<String> for OperationIdentifier {
    type Error = TransformError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "search_replace" {
            return Ok(OperationIdentifier::SearchReplace);
        }
        value.parse().map(OperationIdentifier::Transform)
    }
}

impl fmt::Display for OperationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_names() {
        for id in OperationId::ALL {
            assert_eq!(id.as_str().parse::<OperationId>().unwrap(), id);
        }
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        let json = serde_json::to_string(&OperationId::AddDashBracketsPrefix).unwrap();
        assert_eq!(json, "\"add_dash_brackets_prefix\"");
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = "reverse_lines".parse::<OperationId>().unwrap_err();
        assert_eq!(err, TransformError::UnknownOperationKind("reverse_lines".into()));
    }

    #[test]
    fn test_identifier_accepts_search_replace() {
        let id: OperationIdentifier = serde_json::from_str("\"search_replace\"").unwrap();
        assert_eq!(id, OperationIdentifier::SearchReplace);

        let id: OperationIdentifier = serde_json::from_str("\"sort_desc\"").unwrap();
        assert_eq!(id, OperationIdentifier::Transform(OperationId::SortDesc));
    }
}
