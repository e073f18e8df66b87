//! Case transforms
//!
//! Uses Rust's locale-independent Unicode case mapping, so Cyrillic and
//! Latin text are handled the same way.

pub fn uppercase(line: &str) -> String {
    line.to_uppercase()
}

pub fn lowercase(line: &str) -> String {
    line.to_lowercase()
}

/// Lowercase the line, then capitalize the first letter of each
/// space-separated word. Runs of spaces are preserved.
pub fn title_case(line: &str) -> String {
    line.to_lowercase()
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase the first character and lowercase the rest
pub fn sentence_case(line: &str) -> String {
    let mut chars = line.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
