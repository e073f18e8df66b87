//! Whitespace and symbol cleanup transforms

/// Symbols removed (or blanked) by the special-character transforms
pub const SPECIAL_CHARS: &str = "()\\~!@#$%^&*_=+[]{}|;':\",./<>?`-";

fn is_special(ch: char) -> bool {
    SPECIAL_CHARS.contains(ch)
}

/// Trim both ends and collapse inner whitespace runs to one space
pub fn trim_spaces(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn remove_tabs(line: &str) -> String {
    line.replace('\t', " ")
}

/// Cut the line at the first `" -"`
pub fn remove_after_dash(line: &str) -> String {
    match line.find(" -") {
        Some(index) => line[..index].to_string(),
        None => line.to_string(),
    }
}

/// Replace every run of whitespace with a single `_`
pub fn replace_spaces_with_underscore(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_space = false;

    for ch in line.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }

    out
}

pub fn remove_special_chars(line: &str) -> String {
    line.chars().filter(|ch| !is_special(*ch)).collect()
}

pub fn replace_special_chars_with_spaces(line: &str) -> String {
    line.chars()
        .map(|ch| if is_special(ch) { ' ' } else { ch })
        .collect()
}
