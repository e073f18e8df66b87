//! Prefix and wrapping transforms
//!
//! Every function here is total: an empty line wraps to the bare delimiters.

/// Prefix every space-separated word with `+`, collapsing extra spaces
pub fn add_plus_prefix(line: &str) -> String {
    line.split(' ')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(|word| format!("+{}", word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip leading `+` runs from every word, then trim the line
pub fn remove_plus_prefix(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut at_word_start = true;

    for ch in line.chars() {
        if ch == '+' && at_word_start {
            continue;
        }
        at_word_start = ch.is_whitespace();
        out.push(ch);
    }

    out.trim().to_string()
}

pub fn add_quotes(line: &str) -> String {
    format!("\"{}\"", line)
}

pub fn add_brackets(line: &str) -> String {
    format!("[{}]", line)
}

pub fn add_dash_prefix(line: &str) -> String {
    format!("-{}", line)
}

pub fn add_dash_brackets_prefix(line: &str) -> String {
    format!("-[{}]", line)
}

pub fn add_dash_quotes_prefix(line: &str) -> String {
    format!("-\"{}\"", line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_plus_prefix() {
        assert_eq!(add_plus_prefix("apple  pie"), "+apple +pie");
        assert_eq!(add_plus_prefix("   "), "");
    }

    #[test]
    fn test_remove_plus_prefix() {
        assert_eq!(remove_plus_prefix("+сок +ЦІНА"), "сок ЦІНА");
        assert_eq!(remove_plus_prefix("++a b+c"), "a b+c");
        assert_eq!(remove_plus_prefix("+"), "");
    }

    #[test]
    fn test_plus_round_trip() {
        assert_eq!(remove_plus_prefix(&add_plus_prefix("red apple")), "red apple");
    }

    #[test]
    fn test_wrappers_on_empty_line() {
        assert_eq!(add_quotes(""), "\"\"");
        assert_eq!(add_brackets(""), "[]");
        assert_eq!(add_dash_prefix(""), "-");
        assert_eq!(add_dash_brackets_prefix(""), "-[]");
        assert_eq!(add_dash_quotes_prefix(""), "-\"\"");
    }
}
