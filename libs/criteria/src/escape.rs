//! Escaping helpers for text filter values.
//!
//! Text values for `in` and `between` are comma-separated lists; a literal
//! comma is written as `\,` and a literal backslash as `\\`.

/// Split on `sep`, skipping separators escaped with `\`. Escapes are kept in the parts.
pub(crate) fn split_unescaped(input: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == sep {
            out.push(&input[start..i]);
            start = i + c.len_utf8();
        }
    }
    out.push(&input[start..]);
    out
}

/// Remove list escapes. Unknown escapes are kept verbatim.
pub(crate) fn unescape_list_item(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('\\' | ',')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Escape SQL LIKE meta-characters so user input is matched literally (`ESCAPE '\'`).
pub(crate) fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_escapes() {
        assert_eq!(split_unescaped("a,b,c", ','), vec!["a", "b", "c"]);
        assert_eq!(split_unescaped("a\\,b,c", ','), vec!["a\\,b", "c"]);
        assert_eq!(split_unescaped("", ','), vec![""]);
        assert_eq!(split_unescaped("ñ,é", ','), vec!["ñ", "é"]);
    }

    #[test]
    fn unescape_list_items() {
        assert_eq!(unescape_list_item("a\\,b"), "a,b");
        assert_eq!(unescape_list_item("a\\\\b"), "a\\b");
        assert_eq!(unescape_list_item("a\\xb"), "a\\xb");
        assert_eq!(unescape_list_item("end\\"), "end\\");
    }

    #[test]
    fn like_pattern_escaping() {
        assert_eq!(escape_like_pattern("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(escape_like_pattern("plain"), "plain");
    }
}
