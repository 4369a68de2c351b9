//! Text helpers for presenting command output

use crate::error::{Result, RunError};

/// Prefix every line of `text` with ` {prefix} {marker} `.
///
/// The first line of the output is a bare marker line, so
/// `pipe_str("stdout", "|", "a\nb")` renders as:
///
/// ```text
///  stdout |
///  stdout | a
///  stdout | b
/// ```
pub fn pipe_str(prefix: &str, marker: &str, text: &str) -> String {
    let replacement = format!("\n {} {} ", prefix, marker);
    let body = text.replace('\n', &replacement);
    format!(" {p} {m}\n {p} {m} {body}", p = prefix, m = marker, body = body)
}

/// Insert `item` into `items` at `index`.
pub fn insert_str(mut items: Vec<String>, item: &str, index: usize) -> Result<Vec<String>> {
    if index > items.len() {
        return Err(RunError::InvalidIndex {
            index,
            len: items.len(),
        });
    }
    items.insert(index, item.to_string());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<String> {
        s.chars().map(|c| c.to_string()).collect()
    }

    #[test]
    fn insert_str_in_the_middle() {
        let result = insert_str(chars("yes"), "v", 1).unwrap();
        assert_eq!(result, chars("yves"));
    }

    #[test]
    fn insert_str_at_the_end() {
        let result = insert_str(chars("ab"), "c", 2).unwrap();
        assert_eq!(result, chars("abc"));
    }

    #[test]
    fn insert_str_rejects_out_of_bounds_index() {
        let err = insert_str(chars("ab"), "c", 5).unwrap_err();
        assert!(matches!(err, RunError::InvalidIndex { index: 5, len: 2 }));
    }

    #[test]
    fn pipe_str_prefixes_each_line() {
        let out = pipe_str("stdout", "|", "a\nb");
        assert_eq!(out, " stdout |\n stdout | a\n stdout | b");
    }

    #[test]
    fn pipe_str_single_line() {
        assert_eq!(pipe_str("err", ">", "boom"), " err >\n err > boom");
    }
}
