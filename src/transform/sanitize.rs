//! Filename sanitization shared by the JSON writer, image naming and
//! tool-table lookups.

/// Sanitize a tool name for use as a filename.
///
/// `"` becomes `in` (so `1/4" Endmill` reads naturally as a file name),
/// filesystem-reserved characters and line breaks become `_`, and
/// surrounding whitespace is trimmed. Deterministic and idempotent:
/// sanitizing an already-sanitized name is a no-op.
pub fn sanitize_filename(name: &str) -> String {
    let quoted = name.replace('"', "in");
    let cleaned: String = quoted
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '/' | '\\' | '|' | '?' | '*' | '\n' | '\r' => '_',
            other => other,
        })
        .collect();
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_becomes_in() {
        assert_eq!(sanitize_filename("1/4\" Endmill"), "1_4in Endmill");
    }

    #[test]
    fn test_reserved_characters_replaced() {
        assert_eq!(sanitize_filename("a<b>c:d|e?f*g"), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_filename("line\nbreak\rhere"), "line_break_here");
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(sanitize_filename("  Test Bit  "), "Test Bit");
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_idempotent() {
        for name in ["1/4\" Endmill", "  a:b  ", "plain name", "x\\y/z"] {
            let once = sanitize_filename(name);
            assert_eq!(sanitize_filename(&once), once);
        }
    }
}
