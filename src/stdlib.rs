/// Read one line from a [`std::io::BufRead`] source, stripping the trailing
/// newline (`\n` or `\r\n`).
///
/// Returns `None` at EOF or on an I/O error.
pub fn read_line_from<R: std::io::BufRead>(reader: &mut R) -> Option<String> {
    let mut buf = String::new();
    match reader.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            if buf.ends_with('\n') {
                buf.pop();
                if buf.ends_with('\r') {
                    buf.pop();
                }
            }
            Some(buf)
        }
    }
}

/// Parse a string as a Rill `NUMBER` literal, trimming surrounding
/// whitespace.
///
/// Accepts: `DIGIT+ ("." DIGIT+)?` — no sign, no scientific notation.
/// Returns `None` if the string is not a valid Rill number.
pub fn parse_number_literal(s: &str) -> Option<f64> {
    let text = s.trim();
    let digits_only = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    let valid = match text.split_once('.') {
        Some((whole, fraction)) => digits_only(whole) && digits_only(fraction),
        None => digits_only(text),
    };
    if valid { text.parse().ok() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[test]
    fn read_line_returns_string_without_newline() {
        let mut r = Cursor::new(b"hello\nworld\n");
        assert_eq!(read_line_from(&mut r), Some("hello".into()));
        assert_eq!(read_line_from(&mut r), Some("world".into()));
        assert_eq!(read_line_from(&mut r), None);
    }

    #[test]
    fn read_line_strips_crlf() {
        let mut r = Cursor::new(b"hello\r\nworld\r\n");
        assert_eq!(read_line_from(&mut r), Some("hello".into()));
        assert_eq!(read_line_from(&mut r), Some("world".into()));
    }

    #[test]
    fn read_line_empty_line_returns_empty_string() {
        let mut r = Cursor::new(b"\nhello\n");
        assert_eq!(read_line_from(&mut r), Some("".into()));
        assert_eq!(read_line_from(&mut r), Some("hello".into()));
    }

    #[test]
    fn read_line_no_trailing_newline() {
        let mut r = Cursor::new(b"last");
        assert_eq!(read_line_from(&mut r), Some("last".into()));
        assert_eq!(read_line_from(&mut r), None);
    }

    #[test]
    fn read_line_empty_input_returns_none() {
        let mut r = Cursor::new(b"");
        assert_eq!(read_line_from(&mut r), None);
    }

    #[rstest]
    #[case("42", Some(42.0))]
    #[case("0", Some(0.0))]
    #[case("007", Some(7.0))]
    #[case("0.5", Some(0.5))]
    #[case(" 3.25 ", Some(3.25))]
    #[case("", None)]
    #[case("   ", None)]
    #[case("-1", None)]
    #[case("2e8", None)]
    #[case("1.2.3", None)]
    #[case("3.", None)]
    #[case(".5", None)]
    #[case("inf", None)]
    #[case("nan", None)]
    #[case("four", None)]
    #[case("1 2", None)]
    fn number_literal_parsing(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_number_literal(input), expected);
    }
}
