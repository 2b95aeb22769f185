use regex::Regex;
use lazy_static::lazy_static;
use crate::utils::{quote, error};
use crate::error::SchemaError;

lazy_static! {
    pub static ref TOKEN_REGEX:    Regex = Regex::new(r"((?:-|\b)\d+\b|[=;:,|{}()<>]|\b[A-Za-z_][A-Za-z0-9_]*\b|//.*|\s+)").unwrap();
    pub static ref WHITESPACE_RX:  Regex = Regex::new(r"^(//.*|\s+)$").unwrap();
}

#[derive(Debug, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Splits a `.pfm` model file into tokens, dropping whitespace and `//` comments.
/// The last token is always an empty EOF marker.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, SchemaError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end   = mat.end();
        let part  = mat.as_str();

        if start > last_end {
            let unexpected = &text[last_end..start];
            return Err(error(
                &format!("Syntax error: {}", quote(unexpected)),
                line,
                column,
            ));
        }

        if !WHITESPACE_RX.is_match(part) {
            tokens.push(Token {
                text:   part.to_string(),
                line,
                column,
            });
        }

        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.len() + 1;
            }
        } else {
            column += part.len();
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(error(
            &format!("Syntax error: {}", quote(unexpected)),
            line,
            column,
        ));
    }

    // EOF
    tokens.push(Token {
        text:   "".to_string(),
        line,
        column,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        let input = "ACTIVE = 10;";
        let expected = vec![
            Token { text: "ACTIVE".into(), line: 1, column: 1 },
            Token { text: "=".into(),      line: 1, column: 8 },
            Token { text: "10".into(),     line: 1, column: 10 },
            Token { text: ";".into(),      line: 1, column: 12 },
            Token { text: "".into(),       line: 1, column: 13 },
        ];
        let got = tokenize_schema(input).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_generic_field() {
        let input = "attrs: Map<string, Vec<int>>;";
        let texts: Vec<String> = tokenize_schema(input)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(
            texts,
            vec!["attrs", ":", "Map", "<", "string", ",", "Vec", "<", "int", ">", ">", ";", ""]
        );
    }

    #[test]
    fn test_tokenize_tracks_lines_and_skips_comments() {
        let input = "// header\nmodel Item {\n  id: uint32; // trailing\n}";
        let tokens = tokenize_schema(input).unwrap();
        assert_eq!(tokens[0], Token { text: "model".into(), line: 2, column: 1 });
        assert_eq!(tokens[3], Token { text: "id".into(),    line: 3, column: 3 });
        assert_eq!(tokens.last().unwrap().line, 4);
    }

    #[test]
    fn test_tokenize_negative_ordinal() {
        let tokens = tokenize_schema("UNKNOWN = -1;").unwrap();
        assert_eq!(tokens[2].text, "-1");
    }

    #[test]
    fn test_tokenize_unexpected_text() {
        let input = "id: uint32 @";
        let err = tokenize_schema(input).unwrap_err();
        assert!(
            matches!(err, SchemaError::ParseError { .. }),
            "expected a ParseError but got {:?}",
            err
        );
    }
}
