use crate::error::SchemaError;

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(msg: &str, line: usize, column: usize) -> SchemaError {
    SchemaError::ParseError {
        msg: msg.to_string(),
        line,
        column,
    }
}

/// Strips `package.` from a fully qualified name and joins the remaining
/// segments with `_`, so `pkg.Outer.Inner` under `pkg` becomes `Outer_Inner`.
pub fn flatten_name(full_name: &str, package: &str) -> String {
    let local = if package.is_empty() {
        full_name
    } else {
        full_name
            .strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(full_name)
    };
    local.split('.').collect::<Vec<_>>().join("_")
}

/// Turns a model name such as `Page<User>` into a message identifier (`Page_User`).
pub fn message_name(name: &str) -> String {
    name.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Converts a string to PascalCase.
/// - If the string contains underscores, each word gets an uppercase first letter
///   and a lowercase rest.
/// - A fully uppercase string keeps only its first letter uppercase.
/// - Otherwise only the first letter is forced to uppercase.
pub fn to_pascal_case(s: &str) -> String {
    fn capitalize(word: &str, lower_rest: bool) -> String {
        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) if lower_rest => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }

    if s.contains('_') {
        s.split('_')
         .filter(|word| !word.is_empty())
         .map(|word| capitalize(word, word == word.to_uppercase()))
         .collect::<String>()
    } else {
        capitalize(s, s == s.to_uppercase())
    }
}

/// Converts a string to snake_case without splitting acronyms
/// (e.g. "sessionID" becomes "session_id").
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for i in 0..chars.len() {
        let c = chars[i];
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if !prev.is_uppercase() || (i + 1 < chars.len() && chars[i + 1].is_lowercase()) {
                    if prev != '_' {
                        snake.push('_');
                    }
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_names() {
        assert_eq!(flatten_name("pkg.Outer.Inner", "pkg"), "Outer_Inner");
        assert_eq!(flatten_name("pkg.Outer", "pkg"), "Outer");
        assert_eq!(flatten_name("google.protobuf.Timestamp", "pkg"), "google_protobuf_Timestamp");
        assert_eq!(flatten_name("pkgx.Outer", "pkg"), "pkgx_Outer");
        assert_eq!(flatten_name("Outer.Inner", ""), "Outer_Inner");
    }

    #[test]
    fn sanitizes_generic_names() {
        assert_eq!(message_name("Page<User>"), "Page_User");
        assert_eq!(message_name("Pair<Key, Map<string, int>>"), "Pair_Key_Map_string_int");
        assert_eq!(message_name("Plain"), "Plain");
    }

    #[test]
    fn case_conversions() {
        assert_eq!(to_pascal_case("user_profile"), "UserProfile");
        assert_eq!(to_pascal_case("ACTIVE"), "Active");
        assert_eq!(to_pascal_case("getUser"), "GetUser");
        assert_eq!(to_snake_case("GetUser"), "get_user");
        assert_eq!(to_snake_case("sessionID"), "session_id");
        assert_eq!(to_snake_case("Outer_Inner"), "outer_inner");
    }

    #[test]
    fn quotes_like_json() {
        assert_eq!(quote("a\"b"), r#""a\"b""#);
    }
}
