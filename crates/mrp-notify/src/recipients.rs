/// Parse a recipient list from configuration text.
///
/// Accepts comma, semicolon or whitespace separated addresses, and the quoted
/// list form `['a@example.com', 'b@example.com']`. Tokens without an `@` are
/// dropped.
pub fn parse_recipient_list(raw: &str) -> Vec<String> {
    raw.split(|ch: char| {
        matches!(ch, '\'' | '"' | ',' | ';' | '[' | ']') || ch.is_whitespace()
    })
    .filter(|token| token.contains('@'))
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_list_form() {
        assert_eq!(
            parse_recipient_list("['ops@example.com', 'rpa@example.com']"),
            vec!["ops@example.com", "rpa@example.com"]
        );
    }

    #[test]
    fn parses_plain_separators() {
        assert_eq!(
            parse_recipient_list("ops@example.com; rpa@example.com\nlead@example.com"),
            vec!["ops@example.com", "rpa@example.com", "lead@example.com"]
        );
    }

    #[test]
    fn drops_tokens_without_at_sign() {
        assert!(parse_recipient_list("nobody, , []").is_empty());
    }
}
