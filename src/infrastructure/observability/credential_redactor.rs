const REDACTED: &str = "[REDACTED]";

const SECRET_MARKERS: [&str; 6] = [
    "Bearer ",
    "access_token=",
    "password=",
    "secret=",
    "token=",
    "scribe_session=",
];

/// Masks bearer tokens, passwords and session cookies in text bound for logs.
///
/// Every occurrence is masked, not just the first.
pub fn redact_credentials(text: &str) -> String {
    let mut result = text.to_string();
    for marker in SECRET_MARKERS {
        let mut search_from = 0;
        while let Some(offset) = result[search_from..].find(marker) {
            let value_start = search_from + offset + marker.len();
            let value_end = result[value_start..]
                .find(|c: char| c.is_whitespace() || matches!(c, '&' | '"' | '\'' | ';' | ','))
                .map(|i| value_start + i)
                .unwrap_or(result.len());

            if value_end > value_start && &result[value_start..value_end] != REDACTED {
                result.replace_range(value_start..value_end, REDACTED);
                search_from = value_start + REDACTED.len();
            } else {
                search_from = value_end;
            }
        }
    }
    result
}
