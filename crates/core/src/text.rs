//! Shared text-scanning helpers for the pattern-based extractors. Everything
//! here is heuristic by design; there is no statistical NLU anywhere in this
//! crate.

/// Lowercases and strips the thousands separators customers type inside
/// numbers ("350,000").
pub(crate) fn normalize(text: &str) -> String {
    text.to_lowercase().replace(',', "")
}

/// Splits into scan tokens, keeping `%` (percent patterns) and `.` (decimal
/// amounts) attached to their token.
pub(crate) fn tokenize(normalized: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(normalized.len());
    for character in normalized.chars() {
        if character.is_alphanumeric() || matches!(character, '%' | '.') {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}

/// Money-like token with the shared scaling heuristic: a bare numeral under
/// 1,000 means thousands ("250" → 250,000), as does an explicit `k` suffix.
pub(crate) fn parse_amount(token: &str) -> Option<f64> {
    if let Some(amount) = parse_k_suffixed(token) {
        return Some(amount);
    }

    let amount = parse_plain_number(token)?;
    if amount < 1_000.0 {
        Some(amount * 1_000.0)
    } else {
        Some(amount)
    }
}

/// Plain non-negative number, no scaling.
pub(crate) fn parse_plain_number(token: &str) -> Option<f64> {
    if !token.bytes().next().is_some_and(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse::<f64>().ok().filter(|value| value.is_finite() && *value >= 0.0)
}

pub(crate) fn parse_k_suffixed(token: &str) -> Option<f64> {
    let prefix = token.strip_suffix('k')?;
    parse_plain_number(prefix).map(|value| value * 1_000.0)
}
