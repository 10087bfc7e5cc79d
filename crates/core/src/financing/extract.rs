use super::ALLOWED_TERM_YEARS;
use crate::text::{normalize, parse_amount, parse_plain_number, tokenize};

const CURRENCY_UNITS: &[&str] = &["pesos", "mxn", "mx"];
const PERCENT_MIN: f64 = 5.0;
const PERCENT_MAX: f64 = 80.0;

/// Extracts a down payment anchored to the selected vehicle's price.
///
/// Specific phrase patterns are tried before any generic number capture so
/// an unrelated amount in the same message cannot win. Candidates above the
/// vehicle price are rejected outright; extraction yields `None` rather than
/// an invalid amount.
pub fn extract_down_payment(text: &str, vehicle_price: f64) -> Option<f64> {
    let normalized = normalize(text);
    let tokens = tokenize(&normalized);

    if let Some(amount) = phrase_pattern_amount(&tokens) {
        if amount <= vehicle_price {
            return Some(amount);
        }
    }

    if let Some(percent) = percent_pattern(&tokens) {
        if (PERCENT_MIN..=PERCENT_MAX).contains(&percent) {
            return Some(vehicle_price * percent / 100.0);
        }
    }

    // Generic fallback: an amount followed by a currency unit, with the
    // shared under-1,000 thousands scaling.
    for window in tokens.windows(2) {
        let [amount, unit] = window else { continue };
        if !CURRENCY_UNITS.contains(&unit.as_str()) {
            continue;
        }
        if let Some(amount) = parse_amount(amount) {
            if amount <= vehicle_price {
                return Some(amount);
            }
        }
    }

    None
}

/// "enganche de X" / "dando un enganche de X" / "con X de enganche" /
/// "down payment of X". Amounts here are taken literally, no scaling.
fn phrase_pattern_amount(tokens: &[String]) -> Option<f64> {
    for (index, token) in tokens.iter().enumerate() {
        if token == "enganche" {
            // "enganche de X"
            if tokens.get(index + 1).map(String::as_str) == Some("de") {
                if let Some(amount) = tokens.get(index + 2).and_then(|t| parse_plain_number(t)) {
                    return Some(amount);
                }
            }
            // "con X de enganche"
            if index >= 2 && tokens[index - 1] == "de" {
                if let Some(amount) = parse_plain_number(&tokens[index - 2]) {
                    return Some(amount);
                }
            }
        }

        // "down payment of X"
        if token == "down"
            && tokens.get(index + 1).map(String::as_str) == Some("payment")
            && tokens.get(index + 2).map(String::as_str) == Some("of")
        {
            if let Some(amount) = tokens.get(index + 3).and_then(|t| parse_plain_number(t)) {
                return Some(amount);
            }
        }
    }
    None
}

fn percent_pattern(tokens: &[String]) -> Option<f64> {
    for (index, token) in tokens.iter().enumerate() {
        if let Some(raw) = token.strip_suffix('%') {
            if let Some(percent) = parse_plain_number(raw) {
                return Some(percent);
            }
        }
        // "20 %" with a detached sign
        if token == "%" && index > 0 {
            if let Some(percent) = parse_plain_number(&tokens[index - 1]) {
                return Some(percent);
            }
        }
    }
    None
}

/// Term in years, accepted only inside the permitted financing terms. The
/// first "N años"/"N years" mention decides; an out-of-range mention yields
/// `None` instead of snapping to the nearest allowed term.
pub fn extract_term_years(text: &str) -> Option<u32> {
    let normalized = normalize(text);
    let tokens = tokenize(&normalized);

    for window in tokens.windows(2) {
        let [number, unit] = window else { continue };
        if !(unit.starts_with("año") || unit == "years" || unit == "year") {
            continue;
        }
        let Ok(term) = number.parse::<u32>() else { continue };
        return ALLOWED_TERM_YEARS.contains(&term).then_some(term);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{extract_down_payment, extract_term_years};

    const PRICE: f64 = 300_000.0;

    #[test]
    fn specific_phrases_win_over_unrelated_numbers() {
        assert_eq!(
            extract_down_payment("puedo dar 2 referencias y un enganche de 60000", PRICE),
            Some(60_000.0)
        );
        assert_eq!(
            extract_down_payment("dando un enganche de 45000 el mes que entra", PRICE),
            Some(45_000.0)
        );
        assert_eq!(extract_down_payment("con 80000 de enganche", PRICE), Some(80_000.0));
        assert_eq!(extract_down_payment("a down payment of 50000", PRICE), Some(50_000.0));
    }

    #[test]
    fn candidates_above_the_vehicle_price_are_rejected() {
        assert_eq!(extract_down_payment("enganche de 400000", PRICE), None);
        assert_eq!(extract_down_payment("te dejo 350000 pesos", PRICE), None);
    }

    #[test]
    fn percent_pattern_is_bounded_to_the_plausible_range() {
        assert_eq!(extract_down_payment("quiero dar el 20% de enganche", PRICE), Some(60_000.0));
        assert_eq!(extract_down_payment("con un 3% de enganche", PRICE), None);
        assert_eq!(extract_down_payment("doy el 90% de una vez", PRICE), None);
    }

    #[test]
    fn generic_fallback_needs_a_currency_unit_and_scales_small_amounts() {
        assert_eq!(extract_down_payment("te puedo dar 70000 pesos", PRICE), Some(70_000.0));
        assert_eq!(extract_down_payment("tengo 80 mxn guardados", PRICE), Some(80_000.0));
        assert_eq!(extract_down_payment("tengo 70000 guardados", PRICE), None);
    }

    #[test]
    fn no_parseable_amount_yields_none() {
        assert_eq!(extract_down_payment("todavía no sé cuánto dar", PRICE), None);
    }

    #[test]
    fn terms_outside_the_allowed_set_are_rejected() {
        assert_eq!(extract_term_years("financiar a 4 años"), Some(4));
        assert_eq!(extract_term_years("plazo de 6 años"), Some(6));
        assert_eq!(extract_term_years("over 5 years please"), Some(5));
        assert_eq!(extract_term_years("a 10 años"), None);
        assert_eq!(extract_term_years("en 2 años lo pago"), None);
        assert_eq!(extract_term_years("sin plazo definido"), None);
    }

    #[test]
    fn scenario_down_payment_and_term_in_one_message() {
        let text = "enganche de 60000 a 4 años";
        assert_eq!(extract_down_payment(text, PRICE), Some(60_000.0));
        assert_eq!(extract_term_years(text), Some(4));
    }
}
