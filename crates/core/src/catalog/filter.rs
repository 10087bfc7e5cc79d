use serde::{Deserialize, Serialize};

use crate::catalog::dataset::Dataset;
use crate::text::{normalize, parse_amount, parse_k_suffixed, tokenize};

/// Structured search filter derived from one utterance. A missing field means
/// "unconstrained". Conflicting bounds are passed through untouched; the
/// engine just returns zero rows for them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub price_max: Option<f64>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub km_min: Option<u32>,
    pub km_max: Option<u32>,
    pub bluetooth: Option<bool>,
    pub car_play: Option<bool>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Price candidates are only accepted inside this band; anything outside is
/// treated as a mis-capture (a year, a phone digit run) and discarded.
const PRICE_BAND_MIN: f64 = 50_000.0;
const PRICE_BAND_MAX: f64 = 2_000_000.0;

const QUALITATIVE_NEW: &[&str] = &["nuevo", "reciente", "new", "recent"];
const QUALITATIVE_OLD: &[&str] = &["viejo", "antiguo", "old"];
const LOW_KM_CUES: &[&str] = &["pocos kilómetros", "pocos kilometros", "bajo kilometraje", "low km", "low mileage"];
const HIGH_KM_CUES: &[&str] =
    &["muchos kilómetros", "muchos kilometros", "alto kilometraje", "high km", "high mileage"];

const PRICE_CUE_TOKENS: &[&str] = &[
    "pesos",
    "mxn",
    "mx",
    "mil",
    "presupuesto",
    "precio",
    "hasta",
    "máximo",
    "maximo",
    "budget",
    "price",
    "maximum",
    "thousand",
];

/// Derives a [`SearchFilter`] from free text. Extraction is order-sensitive:
/// the year is claimed first so its digit run can never be re-read as a
/// price. Make/model matching is driven by whatever the dataset actually
/// contains instead of a hardcoded vocabulary.
pub struct FilterExtractor<'a> {
    dataset: &'a Dataset,
}

impl<'a> FilterExtractor<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    pub fn extract(&self, text: &str) -> (SearchFilter, Vec<String>) {
        let normalized = normalize(text);
        let tokens = tokenize(&normalized);
        let mut filter = SearchFilter::default();
        let mut detections = Vec::new();

        // 1. Year first; remember which token was consumed.
        let consumed_year = extract_year(&tokens);
        if let Some((_, year)) = consumed_year {
            filter.year_min = Some(year);
            detections.push(format!("year_min={year}"));
        }
        if QUALITATIVE_NEW.iter().any(|cue| normalized.contains(cue)) {
            filter.year_min = Some(2020);
            detections.push("year_min=2020 (qualitative)".to_string());
        } else if QUALITATIVE_OLD.iter().any(|cue| normalized.contains(cue)) {
            filter.year_max = Some(2015);
            detections.push("year_max=2015 (qualitative)".to_string());
        }

        // 2. Price, only when a cue word is present.
        if has_price_cue(text, &normalized, &tokens) {
            let skip_index = consumed_year.map(|(index, _)| index);
            if let Some(price) = extract_price(&tokens, skip_index) {
                filter.price_max = Some(price);
                detections.push(format!("price_max={price}"));
            }
        }

        // 3. Make, then model restricted to the matched make.
        for make in self.dataset.distinct_makes() {
            if normalized.contains(&make.to_lowercase()) {
                detections.push(format!("make={make}"));
                filter.make = Some(make);
                break;
            }
        }

        let candidates = match &filter.make {
            Some(make) => self.dataset.models_of_make(make),
            None => self.dataset.distinct_models(),
        };
        let squeezed = normalized.replace(' ', "");
        for (make, model) in candidates {
            let model_lower = model.to_lowercase();
            let matched = normalized.contains(&model_lower)
                || squeezed.contains(&model_lower.replace(' ', ""));
            if matched {
                detections.push(format!("model={model}"));
                if filter.make.is_none() {
                    detections.push(format!("make={make} (from model)"));
                    filter.make = Some(make);
                }
                filter.model = Some(model);
                break;
            }
        }

        // 4. Mileage cues.
        if LOW_KM_CUES.iter().any(|cue| normalized.contains(cue)) {
            filter.km_max = Some(50_000);
            detections.push("km_max=50000".to_string());
        } else if HIGH_KM_CUES.iter().any(|cue| normalized.contains(cue)) {
            filter.km_min = Some(100_000);
            detections.push("km_min=100000".to_string());
        }

        // 5. Feature flags.
        if normalized.contains("bluetooth") {
            filter.bluetooth = Some(true);
            detections.push("bluetooth=true".to_string());
        }
        if normalized.contains("carplay") || normalized.contains("car play") {
            filter.car_play = Some(true);
            detections.push("car_play=true".to_string());
        }

        (filter, detections)
    }
}

fn extract_year(tokens: &[String]) -> Option<(usize, i32)> {
    tokens.iter().enumerate().find_map(|(index, token)| {
        if token.len() == 4
            && (token.starts_with("19") || token.starts_with("20"))
            && token.bytes().all(|byte| byte.is_ascii_digit())
        {
            token.parse::<i32>().ok().map(|year| (index, year))
        } else {
            None
        }
    })
}

fn has_price_cue(raw: &str, normalized: &str, tokens: &[String]) -> bool {
    raw.contains('$')
        || normalized.contains("up to")
        || tokens.iter().any(|token| {
            PRICE_CUE_TOKENS.contains(&token.as_str()) || parse_k_suffixed(token).is_some()
        })
}

fn extract_price(tokens: &[String], skip_index: Option<usize>) -> Option<f64> {
    for (index, token) in tokens.iter().enumerate() {
        if Some(index) == skip_index {
            continue;
        }
        let Some(amount) = parse_amount(token) else {
            continue;
        };
        if (PRICE_BAND_MIN..=PRICE_BAND_MAX).contains(&amount) {
            return Some(amount);
        }
    }
    None
}
