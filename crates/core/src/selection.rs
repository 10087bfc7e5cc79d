//! Decides whether the customer is pinpointing one specific vehicle out of a
//! freshly computed shortlist. The policy deliberately favors committing to
//! a guess over leaving the customer unselected: a wrong guess is corrected
//! on the next turn, while no selection stalls the financing flow entirely.

use crate::domain::vehicle::VehicleRecord;

const INTEREST_PHRASES: &[&str] = &[
    "me interesa",
    "quiero el",
    "quiero la",
    "quiero ese",
    "quiero esa",
    "más detalles",
    "mas detalles",
    "ese auto",
    "ese coche",
    "cuéntame",
    "cuentame",
    "dime más",
    "dime mas",
    "i want the",
    "tell me about",
    "that car",
    "more details",
];

/// Short queries are treated as selection intent on their own.
const SHORT_UTTERANCE_WORDS: usize = 5;
const VERY_SHORT_UTTERANCE_WORDS: usize = 3;

pub struct SelectionResolver;

impl SelectionResolver {
    /// First matching rule wins:
    /// 1. explicit interest + single entry → that entry
    /// 2. explicit interest + several entries → `"make model"` substring
    ///    match, falling back to the first entry
    /// 3. bare model in a short utterance, or make+model, or model+year →
    ///    that entry
    /// 4. very short utterance over a shortlist of at most two → first entry
    /// 5. otherwise none (still browsing)
    pub fn resolve(utterance: &str, shortlist: &[VehicleRecord]) -> Option<VehicleRecord> {
        if shortlist.is_empty() {
            return None;
        }

        let text = utterance.to_lowercase();
        let word_count = text.split_whitespace().count();

        if INTEREST_PHRASES.iter().any(|phrase| text.contains(phrase)) {
            if shortlist.len() == 1 {
                return Some(shortlist[0].clone());
            }
            for vehicle in shortlist {
                let full_name =
                    format!("{} {}", vehicle.make.to_lowercase(), vehicle.model.to_lowercase());
                if text.contains(&full_name) {
                    return Some(vehicle.clone());
                }
            }
            // Explicit interest without precision still commits to a guess.
            return Some(shortlist[0].clone());
        }

        for vehicle in shortlist {
            let model = vehicle.model.to_lowercase();
            if !text.contains(&model) {
                continue;
            }
            if word_count <= SHORT_UTTERANCE_WORDS
                || text.contains(&vehicle.make.to_lowercase())
                || text.contains(&vehicle.year.to_string())
            {
                return Some(vehicle.clone());
            }
        }

        if word_count <= VERY_SHORT_UTTERANCE_WORDS && shortlist.len() <= 2 {
            return Some(shortlist[0].clone());
        }

        None
    }
}
