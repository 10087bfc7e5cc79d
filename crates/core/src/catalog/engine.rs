use crate::catalog::dataset::Dataset;
use crate::catalog::filter::SearchFilter;
use crate::domain::vehicle::{StockId, VehicleRecord};

/// Fixed presentation window. Every search returns at most this many rows
/// regardless of dataset size; it is not configurable per query.
pub const SHORTLIST_LIMIT: usize = 5;

pub struct CatalogEngine {
    dataset: Dataset,
}

impl CatalogEngine {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Applies each populated filter field as an independent conjunctive
    /// predicate, ranks survivors (price asc, year desc, km asc), and
    /// truncates to the shortlist window. An empty dataset yields an empty
    /// result, never an error.
    pub fn search(&self, filter: &SearchFilter) -> Vec<VehicleRecord> {
        let mut survivors: Vec<&VehicleRecord> =
            self.dataset.records().iter().filter(|record| matches(record, filter)).collect();

        survivors.sort_by(|a, b| {
            a.price
                .total_cmp(&b.price)
                .then_with(|| b.year.cmp(&a.year))
                .then_with(|| a.km.cmp(&b.km))
        });

        survivors.into_iter().take(SHORTLIST_LIMIT).cloned().collect()
    }

    /// Re-fetches full detail for a vehicle already referenced in a session,
    /// covering the case where the dataset was reloaded underneath it.
    pub fn get_by_id(&self, stock_id: StockId) -> Option<VehicleRecord> {
        self.dataset.get_by_id(stock_id).cloned()
    }
}

fn matches(record: &VehicleRecord, filter: &SearchFilter) -> bool {
    if let Some(price_max) = filter.price_max {
        if record.price > price_max {
            return false;
        }
    }
    if let Some(make) = &filter.make {
        if !record.make.eq_ignore_ascii_case(make) {
            return false;
        }
    }
    if let Some(model) = &filter.model {
        if !record.model.eq_ignore_ascii_case(model) {
            return false;
        }
    }
    if let Some(year_min) = filter.year_min {
        if record.year < year_min {
            return false;
        }
    }
    if let Some(year_max) = filter.year_max {
        if record.year > year_max {
            return false;
        }
    }
    if let Some(km_min) = filter.km_min {
        if record.km < km_min {
            return false;
        }
    }
    if let Some(km_max) = filter.km_max {
        if record.km > km_max {
            return false;
        }
    }
    if let Some(bluetooth) = filter.bluetooth {
        if record.bluetooth != bluetooth {
            return false;
        }
    }
    if let Some(car_play) = filter.car_play {
        if record.car_play != car_play {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::{CatalogEngine, SHORTLIST_LIMIT};
    use crate::catalog::dataset::fixtures::vehicle;
    use crate::catalog::dataset::Dataset;
    use crate::catalog::filter::SearchFilter;
    use crate::domain::vehicle::StockId;

    fn engine() -> CatalogEngine {
        CatalogEngine::new(Dataset::from_records(vec![
            vehicle(1, "Toyota", "Corolla", 2021, 300_000.0, 20_000),
            vehicle(2, "Toyota", "Yaris", 2019, 220_000.0, 50_000),
            vehicle(3, "Nissan", "Versa", 2020, 220_000.0, 35_000),
            vehicle(4, "Nissan", "Versa", 2020, 220_000.0, 30_000),
            vehicle(5, "Ford", "Figo", 2018, 180_000.0, 70_000),
            vehicle(6, "Kia", "Rio", 2022, 310_000.0, 10_000),
            vehicle(7, "Chevrolet", "Aveo", 2017, 170_000.0, 90_000),
        ]))
    }

    #[test]
    fn unconstrained_search_is_bounded_by_the_shortlist_window() {
        let results = engine().search(&SearchFilter::default());
        assert_eq!(results.len(), SHORTLIST_LIMIT);
    }

    #[test]
    fn ranking_is_price_asc_then_year_desc_then_km_asc() {
        let results = engine().search(&SearchFilter::default());

        for pair in results.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ordered = a.price < b.price
                || (a.price == b.price && a.year > b.year)
                || (a.price == b.price && a.year == b.year && a.km <= b.km);
            assert!(ordered, "ranking violated between {:?} and {:?}", a.stock_id, b.stock_id);
        }

        // Same price, same year: lower odometer first.
        let versa_positions: Vec<u64> = results
            .iter()
            .filter(|record| record.model == "Versa")
            .map(|record| record.stock_id.0)
            .collect();
        assert_eq!(versa_positions, vec![4, 3]);
    }

    #[test]
    fn conjunctive_predicates_narrow_the_result() {
        let engine = engine();
        let filter = SearchFilter {
            make: Some("Toyota".to_string()),
            price_max: Some(250_000.0),
            ..SearchFilter::default()
        };

        let results = engine.search(&filter);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].stock_id, StockId(2));
    }

    #[test]
    fn conflicting_bounds_return_zero_rows() {
        let filter = SearchFilter {
            year_min: Some(2022),
            year_max: Some(2015),
            ..SearchFilter::default()
        };
        assert!(engine().search(&filter).is_empty());
    }

    #[test]
    fn empty_dataset_returns_empty_result() {
        let engine = CatalogEngine::new(Dataset::default());
        assert!(engine.search(&SearchFilter::default()).is_empty());
        assert!(engine.get_by_id(StockId(1)).is_none());
    }

    #[test]
    fn scenario_toyota_under_budget_contains_the_corolla() {
        let engine = CatalogEngine::new(Dataset::from_records(vec![vehicle(
            11, "Toyota", "Corolla", 2021, 300_000.0, 20_000,
        )]));
        let filter = SearchFilter {
            make: Some("Toyota".to_string()),
            price_max: Some(350_000.0),
            ..SearchFilter::default()
        };

        let results = engine.search(&filter);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].stock_id, StockId(11));
    }
}
