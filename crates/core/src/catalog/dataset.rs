use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::vehicle::{StockId, VehicleRecord};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    Read { path: PathBuf, source: csv::Error },
    #[error("could not parse catalog row {row}: {message}")]
    Parse { row: usize, message: String },
}

/// Raw CSV row in the inventory export layout. Boolean-ish columns arrive as
/// `Sí`/`Yes`/`No` strings and the dimension columns keep their export names.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    stock_id: u64,
    km: u32,
    price: f64,
    make: String,
    model: String,
    year: i32,
    version: String,
    bluetooth: String,
    largo: f64,
    ancho: f64,
    altura: f64,
    car_play: String,
}

impl CatalogRow {
    fn into_record(self) -> VehicleRecord {
        VehicleRecord {
            stock_id: StockId(self.stock_id),
            make: self.make,
            model: self.model,
            year: self.year,
            price: self.price,
            km: self.km,
            version: self.version,
            bluetooth: parse_flag(&self.bluetooth),
            car_play: parse_flag(&self.car_play),
            length_mm: self.largo,
            width_mm: self.ancho,
            height_mm: self.altura,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "sí" | "si" | "yes" | "true" | "1")
}

#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<VehicleRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<VehicleRecord>) -> Self {
        Self { records }
    }

    /// Load the dataset, degrading to an empty catalog on any failure.
    /// Every catalog operation stays well-defined over an empty dataset.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(dataset) => dataset,
            Err(error) => {
                warn!(
                    event_name = "catalog.load_failed",
                    path = %path.display(),
                    error = %error,
                    "catalog unavailable; continuing with an empty dataset"
                );
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, CatalogError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|source| CatalogError::Read { path: path.to_path_buf(), source })?;

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<CatalogRow>().enumerate() {
            let row = row.map_err(|error| CatalogError::Parse {
                row: index + 1,
                message: error.to_string(),
            })?;
            records.push(row.into_record());
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[VehicleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get_by_id(&self, stock_id: StockId) -> Option<&VehicleRecord> {
        self.records.iter().find(|record| record.stock_id == stock_id)
    }

    /// Distinct makes in first-occurrence order, original casing.
    pub fn distinct_makes(&self) -> Vec<String> {
        let mut makes: Vec<String> = Vec::new();
        for record in &self.records {
            if !makes.iter().any(|make| make.eq_ignore_ascii_case(&record.make)) {
                makes.push(record.make.clone());
            }
        }
        makes
    }

    /// Distinct (make, model) pairs in first-occurrence order. The make of a
    /// pair is the one on the model's first catalog row, which is what the
    /// filter extractor back-fills when only a model matched.
    pub fn distinct_models(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for record in &self.records {
            if !pairs.iter().any(|(_, model)| model.eq_ignore_ascii_case(&record.model)) {
                pairs.push((record.make.clone(), record.model.clone()));
            }
        }
        pairs
    }

    pub fn models_of_make(&self, make: &str) -> Vec<(String, String)> {
        self.distinct_models()
            .into_iter()
            .filter(|(pair_make, _)| pair_make.eq_ignore_ascii_case(make))
            .collect()
    }

    pub fn stats(&self) -> CatalogStats {
        if self.records.is_empty() {
            return CatalogStats::default();
        }

        let mut price_min = f64::MAX;
        let mut price_max = f64::MIN;
        let mut price_sum = 0.0;
        let mut year_min = i32::MAX;
        let mut year_max = i32::MIN;
        let mut bluetooth_count = 0;
        let mut car_play_count = 0;

        for record in &self.records {
            price_min = price_min.min(record.price);
            price_max = price_max.max(record.price);
            price_sum += record.price;
            year_min = year_min.min(record.year);
            year_max = year_max.max(record.year);
            if record.bluetooth {
                bluetooth_count += 1;
            }
            if record.car_play {
                car_play_count += 1;
            }
        }

        let mut makes = self.distinct_makes();
        makes.sort();

        CatalogStats {
            total: self.records.len(),
            makes,
            price_min,
            price_max,
            price_mean: price_sum / self.records.len() as f64,
            year_min,
            year_max,
            bluetooth_count,
            car_play_count,
        }
    }

    /// Most common makes by row count, ties broken alphabetically. Used for
    /// the empty-result suggestion reply.
    pub fn top_makes(&self, limit: usize) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in &self.records {
            *counts.entry(record.make.clone()).or_default() += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.into_iter().take(limit).map(|(make, _)| make).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub makes: Vec<String>,
    pub price_min: f64,
    pub price_max: f64,
    pub price_mean: f64,
    pub year_min: i32,
    pub year_max: i32,
    pub bluetooth_count: usize,
    pub car_play_count: usize,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::vehicle::{StockId, VehicleRecord};

    pub fn vehicle(
        stock_id: u64,
        make: &str,
        model: &str,
        year: i32,
        price: f64,
        km: u32,
    ) -> VehicleRecord {
        VehicleRecord {
            stock_id: StockId(stock_id),
            make: make.to_string(),
            model: model.to_string(),
            year,
            price,
            km,
            version: "1.5 Mid".to_string(),
            bluetooth: true,
            car_play: false,
            length_mm: 4300.0,
            width_mm: 1760.0,
            height_mm: 1650.0,
        }
    }
}
