use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockId(pub u64);

impl std::fmt::Display for StockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One catalog row. Owned by the dataset and never mutated after load;
/// sessions hold by-value copies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub stock_id: StockId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub km: u32,
    pub version: String,
    pub bluetooth: bool,
    pub car_play: bool,
    pub length_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl VehicleRecord {
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.make, self.model, self.year)
    }
}
