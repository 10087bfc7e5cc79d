//! Financing: fixed-rate amortization math, free-text parameter extraction,
//! and plan rendering.
//!
//! The commercial terms are fixed system-wide: 10% annual rate, terms of 3
//! to 6 years, and a 10/20/30% suggested down-payment ladder for customers
//! who have not committed to an amount yet.

pub mod calculator;
pub mod extract;
pub mod plan;

use serde::{Deserialize, Serialize};

pub const ANNUAL_RATE: f64 = 0.10;
pub const ALLOWED_TERM_YEARS: [u32; 4] = [3, 4, 5, 6];
pub const SUGGESTED_DOWN_PAYMENT_PCTS: [f64; 3] = [0.10, 0.20, 0.30];

/// Full breakdown for one principal/term combination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancingTotals {
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub num_payments: u32,
}

pub use calculator::{monthly_payment, totals};
pub use extract::{extract_down_payment, extract_term_years};
