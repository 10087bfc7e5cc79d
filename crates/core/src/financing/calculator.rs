use super::{FinancingTotals, ANNUAL_RATE};

/// Standard fixed-rate annuity payment: `p·r·(1+r)^n / ((1+r)^n − 1)` with
/// the monthly rate r and n monthly payments. The r == 0 branch keeps the
/// function total; the fixed 10% rate never takes it in practice.
pub fn monthly_payment(principal: f64, term_years: u32) -> f64 {
    if principal <= 0.0 || term_years == 0 {
        return 0.0;
    }

    let monthly_rate = ANNUAL_RATE / 12.0;
    let num_payments = (term_years * 12) as f64;

    if monthly_rate == 0.0 {
        return principal / num_payments;
    }

    let factor = (1.0 + monthly_rate).powf(num_payments);
    principal * monthly_rate * factor / (factor - 1.0)
}

pub fn totals(principal: f64, term_years: u32) -> FinancingTotals {
    let num_payments = term_years * 12;
    let monthly = monthly_payment(principal, term_years);
    let total_paid = monthly * num_payments as f64;

    FinancingTotals {
        monthly_payment: monthly,
        total_paid,
        total_interest: total_paid - principal.max(0.0),
        num_payments,
    }
}
