//! Plan rendering. Pure functions over a vehicle and financing parameters;
//! the capability layer decides which shape applies based on what the
//! extractor found.

use super::{calculator, ALLOWED_TERM_YEARS, ANNUAL_RATE, SUGGESTED_DOWN_PAYMENT_PCTS};
use crate::catalog::format::format_mxn;
use crate::domain::vehicle::VehicleRecord;

/// Both down payment and term known: one full breakdown.
pub fn specific_plan(vehicle: &VehicleRecord, down_payment: f64, term_years: u32) -> String {
    let amount_financed = vehicle.price - down_payment;
    let breakdown = calculator::totals(amount_financed, term_years);

    format!(
        "{header}\n\n\
         Financiamiento a {term_years} años ({payments} mensualidades)\n\
         Pago mensual: {monthly}\n\
         Total a pagar: {total}\n\
         Total de intereses: {interest}\n\n\
         ¿Te interesa esta opción? Puedo ayudarte con los siguientes pasos.",
        header = plan_header(vehicle, down_payment, amount_financed),
        payments = breakdown.num_payments,
        monthly = format_mxn(breakdown.monthly_payment),
        total = format_mxn(breakdown.total_paid),
        interest = format_mxn(breakdown.total_interest),
    )
}

/// Down payment known, term open: one breakdown per permitted term.
pub fn multi_term_plan(vehicle: &VehicleRecord, down_payment: f64) -> String {
    let amount_financed = vehicle.price - down_payment;
    let mut reply = plan_header(vehicle, down_payment, amount_financed);
    reply.push_str("\n\nOpciones de pago mensual:\n");

    for term_years in ALLOWED_TERM_YEARS {
        let breakdown = calculator::totals(amount_financed, term_years);
        reply.push_str(&format!(
            "\n{term_years} años ({payments} mensualidades)\n\
             • Pago mensual: {monthly}\n\
             • Total a pagar: {total}\n\
             • Total de intereses: {interest}\n",
            payments = breakdown.num_payments,
            monthly = format_mxn(breakdown.monthly_payment),
            total = format_mxn(breakdown.total_paid),
            interest = format_mxn(breakdown.total_interest),
        ));
    }

    reply.push_str("\n¿Qué plazo te conviene más? Puedo darte más detalles de cualquier opción.");
    reply
}

/// Nothing known yet: suggested down payments of 10/20/30% across every
/// permitted term.
pub fn option_grid(vehicle: &VehicleRecord) -> String {
    let mut reply = format!(
        "Opciones de financiamiento para {name}\n\
         Precio: {price} | Tasa: {rate:.0}% anual\n",
        name = vehicle.display_name(),
        price = format_mxn(vehicle.price),
        rate = ANNUAL_RATE * 100.0,
    );

    for pct in SUGGESTED_DOWN_PAYMENT_PCTS {
        let down_payment = vehicle.price * pct;
        let amount_financed = vehicle.price - down_payment;
        reply.push_str(&format!(
            "\nCon {pct:.0}% de enganche ({down}):\n",
            pct = pct * 100.0,
            down = format_mxn(down_payment),
        ));
        for term_years in ALLOWED_TERM_YEARS {
            let monthly = calculator::monthly_payment(amount_financed, term_years);
            reply.push_str(&format!("• {term_years} años: {}/mes\n", format_mxn(monthly)));
        }
    }

    reply.push_str(
        "\n¿Qué enganche y plazo te convienen más? Puedo darte más detalles de cualquier opción.",
    );
    reply
}

/// Fixed guidance when financing is requested with no vehicle selected.
pub fn no_vehicle_reply() -> String {
    "Para calcular tu financiamiento necesito que primero selecciones un auto.\n\n\
     Puedes buscar autos diciendo algo como:\n\
     • \"Quiero un Toyota con presupuesto de 300000\"\n\
     • \"Muéstrame autos del 2020\"\n\
     • \"Busco un auto con bluetooth\"\n\n\
     Una vez que selecciones un auto, calculamos las opciones de financiamiento perfectas para ti."
        .to_string()
}

fn plan_header(vehicle: &VehicleRecord, down_payment: f64, amount_financed: f64) -> String {
    format!(
        "Plan de financiamiento para {name}\n\n\
         Precio del auto: {price}\n\
         Enganche: {down} ({pct:.1}%)\n\
         Monto a financiar: {financed}\n\
         Tasa de interés: {rate:.0}% anual",
        name = vehicle.display_name(),
        price = format_mxn(vehicle.price),
        down = format_mxn(down_payment),
        pct = down_payment / vehicle.price * 100.0,
        financed = format_mxn(amount_financed),
        rate = ANNUAL_RATE * 100.0,
    )
}

#[cfg(test)]
mod tests {
    use super::{multi_term_plan, no_vehicle_reply, option_grid, specific_plan};
    use crate::catalog::dataset::fixtures::vehicle;
    use crate::financing::calculator;

    #[test]
    fn specific_plan_shows_the_single_breakdown() {
        let corolla = vehicle(1, "Toyota", "Corolla", 2021, 300_000.0, 20_000);
        let plan = specific_plan(&corolla, 60_000.0, 4);

        let expected_monthly = calculator::monthly_payment(240_000.0, 4);
        assert!(plan.contains("Toyota Corolla 2021"));
        assert!(plan.contains("Enganche: $60,000 MXN (20.0%)"));
        assert!(plan.contains("Monto a financiar: $240,000 MXN"));
        assert!(plan.contains("48 mensualidades"));
        assert!(plan.contains(&crate::catalog::format::format_mxn(expected_monthly)));
    }

    #[test]
    fn multi_term_plan_covers_every_permitted_term() {
        let corolla = vehicle(1, "Toyota", "Corolla", 2021, 300_000.0, 20_000);
        let plan = multi_term_plan(&corolla, 60_000.0);
        for term in [3, 4, 5, 6] {
            assert!(plan.contains(&format!("{term} años")), "missing term {term}");
        }
    }

    #[test]
    fn option_grid_lays_out_three_down_payments() {
        let corolla = vehicle(1, "Toyota", "Corolla", 2021, 300_000.0, 20_000);
        let grid = option_grid(&corolla);
        assert!(grid.contains("Con 10% de enganche ($30,000 MXN):"));
        assert!(grid.contains("Con 20% de enganche ($60,000 MXN):"));
        assert!(grid.contains("Con 30% de enganche ($90,000 MXN):"));
        assert!(grid.contains("Tasa: 10% anual"));
    }

    #[test]
    fn no_vehicle_reply_carries_example_queries() {
        let reply = no_vehicle_reply();
        assert!(reply.contains("primero selecciones un auto"));
        assert!(reply.contains("presupuesto de 300000"));
    }
}
