//! Pure reply rendering for catalog results. Customer-facing strings are
//! Spanish to match the product surface.

use crate::domain::vehicle::VehicleRecord;

pub fn format_mxn(amount: f64) -> String {
    format!("${} MXN", group_thousands(amount.round() as i64))
}

pub fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn vehicle_card(vehicle: &VehicleRecord) -> String {
    format!(
        "🚗 {name}\n\
         💰 Precio: {price}\n\
         📊 Kilometraje: {km} km\n\
         📱 Bluetooth: {bluetooth} | CarPlay: {car_play}\n\
         🔧 Versión: {version}\n\
         📋 ID: {stock_id}",
        name = vehicle.display_name(),
        price = format_mxn(vehicle.price),
        km = group_thousands(vehicle.km as i64),
        bluetooth = yes_no(vehicle.bluetooth),
        car_play = yes_no(vehicle.car_play),
        version = vehicle.version,
        stock_id = vehicle.stock_id,
    )
}

pub fn shortlist_reply(results: &[VehicleRecord]) -> String {
    let mut reply = format!("Encontré {} auto(s) que podrían interesarte:\n\n", results.len());
    for (position, vehicle) in results.iter().enumerate() {
        reply.push_str(&format!("{}. {}\n\n", position + 1, vehicle_card(vehicle)));
    }
    reply.push_str(
        "¿Te interesa alguno en particular? Puedo darte más detalles o ayudarte con el financiamiento.",
    );
    reply
}

pub fn no_match_reply(top_makes: &[String]) -> String {
    let mut reply = String::from(
        "No encontré autos que coincidan con tus preferencias. ¿Podrías ajustar los criterios de búsqueda?",
    );
    if !top_makes.is_empty() {
        reply.push_str(&format!(
            "\n\nLas marcas con más autos disponibles son: {}.",
            top_makes.join(", ")
        ));
    }
    reply
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Sí"
    } else {
        "No"
    }
}

#[cfg(test)]
mod tests {
    use super::{format_mxn, group_thousands, no_match_reply, shortlist_reply, vehicle_card};
    use crate::catalog::dataset::fixtures::vehicle;

    #[test]
    fn groups_thousands_with_commas() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(45_000), "45,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(format_mxn(300_000.4), "$300,000 MXN");
    }

    #[test]
    fn vehicle_card_includes_identity_and_price() {
        let card = vehicle_card(&vehicle(42, "Toyota", "Corolla", 2021, 300_000.0, 20_000));
        assert!(card.contains("Toyota Corolla 2021"));
        assert!(card.contains("$300,000 MXN"));
        assert!(card.contains("ID: 42"));
    }

    #[test]
    fn shortlist_reply_numbers_every_entry() {
        let results = vec![
            vehicle(1, "Toyota", "Corolla", 2021, 300_000.0, 20_000),
            vehicle(2, "Nissan", "Versa", 2020, 240_000.0, 35_000),
        ];
        let reply = shortlist_reply(&results);
        assert!(reply.starts_with("Encontré 2 auto(s)"));
        assert!(reply.contains("1. "));
        assert!(reply.contains("2. "));
        assert!(reply.contains("financiamiento"));
    }

    #[test]
    fn no_match_reply_suggests_common_makes() {
        let reply = no_match_reply(&["Nissan".to_string(), "Toyota".to_string()]);
        assert!(reply.contains("No encontré autos"));
        assert!(reply.contains("Nissan, Toyota"));

        let bare = no_match_reply(&[]);
        assert!(!bare.contains("marcas"));
    }
}
