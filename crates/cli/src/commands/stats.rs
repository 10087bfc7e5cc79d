use forecourt_core::config::{AppConfig, LoadOptions};
use forecourt_core::Dataset;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let dataset = Dataset::load(&config.catalog.path);
    if dataset.is_empty() {
        return format!(
            "catalog `{}` is empty or unavailable; nothing to summarize",
            config.catalog.path.display()
        );
    }

    let stats = dataset.stats();
    let mut lines = vec![format!("catalog statistics for `{}`:", config.catalog.path.display())];
    lines.push(format!("- vehicles: {}", stats.total));
    lines.push(format!("- makes ({}): {}", stats.makes.len(), stats.makes.join(", ")));
    lines.push(format!(
        "- price range: {:.0} .. {:.0} (mean {:.0})",
        stats.price_min, stats.price_max, stats.price_mean
    ));
    lines.push(format!("- year range: {} .. {}", stats.year_min, stats.year_max));
    lines.push(format!(
        "- connectivity: {} with bluetooth, {} with carplay",
        stats.bluetooth_count, stats.car_play_count
    ));
    lines.push(format!("- most common makes: {}", dataset.top_makes(3).join(", ")));

    lines.join("\n")
}
