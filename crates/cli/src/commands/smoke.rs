use std::sync::Arc;
use std::time::Instant;

use forecourt_agent::runtime::AgentRuntime;
use forecourt_core::config::{AppConfig, LoadOptions};
use forecourt_core::{
    CatalogEngine, Dataset, KeywordKnowledgeBase, SessionStore, StockId, VehicleRecord,
};
use serde::Serialize;

use crate::commands::CommandResult;

const SMOKE_CUSTOMER: &str = "5210000000000";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config_started = Instant::now();
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms: elapsed_ms(config_started),
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms: elapsed_ms(config_started),
                message: error.to_string(),
            });
            checks.push(skipped("catalog_load"));
            checks.push(skipped("search_turn"));
            checks.push(skipped("financing_turn"));
            return finalize_report(checks, elapsed_ms(started));
        }
    };

    let catalog_started = Instant::now();
    let loaded = Dataset::load(&config.catalog.path);
    let dataset = if loaded.is_empty() {
        checks.push(SmokeCheck {
            name: "catalog_load",
            status: SmokeStatus::Pass,
            elapsed_ms: elapsed_ms(catalog_started),
            message: format!(
                "`{}` unavailable or empty; using the built-in demo record",
                config.catalog.path.display()
            ),
        });
        Dataset::from_records(vec![demo_record()])
    } else {
        checks.push(SmokeCheck {
            name: "catalog_load",
            status: SmokeStatus::Pass,
            elapsed_ms: elapsed_ms(catalog_started),
            message: format!("{} vehicles loaded", loaded.len()),
        });
        loaded
    };

    let first = dataset.records()[0].clone();
    let engine = Arc::new(CatalogEngine::new(dataset));
    let sessions = Arc::new(SessionStore::new());
    let runtime =
        AgentRuntime::with_defaults(engine, Arc::clone(&sessions), Arc::new(KeywordKnowledgeBase));

    let runtime_handle = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(handle) => handle,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "search_turn",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.push(skipped("financing_turn"));
            return finalize_report(checks, elapsed_ms(started));
        }
    };

    let search_started = Instant::now();
    let search_text = format!("me interesa el {} {}", first.make, first.model);
    let search_reply =
        runtime_handle.block_on(runtime.handle_message(SMOKE_CUSTOMER, &search_text));
    let selected = sessions.with_session(SMOKE_CUSTOMER, |session| session.selected_vehicle.is_some());
    checks.push(SmokeCheck {
        name: "search_turn",
        status: if !search_reply.is_empty() && selected { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: elapsed_ms(search_started),
        message: if selected {
            format!("shortlist returned for `{} {}` and a vehicle pinned", first.make, first.model)
        } else {
            "search turn did not pin a vehicle".to_string()
        },
    });

    let financing_started = Instant::now();
    let financing_text =
        format!("enganche de {} a 4 años", (first.price * 0.2).round() as i64);
    let financing_reply =
        runtime_handle.block_on(runtime.handle_message(SMOKE_CUSTOMER, &financing_text));
    let quoted = financing_reply.contains("Financiamiento a 4 años");
    checks.push(SmokeCheck {
        name: "financing_turn",
        status: if quoted { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: elapsed_ms(financing_started),
        message: if quoted {
            "specific financing plan produced".to_string()
        } else {
            "financing turn did not produce a specific plan".to_string()
        },
    });

    finalize_report(checks, elapsed_ms(started))
}

fn demo_record() -> VehicleRecord {
    VehicleRecord {
        stock_id: StockId(900001),
        make: "Toyota".to_string(),
        model: "Corolla".to_string(),
        year: 2021,
        price: 300_000.0,
        km: 20_000,
        version: "1.8 LE".to_string(),
        bluetooth: true,
        car_play: false,
        length_mm: 4630.0,
        width_mm: 1780.0,
        height_mm: 1435.0,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due to a previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
