use forecourt_core::config::{AppConfig, LoadOptions};
use forecourt_core::Dataset;
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_catalog(&config));
            checks.push(check_delivery(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "catalog_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "delivery_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_catalog(config: &AppConfig) -> DoctorCheck {
    match Dataset::try_load(&config.catalog.path) {
        Ok(dataset) if dataset.is_empty() => DoctorCheck {
            name: "catalog_readiness",
            status: CheckStatus::Fail,
            details: format!("`{}` loaded but contains no rows", config.catalog.path.display()),
        },
        Ok(dataset) => DoctorCheck {
            name: "catalog_readiness",
            status: CheckStatus::Pass,
            details: format!(
                "{} vehicles loaded from `{}`",
                dataset.len(),
                config.catalog.path.display()
            ),
        },
        Err(error) => DoctorCheck {
            name: "catalog_readiness",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_delivery(config: &AppConfig) -> DoctorCheck {
    if !config.messenger.enabled {
        return DoctorCheck {
            name: "delivery_readiness",
            status: CheckStatus::Pass,
            details: "delivery disabled; replies go to the noop transport".to_string(),
        };
    }

    let verify_ok = !config.messenger.verify_token.expose_secret().trim().is_empty();
    let page_ok = !config.messenger.page_access_token.expose_secret().trim().is_empty();
    if verify_ok && page_ok {
        DoctorCheck {
            name: "delivery_readiness",
            status: CheckStatus::Pass,
            details: "delivery tokens present".to_string(),
        }
    } else {
        DoctorCheck {
            name: "delivery_readiness",
            status: CheckStatus::Fail,
            details: "delivery enabled but verify/page tokens are missing".to_string(),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
