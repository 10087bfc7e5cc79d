use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use forecourt_core::CatalogEngine;

#[derive(Clone)]
pub struct HealthState {
    engine: Arc<CatalogEngine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(engine: Arc<CatalogEngine>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { engine })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.engine);
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "forecourt-server runtime initialized".to_string(),
        },
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(engine: &CatalogEngine) -> HealthCheck {
    let vehicles = engine.dataset().len();
    if vehicles > 0 {
        HealthCheck { status: "ready", detail: format!("{vehicles} vehicles loaded") }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "catalog is empty; searches will return no results".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;

    use forecourt_core::{CatalogEngine, Dataset, StockId, VehicleRecord};

    use super::{health, HealthState};

    fn record() -> VehicleRecord {
        VehicleRecord {
            stock_id: StockId(1),
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

    #[tokio::test]
    async fn health_is_ready_with_a_loaded_catalog() {
        let engine = Arc::new(CatalogEngine::new(Dataset::from_records(vec![record()])));
        let (status, Json(payload)) = health(State(HealthState { engine })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.catalog.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_degrades_when_the_catalog_is_empty() {
        let engine = Arc::new(CatalogEngine::new(Dataset::default()));
        let (status, Json(payload)) = health(State(HealthState { engine })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.catalog.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
