use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    Debt, DebtId, DebtPayoff, DebtRegistry, DebtUpdate, PayoffResult, RegistryError, Strategy,
    StrategyComparison, compare, simulate,
};

pub const NON_CONVERGENT_WARNING: &str = "this payment plan never pays off your debt";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    #[serde(alias = "Avalanche", alias = "highest-rate", alias = "highestRate")]
    Avalanche,
    #[serde(alias = "Snowball", alias = "smallest-balance", alias = "smallestBalance")]
    Snowball,
}

impl From<ApiStrategy> for Strategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::Avalanche => Strategy::Avalanche,
            ApiStrategy::Snowball => Strategy::Snowball,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DebtPayload {
    id: Option<u32>,
    name: Option<String>,
    balance: Option<f64>,
    interest_rate: Option<f64>,
    min_payment: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    debts: Vec<DebtPayload>,
    extra_payment: Option<f64>,
    strategy: Option<ApiStrategy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanQuery {
    extra_payment: Option<f64>,
}

#[derive(Debug)]
struct PlanRequest {
    debts: Vec<Debt>,
    extra_payment: f64,
    strategy: Option<Strategy>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    result: PayoffResult,
    payoff_order: Vec<DebtPayoff>,
    warning: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    avalanche: PayoffResult,
    snowball: PayoffResult,
    avalanche_payoff_order: Vec<DebtPayoff>,
    snowball_payoff_order: Vec<DebtPayoff>,
    interest_saved: f64,
    months_saved: i64,
    recommended: Strategy,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistryResponse {
    debts: Vec<Debt>,
    total_balance: f64,
    total_min_payment: f64,
    weighted_average_rate: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Server-side stand-in for the page's session: one shared registry.
#[derive(Clone, Default)]
pub struct AppState {
    registry: Arc<Mutex<DebtRegistry>>,
}

impl AppState {
    pub fn new(registry: DebtRegistry) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    fn registry(&self) -> MutexGuard<'_, DebtRegistry> {
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/simulate", post(simulate_handler))
        .route("/api/compare", post(compare_handler))
        .route("/api/debts", get(list_debts_handler).post(add_debt_handler))
        .route("/api/debts/plan", get(registry_plan_handler))
        .route(
            "/api/debts/:id",
            patch(update_debt_handler).delete(remove_debt_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::default());

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "payoff HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/debts");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_handler(payload: Result<Json<PlanPayload>, JsonRejection>) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(rejection.status(), &rejection.body_text()),
    };
    let request = match plan_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let Some(strategy) = request.strategy else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "strategy is required (avalanche or snowball)",
        );
    };

    match simulate(&request.debts, request.extra_payment, strategy) {
        Ok(result) => json_response(StatusCode::OK, build_simulate_response(result)),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn compare_handler(payload: Result<Json<PlanPayload>, JsonRejection>) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(rejection.status(), &rejection.body_text()),
    };
    let request = match plan_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match compare(&request.debts, request.extra_payment) {
        Ok(comparison) => json_response(StatusCode::OK, build_compare_response(comparison)),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn list_debts_handler(State(state): State<AppState>) -> Response {
    let registry = state.registry();
    json_response(StatusCode::OK, build_registry_response(&registry))
}

async fn add_debt_handler(State(state): State<AppState>) -> Response {
    let mut registry = state.registry();
    registry.add_debt();
    json_response(StatusCode::CREATED, build_registry_response(&registry))
}

async fn update_debt_handler(
    State(state): State<AppState>,
    id: Result<Path<u32>, PathRejection>,
    update: Result<Json<DebtUpdate>, JsonRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return error_response(rejection.status(), &rejection.body_text()),
    };
    let Json(update) = match update {
        Ok(update) => update,
        Err(rejection) => return error_response(rejection.status(), &rejection.body_text()),
    };
    let mut registry = state.registry();
    if let Err(e) = registry.update_debt(DebtId(id), update) {
        return registry_error_response(e);
    }
    json_response(StatusCode::OK, build_registry_response(&registry))
}

async fn remove_debt_handler(
    State(state): State<AppState>,
    id: Result<Path<u32>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return error_response(rejection.status(), &rejection.body_text()),
    };
    let mut registry = state.registry();
    match registry.remove_debt(DebtId(id)) {
        Ok(_) => json_response(StatusCode::OK, build_registry_response(&registry)),
        Err(e) => registry_error_response(e),
    }
}

async fn registry_plan_handler(
    State(state): State<AppState>,
    query: Result<Query<PlanQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(rejection.status(), &rejection.body_text()),
    };
    let snapshot = state.registry().snapshot();
    let extra_payment = query.extra_payment.unwrap_or(0.0);
    match compare(&snapshot, extra_payment) {
        Ok(comparison) => json_response(StatusCode::OK, build_compare_response(comparison)),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn registry_error_response(err: RegistryError) -> Response {
    let status = match err {
        RegistryError::LastDebt => StatusCode::CONFLICT,
        RegistryError::UnknownDebt(_) => StatusCode::NOT_FOUND,
    };
    error_response(status, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_request_from_payload(payload)
}

fn plan_request_from_payload(payload: PlanPayload) -> Result<PlanRequest, String> {
    if payload.debts.is_empty() {
        return Err("debts must contain at least one debt".to_string());
    }

    let mut explicit_ids: Vec<DebtId> = Vec::new();
    for (idx, row) in payload.debts.iter().enumerate() {
        if let Some(raw) = row.id {
            let id = DebtId(raw);
            if explicit_ids.contains(&id) {
                return Err(format!("debts[{idx}].id {id} is duplicated"));
            }
            explicit_ids.push(id);
        }
    }

    // Rows without an id take their 1-based position, or the next id after it
    // that no other row claims.
    let mut debts: Vec<Debt> = Vec::with_capacity(payload.debts.len());
    for (idx, row) in payload.debts.into_iter().enumerate() {
        let position = idx + 1;
        let Some(balance) = row.balance else {
            return Err(format!("debts[{idx}].balance is required"));
        };
        let Some(interest_rate) = row.interest_rate else {
            return Err(format!("debts[{idx}].interestRate is required"));
        };
        let Some(min_payment) = row.min_payment else {
            return Err(format!("debts[{idx}].minPayment is required"));
        };
        let id = match row.id {
            Some(raw) => DebtId(raw),
            None => {
                let mut candidate = position as u32;
                while explicit_ids.contains(&DebtId(candidate))
                    || debts.iter().any(|d| d.id == DebtId(candidate))
                {
                    candidate += 1;
                }
                DebtId(candidate)
            }
        };
        let name = row.name.unwrap_or_else(|| format!("Debt {position}"));
        debts.push(Debt::new(id, name, balance, interest_rate, min_payment));
    }

    Ok(PlanRequest {
        debts,
        extra_payment: payload.extra_payment.unwrap_or(0.0),
        strategy: payload.strategy.map(Strategy::from),
    })
}

pub fn build_simulate_response(result: PayoffResult) -> SimulateResponse {
    let warning = if result.is_converged() {
        None
    } else {
        warn!(strategy = %result.strategy, "returning non-convergent payoff plan");
        Some(NON_CONVERGENT_WARNING)
    };
    SimulateResponse {
        payoff_order: result.payoff_order(),
        result,
        warning,
    }
}

pub fn build_compare_response(comparison: StrategyComparison) -> CompareResponse {
    let warnings = Strategy::ALL
        .into_iter()
        .filter(|&s| !comparison.result(s).is_converged())
        .map(|s| format!("{s}: {NON_CONVERGENT_WARNING}"))
        .collect::<Vec<_>>();
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "returning non-convergent comparison");
    }

    CompareResponse {
        interest_saved: comparison.interest_saved(),
        months_saved: comparison.months_saved(),
        recommended: comparison.recommended(),
        avalanche_payoff_order: comparison.avalanche.payoff_order(),
        snowball_payoff_order: comparison.snowball.payoff_order(),
        avalanche: comparison.avalanche,
        snowball: comparison.snowball,
        warnings,
    }
}

fn build_registry_response(registry: &DebtRegistry) -> RegistryResponse {
    RegistryResponse {
        debts: registry.snapshot(),
        total_balance: registry.total_balance(),
        total_min_payment: registry.total_min_payment(),
        weighted_average_rate: registry.weighted_average_rate(),
    }
}
