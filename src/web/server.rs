use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::analysis::pipeline::{AnalysisResult, NutritionPipeline};
use crate::analysis::reconcile::ReconcileConfig;
use crate::analysis::scale::{calculate_nutrition_by_quantity, ServingCount};
use crate::catalog::store::ReferenceDatabase;
use crate::cli::{load_catalog, load_rules, ServeArgs};
use crate::core::analysis::ApiResponse;
use crate::core::record::NutritionData;
use crate::core::types::{CatalogKind, Nutrition, NutrientField};
use crate::matching::engine::NameMatcher;
use crate::scoring::health::{HealthScore, HealthScorer};
use crate::scoring::Verdict;

/// Largest accepted request body
pub const MAX_BODY_SIZE: usize = 1024 * 1024; // 1MB

/// Alternatives offered with a failing score
pub const DEFAULT_ALTERNATIVES: usize = 3;

/// Shared application state
pub struct AppState {
    pub db: ReferenceDatabase,
    pub scorer: HealthScorer,
    pub config: ReconcileConfig,
}

impl AppState {
    /// State backed by the embedded catalog and scoring rules
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded data fails to parse.
    pub fn embedded() -> anyhow::Result<Self> {
        Ok(Self {
            db: ReferenceDatabase::load_embedded()?,
            scorer: HealthScorer::embedded()?,
            config: ReconcileConfig::default(),
        })
    }
}

/// Error body returned by every failing endpoint
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

/// Build an error response. Details are logged, never sent to the client.
pub fn error_response(status: StatusCode, error_type: &str, user_message: &str, internal_error: Option<&str>) -> Response {
    if let Some(internal_msg) = internal_error {
        tracing::warn!("Request rejected ({}): {}", error_type, internal_msg);
    }

    let body = ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    };
    (status, Json(body)).into_response()
}

#[derive(Deserialize)]
struct AnalyzeParams {
    quantity: Option<i64>,
    #[serde(default)]
    score: bool,
}

#[derive(Deserialize)]
struct ScaleRequest {
    record: NutritionData,
    quantity: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRequest {
    food_name: String,
    nutrition: Nutrition,
}

#[derive(Deserialize)]
struct MatchParams {
    name: String,
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the catalog or rules cannot be loaded, the tokio
/// runtime cannot be created, or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let state = AppState {
        db: load_catalog(args.catalog.as_deref())?,
        scorer: HealthScorer::new(load_rules(args.rules.as_deref())?),
        config: ReconcileConfig::default(),
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args, state).await })
}

/// Routes and state without the middleware stack
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/scale", post(scale_handler))
        .route("/api/score", post(score_handler))
        .route("/api/match", get(match_handler))
        .route("/api/catalog", get(catalog_handler))
        .with_state(Arc::new(state))
}

/// Create the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns an error if the rate limiter configuration is rejected.
pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    // Configure IP-based rate limiting
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(50)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?;

    let app = build_routes(state).layer(
        ServiceBuilder::new()
            // Security headers for browser clients
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            .layer(GovernorLayer {
                config: Arc::new(governor_conf),
            })
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(30),
            ))
            .layer(ConcurrencyLimitLayer::new(100))
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
    );

    Ok(app)
}

async fn run_server(args: ServeArgs, state: AppState) -> anyhow::Result<()> {
    tracing::info!(
        completed_foods = state.db.completed_foods.len(),
        ingredients = state.db.ingredients.len(),
        "catalog loaded"
    );
    let app = create_router(state)?;

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting nutri-solver web server at http://{addr}");

    if args.open {
        let _ = open::that(format!("http://{addr}/health"));
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Analyze a raw inference response
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyzeParams>,
    body: Bytes,
) -> Response {
    let quantity = match ServingCount::new(params.quantity.unwrap_or(1)) {
        Ok(q) => q,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_quantity", &e.to_string(), None),
    };

    let response: ApiResponse = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                "Body is not a valid inference response",
                Some(&e.to_string()),
            )
        }
    };

    let pipeline = NutritionPipeline::with_config(&state.db, state.config);
    let report = match pipeline.process_api_response(&response) {
        AnalysisResult::Food(report) => report,
        not_food @ AnalysisResult::NotFood { .. } => return Json(not_food).into_response(),
    };

    let record = match calculate_nutrition_by_quantity(&report.record, quantity) {
        Ok(record) => record,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_quantity", &e.to_string(), None),
    };
    let mut output = serde_json::json!({
        "status": "food",
        "quantity": quantity,
        "record": record,
        "dish": report.dish,
        "corrections": report.corrections,
        "warnings": report.warnings,
    });

    if params.score {
        let health = state.scorer.score_record(&record);
        output["alternatives"] = alternatives_json(&state, &health);
        output["health"] = serde_json::json!(health);
    }

    Json(output).into_response()
}

/// Rescale a record; an already-scaled record composes its serving counts
async fn scale_handler(body: Bytes) -> Response {
    let request: ScaleRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                "Body must be {record, quantity}",
                Some(&e.to_string()),
            )
        }
    };

    let quantity = match ServingCount::new(request.quantity) {
        Ok(q) => q,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_quantity", &e.to_string(), None),
    };

    let record = match calculate_nutrition_by_quantity(&request.record, quantity) {
        Ok(record) => record,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "invalid_quantity", &e.to_string(), None),
    };
    Json(serde_json::json!({
        "quantity": quantity,
        "record": record,
    }))
    .into_response()
}

/// Score a food given by name and nutrition
async fn score_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: ScoreRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                "Body must be {foodName, nutrition}",
                Some(&e.to_string()),
            )
        }
    };

    if let Some(field) = NutrientField::ALL
        .into_iter()
        .find(|f| request.nutrition.get(*f) < 0.0)
    {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_nutrition",
            &format!("{field} must not be negative"),
            None,
        );
    }

    let health = state.scorer.score(&request.food_name, &request.nutrition);
    Json(serde_json::json!({
        "foodName": request.food_name,
        "alternatives": alternatives_json(&state, &health),
        "health": health,
    }))
    .into_response()
}

/// Resolve a name against the catalog
async fn match_handler(State(state): State<Arc<AppState>>, Query(params): Query<MatchParams>) -> Response {
    let name = params.name.trim();
    let matcher = NameMatcher::with_threshold(&state.db, state.config.similarity_threshold);

    match matcher.resolve(name) {
        Some(found) => Json(serde_json::json!({
            "query": name,
            "match": found,
        }))
        .into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "no_match",
            &format!("No catalog entry matches '{name}'"),
            None,
        ),
    }
}

/// Summary of the loaded catalog
async fn catalog_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let foods: Vec<serde_json::Value> = [CatalogKind::CompletedFood, CatalogKind::Ingredient]
        .into_iter()
        .flat_map(|kind| state.db.foods(kind).iter().map(move |f| (kind, f)))
        .map(|(kind, f)| {
            serde_json::json!({
                "id": f.id.0,
                "name": f.name,
                "kind": kind,
                "unitWeight": f.unit_weight,
                "calories": f.nutrition.calories,
            })
        })
        .collect();

    Json(serde_json::json!({
        "completedFoods": state.db.completed_foods.len(),
        "ingredients": state.db.ingredients.len(),
        "foods": foods,
    }))
}

fn alternatives_json(state: &AppState, health: &HealthScore) -> serde_json::Value {
    if health.verdict == Verdict::Pass {
        return serde_json::json!([]);
    }
    let alternatives = state.scorer.suggest_alternatives(&state.db, DEFAULT_ALTERNATIVES);
    serde_json::json!(alternatives)
}
