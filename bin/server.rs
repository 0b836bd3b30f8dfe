// Church Admin - View Server
// Serves the computed admin views as JSON, forwarding the caller's bearer
// token to the church backend.

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{Datelike, Local, NaiveDate};
use church_admin::entities::{Household, Transaction, TransactionQuery};
use church_admin::listing::{ListQuery, Paged, SortDirection, MIN_SEARCH_CHARS};
use church_admin::views::{self, DuesView, RoleRow, TransactionTotals};
use church_admin::{fail_open, telemetry, ApiClient, ApiError, AppConfig, Member, StaticToken, Voicemail};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
struct AppState {
    /// Pooled client; each request swaps in the caller's token
    api: ApiClient,
    config: Arc<AppConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// A failed view: status code plus the banner text
struct ViewError(StatusCode, String);

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.1),
        };
        (self.0, Json(body)).into_response()
    }
}

impl From<ApiError> for ViewError {
    fn from(err: ApiError) -> Self {
        let status = match &err {
            ApiError::Unauthorized(_) | ApiError::Token(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Network(_) | ApiError::Http { .. } | ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
        };
        if status == StatusCode::BAD_GATEWAY {
            warn!(error = %err, "backend call failed");
        }
        ViewError(status, err.banner())
    }
}

type ViewResult<T> = Result<Json<ApiResponse<T>>, ViewError>;

// ============================================================================
// Request helpers
// ============================================================================

fn bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Backend client acting as the caller
fn caller(state: &AppState, headers: &HeaderMap) -> Result<ApiClient, ViewError> {
    let token = bearer(headers).ok_or_else(|| {
        ViewError(StatusCode::UNAUTHORIZED, "Missing bearer token".to_string())
    })?;
    Ok(state.api.for_token(Arc::new(StaticToken::new(token))))
}

const RESERVED_PARAMS: [&str; 7] = ["search", "sort", "dir", "page", "pageSize", "year", "prorate"];

/// `?search=&sort=lastName&dir=desc&page=2&pageSize=10&role=admin`: every
/// non-reserved parameter is a categorical filter.
fn list_query(params: &HashMap<String, String>, default_page_size: usize) -> ListQuery {
    let number = |key: &str| params.get(key).and_then(|v| v.trim().parse::<usize>().ok());

    let mut query = ListQuery::default().with_page(
        number("page").unwrap_or(1),
        number("pageSize").unwrap_or(default_page_size),
    );
    if let Some(search) = params.get("search") {
        query = query.with_search(search.clone());
    }
    if let Some(key) = params.get("sort").filter(|k| !k.trim().is_empty()) {
        let direction = params
            .get("dir")
            .map(|d| SortDirection::parse(d))
            .unwrap_or_default();
        query = query.with_sort(key.trim(), direction);
    }
    for (key, value) in params {
        if !RESERVED_PARAMS.contains(&key.as_str()) {
            query = query.with_filter(key.clone(), value.clone());
        }
    }
    query
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn dues_params(params: &HashMap<String, String>) -> (i32, bool) {
    let year = params
        .get("year")
        .and_then(|y| y.trim().parse().ok())
        .unwrap_or_else(|| today().year());
    let prorate = params
        .get("prorate")
        .is_some_and(|p| matches!(p.as_str(), "1" | "true" | "yes"));
    (year, prorate)
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig {
    publishable_key: Option<String>,
    page_size: usize,
    search_debounce_ms: u128,
    min_search_chars: usize,
}

/// GET /api/config - Settings the browser needs before its first call
async fn client_config(State(state): State<AppState>) -> Json<ApiResponse<ClientConfig>> {
    Json(ApiResponse::ok(ClientConfig {
        publishable_key: state.config.publishable_key.clone(),
        page_size: state.config.page_size,
        search_debounce_ms: state.config.search_debounce.as_millis(),
        min_search_chars: MIN_SEARCH_CHARS,
    }))
}

/// GET /views/members
async fn members_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ViewResult<Paged<Member>> {
    let members = caller(&state, &headers)?.list_members().await?;
    let query = list_query(&params, state.config.page_size);
    Ok(Json(ApiResponse::ok(views::member_rows(&members, &query))))
}

/// GET /views/roles
async fn roles_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ViewResult<Paged<RoleRow>> {
    let members = caller(&state, &headers)?.list_members().await?;
    let query = list_query(&params, state.config.page_size);
    Ok(Json(ApiResponse::ok(views::role_rows(&members, &query))))
}

#[derive(Serialize)]
struct TransactionsView {
    totals: TransactionTotals,
    #[serde(flatten)]
    page: Paged<Transaction>,
}

/// GET /views/transactions - search runs on the backend, the rest here
async fn transactions_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ViewResult<TransactionsView> {
    let client = caller(&state, &headers)?;

    let mut query = list_query(&params, state.config.page_size);
    let search = std::mem::take(&mut query.search);
    let search = search.trim();
    let (start_date, end_date) = match params.get("year").and_then(|y| y.trim().parse::<i32>().ok()) {
        Some(year) => (NaiveDate::from_ymd_opt(year, 1, 1), NaiveDate::from_ymd_opt(year, 12, 31)),
        None => (None, None),
    };
    let backend_query = TransactionQuery {
        // Short terms are ignored, same as the search box
        search: (search.chars().count() >= MIN_SEARCH_CHARS).then(|| search.to_string()),
        start_date,
        end_date,
        ..Default::default()
    };

    let transactions = client.list_transactions(&backend_query).await?;
    Ok(Json(ApiResponse::ok(TransactionsView {
        totals: views::transaction_totals(&transactions),
        page: views::transaction_rows(&transactions, &query),
    })))
}

/// GET /views/members/:id/dues?year=2024&prorate=true
async fn member_dues_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(member_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ViewResult<DuesView> {
    let client = caller(&state, &headers)?;
    let (year, prorate) = dues_params(&params);

    let member = client.get_member(&member_id).await?;
    let roster = fail_open("members", client.list_members().await);
    let transactions = client.member_transactions(&member.id, year).await?;
    let view = views::member_dues_view(&member, &roster, &transactions, year, today(), prorate);
    Ok(Json(ApiResponse::ok(view)))
}

/// GET /views/households/:family_id/dues?year=2024&prorate=true
async fn household_dues_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(family_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ViewResult<DuesView> {
    let client = caller(&state, &headers)?;
    let (year, prorate) = dues_params(&params);

    let members = client.list_members().await?;
    let head = members
        .iter()
        .find(|m| m.household_key() == family_id && !m.is_deleted())
        .ok_or_else(|| ViewError(StatusCode::NOT_FOUND, format!("Household {family_id} not found")))?;
    let household = Household::of(head, &members);

    let mut transactions = Vec::new();
    for id in household.member_ids() {
        transactions.extend(client.member_transactions(id, year).await?);
    }

    let view = views::household_dues_view(&household, &transactions, year, today(), prorate);
    Ok(Json(ApiResponse::ok(view)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoicemailsView {
    unheard: usize,
    #[serde(flatten)]
    page: Paged<Voicemail>,
}

/// GET /views/voicemails
async fn voicemails_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ViewResult<VoicemailsView> {
    let voicemails = caller(&state, &headers)?.list_voicemails().await?;
    let query = list_query(&params, state.config.page_size);
    Ok(Json(ApiResponse::ok(VoicemailsView {
        unheard: views::unheard_count(&voicemails),
        page: views::voicemail_rows(&voicemails, &query),
    })))
}

// ============================================================================
// Main Server
// ============================================================================

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/config", get(client_config));

    let view_routes = Router::new()
        .route("/members", get(members_view))
        .route("/members/:id/dues", get(member_dues_view))
        .route("/households/:family_id/dues", get(household_dues_view))
        .route("/roles", get(roles_view))
        .route("/transactions", get(transactions_view))
        .route("/voicemails", get(voicemails_view));

    Router::new()
        .nest("/api", api_routes)
        .nest("/views", view_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    telemetry::init(config.log_json);

    // Placeholder token: every handler replaces it with the caller's
    let api = ApiClient::new(&config, Arc::new(StaticToken::new("")))?;
    let addr = config.server_addr.clone();
    info!(backend = api.base_url(), "view server configured");

    let state = AppState {
        api,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "view server listening");
    println!("\n🚀 Server running on http://{addr}");
    println!("   Views: http://{addr}/views/members");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_list_query_from_params() {
        let query = list_query(
            &params(&[
                ("search", "abe"),
                ("sort", "lastName"),
                ("dir", "desc"),
                ("page", "3"),
                ("pageSize", "5"),
                ("role", "admin"),
            ]),
            20,
        );
        assert_eq!(query.search, "abe");
        assert_eq!(query.page, 3);
        assert_eq!(query.page_size, 5);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters["role"], "admin");
        assert_eq!(query.sort.unwrap().direction, SortDirection::Desc);
    }

    #[test]
    fn test_list_query_defaults() {
        let query = list_query(&params(&[("page", "x")]), 20);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 20);
        assert!(query.sort.is_none());
    }

    #[test]
    fn test_bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer(&headers).as_deref(), Some("abc.def"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer(&headers), None);
    }

    #[test]
    fn test_dues_params() {
        assert_eq!(dues_params(&params(&[("year", "2023"), ("prorate", "true")])), (2023, true));
        let (_, prorate) = dues_params(&params(&[]));
        assert!(!prorate);
    }

    #[test]
    fn test_api_error_status() {
        let err: ViewError = ApiError::NotFound("Member not found".to_string()).into();
        let ViewError(status, message) = err;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "Member not found");
    }
}
