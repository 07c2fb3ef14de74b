// Development Backend - in-memory REST API with Axum
//
// Implements the bill, income and system endpoints the client calls, plus
// /env/environment.json pointing back at itself. State lives in memory and
// is lost on restart.

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;

use crate::config::ApiConfig;
use crate::entities::{Bill, Income, IncomeFrequency, Month, NewBill, NewIncome, User};

/// Months of paid-status entries generated for a new bill
const SCHEDULE_MONTHS: u32 = 12;

// ============================================================================
// STATE
// ============================================================================

struct Db {
    bills: Vec<Bill>,
    incomes: Vec<Income>,
    user: User,
}

/// Shared backend state
#[derive(Clone)]
pub struct Backend {
    db: Arc<Mutex<Db>>,
    token: Option<Arc<str>>,
    public_base: Option<String>,
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend {
    /// Empty backend with a `demo` user and no authentication
    pub fn new() -> Self {
        let mut user = User::new("demo-user", "demo");
        user.display_name = Some("Demo User".to_string());
        Backend {
            db: Arc::new(Mutex::new(Db {
                bills: Vec::new(),
                incomes: Vec::new(),
                user,
            })),
            token: None,
            public_base: None,
        }
    }

    /// Backend pre-filled with a few bills and income sources starting this month
    pub fn demo() -> Self {
        let backend = Self::new();
        let today = Utc::now().date_naive();
        let start = today.with_day(1).unwrap_or(today);

        {
            let mut db = backend.lock();
            for (name, amount, due_day, category) in [
                ("Rent", 1450.0, 1, "Housing"),
                ("Electricity", 95.0, 18, "Utilities"),
                ("Internet", 60.0, 22, "Utilities"),
                ("Car insurance", 120.0, 28, "Transport"),
            ] {
                let mut bill = NewBill::new(name, amount, due_day, start);
                bill.category = Some(category.to_string());
                db.bills.push(new_stored_bill(bill));
            }
            db.incomes.push(
                NewIncome::new("Salary", 2100.0, IncomeFrequency::Fortnightly, start)
                    .into_income(new_id()),
            );
            db.incomes.push(
                NewIncome::new("Freelance", 400.0, IncomeFrequency::Monthly, start)
                    .into_income(new_id()),
            );
        }
        backend
    }

    /// Require `Authorization: Bearer <token>` on API routes
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Arc::from(token.into()));
        self
    }

    /// Base path advertised in /env/environment.json (defaults to the Host header)
    pub fn with_public_base(mut self, base: impl Into<String>) -> Self {
        self.public_base = Some(base.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, Db> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn new_stored_bill(bill: NewBill) -> Bill {
    let months = Month::schedule(bill.start_date, bill.due_day, SCHEDULE_MONTHS);
    bill.into_bill(new_id(), months)
}

// ============================================================================
// ERRORS
// ============================================================================

/// Error response with a JSON body
struct Failure(StatusCode, String);

impl Failure {
    fn not_found(what: &str, id: &str) -> Self {
        Failure(StatusCode::NOT_FOUND, format!("{} not found: {}", what, id))
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Failure(StatusCode::BAD_REQUEST, message.into())
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

type Reply<T> = Result<Json<T>, Failure>;

// ============================================================================
// QUERY TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct RangeQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl RangeQuery {
    /// Does [first, last] overlap the requested window?
    fn overlaps(&self, first: NaiveDate, last: Option<NaiveDate>) -> bool {
        let starts_in_time = self.end.map_or(true, |end| first <= end);
        let still_running = match (self.start, last) {
            (Some(start), Some(last)) => last >= start,
            _ => true,
        };
        starts_in_time && still_running
    }
}

#[derive(Debug, Deserialize)]
struct PaidQuery {
    paid: bool,
}

fn validate_bill(name: &str, amount: f64, due_day: u32) -> Result<(), Failure> {
    if name.trim().is_empty() {
        return Err(Failure::bad_request("bill name must not be empty"));
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(Failure::bad_request("bill amount must be a non-negative number"));
    }
    if !(1..=31).contains(&due_day) {
        return Err(Failure::bad_request("due day must be between 1 and 31"));
    }
    Ok(())
}

fn validate_income(name: &str, amount: f64) -> Result<(), Failure> {
    if name.trim().is_empty() {
        return Err(Failure::bad_request("income name must not be empty"));
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(Failure::bad_request("income amount must be a non-negative number"));
    }
    Ok(())
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /env/environment.json
async fn environment(State(backend): State<Backend>, headers: HeaderMap) -> Json<ApiConfig> {
    let base = backend.public_base.clone().unwrap_or_else(|| {
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost:7080");
        format!("http://{}", host)
    });
    Json(ApiConfig::with_base_path(base))
}

/// GET /bills
async fn list_bills(State(backend): State<Backend>, Query(range): Query<RangeQuery>) -> Json<Vec<Bill>> {
    let db = backend.lock();
    let bills = db
        .bills
        .iter()
        .filter(|b| range.overlaps(b.start_date, b.end_date))
        .cloned()
        .collect();
    Json(bills)
}

/// POST /bills
async fn create_bill(
    State(backend): State<Backend>,
    Json(payload): Json<NewBill>,
) -> Result<(StatusCode, Json<Bill>), Failure> {
    validate_bill(&payload.name, payload.amount, payload.due_day)?;
    let bill = new_stored_bill(payload);
    tracing::info!(id = bill.id(), name = %bill.name, "bill created");
    backend.lock().bills.push(bill.clone());
    Ok((StatusCode::CREATED, Json(bill)))
}

/// GET /bills/:id
async fn get_bill(State(backend): State<Backend>, Path(id): Path<String>) -> Reply<Bill> {
    backend
        .lock()
        .bills
        .iter()
        .find(|b| b.id() == Some(id.as_str()))
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found("bill", &id))
}

/// PUT /bills/:id
async fn update_bill(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(payload): Json<Bill>,
) -> Reply<Bill> {
    validate_bill(&payload.name, payload.amount, payload.due_day)?;
    let mut db = backend.lock();
    let bill = db
        .bills
        .iter_mut()
        .find(|b| b.id() == Some(id.as_str()))
        .ok_or_else(|| Failure::not_found("bill", &id))?;
    bill.merge(payload);
    tracing::info!(id = %id, "bill updated");
    Ok(Json(bill.clone()))
}

/// PUT /bills/:id/paid/:year/:month?paid=bool
async fn update_paid_status(
    State(backend): State<Backend>,
    Path((id, year, month)): Path<(String, i32, u32)>,
    Query(query): Query<PaidQuery>,
) -> Reply<Month> {
    let mut db = backend.lock();
    let bill = db
        .bills
        .iter_mut()
        .find(|b| b.id() == Some(id.as_str()))
        .ok_or_else(|| Failure::not_found("bill", &id))?;
    let entry = bill
        .months
        .iter_mut()
        .flatten()
        .find(|m| m.year == year && m.month == month)
        .ok_or_else(|| Failure::not_found("month entry", &format!("{}/{}-{:02}", id, year, month)))?;
    entry.paid = query.paid;
    tracing::info!(id = %id, year, month, paid = query.paid, "paid status changed");
    Ok(Json(*entry))
}

/// GET /income
async fn list_income(State(backend): State<Backend>, Query(range): Query<RangeQuery>) -> Json<Vec<Income>> {
    let db = backend.lock();
    let incomes = db
        .incomes
        .iter()
        .filter(|i| {
            let last = match i.frequency {
                IncomeFrequency::Once => Some(i.start_date),
                _ => i.end_date,
            };
            range.overlaps(i.start_date, last)
        })
        .cloned()
        .collect();
    Json(incomes)
}

/// POST /income
async fn create_income(
    State(backend): State<Backend>,
    Json(payload): Json<NewIncome>,
) -> Result<(StatusCode, Json<Income>), Failure> {
    validate_income(&payload.name, payload.amount)?;
    let income = payload.into_income(new_id());
    tracing::info!(id = income.id(), name = %income.name, "income created");
    backend.lock().incomes.push(income.clone());
    Ok((StatusCode::CREATED, Json(income)))
}

/// GET /income/:id
async fn get_income(State(backend): State<Backend>, Path(id): Path<String>) -> Reply<Income> {
    backend
        .lock()
        .incomes
        .iter()
        .find(|i| i.id() == Some(id.as_str()))
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found("income", &id))
}

/// PUT /income/:id
async fn update_income(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(payload): Json<Income>,
) -> Reply<Income> {
    validate_income(&payload.name, payload.amount)?;
    let mut db = backend.lock();
    let income = db
        .incomes
        .iter_mut()
        .find(|i| i.id() == Some(id.as_str()))
        .ok_or_else(|| Failure::not_found("income", &id))?;
    income.merge(payload);
    tracing::info!(id = %id, "income updated");
    Ok(Json(income.clone()))
}

/// GET /system/user
async fn current_user(State(backend): State<Backend>) -> Json<User> {
    Json(backend.lock().user.clone())
}

async fn require_token(State(backend): State<Backend>, request: Request, next: Next) -> Response {
    if let Some(token) = &backend.token {
        let expected = format!("Bearer {}", token);
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        if presented != Some(expected.as_str()) {
            tracing::warn!(path = %request.uri().path(), "rejected unauthenticated request");
            return Failure(StatusCode::UNAUTHORIZED, "authentication required".to_string())
                .into_response();
        }
    }
    next.run(request).await
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn router(backend: Backend) -> Router {
    let api_routes = Router::new()
        .route("/bills", get(list_bills).post(create_bill))
        .route("/bills/:id", get(get_bill).put(update_bill))
        .route("/bills/:id/paid/:year/:month", axum::routing::put(update_paid_status))
        .route("/income", get(list_income).post(create_income))
        .route("/income/:id", get(get_income).put(update_income))
        .route("/system/user", get(current_user))
        .route_layer(middleware::from_fn_with_state(backend.clone(), require_token));

    Router::new()
        .route("/env/environment.json", get(environment))
        .merge(api_routes)
        .layer(CorsLayer::permissive())
        .with_state(backend)
}

// ============================================================================
// TESTS
// ============================================================================
