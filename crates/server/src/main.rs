use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use shared::{
    domain::{Employee, EmployeeFields, EmployeeId},
    protocol::{ApiResponse, EMPLOYEES_ALLOW, EMPLOYEES_ROUTE, EMPLOYEE_ALLOW},
    validation::validate_fields,
};
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;

use config::load_settings;

#[derive(Clone, Default)]
struct AppState {
    employees: Arc<RwLock<HashMap<EmployeeId, Employee>>>,
}

type Failure = (StatusCode, Json<ApiResponse<()>>);

fn failure(status: StatusCode, message: impl Into<String>) -> Failure {
    (status, Json(ApiResponse::failure(Some(message.into()))))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings()?;
    let app = build_router(AppState::default());

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            EMPLOYEES_ROUTE,
            get(list_employees)
                .post(create_employee)
                .fallback(collection_method_not_allowed),
        )
        .route(
            "/employees/:id",
            put(replace_employee)
                .delete(delete_employee)
                .fallback(record_method_not_allowed),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_employees(State(state): State<AppState>) -> Json<ApiResponse<Vec<Employee>>> {
    let mut employees: Vec<Employee> = state.employees.read().await.values().cloned().collect();
    employees.sort_by(|left, right| right.created_at.cmp(&left.created_at));
    Json(ApiResponse::ok(employees))
}

async fn create_employee(
    State(state): State<AppState>,
    body: Result<Json<EmployeeFields>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Employee>>), Failure> {
    let fields = checked_fields(body)?;
    let id = EmployeeId::new(Uuid::new_v4().simple().to_string());
    let employee = Employee::from_fields(id.clone(), fields, Utc::now());

    state
        .employees
        .write()
        .await
        .insert(id.clone(), employee.clone());
    info!(%id, "employee created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(employee))))
}

async fn replace_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EmployeeFields>, JsonRejection>,
) -> Result<Json<ApiResponse<Employee>>, Failure> {
    let fields = checked_fields(body)?;
    let id = EmployeeId::new(id);

    let mut employees = state.employees.write().await;
    let Some(held) = employees.get_mut(&id) else {
        return Err(failure(StatusCode::NOT_FOUND, "Employee not found"));
    };
    // creation time is server-owned and survives edits
    *held = Employee::from_fields(id.clone(), fields, held.created_at);
    info!(%id, "employee updated");
    Ok(Json(ApiResponse::ok(held.clone())))
}

async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    let id = EmployeeId::new(id);
    match state.employees.write().await.remove(&id) {
        Some(_) => {
            info!(%id, "employee deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(failure(StatusCode::NOT_FOUND, "Employee not found")),
    }
}

fn checked_fields(
    body: Result<Json<EmployeeFields>, JsonRejection>,
) -> Result<EmployeeFields, Failure> {
    let Json(fields) = body.map_err(|rejection| {
        warn!(error = %rejection, "rejected employee body");
        failure(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;
    validate_fields(&fields).map_err(|errors| {
        warn!(error = %errors, "employee failed validation");
        failure(StatusCode::BAD_REQUEST, errors.to_string())
    })?;
    Ok(fields)
}

async fn collection_method_not_allowed() -> Response {
    method_not_allowed(EMPLOYEES_ALLOW)
}

async fn record_method_not_allowed() -> Response {
    method_not_allowed(EMPLOYEE_ALLOW)
}

fn method_not_allowed(allow: &'static str) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static(allow))],
        Json(ApiResponse::<()>::failure(None)),
    )
        .into_response()
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
