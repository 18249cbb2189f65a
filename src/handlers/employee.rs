// src/handlers/employee.rs

use crate::{
    errors::{AppError, AppResult},
    models::{CreateEmployeeRequest, Employee},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

/// Register an employee in the directory used by the ingestion matcher
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 409, description = "Employee id already exists"),
    ),
    tag = "Employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    Json(body): Json<CreateEmployeeRequest>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    if body.employee_id.trim().is_empty() {
        return Err(AppError::Validation("employee_id is required".to_string()));
    }

    let existing: Option<String> =
        sqlx::query_scalar("SELECT employee_id FROM employees WHERE employee_id = ?")
            .bind(&body.employee_id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Employee '{}' already exists",
            body.employee_id
        )));
    }

    sqlx::query(
        "INSERT INTO employees
         (employee_id, name, position, branch_code, zone, rate_type, base_salary, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, 'active', ?)",
    )
    .bind(&body.employee_id)
    .bind(&body.name)
    .bind(&body.position)
    .bind(&body.branch_code)
    .bind(&body.zone)
    .bind(&body.rate_type)
    .bind(body.base_salary)
    .bind(Utc::now())
    .execute(&state.db)
    .await?;

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE employee_id = ?")
        .bind(&body.employee_id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

/// List all employees in the directory
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    responses((status = 200, description = "List of employees", body = Vec<Employee>)),
    tag = "Employees"
)]
pub async fn list_employees(State(state): State<AppState>) -> AppResult<Json<Vec<Employee>>> {
    let employees = sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY employee_id")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(employees))
}

/// Get a single employee
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee detail", body = Employee),
        (status = 404, description = "Employee not found"),
    ),
    tag = "Employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> AppResult<Json<Employee>> {
    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE employee_id = ?")
        .bind(&employee_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {employee_id} not found")))?;
    Ok(Json(employee))
}
