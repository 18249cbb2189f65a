use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde_json::json;

/// Root handler — returns an HTML landing page with project info and links
pub async fn root_handler() -> impl IntoResponse {
    Html(r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
  <title>Courier Payroll API</title>
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body { font-family: 'Segoe UI', system-ui, sans-serif; background: #0f172a; color: #e2e8f0; min-height: 100vh; padding: 40px 20px; }
    .container { max-width: 860px; margin: 0 auto; }
    header { text-align: center; margin-bottom: 48px; }
    header h1 { font-size: 2.8rem; font-weight: 800; background: linear-gradient(135deg, #f59e0b, #ef4444); -webkit-background-clip: text; -webkit-text-fill-color: transparent; margin-bottom: 8px; }
    header p { color: #94a3b8; font-size: 1.1rem; }
    .badge { display: inline-block; background: #1e293b; border: 1px solid #334155; color: #fbbf24; padding: 4px 12px; border-radius: 20px; font-size: 0.8rem; margin-top: 12px; }
    .routes { background: #1e293b; border: 1px solid #334155; border-radius: 12px; padding: 24px; }
    .routes h2 { font-size: 1.2rem; font-weight: 700; color: #f1f5f9; margin-bottom: 16px; }
    .route-group { margin-bottom: 20px; }
    .route-group h4 { font-size: 0.8rem; font-weight: 600; text-transform: uppercase; letter-spacing: 0.1em; color: #64748b; margin-bottom: 8px; }
    .route-item { display: flex; align-items: flex-start; gap: 12px; padding: 8px 0; border-bottom: 1px solid #0f172a; }
    .route-item:last-child { border-bottom: none; }
    .method { font-size: 0.7rem; font-weight: 700; padding: 2px 8px; border-radius: 4px; min-width: 52px; text-align: center; font-family: monospace; }
    .get { background: #064e3b; color: #34d399; }
    .post { background: #1e3a5f; color: #60a5fa; }
    .delete { background: #4c0519; color: #fb7185; }
    .route-path { font-family: monospace; font-size: 0.85rem; color: #e2e8f0; flex: 1; }
    .route-desc { font-size: 0.8rem; color: #64748b; }
    footer { text-align: center; margin-top: 40px; color: #475569; font-size: 0.85rem; }
  </style>
</head>
<body>
<div class="container">
  <header>
    <h1>📦 Courier Payroll API</h1>
    <p>Piece-rate payroll reconciliation for delivery-scan uploads</p>
    <span class="badge">v0.1.0 · REST API · JSON · <a href="/docs" style="color:#fbbf24">Swagger UI</a></span>
  </header>

  <div class="routes">
    <h2>🗺️ All API Routes</h2>

    <div class="route-group">
      <h4>Salary</h4>
      <div class="route-item"><span class="method post">POST</span><span class="route-path">/api/v1/salary/upload</span><span class="route-desc">Ingest a scan-export CSV batch</span></div>
      <div class="route-item"><span class="method get">GET</span><span class="route-path">/api/v1/salary/monthly</span><span class="route-desc">Per-employee monthly summary</span></div>
      <div class="route-item"><span class="method get">GET</span><span class="route-path">/api/v1/salary/employees/:id/tiers</span><span class="route-desc">Weight-tier drill-down</span></div>
      <div class="route-item"><span class="method get">GET</span><span class="route-path">/api/v1/salary/unmatched</span><span class="route-desc">Unmatched-record ledger</span></div>
    </div>

    <div class="route-group">
      <h4>Batches &amp; Confirmation</h4>
      <div class="route-item"><span class="method get">GET</span><span class="route-path">/api/v1/salary/uploads</span><span class="route-desc">List upload batches</span></div>
      <div class="route-item"><span class="method delete">DELETE</span><span class="route-path">/api/v1/salary/uploads/:id</span><span class="route-desc">Delete a batch and its derived rows</span></div>
      <div class="route-item"><span class="method post">POST</span><span class="route-path">/api/v1/salary/confirm-payment</span><span class="route-desc">Confirm (freeze) a work month</span></div>
      <div class="route-item"><span class="method get">GET</span><span class="route-path">/api/v1/salary/payment-status/:month</span><span class="route-desc">Confirmation state</span></div>
    </div>

    <div class="route-group">
      <h4>Rates &amp; Employees</h4>
      <div class="route-item"><span class="method post">POST</span><span class="route-path">/api/v1/rates</span><span class="route-desc">Create or update a rate card</span></div>
      <div class="route-item"><span class="method get">GET</span><span class="route-path">/api/v1/rates</span><span class="route-desc">List rate cards by zone/branch</span></div>
      <div class="route-item"><span class="method post">POST</span><span class="route-path">/api/v1/employees</span><span class="route-desc">Register an employee</span></div>
      <div class="route-item"><span class="method get">GET</span><span class="route-path">/api/v1/employees</span><span class="route-desc">List employees</span></div>
    </div>
  </div>

  <footer>
    <p>Built with 🦀 Rust · Axum · SQLx</p>
  </footer>
</div>
</body>
</html>"#)
}

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected",
                "service": "courier-payroll",
                "version": "0.1.0"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "database": "disconnected",
                "error": e.to_string()
            })),
        ),
    }
}
