// Clinic Intake System - Web Server
// REST surface for the admin dashboard: raw blob in/out plus the prepared
// report, all computed by the one shared aggregation pipeline.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use clinic_intake::{prepare_report, report_to_csv, AdminStore, RawAdminData, ReportData};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<AdminStore>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

fn load_raw(state: &AppState) -> RawAdminData {
    let store = state.store.lock().unwrap();
    match store.load() {
        Ok((data, _source)) => data.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error loading admin data: {}", e);
            RawAdminData::default()
        }
    }
}

/// GET /api/admin/data - Raw admin blob
async fn get_admin_data(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::ok(load_raw(&state)))).into_response()
}

/// GET /api/admin/export - Raw admin blob (legacy endpoint name)
async fn get_admin_export(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::ok(load_raw(&state)))).into_response()
}

/// POST /api/admin/data - Replace the raw admin blob
async fn put_admin_data(
    State(state): State<AppState>,
    Json(data): Json<RawAdminData>,
) -> impl IntoResponse {
    let store = state.store.lock().unwrap();
    match store.save(&data) {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok("saved"))).into_response(),
        Err(e) => {
            eprintln!("Error saving admin data: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok("failed")),
            )
                .into_response()
        }
    }
}

/// GET /api/report - Prepared report
async fn get_report(State(state): State<AppState>) -> impl IntoResponse {
    let raw = load_raw(&state);
    let report: ReportData = prepare_report(Some(&raw));
    (StatusCode::OK, Json(ApiResponse::ok(report))).into_response()
}

/// GET /api/report/csv - Report as CSV download
async fn get_report_csv(State(state): State<AppState>) -> impl IntoResponse {
    let raw = load_raw(&state);
    let report = prepare_report(Some(&raw));

    match report_to_csv(&report) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"admin-report.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error exporting CSV: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Vec::new()).into_response()
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🏥 Clinic Intake System - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::var("CLINIC_DB").unwrap_or_else(|_| "clinic-intake.db".to_string());
    let store = AdminStore::open(&db_path).expect("Failed to open store");
    println!("✓ Store opened: {}", db_path);

    // Create shared state
    let state = AppState {
        store: Arc::new(Mutex::new(store)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/admin/data", get(get_admin_data).post(put_admin_data))
        .route("/admin/export", get(get_admin_export))
        .route("/report", get(get_report))
        .route("/report/csv", get(get_report_csv))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   Report: http://localhost:3000/api/report");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
