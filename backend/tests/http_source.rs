//! HTTP report source against a local backend.

use anyhow::Result;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use reclaim_backend::{BackendError, HttpReportSource, ReportSource};
use reclaim_types::{ReportId, Wei};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn spawn_backend(app: Router) -> Result<String> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn two_reports() -> Json<Value> {
    Json(json!([
        {"id": 1, "description": "Relapse risk", "location": "Accra", "verified": false, "reward": 0},
        {"id": 2, "description": "Needs transport", "location": "Kumasi",
         "evidenceLink": "https://img.example/2.png", "verified": true, "reward": 0.5,
         "timestamp": "2024-11-02T08:30:00Z"}
    ]))
}

#[tokio::test]
async fn lists_reports_in_backend_order() -> Result<()> {
    let url = spawn_backend(Router::new().route("/api/reports", get(two_reports))).await?;
    let reports = HttpReportSource::new(url)?.list_reports().await?;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].id, ReportId::new(1));
    assert!(!reports[0].verified);
    assert_eq!(reports[1].id, ReportId::new(2));
    assert!(reports[1].verified);
    assert_eq!(reports[1].reward, Wei::from_ether_str("0.5")?);
    Ok(())
}

#[tokio::test]
async fn server_error_is_request_failed() -> Result<()> {
    let app = Router::new().route(
        "/api/reports",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let url = spawn_backend(app).await?;
    let err = HttpReportSource::new(url)?.list_reports().await.unwrap_err();
    assert!(matches!(err, BackendError::RequestFailed(_)));
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_invalid_response() -> Result<()> {
    let app = Router::new().route(
        "/api/reports",
        get(|| async { Json(json!({"reports": "not an array"})) }),
    );
    let url = spawn_backend(app).await?;
    let err = HttpReportSource::new(url)?.list_reports().await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)));
    Ok(())
}

#[tokio::test]
async fn unreachable_backend() {
    let err = HttpReportSource::new("http://127.0.0.1:9")
        .unwrap()
        .list_reports()
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Unreachable(_) | BackendError::RequestFailed(_)));
}
