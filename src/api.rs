//! REST API server for the equity aggregator
//!
//! Exposes the analysis pipeline over HTTP

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::analyzer::StockAnalyzer;
use crate::error::AnalysisError;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyzeRequest {
    pub symbol: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub analyzer: Arc<StockAnalyzer>,
}

fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::InvalidSymbol(_) => StatusCode::BAD_REQUEST,
        AnalysisError::AllSourcesFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Analysis Endpoints
/// =============================

async fn analyze(state: &ApiState, raw_symbol: &str) -> (StatusCode, Json<ApiResponse>) {
    info!(symbol = %raw_symbol, "Received analysis request");

    match state.analyzer.analyze(raw_symbol).await {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::success(report))),
        Err(e) => {
            let status = status_for(&e);
            warn!(symbol = %raw_symbol, status = %status, error = %e, "Analysis failed");
            (status, Json(ApiResponse::error(e.to_string())))
        }
    }
}

async fn analyze_path(
    State(state): State<ApiState>,
    Path(symbol): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    analyze(&state, &symbol).await
}

async fn analyze_body(
    State(state): State<ApiState>,
    Json(req): Json<AnalyzeRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    analyze(&state, &req.symbol).await
}

/// =============================
/// Router
/// =============================

pub fn create_router(analyzer: Arc<StockAnalyzer>) -> Router {
    let state = ApiState { analyzer };

    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", axum::routing::post(analyze_body))
        .route("/api/analyze/:symbol", get(analyze_path))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    analyzer: Arc<StockAnalyzer>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(analyzer);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::Extractor;
    use crate::models::SourceId;
    use crate::orchestrator::FetchOrchestrator;
    use crate::reconciliation::Reconciler;
    use crate::report::enrichment::DeterministicOnly;
    use crate::report::ReportRenderer;
    use crate::testing::{full_screener_record, full_yahoo_record, FixedExtractor};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn router(extractors: Vec<Arc<dyn Extractor>>) -> Router {
        let analyzer = StockAnalyzer::new(
            FetchOrchestrator::new(extractors, Duration::from_secs(5)),
            Reconciler::default(),
            ReportRenderer::new(Arc::new(DeterministicOnly), Duration::from_secs(5)),
        );
        create_router(Arc::new(analyzer))
    }

    fn healthy_sources() -> Vec<Arc<dyn Extractor>> {
        vec![
            FixedExtractor::ok(SourceId::Yahoo, full_yahoo_record()),
            FixedExtractor::failing(SourceId::Nse, "HTTP 401"),
            FixedExtractor::ok(SourceId::Screener, full_screener_record()),
        ]
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(vec![])
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_analyze_by_path() {
        let response = router(healthy_sources())
            .oneshot(Request::get("/api/analyze/reliance").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["symbol"], "RELIANCE");
        assert_eq!(json["data"]["metrics"]["risk"], "Medium");
        assert_eq!(json["data"]["sources"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_by_body() {
        let request = Request::post("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"symbol": "RELIANCE.NS"}"#))
            .unwrap();

        let response = router(healthy_sources()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["symbol"], "RELIANCE");
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_bad_request() {
        let request = Request::post("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"symbol": "   "}"#))
            .unwrap();

        let response = router(healthy_sources()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn test_all_sources_failed_is_bad_gateway() {
        let extractors: Vec<Arc<dyn Extractor>> = vec![
            FixedExtractor::failing(SourceId::Yahoo, "HTTP 404"),
            FixedExtractor::failing(SourceId::Screener, "HTTP 404"),
        ];

        let response = router(extractors)
            .oneshot(Request::get("/api/analyze/NOSUCHCO").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("NOSUCHCO"));
    }
}
