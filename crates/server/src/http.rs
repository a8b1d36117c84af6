//! HTTP Endpoints
//!
//! REST API for the support agent. Input validation happens here:
//! malformed requests are rejected with a structured error before they
//! reach the classifier or the search engine.

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use support_agent_core::{
    HistoryTurn, QueryRequest, ResourceCategory, UrgencyLevel, MAX_HISTORY_TURNS,
    MAX_MESSAGE_CHARS, MAX_RESULT_LIMIT,
};

use crate::assembler::QueryResponse;
use crate::metrics::{metrics_handler, record_cache_hit, record_request};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    drop(config);

    Router::new()
        .route("/api/v1/query", post(query))
        .route("/api/v1/emergency", post(emergency))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Wire shape of one history turn
#[derive(Debug, Deserialize)]
pub struct HistoryTurnPayload {
    pub utterance: String,
    pub intent: String,
}

/// Wire shape of the inbound query
#[derive(Debug, Deserialize)]
pub struct QueryPayload {
    pub message: Option<String>,
    pub category: Option<String>,
    pub urgency: Option<String>,
    pub language: Option<String>,
    pub history: Option<Vec<HistoryTurnPayload>>,
    pub limit: Option<u64>,
}

/// Validate the wire payload into a typed request
fn validate(payload: QueryPayload) -> Result<QueryRequest, ServerError> {
    let message = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ServerError::InvalidRequest {
            field: "message",
            message: "message is required and must be non-empty".to_string(),
        })?
        .to_string();

    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ServerError::InvalidRequest {
            field: "message",
            message: format!("message exceeds {} characters", MAX_MESSAGE_CHARS),
        });
    }

    let category = match payload.category.as_deref().filter(|c| !c.is_empty()) {
        Some(raw) => {
            Some(
                ResourceCategory::parse(raw).ok_or_else(|| ServerError::InvalidRequest {
                    field: "category",
                    message: format!("unknown category: {}", raw),
                })?,
            )
        }
        None => None,
    };

    let urgency = match payload.urgency.as_deref().filter(|u| !u.is_empty()) {
        Some(raw) => Some(UrgencyLevel::parse(raw).ok_or_else(|| {
            ServerError::InvalidRequest {
                field: "urgency",
                message: format!("unknown urgency: {}", raw),
            }
        })?),
        None => None,
    };

    let history = payload.history.unwrap_or_default();
    if history.len() > MAX_HISTORY_TURNS {
        return Err(ServerError::InvalidRequest {
            field: "history",
            message: format!("history exceeds {} turns", MAX_HISTORY_TURNS),
        });
    }

    let limit = match payload.limit {
        Some(raw) => {
            if raw < 1 || raw as usize > MAX_RESULT_LIMIT {
                return Err(ServerError::InvalidRequest {
                    field: "limit",
                    message: format!("limit must be between 1 and {}", MAX_RESULT_LIMIT),
                });
            }
            raw as usize
        }
        None => support_agent_core::DEFAULT_RESULT_LIMIT,
    };

    Ok(QueryRequest {
        message,
        category,
        urgency,
        language: payload.language.filter(|l| !l.trim().is_empty()),
        history: history
            .into_iter()
            .map(|turn| HistoryTurn {
                utterance: turn.utterance,
                intent: turn.intent,
            })
            .collect(),
        limit,
    })
}

/// Main query endpoint
async fn query(
    State(state): State<AppState>,
    Json(payload): Json<QueryPayload>,
) -> Result<Json<QueryResponse>, ServerError> {
    let request = validate(payload)?;

    let classification = state.classifier.classify(&request.message);
    let stage = state.analyzer.stage(&request.history);

    // Critical urgency short-circuits everything: no cache, no index, no
    // embedding call.
    if classification.urgency == UrgencyLevel::Critical {
        let results = state.emergency.handle(&request.message);
        record_request("emergency");
        return Ok(Json(state.assembler.assemble_emergency(
            &classification,
            &results,
            stage,
        )));
    }

    let outcome = state.engine.search(&request).await;
    record_request(outcome.method.as_str());
    record_cache_hit(outcome.cache_hit);

    let surfaced: Vec<ResourceCategory> =
        outcome.results.iter().map(|result| result.category).collect();
    let hidden_needs = state
        .analyzer
        .analyze(&request.history, classification.intent, &surfaced);

    Ok(Json(
        state
            .assembler
            .assemble(&classification, &outcome, &hidden_needs, stage),
    ))
}

/// Direct emergency endpoint for critical situations
async fn emergency(State(state): State<AppState>) -> Json<QueryResponse> {
    let message = "emergency help needed";
    let classification = state.classifier.classify(message);
    let results = state.emergency.handle(message);
    record_request("emergency");

    Json(state.assembler.assemble_emergency(
        &classification,
        &results,
        support_agent_search::ConversationStage::Greeting,
    ))
}

/// Liveness probe with component snapshot
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let cache_stats = state.engine.cache_stats();
    let snapshot = state.catalog.current();

    Json(serde_json::json!({
        "status": "healthy",
        "catalog_entries": snapshot.len(),
        "cache": {
            "size": cache_stats.size,
            "capacity": cache_stats.capacity,
            "hits": cache_stats.hits,
            "misses": cache_stats.misses,
            "hit_rate": cache_stats.hit_rate(),
        },
    }))
}

/// Readiness probe: ready once the catalog is loaded
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.catalog.current().is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "catalog not loaded")
    } else {
        (StatusCode::OK, "ready")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(message: &str) -> QueryPayload {
        QueryPayload {
            message: Some(message.to_string()),
            category: None,
            urgency: None,
            language: None,
            history: None,
            limit: None,
        }
    }

    #[test]
    fn test_valid_payload() {
        let request = validate(payload("I need help")).unwrap();
        assert_eq!(request.message, "I need help");
        assert_eq!(request.limit, support_agent_core::DEFAULT_RESULT_LIMIT);
    }

    #[test]
    fn test_empty_message_rejected() {
        assert!(validate(payload("   ")).is_err());
        let mut missing = payload("x");
        missing.message = None;
        assert!(validate(missing).is_err());
    }

    #[test]
    fn test_oversized_message_rejected() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate(payload(&long)).is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut p = payload("help");
        p.category = Some("gardening".to_string());
        let err = validate(p).unwrap_err();
        assert!(matches!(
            err,
            ServerError::InvalidRequest { field: "category", .. }
        ));
    }

    #[test]
    fn test_known_category_accepted() {
        let mut p = payload("help");
        p.category = Some("legal".to_string());
        let request = validate(p).unwrap();
        assert_eq!(request.category, Some(ResourceCategory::Legal));
    }

    #[test]
    fn test_limit_bounds() {
        let mut p = payload("help");
        p.limit = Some(0);
        assert!(validate(p).is_err());

        let mut p = payload("help");
        p.limit = Some(11);
        assert!(validate(p).is_err());

        let mut p = payload("help");
        p.limit = Some(10);
        assert_eq!(validate(p).unwrap().limit, 10);
    }

    #[test]
    fn test_history_bound() {
        let mut p = payload("help");
        p.history = Some(
            (0..11)
                .map(|i| HistoryTurnPayload {
                    utterance: format!("turn {}", i),
                    intent: "housing".to_string(),
                })
                .collect(),
        );
        assert!(validate(p).is_err());
    }
}
