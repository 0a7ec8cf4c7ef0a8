//! In-process servers: a fake chat-completions backend and the committee gateway.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use committee::cache::ResultCacheHandle;
use committee::gateway::{HandlerState, create_router_with_state};
use committee::rubric::{RubricSource, StaticRubricSource};
use committee::scorer::{HttpScorer, ModelPrice, PricingTable, ScorerRegistry};
use committee::telemetry::PerformanceRecorder;
use committee::ScoringEngine;

/// What the fake backend answers for one model.
#[derive(Debug, Clone)]
pub enum BackendReply {
    Judgment(Value),
    Content(String),
    Status(u16),
}

#[derive(Clone)]
struct FakeBackendState {
    replies: Arc<HashMap<String, BackendReply>>,
    calls: Arc<AtomicUsize>,
}

pub struct FakeBackend {
    pub base_url: String,
    calls: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn completions(
    State(state): State<FakeBackendState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let model = body["model"].as_str().unwrap_or_default();

    let content = match state.replies.get(model) {
        Some(BackendReply::Judgment(judgment)) => judgment.to_string(),
        Some(BackendReply::Content(content)) => content.clone(),
        Some(BackendReply::Status(status)) => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
            return (
                status,
                Json(json!({"error": {"message": "backend overloaded"}})),
            );
        }
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": {"message": format!("unknown model {}", model)}})),
            );
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "id": "chatcmpl-fake",
            "object": "chat.completion",
            "created": 1_700_000_000u32,
            "model": model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 1000, "completion_tokens": 500, "total_tokens": 1500}
        })),
    )
}

pub async fn spawn_fake_backend(replies: HashMap<String, BackendReply>) -> FakeBackend {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = FakeBackendState {
        replies: Arc::new(replies),
        calls: Arc::clone(&calls),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(state);

    let addr = serve(app).await;
    FakeBackend {
        base_url: format!("http://{}/v1", addr),
        calls,
    }
}

/// Engine wired to one HTTP backend named `provider`.
pub fn http_engine(provider: &str, base_url: &str) -> ScoringEngine {
    let pricing = PricingTable::new().with_price(
        "gpt-4o",
        ModelPrice {
            input_per_1k: 0.0025,
            output_per_1k: 0.01,
        },
    );
    let scorer = HttpScorer::new(provider, base_url)
        .api_key(Some("sk-test".into()))
        .pricing(Arc::new(pricing));
    let registry = ScorerRegistry::new().with_scorer(provider, Arc::new(scorer));
    ScoringEngine::new(
        registry,
        ResultCacheHandle::new(),
        Arc::new(PerformanceRecorder::new()),
    )
}

/// Starts the committee gateway and returns its base URL.
pub async fn spawn_gateway(engine: ScoringEngine, rubrics: StaticRubricSource) -> String {
    let rubrics: Arc<dyn RubricSource> = Arc::new(rubrics);
    let app = create_router_with_state(HandlerState::new(Arc::new(engine), rubrics));
    let addr = serve(app).await;
    format!("http://{}", addr)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}
