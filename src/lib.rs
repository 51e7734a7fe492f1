//! Hygeia - an LLM-backed clinical decision support gateway
//!
//! This library formats patient-clinical payloads into prompts, sends each one
//! to a completion backend, and coerces the free-form JSON reply into a
//! validated, strongly-typed response. The reusable core is the extraction and
//! schema-validation pipeline in [`extract`] and [`schema`]; every endpoint is
//! that same pipeline parameterized by a feature schema from the [`registry`].

use axum::Router;
use axum::routing::post;
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use tower_http::cors::CorsLayer;
use tracing::{info, instrument};

pub mod agents;
pub mod client;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod prompt;
pub mod registry;
pub mod schema;

use client::{BackendOptions, ChatCompletionsBackend, CompletionClient};
use registry::Registry;

/// The main application state: the completion backend and the schema registry.
///
/// Both are read-only after construction, so clones are handed to every
/// request without coordination.
#[derive(Clone, Debug)]
pub struct AppState<C: CompletionClient> {
    pub completions: C,
    pub registry: Registry,
}

impl AppState<ChatCompletionsBackend> {
    /// Create state backed by the stock chat-completions client.
    pub fn new(options: BackendOptions) -> Self {
        Self {
            completions: ChatCompletionsBackend::new(options),
            registry: Registry::bootstrap(),
        }
    }
}

impl<C: CompletionClient> AppState<C> {
    /// Create state with a custom completion client (useful for testing).
    pub fn with_client(completions: C) -> Self {
        Self {
            completions,
            registry: Registry::bootstrap(),
        }
    }
}

/// Build the main router: one POST endpoint per clinical feature.
///
/// The browser frontends call this API directly, so CORS is wide open, as the
/// upstream deployment had it.
#[instrument(skip(state))]
pub fn build_router<C>(state: AppState<C>) -> Router
where
    C: CompletionClient + Clone + Send + Sync + 'static,
{
    info!("Building router");
    Router::new()
        .route("/ai-diagnosis", post(handlers::diagnosis))
        .route("/ai-summarization", post(handlers::summarization))
        .route("/ai-icd10", post(handlers::icd10))
        .route("/ai-drug-interaction", post(handlers::drug_interaction))
        .route("/ai-guest-booking", post(handlers::guest_booking))
        .route("/ai-health-analysis", post(handlers::health_analysis))
        .route("/ai-vitals-anomaly", post(handlers::vitals_anomaly))
        .route("/ai-medication-adherence", post(handlers::adherence))
        .route("/ai-lab-interpretation", post(handlers::lab_interpretation))
        .route("/ai-readmission-risk", post(handlers::readmission))
        .route("/ai-prescription-support", post(handlers::prescription))
        .route("/ai-no-show-prediction", post(handlers::no_show))
        .route("/ai-imaging-analysis", post(handlers::imaging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
///
/// The prefix distinguishes this gateway's series when several services share
/// one scrape target; it must live for the program's whole lifetime, hence the
/// `Cow<'static, str>`.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .enable_response_body_size(true)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}

pub mod test_utils {
    //! Test doubles shared by the unit and integration tests.

    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use crate::client::{CompletionClient, CompletionReply};
    use crate::errors::CompletionError;

    /// A scripted completion backend: hands out canned replies in order and
    /// records every prompt it receives. Clones share the same script and
    /// recording.
    #[derive(Debug, Clone, Default)]
    pub struct MockCompletionClient {
        replies: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl MockCompletionClient {
        /// A mock that answers every request with the same canned reply is the
        /// common case; build one in a single call.
        pub fn replying(reply: &str) -> Self {
            let mock = Self::default();
            mock.push_reply(reply);
            mock
        }

        pub fn push_reply(&self, reply: &str) {
            self.replies
                .lock()
                .unwrap()
                .push_back(Ok(reply.to_string()));
        }

        pub fn push_failure(&self, error: CompletionError) {
            self.replies.lock().unwrap().push_back(Err(error));
        }

        /// Every prompt received so far, in order.
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for MockCompletionClient {
        async fn complete(&self, prompt: &str) -> Result<CompletionReply, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(content)) => Ok(CompletionReply { content }),
                Some(Err(error)) => Err(error),
                None => Err(CompletionError::MissingContent),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::test_utils::MockCompletionClient;

    fn server_with(mock: MockCompletionClient) -> TestServer {
        let router = build_router(AppState::with_client(mock));
        TestServer::new(router).unwrap()
    }

    #[tokio::test]
    async fn diagnosis_round_trip_with_fenced_reply() {
        let mock = MockCompletionClient::replying(
            "```json\n[{\"diagnosis\": \"Influenza\", \"icd10\": \"J11.1\", \"confidence\": 87}]\n```",
        );
        let server = server_with(mock.clone());

        let response = server
            .post("/ai-diagnosis")
            .json(&json!({"symptoms": ["fever", "dry cough", "myalgia"]}))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(
            body,
            json!([{"diagnosis": "Influenza", "icd10": "J11.1", "confidence": 87}])
        );

        // The prompt carried the symptoms and the schema-derived instructions.
        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("fever, dry cough, myalgia"));
        assert!(prompts[0].contains("Return ONLY valid JSON"));
        assert!(prompts[0].contains("- icd10: string"));
    }

    #[tokio::test]
    async fn icd10_bare_object_reply_becomes_a_one_element_list() {
        let mock = MockCompletionClient::replying(
            "```json\n{\"code\": \"E11.40\", \"desc\": \"Type 2 diabetes\", \"confidence\": 95}\n```",
        );
        let server = server_with(mock);

        let response = server
            .post("/ai-icd10")
            .json(&json!({"diagnosis": "type 2 diabetes with neuropathy"}))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(
            body,
            json!([{"code": "E11.40", "desc": "Type 2 diabetes", "confidence": 95}])
        );
    }

    #[tokio::test]
    async fn empty_interaction_list_is_a_success() {
        let server = server_with(MockCompletionClient::replying("[]"));

        let response = server
            .post("/ai-drug-interaction")
            .json(&json!({"drugs": ["Paracetamol"]}))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn malformed_reply_yields_500_with_bounded_detail() {
        let server = server_with(MockCompletionClient::replying("not json"));

        let response = server
            .post("/ai-diagnosis")
            .json(&json!({"symptoms": ["fever"]}))
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("response extraction failed"));
        assert!(detail.contains("not json"));
    }

    #[tokio::test]
    async fn undeclared_enum_value_yields_500_naming_the_field() {
        let reply = json!([{
            "severity": "extreme",
            "msg": "made up",
            "drugs": ["A", "B"]
        }]);
        let server = server_with(MockCompletionClient::replying(&reply.to_string()));

        let response = server
            .post("/ai-drug-interaction")
            .json(&json!({"drugs": ["A", "B"]}))
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("severity"));
        assert!(detail.contains("extreme"));
    }

    #[tokio::test]
    async fn guest_booking_returns_the_validated_object() {
        let reply = json!({
            "urgency_level": "High",
            "possible_conditions": ["Congestive Heart Failure", "Pulmonary Edema"],
            "recommended_department": "Cardiology",
            "summary": "Cardiac history with orthopnea suggests possible heart failure.",
            "confidence_score": 0.85,
            "reasoning_trace": "dropped silently"
        });
        let server = server_with(MockCompletionClient::replying(&reply.to_string()));

        let response = server
            .post("/ai-guest-booking")
            .json(&json!({
                "symptoms": ["shortness of breath"],
                "user_description": "worse when lying down",
                "age": 67,
                "gender": "female",
                "medical_history": ["CAD"]
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["urgency_level"], "High");
        assert_eq!(body["recommended_department"], "Cardiology");
        // Undeclared reply fields never reach the caller.
        assert!(body.get("reasoning_trace").is_none());
    }

    #[tokio::test]
    async fn completion_failure_is_a_uniform_500() {
        let mock = MockCompletionClient::default();
        mock.push_failure(crate::errors::CompletionError::Status { status: 502 });
        let server = server_with(mock);

        let response = server
            .post("/ai-summarization")
            .json(&json!({"notes": "pt c/o chest pain x2 days"}))
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert!(
            body["detail"]
                .as_str()
                .unwrap()
                .contains("completion request failed")
        );
    }

    #[tokio::test]
    async fn imaging_endpoint_is_mounted_but_disabled() {
        let mock = MockCompletionClient::replying("{}");
        let server = server_with(mock.clone());

        let response = server
            .post("/ai-imaging-analysis")
            .json(&json!({
                "imageType": "xray",
                "imageUrl": "https://pacs.example/img/123",
                "bodyPart": "chest",
                "clinicalIndication": "persistent cough",
                "patientAge": 54,
                "patientGender": "male"
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_IMPLEMENTED);
        // The completion backend is never consulted for the stub.
        assert!(mock.prompts().is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = server_with(MockCompletionClient::default());
        let response = server.post("/ai-telepathy").json(&json!({})).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    mod metrics {
        use super::*;
        use rstest::*;

        /// The prometheus recorder is a process-wide global, so all metrics
        /// assertions share one pair of servers.
        #[fixture]
        #[once]
        fn shared_metrics_servers() -> (TestServer, TestServer) {
            let (prometheus_layer, handle) = build_metrics_layer_and_handle("hygeia");

            let metrics_server = TestServer::new(build_metrics_router(handle)).unwrap();

            let app_state = AppState::with_client(MockCompletionClient::replying("[]"));
            let router = build_router(app_state).layer(prometheus_layer);
            let server = TestServer::new(router).unwrap();

            (server, metrics_server)
        }

        fn count_for(metrics_text: &str, needle: &str) -> i64 {
            metrics_text
                .lines()
                .find(|line| line.contains(needle))
                .and_then(|line| line.split_whitespace().last())
                .and_then(|value| value.parse::<i64>().ok())
                .unwrap_or(0)
        }

        #[rstest]
        #[tokio::test]
        async fn requests_are_counted_per_endpoint(
            shared_metrics_servers: &(TestServer, TestServer),
        ) {
            let (server, metrics_server) = shared_metrics_servers;
            let needle = "hygeia_http_requests_total{method=\"POST\",status=\"200\",endpoint=\"/ai-drug-interaction\"}";

            let before = count_for(&metrics_server.get("/metrics").await.text(), needle);

            let response = server
                .post("/ai-drug-interaction")
                .json(&json!({"drugs": ["Aspirin"]}))
                .await;
            assert_eq!(response.status_code(), StatusCode::OK);

            let after = count_for(&metrics_server.get("/metrics").await.text(), needle);
            assert_eq!(after, before + 1);
        }
    }
}
