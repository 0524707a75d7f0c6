//! HTTP API server for integration with other systems.
//!
//! Provides one REST endpoint per content operation. POST endpoints take their
//! arguments either as a JSON body or as query parameters
//! (`POST /quiz?title=Loops&duration=15`); a non-empty query string wins.
//! Every successful response carries an `x-outcome` header; partial results
//! also carry `x-dropped-items`.

use crate::cli::Output;
use crate::config::Settings;
use crate::dispatch::{
    Dispatcher, OperationResult, FIND_VIDEO, GENERATE_COURSE, GENERATE_HOMEWORK, GENERATE_QUIZ,
    GENERATE_SOLUTION, GET_TRANSCRIPT,
};
use crate::error::{CourseGenError, ErrorKind};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

const OUTCOME_HEADER: &str = "x-outcome";
const DROPPED_HEADER: &str = "x-dropped-items";

/// Shared application state.
struct AppState {
    dispatcher: Arc<Dispatcher>,
    request_timeout: Duration,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let request_timeout = Duration::from_secs(settings.server.request_timeout_secs);

    let dispatcher = Arc::new(Dispatcher::new(settings)?);
    let app = router(dispatcher, request_timeout);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Course Generator API");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Course", "POST /course");
    Output::kv("Video", "GET  /video?topic=...");
    Output::kv("Quiz", "POST /quiz");
    Output::kv("Transcript", "POST /transcript");
    Output::kv("Homework", "POST /homework");
    Output::kv("Solution", "POST /solution");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router.
fn router(dispatcher: Arc<Dispatcher>, request_timeout: Duration) -> Router {
    let state = Arc::new(AppState {
        dispatcher,
        request_timeout,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/course", post(course))
        .route("/video", get(video))
        .route("/quiz", post(quiz))
        .route("/transcript", post(transcript))
        .route("/homework", post(homework))
        .route("/solution", post(solution))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct VideoQuery {
    #[serde(default)]
    topic: String,
}

#[derive(Deserialize, Serialize)]
struct CourseParams {
    title: String,
    sessions: u32,
    topics: u32,
}

#[derive(Deserialize, Serialize)]
struct QuizParams {
    title: String,
    duration: u32,
}

#[derive(Deserialize, Serialize)]
struct TranscriptParams {
    url: String,
}

#[derive(Deserialize, Serialize)]
struct HomeworkParams {
    transcript: String,
}

#[derive(Deserialize, Serialize)]
struct SolutionParams {
    problem: String,
    skeleton: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: ErrorKind,
}

/// An operation failure rendered as an HTTP response.
struct ApiError(CourseGenError);

impl From<CourseGenError> for ApiError {
    fn from(e: CourseGenError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CourseGenError::InvalidInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(CourseGenError::InvalidInput(rejection.body_text()))
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Format | ErrorKind::Validation | ErrorKind::Service => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Config | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        (
            status_for(kind),
            Json(ErrorResponse {
                error: self.0.to_string(),
                kind,
            }),
        )
            .into_response()
    }
}

fn outcome_headers(result: &OperationResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(OUTCOME_HEADER, HeaderValue::from_static(result.status.as_str()));
    if result.dropped > 0 {
        headers.insert(DROPPED_HEADER, HeaderValue::from(result.dropped));
    }
    headers
}

/// Dispatch one operation under the request timeout.
async fn run(state: &AppState, operation: &str, arguments: Value) -> Result<OperationResult, ApiError> {
    let call = state.dispatcher.call(operation, arguments);
    let result = match tokio::time::timeout(state.request_timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CourseGenError::Timeout(state.request_timeout.as_secs())),
    };

    result.map_err(|e| {
        error!("{} failed: {}", operation, e);
        ApiError(e)
    })
}

/// Arguments from the query string when there is one, else from the JSON body.
fn arguments<T>(uri: &Uri, body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError>
where
    T: DeserializeOwned + Serialize,
{
    if uri.query().is_some_and(|q| !q.is_empty()) {
        let Query(params) = Query::<T>::try_from_uri(uri)?;
        return Ok(serde_json::to_value(params).map_err(CourseGenError::from)?);
    }
    let Json(arguments) = body?;
    Ok(arguments)
}

async fn respond<T>(
    state: &AppState,
    operation: &str,
    uri: &Uri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError>
where
    T: DeserializeOwned + Serialize,
{
    let arguments = arguments::<T>(uri, body)?;
    let result = run(state, operation, arguments).await?;
    Ok((outcome_headers(&result), Json(result.data)).into_response())
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Course Generator API v2" }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn course(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    respond::<CourseParams>(&state, GENERATE_COURSE, &uri, body).await
}

async fn video(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoQuery>,
) -> Result<Response, ApiError> {
    let result = run(&state, FIND_VIDEO, json!({ "topic": query.topic })).await?;
    Ok((outcome_headers(&result), Json(result.data)).into_response())
}

async fn quiz(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    respond::<QuizParams>(&state, GENERATE_QUIZ, &uri, body).await
}

async fn transcript(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let arguments = arguments::<TranscriptParams>(&uri, body)?;
    let result = run(&state, GET_TRANSCRIPT, arguments).await?;
    let body = json!({ "transcript": result.data });
    Ok((outcome_headers(&result), Json(body)).into_response())
}

async fn homework(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    respond::<HomeworkParams>(&state, GENERATE_HOMEWORK, &uri, body).await
}

async fn solution(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    respond::<SolutionParams>(&state, GENERATE_SOLUTION, &uri, body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionError, ScriptedCompletion};
    use crate::dispatch::testing::{dispatcher, dispatcher_with};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(completion: ScriptedCompletion) -> Router {
        router(Arc::new(dispatcher(completion)), Duration::from_secs(5))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let response = app(ScriptedCompletion::new(vec![]))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Course Generator API v2");

        let response = app(ScriptedCompletion::new(vec![]))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_quiz_partial_headers() {
        let reply = r#"[
            {"question": "Q1", "options": ["a", "b"], "correct_answer": "a"},
            {"question": "Q2", "options": ["a", "b"], "correct_answer": "c"}
        ]"#;
        let response = app(ScriptedCompletion::replying(reply))
            .oneshot(post_json("/quiz", json!({"title": "Loops", "duration": 10})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[OUTCOME_HEADER], "partial");
        assert_eq!(response.headers()[DROPPED_HEADER], "1");
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_is_400() {
        let response = app(ScriptedCompletion::new(vec![]))
            .oneshot(post_json("/quiz", json!({"title": "Loops", "duration": 1})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "invalid_input");

        let malformed = Request::builder()
            .method("POST")
            .uri("/course")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app(ScriptedCompletion::new(vec![])).oneshot(malformed).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_course_service_failure_is_502() {
        let completion = ScriptedCompletion::failing(CompletionError::Network("down".to_string()));
        let response = app(completion)
            .oneshot(post_json("/course", json!({"title": "Rust", "sessions": 2, "topics": 2})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "service");
        assert!(body["error"].as_str().unwrap().contains("down"));
    }

    #[tokio::test]
    async fn test_video_not_found_is_null() {
        let router = router(
            Arc::new(dispatcher_with(ScriptedCompletion::new(vec![]), vec![], None)),
            Duration::from_secs(5),
        );
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/video?topic=rust%20ownership")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[OUTCOME_HEADER], "not_found");
        assert!(body_json(response).await.is_null());
    }

    #[tokio::test]
    async fn test_transcript_wrapped() {
        let response = app(ScriptedCompletion::new(vec![]))
            .oneshot(post_json("/transcript", json!({"url": "https://youtu.be/abc"})))
            .await
            .unwrap();
        assert_eq!(response.headers()[OUTCOME_HEADER], "complete");
        assert_eq!(
            body_json(response).await["transcript"],
            "Today we cover for loops."
        );
    }

    #[tokio::test]
    async fn test_solution_fallback_header() {
        let completion = ScriptedCompletion::failing(CompletionError::Auth("bad".to_string()));
        let response = app(completion)
            .oneshot(post_json(
                "/solution",
                json!({"problem": "reverse a list", "skeleton": "def rev(x): pass"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[OUTCOME_HEADER], "fallback");
        assert_eq!(
            body_json(response).await["solution_code"],
            "# Unable to generate solution"
        );
    }

    fn post_query(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_parameters_accepted() {
        let reply = r#"[
            {"question": "Q1", "options": ["a", "b"], "correct_answer": "a"},
            {"question": "Q2", "options": ["a", "b"], "correct_answer": "b"},
            {"question": "Q3", "options": ["a", "b"], "correct_answer": "a"}
        ]"#;
        let completion = ScriptedCompletion::replying(reply);
        let router = app(completion);
        let response = router
            .oneshot(post_query("/quiz?title=Intro%20to%20Loops&duration=15"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[OUTCOME_HEADER], "complete");
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);

        let response = app(ScriptedCompletion::new(vec![]))
            .oneshot(post_query("/transcript?url=https%3A%2F%2Fyoutu.be%2Fabc"))
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await["transcript"],
            "Today we cover for loops."
        );
    }

    #[tokio::test]
    async fn test_bad_query_parameters_are_400() {
        let response = app(ScriptedCompletion::new(vec![]))
            .oneshot(post_query("/course?title=Rust&sessions=two&topics=3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "invalid_input");

        let response = app(ScriptedCompletion::new(vec![]))
            .oneshot(post_query("/quiz?title=Loops&duration=3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Format), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(ErrorKind::Config), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
