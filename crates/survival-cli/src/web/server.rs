use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::Local;
use serde::Serialize;

use survival_classifiers::passenger::{PassengerRecord, PassengerRequest};
use survival_classifiers::predictor::{ModelSlot, Verdict};
use survival_classifiers::PredictionFailure;

use crate::config::AppConfig;
use crate::web::form::PassengerForm;
use crate::web::pages;

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub slot: ModelSlot,
    pub title: String,
}

impl AppState {
    pub fn new(slot: ModelSlot, title: impl Into<String>) -> Self {
        Self {
            slot,
            title: title.into(),
        }
    }

    fn model_error(&self) -> Option<&PredictionFailure> {
        match &self.slot {
            ModelSlot::Ready(_) => None,
            ModelSlot::Unavailable(e) => Some(e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub label: &'static str,
    pub survived: bool,
    pub probability: f32,
}

impl From<Verdict> for PredictionResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            label: verdict.label(),
            survived: verdict.survived,
            probability: verdict.probability,
        }
    }
}

/// Build the axum [`Router`] with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(form_handler))
        .route("/predict", post(submit_handler))
        .route("/api/predict", post(api_predict_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Load the model once, then serve until the process is stopped. A model that
/// fails to load does not stop the server; every submission reports the load
/// failure instead.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let slot = ModelSlot::load(&config.model);
    let state = Arc::new(AppState::new(slot, config.title.clone()));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    log::info!("[Survival::Serve] Listening on http://{}", config.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn form_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let page = pages::form_page(
        &state.title,
        &PassengerForm::default(),
        None,
        state.model_error(),
        Local::now(),
    );
    Html(page.into_string())
}

async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PassengerForm>,
) -> Html<String> {
    let outcome = form
        .to_request()
        .and_then(|request| predict_logged(&state.slot, &request));
    let page = pages::form_page(
        &state.title,
        &form,
        Some(&outcome),
        state.model_error(),
        Local::now(),
    );
    Html(page.into_string())
}

async fn api_predict_handler(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PassengerRecord>,
) -> Response {
    let outcome = PassengerRequest::try_from(record)
        .and_then(|request| predict_logged(&state.slot, &request));
    match outcome {
        Ok(verdict) => Json(PredictionResponse::from(verdict)).into_response(),
        Err(e) => (
            status_for(&e),
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(match &state.slot {
        ModelSlot::Ready(predictor) => serde_json::json!({
            "status": "ok",
            "model": predictor.model_name(),
            "schema": predictor.encoder().schema(),
        }),
        ModelSlot::Unavailable(e) => serde_json::json!({
            "status": "degraded",
            "model": null,
            "error": e.to_string(),
        }),
    })
}

fn predict_logged(slot: &ModelSlot, request: &PassengerRequest) -> Result<Verdict, PredictionFailure> {
    let outcome = slot.predict(request);
    match &outcome {
        Ok(verdict) => log::info!("Prediction: {}", verdict),
        Err(e) => log::warn!("Prediction failed: {}", e),
    }
    outcome
}

pub fn status_for(failure: &PredictionFailure) -> StatusCode {
    match failure {
        PredictionFailure::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PredictionFailure::ModelNotFound { .. }
        | PredictionFailure::ModelLoad { .. }
        | PredictionFailure::SchemaMismatch { .. }
        | PredictionFailure::Encoder(_) => StatusCode::SERVICE_UNAVAILABLE,
        PredictionFailure::FeatureCount { .. } | PredictionFailure::Inference(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use ndarray::Array2;
    use std::path::PathBuf;
    use survival_classifiers::encoding::FeatureEncoder;
    use survival_classifiers::models::ClassifierModel;
    use survival_classifiers::predictor::Predictor;
    use tower::ServiceExt;

    struct Constant(f32);

    impl ClassifierModel for Constant {
        fn predict_proba(&self, x: &Array2<f32>) -> survival_classifiers::Result<Vec<f32>> {
            Ok(vec![self.0; x.nrows()])
        }
    }

    fn app_with(output: f32) -> Router {
        let predictor = Predictor::new(FeatureEncoder::one_hot(), Box::new(Constant(output)), 0.5);
        build_router(Arc::new(AppState::new(ModelSlot::Ready(predictor), "Test")))
    }

    fn app_without_model() -> Router {
        let slot = ModelSlot::Unavailable(PredictionFailure::ModelNotFound {
            path: PathBuf::from("missing.json"),
        });
        build_router(Arc::new(AppState::new(slot, "Test")))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const FORM: &str = "pclass=1&sex=Female&age=29&fare=100&sibsp=0&parch=0&embarked=Cherbourg+%28C%29";

    #[tokio::test]
    async fn test_form_page_renders() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app_with(1.0).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Predict Survival"));
    }

    #[tokio::test]
    async fn test_submit_survived() {
        let response = app_with(1.0).oneshot(form_request(FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("would have survived"));
    }

    #[tokio::test]
    async fn test_submit_did_not_survive() {
        let response = app_with(0.0).oneshot(form_request(FORM)).await.unwrap();
        let page = body_text(response).await;
        assert!(page.contains("would not have survived"));
    }

    #[tokio::test]
    async fn test_submit_invalid_age_renders_error() {
        let body = FORM.replace("age=29", "age=150");
        let response = app_with(1.0).oneshot(form_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Error during prediction"));
        assert!(page.contains("invalid value for Age"));
    }

    #[tokio::test]
    async fn test_submit_without_model_reports_error() {
        let response = app_without_model().oneshot(form_request(FORM)).await.unwrap();
        let page = body_text(response).await;
        assert!(page.contains("Error during prediction"));
        assert!(page.contains("model file not found"));
    }

    #[tokio::test]
    async fn test_api_predict() {
        let body = serde_json::json!({
            "pclass": 3, "sex": "male", "age": 22.0, "fare": 7.25,
            "sibsp": 1, "parch": 0, "embarked": "S"
        });
        let req = Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let response = app_with(0.2).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["label"], "Did not survive");
        assert_eq!(json["survived"], false);
    }

    #[tokio::test]
    async fn test_api_status_codes() {
        let invalid = serde_json::json!({
            "pclass": 4, "sex": "male", "age": 22.0, "fare": 7.25,
            "sibsp": 0, "parch": 0, "embarked": "S"
        });
        let req = Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&invalid).unwrap()))
            .unwrap();
        let response = app_with(1.0).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let valid = serde_json::json!({
            "Pclass": 1, "Sex": "female", "Age": 29.0, "Fare": 100.0,
            "SibSp": 0, "Parch": 0, "Embarked": "C"
        });
        let req = Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&valid).unwrap()))
            .unwrap();
        let response = app_without_model().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_api_rejects_missing_fields() {
        let partial = serde_json::json!({ "pclass": 1, "sex": "female", "embarked": "C" });
        let req = Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&partial).unwrap()))
            .unwrap();
        let response = app_with(1.0).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], "invalid value for Age: missing value");
    }

    #[tokio::test]
    async fn test_health_reports_model_state() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app_without_model().oneshot(req).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "degraded");

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app_with(1.0).oneshot(req).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["schema"], "one_hot");
    }
}
