use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use folio_core::{BrochureRequest, ErrorKind};
use folio_pipeline::JobFailure;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    stage: Option<String>,
    message: String,
}

/// HTTP status for each failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::FetchRootFailed | ErrorKind::ExtractionEmpty => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::EnrichmentUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::EnrichmentInvalid => StatusCode::BAD_GATEWAY,
        ErrorKind::RenderFailure => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn failure_response(failure: JobFailure) -> Response {
    let body = ErrorBody {
        kind: failure.kind.to_string(),
        stage: Some(failure.stage.to_string()),
        message: failure.message,
    };
    (status_for(failure.kind), Json(body)).into_response()
}

fn bad_request(message: &str) -> Response {
    let body = ErrorBody {
        kind: "InvalidRequest".to_string(),
        stage: None,
        message: message.to_string(),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// `Acme Robotics` becomes `Acme_Robotics_brochure.pdf`. Characters that
/// cannot appear in a quoted header value are dropped.
pub fn brochure_filename(company_name: &str) -> String {
    let stem: String = company_name
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') => Some(c),
            _ => None,
        })
        .collect();
    if stem.is_empty() {
        "brochure.pdf".to_string()
    } else {
        format!("{stem}_brochure.pdf")
    }
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn generate_brochure(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BrochureRequest>,
) -> Response {
    if request.company_name.trim().is_empty() {
        return bad_request("companyName is required");
    }
    if request.company_url.trim().is_empty() {
        return bad_request("companyUrl is required");
    }

    let company = request.company_name.trim().to_string();
    match state.pipeline.generate(request).await {
        Ok(document) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                brochure_filename(&company)
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                document.bytes,
            )
                .into_response()
        }
        Err(failure) => {
            warn!("Brochure for {} failed: {}", company, failure);
            failure_response(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_app;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use folio_core::FolioConfig;
    use folio_inference::models::{ScriptedModel, ScriptedReply};
    use folio_inference::NarrativeEnricher;
    use folio_pipeline::GenerationPipeline;
    use folio_scrapers::SiteFetcher;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BROCHURE: &str = r#"{"sections": [
        {"type": "cover", "heading": "Acme Robotics"},
        {"type": "about", "heading": "Who we are", "paragraphs": ["Two engineers, one mission."]},
        {"type": "callToAction", "heading": "Talk to us", "paragraphs": ["Book a demo."]}
    ]}"#;

    fn state(reply: ScriptedReply) -> AppState {
        let mut config = FolioConfig::default();
        config.enrich.backoff_base = std::time::Duration::from_millis(5);
        let fetcher = Arc::new(SiteFetcher::new(config.fetch.clone()).unwrap());
        let model = Arc::new(ScriptedModel::always(reply));
        let enricher = Arc::new(NarrativeEnricher::new(model, config.enrich.clone()));
        AppState::new(GenerationPipeline::new(config, fetcher, enricher))
    }

    async fn site() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body><p>Acme Robotics builds collaborative robot arms.</p></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;
        server
    }

    fn post(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate-brochure")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_brochure_filename() {
        assert_eq!(brochure_filename("Acme Robotics"), "Acme_Robotics_brochure.pdf");
        assert_eq!(brochure_filename("  \"Quote\" Co. "), "Quote_Co._brochure.pdf");
        assert_eq!(brochure_filename("   "), "brochure.pdf");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::ExtractionEmpty), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(ErrorKind::EnrichmentUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorKind::EnrichmentInvalid), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_app(state(ScriptedReply::text(BROCHURE))).await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_generate_returns_pdf() {
        let server = site().await;
        let app = create_app(state(ScriptedReply::text(BROCHURE))).await;

        let response = app
            .oneshot(post(serde_json::json!({
                "companyName": "Acme Robotics",
                "companyUrl": server.uri(),
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Acme_Robotics_brochure.pdf\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_backend_outage_maps_to_503() {
        let server = site().await;
        let app = create_app(state(ScriptedReply::unavailable())).await;

        let response = app
            .oneshot(post(serde_json::json!({
                "companyName": "Acme",
                "companyUrl": server.uri(),
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "EnrichmentUnavailable");
        assert_eq!(json["stage"], "enrich");
        assert!(!json["message"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let app = create_app(state(ScriptedReply::text(BROCHURE))).await;
        let response = app
            .oneshot(post(serde_json::json!({
                "companyName": " ",
                "companyUrl": "https://acme.test",
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
