//! HTTP handlers for `/api/models`.

use std::sync::Arc;

use ane_http::error::AppError;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::client::CatalogError;
use super::models::{ModelDetail, ModelSummary};
use super::service::CatalogService;

/// Raw query string for the list endpoint. `page` is parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
}

pub fn router(service: Arc<CatalogService>) -> Router {
    Router::new()
        .route("/", get(list_models))
        .route("/{id}", get(get_model))
        .with_state(service)
}

/// `GET /api/models?page=N`
async fn list_models(
    State(service): State<Arc<CatalogService>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ModelSummary>>, AppError> {
    let page = parse_page(query.page.as_deref());

    service
        .list_popular(page)
        .await
        .map(Json)
        .map_err(list_error)
}

/// `GET /api/models/{id}`
async fn get_model(
    State(service): State<Arc<CatalogService>>,
    Path(id): Path<String>,
) -> Result<Json<ModelDetail>, AppError> {
    service
        .get_detail(&id)
        .await
        .map(Json)
        .map_err(detail_error)
}

/// Missing, non-numeric or zero pages mean the first page.
pub fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(|p| p.trim().parse::<u64>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1)
}

fn list_error(err: CatalogError) -> AppError {
    match err {
        CatalogError::MissingToken => AppError::configuration(err.to_string()),
        CatalogError::Upstream { status, body } => {
            AppError::upstream(status, "Failed to fetch from Thingiverse", Some(body))
        }
        CatalogError::Timeout(_) => AppError::upstream_timeout("Thingiverse did not respond in time"),
        CatalogError::InvalidPayload(_) => {
            AppError::internal("Invalid response from Thingiverse", err)
        }
        other => AppError::internal("Server Error", other),
    }
}

fn detail_error(err: CatalogError) -> AppError {
    match err {
        CatalogError::MissingToken => AppError::configuration(err.to_string()),
        CatalogError::Upstream { status, .. } => {
            AppError::upstream(status, "Failed to fetch details", None)
        }
        CatalogError::Timeout(_) => AppError::upstream_timeout("Thingiverse did not respond in time"),
        other => AppError::internal("Error fetching model details", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::models::client::ThingiverseClient;
    use ane_kernel::settings::{ApiToken, CatalogSettings};
    use axum::body::{to_bytes, Body};
    use axum::extract::Request;
    use axum::http::StatusCode;
    use httpmock::prelude::*;
    use serde_json::json;
    use tower::ServiceExt;

    fn app(base_url: &str, token: Option<&str>) -> Router {
        let settings = CatalogSettings {
            base_url: base_url.to_string(),
            token: token.map(ApiToken::new),
            ..CatalogSettings::default()
        };
        let client = ThingiverseClient::new(&settings).unwrap();
        router(Arc::new(CatalogService::new(client)))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn page_parsing_defaults_to_one() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-2")), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some(" 7 ")), 7);
        assert_eq!(parse_page(Some("5000000000")), 5_000_000_000);
    }

    #[tokio::test]
    async fn large_page_is_forwarded_upstream() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/popular")
                    .query_param("page", "5000000000");
                then.status(200).json_body(json!([]));
            })
            .await;

        let (status, body) = get(app(&server.base_url(), Some("t")), "/?page=5000000000").await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn list_returns_json_array() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/popular")
                    .query_param("page", "1")
                    .header("authorization", "Bearer t");
                then.status(200).json_body(json!([{
                    "id": 99,
                    "name": "Planter",
                    "thumbnail": "https://cdn/p_thumb_medium.jpg",
                    "like_count": 12
                }]));
            })
            .await;

        let (status, body) = get(app(&server.base_url(), Some("t")), "/?page=oops").await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "id": 99,
                "name": "Planter",
                "price": 0,
                "image": "https://cdn/p_large.jpg",
                "category": "Thinkiverse",
                "rating": 4.0,
                "description": null,
                "downloads": 0,
                "like_count": 12
            }])
        );
    }

    #[tokio::test]
    async fn list_passes_upstream_status_and_body_through() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/popular");
                then.status(401).body("{\"error\":\"Unauthorized\"}");
            })
            .await;

        let (status, body) = get(app(&server.base_url(), Some("bad")), "/?page=2").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Failed to fetch from Thingiverse");
        assert_eq!(body["error"], "{\"error\":\"Unauthorized\"}");
    }

    #[tokio::test]
    async fn list_non_array_is_500_without_details() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/popular");
                then.status(200).json_body(json!({ "items": [] }));
            })
            .await;

        let (status, body) = get(app(&server.base_url(), Some("t")), "/").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Invalid response from Thingiverse");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn missing_token_is_configuration_error_for_both_routes() {
        let server = MockServer::start_async().await;
        let spy = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!([]));
            })
            .await;

        for uri in ["/", "/763622"] {
            let (status, body) = get(app(&server.base_url(), None), uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["message"], "Thingiverse Token is missing");
            assert_eq!(body["code"], "configuration_error");
        }
        assert_eq!(spy.hits_async().await, 0);
    }

    #[tokio::test]
    async fn detail_not_found_is_passed_through() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/things/404");
                then.status(404).body("missing");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/things/404/images");
                then.status(200).json_body(json!([]));
            })
            .await;

        let (status, body) = get(app(&server.base_url(), Some("t")), "/404").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Failed to fetch details");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn detail_returns_full_model() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/things/12");
                then.status(200).json_body(json!({
                    "id": 12,
                    "name": "Gear",
                    "thumbnail": "https://cdn/gear_thumb_medium.jpg",
                    "like_count": 80,
                    "creator": { "name": "maker" }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/things/12/images");
                then.status(200).json_body(json!([
                    { "url": "https://cdn/g.jpg", "sizes": [
                        { "type": "preview", "size": "medium", "url": "https://cdn/g_medium.jpg" },
                        { "type": "thumb", "size": "tiny", "url": "https://cdn/g_tiny.jpg" }
                    ] }
                ]));
            })
            .await;

        let (status, body) = get(app(&server.base_url(), Some("t")), "/12").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["image"], "https://cdn/gear_thumb_medium.jpg");
        assert_eq!(body["images"], json!(["https://cdn/g_medium.jpg"]));
        assert_eq!(body["rating"], json!(4.8));
        assert_eq!(body["price"], json!(0));
        assert_eq!(body["downloads"], json!(0));
        assert_eq!(body["creator"], "maker");
        assert_eq!(body["license"], json!(null));
    }
}
