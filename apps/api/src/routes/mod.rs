pub mod health;

use axum::{routing::get, Router};

use crate::queries::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/queries",
            get(handlers::handle_query).post(handlers::handle_query),
        )
        // Path used by already-deployed mobile clients
        .route(
            "/api.php",
            get(handlers::handle_query).post(handlers::handle_query),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use async_trait::async_trait;
    use trail_core::{NewQuery, QueryEntry, QueryUpdate};

    use super::*;
    use crate::store::{EntryStore, MemoryEntryStore, StoreError};

    /// Store whose connection is gone.
    struct UnreachableStore;

    #[async_trait]
    impl EntryStore for UnreachableStore {
        async fn create(&self, _query: &NewQuery) -> Result<i64, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn read(&self, _id: i64) -> Result<Option<QueryEntry>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn update(&self, _update: &QueryUpdate) -> Result<u64, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn test_app() -> Router {
        build_router(AppState::new(Arc::new(MemoryEntryStore::new())))
    }

    async fn post_form(app: &Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/queries")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        into_parts(response).await
    }

    async fn get_uri(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        into_parts(response).await
    }

    async fn into_parts(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    const CREATE_BODY: &str = "action=create&latitude=40.0&longitude=-74.0\
        &user_question=What+is+this+place%3F&context_tag=trail";

    #[tokio::test]
    async fn test_create_returns_positive_id() {
        let app = test_app();
        let (status, json) = post_form(&app, CREATE_BODY).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert!(json["id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_create_missing_field_is_400() {
        let app = test_app();
        let bodies = [
            "action=create&longitude=-74.0&user_question=q&context_tag=trail",
            "action=create&latitude=40.0&user_question=q&context_tag=trail",
            "action=create&latitude=40.0&longitude=-74.0&context_tag=trail",
            "action=create&latitude=40.0&longitude=-74.0&user_question=q",
            "action=create&latitude=40.0&longitude=-74.0&user_question=&context_tag=trail",
        ];
        for body in bodies {
            let (status, json) = post_form(&app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json["error"], "Missing required fields");
        }
    }

    #[tokio::test]
    async fn test_read_echoes_created_entry() {
        let app = test_app();
        let (_, created) = post_form(&app, CREATE_BODY).await;
        let id = created["id"].as_i64().unwrap();

        let (status, json) = get_uri(&app, &format!("/api/v1/queries?action=read&id={id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], id);
        assert_eq!(json["status"], "ready");
        assert_eq!(json["latitude"], 40.0);
        assert_eq!(json["longitude"], -74.0);
        assert_eq!(json["user_question"], "What is this place?");
        assert_eq!(json["context_tag"], "trail");
        assert!(json["llm_response"].is_null());
    }

    #[tokio::test]
    async fn test_read_missing_and_unknown_id() {
        let app = test_app();
        let (status, json) = get_uri(&app, "/api/v1/queries?action=read").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing id parameter");

        let (status, json) = get_uri(&app, "/api/v1/queries?action=read&id=999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Entry not found");
    }

    #[tokio::test]
    async fn test_update_rejects_bogus_status() {
        let app = test_app();
        post_form(&app, CREATE_BODY).await;
        let (status, json) =
            post_form(&app, "action=update&id=1&llm_response=hello&status=bogus").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid status value");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_404() {
        let app = test_app();
        let (status, _) =
            post_form(&app, "action=update&id=42&llm_response=hello&status=complete").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_or_missing_action() {
        let app = test_app();
        let (status, json) = get_uri(&app, "/api/v1/queries").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid or missing action parameter");
        assert_eq!(json["code"], "INVALID_ACTION");

        let (status, _) = get_uri(&app, "/api/v1/queries?action=delete&id=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_end_to_end_lifecycle() {
        let app = test_app();

        let (_, created) = post_form(&app, CREATE_BODY).await;
        assert_eq!(created["id"], 1);

        let (_, entry) = get_uri(&app, "/api.php?action=read&id=1").await;
        assert_eq!(entry["status"], "ready");

        let (status, updated) = post_form(
            &app,
            "action=update&id=1&llm_response=A+historic+lighthouse.&status=complete",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["success"], true);

        let (_, entry) = get_uri(&app, "/api/v1/queries?action=read&id=1").await;
        assert_eq!(entry["status"], "complete");
        assert_eq!(entry["llm_response"], "A historic lighthouse.");
    }

    #[tokio::test]
    async fn test_sequential_ids_increase() {
        let app = test_app();
        let mut last = 0;
        for _ in 0..5 {
            let (_, json) = post_form(&app, CREATE_BODY).await;
            let id = json["id"].as_i64().unwrap();
            assert!(id > last);
            last = id;
        }
    }

    #[tokio::test]
    async fn test_action_in_query_string_with_form_body() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/queries?action=create")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "latitude=1.5&longitude=2.5&user_question=q&context_tag=t",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, json) = into_parts(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], 1);
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, json) = get_uri(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "curiotrail-api");
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_store() {
        let app = build_router(AppState::new(Arc::new(UnreachableStore)));
        let (status, json) = get_uri(&app, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["code"], "STORE_UNAVAILABLE");
        assert_eq!(json["error"], "Storage is unavailable");
    }

    #[tokio::test]
    async fn test_store_failure_is_opaque_500() {
        let app = build_router(AppState::new(Arc::new(UnreachableStore)));
        let (status, json) = post_form(&app, CREATE_BODY).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Insert failed");
        assert_eq!(json["code"], "DATABASE_ERROR");
    }
}
