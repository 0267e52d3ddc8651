pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::editor::handlers as editor;
use crate::generation::handlers as worksheets;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Worksheets
        .route("/api/v1/worksheets", get(worksheets::handle_list))
        .route(
            "/api/v1/worksheets/generate",
            post(worksheets::handle_generate),
        )
        .route("/api/v1/worksheets/:id", get(worksheets::handle_get))
        .route(
            "/api/v1/worksheets/:id/items",
            get(worksheets::handle_get_items),
        )
        .route(
            "/api/v1/worksheets/:id/regenerate",
            post(worksheets::handle_regenerate),
        )
        .route(
            "/api/v1/worksheets/:id/state",
            put(worksheets::handle_save_state),
        )
        .route(
            "/api/v1/worksheets/:id/editor",
            post(editor::handle_open_session),
        )
        // Editor sessions
        .route(
            "/api/v1/editor/:sid",
            get(editor::handle_get_session).delete(editor::handle_close_session),
        )
        .route("/api/v1/editor/:sid/layout", post(editor::handle_auto_layout))
        .route(
            "/api/v1/editor/:sid/items/:index/place",
            post(editor::handle_place_item),
        )
        .route("/api/v1/editor/:sid/text", post(editor::handle_add_text))
        .route("/api/v1/editor/:sid/shapes", post(editor::handle_add_shape))
        .route(
            "/api/v1/editor/:sid/sections",
            post(editor::handle_add_section),
        )
        .route(
            "/api/v1/editor/:sid/objects/:object_id/move",
            post(editor::handle_move_object),
        )
        .route(
            "/api/v1/editor/:sid/selection",
            post(editor::handle_select).delete(editor::handle_deselect),
        )
        .route(
            "/api/v1/editor/:sid/selection/all",
            post(editor::handle_select_all),
        )
        .route(
            "/api/v1/editor/:sid/selection/delete",
            post(editor::handle_delete_selection),
        )
        .route("/api/v1/editor/:sid/pages", post(editor::handle_add_page))
        .route(
            "/api/v1/editor/:sid/pages/:index/activate",
            post(editor::handle_switch_page),
        )
        .route(
            "/api/v1/editor/:sid/pages/:index/preview",
            get(editor::handle_preview_page),
        )
        .route("/api/v1/editor/:sid/undo", post(editor::handle_undo))
        .route("/api/v1/editor/:sid/redo", post(editor::handle_redo))
        .route("/api/v1/editor/:sid/save", post(editor::handle_save))
        .route("/api/v1/editor/:sid/export", get(editor::handle_export))
        .with_state(state)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::editor::SessionStore;
    use crate::errors::AppError;
    use crate::generation::generator::{ContentGenerator, GenerateRequest, GeneratedContent};
    use crate::layout::default_layout_config;
    use crate::repository::InMemoryWorksheetRepository;

    const CONTENT: &str = "\
1. Warm-up: Name a planet.
2. Multiple Choice
Which planet is largest?
a. Mars
b. Jupiter
3. Short Answer
Why is Mars red?";

    struct StubGenerator {
        fail: bool,
    }

    #[async_trait]
    impl ContentGenerator for StubGenerator {
        async fn generate(&self, _request: &GenerateRequest) -> Result<GeneratedContent, AppError> {
            if self.fail {
                return Err(AppError::Llm("upstream unavailable".to_string()));
            }
            Ok(GeneratedContent {
                content: CONTENT.to_string(),
                model: "stub".to_string(),
            })
        }
    }

    fn app_with(fail: bool) -> Router {
        build_router(AppState {
            config: Config::for_tests(),
            worksheets: Arc::new(InMemoryWorksheetRepository::new()),
            generator: Arc::new(StubGenerator { fail }),
            sessions: SessionStore::new(),
            layout_config: default_layout_config(),
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn generate(app: &Router) -> String {
        let (status, body) = send_json(
            app,
            Method::POST,
            "/api/v1/worksheets/generate",
            Some(json!({"subject": "Science", "topic": "Planets", "grade": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["worksheet"]["id"].as_str().unwrap().to_string()
    }

    async fn open_session(app: &Router, worksheet_id: &str) -> String {
        let (status, body) = send_json(
            app,
            Method::POST,
            &format!("/api/v1/worksheets/{worksheet_id}/editor"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(false);
        let (status, body) = send_json(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "worksheet-api");
    }

    #[tokio::test]
    async fn test_generate_stores_worksheet_first() {
        let app = app_with(false);
        let first = generate(&app).await;
        let second = generate(&app).await;

        let (status, body) = send_json(&app, Method::GET, "/api/v1/worksheets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], second.as_str());
        assert_eq!(body[1]["id"], first.as_str());
        assert_eq!(body[0]["title"], "Science - Planets");
        assert_eq!(body[0]["grade"], "5");
    }

    #[tokio::test]
    async fn test_generation_failure_stores_nothing() {
        let app = app_with(true);
        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/v1/worksheets/generate",
            Some(json!({"subject": "Science", "topic": "Planets", "grade": "5"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");

        let (_, list) = send_json(&app, Method::GET, "/api/v1/worksheets", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_subject() {
        let app = app_with(false);
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/v1/worksheets/generate",
            Some(json!({"subject": " ", "topic": "Planets", "grade": "5"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_items_are_parsed() {
        let app = app_with(false);
        let id = generate(&app).await;
        let (status, body) =
            send_json(&app, Method::GET, &format!("/api/v1/worksheets/{id}/items"), None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1]["type"], "multiple_choice");
    }

    #[tokio::test]
    async fn test_unknown_worksheet_is_404() {
        let app = app_with(false);
        let (status, body) = send_json(
            &app,
            Method::GET,
            &format!("/api/v1/worksheets/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_editor_layout_undo_and_save() {
        let app = app_with(false);
        let worksheet_id = generate(&app).await;
        let sid = open_session(&app, &worksheet_id).await;

        let (status, body) = send_json(
            &app,
            Method::POST,
            &format!("/api/v1/editor/{sid}/layout"),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["placements"].as_array().unwrap().len(), 3);
        assert!(body["summary"]["objects_per_page"][0].as_u64().unwrap() > 0);

        let (_, body) = send_json(&app, Method::POST, &format!("/api/v1/editor/{sid}/undo"), None).await;
        assert_eq!(body["applied"], true);
        assert_eq!(body["summary"]["objects_per_page"][0], 0);

        let (_, body) = send_json(&app, Method::POST, &format!("/api/v1/editor/{sid}/redo"), None).await;
        assert_eq!(body["applied"], true);

        let (status, body) =
            send_json(&app, Method::POST, &format!("/api/v1/editor/{sid}/save"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page_states"].as_array().unwrap().len(), 2);

        // A fresh session restores the saved pages.
        let reopened = open_session(&app, &worksheet_id).await;
        let (_, summary) =
            send_json(&app, Method::GET, &format!("/api/v1/editor/{reopened}"), None).await;
        assert!(summary["objects_per_page"][0].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_editor_manual_placement_and_selection() {
        let app = app_with(false);
        let worksheet_id = generate(&app).await;
        let sid = open_session(&app, &worksheet_id).await;

        let (status, body) = send_json(
            &app,
            Method::POST,
            &format!("/api/v1/editor/{sid}/shapes"),
            Some(json!({"kind": "number_line"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let shape = body["object_id"].as_u64().unwrap();
        assert_eq!(body["summary"]["selection"], json!([shape]));

        let (status, _) = send_json(
            &app,
            Method::POST,
            &format!("/api/v1/editor/{sid}/objects/{shape}/move"),
            Some(json!({"x": 100.0, "y": 400.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        send_json(
            &app,
            Method::POST,
            &format!("/api/v1/editor/{sid}/text"),
            Some(json!({"text": "Show your work."})),
        )
        .await;
        send_json(
            &app,
            Method::POST,
            &format!("/api/v1/editor/{sid}/items/1/place"),
            Some(json!({"x": 50.0, "y": 600.0})),
        )
        .await;

        let (_, body) = send_json(
            &app,
            Method::POST,
            &format!("/api/v1/editor/{sid}/selection/all"),
            None,
        )
        .await;
        assert_eq!(body["selection"].as_array().unwrap().len(), 3);

        let (_, body) = send_json(
            &app,
            Method::POST,
            &format!("/api/v1/editor/{sid}/selection/delete"),
            None,
        )
        .await;
        assert_eq!(body["removed"], 3);
        assert_eq!(body["summary"]["objects_per_page"][0], 0);
    }

    #[tokio::test]
    async fn test_editor_page_errors() {
        let app = app_with(false);
        let worksheet_id = generate(&app).await;
        let sid = open_session(&app, &worksheet_id).await;

        let (status, _) = send_json(
            &app,
            Method::POST,
            &format!("/api/v1/editor/{sid}/pages/9/activate"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send_json(&app, Method::POST, &format!("/api/v1/editor/{sid}/pages"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["page_count"], 3);

        let (status, body) = send_json(
            &app,
            Method::POST,
            &format!("/api/v1/editor/{sid}/pages/2/activate"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active_page"], 2);
    }

    #[tokio::test]
    async fn test_export_returns_pdf_attachment() {
        let app = app_with(false);
        let worksheet_id = generate(&app).await;
        let sid = open_session(&app, &worksheet_id).await;
        send_json(&app, Method::POST, &format!("/api/v1/editor/{sid}/layout"), Some(json!({}))).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/editor/{sid}/export"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Science_-_Planets.pdf\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_preview_is_png() {
        let app = app_with(false);
        let worksheet_id = generate(&app).await;
        let sid = open_session(&app, &worksheet_id).await;
        let (status, bytes) = send(
            &app,
            Method::GET,
            &format!("/api/v1/editor/{sid}/pages/0/preview"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[tokio::test]
    async fn test_closed_session_is_gone() {
        let app = app_with(false);
        let worksheet_id = generate(&app).await;
        let sid = open_session(&app, &worksheet_id).await;
        let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/editor/{sid}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &format!("/api/v1/editor/{sid}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
