//! Axum route handlers for editor sessions: layout, manual placement, selection, pages,
//! undo/redo, saving and export.

use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::editor::session::{EditorSession, SessionSummary};
use crate::errors::AppError;
use crate::export::{encode_png, export_filename, export_pdf, ExportError, ExportOptions};
use crate::generation::handlers::load_worksheet;
use crate::layout::{LayoutCursor, LayoutReport, SectionKind, ShapeKind};
use crate::models::WorksheetState;
use crate::state::AppState;
use crate::surface::{DrawingSurface, ObjectId, Point, RasterOptions};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub summary: SessionSummary,
}

/// Result of any single-object mutation.
#[derive(Debug, Serialize)]
pub struct ObjectResponse {
    pub object_id: ObjectId,
    pub summary: SessionSummary,
}

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub report: LayoutReport,
    pub summary: SessionSummary,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// False when there was nothing to undo/redo.
    pub applied: bool,
    pub summary: SessionSummary,
}

#[derive(Debug, Serialize)]
pub struct DeleteSelectionResponse {
    pub removed: usize,
    pub summary: SessionSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct LayoutRequest {
    /// Restart from this page's top margin instead of continuing the previous pass.
    #[serde(default)]
    pub page_index: Option<usize>,
    #[serde(default)]
    pub top: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    /// When either coordinate is missing the text is appended below the last object.
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct ShapeRequest {
    pub kind: ShapeKind,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct SectionRequest {
    pub kind: SectionKind,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub ids: Vec<ObjectId>,
}

fn point(x: Option<f32>, y: Option<f32>) -> Option<Point> {
    Some(Point::new(x?, y?))
}

impl LayoutRequest {
    /// Explicit start, if any. A page without a top starts at that page's top margin.
    fn cursor(&self, session: &EditorSession) -> Option<LayoutCursor> {
        let current = session.summary().cursor;
        match (self.page_index, self.top) {
            (None, None) => None,
            (Some(page_index), top) => Some(LayoutCursor {
                page_index,
                top: top.unwrap_or(session.layout_config().margin_top),
            }),
            (None, Some(top)) => Some(LayoutCursor {
                page_index: current.page_index,
                top,
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/worksheets/:id/editor
///
/// Opens an editor session over the worksheet's saved pages (or fresh blank pages).
pub async fn handle_open_session(
    State(state): State<AppState>,
    Path(worksheet_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let worksheet = load_worksheet(&state, worksheet_id).await?;
    let session: EditorSession = EditorSession::open(
        &worksheet,
        state.config.initial_pages,
        state.layout_config.clone(),
    )?;
    let summary = session.summary();
    let session_id = state.sessions.insert(session).await;
    info!(%session_id, %worksheet_id, "Editor session created");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            summary,
        }),
    ))
}

/// GET /api/v1/editor/:sid
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(state.sessions.with_session(sid, |s| s.summary()).await?))
}

/// DELETE /api/v1/editor/:sid
///
/// Closes the session. Unsaved changes are discarded.
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(sid).await {
        info!(session_id = %sid, "Editor session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Editor session {sid} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Placement
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/editor/:sid/layout
pub async fn handle_auto_layout(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>, AppError> {
    let response = state
        .sessions
        .with_session(sid, |s| {
            let start = request.cursor(s);
            let report = s.auto_layout(start);
            LayoutResponse {
                report,
                summary: s.summary(),
            }
        })
        .await?;
    info!(
        session_id = %sid,
        placed = response.report.placements.len(),
        overflowed = response.report.overflow_count(),
        "Auto-layout complete"
    );
    Ok(Json(response))
}

/// POST /api/v1/editor/:sid/items/:index/place
pub async fn handle_place_item(
    State(state): State<AppState>,
    Path((sid, index)): Path<(Uuid, usize)>,
    Json(request): Json<PositionRequest>,
) -> Result<Json<ObjectResponse>, AppError> {
    let response = state
        .sessions
        .with_session(sid, |s| {
            let object_id = s.place_item(index, Point::new(request.x, request.y))?;
            Ok::<_, AppError>(ObjectResponse {
                object_id,
                summary: s.summary(),
            })
        })
        .await??;
    Ok(Json(response))
}

/// POST /api/v1/editor/:sid/text
pub async fn handle_add_text(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(request): Json<TextRequest>,
) -> Result<Json<ObjectResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    let response = state
        .sessions
        .with_session(sid, |s| {
            let object_id = match point(request.x, request.y) {
                Some(at) => s.add_text(&request.text, at),
                None => s.append_text(&request.text),
            };
            ObjectResponse {
                object_id,
                summary: s.summary(),
            }
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/editor/:sid/shapes
pub async fn handle_add_shape(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(request): Json<ShapeRequest>,
) -> Result<Json<ObjectResponse>, AppError> {
    let response = state
        .sessions
        .with_session(sid, |s| {
            let object_id = s.add_shape(request.kind, point(request.x, request.y));
            ObjectResponse {
                object_id,
                summary: s.summary(),
            }
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/editor/:sid/sections
pub async fn handle_add_section(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(request): Json<SectionRequest>,
) -> Result<Json<ObjectResponse>, AppError> {
    let response = state
        .sessions
        .with_session(sid, |s| {
            let object_id = s.add_section(request.kind, point(request.x, request.y));
            ObjectResponse {
                object_id,
                summary: s.summary(),
            }
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/editor/:sid/objects/:object_id/move
pub async fn handle_move_object(
    State(state): State<AppState>,
    Path((sid, object_id)): Path<(Uuid, u64)>,
    Json(request): Json<PositionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = state
        .sessions
        .with_session(sid, |s| {
            s.move_object(ObjectId(object_id), Point::new(request.x, request.y))?;
            Ok::<_, AppError>(s.summary())
        })
        .await??;
    Ok(Json(summary))
}

// ────────────────────────────────────────────────────────────────────────────
// Selection
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/editor/:sid/selection
pub async fn handle_select(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = state
        .sessions
        .with_session(sid, |s| {
            s.select(&request.ids);
            s.summary()
        })
        .await?;
    Ok(Json(summary))
}

/// POST /api/v1/editor/:sid/selection/all
pub async fn handle_select_all(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = state
        .sessions
        .with_session(sid, |s| {
            s.select_all();
            s.summary()
        })
        .await?;
    Ok(Json(summary))
}

/// DELETE /api/v1/editor/:sid/selection
pub async fn handle_deselect(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = state
        .sessions
        .with_session(sid, |s| {
            s.deselect();
            s.summary()
        })
        .await?;
    Ok(Json(summary))
}

/// POST /api/v1/editor/:sid/selection/delete
pub async fn handle_delete_selection(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<DeleteSelectionResponse>, AppError> {
    let response = state
        .sessions
        .with_session(sid, |s| DeleteSelectionResponse {
            removed: s.delete_selection(),
            summary: s.summary(),
        })
        .await?;
    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Pages and history
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/editor/:sid/pages
pub async fn handle_add_page(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionSummary>), AppError> {
    let summary = state
        .sessions
        .with_session(sid, |s| {
            s.add_page();
            s.summary()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /api/v1/editor/:sid/pages/:index/activate
pub async fn handle_switch_page(
    State(state): State<AppState>,
    Path((sid, index)): Path<(Uuid, usize)>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = state
        .sessions
        .with_session(sid, |s| {
            s.switch_page(index)?;
            Ok::<_, AppError>(s.summary())
        })
        .await??;
    Ok(Json(summary))
}

/// POST /api/v1/editor/:sid/undo
pub async fn handle_undo(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<HistoryResponse>, AppError> {
    let response = state
        .sessions
        .with_session(sid, |s| HistoryResponse {
            applied: s.undo(),
            summary: s.summary(),
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/editor/:sid/redo
pub async fn handle_redo(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<HistoryResponse>, AppError> {
    let response = state
        .sessions
        .with_session(sid, |s| HistoryResponse {
            applied: s.redo(),
            summary: s.summary(),
        })
        .await?;
    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Save / export
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/editor/:sid/save
///
/// Writes every page's serialized state back to the worksheet.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<WorksheetState>, AppError> {
    let (worksheet_id, page_states) = state
        .sessions
        .with_session(sid, |s| (s.worksheet_id(), s.page_states()))
        .await?;

    let worksheet = state
        .worksheets
        .set_page_states(worksheet_id, page_states)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Worksheet {worksheet_id} not found")))?;
    info!(session_id = %sid, %worksheet_id, pages = worksheet.page_states.len(), "Editor pages saved");
    Ok(Json(worksheet))
}

/// GET /api/v1/editor/:sid/export
///
/// Rasterizes every page and returns a PDF, one page per worksheet page, in page order.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Response, AppError> {
    let (pages, title) = state
        .sessions
        .with_session(sid, |s| (s.pages().to_vec(), s.title().to_string()))
        .await?;
    let options = ExportOptions::with_scale(state.config.export_scale);
    let page_count = pages.len();

    // CPU-bound: keep it off the async executor.
    let bytes = tokio::task::spawn_blocking(move || export_pdf(&pages, &options))
        .await
        .map_err(|e| AppError::Internal(anyhow!("spawn_blocking failed in export: {e}")))??;

    let filename = export_filename(&title);
    info!(session_id = %sid, pages = page_count, bytes = bytes.len(), %filename, "Worksheet exported");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/editor/:sid/pages/:index/preview
///
/// PNG rendering of a single page at scale 1.
pub async fn handle_preview_page(
    State(state): State<AppState>,
    Path((sid, index)): Path<(Uuid, usize)>,
) -> Result<Response, AppError> {
    let page = state
        .sessions
        .with_session(sid, |s| s.page(index).cloned())
        .await??;

    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ExportError> {
        let image = page.rasterize(&RasterOptions::default())?;
        encode_png(&image)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("spawn_blocking failed in preview: {e}")))??;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
