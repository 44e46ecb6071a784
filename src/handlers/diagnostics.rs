use crate::{models::{DiagnosticsResponse, ErrorResponse}, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::{info, warn};

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Report pipeline and process statistics
pub async fn diagnostics(
    State(app_state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<DiagnosticsResponse>), (StatusCode, Json<ErrorResponse>)> {

    let stats = match app_state.engine.coordinator().stats().await {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Diagnostics unavailable: {}", e);
            let status = StatusCode::SERVICE_UNAVAILABLE;
            return Err((status, Json(ErrorResponse::new(status, e.to_string()))));
        }
    };
    let n_sessions = app_state.engine.sessions().count() as u32;
    let n_topics = app_state.hub.topic_count() as u32;

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| {
            Mutex::new(System::new_all())
        });
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0)
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Sessions: {}, Docs: {} ({} dirty)",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_sessions,
        stats.cached,
        stats.dirty
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_sessions,
            n_cached_docs: stats.cached as u32,
            n_dirty_docs: stats.dirty as u32,
            n_topics,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    ))
}
