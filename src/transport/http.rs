//! HTTP transport: `POST /mcp` plus health/metrics endpoints, bound to a
//! local interface only (spec §4.6).

use actix_web::{web, App, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::cancel::CancellationToken;
use crate::core::dispatcher::Dispatcher;
use crate::errors::ServerError;

struct AppState {
    dispatcher: Arc<Dispatcher>,
}

async fn mcp(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request = match Dispatcher::parse_request(&body) {
        Ok(r) => r,
        Err(e) => {
            let error = json!({
                "jsonrpc": "2.0",
                "id": Value::Null,
                "error": { "code": e.code(), "message": e.to_string() }
            });
            return HttpResponse::Ok().json(error);
        }
    };
    let token = CancellationToken::new();
    let response = state.dispatcher.handle(&token, request).await;
    HttpResponse::Ok().json(response)
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "uptime_seconds": state.dispatcher.uptime_seconds(),
    }))
}

async fn health_detailed(state: web::Data<AppState>) -> HttpResponse {
    let cli_reachable = state.dispatcher.cli_reachable();
    let storage_ok = state.dispatcher.storage_ok();
    let workspace_writable = state.dispatcher.workspace_writable();
    let status = if cli_reachable && storage_ok && workspace_writable { "ok" } else { "degraded" };
    HttpResponse::Ok().json(json!({
        "status": status,
        "uptime_seconds": state.dispatcher.uptime_seconds(),
        "cli_reachable": cli_reachable,
        "storage_ok": storage_ok,
        "workspace_writable": workspace_writable,
    }))
}

async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.dispatcher.metrics_snapshot())
}

pub async fn run(dispatcher: Arc<Dispatcher>, host: String, port: u16) -> Result<(), ServerError> {
    let state = web::Data::new(AppState { dispatcher });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/mcp", web::post().to(mcp))
            .route("/health", web::get().to(health))
            .route("/health/detailed", web::get().to(health_detailed))
            .route("/metrics", web::get().to(metrics))
    })
    .workers(num_cpus::get())
    .bind((host.as_str(), port))
    .map_err(|e| ServerError::Transport(format!("failed to bind {host}:{port}: {e}")))?
    .run()
    .await
    .map_err(|e| ServerError::Transport(format!("http server error: {e}")))
}
