//! Update pages over HTTP using axum + embedded static assets

use anyhow::{Context, Result};
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method as HttpMethod, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use rust_embed::Embed;
use sl_core::Config;
use sl_update::{
    validate_session_id, FileSessionStore, Method, PageController, PageRequest, PageResponse,
    RequestTimer,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use uuid::Uuid;

use crate::cli::{GlobalArgs, ServeArgs};
use crate::context::RuntimeContext;

/// Cookie carrying the session id
const SESSION_COOKIE: &str = "sluice_session";

/// Cookie carrying the admin token once presented
const ADMIN_COOKIE: &str = "sluice_admin";

/// Embedded static assets from the `static/` directory
#[derive(Embed)]
#[folder = "static/"]
struct StaticAssets;

/// Shared state for every handler
struct AppState {
    controller: PageController,
    config: Config,
}

/// Execute the serve command
pub(crate) async fn execute(args: &ServeArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let session_dir = ctx.project.config.session_dir_absolute(&ctx.project.root);
    ctx.verbose(&format!("Session state in {}", session_dir.display()));

    let controller = PageController::new(
        ctx.engine.clone(),
        Arc::new(FileSessionStore::new(session_dir)),
        ctx.controller_settings(),
    );
    let config = ctx.project.config.clone();
    if config.access_check && config.admin_token.is_none() {
        eprintln!(
            "[warn] access_check is enabled but no admin_token is set; every request will be denied"
        );
    }

    let state = Arc::new(AppState { controller, config });
    let app = Router::new()
        .route("/", get(update_handler).post(update_handler))
        .route("/update.php", get(update_handler).post(update_handler))
        .route("/static/{*path}", get(static_handler))
        .layer(CompressionLayer::new())
        .with_state(state.clone());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid host:port")?;

    let url = match &state.config.admin_token {
        Some(token) if state.config.access_check => {
            format!("http://{}:{}/update.php?token={}", args.host, args.port, token)
        }
        _ => format!("http://{}:{}/update.php", args.host, args.port),
    };
    println!("Serving update pages at http://{}:{}/update.php", args.host, args.port);

    if !args.no_browser && open::that(&url).is_err() {
        eprintln!("Could not open browser automatically. Visit: {}", url);
    }

    println!("Press Ctrl+C to stop.\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}:{}", args.host, args.port))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        eprintln!("[warn] Could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Entry point for every update page
async fn update_handler(
    State(state): State<Arc<AppState>>,
    method: HttpMethod,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let timer = RequestTimer::start();
    let cookies = parse_cookies(&headers);
    let mut set_cookies = Vec::new();

    let session_id = match cookies
        .get(SESSION_COOKIE)
        .filter(|id| validate_session_id(id).is_ok())
    {
        Some(id) => id.clone(),
        None => {
            let id = Uuid::new_v4().to_string();
            set_cookies.push(cookie(SESSION_COOKIE, &id));
            id
        }
    };

    let is_admin = match query.get("token") {
        Some(token) if state.config.is_admin_token(token) => {
            set_cookies.push(cookie(ADMIN_COOKIE, token));
            true
        }
        _ => cookies
            .get(ADMIN_COOKIE)
            .is_some_and(|token| state.config.is_admin_token(token)),
    };

    let method = match method {
        HttpMethod::GET => Method::Get,
        HttpMethod::POST => Method::Post,
        _ => Method::Other,
    };
    // GET forms are read from the query string, which `query` already holds
    let form = match form {
        Ok(Form(fields)) if method == Method::Post => fields,
        Ok(_) => Vec::new(),
        Err(e) => {
            eprintln!("[warn] Ignoring malformed form body: {}", e);
            Vec::new()
        }
    };

    let request = PageRequest::from_params(method, is_admin, &query, form);
    match state.controller.handle(&session_id, &request, &timer).await {
        Ok(page) => into_http_response(page, &set_cookies),
        Err(e) => {
            eprintln!("[error] {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve files from the embedded `static/` directory
async fn static_handler(Path(path): Path<String>) -> impl IntoResponse {
    match StaticAssets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime),
                    (header::CACHE_CONTROL, "no-cache".to_string()),
                ],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

fn cookie(name: &str, value: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, value)
}

/// Collect `name=value` pairs from every Cookie header
fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn into_http_response(page: PageResponse, set_cookies: &[String]) -> Response {
    let status = StatusCode::from_u16(page.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut headers = HeaderMap::new();
    for value in set_cookies {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.append(header::SET_COOKIE, value);
        }
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    let body = match page {
        PageResponse::Html { body, refresh, .. } => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            if let Some(target) = refresh {
                if let Ok(value) = HeaderValue::from_str(&format!("0; URL={}", target)) {
                    headers.insert(HeaderName::from_static("refresh"), value);
                }
            }
            body
        }
        PageResponse::Text { body, .. } => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            body
        }
    };

    (status, headers, body).into_response()
}
