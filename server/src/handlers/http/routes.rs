use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use tower::ServiceBuilder;
use tower::util::{BoxCloneService, service_fn};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, error, info, warn};

use shared::types::{CorsConfig, OperationRequest, OperationResponse, duplicate_response_key};

use crate::App;
use crate::auth::context::RequestContext;
use crate::auth::session::SESSION_COOKIE;
use crate::handlers::executor::{CookieDirective, OperationExecutor};
use crate::handlers::http::utils::headers::{create_session_cookie, delete_cookie};
use crate::handlers::http::utils::json_response::{
    JsonResponse, deliver_error_json, deliver_serialized_json, full, internal_error_fallback,
};
use crate::tower_middle::TimeoutLayer;

pub const OPERATIONS_PATH: &str = "/graphql";
pub const HEALTH_PATH: &str = "/health";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Route one HTTP request.
///
/// Only `/graphql` and `/health` exist. Everything the client can get wrong
/// inside an operation is reported in the 200 envelope; transport failures
/// (path, method, body) get their own status codes.
pub async fn handle_request<B>(req: Request<B>, app: App) -> Result<JsonResponse>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("{} {}", method, path);

    match (method, path.as_str()) {
        (Method::POST, OPERATIONS_PATH) => handle_operations(req, app).await,
        (_, OPERATIONS_PATH) => method_not_allowed(),
        (Method::GET, HEALTH_PATH) => health(),
        _ => not_found(),
    }
}

async fn handle_operations<B>(req: Request<B>, app: App) -> Result<JsonResponse>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Display,
{
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return bad_request("Could not read request body");
        }
    };

    let request: OperationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected malformed operation envelope: {}", e);
            return bad_request("Malformed operation envelope");
        }
    };

    let invocations = request.into_invocations();
    if invocations.is_empty() {
        return bad_request("No operations requested");
    }
    if let Some(key) = duplicate_response_key(&invocations) {
        warn!("Rejected batch with duplicate response key {}", key);
        return bad_request(&format!(
            "Duplicate operation key '{}'; give repeated operations an alias",
            key
        ));
    }

    // Resolved exactly once; every invocation below shares it.
    let session = app.state.sessions.resolve(&parts.headers).await;

    let ctx = Arc::new(RequestContext::from_session(session));
    let mut response = OperationResponse::default();
    let mut cookies = Vec::new();

    for invocation in invocations {
        let key = invocation.response_key().to_string();
        match app.executor.execute(Arc::clone(&ctx), invocation).await {
            Ok(output) => {
                response.push_ok(&key, output.value);
                cookies.extend(output.cookies);
            }
            Err(e) => {
                if e.is_authorization_denial() {
                    info!("Operation {} denied: {}", key, e.to_code());
                }
                response.push_error(&key, e.to_code(), e.to_message());
            }
        }
    }

    let mut res = deliver_serialized_json(&response, StatusCode::OK)?;
    let secure = app.state.settings.cookie_secure;

    for directive in cookies {
        let value = match directive {
            CookieDirective::SetSession(token) => {
                create_session_cookie(SESSION_COOKIE, &token, secure)
            }
            CookieDirective::ClearSession => delete_cookie(SESSION_COOKIE, secure),
        }
        .context("Failed to build session cookie")?;

        res.headers_mut().append(header::SET_COOKIE, value);
    }

    Ok(res)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn health() -> Result<JsonResponse> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(r#"{"status":"success","health":"ok"}"#))
        .context("Failed to build health response")
}

fn bad_request(message: &str) -> Result<JsonResponse> {
    deliver_error_json("BAD_REQUEST", message, StatusCode::BAD_REQUEST)
        .context("Failed to deliver 400 response")
}

fn method_not_allowed() -> Result<JsonResponse> {
    let mut res = deliver_error_json(
        "METHOD_NOT_ALLOWED",
        "Use POST for operations",
        StatusCode::METHOD_NOT_ALLOWED,
    )
    .context("Failed to deliver 405 response")?;
    res.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("POST"));
    Ok(res)
}

fn not_found() -> Result<JsonResponse> {
    deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
        .context("Failed to deliver 404 response")
}

/// [`handle_request`] with every error turned into a 500.
pub async fn serve_request<B>(req: Request<B>, app: App) -> Result<JsonResponse, Infallible>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Display,
{
    match handle_request(req, app).await {
        Ok(res) => Ok(res),
        Err(e) => {
            error!("Request failed: {:#}", e);
            Ok(deliver_error_json(
                "INTERNAL_ERROR",
                "An internal error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .unwrap_or_else(|_| internal_error_fallback()))
        }
    }
}

// ---------------------------------------------------------------------------
// Service stack
// ---------------------------------------------------------------------------

pub type HttpService<B> = BoxCloneService<Request<B>, JsonResponse, Infallible>;

/// The full per-connection service: CORS → timeout → dispatch.
pub fn build_service<B>(app: App, cors: &CorsConfig, timeout: Duration) -> Result<HttpService<B>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Display,
{
    let origin: HeaderValue = cors
        .allowed_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin: {}", cors.allowed_origin))?;

    let cors_layer = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let service = ServiceBuilder::new()
        .layer(cors_layer)
        .layer(TimeoutLayer::new(timeout))
        .service(service_fn(move |req: Request<B>| serve_request(req, app.clone())));

    Ok(BoxCloneService::new(service))
}
