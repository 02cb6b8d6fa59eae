//! Request tracing and the outermost fault boundary.
//!
//! Every request gets a [`TraceId`] (taken from an incoming `x-trace-id`
//! header when it is a valid UUID). Error responses leaving the app are
//! always JSON and carry that id.

use std::fmt;

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::error::InternalError;
use actix_web::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::ErrorResponse;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Correlation id attached to logs and error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The id assigned by [`fault_boundary`], or a fresh one when the
    /// middleware is not installed.
    pub fn of(req: &HttpRequest) -> Self {
        req.extensions()
            .get::<TraceId>()
            .copied()
            .unwrap_or_default()
    }

    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(Self)
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromRequest for TraceId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(TraceId::of(req)))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Rewrite framework-generated error responses (404, 405, ...) as JSON.
/// Server errors lose their original body.
fn ensure_json_error(
    res: ServiceResponse<BoxBody>,
    trace_id: &TraceId,
) -> ServiceResponse<BoxBody> {
    let status = res.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(res.headers()) {
        return res;
    }

    let body = if status.is_server_error() {
        ErrorResponse::internal_error()
    } else {
        ErrorResponse::new(status.canonical_reason().unwrap_or("Erro na requisição"))
    };

    let (req, _) = res.into_parts();
    ServiceResponse::new(req, HttpResponse::build(status).json(body.with_trace_id(trace_id)))
}

/// Outermost middleware: assigns the trace id, turns any error escaping the
/// inner services into a JSON response, and echoes the id in `x-trace-id`.
pub async fn fault_boundary(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let trace_id = TraceId::from_headers(req.headers()).unwrap_or_default();
    req.extensions_mut().insert(trace_id);

    match next.call(req).await {
        Ok(res) => {
            let mut res = ensure_json_error(res.map_into_boxed_body(), &trace_id);
            res.headers_mut()
                .insert(HeaderName::from_static(TRACE_ID_HEADER), trace_header(&trace_id));
            Ok(res)
        }
        Err(err) => {
            let status = err.as_response_error().status_code();
            log::error!(
                "Erro não tratado capturado pela camada global (trace {}): {}",
                trace_id,
                err
            );
            let body = if status.is_client_error() {
                ErrorResponse::new(status.canonical_reason().unwrap_or("Erro na requisição"))
                    .with_message(err.to_string())
            } else {
                ErrorResponse::internal_error()
            };
            let response = HttpResponse::build(status)
                .insert_header((
                    HeaderName::from_static(TRACE_ID_HEADER),
                    trace_header(&trace_id),
                ))
                .json(body.with_trace_id(&trace_id));
            Err(InternalError::from_response(err.to_string(), response).into())
        }
    }
}

fn trace_header(trace_id: &TraceId) -> HeaderValue {
    // A hyphenated UUID is always a valid header value.
    HeaderValue::from_str(&trace_id.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}
