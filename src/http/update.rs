//! Update handler: request → UpdateJob → worker → response.
//!
//! Parameters are collected in increasing precedence:
//! uploaded files, body parameters, query parameters.

use axum::{
    body::Body,
    extract::{multipart::MultipartError, FromRequest, Multipart, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use std::time::Instant;

use crate::editor::{Upload, UpdateJob, UpdateSet, UpdateValue};
use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Handles every method and path.
pub async fn update_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request.headers().request_id();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(request_id = %request_id, method = %method, path = %path, "Update request");

    let response = match apply_update(&state, request).await {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            tracing::warn!(request_id = %request_id, status = %e.status(), error = %e, "Update failed");
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

async fn apply_update(state: &AppState, request: Request<Body>) -> Result<String, ApiError> {
    let job = collect_job(request, state.max_body_size).await?;
    let outcome = state.updates.submit(job).await?;
    Ok(outcome.status().unwrap_or_default().to_string())
}

/// Build the job for one request.
pub async fn collect_job(request: Request<Body>, body_limit: usize) -> Result<UpdateJob, ApiError> {
    let query = request
        .uri()
        .query()
        .map(|q| parse_urlencoded(q.as_bytes()))
        .unwrap_or_default();
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut job = UpdateJob::default();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, body_limit))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if field.file_name().is_some() {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, body_limit))?;
                if !data.is_empty() {
                    job.uploads.push(Upload { name, data: data.to_vec() });
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, body_limit))?;
                job.updates.insert_raw(name, &text);
            }
        }
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), body_limit)
            .await
            .map_err(|e| match e.into_inner().downcast::<LengthLimitError>() {
                Ok(_) => ApiError::PayloadTooLarge(body_limit),
                Err(e) => ApiError::BadRequest(format!("failed to read body: {}", e)),
            })?;
        if !bytes.is_empty() {
            job.updates = if content_type.starts_with("application/json") {
                parse_json(&bytes)?
            } else {
                parse_urlencoded(&bytes)
            };
        }
    }

    job.updates.extend(query);
    Ok(job)
}

fn multipart_error(e: MultipartError, body_limit: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(body_limit)
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// Parse `application/x-www-form-urlencoded` pairs.
pub fn parse_urlencoded(input: &[u8]) -> UpdateSet {
    let mut set = UpdateSet::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        set.insert_raw(key.into_owned(), &value);
    }
    set
}

/// Parse a flat JSON object. `null` deletes; scalars are stringified.
pub fn parse_json(input: &[u8]) -> Result<UpdateSet, ApiError> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(input)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON object: {}", e)))?;

    let mut set = UpdateSet::new();
    for (key, value) in object {
        let value = match value {
            serde_json::Value::Null => UpdateValue::Delete,
            serde_json::Value::String(s) => UpdateValue::from_input(Some(&s)),
            serde_json::Value::Bool(b) => UpdateValue::Set(b.to_string()),
            serde_json::Value::Number(n) => UpdateValue::Set(n.to_string()),
            _ => {
                return Err(ApiError::BadRequest(format!(
                    "value for `{}` must be a scalar",
                    key
                )))
            }
        };
        set.insert(key, value);
    }
    Ok(set)
}
