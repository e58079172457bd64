use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;

use crate::extractor::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};

/// Free-text fields that may carry personal circumstances of a candidate.
const REDACTED_FIELDS: [&str; 5] = [
    "remarks",
    "trainer_notes",
    "dropout_remark",
    "feedback",
    "notes",
];

const REDACTED: &str = "[REDACTED]";

fn should_ignore_path(path: &str) -> bool {
    path.starts_with("/health") || path.starts_with("/swagger-ui") || path.starts_with("/api-docs")
}

/// Redacts sensitive fields at any depth; bulk payloads nest records in arrays.
fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) && !field.is_null() {
                    *field = Value::String(REDACTED.to_string());
                } else {
                    redact(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn json_for_log(bytes: &Bytes) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut json) => {
            redact(&mut json);
            json
        }
        Err(_) => Value::Null,
    }
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    for name in [header::AUTHORIZATION, header::COOKIE] {
        if headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(REDACTED));
        }
    }
    headers
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

pub async fn http_logger(
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if should_ignore_path(req.uri().path()) || req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let start_time = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let req_headers = redact_headers(req.headers());
    let is_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let (parts, body) = req.into_parts();
    let bytes = buffer_body("request", body).await?;
    let req_body = if is_json { json_for_log(&bytes) } else { Value::Null };
    let req = Request::from_parts(parts, Body::from(bytes));

    let mut response = next.run(req).await;
    let latency = start_time.elapsed();
    let status = response.status();

    let res_body = if matches!(method, Method::POST | Method::PUT | Method::PATCH) {
        let (parts, body) = response.into_parts();
        let bytes = buffer_body("response", body).await?;
        let json = json_for_log(&bytes);
        response = Response::from_parts(parts, Body::from(bytes));
        json
    } else {
        Value::Null
    };

    tracing::info!(
        method = %method,
        uri = %uri,
        x_request_id = %header_str(&req_headers, "x-request-id"),
        actor_id = %header_str(&req_headers, ACTOR_ID_HEADER),
        actor_role = %header_str(&req_headers, ACTOR_ROLE_HEADER),
        req_headers = ?req_headers,
        req_body = %req_body,
        status = status.as_u16(),
        latency_ms = latency.as_millis(),
        res_body = %res_body,
        "HTTP request completed"
    );

    Ok(response)
}

pub async fn buffer_body<B>(direction: &str, body: B) -> Result<Bytes, (StatusCode, String)>
where
    B: BodyExt,
    B::Error: std::fmt::Display,
{
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|err| {
            (
                StatusCode::BAD_REQUEST,
                format!("failed to read {direction} body: {err}"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_free_text_inside_bulk_records() {
        let mut body = json!({
            "records": [
                {"batch_id": "7", "trainer_notes": "personal circumstances", "remarks": null}
            ],
            "dropout_remark": "moved away"
        });
        redact(&mut body);
        assert_eq!(body["records"][0]["batch_id"], "7");
        assert_eq!(body["records"][0]["trainer_notes"], REDACTED);
        assert_eq!(body["records"][0]["remarks"], Value::Null);
        assert_eq!(body["dropout_remark"], REDACTED);
    }

    #[test]
    fn redacts_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer x"));
        headers.insert(ACTOR_ID_HEADER, HeaderValue::from_static("coordinator-1"));

        let filtered = redact_headers(&headers);
        assert_eq!(filtered[header::AUTHORIZATION], REDACTED);
        assert_eq!(header_str(&filtered, ACTOR_ID_HEADER), "coordinator-1");
    }

    #[test]
    fn skips_health_and_docs() {
        assert!(should_ignore_path("/health"));
        assert!(should_ignore_path("/swagger-ui/index.html"));
        assert!(!should_ignore_path("/api/v1/batches"));
    }

    #[test]
    fn non_json_bodies_log_as_null() {
        assert_eq!(json_for_log(&Bytes::from_static(b"not json")), Value::Null);
    }
}
