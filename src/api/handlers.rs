use std::convert::Infallible;

use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;
use warp::http::header::CONTENT_TYPE;
use warp::http::HeaderValue;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Rejection;
use warp::Reply;

use super::ApiError;
use super::KvService;
use crate::metrics::record_kv_request;
use crate::WatchOutcome;
use crate::WatchTarget;

/// Response header naming the kind of change: `put` or `delete`
pub const WATCH_EVENT_HEADER: &str = "x-watch-event";
/// Response header carrying the key that changed
pub const WATCH_KEY_HEADER: &str = "x-watch-key";

#[derive(Debug, Default, Deserialize)]
pub struct WatchQuery {
    /// Watch every key starting with the path key instead of the key itself
    #[serde(default)]
    pub prefix: bool,
}

fn no_content() -> Response {
    warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response()
}

fn octet_stream(value: Bytes) -> Response {
    let mut response = Response::new(value.into());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    response
}

fn reject(
    op: &str,
    err: ApiError,
) -> Rejection {
    record_kv_request(op, err.status_code().as_u16());
    warp::reject::custom(err)
}

/// `GET /kv/{key}`
pub async fn get_value(
    key: String,
    service: KvService,
) -> Result<Response, Rejection> {
    match service.get(key.as_bytes()) {
        Ok(value) => {
            record_kv_request("get", 200);
            Ok(octet_stream(value))
        }
        Err(e) => Err(reject("get", ApiError::from_storage("read", e))),
    }
}

/// `PUT /kv/{key}`
pub async fn put_value(
    key: String,
    body: Bytes,
    service: KvService,
) -> Result<Response, Rejection> {
    if let Err(e) = service.put(Bytes::from(key), body) {
        warn!("put failed: {}", e);
        return Err(reject("put", ApiError::from_storage("store", e)));
    }
    record_kv_request("put", 204);
    Ok(no_content())
}

/// `DELETE /kv/{key}`
pub async fn delete_value(
    key: String,
    service: KvService,
) -> Result<Response, Rejection> {
    if let Err(e) = service.delete(Bytes::from(key)) {
        warn!("delete failed: {}", e);
        return Err(reject("delete", ApiError::from_storage("delete", e)));
    }
    record_kv_request("delete", 204);
    Ok(no_content())
}

/// `GET /watch/{key}[?prefix=true]`
///
/// 200 with the new value on delivery (empty body for a deletion), 204 when
/// nothing changed before the timeout or the server is shutting down.
pub async fn watch_key(
    key: String,
    query: WatchQuery,
    service: KvService,
) -> Result<Response, Rejection> {
    let key = Bytes::from(key);
    let target = if query.prefix {
        WatchTarget::Prefix(key)
    } else {
        WatchTarget::Key(key)
    };

    let response = match service.watch(target).await {
        WatchOutcome::Delivered(event) => {
            let mut response = octet_stream(event.value.clone());
            let headers = response.headers_mut();
            headers.insert(
                WATCH_EVENT_HEADER,
                HeaderValue::from_static(event.event_type.as_str()),
            );
            match HeaderValue::from_bytes(&event.key) {
                Ok(value) => {
                    headers.insert(WATCH_KEY_HEADER, value);
                }
                Err(_) => debug!(key = ?event.key, "changed key is not a valid header value"),
            }
            response
        }
        WatchOutcome::TimedOut | WatchOutcome::Disconnected => no_content(),
    };
    Ok(response)
}

/// Maps warp's request-parsing rejections onto [`ApiError::BadRequest`].
fn bad_request(err: &Rejection) -> Option<ApiError> {
    if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        return Some(ApiError::BadRequest(e.to_string()));
    }
    if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        return Some(ApiError::BadRequest(e.to_string()));
    }
    None
}

/// Turns every rejection into a plain-text status response.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if let Some(api_err) = err.find::<ApiError>() {
        (api_err.status_code(), api_err.to_string())
    } else if let Some(api_err) = bad_request(&err) {
        record_kv_request("request", api_err.status_code().as_u16());
        (api_err.status_code(), api_err.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        debug!(?err, "unhandled rejection");
        (StatusCode::BAD_REQUEST, "Bad request".to_string())
    };

    Ok(warp::reply::with_status(message, status).into_response())
}
