//! Request body reading with a size cap.
//!
//! The cap applies to the bytes actually received, so chunked uploads are
//! accepted as long as they stay under it. A declared `Content-Length` over
//! the cap is refused before any byte is read.

use bytes::Buf;
use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;
use futures::Stream;
use futures::TryStreamExt;
use warp::Filter;
use warp::Rejection;

use super::ApiError;

/// Extracts the whole body, rejecting with [`ApiError::PayloadTooLarge`]
/// past `max_bytes` and [`ApiError::BadRequest`] if the transfer breaks off.
pub fn limited_body(max_bytes: u64) -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::header::optional::<u64>("content-length")
        .and(warp::body::stream())
        .and_then(move |declared: Option<u64>, stream| async move {
            if declared.is_some_and(|len| len > max_bytes) {
                return Err(warp::reject::custom(ApiError::PayloadTooLarge));
            }
            collect_limited(stream, max_bytes).await.map_err(warp::reject::custom)
        })
}

pub(super) async fn collect_limited<S, B, E>(
    stream: S,
    max_bytes: u64,
) -> Result<Bytes, ApiError>
where
    S: Stream<Item = Result<B, E>>,
    B: Buf,
    E: std::fmt::Display,
{
    futures::pin_mut!(stream);
    let mut body = BytesMut::new();
    while let Some(chunk) = stream
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if (body.len() + chunk.remaining()) as u64 > max_bytes {
            return Err(ApiError::PayloadTooLarge);
        }
        body.put(chunk);
    }
    Ok(body.freeze())
}
