use std::convert::Infallible;

use tracing::info;
use warp::Filter;
use warp::Reply;

use super::handlers;
use super::limited_body;
use super::with_auth;
use super::KvService;
use crate::AuthConfig;

fn with_service(service: KvService) -> impl Filter<Extract = (KvService,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

/// The complete HTTP surface:
///
/// - `GET /kv/{key}`, `PUT /kv/{key}`, `DELETE /kv/{key}`
/// - `GET /watch/{key}[?prefix=true]`
///
/// all behind the bearer-token gate, with rejections rendered as status
/// responses and one log line per request.
pub fn routes(
    service: KvService,
    auth: &AuthConfig,
    max_body_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let kv_get = warp::path!("kv" / String)
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(handlers::get_value);

    let kv_put = warp::path!("kv" / String)
        .and(warp::put())
        .and(limited_body(max_body_bytes))
        .and(with_service(service.clone()))
        .and_then(handlers::put_value);

    let kv_delete = warp::path!("kv" / String)
        .and(warp::delete())
        .and(with_service(service.clone()))
        .and_then(handlers::delete_value);

    let watch = warp::path!("watch" / String)
        .and(warp::get())
        .and(warp::query::<handlers::WatchQuery>())
        .and(with_service(service))
        .and_then(handlers::watch_key);

    with_auth(auth)
        .and(kv_get.or(kv_put).unify().or(kv_delete).unify().or(watch).unify())
        .recover(handlers::handle_rejection)
        .unify()
        .with(warp::log::custom(|log: warp::log::Info<'_>| {
            info!(
                method = %log.method(),
                path = log.path(),
                status = log.status().as_u16(),
                elapsed_ms = log.elapsed().as_millis() as u64,
                "request"
            );
        }))
}
