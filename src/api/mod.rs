//! HTTP surface of the store, built on warp.
//!
//! | Route               | Success                  | Failure              |
//! |---------------------|--------------------------|----------------------|
//! | `GET /kv/{key}`     | 200 + value              | 404, 500             |
//! | `PUT /kv/{key}`     | 204, then watchers fire  | 400, 413, 500        |
//! | `DELETE /kv/{key}`  | 204, then watchers fire  | 500                  |
//! | `GET /watch/{key}`  | 200 + value, 204 timeout | -                    |
//!
//! Every route answers 403 unless `Authorization: Bearer <token>` matches.

mod auth;
mod body;
mod errors;
mod handlers;
mod kv_service;
mod routes;

pub use auth::*;
pub use body::limited_body;
pub use errors::*;
pub use handlers::WatchQuery;
pub use handlers::WATCH_EVENT_HEADER;
pub use handlers::WATCH_KEY_HEADER;
pub use kv_service::*;
pub use routes::*;
