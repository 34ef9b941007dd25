//! Bearer-token gate in front of every route.

use std::sync::Arc;

use tracing::debug;
use warp::Filter;
use warp::Rejection;

use super::ApiError;
use crate::AuthConfig;

/// Passes requests whose `Authorization` header is exactly `Bearer <token>`,
/// rejects everything else with [`ApiError::Forbidden`].
pub fn with_auth(config: &AuthConfig) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    let expected: Arc<str> = Arc::from(config.expected_header());

    warp::header::optional::<String>("authorization")
        .and_then(move |header: Option<String>| {
            let expected = expected.clone();
            async move {
                match header {
                    Some(value) if value.as_str() == &*expected => Ok(()),
                    Some(_) => {
                        debug!("rejecting request with mismatched bearer token");
                        Err(warp::reject::custom(ApiError::Forbidden))
                    }
                    None => {
                        debug!("rejecting request without authorization header");
                        Err(warp::reject::custom(ApiError::Forbidden))
                    }
                }
            }
        })
        .untuple_one()
}
