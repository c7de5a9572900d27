use super::handler::{self, AuthQuery};
use crate::application_port::AuthService;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

// Path before method, so an unknown path is a 404 rather than a 405.
pub fn routes(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let authenticate = warp::path("auth")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<AuthQuery>())
        .and(with(auth_service.clone()))
        .and_then(handler::authenticate);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with(auth_service))
        .and_then(handler::refresh);

    authenticate.or(refresh)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}
