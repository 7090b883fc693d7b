use std::{convert::Infallible, path::PathBuf, sync::Arc};
use log::{debug, error, warn};
use meter_stream_lib::{StaticError, static_files};
use warp::{
    Filter, Rejection, Reply,
    http::{Method, StatusCode, header},
    path::Tail,
    reply::Response,
};
use crate::stream_ws::{self, StreamState};

/// `/ping` + `/random` + static fallback, with rejections mapped to statuses.
pub fn routes(
    static_dir: PathBuf,
    stream: StreamState,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    ping()
        .or(stream_ws::stream_route(stream))
        .or(static_files_route(static_dir))
        .recover(handle_rejection)
}

/// Liveness check. Any method gets `Up` except a CORS pre-flight, which gets
/// an empty body; both allow every origin.
fn ping() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("ping")
        .and(warp::method())
        .map(|method: Method| {
            if method == Method::OPTIONS {
                warp::reply().into_response()
            } else {
                "Up".into_response()
            }
        })
        .with(warp::reply::with::header("access-control-allow-origin", "*"))
}

fn static_files_route(
    root: PathBuf,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let root = Arc::new(root);
    warp::get()
        .or(warp::head())
        .unify()
        .and(warp::path::tail())
        .and(warp::any().map(move || root.clone()))
        .and_then(serve_static)
}

async fn serve_static(tail: Tail, root: Arc<PathBuf>) -> Result<Response, Infallible> {
    let response = match static_files::load(&root, tail.as_str()).await {
        Ok(asset) => {
            let content_type = asset.content_type().to_string();
            warp::reply::with_header(asset.bytes, header::CONTENT_TYPE, content_type)
                .into_response()
        }
        Err(StaticError::NotFound) => {
            debug!("static /{}: not found", tail.as_str());
            StatusCode::NOT_FOUND.into_response()
        }
        Err(StaticError::OutsideRoot) => {
            warn!("static /{}: escapes {}", tail.as_str(), root.display());
            StatusCode::FORBIDDEN.into_response()
        }
        Err(StaticError::Io(e)) => {
            error!("static /{}: {}", tail.as_str(), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };
    Ok(response)
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        StatusCode::METHOD_NOT_ALLOWED
    } else {
        error!("unhandled rejection: {:?}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok(status.into_response())
}
