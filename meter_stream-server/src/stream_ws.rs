use std::{
    convert::Infallible,
    sync::{Arc, atomic::{AtomicU64, Ordering}},
};
use futures_util::{SinkExt, future};
use log::{info, warn};
use meter_stream_lib::{Context, Generator, Session};
use warp::{
    Filter, Rejection, Reply,
    http::StatusCode,
    ws::{Message as WsMsg, WebSocket},
};
use crate::config::OriginPolicy;

/// Builds the random source for each new session.
pub type GeneratorFactory = Arc<dyn Fn() -> Generator + Send + Sync>;

/// Everything a `/random` upgrade needs to start a session.
#[derive(Clone)]
pub struct StreamState {
    pub ctx:        Context,
    pub origins:    OriginPolicy,
    pub generators: GeneratorFactory,
    next_id:        Arc<AtomicU64>,
}

impl StreamState {
    pub fn new(ctx: Context, origins: OriginPolicy) -> Self {
        Self::with_generators(ctx, origins, Arc::new(Generator::from_entropy))
    }

    pub fn with_generators(ctx: Context, origins: OriginPolicy, generators: GeneratorFactory) -> Self {
        Self { ctx, origins, generators, next_id: Arc::new(AtomicU64::new(1)) }
    }
}

/// Rejection for an `Origin` the policy does not allow.
#[derive(Debug)]
pub struct OriginRejected;

impl warp::reject::Reject for OriginRejected {}

/// Cloneable filter for session state
fn with_state(
    state: StreamState,
) -> impl Filter<Extract = (StreamState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Rejects the handshake before upgrading when the `Origin` is not allowed.
fn check_origin(
    policy: OriginPolicy,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>("origin")
        .and_then(move |origin: Option<String>| {
            let allowed = policy.allows(origin.as_deref());
            async move {
                if allowed {
                    Ok(())
                } else {
                    warn!("Upgrade refused for origin {:?}", origin);
                    Err(warp::reject::custom(OriginRejected))
                }
            }
        })
        .untuple_one()
}

/// Build the WebSocket route under `/random`
pub fn stream_route(
    state: StreamState,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("random")
        .and(check_origin(state.origins.clone()))
        .and(warp::ws())
        .and(with_state(state))
        .map(|ws: warp::ws::Ws, state: StreamState| {
            ws.on_upgrade(move |socket| handle_ws(socket, state))
        })
        .recover(upgrade_failed)
}

/// A failed handshake on `/random` ends here; other paths fall through.
async fn upgrade_failed(err: Rejection) -> Result<warp::reply::Response, Rejection> {
    if err.is_not_found() {
        return Err(err);
    }
    if err.find::<OriginRejected>().is_some() {
        return Ok(StatusCode::FORBIDDEN.into_response());
    }
    warn!("Upgrade: {:?}", err);
    Ok(warp::reply::with_status("websocket upgrade required", StatusCode::BAD_REQUEST)
        .into_response())
}

async fn handle_ws(ws: WebSocket, state: StreamState) {
    let id = state.next_id.fetch_add(1, Ordering::Relaxed);

    // send-only: frames leave as text, nothing is read back
    let sink = ws.with(|frame: String| future::ready(Ok::<_, warp::Error>(WsMsg::text(frame))));
    let session = Session::new(id, Box::pin(sink), (state.generators)(), state.ctx.subscribe());

    match session.run().await {
        Ok(sent) => info!("session {}: stopped for shutdown after {} frames", id, sent),
        Err(e) => warn!("session {}: {}", id, e),
    }
}
