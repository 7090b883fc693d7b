// src/main.rs

mod config;
mod routes;
mod stream_ws;
use dotenv::dotenv;
use std::error::Error;
use log::{info, warn, error};
use meter_stream_lib::Context;
use config::{Config, SHUTDOWN_GRACE};
use stream_ws::StreamState;

/* RUST_LOG=meter_stream_lib=debug,meter_stream_server=info \
cargo run -p meter_stream-server */

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // ──────── ① Optional .env, then logger and panic hook ────────
    let dotenv_loaded = dotenv().is_ok();

    env_logger::init();
    std::panic::set_hook(Box::new(|info| {
        error!("Thread panic: {:?}", info);
    }));
    if !dotenv_loaded {
        info!("No .env file, using process environment only");
    }

    // ──────── ② Static root & origin policy ────────
    let config = Config::from_env()?;
    info!("Static files from {}", config.static_dir.display());
    info!("Stream origin policy: {:?}", config.origins);

    // shared shutdown flag (holds a watch::Sender<bool>)
    let ctx = Context::new();
    let stream = StreamState::new(ctx.clone(), config.origins.clone());
    let app = routes::routes(config.static_dir.clone(), stream);

    // ──────── ③ Serve until Ctrl-C ────────
    let signal_ctx = ctx.clone();
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutting down, closing open streams");
        signal_ctx.shutdown();
    };

    let server = match warp::serve(app).try_bind_with_graceful_shutdown(config.addr, shutdown) {
        Ok((addr, server)) => {
            info!("HTTP  : {} (/ping + static files)", addr);
            info!("WS    : {}/random", addr);
            server
        }
        Err(e) => {
            // logged only; the process does not exit non-zero here
            error!("Failed to bind {}: {}", config.addr, e);
            return Ok(());
        }
    };
    server.await;

    // ──────── ④ Let sessions send their close frames ────────
    if !ctx.drained(SHUTDOWN_GRACE).await {
        warn!("Streams still open after {:?}, dropping them", SHUTDOWN_GRACE);
    }
    Ok(())
}
