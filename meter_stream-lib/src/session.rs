use std::error::Error as StdError;
use futures::{Sink, SinkExt};
use log::{debug, info, trace};
use rand::{Rng, rngs::StdRng};
use thiserror::Error;
use tokio::sync::watch;
use crate::generator::Generator;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Why a session stopped streaming.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("write failed: {0}")]
    Write(#[source] BoxError),
}

/// Owns one upgraded connection for its whole life and streams readings to it.
///
/// Each tick generates a reading, encodes it as JSON, writes it as one text
/// frame and then sleeps for a random pause. A write only starts after the
/// previous one has been flushed, so frames leave in generation order. The
/// loop ends on the first encode or write failure, or when the shutdown flag
/// is raised; the sink is closed on every exit path.
pub struct Session<S, R = StdRng> {
    id:        u64,
    sink:      S,
    generator: Generator<R>,
    shutdown:  watch::Receiver<bool>,
    sent:      u64,
}

impl<S, R> Session<S, R>
where
    S: Sink<String> + Unpin,
    S::Error: Into<BoxError>,
    R: Rng,
{
    pub fn new(id: u64, sink: S, generator: Generator<R>, shutdown: watch::Receiver<bool>) -> Self {
        Self { id, sink, generator, shutdown, sent: 0 }
    }

    /// Streams until failure or shutdown. `Ok` carries the number of frames
    /// written before a shutdown stopped the loop.
    pub async fn run(mut self) -> Result<u64, SessionError> {
        info!("session {}: streaming", self.id);
        let result = self.stream().await;

        if let Err(e) = self.sink.close().await {
            let e: BoxError = e.into();
            debug!("session {}: close: {}", self.id, e);
        }
        result
    }

    async fn stream(&mut self) -> Result<u64, SessionError> {
        loop {
            if *self.shutdown.borrow() {
                return Ok(self.sent);
            }

            let reading = self.generator.reading();
            trace!("session {}: {:?}", self.id, reading);
            let frame = serde_json::to_string(&reading)?;

            self.sink
                .send(frame)
                .await
                .map_err(|e| SessionError::Write(e.into()))?;
            self.sent += 1;

            let pause = self.generator.pause();
            debug!("session {}: sent #{}, next in {:?}", self.id, self.sent, pause);

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                // a dropped sender means the process is going away too
                _ = self.shutdown.changed() => return Ok(self.sent),
            }
        }
    }
}
