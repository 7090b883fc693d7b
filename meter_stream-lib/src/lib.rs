//! meter_stream-lib: synthetic meter readings, per-connection streaming sessions,
//! and contained static-file lookup

pub mod context;
pub mod generator;
pub mod message;
pub mod session;
pub mod static_files;

// re-exports for ergonomic imports:
pub use context::Context;
pub use generator::Generator;
pub use message::Reading;
pub use session::{Session, SessionError};
pub use static_files::StaticError;
