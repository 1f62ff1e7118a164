//! WhatsApp number checker.
//!
//! A small HTTP service that:
//! - Keeps one logged-in WhatsApp session, pairing a device by QR code on first run
//! - Answers `GET /check?number=...` with whether the number has an account
//! - Serves the bundled web frontend, redirecting unknown paths to `/`

pub mod api;
pub mod assets;
pub mod config;
pub mod error;
pub mod server;
pub mod session;

pub use assets::AssetBundle;
pub use config::Config;
pub use error::{AssetError, CheckError, ServerError, SessionError};
pub use server::{RunningServer, Server, ShutdownOutcome, SHUTDOWN_DEADLINE};
pub use session::{ConnectionManager, ConnectionState};
