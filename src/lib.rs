//! # StreamLab-RS: Stream Pipeline Lab
//!
//! A desktop lab for stream processing pipelines. The user edits a pipeline
//! configuration and some sample input, compiles the configuration into an
//! engine, runs the input through it and reads the results in an output log.
//! Sessions can be shared through a remote service as a link.
//!
//! ## Architecture
//!
//! - **Session**: [`session::SessionController`] owns the buffers, the output
//!   log and the engine, and tracks whether the engine matches the config
//! - **Engine**: [`engine::ComputeEngine`] is the narrow engine surface;
//!   [`engine::LocalEngine`] runs YAML pipelines with Rhai script processors
//! - **Share**: [`share::HttpShareService`] uploads sessions to the service
//! - **Bridge**: [`bridge::LabBridge`] runs async actions on a worker thread
//! - **Frontend**: eframe/egui UI that renders session snapshots
//!
//! ## Configuration
//!
//! Application config (`streamlab.toml`) and user settings (`settings.json`)
//! live in the platform data directory under `dev.streamlab.lab`:
//!
//! - **Linux**: `~/.local/share/dev.streamlab.lab/`
//! - **macOS**: `~/Library/Application Support/dev.streamlab.lab/`
//! - **Windows**: `%APPDATA%\dev.streamlab.lab\`
//!
//! ## Example
//!
//! ```ignore
//! use streamlab_rs::{app::launch_session, config::AppConfig, session::SessionOptions};
//!
//! let session = launch_session(AppConfig::default(), SessionOptions::default()).await?;
//! session.set_input("hello\nworld");
//! session.request_execute().await;
//! for entry in session.log().entries() {
//!     println!("{}", entry.text);
//! }
//! ```

pub mod app;
pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod session;
pub mod share;

// Re-export commonly used types
pub use app::{launch_session, LabApp};
pub use config::AppConfig;
pub use engine::{ComputeEngine, LocalEngine};
pub use error::{LabError, Result};
pub use session::{OutputLog, SessionController};
