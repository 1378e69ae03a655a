// Library root
// -----------
// The binary (`main.rs`) only parses arguments and hands them to `ui`;
// everything else lives here so it can be tested without a terminal.
//
// Module responsibilities:
// - `search`: image lookup against the Pexels API.
// - `storage`: downloads images and rehosts them on S3.
// - `content`: paragraph splitting and HTML assembly.
// - `auth`: OAuth token lifecycle and the pending-authorization marker.
// - `blogger`: post insertion through the Blogger API.
// - `pipeline`: runs the stages above in order.
// - `cli` / `ui`: argument parsing and terminal interaction.
pub mod auth;
pub mod blogger;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod pipeline;
pub mod search;
pub mod storage;
pub mod ui;

pub use error::{PipelineError, Result};
