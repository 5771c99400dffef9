//! Analysis service module
//!
//! Async entry point for callers that must stay responsive while a long
//! batch run executes. The whole analysis is one blocking unit of work with
//! no internal suspension points, so it is shipped to the runtime's blocking
//! pool and awaited to completion.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::engine;
use crate::models::AnalysisResult;
use crate::source::TimeWindow;

/// Run a complete analysis off the caller's thread.
///
/// Supplying no sources is the one fatal precondition and fails before any
/// processing begins; everything source-level after that is reported inside
/// the result instead.
pub async fn run_analysis(paths: Vec<PathBuf>, window: TimeWindow) -> Result<AnalysisResult> {
    if paths.is_empty() {
        bail!("no event log sources were provided");
    }

    tokio::task::spawn_blocking(move || engine::analyze_paths(&paths, window))
        .await
        .context("analysis task failed")
}
