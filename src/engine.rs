//! Analysis engine module
//!
//! Drives the single batch pass: drains each source in turn, gates every
//! record through the time window and the noise filter, renders descriptions
//! for identifiers worth the cost (with a per-run cache of providers whose
//! templates cannot be resolved), classifies, and applies the outcome to the
//! run state. Source failures are recorded in that source's summary and the
//! run continues.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::classifier::Classifier;
use crate::models::{AnalysisResult, EventRecord, FullLogEntry, MessageState};
use crate::noise;
use crate::report;
use crate::source::{JsonlSource, RecordSource, TimeWindow};
use crate::state::{RunState, SourceError, SourceSummary};
use crate::taxonomy::Taxonomy;

pub struct Engine<'a> {
    taxonomy: &'a Taxonomy,
    classifier: Classifier<'a>,
    window: TimeWindow,
    state: RunState,
    /// Providers whose description formatting failed once; never asked again
    /// for the rest of the run.
    failed_providers: HashSet<String>,
}

impl<'a> Engine<'a> {
    pub fn new(taxonomy: &'a Taxonomy, window: TimeWindow) -> Self {
        Self {
            taxonomy,
            classifier: Classifier::new(taxonomy),
            window,
            state: RunState::new(),
            failed_providers: HashSet::new(),
        }
    }

    /// Process one source file. A missing or unopenable file becomes a note
    /// in its summary, never a run failure.
    pub fn process_path(&mut self, path: &Path) {
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().to_uppercase())
            .unwrap_or_else(|| path.display().to_string());
        let mut summary = SourceSummary::new(path.display().to_string(), label);

        if !path.exists() {
            warn!(path = %path.display(), "source file not found");
            summary.error = Some(SourceError::NotFound);
            self.state.sources.push(summary);
            return;
        }

        match JsonlSource::open(path) {
            Ok(mut source) => self.drain(&mut source, &mut summary),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot open source");
                summary.error = Some(SourceError::Read(format!("{err:#}")));
            }
        }
        self.state.sources.push(summary);
    }

    /// Process an already-open source (in-memory records, embedding).
    pub fn process_source(&mut self, source: &mut dyn RecordSource) {
        let label = source.label().to_string();
        let mut summary = SourceSummary::new(label.clone(), label);
        self.drain(source, &mut summary);
        self.state.sources.push(summary);
    }

    fn drain(&mut self, source: &mut dyn RecordSource, summary: &mut SourceSummary) {
        while let Some(next) = source.next_record() {
            match next {
                Ok(record) => self.process_record(&record, summary),
                Err(err) => {
                    warn!(source = %summary.label, error = %err, "source read failed, moving on");
                    summary.error = Some(SourceError::Read(format!("{err:#}")));
                    return;
                }
            }
        }
    }

    fn process_record(&mut self, record: &EventRecord, summary: &mut SourceSummary) {
        // Records without a timestamp cannot be placed anywhere; skip them
        // before they touch any counter.
        let Some(time) = record.time else {
            debug!(event_id = record.event_id, "record without timestamp skipped");
            return;
        };
        if !self.window.contains(time) {
            return;
        }

        if !record.host.is_empty() {
            self.state.hosts.insert(&record.host);
        }

        let verdict = noise::inspect(record);
        if let Some(user) = &verdict.user {
            self.state.users.insert(user);
        }
        if verdict.noise {
            summary.skipped += 1;
            return;
        }

        self.state.full_log.push(FullLogEntry {
            time,
            event_id: record.event_id,
            source_or_category: source_or_category(record),
        });
        summary.processed += 1;

        let message = if self.taxonomy.is_interesting(record.event_id) {
            self.render_message(record)
        } else {
            String::new()
        };

        let classification = self
            .classifier
            .classify(record.event_id, record.provider_name());
        self.state
            .apply(record, time, &classification, &message, self.taxonomy, summary);
    }

    /// Description text for one record, or empty when none can be had. One
    /// formatting failure marks the provider permanently unformattable.
    fn render_message(&mut self, record: &EventRecord) -> String {
        let provider = record.provider_name();
        if self.failed_providers.contains(provider) {
            return String::new();
        }
        match record.message_state() {
            MessageState::Rendered(text) => text.to_string(),
            MessageState::Failed => {
                debug!(provider, "description formatting failed, caching provider");
                self.failed_providers.insert(provider.to_string());
                String::new()
            }
            MessageState::Absent => String::new(),
        }
    }

    /// Final aggregated state (rendering input; also used by tests).
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Render the report and hand the run's terminal state to the caller.
    pub fn finish(self) -> AnalysisResult {
        let report = report::render(&self.state, self.taxonomy);
        AnalysisResult {
            report,
            timeline: self.state.timeline,
            full_log: self.state.full_log,
        }
    }
}

/// Column three of the full export: provider name, or the resolved task
/// category for Security-log records, falling back to the literal
/// "Security" when resolution failed.
fn source_or_category(record: &EventRecord) -> String {
    if record.is_security_channel() {
        if record.task_failed {
            return "Security".to_string();
        }
        if let Some(task) = record.task.as_deref().filter(|task| !task.is_empty()) {
            return task.to_string();
        }
    }
    record.provider_name().to_string()
}

/// Run a complete analysis over the given source files.
pub fn analyze_paths(paths: &[PathBuf], window: TimeWindow) -> AnalysisResult {
    let taxonomy = Taxonomy::new();
    let mut engine = Engine::new(&taxonomy, window);
    for path in paths {
        engine.process_path(path);
    }
    engine.finish()
}
