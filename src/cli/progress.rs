//! Progress display for enrichment runs
//!
//! Shows one indicatif bar per collection while its features are enriched.
//! When stderr is not a terminal, or progress bars are disabled, a single
//! line per finished collection is printed instead.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::app::enrich::EnrichmentReport;
use crate::app::pipeline::ProgressObserver;

const BAR_TEMPLATE: &str = "{prefix:>16} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable visual progress bars
    pub enable_progress_bars: bool,
    /// Suppress per-source lines in text mode
    pub quiet: bool,
    /// Maximum width for source names in the bar prefix
    pub max_name_width: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            quiet: false,
            max_name_width: 16,
        }
    }
}

/// Progress display for the grid pipeline
pub struct ProgressDisplay {
    config: ProgressConfig,
    current: Option<ProgressBar>,
    is_terminal: bool,
}

impl ProgressDisplay {
    /// Create a new progress display with the given configuration
    pub fn new(config: ProgressConfig) -> Self {
        let is_terminal = atty::is(atty::Stream::Stderr);
        Self {
            config,
            current: None,
            is_terminal,
        }
    }

    fn bars_enabled(&self) -> bool {
        self.config.enable_progress_bars && self.is_terminal && !self.config.quiet
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-")
    }

    fn truncate(&self, name: &str) -> String {
        if name.chars().count() <= self.config.max_name_width {
            return name.to_string();
        }
        let kept: String = name
            .chars()
            .take(self.config.max_name_width.saturating_sub(3))
            .collect();
        format!("{}...", kept)
    }
}

impl ProgressObserver for ProgressDisplay {
    fn source_started(&mut self, source_id: &str, feature_count: usize) {
        if !self.bars_enabled() {
            return;
        }
        let bar = ProgressBar::new(feature_count as u64);
        bar.set_style(Self::style());
        bar.set_prefix(self.truncate(source_id));
        self.current = Some(bar);
        debug!("Progress bar started for {} ({} features)", source_id, feature_count);
    }

    fn feature_done(&mut self, processed: usize) {
        if let Some(bar) = &self.current {
            bar.set_position(processed as u64);
        }
    }

    fn source_finished(&mut self, source_id: &str, report: &EnrichmentReport) {
        let line = format!(
            "{}: {}/{} features enriched",
            source_id, report.enriched_features, report.total_features
        );
        match self.current.take() {
            Some(bar) => bar.finish_with_message(line),
            None if !self.config.quiet => println!("{}", line),
            None => {}
        }
    }
}

impl Drop for ProgressDisplay {
    fn drop(&mut self) {
        if let Some(bar) = self.current.take() {
            bar.abandon();
        }
    }
}
