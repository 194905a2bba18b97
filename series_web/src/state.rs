//! Shared handler state

use crate::config::Settings;
use series_forecast::AnalysisContext;
use std::path::Path;
use std::sync::Arc;

/// Shared, read-only handler state
#[derive(Debug, Clone)]
pub struct AppState {
    settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.settings.data_dir
    }

    pub fn static_dir(&self) -> &Path {
        &self.settings.static_dir
    }

    /// Plot settings for one pipeline run
    pub fn analysis_context(&self) -> AnalysisContext {
        AnalysisContext::new(&self.settings.static_dir).with_acf_lags(self.settings.acf_lags)
    }
}
