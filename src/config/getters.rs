//! Accessor methods for `CrawlConfig`.

use std::path::Path;

use super::types::CrawlConfig;

impl CrawlConfig {
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    #[must_use]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Compiles this config's scope + filter options into a usable
    /// [`crate::filter::Filter`]. Done once per run by the orchestrator.
    pub fn compile_filter(&self) -> anyhow::Result<crate::filter::Filter> {
        crate::filter::Filter::compile(&self.filter_spec, self.scope, self.stay_in_dir, self.external_assets)
    }
}
