use crate::research::{Depth, ResearchProfile};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub depth: Depth,
    pub profile: ResearchProfile,
    /// Search allow-list; empty means the profile's default list
    pub include_domains: Vec<String>,
    pub exclude_domains: Vec<String>,
    pub generate_report: bool,
    pub search_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            depth: Depth::Basic,
            profile: ResearchProfile::General,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
            generate_report: true,
            search_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_profile(mut self, profile: ResearchProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_include_domains(mut self, domains: Vec<String>) -> Self {
        self.include_domains = domains;
        self
    }

    pub fn with_exclude_domains(mut self, domains: Vec<String>) -> Self {
        self.exclude_domains = domains;
        self
    }

    pub fn with_report(mut self, generate_report: bool) -> Self {
        self.generate_report = generate_report;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn effective_include_domains(&self) -> Vec<String> {
        if self.include_domains.is_empty() {
            self.profile.default_include_domains()
        } else {
            self.include_domains.clone()
        }
    }
}
