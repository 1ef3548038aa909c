use super::types::SourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flavour of research run.
///
/// `General` is open-ended topic research. `Trace` is the narrower
/// web-performance variant that favours a fixed set of reference sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchProfile {
    #[default]
    General,
    Trace,
}

const TRACE_DOMAINS: &[&str] = &[
    "web.dev",
    "chromium.org",
    "developer.chrome.com",
    "developer.mozilla.org",
    "dev.to",
];

impl ResearchProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchProfile::General => "general",
            ResearchProfile::Trace => "trace",
        }
    }

    /// Soft ceiling on searches plus analyses, stated in the planning prompt
    pub fn step_ceiling(&self) -> usize {
        match self {
            ResearchProfile::General => 20,
            ResearchProfile::Trace => 10,
        }
    }

    /// Inclusive range plan priorities are clamped to
    pub fn priority_range(&self) -> (u8, u8) {
        match self {
            ResearchProfile::General => (1, 5),
            ResearchProfile::Trace => (2, 4),
        }
    }

    /// Source kinds the planner is told it may use
    pub fn allowed_sources(&self) -> &'static [SourceKind] {
        match self {
            ResearchProfile::General => &[SourceKind::Web, SourceKind::Academic, SourceKind::Both],
            ResearchProfile::Trace => &[SourceKind::Web, SourceKind::All],
        }
    }

    pub fn default_include_domains(&self) -> Vec<String> {
        match self {
            ResearchProfile::General => Vec::new(),
            ResearchProfile::Trace => TRACE_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl fmt::Display for ResearchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResearchProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(ResearchProfile::General),
            "trace" => Ok(ResearchProfile::Trace),
            other => Err(format!("unknown research profile: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_policies() {
        assert_eq!(ResearchProfile::General.step_ceiling(), 20);
        assert_eq!(ResearchProfile::Trace.step_ceiling(), 10);
        assert_eq!(ResearchProfile::General.priority_range(), (1, 5));
        assert_eq!(ResearchProfile::Trace.priority_range(), (2, 4));
    }

    #[test]
    fn test_trace_defaults_to_reference_domains() {
        let domains = ResearchProfile::Trace.default_include_domains();
        assert!(domains.contains(&"web.dev".to_string()));
        assert_eq!(domains.len(), 5);
        assert!(ResearchProfile::General.default_include_domains().is_empty());
    }

    #[test]
    fn test_parse_profile() {
        assert_eq!("TRACE".parse::<ResearchProfile>().unwrap(), ResearchProfile::Trace);
        assert!("deep".parse::<ResearchProfile>().is_err());
    }
}
