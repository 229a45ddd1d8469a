//! The immutable run context built once at startup.

use std::fmt;

use url::Url;

use crate::config::loader::ConfigError;
use crate::config::schema::RunnerConfig;
use crate::config::validation::ValidationError;

/// Where a run was started from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginKind {
    /// Single-shot run.
    Batch,
    /// Persistent HTTP server.
    Standby,
    /// Any other platform origin (`WEB`, `API`, `SCHEDULER`, ...), kept verbatim.
    Other(String),
}

impl OriginKind {
    /// Interpret a raw origin value. Absent or empty values mean batch.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => OriginKind::Batch,
            Some(s) if s.eq_ignore_ascii_case("STANDBY") => OriginKind::Standby,
            Some(s) if s.eq_ignore_ascii_case("BATCH") => OriginKind::Batch,
            Some(s) => OriginKind::Other(s.to_string()),
        }
    }
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginKind::Batch => f.write_str("BATCH"),
            OriginKind::Standby => f.write_str("STANDBY"),
            OriginKind::Other(s) => f.write_str(s),
        }
    }
}

/// Where the expected caller token comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenSource {
    None,
    Static(String),
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::None => f.write_str("None"),
            TokenSource::Static(_) => f.write_str("Static(<redacted>)"),
        }
    }
}

/// Read-only facts about this run, threaded explicitly into every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub origin: OriginKind,
    pub port: u16,
    pub public_url: Option<Url>,
    pub token: TokenSource,
}

impl RunContext {
    /// Build the context from a validated configuration.
    pub fn from_config(config: &RunnerConfig) -> Result<Self, ConfigError> {
        let public_url = match &config.run.public_url {
            Some(raw) => Some(Url::parse(raw).map_err(|_| {
                ConfigError::Validation(vec![ValidationError::InvalidPublicUrl(raw.clone())])
            })?),
            None => None,
        };

        let token = match config.run.token.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => TokenSource::Static(t.to_string()),
            _ => TokenSource::None,
        };

        Ok(Self {
            origin: OriginKind::parse(config.run.origin.as_deref()),
            port: config.run.port,
            public_url,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_origins() {
        assert_eq!(OriginKind::parse(Some("STANDBY")), OriginKind::Standby);
        assert_eq!(OriginKind::parse(Some("standby")), OriginKind::Standby);
        assert_eq!(OriginKind::parse(Some("batch")), OriginKind::Batch);
        assert_eq!(OriginKind::parse(None), OriginKind::Batch);
        assert_eq!(OriginKind::parse(Some("  ")), OriginKind::Batch);
        assert_eq!(
            OriginKind::parse(Some("SCHEDULER")),
            OriginKind::Other("SCHEDULER".into())
        );
    }

    #[test]
    fn context_from_config() {
        let mut config = RunnerConfig::default();
        config.run.origin = Some("STANDBY".into());
        config.run.port = 8080;
        config.run.token = Some(" secret ".into());
        config.run.public_url = Some("https://run-abc.apify.actor".into());

        let ctx = RunContext::from_config(&config).unwrap();
        assert_eq!(ctx.origin, OriginKind::Standby);
        assert_eq!(ctx.port, 8080);
        assert_eq!(ctx.token, TokenSource::Static("secret".into()));
        assert_eq!(
            ctx.public_url.as_ref().map(Url::as_str),
            Some("https://run-abc.apify.actor/")
        );
    }

    #[test]
    fn token_is_redacted_in_debug_output() {
        let rendered = format!("{:?}", TokenSource::Static("hunter2".into()));
        assert!(!rendered.contains("hunter2"));
    }
}
