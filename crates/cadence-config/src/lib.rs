//! Declarative YAML configuration for the Cadence engine.
//!
//! Parsing and validation happen once at startup; the resulting [`Config`]
//! is immutable for the life of the process.

use std::path::Path;

use serde::{Deserialize, Serialize};

use cadence_types::{PipeError, Result};

pub mod duration_serde;
mod engine;
mod handler;

pub use engine::{Engine, Log, LogLevel, RUN_AT_FORMAT};
pub use handler::{FilterHandler, Handler, HandlerEntry, HandlerMap, HandlerType, HttpHandler};

/// The root configuration record: an engine block plus the ordered handler
/// list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub engine: Engine,
    pub handlers: HandlerMap,
}

impl Config {
    /// Parse a configuration from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| PipeError::Config(format!("failed to parse yaml: {e}")))
    }

    /// Read and parse a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            PipeError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Check every invariant that must hold before the engine is built:
    /// at least one handler, unique names, a positive interval, a parseable
    /// `run_at`, and per-kind handler settings.
    pub fn validate(&self) -> Result<()> {
        if self.handlers.is_empty() {
            return Err(PipeError::Config("no handlers defined".into()));
        }

        self.engine
            .validate()
            .map_err(|e| PipeError::Config(format!("invalid engine config: {}", bare(e))))?;

        let mut seen = std::collections::HashSet::new();
        for entry in &self.handlers {
            if !seen.insert(entry.name.as_str()) {
                return Err(PipeError::Config(format!(
                    "duplicate handler name: '{}'",
                    entry.name
                )));
            }
            entry.handler.validate().map_err(|e| {
                PipeError::Config(format!(
                    "config for '{}' handler is invalid: {}",
                    entry.name,
                    bare(e)
                ))
            })?;
        }

        Ok(())
    }
}

/// Strip the `invalid configuration:` prefix when re-wrapping a nested
/// validation error, so messages don't stack the prefix.
fn bare(err: PipeError) -> String {
    match err {
        PipeError::Config(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const FULL: &str = r#"
engine:
  disable_run_on_start: true
  interval: 30s
  run_at: "23:59"
  log:
    level: debug
    static_fields:
      service: cadence-test
handlers:
  fetch:
    type: http
    http:
      url: http://localhost:8081/handle
      method: GET
      timeout: 5s
      retries: 2
      retry_interval: 500ms
  keep_large:
    type: filter
    filter:
      expression: "{{ fetch.n }} > 7"
  log:
    http:
      url: http://localhost:8082/handle
      method: POST
      body: '{"n": {{ fetch.n }}}'
      headers:
        Content-Type: application/json
      query_params:
        source: pipeline
      parallel_run: true
"#;

    #[test]
    fn parses_full_config() {
        let cfg = Config::from_yaml(FULL).unwrap();

        assert!(cfg.engine.disable_run_on_start);
        assert_eq!(cfg.engine.interval, Duration::from_secs(30));
        assert_eq!(cfg.engine.run_at.as_deref(), Some("23:59"));
        assert_eq!(cfg.engine.log.level, LogLevel::Debug);
        assert_eq!(
            cfg.engine.log.static_fields.get("service").map(String::as_str),
            Some("cadence-test")
        );

        assert_eq!(cfg.handlers.len(), 3);
        cfg.validate().unwrap();
    }

    #[test]
    fn handler_order_matches_declaration_order() {
        let cfg = Config::from_yaml(FULL).unwrap();
        let names: Vec<&str> = cfg.handlers.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["fetch", "keep_large", "log"]);
    }

    #[test]
    fn handler_defaults_applied() {
        let cfg = Config::from_yaml(FULL).unwrap();
        let entries: Vec<_> = cfg.handlers.iter().collect();

        // Missing `type` defaults to http.
        assert_eq!(entries[2].handler.kind, HandlerType::Http);
        // Missing http knobs fall back to their defaults.
        assert_eq!(entries[2].handler.http.timeout, Duration::from_secs(15));
        assert_eq!(entries[2].handler.http.expected_response_code, 200);
        assert_eq!(entries[2].handler.http.retries, 0);
        // Configured knobs survive.
        assert_eq!(entries[0].handler.http.retries, 2);
        assert_eq!(
            entries[0].handler.http.retry_interval,
            Duration::from_millis(500)
        );
        assert!(entries[2].handler.http.parallel_run);
        // Filter defaults.
        assert!(!entries[1].handler.filter.expect_false);
    }

    #[test]
    fn no_handlers_is_invalid() {
        let cfg = Config::from_yaml("engine:\n  interval: 10s\nhandlers: {}\n").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("no handlers defined"));
    }

    #[test]
    fn zero_interval_is_invalid() {
        let cfg = Config::from_yaml(
            "engine:\n  interval: 0s\nhandlers:\n  a:\n    http:\n      url: http://h\n      method: GET\n",
        )
        .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("invalid engine config: 'interval' must be greater than 0"));
    }

    #[test]
    fn bad_run_at_is_invalid() {
        let cfg = Config::from_yaml(
            "engine:\n  interval: 10s\n  run_at: \"noon\"\nhandlers:\n  a:\n    http:\n      url: http://h\n      method: GET\n",
        )
        .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("failed to parse run_at time"));
    }

    #[test]
    fn duplicate_handler_names_rejected() {
        // YAML mappings tolerate duplicate keys; validation does not.
        let cfg = Config::from_yaml(
            "engine:\n  interval: 10s\nhandlers:\n  a:\n    http:\n      url: http://h\n      method: GET\n  a:\n    http:\n      url: http://h2\n      method: GET\n",
        );
        // Some parsers reject the duplicate key outright; either failure mode
        // keeps the invariant.
        match cfg {
            Ok(cfg) => {
                let err = cfg.validate().unwrap_err();
                assert!(err.to_string().contains("duplicate handler name: 'a'"));
            }
            Err(err) => assert!(err.to_string().contains("failed to parse yaml")),
        }
    }

    #[test]
    fn invalid_handler_config_names_the_handler() {
        let cfg = Config::from_yaml(
            "engine:\n  interval: 10s\nhandlers:\n  broken:\n    http:\n      url: http://h\n",
        )
        .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("config for 'broken' handler is invalid: 'method' is required"));
    }

    #[test]
    fn invalid_filter_expression_fails_validation() {
        let cfg = Config::from_yaml(
            "engine:\n  interval: 10s\nhandlers:\n  f:\n    type: filter\n    filter:\n      expression: \"{{ a.n }} >\"\n",
        )
        .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("failed to parse expression"));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let err = Config::from_yaml("engine: [not a map").unwrap_err();
        assert!(err.to_string().contains("failed to parse yaml"));
    }

    #[test]
    fn from_yaml_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let cfg = Config::from_yaml_file(file.path()).unwrap();
        assert_eq!(cfg.handlers.len(), 3);

        let missing = Config::from_yaml_file("/nonexistent/config.yaml").unwrap_err();
        assert!(missing.to_string().contains("failed to read config file"));
    }
}
