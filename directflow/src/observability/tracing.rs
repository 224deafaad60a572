//! Structured tracing for engine evaluations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug_span, Span};
use tracing_subscriber::EnvFilter;

/// Options for installing the global tracing subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "directflow=info".to_string()
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_filter: default_filter(),
            json: false,
        }
    }
}

/// Installs a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured default filter. Returns
/// false if a subscriber was already installed.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}

/// Span attributes for the evaluation of one work item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkItemSpanAttributes {
    /// Transform label.
    pub transform: String,
    /// Work item key.
    pub key: String,
    /// "timer" or "elements".
    pub kind: Option<String>,
    /// Number of elements delivered.
    pub elements: Option<usize>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Error message if the evaluation failed.
    pub error: Option<String>,
}

impl WorkItemSpanAttributes {
    /// Creates attributes for a transform and key.
    #[must_use]
    pub fn new(transform: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            transform: transform.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Sets the work item kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the element count.
    #[must_use]
    pub fn with_elements(mut self, elements: usize) -> Self {
        self.elements = Some(elements);
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Converts to OpenTelemetry-style attributes.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("transform.name".to_string(), self.transform.clone());
        attrs.insert("work_item.key".to_string(), self.key.clone());

        if let Some(ref v) = self.kind {
            attrs.insert("work_item.kind".to_string(), v.clone());
        }
        if let Some(v) = self.elements {
            attrs.insert("work_item.elements".to_string(), v.to_string());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("work_item.duration_ms".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error {
            attrs.insert("work_item.error".to_string(), v.clone());
        }
        attrs
    }
}

/// Times the evaluation of one work item inside its own `evaluate` span.
#[derive(Debug)]
pub struct EvaluationTimer {
    started: Instant,
    span: Span,
}

impl EvaluationTimer {
    /// Opens the span for `transform` and `key` and starts the clock.
    #[must_use]
    pub fn start(transform: &str, key: &str) -> Self {
        Self {
            started: Instant::now(),
            span: debug_span!("evaluate", transform, key),
        }
    }

    /// The span evaluator calls should be instrumented with.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Milliseconds since [`start`](Self::start).
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Closes the span and returns the total duration in milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        let elapsed = self.elapsed_ms();
        drop(self.span);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_span_attributes() {
        let attrs = WorkItemSpanAttributes::new("GroupByKey", "k1")
            .with_kind("elements")
            .with_elements(3)
            .with_duration_ms(1.5);

        let otel = attrs.to_otel_attributes();
        assert_eq!(otel.get("transform.name"), Some(&"GroupByKey".to_string()));
        assert_eq!(otel.get("work_item.key"), Some(&"k1".to_string()));
        assert_eq!(otel.get("work_item.elements"), Some(&"3".to_string()));
        assert!(otel.get("work_item.error").is_none());
    }

    #[test]
    fn test_evaluation_timer() {
        let timer = EvaluationTimer::start("ParDo(Count)", "k1");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let _ = timer.span().id();
        assert!(timer.finish() >= 5.0);
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        let config = TracingConfig::default();
        init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
