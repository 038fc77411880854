use crate::domain::SkippedKey;
use crate::utils::log_utils::Logger;
use std::sync::{Arc, Mutex};

/// Receives every key that an archive build had to leave out.
pub trait SkipSink: Send + Sync {
    fn record(&self, skipped: &SkippedKey);
}

/// Reports skipped keys as warnings through the shared [`Logger`].
#[derive(Clone)]
pub struct LoggingSkipSink {
    logger: Logger,
}

impl LoggingSkipSink {
    #[must_use]
    pub fn new(logger: &Logger) -> Self {
        Self { logger: *logger }
    }
}

impl SkipSink for LoggingSkipSink {
    fn record(&self, skipped: &SkippedKey) {
        self.logger.warn(&format!(
            "Skipping '{}' ({}): {}",
            skipped.key, skipped.reason, skipped.detail
        ));
    }
}

/// Keeps skipped keys in memory, optionally forwarding each one to another sink.
#[derive(Clone, Default)]
pub struct RecordingSkipSink {
    entries: Arc<Mutex<Vec<SkippedKey>>>,
    forward: Option<Arc<dyn SkipSink>>,
}

impl RecordingSkipSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn forwarding_to(sink: Arc<dyn SkipSink>) -> Self {
        Self {
            entries: Arc::default(),
            forward: Some(sink),
        }
    }

    pub fn entries(&self) -> Vec<SkippedKey> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|s| s.key).collect()
    }
}

impl SkipSink for RecordingSkipSink {
    fn record(&self, skipped: &SkippedKey) {
        match self.entries.lock() {
            Ok(mut guard) => guard.push(skipped.clone()),
            Err(poisoned) => poisoned.into_inner().push(skipped.clone()),
        }
        if let Some(next) = &self.forward {
            next.record(skipped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SkipReason;

    #[test]
    fn recording_sink_keeps_order_and_forwards() {
        let inner = Arc::new(RecordingSkipSink::new());
        let outer = RecordingSkipSink::forwarding_to(inner.clone());

        outer.record(&SkippedKey::new("b", SkipReason::Fetch, "timeout"));
        outer.record(&SkippedKey::new("a/", SkipReason::FolderExpansion, "denied"));

        assert_eq!(outer.keys(), vec!["b".to_string(), "a/".to_string()]);
        assert_eq!(inner.entries(), outer.entries());
        assert_eq!(outer.entries()[1].reason, SkipReason::FolderExpansion);
    }
}
