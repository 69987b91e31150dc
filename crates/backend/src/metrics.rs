//! Process-wide request counters.
//!
//! One `Metrics` instance lives in `AppState` and is passed to whoever
//! needs it; there is no global registry. Rendered in Prometheus text
//! format by the `/metrics` endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct Metrics {
    pub todos_created: Counter,
    pub todos_updated: Counter,
    pub todos_deleted: Counter,
    pub photos_uploaded: Counter,
    pub sync_runs: Counter,
    /// Stored board blobs that failed to parse and were recovered as empty.
    pub sync_recoveries: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics::default()
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, counter) in [
            ("todos_created_total", &self.todos_created),
            ("todos_updated_total", &self.todos_updated),
            ("todos_deleted_total", &self.todos_deleted),
            ("photos_uploaded_total", &self.photos_uploaded),
            ("column_sync_runs_total", &self.sync_runs),
            ("column_sync_recoveries_total", &self.sync_recoveries),
        ] {
            out.push_str(&format!("# TYPE {name} counter\n{name} {}\n", counter.get()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_and_render() {
        let metrics = Metrics::new();
        metrics.todos_created.incr();
        metrics.todos_created.incr();
        metrics.sync_recoveries.incr();

        let text = metrics.render();
        assert!(text.contains("todos_created_total 2"));
        assert!(text.contains("column_sync_recoveries_total 1"));
        assert!(text.contains("# TYPE column_sync_runs_total counter"));
    }
}
