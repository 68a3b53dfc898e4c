//! Per-stage wall-clock timing for pipeline runs.
//!
//! Stages are recorded in the order they finish. Collection is off unless
//! enabled with [`set_timing_enabled`] (the CLI wires this to `--timing`
//! and `COMMAP_TIMING`).

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

/// Timings collected on the current thread.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimingReport {
    pub stages: Vec<StageTiming>,
}

/// One finished stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: String,
    pub elapsed: Duration,
}

thread_local! {
    static STAGES: RefCell<Vec<StageTiming>> = const { RefCell::new(Vec::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Returns true when `COMMAP_TIMING` is set to `1`, `true`, `yes` or `on`.
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("COMMAP_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(&value))
}

/// Enable or disable collection. Disabling drops recorded stages.
pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

pub fn clear_timings() {
    STAGES.with(|stages| stages.borrow_mut().clear());
}

/// Run `f` as the named stage.
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }

    let started = Instant::now();
    let result = f();
    let elapsed = started.elapsed();
    STAGES.with(|stages| {
        stages.borrow_mut().push(StageTiming {
            name: name.to_string(),
            elapsed,
        });
    });
    result
}

/// Drain the current thread's stages into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let stages = STAGES.with(|stages| std::mem::take(&mut *stages.borrow_mut()));
    TimingReport { stages }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.stages.iter().map(|stage| stage.elapsed).sum()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .iter()
            .map(|stage| json!({ "name": stage.name, "elapsed_us": stage.elapsed.as_micros() }))
            .collect::<Vec<_>>();
        json!({ "stages": stages, "total_us": self.total().as_micros() })
    }

    /// Two-column table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        use std::fmt::Write as _;

        if self.stages.is_empty() {
            return "No stages recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("stage                              elapsed\n");
        out.push_str("------------------------------------------\n");
        for stage in &self.stages {
            let _ = writeln!(out, "{:<32} {:>9}", stage.name, format_duration(stage.elapsed));
        }
        let _ = writeln!(out, "{:<32} {:>9}", "total", format_duration(self.total()));
        out
    }
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros >= 1_000_000 {
        format!("{}.{:03}s", micros / 1_000_000, (micros % 1_000_000) / 1_000)
    } else if micros >= 1_000 {
        format!("{}.{:03}ms", micros / 1_000, micros % 1_000)
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|truthy| value.trim().eq_ignore_ascii_case(truthy))
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn disabled_timing_records_nothing() {
        let _guard = TEST_GUARD.lock().expect("test guard lock");
        set_timing_enabled(false);

        assert_eq!(timed("graph.build", || 7_u8), 7);
        assert!(collect_report().is_empty());
    }

    #[test]
    fn stages_keep_completion_order() {
        let _guard = TEST_GUARD.lock().expect("test guard lock");
        set_timing_enabled(true);

        timed("graph.build", || ());
        timed("report.join", || ());

        let report = collect_report();
        let names: Vec<&str> = report.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["graph.build", "report.join"]);
        assert!(collect_report().is_empty(), "collect drains the buffer");

        set_timing_enabled(false);
    }

    #[test]
    fn table_and_json_include_total() {
        let report = TimingReport {
            stages: vec![
                StageTiming {
                    name: "a".to_string(),
                    elapsed: Duration::from_micros(1_500),
                },
                StageTiming {
                    name: "b".to_string(),
                    elapsed: Duration::from_micros(500),
                },
            ],
        };
        let table = report.display_table();
        assert!(table.contains("1.500ms"));
        assert!(table.contains("total"));
        assert_eq!(report.to_json()["total_us"], serde_json::Value::from(2_000));
    }

    #[test]
    fn truthy_values() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" on "));
        assert!(!is_truthy("0"));
    }
}
