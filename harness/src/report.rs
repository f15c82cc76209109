//! Report module: per-case timing and the human-readable suite report.

use std::time::Duration;

/// Timing gathered by one case run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseTiming {
    pub sample_durations: Vec<Duration>,
    /// Iterations measured in the matching entry of `sample_durations`.
    pub sample_iterations: Vec<u64>,
    pub warmup_iterations: u64,
}

impl CaseTiming {
    pub fn add_sample(&mut self, elapsed: Duration, iterations: u64) {
        self.sample_durations.push(elapsed);
        self.sample_iterations.push(iterations);
    }

    /// Measured iterations (warmup excluded).
    pub fn iterations(&self) -> u64 {
        self.sample_iterations.iter().sum()
    }

    pub fn elapsed(&self) -> Duration {
        self.sample_durations.iter().sum()
    }

    /// Per-iteration time of each sample, in microseconds.
    fn per_iteration_us(&self) -> Vec<f64> {
        self.sample_durations
            .iter()
            .zip(&self.sample_iterations)
            .filter(|(_, n)| **n > 0)
            .map(|(d, n)| d.as_secs_f64() * 1e6 / *n as f64)
            .collect()
    }

    pub fn mean_us(&self) -> f64 {
        let iterations = self.iterations();
        if iterations == 0 {
            return 0.0;
        }
        self.elapsed().as_secs_f64() * 1e6 / iterations as f64
    }

    pub fn percentile_us(&self, pct: f64) -> f64 {
        let mut sorted = self.per_iteration_us();
        if sorted.is_empty() {
            return 0.0;
        }
        sorted.sort_by(f64::total_cmp);
        let idx = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn iterations_per_sec(&self) -> f64 {
        let mean = self.mean_us();
        if mean <= 0.0 {
            return 0.0;
        }
        1_000_000.0 / mean
    }
}

/// Final state of one case on one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Passed,
    /// Statement text and backend diagnostic, or the failed check.
    Failed(String),
    Skipped(String),
}

impl CaseOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, CaseOutcome::Failed(_))
    }

    fn verdict(&self) -> &'static str {
        match self {
            CaseOutcome::Passed => "PASS",
            CaseOutcome::Failed(_) => "FAIL",
            CaseOutcome::Skipped(_) => "SKIP",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub case: String,
    pub connection: String,
    pub outcome: CaseOutcome,
    pub timing: CaseTiming,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteReport {
    pub records: Vec<CaseRecord>,
    /// Connections whose fixtures could not be built, with the reason.
    pub setup_failures: Vec<(String, String)>,
    /// Set when the whole suite was skipped.
    pub skipped: Option<String>,
}

impl SuiteReport {
    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_failed()).count()
    }

    pub fn passed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == CaseOutcome::Passed)
            .count()
    }
}

/// Print a formatted report of every case run.
pub fn print_report(report: &SuiteReport) {
    println!("\n{}", "=".repeat(80));
    println!("  Query Benchmark Report");
    println!(
        "  Generated: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("{}", "=".repeat(80));

    if let Some(reason) = &report.skipped {
        println!("\n  SKIPPED: {reason}");
        println!("\n{}", "=".repeat(80));
        return;
    }

    for (connection, reason) in &report.setup_failures {
        println!("\n  Setup failed on {connection}: {reason}");
    }

    for record in &report.records {
        let timing = &record.timing;
        println!(
            "\n  Case: {} | Connection: {}",
            record.case, record.connection
        );
        println!("  {}", "-".repeat(60));
        println!("  Iterations:      {:>10}", timing.iterations());
        println!(
            "  Elapsed:         {:>10.2}ms",
            timing.elapsed().as_secs_f64() * 1000.0
        );
        println!("  Mean:            {:>10.1}µs", timing.mean_us());
        println!("  p50:             {:>10.1}µs", timing.percentile_us(50.0));
        println!("  p95:             {:>10.1}µs", timing.percentile_us(95.0));
        println!("  Throughput:      {:>10.1} it/s", timing.iterations_per_sec());
        println!("  Verdict:         {}", record.outcome.verdict());
        match &record.outcome {
            CaseOutcome::Failed(reason) | CaseOutcome::Skipped(reason) => {
                println!("  Reason:          {reason}");
            }
            CaseOutcome::Passed => {}
        }
    }

    println!("\n{}", "=".repeat(80));

    if report.records.len() >= 2 {
        println!("\n  Summary:");
        println!(
            "  {:44} {:>10} {:>10} {:>8}",
            "Case / Connection", "Mean (µs)", "it/s", "Result"
        );
        println!("  {}", "-".repeat(76));
        for r in &report.records {
            let label = format!("{}/{}", r.case, r.connection);
            println!(
                "  {:44} {:>10.1} {:>10.1} {:>8}",
                label,
                r.timing.mean_us(),
                r.timing.iterations_per_sec(),
                r.outcome.verdict()
            );
        }
    }

    println!();
}
