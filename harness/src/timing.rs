//! The timed-repeat construct cases run their measured body in.

use crate::report::CaseTiming;
use anyhow::Result;
use std::time::Instant;

/// Repeats a case body until the implementation has gathered enough
/// samples. The first body error stops the loop and is returned.
pub trait BenchLoop {
    fn run(&mut self, body: &mut dyn FnMut() -> Result<()>) -> Result<()>;
}

/// Holds the first error raised inside a timing engine that cannot stop
/// early, and logs it the moment it happens.
#[derive(Debug, Default)]
pub struct FailureLatch {
    label: String,
    failure: Option<anyhow::Error>,
}

impl FailureLatch {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            failure: None,
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.failure.is_some()
    }

    /// Keeps `error` unless an earlier one is already held.
    pub fn record(&mut self, error: anyhow::Error) {
        if self.failure.is_none() {
            log::error!(
                "{} failed, remaining samples are not measured: {error:#}",
                self.label
            );
            self.failure = Some(error);
        }
    }

    /// Runs `body` `iterations` times unless already tripped, stopping at
    /// the first error.
    pub fn run_batch(&mut self, body: &mut dyn FnMut() -> Result<()>, iterations: u64) {
        if self.is_tripped() {
            return;
        }
        for _ in 0..iterations {
            if let Err(e) = body() {
                self.record(e);
                return;
            }
        }
    }

    pub fn into_result(self) -> Result<()> {
        self.failure.map_or(Ok(()), Err)
    }
}

/// Fixed warmup, then `samples` timed batches of `iterations_per_sample`.
#[derive(Debug, Clone)]
pub struct SampleLoop {
    warmup: u32,
    samples: u32,
    iterations_per_sample: u32,
    timing: CaseTiming,
}

impl SampleLoop {
    pub fn new(warmup: u32, samples: u32, iterations_per_sample: u32) -> Self {
        Self {
            warmup,
            samples,
            iterations_per_sample: iterations_per_sample.max(1),
            timing: CaseTiming::default(),
        }
    }

    /// Exactly `iterations` iterations as a single sample, no warmup.
    pub fn iterations(iterations: u32) -> Self {
        Self::new(0, 1, iterations)
    }

    pub fn timing(&self) -> &CaseTiming {
        &self.timing
    }

    pub fn into_timing(self) -> CaseTiming {
        self.timing
    }
}

impl BenchLoop for SampleLoop {
    fn run(&mut self, body: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        for _ in 0..self.warmup {
            body()?;
        }
        self.timing.warmup_iterations += self.warmup as u64;

        for _ in 0..self.samples {
            let start = Instant::now();
            for _ in 0..self.iterations_per_sample {
                body()?;
            }
            self.timing
                .add_sample(start.elapsed(), self.iterations_per_sample as u64);
        }
        Ok(())
    }
}
