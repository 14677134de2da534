use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, error, info, warn};

use crate::assembler::SampleAssembler;
use crate::config::constants;
use crate::features::RowLog;
use crate::sink::RowSink;

/// Warm-up and throttle rules for the sampling loop.
///
/// This is a throttle, not a timer: the loop polls [`Cadence::is_due`] and a
/// sample is accepted only once the warm-up has passed and strictly more than
/// `interval` has elapsed since the previous accepted sample.
#[derive(Debug, Clone)]
pub struct Cadence {
    started: Instant,
    warmup: Duration,
    interval: Duration,
    last_sample: Option<Instant>,
}

impl Cadence {
    pub fn new(started: Instant, warmup: Duration, interval: Duration) -> Self {
        Self {
            started,
            warmup,
            interval,
            last_sample: None,
        }
    }

    /// Cadence with the standard 20s warm-up and 2s interval.
    pub fn standard(started: Instant) -> Self {
        Self::new(started, constants::WARMUP, constants::SAMPLE_INTERVAL)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        if now.saturating_duration_since(self.started) <= self.warmup {
            return false;
        }
        match self.last_sample {
            Some(last) => now.saturating_duration_since(last) > self.interval,
            None => true,
        }
    }

    pub fn mark_sampled(&mut self, now: Instant) {
        self.last_sample = Some(now);
    }
}

/// What a single [`Sampler::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Warm-up or throttle not yet satisfied.
    Waiting,
    /// A row was appended; `flushed` is set when the log was persisted.
    Sampled { rows: usize, flushed: bool },
    /// The sample attempt failed and was skipped.
    Skipped,
}

/// Owns the row log and drives assembly, throttling and persistence.
///
/// The log lives on whichever thread runs the sampler, so appends and the
/// reads for persistence never cross threads.
pub struct Sampler {
    assembler: SampleAssembler,
    cadence: Cadence,
    sink: Box<dyn RowSink>,
    flush_threshold: usize,
    log: RowLog,
}

impl Sampler {
    pub fn new(assembler: SampleAssembler, cadence: Cadence, sink: Box<dyn RowSink>) -> Self {
        Self {
            assembler,
            cadence,
            sink,
            flush_threshold: constants::FLUSH_THRESHOLD,
            log: RowLog::new(),
        }
    }

    pub fn with_flush_threshold(mut self, flush_threshold: usize) -> Self {
        self.flush_threshold = flush_threshold;
        self
    }

    pub fn log(&self) -> &RowLog {
        &self.log
    }

    pub fn into_log(self) -> RowLog {
        self.log
    }

    /// Run one iteration of the sampling policy at `now`.
    ///
    /// A failed assembly still counts as an attempt for throttling, so a
    /// broken source is retried every interval rather than every poll.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if !self.cadence.is_due(now) {
            return TickOutcome::Waiting;
        }
        self.cadence.mark_sampled(now);

        let row = match self.assembler.assemble() {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping sample: {}", e);
                return TickOutcome::Skipped;
            }
        };
        self.log.append(row);
        info!("Row log size: {}", self.log.len());

        let mut flushed = false;
        if self.log.len() > self.flush_threshold {
            match self.sink.rewrite(&self.log) {
                Ok(()) => {
                    debug!("Persisted {} rows", self.log.len());
                    flushed = true;
                }
                Err(e) => error!("{}", e),
            }
        }

        TickOutcome::Sampled {
            rows: self.log.len(),
            flushed,
        }
    }
}

/// Background thread running a [`Sampler`] until asked to stop.
///
/// Stopping is cooperative: the flag is checked between polls, so an
/// in-flight tick always runs to completion.
pub struct SamplingLoop {
    running: Arc<AtomicBool>,
    handle: JoinHandle<RowLog>,
}

impl SamplingLoop {
    /// Spawn the worker thread with the standard 100ms poll interval.
    pub fn spawn(sampler: Sampler) -> Result<Self> {
        Self::spawn_with_poll(sampler, constants::LOOP_POLL_INTERVAL)
    }

    pub fn spawn_with_poll(mut sampler: Sampler, poll_interval: Duration) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("telemetry-sampler".to_string())
            .spawn(move || {
                info!("Sampling loop started");
                while flag.load(Ordering::Acquire) {
                    sampler.tick(Instant::now());
                    thread::sleep(poll_interval);
                }
                info!("Sampling loop stopped");
                sampler.into_log()
            })?;

        Ok(Self { running, handle })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.handle.is_finished()
    }

    /// Clear the run flag, wait for the worker and hand back its row log.
    pub fn stop(self) -> Result<RowLog> {
        self.running.store(false, Ordering::Release);
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("Sampling thread panicked"))
    }
}
