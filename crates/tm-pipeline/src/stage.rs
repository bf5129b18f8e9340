//! The stage contract and the fixed-pool runner that drives it.

use std::ops::Range;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::trace;

use tm_core::Version;

use crate::{PipelineError, PipelineResult};

// ── PipelineStage ─────────────────────────────────────────────────────────────

/// One stage of the tick pipeline.
///
/// A tick is driven by [`StageRunner::tick`]:
///
/// ```text
/// receive()                      pull the newest upstream snapshot
/// prepare()                      single-writer maintenance, on one pool thread
/// execute(shared, range, out)    once per worker, disjoint contiguous ranges
/// send()                         publish the filled output, flip buffers
/// ```
///
/// `prepare` finishes before any `execute` starts, so state it mutates is
/// visible to every worker of the same tick.  During the parallel phase the
/// stage is split by [`workspace`](Self::workspace) into a read-only shared
/// half and the mutable output slots.
pub trait PipelineStage: Send {
    /// Read-only state handed to every worker.
    type Shared: Sync;
    /// One output record per input slot.
    type Output: Send;

    /// Block for the next upstream snapshot.  Returns its length.
    fn receive(&mut self) -> PipelineResult<usize>;

    /// Per-tick maintenance that must be visible to all workers.
    fn prepare(&mut self) -> PipelineResult<()>;

    /// Split borrow for the parallel phase.  The output slice must be as
    /// long as the length returned by [`receive`](Self::receive).
    fn workspace(&mut self) -> (&Self::Shared, &mut [Self::Output]);

    /// Fill `out` (the slots for `range`) from `shared`.
    fn execute(shared: &Self::Shared, range: Range<usize>, out: &mut [Self::Output]) -> PipelineResult<()>;

    /// Publish the tick's output.  Returns the version it was published at.
    fn send(&mut self) -> PipelineResult<Version>;

    /// Called once when the runner stops; typically closes the downstream
    /// channel.
    fn close(&mut self) {}
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Callbacks invoked by [`StageRunner`] around each tick.
///
/// All methods default to no-ops.
pub trait RunnerObserver {
    fn on_tick_start(&mut self, _tick: u64) {}

    /// `len` is the snapshot length processed this tick.
    fn on_tick_end(&mut self, _tick: u64, _version: Version, _len: usize) {}

    /// Called once when [`StageRunner::run`] returns.
    fn on_stop(&mut self, _ticks: u64) {}
}

/// A [`RunnerObserver`] that does nothing.
pub struct NoopObserver;

impl RunnerObserver for NoopObserver {}

// ── Partitioning ──────────────────────────────────────────────────────────────

/// Split `[0, len)` into at most `workers` contiguous, non-empty ranges.
///
/// The first `len % workers` ranges get one extra element.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1).min(len.max(1));
    let base    = len / workers;
    let extra   = len % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start  = 0;
    for i in 0..workers {
        let end = start + base + usize::from(i < extra);
        if end > start {
            ranges.push(start..end);
        }
        start = end;
    }
    ranges
}

fn split_by_ranges<'a, T>(mut out: &'a mut [T], ranges: &[Range<usize>]) -> Vec<&'a mut [T]> {
    let mut chunks = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (head, tail) = std::mem::take(&mut out).split_at_mut(range.len());
        chunks.push(head);
        out = tail;
    }
    chunks
}

// ── StageRunner ───────────────────────────────────────────────────────────────

/// Drives a [`PipelineStage`] on a dedicated fixed-size thread pool.
pub struct StageRunner<S: PipelineStage> {
    stage:     S,
    pool:      ThreadPool,
    pool_size: usize,
    ticks:     u64,
}

impl<S: PipelineStage> StageRunner<S> {
    /// # Errors
    ///
    /// [`PipelineError::Config`] if `pool_size` is zero or the pool cannot
    /// be spawned.
    pub fn new(stage: S, pool_size: usize) -> PipelineResult<Self> {
        if pool_size == 0 {
            return Err(PipelineError::Config("pool_size must be at least 1".into()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(pool_size)
            .thread_name(|i| format!("tm-stage-{i}"))
            .build()
            .map_err(|e| PipelineError::Config(format!("thread pool: {e}")))?;
        Ok(Self { stage, pool, pool_size, ticks: 0 })
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    pub fn into_stage(self) -> S {
        self.stage
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one full receive → prepare → execute → send cycle.
    ///
    /// Returns the version the output was published at.
    pub fn tick(&mut self) -> PipelineResult<Version> {
        self.tick_inner().map(|(version, _)| version)
    }

    fn tick_inner(&mut self) -> PipelineResult<(Version, usize)> {
        let len = self.stage.receive()?;
        self.pool.install(|| self.stage.prepare())?;

        let ranges = partition(len, self.pool_size);
        let (shared, out) = self.stage.workspace();
        if out.len() != len {
            return Err(PipelineError::Stage(format!(
                "output has {} slots for a snapshot of {len}",
                out.len()
            )));
        }
        let chunks = split_by_ranges(out, &ranges);
        self.pool.install(|| {
            chunks
                .into_par_iter()
                .zip(ranges.into_par_iter())
                .try_for_each(|(chunk, range)| S::execute(shared, range, chunk))
        })?;

        let version = self.stage.send()?;
        self.ticks += 1;
        trace!(tick = self.ticks, %version, len, "stage tick complete");
        Ok((version, len))
    }

    /// Run exactly `n` ticks.  Stops at the first error.
    pub fn run_ticks<O: RunnerObserver>(&mut self, n: u64, observer: &mut O) -> PipelineResult<()> {
        for _ in 0..n {
            observer.on_tick_start(self.ticks);
            let (version, len) = self.tick_inner()?;
            observer.on_tick_end(self.ticks - 1, version, len);
        }
        Ok(())
    }

    /// Tick until the upstream channel closes, then close the stage.
    ///
    /// Returns the number of ticks completed by this call.  Any error other
    /// than [`PipelineError::Closed`] also closes the stage and is returned.
    pub fn run<O: RunnerObserver>(&mut self, observer: &mut O) -> PipelineResult<u64> {
        let started = self.ticks;
        let result = loop {
            observer.on_tick_start(self.ticks);
            match self.tick_inner() {
                Ok((version, len)) => observer.on_tick_end(self.ticks - 1, version, len),
                Err(PipelineError::Closed) => break Ok(self.ticks - started),
                Err(e) => break Err(e),
            }
        };
        self.stage.close();
        observer.on_stop(self.ticks - started);
        result
    }
}
