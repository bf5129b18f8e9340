//! The collision stage and the per-tick state its workers share.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};

use tm_core::{ActorId, CollisionConfig, Version, Waypoint};
use tm_geometry::{ActorView, DebugDraw, Footprint, draw_ring, negotiate_against};
use tm_pipeline::{DataPacket, DoubleBuffer, Messenger, PipelineResult, PipelineStage};
use tm_spatial::VicinityGrid;
use tm_world::{ActorRef, WorldBackend};

use crate::{
    CandidateOutcome, CollisionResult, HazardFrame, HazardRecord, LocalizationData,
    LocalizationFrame, MaintenanceReport, SkipReason, UnregisteredTracker,
};

// ── CollisionContext ──────────────────────────────────────────────────────────

/// Everything the workers read during the parallel scan.
///
/// Mutated only between ticks: by [`CollisionStage::receive`] (new frame,
/// id lookup) and by the single-writer maintenance step (grid, tracker).
pub struct CollisionContext {
    frame:       LocalizationFrame,
    id_to_index: FxHashMap<ActorId, usize>,
    grid:        VicinityGrid,
    tracker:     UnregisteredTracker,
    config:      CollisionConfig,
    draw:        Arc<dyn DebugDraw>,
    /// Candidate pairs skipped since construction.
    skipped:     AtomicU64,
}

impl CollisionContext {
    pub(crate) fn new(
        grid:    VicinityGrid,
        tracker: UnregisteredTracker,
        config:  CollisionConfig,
        draw:    Arc<dyn DebugDraw>,
    ) -> Self {
        Self {
            frame: Arc::new(Vec::new()),
            id_to_index: FxHashMap::default(),
            grid,
            tracker,
            config,
            draw,
            skipped: AtomicU64::new(0),
        }
    }

    /// Replace the frame and rebuild the id lookup.  A duplicated id maps to
    /// its last slot.
    fn load_frame(&mut self, frame: LocalizationFrame) {
        self.id_to_index.clear();
        for (index, data) in frame.iter().enumerate() {
            self.id_to_index.insert(data.actor.id(), index);
        }
        self.frame = frame;
    }

    pub fn frame(&self) -> &[LocalizationData] {
        &self.frame
    }

    /// Slot of a managed actor in the current frame.
    pub fn index_of(&self, id: ActorId) -> Option<usize> {
        self.id_to_index.get(&id).copied()
    }

    pub fn grid(&self) -> &VicinityGrid {
        &self.grid
    }

    pub fn tracker(&self) -> &UnregisteredTracker {
        &self.tracker
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    // ── Maintenance ───────────────────────────────────────────────────────

    fn maintain(
        &mut self,
        now:      Instant,
        world:    &dyn WorldBackend,
        previous: &mut FxHashSet<ActorId>,
    ) -> MaintenanceReport {
        let report = self.tracker.maintain(now, world, &self.id_to_index, &mut self.grid);

        for data in self.frame.iter() {
            let id = data.actor.id();
            let placed = data
                .actor
                .state()
                .ok()
                .is_some_and(|state| self.grid.update(id, state.location).is_ok());
            if !placed {
                debug!(actor = %id, "managed actor has no readable location; removed from grid");
                self.grid.erase(id);
            }
        }

        // Managed ids from the previous frame that are gone now.
        for id in previous.drain() {
            if !self.id_to_index.contains_key(&id) && !self.tracker.contains(id) {
                self.grid.erase(id);
            }
        }
        previous.extend(self.id_to_index.keys().copied());
        report
    }

    // ── Hazard scan ───────────────────────────────────────────────────────

    /// Whether the vehicle in slot `index` must yield.
    ///
    /// # Errors
    ///
    /// The ego's own state being unreadable is fatal for the tick.  Problems
    /// with a candidate only skip that candidate.
    pub fn hazard_for(&self, index: usize) -> CollisionResult<bool> {
        let ego       = &self.frame[index];
        let ego_id    = ego.actor.id();
        let ego_state = ego.actor.state()?;
        let footprint = Footprint::new(&ego_state, Some(ego.buffer.as_slice()), &self.config);

        if self.config.draw_boundaries {
            draw_ring(self.draw.as_ref(), &footprint.geodesic);
        }

        let hazard = self
            .grid
            .neighbors(ego_state.location)
            .into_iter()
            .filter(|&id| id != ego_id)
            .any(|candidate| match self.evaluate(&footprint, candidate) {
                CandidateOutcome::Hazard => true,
                CandidateOutcome::Clear  => false,
                CandidateOutcome::Skipped(reason) => {
                    warn!(
                        ego = %ego_id,
                        candidate = %candidate,
                        %reason,
                        "encountered problem while determining collision"
                    );
                    debug!(candidate = %candidate, "actor might not be alive");
                    self.skipped.fetch_add(1, Ordering::Relaxed);
                    false
                }
            });
        Ok(hazard)
    }

    /// Evaluate one candidate against the ego's prebuilt footprint.
    pub fn evaluate(&self, ego: &Footprint, candidate: ActorId) -> CandidateOutcome {
        let Some((actor, path)) = self.lookup(candidate) else {
            return CandidateOutcome::Skipped(SkipReason::Untracked);
        };
        let state = match actor.state() {
            Ok(state) => state,
            Err(e)    => return CandidateOutcome::Skipped(e.into()),
        };
        if !state.location.is_finite() {
            return CandidateOutcome::Skipped(SkipReason::NonFiniteLocation);
        }

        let radius = self.config.search_radius;
        if ego.location.distance_squared_2d(state.location) > radius * radius {
            return CandidateOutcome::Clear;
        }

        let other = match path {
            Some(path) => ActorView::managed(state, path),
            None       => ActorView::unregistered(state),
        };
        if negotiate_against(ego, &other, &self.config) {
            CandidateOutcome::Hazard
        } else {
            CandidateOutcome::Clear
        }
    }

    fn lookup(&self, id: ActorId) -> Option<(&ActorRef, Option<&[Waypoint]>)> {
        match self.id_to_index.get(&id) {
            Some(&index) => {
                let data = &self.frame[index];
                Some((&data.actor, Some(data.buffer.as_slice())))
            }
            None => self.tracker.get(id).map(|actor| (actor, None)),
        }
    }
}

// ── Stats ─────────────────────────────────────────────────────────────────────

/// Counters reported by [`CollisionStage::stats`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionStats {
    /// Ticks published.
    pub ticks:         u64,
    /// Vehicles flagged in the most recent published tick.
    pub hazards:       usize,
    /// Candidate pairs skipped because of a stale or unreadable actor.
    pub skipped_pairs: u64,
    /// Unregistered actors ever discovered.
    pub discoveries:   u64,
    /// Unregistered actors ever evicted.
    pub evictions:     u64,
    /// Output slots detached from a lagging reader.
    pub contentions:   u64,
}

// ── CollisionStage ────────────────────────────────────────────────────────────

/// Pipeline stage between localization and motion planning.
///
/// Per tick:
///
/// 1. `receive` takes the newest [`LocalizationFrame`].
/// 2. `prepare` runs tracker maintenance and re-buckets managed vehicles.
/// 3. `execute` decides one [`HazardRecord`] per vehicle in its range.
/// 4. `send` publishes the filled buffer as a [`HazardFrame`].
///
/// Build with [`CollisionStageBuilder`][crate::CollisionStageBuilder].
pub struct CollisionStage {
    ctx:              CollisionContext,
    world:            Arc<dyn WorldBackend>,
    upstream:         Arc<Messenger<LocalizationFrame>>,
    downstream:       Arc<Messenger<HazardFrame>>,
    output:           DoubleBuffer<HazardRecord>,
    /// Managed ids of the frame seen by the previous maintenance.
    previous_managed: FxHashSet<ActorId>,
    seen:             Version,
    next_send:        Version,
    ticks:            u64,
    last_hazards:     usize,
}

impl CollisionStage {
    pub(crate) fn new(
        ctx:                CollisionContext,
        world:              Arc<dyn WorldBackend>,
        upstream:           Arc<Messenger<LocalizationFrame>>,
        downstream:         Arc<Messenger<HazardFrame>>,
        number_of_vehicles: usize,
    ) -> Self {
        let seen      = upstream.version();
        let next_send = downstream.version().next();
        Self {
            ctx,
            world,
            upstream,
            downstream,
            output: DoubleBuffer::new(number_of_vehicles),
            previous_managed: FxHashSet::default(),
            seen,
            next_send,
            ticks: 0,
            last_hazards: 0,
        }
    }

    pub fn context(&self) -> &CollisionContext {
        &self.ctx
    }

    /// Upstream version of the frame currently held.
    pub fn seen_version(&self) -> Version {
        self.seen
    }

    pub fn stats(&self) -> CollisionStats {
        CollisionStats {
            ticks:         self.ticks,
            hazards:       self.last_hazards,
            skipped_pairs: self.ctx.skipped.load(Ordering::Relaxed),
            discoveries:   self.ctx.tracker.discoveries(),
            evictions:     self.ctx.tracker.evictions(),
            contentions:   self.output.contentions(),
        }
    }

    /// The maintenance step at an explicit instant.
    pub fn maintain(&mut self, now: Instant) -> MaintenanceReport {
        self.ctx.maintain(now, self.world.as_ref(), &mut self.previous_managed)
    }
}

impl PipelineStage for CollisionStage {
    type Shared = CollisionContext;
    type Output = HazardRecord;

    fn receive(&mut self) -> PipelineResult<usize> {
        let packet = self.upstream.receive(self.seen)?;
        self.seen = packet.version;
        self.ctx.load_frame(packet.data);
        Ok(self.ctx.frame.len())
    }

    fn prepare(&mut self) -> PipelineResult<()> {
        let report = self.maintain(Instant::now());
        if report.discovered > 0 || report.evicted > 0 {
            debug!(
                discovered = report.discovered,
                evicted = report.evicted,
                tracked = self.ctx.tracker.len(),
                "unregistered actors maintained"
            );
        }
        Ok(())
    }

    fn workspace(&mut self) -> (&CollisionContext, &mut [HazardRecord]) {
        let len = self.ctx.frame.len();
        (&self.ctx, self.output.write_slot(len))
    }

    fn execute(ctx: &CollisionContext, range: Range<usize>, out: &mut [HazardRecord]) -> PipelineResult<()> {
        for (record, index) in out.iter_mut().zip(range) {
            record.hazard = ctx.hazard_for(index)?;
        }
        Ok(())
    }

    fn send(&mut self) -> PipelineResult<Version> {
        let hazards = self.output.write_target().iter().filter(|r| r.hazard).count();
        let version = self.next_send;
        self.downstream.publish(DataPacket::new(version, self.output.publish()))?;
        self.next_send    = version.next();
        self.ticks       += 1;
        self.last_hazards = hazards;
        trace!(%version, hazards, "published collision hazards");
        Ok(version)
    }

    fn close(&mut self) {
        self.downstream.close();
    }
}
