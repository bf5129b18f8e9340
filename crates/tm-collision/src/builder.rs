//! Fluent builder for constructing a [`CollisionStage`].

use std::sync::Arc;
use std::time::Instant;

use tm_core::CollisionConfig;
use tm_geometry::{DebugDraw, NoopDebugDraw};
use tm_pipeline::{Messenger, PipelineError, StageRunner, VersionOffset};
use tm_spatial::VicinityGrid;
use tm_world::WorldBackend;

use crate::{
    CollisionContext, CollisionResult, CollisionStage, HazardFrame, LocalizationFrame,
    UnregisteredTracker,
};

/// Fluent builder for [`CollisionStage`].
///
/// # Required inputs
///
/// - upstream channel carrying [`LocalizationFrame`]s
/// - downstream channel for [`HazardFrame`]s
/// - the [`WorldBackend`] used to discover unregistered actors
///
/// # Optional inputs (have defaults)
///
/// | Method                     | Default                          |
/// |----------------------------|----------------------------------|
/// | `.config(c)`               | `CollisionConfig::default()`     |
/// | `.pool_size(n)`            | `1`                              |
/// | `.number_of_vehicles(n)`   | `0` (output grows on demand)     |
/// | `.debug_draw(d)`           | `NoopDebugDraw`                  |
/// | `.version_offset(o)`       | `VersionOffset::LEADS_CONSUMER`  |
///
/// # Example
///
/// ```rust,ignore
/// let mut runner = CollisionStageBuilder::new(localization, planner, world)
///     .pool_size(4)
///     .number_of_vehicles(200)
///     .build_runner()?;
/// runner.run(&mut NoopObserver)?;
/// ```
pub struct CollisionStageBuilder {
    upstream:           Arc<Messenger<LocalizationFrame>>,
    downstream:         Arc<Messenger<HazardFrame>>,
    world:              Arc<dyn WorldBackend>,
    config:             CollisionConfig,
    pool_size:          usize,
    number_of_vehicles: usize,
    draw:               Arc<dyn DebugDraw>,
    offset:             VersionOffset,
}

impl CollisionStageBuilder {
    pub fn new(
        upstream:   Arc<Messenger<LocalizationFrame>>,
        downstream: Arc<Messenger<HazardFrame>>,
        world:      Arc<dyn WorldBackend>,
    ) -> Self {
        Self {
            upstream,
            downstream,
            world,
            config:             CollisionConfig::default(),
            pool_size:          1,
            number_of_vehicles: 0,
            draw:               Arc::new(NoopDebugDraw),
            offset:             VersionOffset::default(),
        }
    }

    pub fn config(mut self, config: CollisionConfig) -> Self {
        self.config = config;
        self
    }

    /// Worker threads used by [`build_runner`](Self::build_runner).
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Expected fleet size; pre-sizes both output buffers.
    pub fn number_of_vehicles(mut self, n: usize) -> Self {
        self.number_of_vehicles = n;
        self
    }

    pub fn debug_draw(mut self, draw: Arc<dyn DebugDraw>) -> Self {
        self.draw = draw;
        self
    }

    /// Required distance between the downstream and upstream channel
    /// versions at construction.
    pub fn version_offset(mut self, offset: VersionOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Validate inputs and build the stage.
    ///
    /// # Errors
    ///
    /// - [`CollisionError::Config`][crate::CollisionError::Config] if the
    ///   configuration fails validation.
    /// - [`CollisionError::Pipeline`][crate::CollisionError::Pipeline] if
    ///   `pool_size` is zero or the channels are not paired under the
    ///   version offset.
    pub fn build(self) -> CollisionResult<CollisionStage> {
        self.config.validate()?;
        if self.pool_size == 0 {
            return Err(PipelineError::Config("pool_size must be at least 1".into()).into());
        }
        self.offset.check(self.upstream.version(), self.downstream.version())?;

        let grid    = VicinityGrid::from_config(&self.config)?;
        let tracker = UnregisteredTracker::from_config(&self.config, Instant::now());
        let ctx     = CollisionContext::new(grid, tracker, self.config, self.draw);

        Ok(CollisionStage::new(
            ctx,
            self.world,
            self.upstream,
            self.downstream,
            self.number_of_vehicles,
        ))
    }

    /// Build the stage and wrap it in a [`StageRunner`] with `pool_size`
    /// workers.
    pub fn build_runner(self) -> CollisionResult<StageRunner<CollisionStage>> {
        let pool_size = self.pool_size;
        let stage = self.build()?;
        Ok(StageRunner::new(stage, pool_size)?)
    }
}
