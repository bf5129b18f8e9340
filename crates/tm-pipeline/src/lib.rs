//! `tm-pipeline` — the plumbing between traffic-manager stages.
//!
//! Stages run in a fixed order every tick and exchange snapshots through
//! versioned single-slot channels.  Each stage executes on its own fixed
//! worker pool, partitioning its snapshot into contiguous index ranges.
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`messenger`] | `Messenger<T>`, `DataPacket<T>`, `VersionOffset`      |
//! | [`buffer`]    | `DoubleBuffer<T>` output slots with contention check  |
//! | [`stage`]     | `PipelineStage`, `StageRunner`, `partition`, observer |
//! | [`error`]     | `PipelineError`, `PipelineResult`                     |
//!
//! # Wiring
//!
//! ```rust,ignore
//! let upstream   = Arc::new(Messenger::with_version(Version(1)));
//! let downstream = Arc::new(Messenger::with_version(Version(0)));
//! VersionOffset::LEADS_CONSUMER.check(upstream.version(), downstream.version())?;
//!
//! let mut runner = StageRunner::new(my_stage, 4)?;
//! runner.run(&mut NoopObserver)?;   // until `upstream.close()`
//! ```

pub mod buffer;
pub mod error;
pub mod messenger;
pub mod stage;

#[cfg(test)]
mod tests;

pub use buffer::DoubleBuffer;
pub use error::{PipelineError, PipelineResult};
pub use messenger::{DataPacket, Messenger, VersionOffset};
pub use stage::{NoopObserver, PipelineStage, RunnerObserver, StageRunner, partition};
