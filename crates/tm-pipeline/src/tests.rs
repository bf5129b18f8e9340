//! Unit tests for tm-pipeline.

use std::ops::Range;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tm_core::Version;

use crate::{
    DataPacket, DoubleBuffer, Messenger, NoopObserver, PipelineError, PipelineResult,
    PipelineStage, RunnerObserver, StageRunner, VersionOffset, partition,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

type Channel = Arc<Messenger<Arc<Vec<u32>>>>;

/// Doubles every input value.  `u32::MAX` in the input fails the tick.
struct Doubler {
    upstream:   Channel,
    downstream: Channel,
    seen:       Version,
    next_send:  Version,
    input:      Arc<Vec<u32>>,
    output:     DoubleBuffer<u32>,
    /// One entry per `prepare`: was it called on a pool thread?
    prepared_on_pool: Vec<bool>,
}

impl Doubler {
    fn new(upstream: Channel, downstream: Channel) -> Self {
        let seen      = upstream.version();
        let next_send = downstream.version().next();
        Self {
            upstream,
            downstream,
            seen,
            next_send,
            input:  Arc::new(Vec::new()),
            output: DoubleBuffer::new(0),
            prepared_on_pool: Vec::new(),
        }
    }
}

impl PipelineStage for Doubler {
    type Shared = Arc<Vec<u32>>;
    type Output = u32;

    fn receive(&mut self) -> PipelineResult<usize> {
        let packet = self.upstream.receive(self.seen)?;
        self.seen  = packet.version;
        self.input = packet.data;
        Ok(self.input.len())
    }

    fn prepare(&mut self) -> PipelineResult<()> {
        self.prepared_on_pool.push(rayon::current_thread_index().is_some());
        Ok(())
    }

    fn workspace(&mut self) -> (&Self::Shared, &mut [u32]) {
        let len = self.input.len();
        (&self.input, self.output.write_slot(len))
    }

    fn execute(shared: &Self::Shared, range: Range<usize>, out: &mut [u32]) -> PipelineResult<()> {
        for (slot, i) in out.iter_mut().zip(range) {
            if shared[i] == u32::MAX {
                return Err(PipelineError::Stage(format!("poisoned input at {i}")));
            }
            *slot = shared[i] * 2;
        }
        Ok(())
    }

    fn send(&mut self) -> PipelineResult<Version> {
        let version = self.next_send;
        self.downstream.publish(DataPacket::new(version, self.output.publish()))?;
        self.next_send = version.next();
        Ok(version)
    }

    fn close(&mut self) {
        self.downstream.close();
    }
}

fn channels(up: u64, down: u64) -> (Channel, Channel) {
    (
        Arc::new(Messenger::with_version(Version(up))),
        Arc::new(Messenger::with_version(Version(down))),
    )
}

fn feed(channel: &Channel, data: Vec<u32>) {
    let next = channel.version().next();
    channel.publish(DataPacket::new(next, Arc::new(data))).unwrap();
}

// ── Messenger ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod messenger_tests {
    use super::*;

    #[test]
    fn publish_advances_by_one() {
        let m: Messenger<u32> = Messenger::new();
        assert_eq!(m.publish(DataPacket::new(Version(1), 10)), Ok(Version(1)));
        assert_eq!(m.publish(DataPacket::new(Version(2), 20)), Ok(Version(2)));
        assert_eq!(m.version(), Version(2));
    }

    #[test]
    fn gap_and_repeat_are_desync() {
        let m: Messenger<u32> = Messenger::with_version(Version(5));
        assert_eq!(
            m.publish(DataPacket::new(Version(7), 0)),
            Err(PipelineError::VersionDesync { expected: Version(6), got: Version(7) })
        );
        assert_eq!(
            m.publish(DataPacket::new(Version(5), 0)),
            Err(PipelineError::VersionDesync { expected: Version(6), got: Version(5) })
        );
        assert_eq!(m.version(), Version(5));
        assert_eq!(m.try_receive(Version(0)), Ok(None));
    }

    #[test]
    fn latest_wins() {
        let m: Messenger<u32> = Messenger::new();
        for v in 1..=3 {
            m.publish(DataPacket::new(Version(v), v as u32 * 100)).unwrap();
        }
        let packet = m.receive(Version(0)).unwrap();
        assert_eq!(packet, DataPacket::new(Version(3), 300));
        assert_eq!(m.try_receive(Version(3)), Ok(None));
    }

    #[test]
    fn receive_blocks_until_publish() {
        let m: Arc<Messenger<u32>> = Arc::new(Messenger::new());
        let reader = {
            let m = Arc::clone(&m);
            thread::spawn(move || m.receive(Version(0)))
        };
        thread::sleep(Duration::from_millis(20));
        m.publish(DataPacket::new(Version(1), 7)).unwrap();
        assert_eq!(reader.join().unwrap(), Ok(DataPacket::new(Version(1), 7)));
    }

    #[test]
    fn close_wakes_blocked_receiver() {
        let m: Arc<Messenger<u32>> = Arc::new(Messenger::new());
        let reader = {
            let m = Arc::clone(&m);
            thread::spawn(move || m.receive(Version(0)))
        };
        thread::sleep(Duration::from_millis(20));
        m.close();
        assert_eq!(reader.join().unwrap(), Err(PipelineError::Closed));
    }

    #[test]
    fn close_still_delivers_last_packet() {
        let m: Messenger<u32> = Messenger::new();
        m.publish(DataPacket::new(Version(1), 1)).unwrap();
        m.close();
        assert!(m.is_closed());
        assert_eq!(m.receive(Version(0)), Ok(DataPacket::new(Version(1), 1)));
        assert_eq!(m.receive(Version(1)), Err(PipelineError::Closed));
        assert_eq!(m.publish(DataPacket::new(Version(2), 2)), Err(PipelineError::Closed));
    }
}

// ── VersionOffset ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod offset_tests {
    use super::*;

    #[test]
    fn default_leads_consumer() {
        assert_eq!(VersionOffset::default(), VersionOffset(-1));
        assert_eq!(VersionOffset::default().apply(Version(4)), Some(Version(3)));
    }

    #[test]
    fn check_accepts_paired_channels() {
        assert!(VersionOffset::LEADS_CONSUMER.check(Version(1), Version(0)).is_ok());
        assert!(VersionOffset::ALIGNED.check(Version(3), Version(3)).is_ok());
    }

    #[test]
    fn check_rejects_mispaired_channels() {
        assert!(matches!(
            VersionOffset::LEADS_CONSUMER.check(Version(1), Version(1)),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            VersionOffset::LEADS_CONSUMER.check(Version(0), Version(0)),
            Err(PipelineError::Config(_))
        ));
    }
}

// ── DoubleBuffer ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod buffer_tests {
    use super::*;

    #[test]
    fn publish_flips_slots() {
        let mut b: DoubleBuffer<u8> = DoubleBuffer::new(3);
        assert_eq!(b.active(), 0);
        b.write_slot(3).copy_from_slice(&[1, 2, 3]);
        let first = b.publish();
        assert_eq!(b.active(), 1);
        assert_eq!(*first, vec![1, 2, 3]);
        assert_eq!(b.write_target(), &[0, 0, 0]);
    }

    #[test]
    fn resizes_with_snapshot() {
        let mut b: DoubleBuffer<u8> = DoubleBuffer::new(2);
        assert_eq!(b.write_slot(5).len(), 5);
        assert_eq!(b.write_slot(1).len(), 1);
    }

    #[test]
    fn released_slot_is_reused_without_contention() {
        let mut b: DoubleBuffer<u8> = DoubleBuffer::new(1);
        for _ in 0..4 {
            b.write_slot(1)[0] = 9;
            drop(b.publish());
        }
        assert_eq!(b.contentions(), 0);
    }

    #[test]
    fn held_slot_is_never_mutated() {
        let mut b: DoubleBuffer<u8> = DoubleBuffer::new(2);
        b.write_slot(2).copy_from_slice(&[1, 1]);
        let held = b.publish();                 // reader keeps slot 0
        b.write_slot(2).copy_from_slice(&[2, 2]);
        drop(b.publish());

        // Slot 0 is the write target again while `held` is alive.
        b.write_slot(2).copy_from_slice(&[3, 3]);
        assert_eq!(b.contentions(), 1);
        assert_eq!(*held, vec![1, 1]);
        assert_eq!(*b.publish(), vec![3, 3]);
    }
}

// ── Partitioning ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod partition_tests {
    use super::*;

    #[test]
    fn even_split() {
        assert_eq!(partition(9, 3), vec![0..3, 3..6, 6..9]);
    }

    #[test]
    fn remainder_goes_to_leading_ranges() {
        assert_eq!(partition(10, 4), vec![0..3, 3..6, 6..8, 8..10]);
    }

    #[test]
    fn fewer_items_than_workers() {
        assert_eq!(partition(2, 8), vec![0..1, 1..2]);
    }

    #[test]
    fn empty_snapshot_has_no_ranges() {
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn zero_workers_means_one() {
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn ranges_cover_exactly_once() {
        for len in 0..40 {
            for workers in 1..9 {
                let ranges = partition(len, workers);
                assert!(ranges.len() <= workers);
                let mut next = 0;
                for r in &ranges {
                    assert_eq!(r.start, next);
                    assert!(!r.is_empty());
                    next = r.end;
                }
                assert_eq!(next, len);
            }
        }
    }
}

// ── StageRunner ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod runner_tests {
    use super::*;

    #[test]
    fn zero_pool_size_is_rejected() {
        let (up, down) = channels(0, 0);
        assert!(matches!(
            StageRunner::new(Doubler::new(up, down), 0),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn tick_fills_every_slot() {
        let (up, down) = channels(1, 0);
        let mut runner = StageRunner::new(Doubler::new(Arc::clone(&up), Arc::clone(&down)), 3).unwrap();

        feed(&up, (0..10).collect());
        assert_eq!(runner.tick(), Ok(Version(1)));

        let out = down.receive(Version(0)).unwrap();
        assert_eq!(*out.data, (0..10).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn prepare_runs_on_pool_before_execute() {
        let (up, down) = channels(1, 0);
        let mut runner = StageRunner::new(Doubler::new(Arc::clone(&up), down), 2).unwrap();
        feed(&up, vec![1, 2, 3]);
        runner.tick().unwrap();
        assert_eq!(runner.stage().prepared_on_pool, vec![true]);
    }

    #[test]
    fn stage_outlives_its_runner() {
        let (up, down) = channels(1, 0);
        let mut runner = StageRunner::new(Doubler::new(Arc::clone(&up), Arc::clone(&down)), 2).unwrap();
        feed(&up, vec![1]);
        assert_eq!(runner.tick(), Ok(Version(1)));

        let mut runner = StageRunner::new(runner.into_stage(), 1).unwrap();
        feed(&up, vec![5, 6]);
        assert_eq!(runner.tick(), Ok(Version(2)));
        assert_eq!(*down.receive(Version(1)).unwrap().data, vec![10, 12]);
        assert_eq!(runner.stage().prepared_on_pool, vec![true, true]);
    }

    #[test]
    fn downstream_versions_are_gapless() {
        let (up, down) = channels(1, 0);
        let mut runner = StageRunner::new(Doubler::new(Arc::clone(&up), Arc::clone(&down)), 2).unwrap();

        let mut observed = Vec::new();
        let mut held     = Vec::new();
        for i in 0..6 {
            feed(&up, vec![i; 4]);
            runner.tick().unwrap();
            let packet = down.receive(observed.last().copied().unwrap_or(Version(0))).unwrap();
            observed.push(packet.version);
            // Every delivered buffer still holds exactly what was written for it.
            assert!(packet.data.iter().all(|&x| x == i * 2));
            held.push(packet.data);
        }
        assert_eq!(observed, (1..=6).map(Version).collect::<Vec<_>>());
        for (i, data) in held.iter().enumerate() {
            assert!(data.iter().all(|&x| x == i as u32 * 2));
        }
        // The reader kept every buffer, so each reuse of a slot had to detach.
        assert_eq!(runner.stage().output.contentions(), 4);
    }

    #[test]
    fn execute_error_fails_the_tick_without_publishing() {
        let (up, down) = channels(1, 0);
        let mut runner = StageRunner::new(Doubler::new(Arc::clone(&up), Arc::clone(&down)), 2).unwrap();
        feed(&up, vec![1, u32::MAX, 3]);
        assert!(matches!(runner.tick(), Err(PipelineError::Stage(_))));
        assert_eq!(down.version(), Version(0));
    }

    #[test]
    fn empty_snapshot_still_publishes() {
        let (up, down) = channels(1, 0);
        let mut runner = StageRunner::new(Doubler::new(Arc::clone(&up), Arc::clone(&down)), 4).unwrap();
        feed(&up, Vec::new());
        assert_eq!(runner.tick(), Ok(Version(1)));
        assert!(down.receive(Version(0)).unwrap().data.is_empty());
    }

    #[derive(Default)]
    struct Counter {
        ends:    Vec<(u64, Version, usize)>,
        stopped: Option<u64>,
    }

    impl RunnerObserver for Counter {
        fn on_tick_end(&mut self, tick: u64, version: Version, len: usize) {
            self.ends.push((tick, version, len));
        }
        fn on_stop(&mut self, ticks: u64) {
            self.stopped = Some(ticks);
        }
    }

    #[test]
    fn run_ticks_reports_each_tick() {
        let (up, down) = channels(1, 0);
        let mut runner = StageRunner::new(Doubler::new(Arc::clone(&up), down), 2).unwrap();
        let mut obs = Counter::default();

        feed(&up, vec![1, 2]);
        runner.run_ticks(1, &mut obs).unwrap();
        feed(&up, vec![1, 2, 3]);
        runner.run_ticks(1, &mut obs).unwrap();

        assert_eq!(obs.ends, vec![(0, Version(1), 2), (1, Version(2), 3)]);
        assert_eq!(runner.ticks(), 2);
    }

    #[test]
    fn run_until_upstream_closes() {
        let (up, down) = channels(1, 0);
        let producer = {
            let (up, down) = (Arc::clone(&up), Arc::clone(&down));
            thread::spawn(move || {
                let mut seen = Version(0);
                for i in 0..5 {
                    feed(&up, vec![i; 3]);
                    seen = down.receive(seen).unwrap().version;
                }
                up.close();
                seen
            })
        };

        let mut runner = StageRunner::new(Doubler::new(up, Arc::clone(&down)), 2).unwrap();
        let mut obs = Counter::default();
        assert_eq!(runner.run(&mut obs), Ok(5));
        assert_eq!(obs.stopped, Some(5));
        assert_eq!(producer.join().unwrap(), Version(5));
        assert!(down.is_closed());
    }

    #[test]
    fn run_closes_downstream_on_error() {
        let (up, down) = channels(1, 0);
        let mut runner = StageRunner::new(Doubler::new(Arc::clone(&up), Arc::clone(&down)), 1).unwrap();
        feed(&up, vec![u32::MAX]);
        assert!(runner.run(&mut NoopObserver).is_err());
        assert!(down.is_closed());
    }
}
