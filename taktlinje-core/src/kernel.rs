//! # DES Kernel
//!
//! The discrete-event core: pops events in `(time, sequence)` order, mutates
//! line state through the station status machine, and resolves all possible
//! transfers and service starts at each decision boundary.
//!
//! Stale events are expected, not errors: a `MachineFailure` scheduled
//! speculatively at service start is simply discarded when the service
//! already completed, validated against current station state on pop.

use std::collections::VecDeque;

use tracing::{debug, trace};

use taktlinje_config::{LineConfig, QueueBackend};
use taktlinje_telemetry::MetricsRecorder;

use crate::clock::SimClock;
use crate::error::KernelError;
use crate::events::{Event, EventKind, EventQueue, HeapQueue, OrderedQueue};
use crate::line::{Station, StationStatus};
use crate::snapshot::{compute_reward, LastEvent, Snapshot, StationView, Summary};
use crate::timing::TimingModel;

/// Tolerance when matching a popped `ServiceComplete` against the station's
/// recorded end time.
const END_TIME_EPSILON: f64 = 1e-9;

/// Capability contract of the simulation kernel.
///
/// Both queue backends implement identical semantics behind this trait;
/// callers hold a `Box<dyn Kernel>` and never see the backend type.
pub trait Kernel {
    /// (Re)initialize all state with `n_jobs` queued ahead of station 0,
    /// returning the snapshot after the implicit first resolution pass.
    fn reset(&mut self, seed: Option<u64>, n_jobs: usize) -> Snapshot;

    /// Apply a speed multiplier (if given) and resolve the line to a fixed
    /// point at the current instant. Never advances the clock.
    fn apply_action(&mut self, speed_mult: Option<f64>);

    /// Advance until one non-stale event has been handled, then resolve and
    /// snapshot. Returns the unchanged state when the queue drains first.
    fn run_until_next_decision(&mut self) -> Snapshot;

    /// Process events until every job has completed or the queue drains.
    fn run_to_finish(&mut self) -> Summary;

    /// Pure projection of current state.
    fn snapshot(&self) -> Snapshot;

    /// Aggregate statistics, valid at any time.
    fn summary(&self) -> Summary;

    /// Hex digest of the full mutable state, for determinism checks.
    fn state_digest(&self) -> String;

    /// Apply a speed multiplier, advance to the next decision boundary, and
    /// return the snapshot with its reward.
    fn step(&mut self, speed_mult: f64) -> (Snapshot, f64) {
        self.apply_action(Some(speed_mult));
        let snapshot = self.run_until_next_decision();
        let reward = compute_reward(&snapshot);
        (snapshot, reward)
    }
}

/// Construct a kernel for the selected queue backend.
pub fn build_kernel(
    config: &LineConfig,
    backend: QueueBackend,
) -> Result<Box<dyn Kernel>, KernelError> {
    match backend {
        QueueBackend::Heap => Ok(Box::new(LineKernel::<HeapQueue>::new(config)?)),
        QueueBackend::Ordered => Ok(Box::new(LineKernel::<OrderedQueue>::new(config)?)),
    }
}

/// Kernel over a heap-backed event queue.
pub type HeapKernel = LineKernel<HeapQueue>;
/// Kernel over an ordered-map-backed event queue.
pub type OrderedKernel = LineKernel<OrderedQueue>;

/// Serial production line simulator, generic over the event queue backend.
///
/// Owns every piece of mutable state exclusively; one instance per concurrent
/// simulation, no sharing of RNG, queue, or station arrays between instances.
pub struct LineKernel<Q: EventQueue> {
    // Fixed configuration
    n_stations: usize,
    buffer_caps: Vec<usize>,
    proc_means: Vec<f64>,
    util_alpha: f64,
    repair_time: f64,
    workers_total: usize,

    // Mutable state, rebuilt on reset
    timing: TimingModel,
    clock: SimClock,
    queue: Q,
    seq: u64,
    stations: Vec<Station>,
    buffers: Vec<usize>,
    current_speed: f64,
    workers_available: usize,
    repair_queue: VecDeque<usize>,
    jobs_total: usize,
    jobs_completed: usize,
    jobs_scrapped: usize,
    job_queue: VecDeque<usize>,
    wip_history: Vec<usize>,
    throughput_total: usize,
    throughput_since_decision: usize,
    t_last_decision: f64,
    last_event: Option<LastEvent>,

    metrics: MetricsRecorder,
}

impl<Q: EventQueue> LineKernel<Q> {
    /// Validate the configuration and build an empty kernel. The line holds
    /// no jobs until the first `reset`.
    pub fn new(config: &LineConfig) -> Result<Self, KernelError> {
        config.ensure_consistent()?;
        if !(0.0..=1.0).contains(&config.fail_rate) {
            return Err(KernelError::Config(format!(
                "fail_rate {} must lie in [0, 1]",
                config.fail_rate
            )));
        }
        if !(config.util_alpha > 0.0 && config.util_alpha <= 1.0) {
            return Err(KernelError::Config(format!(
                "util_alpha {} must lie in (0, 1]",
                config.util_alpha
            )));
        }
        if !(config.repair_time > 0.0 && config.repair_time.is_finite()) {
            return Err(KernelError::Config(format!(
                "repair_time {} must be positive",
                config.repair_time
            )));
        }
        if let Some(mean) = config
            .proc_means
            .iter()
            .find(|m| !(m.is_finite() && **m > 0.0))
        {
            return Err(KernelError::Config(format!(
                "proc_means entry {mean} must be positive"
            )));
        }

        let dists = config.proc_dists.resolve(config.n_stations)?;
        let timing = TimingModel::new(&config.proc_means, &dists, config.fail_rate, None)?;

        Ok(Self {
            n_stations: config.n_stations,
            buffer_caps: config.buffer_caps.clone(),
            proc_means: config.proc_means.clone(),
            util_alpha: config.util_alpha,
            repair_time: config.repair_time,
            workers_total: config.workers,
            timing,
            clock: SimClock::new(),
            queue: Q::default(),
            seq: 0,
            stations: (0..config.n_stations).map(|_| Station::new()).collect(),
            buffers: vec![0; config.n_stations - 1],
            current_speed: 1.0,
            workers_available: config.workers,
            repair_queue: VecDeque::new(),
            jobs_total: 0,
            jobs_completed: 0,
            jobs_scrapped: 0,
            job_queue: VecDeque::new(),
            wip_history: Vec::new(),
            throughput_total: 0,
            throughput_since_decision: 0,
            t_last_decision: 0.0,
            last_event: None,
            metrics: MetricsRecorder::new(),
        })
    }

    /// Prometheus collectors this kernel updates.
    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Jobs the current run was seeded with.
    pub fn jobs_total(&self) -> usize {
        self.jobs_total
    }

    /// Jobs that have departed the last station.
    pub fn jobs_completed(&self) -> usize {
        self.jobs_completed
    }

    /// Jobs still waiting ahead of station 0.
    pub fn jobs_queued(&self) -> usize {
        self.job_queue.len()
    }

    /// Units lost to machine failures at non-first stations.
    pub fn jobs_scrapped(&self) -> usize {
        self.jobs_scrapped
    }

    fn schedule(&mut self, t: f64, kind: EventKind, station: usize) {
        self.queue.schedule(Event {
            t,
            seq: self.seq,
            kind,
            station,
        });
        self.seq += 1;
    }

    /// Advance the clock, decaying every station's utilization EMA over the
    /// elapsed interval. Stale events advance time too, so the decay sees
    /// every interval exactly once.
    fn advance_to(&mut self, t: f64) {
        let dt = self.clock.advance_to(t);
        if dt > 0.0 {
            let decay = (1.0 - self.util_alpha).powf(dt);
            for station in &mut self.stations {
                station.decay_util(decay);
            }
        }
    }

    /// Dispatch one popped event. Returns false when the event is stale.
    fn handle(&mut self, event: Event) -> bool {
        let handled = match event.kind {
            EventKind::ServiceComplete => self.handle_service_complete(event.station),
            EventKind::MachineFailure => self.handle_machine_failure(event.station),
            EventKind::RepairComplete => self.handle_repair_complete(event.station),
        };
        if handled {
            self.metrics.events_handled.inc();
        } else {
            trace!(
                kind = event.kind.as_str(),
                station = event.station,
                t = event.t,
                "discarding stale event"
            );
            self.metrics.events_stale.inc();
        }
        handled
    }

    fn handle_service_complete(&mut self, sid: usize) -> bool {
        if sid >= self.n_stations {
            return false;
        }
        let now = self.clock.now();
        let valid = {
            let station = &self.stations[sid];
            station.status == StationStatus::Working
                && station
                    .end_time
                    .is_some_and(|end| (end - now).abs() <= END_TIME_EPSILON)
        };
        if !valid {
            return false;
        }

        {
            let station = &mut self.stations[sid];
            station.status = StationStatus::Idle;
            station.end_time = None;
            station.job_id = None;
        }

        if sid == self.n_stations - 1 {
            // Departure from the line.
            self.stations[sid].has_finished_part = false;
            self.throughput_total += 1;
            self.throughput_since_decision += 1;
            self.jobs_completed += 1;
            self.metrics.jobs_completed.inc();
            debug!(station = sid, completed = self.jobs_completed, "job departed");
        } else if self.buffers[sid] < self.buffer_caps[sid] {
            self.buffers[sid] += 1;
            self.stations[sid].has_finished_part = false;
        } else {
            // Output buffer full: hold the finished unit in place.
            self.stations[sid].status = StationStatus::Blocked;
            self.stations[sid].has_finished_part = true;
        }
        true
    }

    fn handle_machine_failure(&mut self, sid: usize) -> bool {
        if sid >= self.n_stations || self.stations[sid].status != StationStatus::Working {
            return false;
        }

        // Station 0 returns its raw-material job to the head of the queue to
        // be retried. Downstream stations scrap the unit in progress: the
        // consumed buffer slot is not refunded, so a full buffer can never
        // be pushed over capacity by a failure.
        if sid == 0 {
            if let Some(job_id) = self.stations[sid].job_id.take() {
                self.job_queue.push_front(job_id);
            }
        } else {
            self.jobs_scrapped += 1;
            self.metrics.jobs_scrapped.inc();
        }

        {
            let station = &mut self.stations[sid];
            station.status = StationStatus::Down;
            station.job_id = None;
            station.clear_transients();
        }
        self.metrics.machine_failures.inc();
        debug!(station = sid, t = self.clock.now(), "machine failure");

        if self.workers_available > 0 {
            self.assign_repair_worker(sid);
        } else if !self.repair_queue.contains(&sid) {
            self.repair_queue.push_back(sid);
        }
        true
    }

    fn handle_repair_complete(&mut self, sid: usize) -> bool {
        if sid >= self.n_stations || self.stations[sid].status != StationStatus::Down {
            return false;
        }

        {
            let station = &mut self.stations[sid];
            station.status = StationStatus::Idle;
            station.clear_transients();
        }
        self.workers_available = (self.workers_available + 1).min(self.workers_total);
        self.metrics.repairs_completed.inc();
        debug!(station = sid, t = self.clock.now(), "repair complete");

        // Hand the freed worker to the longest-waiting down station. The
        // requeue covers the case where the queued station changed state
        // between enqueue and now.
        if let Some(next_sid) = self.repair_queue.pop_front() {
            if !self.assign_repair_worker(next_sid) {
                self.repair_queue.push_front(next_sid);
            }
        }
        true
    }

    fn assign_repair_worker(&mut self, sid: usize) -> bool {
        if sid >= self.n_stations || self.workers_available == 0 {
            return false;
        }
        if self.stations[sid].status != StationStatus::Down || self.stations[sid].repairing {
            return false;
        }
        let eta = self.clock.now() + self.repair_time;
        self.stations[sid].repairing = true;
        self.stations[sid].repair_eta = Some(eta);
        self.workers_available -= 1;
        self.schedule(eta, EventKind::RepairComplete, sid);
        true
    }

    /// One greedy resolution pass at the current instant: clear blocked
    /// stations left to right, then start every idle station that can pull
    /// input. Returns whether anything changed.
    fn resolve_once(&mut self) -> bool {
        let mut progress = false;

        // Transfers first, so a freed buffer slot can host a push within the
        // same pass.
        for i in 0..self.n_stations {
            if self.stations[i].status != StationStatus::Blocked
                || !self.stations[i].has_finished_part
            {
                continue;
            }
            if i == self.n_stations - 1 {
                self.stations[i].status = StationStatus::Idle;
                self.stations[i].has_finished_part = false;
                self.throughput_total += 1;
                self.throughput_since_decision += 1;
                progress = true;
            } else if self.buffers[i] < self.buffer_caps[i] {
                self.buffers[i] += 1;
                self.stations[i].status = StationStatus::Idle;
                self.stations[i].has_finished_part = false;
                progress = true;
            }
        }

        for i in 0..self.n_stations {
            if self.stations[i].status != StationStatus::Idle {
                continue;
            }

            let can_pull = if i == 0 {
                !self.job_queue.is_empty()
            } else {
                self.buffers[i - 1] > 0
            };
            if !can_pull {
                self.stations[i].starved = true;
                continue;
            }

            let job_id = if i == 0 {
                self.job_queue.pop_front()
            } else {
                self.buffers[i - 1] -= 1;
                None
            };

            let duration = self.timing.sample_service(i, self.current_speed);
            self.metrics.service_duration.observe(duration);
            let end = self.clock.now() + duration;
            {
                let station = &mut self.stations[i];
                station.job_id = job_id;
                station.starved = false;
                station.status = StationStatus::Working;
                station.end_time = Some(end);
            }
            self.schedule(end, EventKind::ServiceComplete, i);
            if let Some(offset) = self.timing.sample_failure_offset(duration) {
                self.schedule(self.clock.now() + offset, EventKind::MachineFailure, i);
            }
            trace!(station = i, duration, "service started");
            progress = true;
        }

        progress
    }

    fn wip(&self) -> usize {
        self.buffers.iter().sum::<usize>()
            + self
                .stations
                .iter()
                .filter(|s| {
                    s.status == StationStatus::Working || s.status == StationStatus::Blocked
                })
                .count()
    }
}

impl<Q: EventQueue> Kernel for LineKernel<Q> {
    fn reset(&mut self, seed: Option<u64>, n_jobs: usize) -> Snapshot {
        self.timing.reseed(seed);
        self.clock.reset();
        self.queue.clear();
        self.seq = 0;
        self.current_speed = 1.0;
        self.throughput_total = 0;
        self.throughput_since_decision = 0;
        self.workers_available = self.workers_total;
        self.repair_queue.clear();
        self.buffers = vec![0; self.n_stations - 1];
        self.stations = (0..self.n_stations).map(|_| Station::new()).collect();
        self.jobs_total = n_jobs;
        self.jobs_completed = 0;
        self.jobs_scrapped = 0;
        self.job_queue = (0..n_jobs).collect();
        self.wip_history.clear();
        self.t_last_decision = 0.0;
        self.last_event = None;

        debug!(n_jobs, seed = ?seed, "kernel reset");
        self.apply_action(None);
        self.snapshot()
    }

    fn apply_action(&mut self, speed_mult: Option<f64>) {
        if let Some(speed) = speed_mult {
            self.current_speed = speed;
        }
        // Iterate to a fixed point; the clock does not move.
        while self.resolve_once() {}
    }

    fn run_until_next_decision(&mut self) -> Snapshot {
        self.throughput_since_decision = 0;
        while let Some(event) = self.queue.pop_earliest() {
            self.advance_to(event.t);
            if self.handle(event) {
                self.last_event = Some(LastEvent {
                    kind: event.kind,
                    station: event.station,
                });
                self.apply_action(None);
                break;
            }
        }

        let snapshot = self.snapshot();
        self.t_last_decision = self.clock.now();
        snapshot
    }

    fn run_to_finish(&mut self) -> Summary {
        while self.jobs_completed < self.jobs_total {
            let Some(event) = self.queue.pop_earliest() else {
                if self.jobs_completed + self.jobs_scrapped < self.jobs_total {
                    // Deadlock or starvation: nothing can make further progress.
                    debug!(
                        completed = self.jobs_completed,
                        scrapped = self.jobs_scrapped,
                        total = self.jobs_total,
                        "event queue drained before all jobs were accounted for"
                    );
                }
                break;
            };
            self.advance_to(event.t);
            if self.handle(event) {
                self.last_event = Some(LastEvent {
                    kind: event.kind,
                    station: event.station,
                });
                self.wip_history.push(self.wip());
                self.apply_action(None);
            }
        }
        self.summary()
    }

    fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let mut working = 0;
        let mut blocked = 0;
        let mut starved = 0;
        let mut down = 0;

        let stations: Vec<StationView> = self
            .stations
            .iter()
            .map(|station| {
                match station.status {
                    StationStatus::Working => working += 1,
                    StationStatus::Blocked => blocked += 1,
                    StationStatus::Down => down += 1,
                    StationStatus::Idle => {}
                }
                if station.starved {
                    starved += 1;
                }

                let remaining = if station.status == StationStatus::Working {
                    (station.end_time.unwrap_or(now) - now).max(0.0)
                } else {
                    0.0
                };
                let repair_remaining = if station.status == StationStatus::Down {
                    (station.repair_eta.unwrap_or(now) - now).max(0.0)
                } else {
                    0.0
                };

                StationView {
                    status: station.status.code(),
                    remaining,
                    util_ema: station.util_ema,
                    starved: station.starved,
                    blocked: station.status == StationStatus::Blocked,
                    down: station.status == StationStatus::Down,
                    repairing: station.repairing,
                    repair_remaining,
                }
            })
            .collect();

        let buffers = self
            .buffers
            .iter()
            .enumerate()
            .map(|(i, &level)| (format!("b{}{}", i + 1, i + 2), level))
            .collect();

        let avg_processing_time = if self.proc_means.is_empty() {
            0.0
        } else {
            self.proc_means.iter().sum::<f64>() / self.proc_means.len() as f64
        };
        let avg_processing_speed = if avg_processing_time > 0.0 {
            1.0 / avg_processing_time
        } else {
            0.0
        };

        Snapshot {
            t: now,
            t_start: self.t_last_decision,
            t_end: now,
            event: self.last_event,
            buffers,
            stations,
            throughput: self.throughput_since_decision,
            wip: self.buffers.iter().sum::<usize>() + working + blocked,
            blocked,
            starved,
            down,
            workers_available: self.workers_available,
            workers_total: self.workers_total,
            avg_processing_time,
            avg_processing_speed,
        }
    }

    fn summary(&self) -> Summary {
        let makespan = self.clock.now();
        let avg_wip = if self.wip_history.is_empty() {
            0.0
        } else {
            self.wip_history.iter().sum::<usize>() as f64 / self.wip_history.len() as f64
        };
        let avg_util = if self.stations.is_empty() {
            0.0
        } else {
            self.stations.iter().map(|s| s.util_ema).sum::<f64>() / self.stations.len() as f64
        };
        let throughput_rate = if makespan > 0.0 {
            self.jobs_completed as f64 / makespan
        } else {
            0.0
        };

        Summary {
            total_jobs: self.jobs_total,
            jobs_completed: self.jobs_completed,
            jobs_scrapped: self.jobs_scrapped,
            makespan,
            avg_wip,
            avg_util,
            throughput_rate,
            down_stations: self
                .stations
                .iter()
                .filter(|s| s.status == StationStatus::Down)
                .count(),
            workers_available: self.workers_available,
            workers_total: self.workers_total,
        }
    }

    fn state_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.clock.now().to_bits().to_le_bytes());
        hasher.update(&self.current_speed.to_bits().to_le_bytes());
        hasher.update(&self.seq.to_le_bytes());
        hasher.update(&(self.jobs_total as u64).to_le_bytes());
        hasher.update(&(self.jobs_completed as u64).to_le_bytes());
        hasher.update(&(self.jobs_scrapped as u64).to_le_bytes());
        hasher.update(&(self.throughput_total as u64).to_le_bytes());
        hasher.update(&(self.throughput_since_decision as u64).to_le_bytes());
        hasher.update(&(self.workers_available as u64).to_le_bytes());
        for &level in &self.buffers {
            hasher.update(&(level as u64).to_le_bytes());
        }
        for station in &self.stations {
            hasher.update(&[
                station.status.code(),
                u8::from(station.starved),
                u8::from(station.has_finished_part),
                u8::from(station.repairing),
            ]);
            hasher.update(&station.end_time.unwrap_or(-1.0).to_bits().to_le_bytes());
            hasher.update(&station.repair_eta.unwrap_or(-1.0).to_bits().to_le_bytes());
            hasher.update(&station.util_ema.to_bits().to_le_bytes());
        }
        for &sid in &self.repair_queue {
            hasher.update(&(sid as u64).to_le_bytes());
        }
        for &job in &self.job_queue {
            hasher.update(&(job as u64).to_le_bytes());
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}
