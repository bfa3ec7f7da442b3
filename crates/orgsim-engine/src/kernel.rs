//! The `Kernel`: the top-level simulation façade.
//!
//! # Architecture
//!
//! All simulation state lives in one `Shared` struct behind an `Arc`,
//! sharded by concern exactly as the concurrency model prescribes:
//!
//! | Shard        | Guard                         | Writers                  |
//! |--------------|-------------------------------|--------------------------|
//! | clock        | internal lock + condvar       | pump only                |
//! | registry     | per-agent mutexes             | pump (apply phase)       |
//! | tracking     | `RwLock` (readers ∥ 1 writer) | pump, send, stop         |
//! | wisdom       | `RwLock`                      | pump                     |
//! | escalation   | `Mutex`                       | pump                     |
//! | events       | `Mutex`                       | pump, send, stop         |
//! | pump         | `Mutex` + condvars            | pump thread / callers    |
//!
//! Lock order, outermost first: pump → tracking → agent dynamics → wisdom →
//! escalation → events → observer.  Every path below acquires in that order,
//! never the reverse.
//!
//! # Pump
//!
//! Work is processed one simulated instant at a time.  Each instant runs two
//! phases, mirroring the decision/apply split of the behavior engine: all
//! due prompts are computed in parallel (per-agent RNG streams, grouped so
//! one agent's prompts stay ordered), then every task applies sequentially
//! in enqueue order.  Given a seed, the resulting (communication, recipient,
//! kind, timestamp) sequence is identical across runs and worker counts.
//!
//! In paced mode a driver thread advances the clock against real time ×
//! acceleration, checking cancellation at ≤ 25 ms granularity.  In on-demand
//! mode there is no driver; [`Kernel::advance_by`] and
//! [`Kernel::run_until_idle`] pump on the caller's thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use rustc_hash::FxHashMap;

use orgsim_agents::{AgentRegistry, AgentRngs, AgentSnapshot, AgentSpec, InteractionRecord, RegistryBuilder};
use orgsim_behavior::{BehaviorContext, BehaviorEngine, GeneratorBehavior, ResponseDecision, ResponseGenerator, RuleBehavior};
use orgsim_core::{
    Acceleration, AgentId, CommId, SimClock, SimDuration, SimError, SimResult, SimRng, SimTime,
    SimulationParameters,
};
use orgsim_comms::{
    Communication, CommunicationKind, DeliveryRecord, DeliveryStatus, Priority, Response,
};
use orgsim_escalation::{EscalationAction, EscalationManager, EscalationThresholds};
use orgsim_tracking::{
    EventLog, OrganizationalMetrics, SimulationEvent, TrackingStore, WorkforceSnapshot,
};
use orgsim_wisdom::{WisdomEngine, WisdomOfTheCrowd};

use crate::cadence::{Cadences, RecurringKind};
use crate::observer::{NoopObserver, SimObserver};
use crate::queue::{EventQueue, Task, TaskKind};
use crate::status::{CommunicationDraft, SimulationStatus};

/// Real-time deadline for `send_communication` under backpressure.
const SEND_DEADLINE: Duration = Duration::from_secs(1);

/// Real-time deadline for read-only queries.
const QUERY_DEADLINE: Duration = Duration::from_secs(1);

/// Cancellation check granularity of the paced driver.
const DRIVER_SLICE: Duration = Duration::from_millis(25);

/// Daily stress decay applied at maintenance.
const STRESS_DECAY: f64 = 0.15;

/// Interaction memory horizon trimmed at maintenance.
const MEMORY_HORIZON: SimDuration = SimDuration::from_days(14);

/// Priority threshold feeding the `priority_conflict` hesitation trigger.
const HIGH_PRIORITY: u8 = 4;

/// Subjects for scheduler-driven background chatter.
const CHATTER_SUBJECTS: &[&str] = &[
    "Quick sync on current workload",
    "Cross-checking priorities for this week",
    "Need your read on a customer issue",
    "Heads-up on a dependency slip",
];

// ── Run state ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum RunState {
    Created,
    Running,
    Stopped,
}

// ── Pump state ────────────────────────────────────────────────────────────────

struct Pump {
    queue:        EventQueue,
    cadences:     Cadences,
    rngs:         AgentRngs,
    delivery_rng: SimRng,
    chatter_rng:  SimRng,
    /// Computed replies whose `ResponseDue` task is still queued, keyed by
    /// (communication, recipient).  A reply may legitimately be slower than
    /// the TTL (a priority-1 consultation's latency window exceeds short TTL
    /// configurations); while an entry is present here the TTL check must
    /// not count the silence as an ignore.
    pending_replies: FxHashMap<(CommId, AgentId), u32>,
}

impl Pump {
    fn note_reply_scheduled(&mut self, comm_id: &CommId, recipient: &AgentId) {
        *self
            .pending_replies
            .entry((comm_id.clone(), recipient.clone()))
            .or_insert(0) += 1;
    }

    fn note_reply_landed(&mut self, comm_id: &CommId, recipient: &AgentId) {
        let key = (comm_id.clone(), recipient.clone());
        if let Some(count) = self.pending_replies.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.pending_replies.remove(&key);
            }
        }
    }

    fn reply_in_flight(&self, comm_id: &CommId, recipient: &AgentId) -> bool {
        self.pending_replies
            .contains_key(&(comm_id.clone(), recipient.clone()))
    }
}

// ── Shared kernel state ───────────────────────────────────────────────────────

struct Shared {
    org_id:     String,
    params:     SimulationParameters,
    seed:       u64,
    clock:      SimClock,
    registry:   AgentRegistry,
    behavior:   Arc<dyn BehaviorEngine>,
    tracking:   RwLock<TrackingStore>,
    wisdom:     RwLock<WisdomEngine>,
    escalation: Mutex<EscalationManager>,
    events:     Mutex<EventLog>,
    observer:   Mutex<Box<dyn SimObserver>>,
    pump:       Mutex<Pump>,
    /// Signalled when new work is queued or the kernel stops.
    pump_signal: Condvar,
    /// Signalled when queue capacity frees up.
    space_signal: Condvar,
    state:      Mutex<RunState>,
    cancel:     AtomicBool,
    #[cfg(feature = "parallel")]
    pool:       rayon::ThreadPool,
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`Kernel`].
///
/// # Example
///
/// ```rust,ignore
/// let kernel = KernelBuilder::new("acme")
///     .params(params)
///     .agents(agents)
///     .build()?;
/// kernel.start()?;
/// ```
pub struct KernelBuilder {
    org_id:    String,
    params:    SimulationParameters,
    agents:    Vec<AgentSpec>,
    behavior:  Option<Arc<dyn BehaviorEngine>>,
    generator: Option<Arc<dyn ResponseGenerator>>,
    observer:  Option<Box<dyn SimObserver>>,
}

impl KernelBuilder {
    pub fn new(org_id: impl Into<String>) -> Self {
        Self {
            org_id:    org_id.into(),
            params:    SimulationParameters::default(),
            agents:    Vec::new(),
            behavior:  None,
            generator: None,
            observer:  None,
        }
    }

    pub fn params(mut self, params: SimulationParameters) -> Self {
        self.params = params;
        self
    }

    pub fn agents(mut self, agents: Vec<AgentSpec>) -> Self {
        self.agents = agents;
        self
    }

    /// Replace the behavior backend entirely.
    pub fn behavior(mut self, behavior: Arc<dyn BehaviorEngine>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Attach a generator capability; decisions delegate to it with the
    /// configured timeout and fall back to the rule tables.
    pub fn generator(mut self, generator: Arc<dyn ResponseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn observer(mut self, observer: Box<dyn SimObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validate inputs and assemble a stopped kernel.
    pub fn build(self) -> SimResult<Kernel> {
        self.params.validate()?;
        if self.agents.is_empty() {
            return Err(SimError::InvalidArgument(
                "an organization needs at least one agent".into(),
            ));
        }

        let seed = self.params.random_seed.unwrap_or_else(rand::random);
        let (registry, rngs) = RegistryBuilder::new(seed)
            .memory_limit(self.params.memory_limit)
            .specs(self.agents)
            .build()
            .map_err(SimError::from)?;

        let behavior: Arc<dyn BehaviorEngine> = match (self.behavior, self.generator) {
            (Some(behavior), _) => behavior,
            (None, Some(generator)) => Arc::new(GeneratorBehavior::new(
                generator,
                Duration::from_millis(self.params.generator_timeout_ms),
            )),
            (None, None) => Arc::new(RuleBehavior),
        };

        let clock = SimClock::new(self.params.start_unix_secs, self.params.acceleration());
        let cadences = Cadences::new(&clock, &self.params, SimTime::ZERO);
        let thresholds = EscalationThresholds {
            nudges_before_recommendation: self.params.nudges_before_recommendation,
            recommendations_before_order: self.params.recommendations_before_order,
        };

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.worker_pool_size())
            .thread_name(|i| format!("orgsim-worker-{i}"))
            .build()
            .map_err(|e| SimError::Internal(format!("worker pool: {e}")))?;

        let pump = Pump {
            queue:           EventQueue::new(self.params.queue_capacity),
            cadences,
            rngs,
            delivery_rng:    SimRng::for_component(seed, "delivery"),
            chatter_rng:     SimRng::for_component(seed, "chatter"),
            pending_replies: FxHashMap::default(),
        };

        Ok(Kernel {
            shared: Arc::new(Shared {
                org_id: self.org_id,
                params: self.params,
                seed,
                clock,
                registry,
                behavior,
                tracking: RwLock::new(TrackingStore::new()),
                wisdom: RwLock::new(WisdomEngine::new()),
                escalation: Mutex::new(EscalationManager::new(thresholds)),
                events: Mutex::new(EventLog::default()),
                observer: Mutex::new(self.observer.unwrap_or(Box::new(NoopObserver))),
                pump: Mutex::new(pump),
                pump_signal: Condvar::new(),
                space_signal: Condvar::new(),
                state: Mutex::new(RunState::Created),
                cancel: AtomicBool::new(false),
                #[cfg(feature = "parallel")]
                pool,
            }),
            driver: Mutex::new(None),
        })
    }
}

// ── Kernel ────────────────────────────────────────────────────────────────────

/// The simulation kernel.  Multiple kernels coexist freely — there is no
/// static state anywhere in the workspace.
pub struct Kernel {
    shared: Arc<Shared>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Kernel {
    /// Start the simulation: fails with `AlreadyRunning` if running, and a
    /// stopped kernel never restarts (build a fresh one).
    pub fn start(&self) -> SimResult<()> {
        {
            let mut state = self.shared.state.lock();
            match *state {
                RunState::Running => return Err(SimError::AlreadyRunning),
                RunState::Stopped => {
                    return Err(SimError::InvalidArgument(
                        "a stopped kernel cannot restart; build a new one".into(),
                    ));
                }
                RunState::Created => *state = RunState::Running,
            }
        }

        let now = self.shared.clock.now();
        self.shared.events.lock().push(SimulationEvent::SimulationStarted {
            at:     now,
            org_id: self.shared.org_id.clone(),
        });
        self.shared.observer.lock().on_start(now, &self.shared.org_id);
        tracing::info!(org = %self.shared.org_id, seed = self.shared.seed, "simulation started");

        if let Acceleration::Paced(alpha) = self.shared.clock.acceleration() {
            let shared = Arc::clone(&self.shared);
            let handle = std::thread::Builder::new()
                .name("orgsim-driver".into())
                .spawn(move || drive(shared, alpha))
                .map_err(|e| SimError::Internal(format!("driver thread: {e}")))?;
            *self.driver.lock() = Some(handle);
        }
        Ok(())
    }

    /// Stop the simulation: cancel outstanding work cooperatively, mark
    /// still-pending deliveries `cancelled`, halt the clock.  Idempotent.
    pub fn stop(&self) -> SimResult<()> {
        {
            let mut state = self.shared.state.lock();
            match *state {
                RunState::Stopped => return Ok(()),
                RunState::Created => {
                    *state = RunState::Stopped;
                    return Ok(());
                }
                RunState::Running => *state = RunState::Stopped,
            }
        }

        self.shared.cancel.store(true, Ordering::SeqCst);
        self.shared.pump_signal.notify_all();
        self.shared.clock.halt();
        if let Some(handle) = self.driver.lock().take() {
            let _ = handle.join();
        }

        // ── Drain: no response may be created past this point ─────────────
        let mut pump = self.shared.pump.lock();
        let leftovers = pump.queue.drain_all();
        pump.pending_replies.clear();
        let now = self.shared.clock.now();
        {
            let mut tracking = self.shared.tracking.write();
            let mut events = self.shared.events.lock();
            for task in leftovers {
                match task.kind {
                    // Fan-outs that never ran: record the whole recipient set
                    // as cancelled so every (communication, recipient) pair
                    // keeps exactly one delivery record.
                    TaskKind::FanOut { comm_id } => {
                        let Some(comm) = tracking.communication(&comm_id).cloned() else {
                            continue;
                        };
                        for recipient in &comm.recipients {
                            if tracking.delivery(&comm_id, recipient).is_none() {
                                let mut record =
                                    DeliveryRecord::pending(comm_id.clone(), recipient.clone(), now);
                                record.status = DeliveryStatus::Cancelled;
                                tracking.record_delivery(record);
                                events.push(SimulationEvent::DeliveryCancelled {
                                    at:        now,
                                    comm_id:   comm_id.clone(),
                                    recipient: recipient.clone(),
                                });
                            }
                        }
                    }
                    TaskKind::Deliver { comm_id, recipient } => {
                        tracking.set_delivery_status(
                            &comm_id,
                            &recipient,
                            DeliveryStatus::Cancelled,
                            None,
                        );
                        events.push(SimulationEvent::DeliveryCancelled {
                            at: now,
                            comm_id,
                            recipient,
                        });
                    }
                    // Undelivered decisions and timers are dropped outright.
                    TaskKind::Reprompt { .. }
                    | TaskKind::ResponseDue { .. }
                    | TaskKind::TtlCheck { .. } => {}
                }
            }

            let (avg_stress, avg_workload, avg_satisfaction) =
                self.shared.registry.workforce_averages();
            tracking.record_workforce_snapshot(WorkforceSnapshot {
                at:               now,
                day:              self.shared.clock.day_index(now),
                avg_stress,
                avg_workload,
                avg_satisfaction,
                agent_count:      self.shared.registry.len(),
            });
            events.push(SimulationEvent::SimulationStopped { at: now });
        }
        drop(pump);

        self.shared.observer.lock().on_stop(now);
        tracing::info!(org = %self.shared.org_id, at = %now, "simulation stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        *self.shared.state.lock() == RunState::Running
    }

    // ── Sending ───────────────────────────────────────────────────────────

    /// Validate and admit a communication; returns its ID.
    ///
    /// An empty recipient list records the communication with zero
    /// deliveries.  When the queue is full, paced mode blocks up to the 1 s
    /// send deadline for space; on-demand mode fails `Overloaded`
    /// immediately (nothing drains without the caller pumping).
    pub fn send_communication(&self, draft: CommunicationDraft) -> SimResult<CommId> {
        self.ensure_running()?;

        if self.shared.registry.index_of(draft.sender.as_str()).is_none() {
            return Err(SimError::UnknownAgent(draft.sender));
        }
        for recipient in &draft.recipients {
            if self.shared.registry.index_of(recipient.as_str()).is_none() {
                return Err(SimError::UnknownAgent(recipient.clone()));
            }
        }
        let recipients = Communication::dedup_recipients(draft.recipients);

        let mut pump = self.shared.pump.lock();

        // ── Backpressure (admission is atomic per communication) ──────────
        if !recipients.is_empty() && !pump.queue.has_capacity() {
            match self.shared.clock.acceleration() {
                Acceleration::Paced(_) => {
                    let _ = self.shared.space_signal.wait_while_for(
                        &mut pump,
                        |p| !p.queue.has_capacity(),
                        SEND_DEADLINE,
                    );
                    if !pump.queue.has_capacity() {
                        return Err(SimError::Overloaded);
                    }
                }
                Acceleration::OnDemand => return Err(SimError::Overloaded),
            }
        }
        if self.shared.cancel.load(Ordering::SeqCst) {
            return Err(SimError::NotRunning);
        }

        let now = self.shared.clock.now();
        let comm = {
            let mut tracking = self.shared.tracking.write();
            let id = tracking.mint_comm_id();
            let thread_id = tracking.mint_thread_id();
            let comm = Communication {
                id,
                thread_id,
                sender: draft.sender,
                recipients,
                kind: draft.kind,
                priority: draft.priority.unwrap_or_default(),
                subject: draft.subject,
                body: draft.body,
                strategic_goal: draft.strategic_goal,
                created_at: now,
                ttl: self.shared.params.ttl(),
            };
            tracking.record_communication(comm.clone());
            comm
        };
        register_communication(&self.shared, &comm);

        if !comm.recipients.is_empty() {
            let admitted = pump.queue.push_fanout(now, comm.id.clone());
            debug_assert!(admitted, "capacity was checked under the pump lock");
            self.shared.pump_signal.notify_all();
        }
        Ok(comm.id)
    }

    // ── On-demand pumping ─────────────────────────────────────────────────

    /// Advance simulated time by `delta`, processing everything due on the
    /// way.  On-demand mode only.
    pub fn advance_by(&self, delta: SimDuration) -> SimResult<SimTime> {
        self.ensure_running()?;
        self.ensure_on_demand()?;
        let mut pump = self.shared.pump.lock();
        let target = self.shared.clock.now() + delta;
        while !self.shared.cancel.load(Ordering::SeqCst) {
            if step(&self.shared, &mut pump, target).is_none() {
                break;
            }
        }
        self.shared.clock.advance_to(target);
        Ok(self.shared.clock.now())
    }

    /// Process queued work (and the recurring cadences it passes through)
    /// until the queue is empty or simulated `limit` has elapsed.  Returns
    /// the simulated instant reached.  On-demand mode only.
    pub fn run_until_idle(&self, limit: SimDuration) -> SimResult<SimTime> {
        self.ensure_running()?;
        self.ensure_on_demand()?;
        let mut pump = self.shared.pump.lock();
        let target = self.shared.clock.now() + limit;
        while !self.shared.cancel.load(Ordering::SeqCst) {
            if pump.queue.is_empty() {
                break;
            }
            if step(&self.shared, &mut pump, target).is_none() {
                self.shared.clock.advance_to(target);
                break;
            }
        }
        Ok(self.shared.clock.now())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn get_status(&self) -> SimResult<SimulationStatus> {
        let pending_tasks = {
            let pump = self
                .shared
                .pump
                .try_lock_for(QUERY_DEADLINE)
                .ok_or(SimError::Overloaded)?;
            pump.queue.len()
        };
        let tracking = self
            .shared
            .tracking
            .try_read_for(QUERY_DEADLINE)
            .ok_or(SimError::Overloaded)?;
        let now = self.shared.clock.now();
        Ok(SimulationStatus {
            organization_id:      self.shared.org_id.clone(),
            running:              self.is_running(),
            sim_time:             now,
            sim_unix_time:        self.shared.clock.unix_time(now),
            acceleration_factor:  match self.shared.clock.acceleration() {
                Acceleration::Paced(alpha) => Some(alpha),
                Acceleration::OnDemand => None,
            },
            agent_count:          self.shared.registry.len(),
            communications_total: tracking.communications_len(),
            responses_total:      tracking.responses_len(),
            pending_tasks,
            escalations_promoted: tracking.escalations_promoted(),
            compliance_failures:  tracking.compliance_failures(),
        })
    }

    pub fn get_metrics(&self) -> SimResult<OrganizationalMetrics> {
        let tracking = self
            .shared
            .tracking
            .try_read_for(QUERY_DEADLINE)
            .ok_or(SimError::Overloaded)?;
        Ok(OrganizationalMetrics::compute(&tracking, &self.shared.registry))
    }

    /// Wisdom snapshot by communication ID or strategic-goal tag.
    pub fn get_wisdom(&self, topic: &str) -> SimResult<WisdomOfTheCrowd> {
        let wisdom = self
            .shared
            .wisdom
            .try_read_for(QUERY_DEADLINE)
            .ok_or(SimError::Overloaded)?;
        wisdom
            .wisdom_for_comm(&CommId::new(topic))
            .or_else(|| wisdom.wisdom_for_goal(topic))
            .ok_or_else(|| SimError::UnknownTopic(topic.to_owned()))
    }

    pub fn communication(&self, id: &CommId) -> SimResult<Communication> {
        let tracking = self
            .shared
            .tracking
            .try_read_for(QUERY_DEADLINE)
            .ok_or(SimError::Overloaded)?;
        tracking
            .communication(id)
            .cloned()
            .ok_or_else(|| SimError::UnknownCommunication(id.clone()))
    }

    /// Run a closure against the tracking store (read lock).
    pub fn read_tracking<R>(&self, f: impl FnOnce(&TrackingStore) -> R) -> SimResult<R> {
        let tracking = self
            .shared
            .tracking
            .try_read_for(QUERY_DEADLINE)
            .ok_or(SimError::Overloaded)?;
        Ok(f(&tracking))
    }

    /// The `n` most recent simulation events, oldest first.
    pub fn recent_events(&self, n: usize) -> Vec<SimulationEvent> {
        self.shared.events.lock().recent(n)
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.shared.registry
    }

    pub fn organization_id(&self) -> &str {
        &self.shared.org_id
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.shared.params
    }

    /// The resolved master seed (drawn at build time when the parameters
    /// omit one).
    pub fn seed(&self) -> u64 {
        self.shared.seed
    }

    // ── Internal ──────────────────────────────────────────────────────────

    fn ensure_running(&self) -> SimResult<()> {
        match *self.shared.state.lock() {
            RunState::Running => Ok(()),
            _ => Err(SimError::NotRunning),
        }
    }

    fn ensure_on_demand(&self) -> SimResult<()> {
        match self.shared.clock.acceleration() {
            Acceleration::OnDemand => Ok(()),
            Acceleration::Paced(_) => Err(SimError::InvalidArgument(
                "explicit pumping requires on-demand mode".into(),
            )),
        }
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

// ── Driver (paced mode) ───────────────────────────────────────────────────────

fn drive(shared: Arc<Shared>, alpha: f64) {
    let epoch = Instant::now();
    loop {
        if shared.cancel.load(Ordering::SeqCst) {
            break;
        }
        let target = SimTime((epoch.elapsed().as_secs_f64() * alpha) as u64);

        let mut pump = shared.pump.lock();
        while !shared.cancel.load(Ordering::SeqCst) {
            if step(&shared, &mut pump, target).is_none() {
                break;
            }
            shared.space_signal.notify_all();
        }
        if shared.cancel.load(Ordering::SeqCst) {
            break;
        }
        shared.clock.advance_to(target);

        // Sleep until the next event comes due in real time, or new work
        // arrives, bounded by the cancellation slice.
        let next = {
            let (rec_at, _) = pump.cadences.next_due();
            match pump.queue.next_time() {
                Some(q) => q.min(rec_at),
                None => rec_at,
            }
        };
        let wait = if next > target {
            Duration::from_secs_f64(((next - target).as_secs() as f64 / alpha).max(0.001))
                .min(DRIVER_SLICE)
        } else {
            Duration::from_millis(1)
        };
        let _ = shared.pump_signal.wait_for(&mut pump, wait);
    }
}

// ── One pump step ─────────────────────────────────────────────────────────────

/// Process the earliest due instant at or before `target`.  Returns the
/// instant processed, or `None` when nothing is due by `target`.
fn step(shared: &Shared, pump: &mut Pump, target: SimTime) -> Option<SimTime> {
    let (rec_at, _) = pump.cadences.next_due();
    let at = match pump.queue.next_time() {
        Some(q) => q.min(rec_at),
        None => rec_at,
    };
    if at > target {
        return None;
    }
    shared.clock.advance_to(at);

    // Cadences fire before queued work at the same instant, in their fixed
    // tie-break order.
    loop {
        let (rat, rkind) = pump.cadences.next_due();
        if rat > at {
            break;
        }
        handle_recurring(shared, pump, rkind, at);
        pump.cadences.advance(rkind, at, &shared.clock, &shared.params);
    }

    // Queue batches at this instant; handlers may enqueue more work due now
    // (zero-delay deliveries), picked up by the loop.
    while let Some((batch_at, tasks)) = pump.queue.pop_due(at) {
        debug_assert_eq!(batch_at, at);
        process_batch(shared, pump, at, tasks);
    }
    Some(at)
}

// ── Recurring handlers ────────────────────────────────────────────────────────

fn handle_recurring(shared: &Shared, pump: &mut Pump, kind: RecurringKind, at: SimTime) {
    match kind {
        RecurringKind::MinuteTick => {
            shared.observer.lock().on_tick(at);
        }

        RecurringKind::DailyMaintenance => {
            let horizon = SimTime(at.0.saturating_sub(MEMORY_HORIZON.as_secs()));
            for idx in 0..shared.registry.len() {
                shared.registry.with_dynamics(idx, |d| {
                    d.decay_stress(STRESS_DECAY);
                    d.forget_before(horizon);
                });
            }
        }

        RecurringKind::EndOfDay => {
            // Satisfaction drifts toward what the day's load deserves.
            for idx in 0..shared.registry.len() {
                shared.registry.with_dynamics(idx, |d| {
                    let load_target = 1.0 - 0.5 * d.stress() - 0.2 * d.workload();
                    let updated = d.satisfaction() + 0.25 * (load_target - d.satisfaction());
                    d.set_satisfaction(updated);
                });
            }
            let (avg_stress, avg_workload, avg_satisfaction) =
                shared.registry.workforce_averages();
            let snapshot = WorkforceSnapshot {
                at,
                day: shared.clock.day_index(at),
                avg_stress,
                avg_workload,
                avg_satisfaction,
                agent_count: shared.registry.len(),
            };
            shared.tracking.write().record_workforce_snapshot(snapshot.clone());
            shared.events.lock().push(SimulationEvent::DayClosed {
                at,
                day: snapshot.day,
            });
            shared.observer.lock().on_day_end(&snapshot);
        }

        RecurringKind::Chatter => {
            chatter(shared, pump, at);
        }
    }
}

/// Background chatter: with probability `communication_frequency`, one
/// same-department consultation per simulated hour.
fn chatter(shared: &Shared, pump: &mut Pump, at: SimTime) {
    if shared.params.communication_frequency <= 0.0
        || !pump.chatter_rng.gen_bool(shared.params.communication_frequency)
    {
        return;
    }
    let sender_idx = pump.chatter_rng.gen_range(0..shared.registry.len());
    let sender = shared.registry.get(sender_idx);
    let peers: Vec<&AgentId> = shared
        .registry
        .department_members(&sender.profile.department)
        .iter()
        .filter(|&&idx| idx != sender_idx)
        .map(|&idx| &shared.registry.get(idx).id)
        .collect();
    if peers.is_empty() {
        return;
    }
    let peer = peers[pump.chatter_rng.gen_range(0..peers.len())].clone();
    let subject = CHATTER_SUBJECTS[pump.chatter_rng.gen_range(0..CHATTER_SUBJECTS.len())];

    let comm = {
        let mut tracking = shared.tracking.write();
        let id = tracking.mint_comm_id();
        let thread_id = tracking.mint_thread_id();
        let comm = Communication {
            id,
            thread_id,
            sender: sender.id.clone(),
            recipients: vec![peer],
            kind: CommunicationKind::Consultation,
            priority: Priority::new(2),
            subject: subject.to_owned(),
            body: format!("{subject} — when you have a moment."),
            strategic_goal: None,
            created_at: at,
            ttl: shared.params.ttl(),
        };
        tracking.record_communication(comm.clone());
        comm
    };
    register_communication(shared, &comm);
    // Internal enqueue: background load is never admission-gated.
    pump.queue.push(at, TaskKind::FanOut { comm_id: comm.id.clone() });
}

/// Shared bookkeeping for every newly recorded communication.
fn register_communication(shared: &Shared, comm: &Communication) {
    shared.wisdom.write().register_communication(comm);
    shared.escalation.lock().register_send(comm);
    shared.events.lock().push(SimulationEvent::CommunicationSent {
        at:         comm.created_at,
        comm_id:    comm.id.clone(),
        kind:       comm.kind,
        sender:     comm.sender.clone(),
        recipients: comm.recipients.len(),
    });
    shared.observer.lock().on_communication(comm);
}

// ── Batch processing ──────────────────────────────────────────────────────────

/// A prompt prepared for the parallel decision phase.
struct PromptJob {
    task_idx:  usize,
    agent_idx: usize,
    comm:      Communication,
    snapshot:  AgentSnapshot,
    open_high: u32,
    round:     u32,
}

fn process_batch(shared: &Shared, pump: &mut Pump, now: SimTime, tasks: Vec<Task>) {
    // ── Phase 1: pre-collect prompt inputs (sequential reads) ─────────────
    let mut jobs: Vec<PromptJob> = Vec::new();
    {
        let tracking = shared.tracking.read();
        for (task_idx, task) in tasks.iter().enumerate() {
            let (comm_id, recipient, round) = match &task.kind {
                TaskKind::Deliver { comm_id, recipient } => (comm_id, recipient, 0),
                TaskKind::Reprompt { comm_id, recipient, round } => (comm_id, recipient, *round),
                _ => continue,
            };
            let Some(comm) = tracking.communication(comm_id) else {
                continue;
            };
            if matches!(task.kind, TaskKind::Deliver { .. }) {
                match tracking.delivery(comm_id, recipient) {
                    Some(record) if record.status == DeliveryStatus::Pending => {}
                    _ => continue,
                }
            }
            let Some(agent_idx) = shared.registry.index_of(recipient.as_str()) else {
                continue; // handled as a failed delivery in the apply phase
            };
            jobs.push(PromptJob {
                task_idx,
                agent_idx,
                comm: comm.clone(),
                snapshot: shared.registry.snapshot(agent_idx, &comm.sender),
                open_high: tracking.open_high_priority_for(recipient, HIGH_PRIORITY),
                round,
            });
        }
    }

    // ── Phase 2: decision compute (parallel, grouped by agent) ────────────
    let mut decisions: Vec<Option<ResponseDecision>> = Vec::with_capacity(tasks.len());
    decisions.resize_with(tasks.len(), || None);
    if !jobs.is_empty() {
        let mut unique_agents: Vec<usize> = Vec::new();
        let mut groups: Vec<Vec<PromptJob>> = Vec::new();
        for job in jobs {
            match unique_agents.iter().position(|&a| a == job.agent_idx) {
                Some(pos) => groups[pos].push(job),
                None => {
                    unique_agents.push(job.agent_idx);
                    groups.push(vec![job]);
                }
            }
        }
        let rng_refs = pump.rngs.get_many_mut(&unique_agents);
        let behavior = &shared.behavior;
        let params = &shared.params;

        let computed: Vec<Vec<(usize, ResponseDecision)>> = {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                shared.pool.install(|| {
                    groups
                        .into_par_iter()
                        .zip(rng_refs.into_par_iter())
                        .map(|(jobs, rng)| {
                            jobs.into_iter()
                                .map(|job| {
                                    let ctx = BehaviorContext::new(now, params)
                                        .with_open_high_priority(job.open_high)
                                        .with_prompt_round(job.round);
                                    let d = behavior.decide(&job.snapshot, &job.comm, &ctx, rng);
                                    (job.task_idx, d)
                                })
                                .collect()
                        })
                        .collect()
                })
            }
            #[cfg(not(feature = "parallel"))]
            {
                groups
                    .into_iter()
                    .zip(rng_refs)
                    .map(|(jobs, rng)| {
                        jobs.into_iter()
                            .map(|job| {
                                let ctx = BehaviorContext::new(now, params)
                                    .with_open_high_priority(job.open_high)
                                    .with_prompt_round(job.round);
                                let d = behavior.decide(&job.snapshot, &job.comm, &ctx, rng);
                                (job.task_idx, d)
                            })
                            .collect()
                    })
                    .collect()
            }
        };
        for (task_idx, decision) in computed.into_iter().flatten() {
            decisions[task_idx] = Some(decision);
        }
    }

    // ── Phase 3: apply in enqueue order (sequential writes) ───────────────
    for (task_idx, task) in tasks.into_iter().enumerate() {
        match task.kind {
            TaskKind::FanOut { comm_id } => handle_fanout(shared, pump, now, &comm_id),

            TaskKind::Deliver { comm_id, recipient } => {
                match decisions[task_idx].take() {
                    Some(decision) => {
                        shared.tracking.write().set_delivery_status(
                            &comm_id,
                            &recipient,
                            DeliveryStatus::Delivered,
                            Some(now),
                        );
                        shared.observer.lock().on_delivery(now, &comm_id, &recipient);
                        let reply_at = now + decision.reply_latency;
                        pump.note_reply_scheduled(&comm_id, &recipient);
                        pump.queue.push(reply_at, TaskKind::ResponseDue {
                            comm_id:   comm_id.clone(),
                            recipient: recipient.clone(),
                            decision:  Box::new(decision),
                        });
                        let ttl = shared.params.ttl();
                        pump.queue.push(now + ttl, TaskKind::TtlCheck { comm_id, recipient });
                    }
                    None => {
                        // No decision was computable: the recipient is gone
                        // or the record is no longer pending.
                        if shared.registry.index_of(recipient.as_str()).is_none() {
                            shared.tracking.write().set_delivery_status(
                                &comm_id,
                                &recipient,
                                DeliveryStatus::Failed,
                                None,
                            );
                            shared.events.lock().push(SimulationEvent::DeliveryFailed {
                                at: now,
                                comm_id,
                                recipient,
                            });
                        }
                    }
                }
            }

            TaskKind::Reprompt { comm_id, recipient, .. } => {
                if let Some(decision) = decisions[task_idx].take() {
                    let reply_at = now + decision.reply_latency;
                    pump.note_reply_scheduled(&comm_id, &recipient);
                    pump.queue.push(reply_at, TaskKind::ResponseDue {
                        comm_id,
                        recipient,
                        decision: Box::new(decision),
                    });
                }
            }

            TaskKind::ResponseDue { comm_id, recipient, decision } => {
                apply_response(shared, pump, now, &comm_id, &recipient, *decision);
            }

            TaskKind::TtlCheck { comm_id, recipient } => {
                handle_ttl(shared, pump, now, &comm_id, &recipient);
            }
        }
    }
}

// ── Task handlers ─────────────────────────────────────────────────────────────

/// Expand a communication into per-recipient deliveries with drawn delays.
fn handle_fanout(shared: &Shared, pump: &mut Pump, now: SimTime, comm_id: &CommId) {
    let mut tracking = shared.tracking.write();
    let Some(comm) = tracking.communication(comm_id).cloned() else {
        shared.events.lock().push(SimulationEvent::TaskError {
            at:     now,
            detail: format!("fan-out for unknown communication {comm_id}"),
        });
        return;
    };
    let (min_delay, max_delay) = shared.params.delay_range();
    for recipient in &comm.recipients {
        if shared.registry.index_of(recipient.as_str()).is_none() {
            let mut record = DeliveryRecord::pending(comm.id.clone(), recipient.clone(), now);
            record.status = DeliveryStatus::Failed;
            tracking.record_delivery(record);
            shared.events.lock().push(SimulationEvent::DeliveryFailed {
                at:        now,
                comm_id:   comm.id.clone(),
                recipient: recipient.clone(),
            });
            tracing::warn!(comm = %comm.id, recipient = %recipient, "delivery failed: unknown recipient");
            continue;
        }
        // Higher priority travels faster: the drawn delay shrinks by 1/P.
        let base = pump
            .delivery_rng
            .gen_range(min_delay.as_secs()..=max_delay.as_secs());
        let due = now + SimDuration(base / comm.priority.get() as u64);
        tracking.record_delivery(DeliveryRecord::pending(comm.id.clone(), recipient.clone(), due));
        pump.queue.push(due, TaskKind::Deliver {
            comm_id:   comm.id.clone(),
            recipient: recipient.clone(),
        });
    }
}

/// Persist a due response, apply its side effects, and feed escalation and
/// wisdom.
fn apply_response(
    shared: &Shared,
    pump: &mut Pump,
    now: SimTime,
    comm_id: &CommId,
    recipient: &AgentId,
    decision: ResponseDecision,
) {
    pump.note_reply_landed(comm_id, recipient);
    let comm = {
        let tracking = shared.tracking.read();
        tracking.communication(comm_id).cloned()
    };
    let Some(comm) = comm else {
        shared.events.lock().push(SimulationEvent::TaskError {
            at:     now,
            detail: format!("response due for unknown communication {comm_id}"),
        });
        return;
    };
    let Some(agent_idx) = shared.registry.index_of(recipient.as_str()) else {
        return;
    };

    let response = {
        let mut tracking = shared.tracking.write();
        let id = tracking.mint_response_id();
        let response = Response {
            id,
            communication_id:   comm.id.clone(),
            agent_id:           recipient.clone(),
            kind:               decision.kind,
            content:            decision.content.clone(),
            confidence:         decision.confidence,
            hesitation_markers: decision.hesitation_markers.clone(),
            action_status:      decision.action_status,
            fallback_used:      decision.fallback_used,
            created_at:         now,
        };
        tracking.record_response(response.clone());
        response
    };

    // ── Agent side effects ────────────────────────────────────────────────
    shared.registry.with_dynamics(agent_idx, |d| {
        d.add_stress(decision.stress_delta);
        d.add_workload(decision.workload_delta);
        d.adjust_affinity(&comm.sender, decision.affinity_delta);
        d.remember(InteractionRecord {
            at:            now,
            counterpart:   comm.sender.clone(),
            comm_kind:     comm.kind,
            response_kind: decision.kind,
            subject:       comm.subject.clone(),
        });
    });

    // ── Wisdom ────────────────────────────────────────────────────────────
    let department = shared.registry.get(agent_idx).profile.department.clone();
    shared
        .wisdom
        .write()
        .ingest(&comm, &response, &department, decision.reply_latency);

    if decision.fallback_used {
        shared.events.lock().push(SimulationEvent::GeneratorFallback {
            at:        now,
            comm_id:   comm.id.clone(),
            recipient: recipient.clone(),
        });
        tracing::debug!(comm = %comm.id, recipient = %recipient, "generator fallback");
    }

    // ── Escalation ────────────────────────────────────────────────────────
    let actions = shared.escalation.lock().on_response(
        &comm,
        recipient,
        response.kind,
        shared.params.ttl(),
    );
    apply_escalation_actions(shared, pump, now, &comm, actions);

    shared.observer.lock().on_response(&comm, &response);
}

/// TTL elapsed: a non-response counts as ignored.
///
/// A reply whose latency exceeds the TTL is not silence: while a computed
/// `ResponseDue` is still queued for this (communication, recipient), the
/// verdict is deferred — the reply will drive the escalation ladder when it
/// lands.
fn handle_ttl(shared: &Shared, pump: &mut Pump, now: SimTime, comm_id: &CommId, recipient: &AgentId) {
    if pump.reply_in_flight(comm_id, recipient) {
        return;
    }
    let comm = {
        let tracking = shared.tracking.read();
        let Some(comm) = tracking.communication(comm_id) else {
            return;
        };
        if tracking.latest_response_by(comm_id, recipient).is_some() {
            return; // answered in time (even if only with an ignore)
        }
        comm.clone()
    };
    let actions =
        shared
            .escalation
            .lock()
            .on_ttl_expired(&comm, recipient, shared.params.ttl());
    apply_escalation_actions(shared, pump, now, &comm, actions);
}

/// Apply the escalation manager's verdicts.
fn apply_escalation_actions(
    shared: &Shared,
    pump: &mut Pump,
    now: SimTime,
    source: &Communication,
    actions: Vec<EscalationAction>,
) {
    for action in actions {
        match action {
            EscalationAction::Reprompt { comm_id, recipient, delay } => {
                let round = shared
                    .tracking
                    .read()
                    .responses_for(&comm_id)
                    .iter()
                    .filter(|r| r.agent_id == recipient)
                    .count() as u32;
                pump.queue.push(now + delay, TaskKind::Reprompt { comm_id, recipient, round });
            }

            EscalationAction::Promote { thread_id, recipient, level, source_comm: _ } => {
                let Some(kind) = level.comm_kind() else {
                    continue;
                };
                let comm = {
                    let mut tracking = shared.tracking.write();
                    let id = tracking.mint_comm_id();
                    let comm = Communication {
                        id,
                        thread_id:      thread_id.clone(),
                        sender:         source.sender.clone(),
                        recipients:     vec![recipient.clone()],
                        kind,
                        priority:       source.priority,
                        subject:        source.subject.clone(),
                        body:           source.body.clone(),
                        strategic_goal: source.strategic_goal.clone(),
                        created_at:     now,
                        ttl:            shared.params.ttl(),
                    };
                    tracking.record_communication(comm.clone());
                    tracking.note_escalation_promoted();
                    comm
                };
                register_communication(shared, &comm);
                shared.events.lock().push(SimulationEvent::EscalationPromoted {
                    at:        now,
                    thread_id: thread_id.clone(),
                    recipient: recipient.clone(),
                    to:        kind,
                });
                shared.observer.lock().on_escalation(now, &recipient, level);
                tracing::info!(thread = %thread_id, recipient = %recipient, to = kind.label(), "escalation promoted");
                pump.queue.push(now, TaskKind::FanOut { comm_id: comm.id.clone() });
            }

            EscalationAction::ComplianceFailure { thread_id, recipient, comm_id } => {
                shared.tracking.write().note_compliance_failure();
                shared.events.lock().push(SimulationEvent::ComplianceFailure {
                    at: now,
                    thread_id: thread_id.clone(),
                    recipient: recipient.clone(),
                    comm_id,
                });
                tracing::warn!(thread = %thread_id, recipient = %recipient, "direct order ignored: compliance failure");
            }

            EscalationAction::Closed { .. } => {}
        }
    }
}
