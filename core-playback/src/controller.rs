//! # Resilience Controller
//!
//! Keeps a live feed playing: detects broken or stalled playback, tears the
//! decoder session down and rebuilds it with exponential backoff, and stops
//! retrying once the budget is spent.
//!
//! ## Architecture
//!
//! The controller is a single Tokio task owning all mutable state. Public
//! handles send it commands; sink events, session errors, watchdog ticks and
//! reconnect timers are funnelled into one internal channel. Because one task
//! handles one message at a time, the check-and-set on the pending reconnect
//! can never interleave with another failure signal.
//!
//! ```text
//!  attach/detach ──┐
//!                  ▼
//!  sink events ──> ┌──────────────────┐ ──> SessionManager ──> DecoderBackend
//!  session errors ─│ controller task  │ ──> ReconnectScheduler
//!  watchdog ticks ─│  (one at a time) │ ──> StallWatchdog
//!  reconnect fire ─└──────────────────┘ ──> EventBus (diagnostics)
//! ```
//!
//! Every attach cycle gets an epoch number and every reconnect timer an id.
//! Internal messages carry them, so a tick or timer that was already in
//! flight when its cycle ended is recognised and dropped.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{ResilienceController, StreamTarget};
//!
//! let controller = ResilienceController::builder()
//!     .rendering_sink(sink)
//!     .decoder_backend(backend)
//!     .build()?;
//!
//! controller.attach(StreamTarget::new("http://tv.example/live/42.ts")?).await?;
//! // ...
//! controller.detach().await?;
//! ```

use crate::config::ResilienceConfig;
use crate::error::{PlaybackError, Result};
use crate::progress::ProgressTracker;
use crate::reconnect::{FailureOutcome, FailureReason, ReconnectScheduler};
use crate::session::{CreateOutcome, SessionManager};
use crate::target::StreamTarget;
use crate::watchdog::StallWatchdog;
use bridge_traits::{DecoderBackend, RenderingSink, SinkEvent};
use core_async::sync::{broadcast, mpsc, oneshot};
use core_async::task::{self, AbortOnDrop, JoinHandle};
use core_async::time::{self, Instant};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

// ============================================================================
// Public handle
// ============================================================================

enum Command {
    Attach {
        target: StreamTarget,
        done: oneshot::Sender<()>,
    },
    Detach {
        done: oneshot::Sender<()>,
    },
}

/// Handle to a running resilience controller.
///
/// Dropping the handle (or calling [`ResilienceController::shutdown`]) ends
/// the controller task, which detaches first: the watchdog stops, any
/// pending reconnect is cancelled and the session is destroyed.
pub struct ResilienceController {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl ResilienceController {
    pub fn builder() -> ResilienceControllerBuilder {
        ResilienceControllerBuilder::default()
    }

    /// Start playing `target` and keep it playing.
    ///
    /// Attaching the target that is already attached does nothing. Attaching
    /// a different one fully detaches the old one first. Returns once the
    /// first session attempt has been made; feed failures are never returned
    /// here, they are recovered from internally.
    #[instrument(skip(self, target), fields(stream = %target))]
    pub async fn attach(&self, target: StreamTarget) -> Result<()> {
        let (done, ack) = oneshot::channel();
        self.send(Command::Attach { target, done })?;
        ack.await.map_err(|_| PlaybackError::ControllerClosed)
    }

    /// Stop playback and discard all recovery state. Idempotent.
    pub async fn detach(&self) -> Result<()> {
        let (done, ack) = oneshot::channel();
        self.send(Command::Detach { done })?;
        ack.await.map_err(|_| PlaybackError::ControllerClosed)
    }

    /// Detach and wait for the controller task to finish.
    pub async fn shutdown(self) {
        let Self { commands, task } = self;
        drop(commands);
        if let Err(err) = task.await {
            warn!(error = %err, "controller task ended abnormally");
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::ControllerClosed)
    }
}

/// Builder for [`ResilienceController`].
#[derive(Default)]
pub struct ResilienceControllerBuilder {
    sink: Option<Arc<dyn RenderingSink>>,
    backend: Option<Arc<dyn DecoderBackend>>,
    config: ResilienceConfig,
    event_bus: Option<EventBus>,
    jitter_seed: Option<u64>,
}

impl ResilienceControllerBuilder {
    pub fn rendering_sink(mut self, sink: Arc<dyn RenderingSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn decoder_backend(mut self, backend: Arc<dyn DecoderBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn config(mut self, config: ResilienceConfig) -> Self {
        self.config = config;
        self
    }

    /// Publish [`PlaybackEvent`]s on `bus`.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Seed the reconnect jitter. Each attach cycle derives its generator
    /// from this seed.
    pub fn jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    /// Validate and spawn the controller task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<ResilienceController> {
        self.config.validate()?;
        let sink = self.sink.ok_or_else(|| PlaybackError::CapabilityMissing {
            capability: "RenderingSink".to_string(),
            message: "A rendering sink is required to play live feeds. \
                      Inject the host's media output surface."
                .to_string(),
        })?;
        let backend = self.backend.ok_or_else(|| PlaybackError::CapabilityMissing {
            capability: "DecoderBackend".to_string(),
            message: "A decoder backend is required to create live sessions. \
                      Inject the host's transport-stream decoder."
                .to_string(),
        })?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();

        // Subscribe before spawning so no sink event can slip past.
        let forwarder = AbortOnDrop::new(task::spawn(forward_sink_events(
            sink.subscribe(),
            signals_tx.clone(),
        )));

        let actor = ControllerActor {
            sessions: SessionManager::new(backend, sink.clone()),
            sink,
            config: self.config,
            events: self.event_bus,
            jitter_seed: self.jitter_seed,
            signals: signals_tx,
            cycle: None,
            next_epoch: 1,
            next_timer_id: 1,
            _forwarder: forwarder,
        };
        let task = task::spawn(actor.run(commands_rx, signals_rx));

        Ok(ResilienceController {
            commands: commands_tx,
            task,
        })
    }
}

// ============================================================================
// Controller task
// ============================================================================

enum Signal {
    Sink(SinkEvent),
    SessionError { generation: u64, detail: String },
    WatchdogTick { epoch: u64, generation: u64 },
    ReconnectFired { epoch: u64, timer: u64 },
}

async fn forward_sink_events(
    mut events: broadcast::Receiver<SinkEvent>,
    signals: mpsc::UnboundedSender<Signal>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if signals.send(Signal::Sink(event)).is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "controller fell behind the sink event stream");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("sink event stream closed");
                break;
            }
        }
    }
}

struct PendingReconnect {
    id: u64,
    attempt: u32,
    _timer: AbortOnDrop<()>,
}

/// State that lives exactly as long as one attach cycle.
struct AttachCycle {
    epoch: u64,
    target: StreamTarget,
    progress: ProgressTracker,
    watchdog: StallWatchdog,
    reconnect: ReconnectScheduler,
    pending: Option<PendingReconnect>,
    live_unavailable: bool,
}

struct ControllerActor {
    config: ResilienceConfig,
    sink: Arc<dyn RenderingSink>,
    sessions: SessionManager,
    events: Option<EventBus>,
    jitter_seed: Option<u64>,
    signals: mpsc::UnboundedSender<Signal>,
    cycle: Option<AttachCycle>,
    next_epoch: u64,
    next_timer_id: u64,
    _forwarder: AbortOnDrop<()>,
}

impl ControllerActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut signals: mpsc::UnboundedReceiver<Signal>,
    ) {
        loop {
            core_async::select! {
                biased;
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(signal) = signals.recv() => self.handle_signal(signal).await,
            }
        }

        self.teardown().await;
        debug!("resilience controller stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Attach { target, done } => {
                self.attach(target).await;
                let _ = done.send(());
            }
            Command::Detach { done } => {
                self.teardown().await;
                let _ = done.send(());
            }
        }
    }

    async fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Sink(SinkEvent::Progress { position }) => self.on_progress(position),
            Signal::Sink(SinkEvent::Stalled) => self.on_sink_failure(FailureReason::Stalled),
            Signal::Sink(SinkEvent::Waiting) => self.on_sink_failure(FailureReason::Waiting),
            Signal::Sink(SinkEvent::Error { detail }) => {
                self.on_sink_failure(FailureReason::PlaybackError(detail))
            }
            Signal::SessionError { generation, detail } => {
                if self.sessions.current_generation() != Some(generation) {
                    debug!(generation, "ignoring error from a replaced session");
                    return;
                }
                self.signal_failure(FailureReason::DecodeError(detail));
            }
            Signal::WatchdogTick { epoch, generation } => self.on_watchdog_tick(epoch, generation),
            Signal::ReconnectFired { epoch, timer } => self.on_reconnect_fired(epoch, timer).await,
        }
    }

    async fn attach(&mut self, target: StreamTarget) {
        if let Some(cycle) = &self.cycle {
            if cycle.target == target {
                debug!(stream = %target, "already attached");
                return;
            }
            self.teardown().await;
        }

        let epoch = self.next_epoch;
        self.next_epoch += 1;

        let reconnect = match self.jitter_seed {
            Some(seed) => ReconnectScheduler::with_seed(&self.config, seed.wrapping_add(epoch)),
            None => ReconnectScheduler::new(&self.config),
        };

        info!(stream = %target, epoch, "attaching");
        emit(
            &self.events,
            PlaybackEvent::Attached {
                target: target.redacted(),
            },
        );

        self.cycle = Some(AttachCycle {
            epoch,
            target,
            progress: ProgressTracker::new(self.config.progress_epsilon, Instant::now()),
            watchdog: StallWatchdog::new(self.config.watchdog_interval, self.config.stall_threshold),
            reconnect,
            pending: None,
            live_unavailable: false,
        });
        self.establish_session().await;
    }

    /// Stop the watchdog, cancel any pending reconnect, then destroy the
    /// session. A no-op when nothing is attached.
    async fn teardown(&mut self) {
        let Some(mut cycle) = self.cycle.take() else {
            return;
        };

        cycle.watchdog.stop();
        if cycle.pending.take().is_some() {
            cycle.reconnect.cancel();
            debug!(epoch = cycle.epoch, "pending reconnect cancelled");
        }
        self.destroy_session().await;

        info!(stream = %cycle.target, epoch = cycle.epoch, "detached");
        emit(&self.events, PlaybackEvent::Detached);
    }

    async fn destroy_session(&mut self) {
        if let Some(generation) = self.sessions.destroy().await {
            emit(&self.events, PlaybackEvent::SessionDestroyed { generation });
        }
    }

    /// Create a session for the current cycle, start the watchdog on it and
    /// start playback. Failures become failure signals.
    #[instrument(skip(self))]
    async fn establish_session(&mut self) {
        let Some(cycle) = &self.cycle else {
            return;
        };
        let target = cycle.target.clone();
        let epoch = cycle.epoch;

        let errors = self.signals.clone();
        let outcome = self
            .sessions
            .create(&target, move |generation, detail| {
                let _ = errors.send(Signal::SessionError { generation, detail });
            })
            .await;

        match outcome {
            CreateOutcome::Created { generation } => {
                emit(
                    &self.events,
                    PlaybackEvent::SessionCreated {
                        target: target.redacted(),
                        generation,
                    },
                );

                if let Some(cycle) = self.cycle.as_mut() {
                    cycle.progress.reset(Instant::now());
                    let ticks = self.signals.clone();
                    cycle.watchdog.start(move || {
                        ticks
                            .send(Signal::WatchdogTick { epoch, generation })
                            .is_ok()
                    });
                }

                if let Err(err) = self.sessions.start_playback().await {
                    warn!(generation, error = %err, "session failed to start");
                    self.signal_failure(FailureReason::LoadFailed(err.to_string()));
                }
            }
            CreateOutcome::Unavailable { detail } => {
                if let Some(cycle) = self.cycle.as_mut() {
                    cycle.live_unavailable = true;
                }
                warn!(
                    stream = %target,
                    detail = %detail,
                    "live playback unavailable in this runtime; not retrying"
                );
                emit(
                    &self.events,
                    PlaybackEvent::CapabilityUnavailable {
                        target: target.redacted(),
                    },
                );
            }
            CreateOutcome::Failed(err) => {
                warn!(stream = %target, error = %err, "session creation failed");
                self.signal_failure(FailureReason::SessionCreateFailed(err.to_string()));
            }
        }
    }

    fn on_progress(&mut self, position: f64) {
        if !self.sessions.has_session() {
            return;
        }
        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };
        if !cycle.progress.record_progress(position, Instant::now()) {
            return;
        }

        let previous_attempts = cycle.reconnect.reset_attempts();
        if previous_attempts > 0 {
            info!(previous_attempts, position, "playback recovered");
            emit(
                &self.events,
                PlaybackEvent::PlaybackRecovered { previous_attempts },
            );
        } else {
            trace!(position, "progress");
        }
    }

    fn on_sink_failure(&mut self, reason: FailureReason) {
        if !self.sessions.has_session() {
            debug!(reason = %reason, "sink reported a failure with no session bound");
            return;
        }
        self.signal_failure(reason);
    }

    fn on_watchdog_tick(&mut self, epoch: u64, generation: u64) {
        let Some(cycle) = &self.cycle else {
            return;
        };
        if cycle.epoch != epoch || self.sessions.current_generation() != Some(generation) {
            trace!(epoch, generation, "stale watchdog tick");
            return;
        }

        let paused = self.sink.is_paused();
        if cycle.watchdog.is_stalled(paused, &cycle.progress, Instant::now()) {
            let stalled_for = cycle.progress.time_since_progress(Instant::now());
            debug!(
                stalled_ms = stalled_for.as_millis() as u64,
                "no progress within stall threshold"
            );
            self.signal_failure(FailureReason::StallWatchdog);
        }
    }

    /// Every failure source ends up here.
    fn signal_failure(&mut self, reason: FailureReason) {
        let Some(cycle) = self.cycle.as_mut() else {
            debug!(reason = %reason, "failure signal with nothing attached");
            return;
        };
        if cycle.live_unavailable {
            debug!(reason = %reason, "ignoring failure: live playback unavailable");
            return;
        }

        emit(
            &self.events,
            PlaybackEvent::FailureSignalled {
                reason: reason.as_str().to_string(),
            },
        );

        match cycle.reconnect.on_failure(&reason) {
            FailureOutcome::Scheduled { attempt, delay } => {
                let id = self.next_timer_id;
                self.next_timer_id += 1;

                let epoch = cycle.epoch;
                let fire = self.signals.clone();
                let timer = AbortOnDrop::new(task::spawn(async move {
                    time::sleep(delay).await;
                    let _ = fire.send(Signal::ReconnectFired { epoch, timer: id });
                }));
                cycle.pending = Some(PendingReconnect {
                    id,
                    attempt,
                    _timer: timer,
                });

                let delay_ms = delay.as_millis() as u64;
                warn!(reason = %reason, attempt, delay_ms, "feed failure; reconnect scheduled");
                emit(
                    &self.events,
                    PlaybackEvent::ReconnectScheduled { attempt, delay_ms },
                );
            }
            FailureOutcome::AlreadyPending => {
                debug!(reason = %reason, "reconnect already pending");
            }
            FailureOutcome::BudgetExhausted {
                attempts,
                first_report: true,
            } => {
                error!(
                    stream = %cycle.target,
                    reason = %reason,
                    attempts,
                    "retry budget exhausted; playback stays stopped until the stream changes"
                );
                emit(
                    &self.events,
                    PlaybackEvent::RetryBudgetExhausted { attempts },
                );
            }
            FailureOutcome::BudgetExhausted { attempts, .. } => {
                debug!(reason = %reason, attempts, "retry budget exhausted; ignoring failure");
            }
        }
    }

    async fn on_reconnect_fired(&mut self, epoch: u64, timer: u64) {
        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };
        let current = cycle.epoch == epoch && cycle.pending.as_ref().map(|p| p.id) == Some(timer);
        if !current {
            debug!(epoch, timer, "stale reconnect timer");
            return;
        }

        let Some(pending) = cycle.pending.take() else {
            return;
        };
        if !cycle.reconnect.fire() {
            return;
        }
        let attempt = pending.attempt;
        cycle.watchdog.stop();

        info!(stream = %cycle.target, attempt, "reconnecting");
        emit(&self.events, PlaybackEvent::Reconnecting { attempt });

        self.destroy_session().await;
        self.establish_session().await;
    }
}

fn emit(events: &Option<EventBus>, event: PlaybackEvent) {
    if let Some(bus) = events {
        // Nobody listening is fine.
        let _ = bus.emit(CoreEvent::Playback(event));
    }
}
