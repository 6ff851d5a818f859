//! A single timer session: phase, countdown and accumulator owned together

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    countdown::{Countdown, ElapsedAccumulator},
    engine::TickSource,
    phase::{transition, Effect, TimerEvent, TimerPhase},
};

/// Inputs that size the countdown and decide what counts toward the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub interval_minutes: u32,
    pub break_seconds: u32,
    pub break_time_counts: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 25,
            break_seconds: 5 * 60,
            break_time_counts: false,
        }
    }
}

/// Payload handed to persistence when a session is stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub duration_seconds: u64,
    pub completed_cycles: u32,
}

/// What a dispatched event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub from: TimerPhase,
    pub to: TimerPhase,
    pub changed: bool,
    pub submission: Option<Submission>,
}

/// Read-only view of a session for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub display: String,
    pub minutes: u32,
    pub seconds: u32,
    pub remaining_seconds: u64,
    pub elapsed_seconds: u64,
    pub actions: Vec<TimerEvent>,
    pub theme: &'static str,
    pub emoji: &'static str,
    pub settings: TimerSettings,
}

/// Timer state machine bound to a tick source
///
/// Every mutation goes through [`dispatch`](Self::dispatch) or
/// [`tick`](Self::tick); both apply their whole update before returning.
#[derive(Debug)]
pub struct TimerSession<E> {
    phase: TimerPhase,
    countdown: Countdown,
    elapsed: ElapsedAccumulator,
    settings: TimerSettings,
    /// Set once the current zero reading has been consumed
    boundary_latched: bool,
    engine: E,
}

impl<E: TickSource> TimerSession<E> {
    pub fn new(settings: TimerSettings, engine: E) -> Self {
        Self {
            phase: TimerPhase::Ready,
            countdown: Countdown::full(settings.interval_minutes),
            elapsed: ElapsedAccumulator::default(),
            settings,
            boundary_latched: false,
            engine,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.seconds()
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            display: self.countdown.to_string(),
            minutes: self.countdown.minutes,
            seconds: self.countdown.seconds,
            remaining_seconds: self.countdown.remaining_seconds(),
            elapsed_seconds: self.elapsed.seconds(),
            actions: self.phase.actions().to_vec(),
            theme: self.phase.theme(),
            emoji: self.phase.emoji(),
            settings: self.settings,
        }
    }

    /// Replace the settings; a Ready timer is resized immediately
    pub fn apply_settings(&mut self, settings: TimerSettings) {
        self.settings = settings;
        if self.phase == TimerPhase::Ready {
            self.reset_countdown(Countdown::full(settings.interval_minutes));
        }
    }

    /// Feed one event to the machine and run its effects
    pub fn dispatch(&mut self, event: TimerEvent) -> DispatchOutcome {
        let from = self.phase;
        let step = transition(from, event);

        if step.is_noop(from) {
            debug!("Ignoring {} while {}", event, from);
            return DispatchOutcome {
                from,
                to: from,
                changed: false,
                submission: None,
            };
        }

        let mut submission = None;
        for effect in &step.effects {
            match effect {
                Effect::StopEngine => self.engine.stop(),
                Effect::StartEngine => {
                    self.engine.start();
                    self.boundary_latched = false;
                }
                Effect::ResetToInterval => {
                    self.reset_countdown(Countdown::full(self.settings.interval_minutes))
                }
                Effect::ResetToBreak => {
                    self.reset_countdown(Countdown::from_seconds(self.settings.break_seconds))
                }
                Effect::ResetElapsed => self.elapsed.reset(),
                Effect::Submit => {
                    submission = Some(Submission {
                        duration_seconds: self.elapsed.seconds(),
                        completed_cycles: 0,
                    })
                }
            }
        }
        self.phase = step.next;

        info!("Timer {} -> {} on {}", from, self.phase, event);
        DispatchOutcome {
            from,
            to: self.phase,
            changed: true,
            submission,
        }
    }

    /// Apply one second of engine time
    ///
    /// Returns the auto-transition taken if this tick reached zero.
    pub fn tick(&mut self) -> Option<DispatchOutcome> {
        if !self.engine.is_running() {
            debug!("Dropping tick while engine is stopped");
            return None;
        }

        let counted = match self.phase {
            TimerPhase::Working => true,
            TimerPhase::Breaking => self.settings.break_time_counts,
            TimerPhase::Ready | TimerPhase::Paused => false,
        };
        if counted {
            self.elapsed.record_tick();
        }
        self.countdown.tick();
        debug!(
            "Tick: phase={} countdown={} elapsed={}",
            self.phase,
            self.countdown,
            self.elapsed.seconds()
        );

        self.on_zero_crossing()
    }

    /// Consume a zero reading, flipping Working and Breaking at most once
    pub fn on_zero_crossing(&mut self) -> Option<DispatchOutcome> {
        if !self.countdown.is_zero() || self.boundary_latched {
            return None;
        }
        self.boundary_latched = true;

        let event = match self.phase {
            TimerPhase::Working => TimerEvent::Breaking,
            TimerPhase::Breaking => TimerEvent::Working,
            TimerPhase::Ready | TimerPhase::Paused => return None,
        };
        info!("Countdown reached zero while {}", self.phase);
        Some(self.dispatch(event))
    }

    fn reset_countdown(&mut self, countdown: Countdown) {
        self.countdown = countdown;
        self.boundary_latched = false;
    }
}
