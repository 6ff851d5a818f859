//! Timer phases, events and the transition table

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Resting phase of a timer session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerPhase {
    Ready,
    Working,
    Paused,
    Breaking,
}

impl TimerPhase {
    /// Display theme token for this phase
    pub fn theme(self) -> &'static str {
        match self {
            TimerPhase::Ready => "sky",
            TimerPhase::Working => "pink",
            TimerPhase::Breaking => "green",
            TimerPhase::Paused => "blue",
        }
    }

    /// Status emoji shown next to the countdown
    pub fn emoji(self) -> &'static str {
        match self {
            TimerPhase::Ready => "🍬",
            TimerPhase::Working => "🌱",
            TimerPhase::Breaking => "🌻",
            TimerPhase::Paused => "🌆",
        }
    }

    /// Events a client should offer as actions while in this phase
    pub fn actions(self) -> &'static [TimerEvent] {
        match self {
            TimerPhase::Ready => &[TimerEvent::Working],
            TimerPhase::Working => &[TimerEvent::Paused, TimerEvent::Stopped, TimerEvent::Breaking],
            TimerPhase::Breaking => &[TimerEvent::Paused, TimerEvent::Stopped, TimerEvent::Working],
            TimerPhase::Paused => &[TimerEvent::Working],
        }
    }

    /// Whether the countdown runs in this phase
    pub fn is_running(self) -> bool {
        matches!(self, TimerPhase::Working | TimerPhase::Breaking)
    }
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerPhase::Ready => "READY",
            TimerPhase::Working => "WORKING",
            TimerPhase::Paused => "PAUSED",
            TimerPhase::Breaking => "BREAKING",
        };
        f.write_str(name)
    }
}

/// User- or timer-triggered event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerEvent {
    Ready,
    Working,
    Paused,
    Breaking,
    Stopped,
}

impl fmt::Display for TimerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerEvent::Ready => "READY",
            TimerEvent::Working => "WORKING",
            TimerEvent::Paused => "PAUSED",
            TimerEvent::Breaking => "BREAKING",
            TimerEvent::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}

/// Returned when an event name is not one of the five known events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown timer event: {}", self.0)
    }
}

impl std::error::Error for UnknownEvent {}

impl FromStr for TimerEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "READY" => Ok(TimerEvent::Ready),
            "WORKING" => Ok(TimerEvent::Working),
            "PAUSED" => Ok(TimerEvent::Paused),
            "BREAKING" => Ok(TimerEvent::Breaking),
            "STOPPED" => Ok(TimerEvent::Stopped),
            _ => Err(UnknownEvent(s.to_string())),
        }
    }
}

/// Side effect attached to a transition, applied in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StopEngine,
    StartEngine,
    /// Countdown back to the configured interval length
    ResetToInterval,
    /// Countdown to the configured break length
    ResetToBreak,
    ResetElapsed,
    /// Hand the accumulated seconds to the persistence boundary
    Submit,
}

/// Result of feeding one event to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: TimerPhase,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: TimerPhase, effects: &[Effect]) -> Self {
        Self {
            next,
            effects: effects.to_vec(),
        }
    }

    fn stay(current: TimerPhase) -> Self {
        Self {
            next: current,
            effects: Vec::new(),
        }
    }

    /// A no-op leaves the phase alone and carries no effects
    pub fn is_noop(&self, current: TimerPhase) -> bool {
        self.next == current && self.effects.is_empty()
    }
}

/// Compute the next phase and the effects for `event` in `current`
pub fn transition(current: TimerPhase, event: TimerEvent) -> Transition {
    use Effect::*;
    use TimerPhase as P;

    match (current, event) {
        (_, TimerEvent::Ready) => Transition::to(P::Ready, &[StopEngine, ResetToInterval]),

        (P::Ready, TimerEvent::Working) => Transition::to(
            P::Working,
            &[ResetElapsed, StopEngine, ResetToInterval, StartEngine],
        ),
        (P::Breaking, TimerEvent::Working) => {
            Transition::to(P::Working, &[StopEngine, ResetToInterval, StartEngine])
        }
        (P::Paused, TimerEvent::Working) => Transition::to(P::Working, &[StopEngine, StartEngine]),
        (P::Working, TimerEvent::Working) => Transition::stay(current),

        (P::Working | P::Breaking, TimerEvent::Paused) => Transition::to(P::Paused, &[StopEngine]),
        (P::Ready | P::Paused, TimerEvent::Paused) => Transition::stay(current),

        (P::Working, TimerEvent::Breaking) => {
            Transition::to(P::Breaking, &[StopEngine, ResetToBreak, StartEngine])
        }
        (P::Ready | P::Paused | P::Breaking, TimerEvent::Breaking) => Transition::stay(current),

        (_, TimerEvent::Stopped) => Transition::to(
            P::Ready,
            &[StopEngine, Submit, ResetToInterval, ResetElapsed],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHASES: [TimerPhase; 4] = [
        TimerPhase::Ready,
        TimerPhase::Working,
        TimerPhase::Paused,
        TimerPhase::Breaking,
    ];

    const EVENTS: [TimerEvent; 5] = [
        TimerEvent::Ready,
        TimerEvent::Working,
        TimerEvent::Paused,
        TimerEvent::Breaking,
        TimerEvent::Stopped,
    ];

    #[test]
    fn pause_only_from_running_phases() {
        for phase in PHASES {
            let t = transition(phase, TimerEvent::Paused);
            if phase.is_running() {
                assert_eq!(t.next, TimerPhase::Paused);
                assert_eq!(t.effects, vec![Effect::StopEngine]);
            } else {
                assert!(t.is_noop(phase), "pause from {phase} should be ignored");
            }
        }
    }

    #[test]
    fn break_only_from_working() {
        for phase in PHASES {
            let t = transition(phase, TimerEvent::Breaking);
            if phase == TimerPhase::Working {
                assert_eq!(t.next, TimerPhase::Breaking);
            } else {
                assert!(t.is_noop(phase));
            }
        }
    }

    #[test]
    fn stop_always_lands_in_ready_and_submits_before_reset() {
        for phase in PHASES {
            let t = transition(phase, TimerEvent::Stopped);
            assert_eq!(t.next, TimerPhase::Ready);
            let submit = t.effects.iter().position(|e| *e == Effect::Submit).unwrap();
            let reset = t.effects.iter().position(|e| *e == Effect::ResetElapsed).unwrap();
            assert!(submit < reset);
        }
    }

    #[test]
    fn only_a_fresh_start_resets_elapsed() {
        for phase in PHASES {
            let t = transition(phase, TimerEvent::Working);
            let resets = t.effects.contains(&Effect::ResetElapsed);
            assert_eq!(resets, phase == TimerPhase::Ready);
        }
    }

    #[test]
    fn resume_keeps_the_frozen_countdown() {
        let t = transition(TimerPhase::Paused, TimerEvent::Working);
        assert_eq!(t.next, TimerPhase::Working);
        assert!(!t.effects.contains(&Effect::ResetToInterval));
        assert_eq!(t.effects.last(), Some(&Effect::StartEngine));
    }

    #[test]
    fn every_transition_lands_in_a_resting_phase() {
        for phase in PHASES {
            for event in EVENTS {
                let next = transition(phase, event).next;
                assert!(PHASES.contains(&next));
            }
        }
    }

    #[test]
    fn parses_event_names() {
        assert_eq!("working".parse::<TimerEvent>().unwrap(), TimerEvent::Working);
        assert_eq!(" STOPPED ".parse::<TimerEvent>().unwrap(), TimerEvent::Stopped);
        assert!("SNOOZE".parse::<TimerEvent>().is_err());
    }
}
