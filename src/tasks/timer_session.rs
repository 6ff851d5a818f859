//! Per-user timer session task

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::timer::{
    DispatchOutcome, IntervalEngine, TimerEvent, TimerSession, TimerSettings, TimerSnapshot,
};

/// The task owning a user's timer has gone away
#[derive(Debug, Error)]
#[error("timer session for user {0} is closed")]
pub struct TimerClosed(pub i64);

/// Result of a dispatch, with the state it left behind
#[derive(Debug, Clone)]
pub struct DispatchReply {
    pub outcome: DispatchOutcome,
    pub snapshot: TimerSnapshot,
}

enum TimerCommand {
    Dispatch {
        event: TimerEvent,
        reply: oneshot::Sender<DispatchReply>,
    },
    Snapshot {
        reply: oneshot::Sender<TimerSnapshot>,
    },
    UpdateSettings {
        settings: TimerSettings,
    },
    Close,
}

/// Cloneable handle to a running timer session task
#[derive(Debug, Clone)]
pub struct TimerHandle {
    user_id: i64,
    tx: mpsc::Sender<TimerCommand>,
}

impl std::fmt::Debug for TimerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerCommand::Dispatch { event, .. } => write!(f, "Dispatch({})", event),
            TimerCommand::Snapshot { .. } => f.write_str("Snapshot"),
            TimerCommand::UpdateSettings { settings } => write!(f, "UpdateSettings({:?})", settings),
            TimerCommand::Close => f.write_str("Close"),
        }
    }
}

impl TimerHandle {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn dispatch(&self, event: TimerEvent) -> Result<DispatchReply, TimerClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(TimerCommand::Dispatch { event, reply }).await?;
        rx.await.map_err(|_| TimerClosed(self.user_id))
    }

    pub async fn snapshot(&self) -> Result<TimerSnapshot, TimerClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(TimerCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| TimerClosed(self.user_id))
    }

    pub async fn update_settings(&self, settings: TimerSettings) -> Result<(), TimerClosed> {
        self.send(TimerCommand::UpdateSettings { settings }).await
    }

    /// Stop the engine and end the task; later calls on any clone fail
    pub async fn close(&self) -> Result<(), TimerClosed> {
        self.send(TimerCommand::Close).await
    }

    async fn send(&self, command: TimerCommand) -> Result<(), TimerClosed> {
        self.tx
            .send(command)
            .await
            .map_err(|_| TimerClosed(self.user_id))
    }
}

/// Spawn a session task for `user_id` and return its handle
pub fn spawn_timer_session(user_id: i64, settings: TimerSettings, tick_period: Duration) -> TimerHandle {
    let (engine, ticks) = IntervalEngine::new(tick_period);
    let session = TimerSession::new(settings, engine);
    let (tx, commands) = mpsc::channel(32);

    tokio::spawn(timer_session_task(user_id, session, commands, ticks));
    TimerHandle { user_id, tx }
}

/// Owns one timer session and serializes commands and ticks against it
async fn timer_session_task(
    user_id: i64,
    mut session: TimerSession<IntervalEngine>,
    mut commands: mpsc::Receiver<TimerCommand>,
    mut ticks: mpsc::UnboundedReceiver<u64>,
) {
    info!("Starting timer session for user {}", user_id);

    loop {
        tokio::select! {
            // Commands first so a transition settles before a queued tick is seen
            biased;

            command = commands.recv() => {
                let Some(command) = command else { break };
                debug!("Timer session {} received {:?}", user_id, command);
                if !handle_command(&mut session, command) {
                    break;
                }
            }

            Some(generation) = ticks.recv() => {
                if !session.engine().is_current(generation) {
                    debug!("Discarding stale tick from run {} for user {}", generation, user_id);
                    continue;
                }
                if let Some(outcome) = session.tick() {
                    info!(
                        "Timer for user {} switched {} -> {} at zero",
                        user_id, outcome.from, outcome.to
                    );
                }
            }
        }
    }

    info!("Timer session for user {} closed", user_id);
}

/// Returns false once the session should end
fn handle_command(session: &mut TimerSession<IntervalEngine>, command: TimerCommand) -> bool {
    match command {
        TimerCommand::Dispatch { event, reply } => {
            let outcome = session.dispatch(event);
            let snapshot = session.snapshot();
            if reply.send(DispatchReply { outcome, snapshot }).is_err() {
                warn!("Dispatch caller went away before the reply for {}", event);
            }
        }
        TimerCommand::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
        }
        TimerCommand::UpdateSettings { settings } => session.apply_settings(settings),
        TimerCommand::Close => return false,
    }
    true
}
