//! Per-session countdown drivers.
//!
//! One background task per running session ticks the engine once a second
//! and fires the expiry submission when the countdown reaches zero. The
//! driver stops itself as soon as the engine reports the session idle;
//! pause, completion, and another session taking over the active slot all
//! surface that way. The countdown itself lives in the engine, so a driver
//! restart never resets the clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::interview::engine::{Engine, SubmitTrigger, TimerTick};

#[derive(Default)]
pub struct CountdownTimers {
    tasks: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl CountdownTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the driver for a session. An existing driver for the same
    /// session is aborted first, so at most one ever runs per session.
    pub async fn start(self: &Arc<Self>, engine: Arc<Engine>, session_id: Uuid) {
        let mut tasks = self.tasks.lock().await;
        if let Some(existing) = tasks.remove(&session_id) {
            existing.abort();
        }

        let timers = Arc::clone(self);
        let handle = tokio::spawn(async move {
            drive(engine, session_id).await;
            timers.tasks.lock().await.remove(&session_id);
            debug!("Countdown driver for session {session_id} stopped");
        });
        tasks.insert(session_id, handle);
    }

    /// Stop the driver for a session, if one is running.
    pub async fn cancel(&self, session_id: Uuid) {
        if let Some(handle) = self.tasks.lock().await.remove(&session_id) {
            handle.abort();
        }
    }
}

async fn drive(engine: Arc<Engine>, session_id: Uuid) {
    let mut ticker = time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the countdown starts a second in.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match engine.tick(session_id).await {
            TimerTick::Running { .. } => {}
            TimerTick::Expired => {
                // A failed expiry submission leaves the countdown at zero,
                // so the next tick reports Expired again and we retry.
                if let Err(err) = engine
                    .submit_answer(session_id, None, SubmitTrigger::Expiry)
                    .await
                {
                    warn!("Expiry submission for session {session_id} failed: {err}");
                }
            }
            TimerTick::Idle => break,
        }
    }
}
