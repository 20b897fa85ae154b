use std::sync::Arc;

use crate::interview::engine::Engine;
use crate::interview::timer::CountdownTimers;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Countdown drivers, one background task per running session.
    pub timers: Arc<CountdownTimers>,
}
