// Interview core: question bank, session state machine, countdown drivers.

pub mod bank;
pub mod engine;
pub mod timer;
