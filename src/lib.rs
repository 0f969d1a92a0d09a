//! Companion daemon for a browser productivity extension. The browser side
//! relays tab events and user commands over a local socket; the daemon owns
//! the productivity state machine, the idle timer, the per-domain time
//! ledger and the summary generation, and pushes state changes back to
//! whatever is listening.
//!

pub mod cli;
pub mod daemon;
pub mod utils;
