// src/duel/mod.rs

//! Duel core module.
//!
//! This module holds the transport-free core of the client:
//! - Domain types (moves, outcomes, round results, duel phases)
//! - The wire message contract shared with the server
//! - The local command error taxonomy
//! - The `DuelClient` state machine, an explicit transition core that turns
//!   commands and server events into side-effect descriptions
//!
//! Nothing in here touches a socket or a timer; the `client` module executes
//! the effects this module emits.

pub mod error;
pub mod machine;
pub mod messages;
pub mod types;
