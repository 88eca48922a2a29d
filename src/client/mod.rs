// src/client/mod.rs

//! Client I/O layer root module.
//!
//! This module organizes the transport-facing components around the duel
//! core, including:
//! - The WebSocket session actor driving the state machine
//! - The register/login HTTP exchange
//! - Lobby polling (leaderboard, active user count)
//! - The presentation sink

pub mod auth;
pub mod lobby;
pub mod presenter;
pub mod session;
