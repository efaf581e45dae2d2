//! Client side of a relay-based 1:1 chat: one WebSocket connection per
//! local user, a peer directory, and per-peer threads rebuilt from an
//! interleaved message stream.

pub mod common;
pub mod config;
pub mod network;
pub mod storage;
pub mod ui;
