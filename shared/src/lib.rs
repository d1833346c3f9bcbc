//! Wire types and configuration shared between the user directory server and
//! its clients.

pub mod config;
pub mod types;
