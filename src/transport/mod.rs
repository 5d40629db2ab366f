//! The two interchangeable transports sharing one dispatcher (spec §4.6).

pub mod http;
pub mod stdio;
