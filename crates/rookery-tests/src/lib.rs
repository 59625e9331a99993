//! End-to-end helpers: a real rookery API on a loopback port and a small
//! HTTP client to drive it.

pub mod harness;
