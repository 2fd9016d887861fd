//! Dialbridge - Agent-Side Dialer Integration Bridge
//!
//! This crate brokers interaction between agent-facing applications and a
//! legacy call-center dialer that only speaks browser-oriented HTML/text.
//! It maintains per-agent session affinity, classifies free-text responses
//! into machine-readable outcomes, and reconciles asynchronous dials with
//! the leads they produce.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
