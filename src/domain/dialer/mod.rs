//! Dialer domain — classification, parsing, and session state for the
//! upstream call-center platform.
//!
//! Everything here is pure and synchronous: heuristics over response
//! bodies, form builders, and the per-agent state machine. Network and
//! storage concerns live behind the ports.

mod agent;
pub mod campaigns;
pub mod classify;
mod error;
pub mod keyvalue;
pub mod payload;
pub mod runtime_fields;
mod session;

pub use agent::{AgentId, InvalidAgentId};
pub use campaigns::{parse_campaign_options, CampaignOption};
pub use classify::{ActiveLeadOutcome, ConnectOutcome, ManualDialOutcome, ParsedDialResponse};
pub use error::DialerError;
pub use runtime_fields::{extract_runtime_fields, RuntimeSessionFields};
pub use session::{AgentSession, CampaignContext, ConnectionPhase, DialMode};
