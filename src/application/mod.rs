//! Application layer - orchestration over domain and ports.
//!
//! This layer sequences the multi-step upstream workflows and owns the
//! per-agent session registry. It talks to the outside world only through
//! the ports.

pub mod dialer;

pub use dialer::{
    ActiveLeadReport, AgentSessionRegistry, CampaignConnectReport, CampaignList, DialOrchestrator,
    DialReport, ManualDialReport, PhoneConnectReport, StatusReport,
};
