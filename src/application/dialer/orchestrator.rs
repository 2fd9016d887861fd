//! Dial Orchestrator - sequences the multi-step dialer workflows.
//!
//! Owns the per-agent state machine and drives the upstream protocol:
//! connect phone → connect campaign → dial → reconcile lead. Each step
//! sends a browser-shaped request through the transport, classifies the
//! free-text reply, and only then mutates session state. Operations for a
//! single agent hold that agent's session lock end to end, so two
//! state-mutating calls can never interleave for one identity while
//! unrelated agents proceed in parallel.

use std::sync::Arc;

use secrecy::{ExposeSecret, Secret};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::application::dialer::AgentSessionRegistry;
use crate::config::DialerConfig;
use crate::domain::dialer::payload::{
    connect_payload, manual_dial_payload, ManualDialOverrides, AGENT_API_PATH, AGENT_CONSOLE_PATH,
    DB_QUERY_PATH,
};
use crate::domain::dialer::{
    classify, keyvalue, parse_campaign_options, AgentId, AgentSession, ActiveLeadOutcome,
    CampaignOption, ConnectOutcome, ConnectionPhase, DialMode, DialerError, ManualDialOutcome,
    extract_runtime_fields,
};
use crate::ports::{
    CredentialError, CredentialStore, DialerTransport, LastSelection, TransportError,
    UpstreamRequest, UpstreamResponse,
};

/// Longest response prefix echoed in diagnostic payloads.
const SNIPPET_LEN: usize = 800;

impl From<TransportError> for DialerError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unreachable { detail } => DialerError::Unreachable { detail },
            TransportError::Protocol { status } => DialerError::UpstreamStatus { status },
            TransportError::ConfigMissing { field } => DialerError::ConfigMissing { field },
        }
    }
}

impl From<CredentialError> for DialerError {
    fn from(err: CredentialError) -> Self {
        DialerError::CredentialBackend(err.to_string())
    }
}

/// Result of a successful phone connect.
#[derive(Debug, Clone)]
pub struct PhoneConnectReport {
    pub phone_login: String,
}

/// Result of a campaign listing.
#[derive(Debug, Clone)]
pub struct CampaignList {
    pub phone_login: String,
    pub campaigns: Vec<CampaignOption>,
}

/// Result of a successful campaign connect.
#[derive(Debug, Clone)]
pub struct CampaignConnectReport {
    pub campaign: String,
    pub mode: DialMode,
    pub phone_login: String,
}

/// Result of a next-lead dial after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialReport {
    /// A lead was assigned; the session is `LeadActive`.
    LeadActive {
        call_id: Option<String>,
        lead_id: i64,
    },
    /// The dial is in flight but no lead appeared within the polling
    /// bound. A legitimate transient condition, not an error; the caller
    /// should re-query the active lead later.
    DialingNoLeadYet { call_id: Option<String> },
}

/// Result of an explicit-number manual dial.
#[derive(Debug, Clone)]
pub struct ManualDialReport {
    pub call_id: Option<String>,
    pub lead_id: Option<i64>,
    pub status: Option<String>,
}

/// Result of an active-lead query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveLeadReport {
    /// A dial is in flight; answered from session state without an
    /// upstream call.
    Dialing { call_id: String },
    /// A lead is active.
    Lead {
        lead_id: i64,
        phone_number: Option<String>,
        campaign: Option<String>,
    },
    /// No lead right now; `classification` says why we think so.
    NoLead { classification: ActiveLeadOutcome },
    /// Upstream invalidated the session; the caller must reconnect.
    ReloginRequired,
}

/// Point-in-time session status for one agent.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub agent: String,
    pub phase: ConnectionPhase,
    pub phone_connected: bool,
    pub phone_login: Option<String>,
    pub campaign: Option<String>,
    pub mode: Option<DialMode>,
    pub call_id: Option<String>,
    pub lead_id: Option<i64>,
    pub ready: bool,
    pub campaign_connected_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Orchestrates dialer sessions over the transport and credential ports.
pub struct DialOrchestrator {
    transport: Arc<dyn DialerTransport>,
    credentials: Arc<dyn CredentialStore>,
    registry: AgentSessionRegistry,
    config: DialerConfig,
}

impl DialOrchestrator {
    pub fn new(
        transport: Arc<dyn DialerTransport>,
        credentials: Arc<dyn CredentialStore>,
        config: DialerConfig,
    ) -> Self {
        Self {
            transport,
            credentials,
            registry: AgentSessionRegistry::new(),
            config,
        }
    }

    /// Connects the agent's phone extension (first-stage login). On success
    /// the session enters `PhoneConnected`; on failure all state for the
    /// agent is cleared.
    pub async fn connect_phone(
        &self,
        agent: &AgentId,
        phone_login: &str,
    ) -> Result<PhoneConnectReport, DialerError> {
        let entry = self.registry.entry(agent).await;
        let mut session = entry.lock().await;

        let phone_pass = self.config.phone_pass_for(phone_login);
        let request = UpstreamRequest::post_form(AGENT_CONSOLE_PATH)
            .with_params(connect_payload(phone_login, &phone_pass, None, None));

        let response = match self.transport.request_with_session(agent, request).await {
            Ok(response) => response,
            Err(err) => {
                session.disconnect();
                self.transport.clear_session(agent).await;
                return Err(err.into());
            }
        };

        if !classify::has_positive_signal(&response.body) {
            session.disconnect();
            self.transport.clear_session(agent).await;
            warn!(agent = %agent, status = response.status, "phone connect not confirmed");
            return Err(DialerError::PhoneConnectFailed {
                status: response.status,
                snippet: self.snippet(&response, &[phone_pass.as_str()]),
            });
        }

        session.phone_connected(phone_login.to_string());
        info!(agent = %agent, phone_login, "phone connected");
        Ok(PhoneConnectReport {
            phone_login: phone_login.to_string(),
        })
    }

    /// Clears cookies and in-memory state unconditionally. Idempotent.
    pub async fn disconnect_phone(&self, agent: &AgentId) -> Result<(), DialerError> {
        let entry = self.registry.entry(agent).await;
        entry.lock().await.disconnect();
        self.registry.remove(agent).await;
        self.transport.clear_session(agent).await;
        info!(agent = %agent, "phone disconnected");
        Ok(())
    }

    /// Lists the campaigns the agent may connect to.
    pub async fn list_campaigns(&self, agent: &AgentId) -> Result<CampaignList, DialerError> {
        let entry = self.registry.entry(agent).await;
        let session = entry.lock().await;
        session.require_phase(ConnectionPhase::PhoneConnected)?;
        let phone_login = session.phone_login().unwrap_or_default().to_string();

        let agent_pass = self.require_agent_pass(agent).await?;
        let request = UpstreamRequest::post_form(DB_QUERY_PATH)
            .with_param("ACTION", "LogiNCamPaigns")
            .with_param("format", "html")
            .with_param("user", agent.as_str())
            .with_param("pass", agent_pass.expose_secret().as_str())
            .with_param("agent_user", agent.as_str())
            .with_param("phone_login", phone_login.as_str())
            .with_param("phone_pass", self.config.phone_pass_for(&phone_login));

        let response = self.transport.request_with_session(agent, request).await?;
        if classify::has_credential_rejection(&response.body) {
            return Err(DialerError::InvalidCredentials);
        }

        let campaigns = parse_campaign_options(&response.body);
        if campaigns.is_empty() {
            warn!(agent = %agent, status = response.status, "campaign listing came back empty");
            return Err(DialerError::NoCampaigns);
        }
        Ok(CampaignList {
            phone_login,
            campaigns,
        })
    }

    /// Connects the agent to a campaign. On success the runtime session
    /// fields are refreshed and the session enters `CampaignConnected`; any
    /// other classification maps to an outcome-specific error without a
    /// state transition.
    pub async fn connect_campaign(
        &self,
        agent: &AgentId,
        campaign_id: &str,
        mode: Option<DialMode>,
        remember: bool,
    ) -> Result<CampaignConnectReport, DialerError> {
        let entry = self.registry.entry(agent).await;
        let mut session = entry.lock().await;
        session.require_phase(ConnectionPhase::PhoneConnected)?;
        let phone_login = session.phone_login().unwrap_or_default().to_string();

        let agent_pass = self.require_agent_pass(agent).await?;
        let phone_pass = self.config.phone_pass_for(&phone_login);
        let request = UpstreamRequest::post_form(AGENT_CONSOLE_PATH).with_params(connect_payload(
            &phone_login,
            &phone_pass,
            Some((agent.as_str(), agent_pass.expose_secret().as_str())),
            Some(campaign_id),
        ));

        let response = self.transport.request_with_session(agent, request).await?;
        let outcome = classify::classify_connect(&response.body);
        debug!(agent = %agent, campaign = campaign_id, ?outcome, "campaign connect classified");

        match outcome {
            ConnectOutcome::Success => {
                let runtime = extract_runtime_fields(&response.body);
                let mode = mode.unwrap_or(DialMode::Predictive);
                session.campaign_connected(campaign_id.to_string(), mode, runtime)?;
                if remember {
                    let selection = LastSelection {
                        phone_login: phone_login.clone(),
                        campaign: campaign_id.to_string(),
                    };
                    if let Err(err) = self.credentials.save_last_selection(agent, selection).await {
                        warn!(agent = %agent, %err, "failed to remember selection");
                    }
                }
                info!(agent = %agent, campaign = campaign_id, mode = mode.as_str(), "campaign connected");
                Ok(CampaignConnectReport {
                    campaign: campaign_id.to_string(),
                    mode,
                    phone_login,
                })
            }
            ConnectOutcome::StillLoginPage => Err(DialerError::ReloginRequired),
            ConnectOutcome::InvalidCredentials => Err(DialerError::InvalidCredentials),
            ConnectOutcome::PhoneInvalid => Err(DialerError::PhoneInvalid),
            ConnectOutcome::CampaignNotAssigned => Err(DialerError::CampaignNotAssigned),
            ConnectOutcome::NoLeads => Err(DialerError::NoLeads),
            ConnectOutcome::GenericError | ConnectOutcome::Unknown => {
                Err(DialerError::CampaignConnectFailed {
                    classification: outcome,
                    status: response.status,
                    snippet: self.snippet(
                        &response,
                        &[agent_pass.expose_secret().as_str(), phone_pass.as_str()],
                    ),
                })
            }
        }
    }

    /// Dials the next lead of a campaign and reconciles the asynchronous
    /// lead assignment.
    pub async fn dial_next(
        &self,
        agent: &AgentId,
        campaign_id: &str,
    ) -> Result<DialReport, DialerError> {
        let entry = self.registry.entry(agent).await;
        let mut session = entry.lock().await;
        session.require_phase(ConnectionPhase::CampaignConnected)?;
        let context = match session.campaign_context().cloned() {
            Some(context) => context,
            None => {
                return Err(DialerError::NotConnected {
                    required: ConnectionPhase::CampaignConnected,
                    actual: session.phase(),
                })
            }
        };
        let campaign = resolve_campaign(campaign_id, &context.campaign);

        let agent_pass = self.require_agent_pass(agent).await?;
        let form = manual_dial_payload(
            agent.as_str(),
            agent_pass.expose_secret(),
            &context,
            &campaign,
            None,
            false,
        )?;
        let request = UpstreamRequest::post_form(DB_QUERY_PATH).with_params(form);

        let response = self.transport.request_with_session(agent, request).await?;
        let parsed = classify::parse_dial_response(&response.body);
        debug!(agent = %agent, campaign = %campaign, outcome = ?parsed.outcome, "dial next classified");

        match parsed.outcome {
            ManualDialOutcome::Success => {
                self.reconcile_dialed_lead(agent, &mut session, parsed.call_id, parsed.lead_id)
                    .await
            }
            other => Err(self.dial_failure(other, &response, agent_pass.expose_secret())),
        }
    }

    /// Dials an explicit phone number with caller-supplied overrides.
    /// Mirrors the upstream manual-dial form; does not alter dial state.
    pub async fn manual_dial(
        &self,
        agent: &AgentId,
        campaign_id: &str,
        overrides: ManualDialOverrides,
        preview: bool,
    ) -> Result<ManualDialReport, DialerError> {
        let entry = self.registry.entry(agent).await;
        let session = entry.lock().await;
        session.require_phase(ConnectionPhase::CampaignConnected)?;
        let context = match session.campaign_context().cloned() {
            Some(context) => context,
            None => {
                return Err(DialerError::NotConnected {
                    required: ConnectionPhase::CampaignConnected,
                    actual: session.phase(),
                })
            }
        };
        let campaign = resolve_campaign(campaign_id, &context.campaign);

        let agent_pass = self.require_agent_pass(agent).await?;
        let form = manual_dial_payload(
            agent.as_str(),
            agent_pass.expose_secret(),
            &context,
            &campaign,
            Some(&overrides),
            preview,
        )?;
        let request = UpstreamRequest::post_form(DB_QUERY_PATH).with_params(form);

        let response = self.transport.request_with_session(agent, request).await?;
        let parsed = classify::parse_dial_response(&response.body);

        match parsed.outcome {
            ManualDialOutcome::Success => {
                let pairs = keyvalue::parse_key_values(&response.body);
                Ok(ManualDialReport {
                    call_id: parsed.call_id.or_else(|| {
                        keyvalue::first_present(&pairs, &["call_id", "callid", "callerid"])
                    }),
                    lead_id: parsed.lead_id.or_else(|| {
                        keyvalue::first_present(&pairs, &["lead_id", "leadid"])
                            .and_then(|v| v.parse().ok())
                    }),
                    status: keyvalue::first_present(&pairs, &["status", "result"]),
                })
            }
            other => Err(self.dial_failure(other, &response, agent_pass.expose_secret())),
        }
    }

    /// Classifies the agent's active lead. When a dial is in flight the
    /// answer comes straight from session state, without an upstream call.
    pub async fn query_active_lead(
        &self,
        agent: &AgentId,
    ) -> Result<ActiveLeadReport, DialerError> {
        let entry = self.registry.entry(agent).await;
        let mut session = entry.lock().await;

        if let AgentSession::Dialing { call_id, .. } = &*session {
            return Ok(ActiveLeadReport::Dialing {
                call_id: call_id.clone(),
            });
        }
        session.require_phase(ConnectionPhase::CampaignConnected)?;

        let request = self.active_lead_request(agent)?;
        let response = self.transport.request(request).await?;
        let outcome = classify::classify_active_lead(&response.body);
        debug!(agent = %agent, ?outcome, "active lead classified");

        match outcome {
            ActiveLeadOutcome::ReloginRequired => Ok(ActiveLeadReport::ReloginRequired),
            ActiveLeadOutcome::Success => {
                match classify::find_lead_id(&response.body) {
                    Some(lead_id) => {
                        session.lead_active(None, lead_id)?;
                        Ok(ActiveLeadReport::Lead {
                            lead_id,
                            phone_number: keyvalue::extract(&response.body, "phone_number"),
                            campaign: keyvalue::extract(&response.body, "campaign"),
                        })
                    }
                    None => {
                        session.clear_dial();
                        Ok(ActiveLeadReport::NoLead {
                            classification: ActiveLeadOutcome::Unknown,
                        })
                    }
                }
            }
            // Unknown fails open for this read-only query: a transiently
            // empty hopper is expected, not an error.
            ActiveLeadOutcome::NoActiveLead | ActiveLeadOutcome::Unknown => {
                session.clear_dial();
                Ok(ActiveLeadReport::NoLead {
                    classification: outcome,
                })
            }
        }
    }

    /// Reports reachability and the agent's session phase.
    pub async fn query_status(&self, agent: &AgentId) -> Result<StatusReport, DialerError> {
        self.transport.probe().await?;

        let entry = self.registry.entry(agent).await;
        let session = entry.lock().await;
        let phase = session.phase();
        let context = session.campaign_context();
        Ok(StatusReport {
            agent: agent.to_string(),
            phase,
            phone_connected: phase >= ConnectionPhase::PhoneConnected,
            phone_login: session.phone_login().map(str::to_string),
            campaign: context.map(|c| c.campaign.clone()),
            mode: context.map(|c| c.mode),
            call_id: session.call_id().map(str::to_string),
            lead_id: session.lead_id(),
            ready: phase >= ConnectionPhase::CampaignConnected,
            campaign_connected_at: context.map(|c| c.connected_at),
        })
    }

    /// Records a call disposition against the upstream dialer.
    pub async fn record_interaction_outcome(
        &self,
        agent: &AgentId,
        disposition: &str,
        lead_id: Option<i64>,
        campaign: &str,
    ) -> Result<(), DialerError> {
        let request = self
            .api_request("external_status")?
            .with_param("agent_user", agent.as_str())
            .with_param("value", disposition)
            .with_param("dispo_choice", disposition)
            .with_param(
                "lead_id",
                lead_id.map(|id| id.to_string()).unwrap_or_default(),
            )
            .with_param("campaign", campaign);

        let response = self.transport.request(request).await?;
        if !classify::has_positive_signal(&response.body) {
            return Err(DialerError::NotConfirmed {
                operation: "disposition",
                status: response.status,
                snippet: self.snippet(&response, &[]),
            });
        }
        info!(agent = %agent, disposition, ?lead_id, "disposition recorded");
        Ok(())
    }

    /// Pauses or resumes the agent in the upstream queue.
    pub async fn pause(&self, agent: &AgentId, pause: bool) -> Result<(), DialerError> {
        let value = if pause { "PAUSE" } else { "RESUME" };
        let request = self
            .api_request("external_pause")?
            .with_param("agent_user", agent.as_str())
            .with_param("value", value);

        let response = self.transport.request(request).await?;
        if !classify::has_positive_signal(&response.body) {
            return Err(DialerError::NotConfirmed {
                operation: "pause",
                status: response.status,
                snippet: self.snippet(&response, &[]),
            });
        }
        Ok(())
    }

    /// Sends a preview-dial action (SKIP / DIALONLY / ...) for a lead.
    pub async fn preview_action(
        &self,
        agent: &AgentId,
        lead_id: i64,
        campaign: &str,
        action: &str,
    ) -> Result<(), DialerError> {
        let request = self
            .api_request("preview_dial_action")?
            .with_param("agent_user", agent.as_str())
            .with_param("lead_id", lead_id.to_string())
            .with_param("campaign", campaign)
            .with_param("value", action);

        let response = self.transport.request(request).await?;
        if !classify::has_positive_signal(&response.body) {
            return Err(DialerError::NotConfirmed {
                operation: "preview action",
                status: response.status,
                snippet: self.snippet(&response, &[]),
            });
        }
        Ok(())
    }

    /// Reconciles a dial with the lead it eventually produces. When the
    /// dial response already carried a lead id, polling is skipped
    /// entirely. Polling failures are tolerated: the bound, not any single
    /// attempt, decides the outcome.
    async fn reconcile_dialed_lead(
        &self,
        agent: &AgentId,
        session: &mut AgentSession,
        call_id: Option<String>,
        lead_id: Option<i64>,
    ) -> Result<DialReport, DialerError> {
        if let Some(lead_id) = lead_id {
            session.lead_active(call_id.clone(), lead_id)?;
            return Ok(DialReport::LeadActive { call_id, lead_id });
        }

        for attempt in 0..self.config.lead_poll_attempts {
            if attempt > 0 {
                sleep(self.config.lead_poll_delay()).await;
            }
            let request = match self.active_lead_request(agent) {
                Ok(request) => request,
                Err(err) => {
                    debug!(agent = %agent, %err, "lead reconciliation cannot poll");
                    break;
                }
            };
            match self.transport.request(request).await {
                Ok(response)
                    if classify::classify_active_lead(&response.body)
                        == ActiveLeadOutcome::Success =>
                {
                    if let Some(lead_id) = classify::find_lead_id(&response.body) {
                        session.lead_active(call_id.clone(), lead_id)?;
                        info!(agent = %agent, lead_id, attempt, "lead reconciled");
                        return Ok(DialReport::LeadActive { call_id, lead_id });
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(agent = %agent, %err, attempt, "lead reconciliation poll failed");
                }
            }
        }

        if let Some(call_id) = call_id.clone() {
            session.dialing(call_id)?;
        }
        info!(agent = %agent, ?call_id, "dialing, no lead yet");
        Ok(DialReport::DialingNoLeadYet { call_id })
    }

    fn dial_failure(
        &self,
        outcome: ManualDialOutcome,
        response: &UpstreamResponse,
        agent_pass: &str,
    ) -> DialerError {
        match outcome {
            ManualDialOutcome::ReloginRequired => DialerError::ReloginRequired,
            ManualDialOutcome::InvalidCredentials => DialerError::InvalidCredentials,
            ManualDialOutcome::PermissionDenied => DialerError::PermissionDenied,
            ManualDialOutcome::NoLeads => DialerError::NoLeads,
            ManualDialOutcome::Failed | ManualDialOutcome::Unknown | ManualDialOutcome::Success => {
                DialerError::DialFailed {
                    classification: outcome,
                    status: response.status,
                    snippet: self.snippet(response, &[agent_pass]),
                }
            }
        }
    }

    fn active_lead_request(&self, agent: &AgentId) -> Result<UpstreamRequest, DialerError> {
        Ok(self
            .api_request("st_get_agent_active_lead")?
            .with_param("agent_user", agent.as_str()))
    }

    /// Builds an agent-API request carrying the configured API identity.
    fn api_request(&self, function: &str) -> Result<UpstreamRequest, DialerError> {
        let (user, pass) = self
            .config
            .api_credentials()
            .ok_or(DialerError::ConfigMissing {
                field: "api credentials",
            })?;
        Ok(UpstreamRequest::get(AGENT_API_PATH)
            .with_param("source", self.config.source.as_str())
            .with_param("user", user)
            .with_param("pass", pass)
            .with_param("function", function))
    }

    async fn require_agent_pass(&self, agent: &AgentId) -> Result<Secret<String>, DialerError> {
        self.credentials
            .agent_pass(agent)
            .await?
            .ok_or_else(|| DialerError::CredentialsMissing {
                agent: agent.to_string(),
            })
    }

    /// Bounded diagnostic snippet with secret material masked. `None`
    /// unless debug diagnostics are enabled.
    fn snippet(&self, response: &UpstreamResponse, secrets: &[&str]) -> Option<String> {
        if !self.config.debug {
            return None;
        }
        let mut snippet = response.snippet(SNIPPET_LEN);
        if let Some((_, pass)) = self.config.api_credentials() {
            snippet = snippet.replace(pass, "***");
        }
        for secret in secrets {
            if !secret.is_empty() {
                snippet = snippet.replace(*secret, "***");
            }
        }
        Some(snippet)
    }
}

fn resolve_campaign(requested: &str, connected: &str) -> String {
    if requested.trim().is_empty() {
        connected.to_string()
    } else {
        requested.trim().to_string()
    }
}
