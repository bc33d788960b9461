//! Tool execution.
//!
//! Each tool call the model requests is parsed into a [`ToolAction`] variant
//! with its own typed argument record, then dispatched.  Every branch
//! absorbs its own failures: nothing that happens in here can abort the
//! customer's turn.  A CRM outage degrades scheduling and callbacks to a
//! locally-synthesized acknowledgment that still confirms receipt — a missed
//! appointment request costs more than a duplicate manual follow-up.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::crm::{ClientHandle, CrmConnector, CrmResult};
use crate::kb::KnowledgeBase;
use crate::llm::types::ToolCall;
use crate::prompts::tools::{
    CHECK_APPOINTMENT_STATUS, ESCALATE_TO_HUMAN, REQUEST_CALLBACK, SCHEDULE_APPOINTMENT,
    SEARCH_KNOWLEDGE_BASE,
};

// ---------------------------------------------------------------------------
// Result shape
// ---------------------------------------------------------------------------

/// Normalized outcome of one tool execution.
///
/// `message` is customer-facing and always safe to show; `error` is the
/// technical detail, logged but never displayed.
#[derive(Debug, Clone, Serialize)]
pub struct ToolExecutionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolExecutionResult {
    fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
        }
    }

    fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleArgs {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub preferred_date: Option<String>,
    #[serde(default)]
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub issue_description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusArgs {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackArgs {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub best_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchArgs {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EscalateArgs {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub summary: String,
}

/// A tool call resolved against the catalog.  Every catalog tool has a
/// variant; payloads with an unknown name land in `Unrecognized` instead of
/// failing to parse.
#[derive(Debug, Clone)]
pub enum ToolAction {
    Schedule(ScheduleArgs),
    CheckStatus(StatusArgs),
    Callback(CallbackArgs),
    SearchKb(SearchArgs),
    Escalate(EscalateArgs),
    Unrecognized { name: String },
}

impl ToolAction {
    /// Resolve a raw tool call.  Argument records tolerate missing fields;
    /// a structurally bad payload degrades to defaults, never to an error.
    pub fn parse(call: &ToolCall) -> Self {
        fn args<T: Default + for<'de> Deserialize<'de>>(call: &ToolCall) -> T {
            serde_json::from_value(Value::Object(call.arguments.clone())).unwrap_or_default()
        }
        match call.name.as_str() {
            SCHEDULE_APPOINTMENT => ToolAction::Schedule(args(call)),
            CHECK_APPOINTMENT_STATUS => ToolAction::CheckStatus(args(call)),
            REQUEST_CALLBACK => ToolAction::Callback(args(call)),
            SEARCH_KNOWLEDGE_BASE => ToolAction::SearchKb(args(call)),
            ESCALATE_TO_HUMAN => ToolAction::Escalate(args(call)),
            other => ToolAction::Unrecognized {
                name: other.to_owned(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Executes tool calls against the tenant's external integrations.
pub struct ToolExecutor {
    tenant_id: Uuid,
    crm: Option<Arc<dyn CrmConnector>>,
    kb: Option<Arc<dyn KnowledgeBase>>,
}

impl ToolExecutor {
    pub fn new(
        tenant_id: Uuid,
        crm: Option<Arc<dyn CrmConnector>>,
        kb: Option<Arc<dyn KnowledgeBase>>,
    ) -> Self {
        Self { tenant_id, crm, kb }
    }

    /// Execute one tool call.  Total: every path returns a result.
    pub async fn execute(&self, call: &ToolCall) -> ToolExecutionResult {
        tracing::info!(tool = %call.name, "executing tool call");
        match ToolAction::parse(call) {
            ToolAction::Schedule(args) => self.schedule_appointment(args).await,
            ToolAction::CheckStatus(args) => self.check_appointment_status(args).await,
            ToolAction::Callback(args) => self.request_callback(args).await,
            ToolAction::SearchKb(args) => self.search_knowledge_base(args).await,
            // Escalation is intercepted upstream and never executed as a
            // side effect; this arm only covers a direct call.
            ToolAction::Escalate(_) => {
                ToolExecutionResult::ok("Conversation transferred to human agent.", None)
            }
            ToolAction::Unrecognized { name } => {
                tracing::warn!(tool = %name, "unknown tool requested");
                ToolExecutionResult::failed(format!("Unknown action: {name}"), "not implemented")
            }
        }
    }

    // -- schedule_appointment --------------------------------------------

    async fn schedule_appointment(&self, args: ScheduleArgs) -> ToolExecutionResult {
        let Some(crm) = &self.crm else {
            tracing::info!("no crm connected, using local scheduling fallback");
            return Self::schedule_fallback(&args, Some("CRM not connected".into()));
        };
        match Self::try_schedule(crm.as_ref(), &args).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "crm scheduling failed, using local fallback");
                Self::schedule_fallback(&args, Some(err.to_string()))
            }
        }
    }

    async fn try_schedule(
        crm: &dyn CrmConnector,
        args: &ScheduleArgs,
    ) -> CrmResult<ToolExecutionResult> {
        let service_type = or_fallback(&args.service_type, "Service Request");
        let client = crm
            .find_or_create_client(&args.customer_name, &args.phone, args.email.as_deref())
            .await?;

        let title = format!("{service_type} - {}", client.name);
        let details = format!(
            "Service type: {service_type}\nPreferred date: {}\nPreferred time: {}\nPhone: {}\nAddress: {}\nNotes: {}",
            args.preferred_date.as_deref().unwrap_or("TBD"),
            args.preferred_time.as_deref().unwrap_or("TBD"),
            args.phone,
            args.address.as_deref().unwrap_or("On file"),
            args.issue_description.as_deref().unwrap_or("None"),
        );
        let request = crm.create_service_request(&client, &title, &details).await?;

        tracing::info!(client = %client.id, request = %request.id, "crm appointment created");
        Ok(ToolExecutionResult::ok(
            format!(
                "✓ Appointment scheduled for {}! Service: {}. Preferred time: {} {}. You'll receive a confirmation shortly.",
                or_fallback(&args.customer_name, "you"),
                or_fallback(&args.service_type, "general service"),
                args.preferred_date.as_deref().unwrap_or(""),
                args.preferred_time.as_deref().unwrap_or(""),
            ),
            Some(json!({
                "client_id": client.id,
                "request_id": request.id,
                "title": title,
            })),
        ))
    }

    fn schedule_fallback(args: &ScheduleArgs, error: Option<String>) -> ToolExecutionResult {
        ToolExecutionResult {
            success: true,
            message: format!(
                "✓ Appointment request received for {}! Service: {}. Preferred time: {} {}. Our team will reach out to confirm the appointment time.",
                or_fallback(&args.customer_name, "you"),
                or_fallback(&args.service_type, "general service"),
                args.preferred_date.as_deref().unwrap_or("TBD"),
                args.preferred_time.as_deref().unwrap_or(""),
            ),
            data: Some(json!({"fallback": true})),
            error,
        }
    }

    // -- check_appointment_status ------------------------------------------

    async fn check_appointment_status(&self, args: StatusArgs) -> ToolExecutionResult {
        let Some(crm) = &self.crm else {
            return Self::status_fallback();
        };
        match Self::try_check_status(crm.as_ref(), &args).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "crm appointment lookup failed");
                ToolExecutionResult::failed(
                    "I had trouble looking up your appointment. Can you verify your phone number?",
                    err.to_string(),
                )
            }
        }
    }

    async fn try_check_status(
        crm: &dyn CrmConnector,
        args: &StatusArgs,
    ) -> CrmResult<ToolExecutionResult> {
        let mut client = crm.find_client_by_phone(&args.phone).await?;
        if client.is_none() {
            if let Some(name) = args.name.as_deref().filter(|n| !n.is_empty()) {
                client = crm.find_client_by_name(name).await?;
            }
        }

        let Some(client) = client else {
            // Not found is a successful empty result, not an error.
            return Ok(ToolExecutionResult::ok(
                "I couldn't find any upcoming appointments for that phone number. Would you like to schedule a new appointment?",
                Some(json!({"appointments": []})),
            ));
        };

        let jobs = crm.list_recent_jobs(&client, 5).await?;
        let Some(latest) = jobs.first() else {
            return Ok(ToolExecutionResult::ok(
                "I couldn't find any upcoming appointments for that phone number. Would you like to schedule a new appointment?",
                Some(json!({"appointments": []})),
            ));
        };

        let appointments: Vec<Value> = jobs
            .iter()
            .map(|j| {
                json!({
                    "id": j.id,
                    "title": j.title,
                    "status": j.status,
                    "scheduled_for": j.scheduled_for,
                })
            })
            .collect();

        Ok(ToolExecutionResult::ok(
            format!(
                "I found your appointment! Service: {}. Scheduled for: {}. Status: {}.",
                or_fallback(&latest.title, "Service call"),
                latest.scheduled_for.as_deref().unwrap_or("TBD"),
                or_fallback(&latest.status, "scheduled"),
            ),
            Some(json!({"appointments": appointments})),
        ))
    }

    fn status_fallback() -> ToolExecutionResult {
        ToolExecutionResult::ok(
            "I'm checking our system for your appointment. Our team will follow up with the details shortly. Is there anything else I can help you with?",
            Some(json!({"fallback": true})),
        )
    }

    // -- request_callback ----------------------------------------------------

    async fn request_callback(&self, args: CallbackArgs) -> ToolExecutionResult {
        let Some(crm) = &self.crm else {
            return Self::callback_fallback(&args, Some("CRM not connected".into()));
        };
        match Self::try_callback(crm.as_ref(), &args).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "crm callback request failed, using local fallback");
                Self::callback_fallback(&args, Some(err.to_string()))
            }
        }
    }

    async fn try_callback(
        crm: &dyn CrmConnector,
        args: &CallbackArgs,
    ) -> CrmResult<ToolExecutionResult> {
        let client = crm
            .find_or_create_client(&args.customer_name, &args.phone, None)
            .await?;

        let reason = or_fallback(&args.reason, "Callback requested");
        let title = format!("Callback Request - {}", truncate_chars(reason, 50));
        let details = format!(
            "CALLBACK REQUESTED\n\nReason: {reason}\nBest time to call: {}\nPhone: {}",
            args.best_time.as_deref().unwrap_or("Any time"),
            args.phone,
        );
        let request = crm.create_service_request(&client, &title, &details).await?;

        tracing::info!(client = %client.id, request = %request.id, "crm callback request created");
        Ok(ToolExecutionResult::ok(
            format!(
                "✓ Callback request submitted for {}! Regarding: {}. Someone from our team will call you back during business hours.",
                or_fallback(&args.customer_name, "you"),
                or_fallback(&args.reason, "your inquiry"),
            ),
            Some(json!({"client_id": client.id, "request_id": request.id})),
        ))
    }

    fn callback_fallback(args: &CallbackArgs, error: Option<String>) -> ToolExecutionResult {
        ToolExecutionResult {
            success: true,
            message: format!(
                "✓ Callback request received for {}! Regarding: {}. Someone will call you back within 2 hours during business hours.",
                or_fallback(&args.customer_name, "you"),
                or_fallback(&args.reason, "your inquiry"),
            ),
            data: Some(json!({"fallback": true})),
            error,
        }
    }

    // -- search_knowledge_base ------------------------------------------------

    async fn search_knowledge_base(&self, args: SearchArgs) -> ToolExecutionResult {
        let Some(kb) = &self.kb else {
            return ToolExecutionResult::ok(
                "I couldn't find anything about that in our records. Would you like me to have someone follow up with the answer?",
                Some(json!({"query": args.query, "results": []})),
            );
        };
        match kb.context_for_query(self.tenant_id, &args.query, 3, 2000).await {
            Ok(Some(text)) => {
                ToolExecutionResult::ok(text, Some(json!({"query": args.query})))
            }
            Ok(None) => ToolExecutionResult::ok(
                "I couldn't find anything about that in our records. Would you like me to have someone follow up with the answer?",
                Some(json!({"query": args.query, "results": []})),
            ),
            Err(err) => {
                tracing::error!(error = %err, "knowledge base search failed");
                ToolExecutionResult::failed(
                    "I wasn't able to search our records just now. Would you like me to have someone follow up?",
                    err.to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::{CrmError, JobSummary, RequestHandle};
    use async_trait::async_trait;

    struct HealthyCrm;

    #[async_trait]
    impl CrmConnector for HealthyCrm {
        async fn find_or_create_client(
            &self,
            name: &str,
            _phone: &str,
            _email: Option<&str>,
        ) -> CrmResult<ClientHandle> {
            Ok(ClientHandle {
                id: "client_1".into(),
                name: name.to_owned(),
            })
        }

        async fn create_service_request(
            &self,
            _client: &ClientHandle,
            title: &str,
            _details: &str,
        ) -> CrmResult<RequestHandle> {
            Ok(RequestHandle {
                id: "req_1".into(),
                title: title.to_owned(),
            })
        }

        async fn find_client_by_phone(&self, _phone: &str) -> CrmResult<Option<ClientHandle>> {
            Ok(Some(ClientHandle {
                id: "client_1".into(),
                name: "Jane Doe".into(),
            }))
        }

        async fn find_client_by_name(&self, _name: &str) -> CrmResult<Option<ClientHandle>> {
            Ok(None)
        }

        async fn list_recent_jobs(
            &self,
            _client: &ClientHandle,
            _limit: usize,
        ) -> CrmResult<Vec<JobSummary>> {
            Ok(vec![JobSummary {
                id: "job_1".into(),
                title: "AC repair".into(),
                status: "scheduled".into(),
                scheduled_for: Some("Monday morning".into()),
            }])
        }
    }

    struct DownCrm;

    #[async_trait]
    impl CrmConnector for DownCrm {
        async fn find_or_create_client(
            &self,
            _name: &str,
            _phone: &str,
            _email: Option<&str>,
        ) -> CrmResult<ClientHandle> {
            Err(CrmError::Transport("connection refused".into()))
        }

        async fn create_service_request(
            &self,
            _client: &ClientHandle,
            _title: &str,
            _details: &str,
        ) -> CrmResult<RequestHandle> {
            Err(CrmError::Transport("connection refused".into()))
        }

        async fn find_client_by_phone(&self, _phone: &str) -> CrmResult<Option<ClientHandle>> {
            Err(CrmError::Transport("connection refused".into()))
        }

        async fn find_client_by_name(&self, _name: &str) -> CrmResult<Option<ClientHandle>> {
            Err(CrmError::Transport("connection refused".into()))
        }

        async fn list_recent_jobs(
            &self,
            _client: &ClientHandle,
            _limit: usize,
        ) -> CrmResult<Vec<JobSummary>> {
            Err(CrmError::Transport("connection refused".into()))
        }
    }

    fn call(name: &str, args: serde_json::Value) -> ToolCall {
        let arguments = match args {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    fn executor_with(crm: Option<Arc<dyn CrmConnector>>) -> ToolExecutor {
        ToolExecutor::new(Uuid::now_v7(), crm, None)
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failed_result_not_a_crash() {
        let executor = executor_with(None);
        let result = executor.execute(&call("delete_everything", json!({}))).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("not implemented"));
        assert!(result.message.contains("delete_everything"));
    }

    #[tokio::test]
    async fn scheduling_without_crm_still_confirms_receipt() {
        let executor = executor_with(None);
        let result = executor
            .execute(&call(
                SCHEDULE_APPOINTMENT,
                json!({"customer_name": "Jane Doe", "phone": "555-1234", "service_type": "AC repair"}),
            ))
            .await;
        assert!(result.success);
        assert!(result.message.contains("Appointment request received for Jane Doe"));
        assert_eq!(result.error.as_deref(), Some("CRM not connected"));
    }

    #[tokio::test]
    async fn scheduling_with_crm_down_falls_back_with_error_detail() {
        let executor = executor_with(Some(Arc::new(DownCrm)));
        let result = executor
            .execute(&call(
                SCHEDULE_APPOINTMENT,
                json!({"customer_name": "Jane Doe", "phone": "555-1234", "service_type": "AC repair"}),
            ))
            .await;
        assert!(result.success);
        assert!(result.error.as_deref().unwrap().contains("connection refused"));
        assert!(result.message.contains("Our team will reach out"));
    }

    #[tokio::test]
    async fn scheduling_happy_path_reports_crm_ids() {
        let executor = executor_with(Some(Arc::new(HealthyCrm)));
        let result = executor
            .execute(&call(
                SCHEDULE_APPOINTMENT,
                json!({"customer_name": "Jane Doe", "phone": "555-1234", "service_type": "AC repair"}),
            ))
            .await;
        assert!(result.success);
        assert!(result.error.is_none());
        assert!(result.message.contains("Appointment scheduled for Jane Doe"));
        let data = result.data.unwrap();
        assert_eq!(data["client_id"], json!("client_1"));
        assert_eq!(data["request_id"], json!("req_1"));
    }

    #[tokio::test]
    async fn status_lookup_failure_is_not_masked() {
        let executor = executor_with(Some(Arc::new(DownCrm)));
        let result = executor
            .execute(&call(CHECK_APPOINTMENT_STATUS, json!({"phone": "555-1234"})))
            .await;
        assert!(!result.success);
        assert!(result.message.contains("verify your phone number"));
    }

    #[tokio::test]
    async fn status_happy_path_formats_latest_job() {
        let executor = executor_with(Some(Arc::new(HealthyCrm)));
        let result = executor
            .execute(&call(CHECK_APPOINTMENT_STATUS, json!({"phone": "555-1234"})))
            .await;
        assert!(result.success);
        assert!(result.message.contains("AC repair"));
        assert!(result.message.contains("Monday morning"));
    }

    #[tokio::test]
    async fn callback_degrades_to_local_acknowledgment() {
        let executor = executor_with(Some(Arc::new(DownCrm)));
        let result = executor
            .execute(&call(
                REQUEST_CALLBACK,
                json!({"customer_name": "Jane Doe", "phone": "555-1234", "reason": "quote for new AC"}),
            ))
            .await;
        assert!(result.success);
        assert!(result.message.contains("quote for new AC"));
        assert!(result.error.is_some());
    }

    #[test]
    fn action_parse_tolerates_missing_fields() {
        let parsed = ToolAction::parse(&call(SCHEDULE_APPOINTMENT, json!({})));
        match parsed {
            ToolAction::Schedule(args) => {
                assert!(args.customer_name.is_empty());
                assert!(args.preferred_date.is_none());
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn action_parse_routes_unknown_names_to_fallback_arm() {
        let parsed = ToolAction::parse(&call("reboot_hvac", json!({})));
        assert!(matches!(parsed, ToolAction::Unrecognized { name } if name == "reboot_hvac"));
    }
}
