//! External CRM collaborator interface.
//!
//! The pipeline treats the field-service CRM as an opaque, best-effort
//! capability.  Every operation can fail; the tool executor decides per
//! branch whether a failure degrades to a local acknowledgment or to a
//! customer-safe retry message.  Nothing here ever reaches the customer
//! directly.

use async_trait::async_trait;

/// CRM operation failure.  `Api` is an error the CRM itself reported;
/// `Transport` is a network or timeout failure reaching it.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("crm api error: {0}")]
    Api(String),
    #[error("crm transport error: {0}")]
    Transport(String),
}

pub type CrmResult<T> = std::result::Result<T, CrmError>;

/// Handle to a client record in the CRM.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: String,
    pub name: String,
}

/// Handle to a created work/service request.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    pub id: String,
    pub title: String,
}

/// One scheduled job as the CRM reports it.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub status: String,
    /// Human-readable schedule slot, if the CRM has one.
    pub scheduled_for: Option<String>,
}

/// The subset of CRM operations the tool executor needs.
#[async_trait]
pub trait CrmConnector: Send + Sync {
    /// Look up a client by phone, creating one if no match exists.
    async fn find_or_create_client(
        &self,
        name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> CrmResult<ClientHandle>;

    /// Create a work request attached to an existing client.
    async fn create_service_request(
        &self,
        client: &ClientHandle,
        title: &str,
        details: &str,
    ) -> CrmResult<RequestHandle>;

    /// Find a client by phone number.  `Ok(None)` means no match, which is
    /// not an error.
    async fn find_client_by_phone(&self, phone: &str) -> CrmResult<Option<ClientHandle>>;

    /// Fallback lookup by name for customers who gave a different number.
    async fn find_client_by_name(&self, name: &str) -> CrmResult<Option<ClientHandle>>;

    /// Most recent jobs for a client, newest first.
    async fn list_recent_jobs(
        &self,
        client: &ClientHandle,
        limit: usize,
    ) -> CrmResult<Vec<JobSummary>>;
}
