//! The privileged account
//!
//! Every message from a standard user goes to one designated admin. The
//! designation is configuration: it comes from `PRIVILEGED_ACCOUNT_ID`, from
//! the single admin found at startup, or from the first registration. It is
//! held here and shared by the gateway and the account handlers.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::BackendError;

#[derive(Debug, Clone, Default)]
pub struct PrivilegedAccount(Arc<RwLock<Option<Uuid>>>);

impl PrivilegedAccount {
    pub fn new(id: Option<Uuid>) -> Self {
        Self(Arc::new(RwLock::new(id)))
    }

    pub async fn get(&self) -> Option<Uuid> {
        *self.0.read().await
    }

    /// Designate `id` unless an account is already designated
    ///
    /// Returns `true` if `id` became the privileged account.
    pub async fn designate_if_unset(&self, id: Uuid) -> bool {
        let mut slot = self.0.write().await;
        if slot.is_some() {
            return false;
        }
        *slot = Some(id);
        tracing::info!("Designated {} as the privileged account", id);
        true
    }

    pub async fn is(&self, id: Uuid) -> bool {
        self.get().await == Some(id)
    }

    /// The designated account, or a configuration error
    pub async fn require(&self) -> Result<Uuid, BackendError> {
        self.get().await.ok_or_else(|| {
            BackendError::server_configuration(
                "Admin user not found. The system is not configured correctly.",
            )
        })
    }
}
