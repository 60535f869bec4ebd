//! Authentication session
//!
//! Holds the signed-in user (if any) and broadcasts changes over a watch
//! channel so interactive frontends can react to sign-in and sign-out.
//! The actual credential exchange is delegated to the backend.

use tokio::sync::watch;
use tracing::info;

use crate::backend::{Backend, BackendResult};
use crate::models::User;

/// Observable sign-in state
pub struct AuthSession {
    current: watch::Sender<Option<User>>,
}

impl AuthSession {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    /// Subscribe to sign-in state changes
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    /// Whether the signed-in user has admin rights
    ///
    /// Signed-out sessions are never admin.
    pub fn is_admin(&self) -> bool {
        self.current
            .borrow()
            .as_ref()
            .map(|u| u.is_admin)
            .unwrap_or(false)
    }

    /// Sign in against the backend and record the session
    pub async fn sign_in(
        &self,
        backend: &Backend,
        email: &str,
        password: &str,
    ) -> BackendResult<User> {
        let user = backend.sign_in(email, password).await?;
        info!("Signed in as {}", user.email);
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Create an account and sign in as it
    pub async fn sign_up(
        &self,
        backend: &Backend,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> BackendResult<User> {
        let user = backend.sign_up(email, password, display_name).await?;
        info!("Created account for {}", user.email);
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Sign out and clear the session
    ///
    /// The local session is cleared even if the backend call fails, so a
    /// dead network can't pin the user to a stale identity.
    pub async fn sign_out(&self, backend: &Backend) -> BackendResult<()> {
        let result = backend.sign_out().await;
        self.current.send_replace(None);
        info!("Signed out");
        result
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn backend_with_user(is_admin: bool) -> Backend {
        let memory = MemoryBackend::new();
        memory.add_user(
            "reader@example.com",
            "hunter2",
            User {
                email: "reader@example.com".to_string(),
                display_name: None,
                is_admin,
            },
        );
        Backend::Memory(memory)
    }

    #[tokio::test]
    async fn test_sign_in_updates_session() {
        let backend = backend_with_user(false);
        let session = AuthSession::new();
        let mut changes = session.subscribe();

        assert!(session.current_user().is_none());

        let user = session
            .sign_in(&backend, "reader@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(user.email, "reader@example.com");
        assert!(!session.is_admin());

        assert!(changes.has_changed().unwrap());
        assert_eq!(
            changes.borrow_and_update().as_ref().map(|u| u.email.clone()),
            Some("reader@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_bad_password_leaves_session_signed_out() {
        let backend = backend_with_user(false);
        let session = AuthSession::new();

        let result = session
            .sign_in(&backend, "reader@example.com", "wrong")
            .await;
        assert!(result.is_err());
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_admin_flag_follows_user() {
        let backend = backend_with_user(true);
        let session = AuthSession::new();

        session
            .sign_in(&backend, "reader@example.com", "hunter2")
            .await
            .unwrap();
        assert!(session.is_admin());

        session.sign_out(&backend).await.unwrap();
        assert!(!session.is_admin());
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_signs_in() {
        let backend = Backend::Memory(MemoryBackend::new());
        let session = AuthSession::new();

        let user = session
            .sign_up(&backend, "new@example.com", "pw", Some("New Reader"))
            .await
            .unwrap();
        assert_eq!(user.display_name.as_deref(), Some("New Reader"));
        assert!(session.current_user().is_some());
    }
}
