//! Access-control collaborator. Out of scope per `spec.md` §1/§6: "consulted
//! once per request before any outbound I/O; a deny short-circuits with a
//! 403-class response." No concrete IdP/ACL service is specified, so this
//! module carries the interface and a permissive stub implementation.

use async_trait::async_trait;

use crate::client::Credential;

#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn check(&self, credential: &Credential) -> anyhow::Result<Decision>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Allows every request. A real deployment would swap this for a client to
/// the platform's ACL service; `spec.md` names the collaborator but does
/// not specify its behavior.
pub struct AllowAll;

#[async_trait]
impl AccessControl for AllowAll {
    async fn check(&self, _credential: &Credential) -> anyhow::Result<Decision> {
        Ok(Decision::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allow_all_always_allows() {
        let ac = AllowAll;
        assert_eq!(ac.check(&Credential::none()).await.unwrap(), Decision::Allow);
    }
}
