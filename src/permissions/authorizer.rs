use std::sync::Arc;

use chrono::Utc;

use crate::AuthError;
use crate::events::{DirectoryEvent, dispatch};

use super::context::AuthContext;
use super::decision::{Decision, DenyReason, ResourceAction, ResourceKind, Target};
use super::grants::{GrantSet, GrantStore};
use super::policies::Policies;

/// The gate in front of every handler: resolves the policy, reads the
/// caller's grants fresh and evaluates.
pub struct Authorizer<G> {
    store: G,
    policies: Arc<Policies>,
}

impl<G: Clone> Clone for Authorizer<G> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            policies: Arc::clone(&self.policies),
        }
    }
}

impl<G: GrantStore> Authorizer<G> {
    pub fn new(store: G) -> Self {
        Self::with_policies(store, Arc::new(Policies::default()))
    }

    pub fn with_policies(store: G, policies: Arc<Policies>) -> Self {
        Self { store, policies }
    }

    pub fn policies(&self) -> &Policies {
        &self.policies
    }

    /// Effective grants of the caller; empty when unauthenticated.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the grant store.
    pub async fn grants_for(&self, context: &AuthContext) -> Result<GrantSet, AuthError> {
        match context.authenticated() {
            Some(principal) => Ok(GrantSet::new(self.store.grants_for(principal.id).await?)),
            None => Ok(GrantSet::empty()),
        }
    }

    /// # Errors
    ///
    /// Only when the grant store read fails. A denial is `Ok(Decision::Deny(_))`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "authorize",
            skip_all,
            fields(resource = %resource, action = %action),
            err
        )
    )]
    pub async fn authorize(
        &self,
        context: &AuthContext,
        resource: ResourceKind,
        action: ResourceAction,
        target: Option<Target<'_>>,
    ) -> Result<Decision, AuthError> {
        let decision = if context.authenticated().is_none() {
            Decision::Deny(DenyReason::Unauthenticated)
        } else {
            let grants = self.grants_for(context).await?;
            self.policies
                .decide(context, &grants, resource, action, target)
        };

        if let Decision::Deny(reason) = decision {
            let user_id = context.principal().map(|p| p.id);
            log::info!(
                target: "authgate",
                "msg=\"access denied\", resource={resource}, action={action}, reason={reason:?}, user_id={user_id:?}"
            );
            dispatch(DirectoryEvent::AccessDenied {
                user_id,
                resource,
                action,
                reason,
                at: Utc::now(),
            })
            .await;
        }

        Ok(decision)
    }

    /// [`authorize`](Self::authorize), with a denial turned into the matching
    /// `AuthError`.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `Forbidden`, or a storage error.
    pub async fn require(
        &self,
        context: &AuthContext,
        resource: ResourceKind,
        action: ResourceAction,
        target: Option<Target<'_>>,
    ) -> Result<(), AuthError> {
        self.authorize(context, resource, action, target)
            .await?
            .into_result()
    }
}
