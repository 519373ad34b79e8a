use async_trait::async_trait;

use crate::AuthError;
use crate::repository::Grant;

/// Source of a user's effective grants.
///
/// Implementations must return only grants attached to teams that contain the
/// user, where neither the team nor its organization is archived. Nothing is
/// cached: each call reflects the store at that moment.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn grants_for(&self, user_id: i64) -> Result<Vec<Grant>, AuthError>;

    /// `object_id = None` matches a grant of that type on any object.
    async fn has_grant(
        &self,
        user_id: i64,
        grant_type: &str,
        object_id: Option<&str>,
    ) -> Result<bool, AuthError> {
        Ok(GrantSet::new(self.grants_for(user_id).await?).has(grant_type, object_id))
    }
}

/// One read of a user's effective grants, held for the duration of a single
/// evaluation.
#[derive(Debug, Clone, Default)]
pub struct GrantSet {
    grants: Vec<Grant>,
}

impl GrantSet {
    pub fn new(grants: Vec<Grant>) -> Self {
        Self { grants }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has(&self, grant_type: &str, object_id: Option<&str>) -> bool {
        self.grants.iter().any(|grant| {
            grant.grant_type == grant_type
                && object_id.is_none_or(|id| grant.object_id.as_deref() == Some(id))
        })
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.grants.iter()
    }
}
