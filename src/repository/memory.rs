#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::AuthError;
use crate::permissions::GrantStore;

use super::filter::{ActiveFilter, ArchivedFilter};
use super::grant::{Grant, GrantRepository, NewGrant};
use super::organization::{Organization, OrganizationRepository};
use super::team::{CreateTeam, Team, TeamFilter, TeamRepository};
use super::user::{NewUser, User, UserChanges, UserRepository};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    organizations: Vec<Organization>,
    teams: Vec<Team>,
    grants: Vec<Grant>,
    /// (organization_id, user_id)
    organization_users: BTreeSet<(i64, i64)>,
    /// (team_id, user_id)
    team_users: BTreeSet<(i64, i64)>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn organization(&self, id: i64) -> Option<&Organization> {
        self.organizations.iter().find(|o| o.id == id)
    }

    fn team(&self, id: i64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    fn members(&self, pairs: &BTreeSet<(i64, i64)>, owner_id: i64) -> Vec<User> {
        pairs
            .iter()
            .filter(|(owner, _)| *owner == owner_id)
            .filter_map(|(_, user_id)| self.user(*user_id).cloned())
            .collect()
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, AuthError> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::UserAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: self.next_id(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            hashed_password: user.hashed_password,
            is_admin: user.is_admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn insert_organization(&mut self, title: &str) -> Organization {
        let now = Utc::now();
        let organization = Organization {
            id: self.next_id(),
            title: title.to_owned(),
            archived: false,
            created_at: now,
            updated_at: now,
        };
        self.organizations.push(organization.clone());
        organization
    }

    fn insert_team(&mut self, team: CreateTeam) -> Result<Team, AuthError> {
        if self.organization(team.organization_id).is_none() {
            return Err(AuthError::NotFound);
        }
        let now = Utc::now();
        let team = Team {
            id: self.next_id(),
            title: team.title,
            organization_id: team.organization_id,
            archived: false,
            created_at: now,
            updated_at: now,
        };
        self.teams.push(team.clone());
        Ok(team)
    }

    fn insert_grant(&mut self, team_id: i64, grant: NewGrant) -> Result<Grant, AuthError> {
        if self.team(team_id).is_none() {
            return Err(AuthError::NotFound);
        }
        let grant = Grant {
            id: self.next_id(),
            team_id,
            grant_type: grant.grant_type,
            object_id: grant.object_id,
            namespace: grant.namespace,
            created_at: Utc::now(),
        };
        self.grants.push(grant.clone());
        Ok(grant)
    }
}

/// In-memory directory backing every repository trait and [`GrantStore`].
///
/// Clones share the same tables, so a test can keep a handle while the
/// router owns another.
#[derive(Clone, Default)]
pub struct MockDirectory {
    tables: Arc<RwLock<Tables>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active user with an unusable password hash.
    pub fn seed_user(&self, email: &str, is_admin: bool) -> User {
        self.tables
            .write()
            .unwrap()
            .insert_user(NewUser {
                email: email.to_owned(),
                hashed_password: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                is_admin,
            })
            .unwrap()
    }

    pub fn seed_organization(&self, title: &str) -> Organization {
        self.tables.write().unwrap().insert_organization(title)
    }

    /// # Panics
    ///
    /// When the organization does not exist.
    pub fn seed_team(&self, organization_id: i64, title: &str) -> Team {
        self.tables
            .write()
            .unwrap()
            .insert_team(CreateTeam {
                title: title.to_owned(),
                organization_id,
            })
            .unwrap()
    }

    pub fn seed_team_user(&self, team_id: i64, user_id: i64) {
        self.tables
            .write()
            .unwrap()
            .team_users
            .insert((team_id, user_id));
    }

    pub fn seed_organization_user(&self, organization_id: i64, user_id: i64) {
        self.tables
            .write()
            .unwrap()
            .organization_users
            .insert((organization_id, user_id));
    }

    /// # Panics
    ///
    /// When the team does not exist.
    pub fn seed_grant(&self, team_id: i64, grant: NewGrant) -> Grant {
        self.tables
            .write()
            .unwrap()
            .insert_grant(team_id, grant)
            .unwrap()
    }
}

#[async_trait]
impl UserRepository for MockDirectory {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        Ok(self.tables.read().unwrap().user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, filter: ActiveFilter) -> Result<Vec<User>, AuthError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .users
            .iter()
            .filter(|u| filter.matches(u.is_active))
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AuthError> {
        self.tables.write().unwrap().insert_user(user)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User, AuthError> {
        let mut tables = self.tables.write().unwrap();

        if let Some(email) = &changes.email {
            if tables.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(AuthError::UserAlreadyExists);
            }
        }

        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AuthError::NotFound)?;

        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(hashed_password) = changes.hashed_password {
            user.hashed_password = hashed_password;
        }
        if let Some(is_admin) = changes.is_admin {
            user.is_admin = is_admin;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn deactivate_user(&self, id: i64) -> Result<(), AuthError> {
        self.update_user(
            id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .map(|_| ())
    }

    async fn teams_for_user(&self, user_id: i64) -> Result<Vec<Team>, AuthError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .team_users
            .iter()
            .filter(|(_, member)| *member == user_id)
            .filter_map(|(team_id, _)| tables.team(*team_id))
            .filter(|t| !t.archived)
            .cloned()
            .collect())
    }

    async fn organizations_for_user(&self, user_id: i64) -> Result<Vec<Organization>, AuthError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .organization_users
            .iter()
            .filter(|(_, member)| *member == user_id)
            .filter_map(|(organization_id, _)| tables.organization(*organization_id))
            .filter(|o| !o.archived)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrganizationRepository for MockDirectory {
    async fn find_organization(&self, id: i64) -> Result<Option<Organization>, AuthError> {
        Ok(self.tables.read().unwrap().organization(id).cloned())
    }

    async fn list_organizations(
        &self,
        filter: ArchivedFilter,
    ) -> Result<Vec<Organization>, AuthError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .organizations
            .iter()
            .filter(|o| filter.matches(o.archived))
            .cloned()
            .collect())
    }

    async fn create_organization(&self, title: &str) -> Result<Organization, AuthError> {
        Ok(self.tables.write().unwrap().insert_organization(title))
    }

    async fn update_organization(&self, id: i64, title: &str) -> Result<Organization, AuthError> {
        let mut tables = self.tables.write().unwrap();
        let organization = tables
            .organizations
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(AuthError::NotFound)?;
        title.clone_into(&mut organization.title);
        organization.updated_at = Utc::now();
        Ok(organization.clone())
    }

    async fn archive_organization(&self, id: i64) -> Result<(), AuthError> {
        let mut tables = self.tables.write().unwrap();
        let organization = tables
            .organizations
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(AuthError::NotFound)?;
        organization.archived = true;
        organization.updated_at = Utc::now();
        Ok(())
    }

    async fn add_organization_user(
        &self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<(), AuthError> {
        self.seed_organization_user(organization_id, user_id);
        Ok(())
    }

    async fn remove_organization_user(
        &self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<(), AuthError> {
        self.tables
            .write()
            .unwrap()
            .organization_users
            .remove(&(organization_id, user_id));
        Ok(())
    }

    async fn organization_members(&self, organization_id: i64) -> Result<Vec<User>, AuthError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.members(&tables.organization_users, organization_id))
    }
}

#[async_trait]
impl TeamRepository for MockDirectory {
    async fn find_team(&self, id: i64) -> Result<Option<Team>, AuthError> {
        Ok(self.tables.read().unwrap().team(id).cloned())
    }

    async fn list_teams(&self, filter: &TeamFilter) -> Result<Vec<Team>, AuthError> {
        let tables = self.tables.read().unwrap();
        let grant_filter = filter.permission_contains.is_some() || filter.object_id.is_some();

        Ok(tables
            .teams
            .iter()
            .filter(|t| filter.archived.matches(t.archived))
            .filter(|t| filter.organization_id.is_none_or(|id| t.organization_id == id))
            .filter(|t| {
                !grant_filter
                    || tables.grants.iter().any(|g| {
                        g.team_id == t.id
                            && filter
                                .permission_contains
                                .as_deref()
                                .is_none_or(|needle| g.grant_type.contains(needle))
                            && filter
                                .object_id
                                .as_deref()
                                .is_none_or(|id| g.object_id.as_deref() == Some(id))
                    })
            })
            .cloned()
            .collect())
    }

    async fn create_team(&self, team: CreateTeam) -> Result<Team, AuthError> {
        self.tables.write().unwrap().insert_team(team)
    }

    async fn update_team(&self, id: i64, title: &str) -> Result<Team, AuthError> {
        let mut tables = self.tables.write().unwrap();
        let team = tables
            .teams
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AuthError::NotFound)?;
        title.clone_into(&mut team.title);
        team.updated_at = Utc::now();
        Ok(team.clone())
    }

    async fn archive_team(&self, id: i64) -> Result<(), AuthError> {
        let mut tables = self.tables.write().unwrap();
        let team = tables
            .teams
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AuthError::NotFound)?;
        team.archived = true;
        team.updated_at = Utc::now();
        Ok(())
    }

    async fn add_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AuthError> {
        self.seed_team_user(team_id, user_id);
        Ok(())
    }

    async fn remove_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AuthError> {
        self.tables
            .write()
            .unwrap()
            .team_users
            .remove(&(team_id, user_id));
        Ok(())
    }

    async fn team_members(&self, team_id: i64) -> Result<Vec<User>, AuthError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.members(&tables.team_users, team_id))
    }
}

#[async_trait]
impl GrantRepository for MockDirectory {
    async fn team_grants(&self, team_id: i64) -> Result<Vec<Grant>, AuthError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .grants
            .iter()
            .filter(|g| g.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn add_team_grant(&self, team_id: i64, grant: NewGrant) -> Result<Grant, AuthError> {
        self.tables.write().unwrap().insert_grant(team_id, grant)
    }

    async fn remove_team_grant(&self, team_id: i64, grant_id: i64) -> Result<(), AuthError> {
        let mut tables = self.tables.write().unwrap();
        let before = tables.grants.len();
        tables
            .grants
            .retain(|g| !(g.id == grant_id && g.team_id == team_id));
        if tables.grants.len() == before {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl GrantStore for MockDirectory {
    async fn grants_for(&self, user_id: i64) -> Result<Vec<Grant>, AuthError> {
        let tables = self.tables.read().unwrap();
        let active_teams: BTreeSet<i64> = tables
            .team_users
            .iter()
            .filter(|(_, member)| *member == user_id)
            .filter_map(|(team_id, _)| tables.team(*team_id))
            .filter(|team| {
                !team.archived
                    && tables
                        .organization(team.organization_id)
                        .is_some_and(|org| !org.archived)
            })
            .map(|team| team.id)
            .collect();

        Ok(tables
            .grants
            .iter()
            .filter(|g| active_teams.contains(&g.team_id))
            .cloned()
            .collect())
    }
}
