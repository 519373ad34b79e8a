//! The permission engine.
//!
//! Rules ([`Rule`]) are small boolean trees over the request context, the
//! caller's effective grants ([`GrantSet`]) and, for instance actions, the
//! target object. Each resource type has a [`ResourcePolicy`] holding two such
//! trees; [`Policies`] collects them and [`Authorizer`] puts a grant read in
//! front of the pure [`Policies::decide`].
//!
//! ```rust,ignore
//! let ctx = AuthContext::new(Some(user.principal()), Method::PUT)
//!     .with_body(body.clone());
//!
//! authorizer
//!     .require(&ctx, ResourceKind::Organization, ResourceAction::Update, Some(Target::Organization(&org)))
//!     .await?;
//! ```

mod authorizer;
mod context;
mod decision;
mod grants;
pub mod policies;
mod policy;
mod rule;

pub use authorizer::Authorizer;
pub use context::{AuthContext, Principal};
pub use decision::{Decision, DenyReason, ResourceAction, ResourceKind, Target};
pub use grants::{GrantSet, GrantStore};
pub use policies::{Policies, TeamTarget, grant_types};
pub use policy::ResourcePolicy;
pub use rule::{Check, Evaluation, Identifiable, Locator, Predicate, Rule};
