//! Boolean rule trees over request context, grants and an optional target.
//!
//! A tree is evaluated in one of two scopes. With a target (retrieve, update,
//! delete, nested actions) every predicate sees the object. Without one (list,
//! create) predicates that need an object evaluate to `false`, so a tree
//! degrades to deny unless another branch already decided.
//!
//! ```rust
//! use authgate::permissions::{AuthContext, Evaluation, GrantSet, Rule};
//! use http::Method;
//!
//! let rule: Rule<()> = Rule::or([Rule::safe_method(), Rule::is_admin()]);
//! let ctx = AuthContext::anonymous(Method::GET);
//! let grants = GrantSet::empty();
//! assert!(rule.evaluate(&Evaluation::global(&ctx, &grants)));
//! ```

use std::fmt;
use std::sync::Arc;

use super::context::AuthContext;
use super::grants::GrantSet;

/// Objects that can be named by a grant's `object_id`.
pub trait Identifiable {
    fn object_id(&self) -> String;
}

/// Resolves the object id a scoped grant must carry, from the target.
pub type Locator<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// A custom check over the context and, in object scope, the target.
pub type Check<T> = Arc<dyn Fn(&AuthContext, Option<&T>) -> bool + Send + Sync>;

/// Inputs of one evaluation.
pub struct Evaluation<'a, T> {
    pub context: &'a AuthContext,
    pub grants: &'a GrantSet,
    pub target: Option<&'a T>,
}

impl<'a, T> Evaluation<'a, T> {
    pub fn global(context: &'a AuthContext, grants: &'a GrantSet) -> Self {
        Self {
            context,
            grants,
            target: None,
        }
    }

    pub fn object(context: &'a AuthContext, grants: &'a GrantSet, target: &'a T) -> Self {
        Self {
            context,
            grants,
            target: Some(target),
        }
    }
}

pub enum Predicate<T> {
    /// Principal present and active.
    Authenticated,
    /// GET, HEAD or OPTIONS.
    SafeMethod,
    IsAdmin,
    /// POST.
    MethodIsCreate,
    /// PUT or PATCH.
    MethodIsUpdate,
    MethodIsDelete,
    /// A grant of this type on any object.
    HasGrant(String),
    /// A grant of this type on the object named by `locator(target)`.
    /// Always false without a target.
    HasObjectGrant {
        grant_type: String,
        locator: Locator<T>,
    },
    Attribute {
        name: &'static str,
        check: Check<T>,
    },
}

impl<T> Predicate<T> {
    pub fn evaluate(&self, eval: &Evaluation<'_, T>) -> bool {
        let ctx = eval.context;
        match self {
            Self::Authenticated => ctx.authenticated().is_some(),
            Self::SafeMethod => ctx.is_safe_method(),
            Self::IsAdmin => ctx.authenticated().is_some_and(|p| p.is_admin),
            Self::MethodIsCreate => ctx.is_create(),
            Self::MethodIsUpdate => ctx.is_update(),
            Self::MethodIsDelete => ctx.is_delete(),
            Self::HasGrant(grant_type) => {
                ctx.authenticated().is_some() && eval.grants.has(grant_type, None)
            }
            Self::HasObjectGrant {
                grant_type,
                locator,
            } => match (ctx.authenticated(), eval.target) {
                (Some(_), Some(target)) => {
                    eval.grants.has(grant_type, Some(locator(target).as_str()))
                }
                _ => false,
            },
            Self::Attribute { check, .. } => check(ctx, eval.target),
        }
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Authenticated => Self::Authenticated,
            Self::SafeMethod => Self::SafeMethod,
            Self::IsAdmin => Self::IsAdmin,
            Self::MethodIsCreate => Self::MethodIsCreate,
            Self::MethodIsUpdate => Self::MethodIsUpdate,
            Self::MethodIsDelete => Self::MethodIsDelete,
            Self::HasGrant(grant_type) => Self::HasGrant(grant_type.clone()),
            Self::HasObjectGrant {
                grant_type,
                locator,
            } => Self::HasObjectGrant {
                grant_type: grant_type.clone(),
                locator: Arc::clone(locator),
            },
            Self::Attribute { name, check } => Self::Attribute {
                name: *name,
                check: Arc::clone(check),
            },
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => f.write_str("Authenticated"),
            Self::SafeMethod => f.write_str("SafeMethod"),
            Self::IsAdmin => f.write_str("IsAdmin"),
            Self::MethodIsCreate => f.write_str("MethodIsCreate"),
            Self::MethodIsUpdate => f.write_str("MethodIsUpdate"),
            Self::MethodIsDelete => f.write_str("MethodIsDelete"),
            Self::HasGrant(grant_type) => write!(f, "HasGrant({grant_type})"),
            Self::HasObjectGrant { grant_type, .. } => write!(f, "HasObjectGrant({grant_type})"),
            Self::Attribute { name, .. } => write!(f, "Attribute({name})"),
        }
    }
}

/// A rule tree. Build it once and share it; evaluation never mutates it.
pub enum Rule<T> {
    Leaf(Predicate<T>),
    /// True iff every child is true. Stops at the first false; empty is true.
    And(Vec<Rule<T>>),
    /// True iff any child is true. Stops at the first true; empty is false.
    Or(Vec<Rule<T>>),
    Not(Box<Rule<T>>),
}

impl<T> Rule<T> {
    pub fn authenticated() -> Self {
        Self::Leaf(Predicate::Authenticated)
    }

    pub fn safe_method() -> Self {
        Self::Leaf(Predicate::SafeMethod)
    }

    pub fn is_admin() -> Self {
        Self::Leaf(Predicate::IsAdmin)
    }

    pub fn method_is_create() -> Self {
        Self::Leaf(Predicate::MethodIsCreate)
    }

    pub fn method_is_update() -> Self {
        Self::Leaf(Predicate::MethodIsUpdate)
    }

    pub fn method_is_delete() -> Self {
        Self::Leaf(Predicate::MethodIsDelete)
    }

    pub fn has_grant(grant_type: impl Into<String>) -> Self {
        Self::Leaf(Predicate::HasGrant(grant_type.into()))
    }

    /// Grant scoped to an object derived from the target, e.g. a team's
    /// organization.
    pub fn object_grant_at<F>(grant_type: impl Into<String>, locator: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self::Leaf(Predicate::HasObjectGrant {
            grant_type: grant_type.into(),
            locator: Arc::new(locator),
        })
    }

    pub fn attribute<F>(name: &'static str, check: F) -> Self
    where
        F: Fn(&AuthContext, Option<&T>) -> bool + Send + Sync + 'static,
    {
        Self::Leaf(Predicate::Attribute {
            name,
            check: Arc::new(check),
        })
    }

    pub fn and(rules: impl IntoIterator<Item = Rule<T>>) -> Self {
        Self::And(rules.into_iter().collect())
    }

    pub fn or(rules: impl IntoIterator<Item = Rule<T>>) -> Self {
        Self::Or(rules.into_iter().collect())
    }

    pub fn evaluate(&self, eval: &Evaluation<'_, T>) -> bool {
        match self {
            Self::Leaf(predicate) => predicate.evaluate(eval),
            Self::And(rules) => rules.iter().all(|rule| rule.evaluate(eval)),
            Self::Or(rules) => rules.iter().any(|rule| rule.evaluate(eval)),
            Self::Not(rule) => !rule.evaluate(eval),
        }
    }
}

impl<T: Identifiable + 'static> Rule<T> {
    /// Grant scoped to the target's own id.
    pub fn object_grant(grant_type: impl Into<String>) -> Self {
        Self::object_grant_at(grant_type, |target: &T| target.object_id())
    }
}

impl<T> std::ops::Not for Rule<T> {
    type Output = Rule<T>;

    fn not(self) -> Self::Output {
        Rule::Not(Box::new(self))
    }
}

impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaf(predicate) => Self::Leaf(predicate.clone()),
            Self::And(rules) => Self::And(rules.clone()),
            Self::Or(rules) => Self::Or(rules.clone()),
            Self::Not(rule) => Self::Not(rule.clone()),
        }
    }
}

impl<T> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(predicate) => predicate.fmt(f),
            Self::And(rules) => f.debug_tuple("And").field(rules).finish(),
            Self::Or(rules) => f.debug_tuple("Or").field(rules).finish(),
            Self::Not(rule) => f.debug_tuple("Not").field(rule).finish(),
        }
    }
}
