use super::context::AuthContext;
use super::grants::GrantSet;
use super::rule::{Evaluation, Rule};

/// The pair of trees guarding one resource type: `global` for collection
/// actions (no target), `object` for actions on one instance.
#[derive(Debug, Clone)]
pub struct ResourcePolicy<T> {
    global: Rule<T>,
    object: Rule<T>,
}

impl<T> ResourcePolicy<T> {
    /// `global` becomes `And(Authenticated, object)`.
    pub fn new(object: Rule<T>) -> Self {
        Self {
            global: Rule::and([Rule::authenticated(), object.clone()]),
            object,
        }
    }

    pub fn with_global(global: Rule<T>, object: Rule<T>) -> Self {
        Self { global, object }
    }

    pub fn global(&self) -> &Rule<T> {
        &self.global
    }

    pub fn object(&self) -> &Rule<T> {
        &self.object
    }

    pub fn allows_collection(&self, context: &AuthContext, grants: &GrantSet) -> bool {
        self.global.evaluate(&Evaluation::global(context, grants))
    }

    pub fn allows_object(&self, context: &AuthContext, grants: &GrantSet, target: &T) -> bool {
        self.object
            .evaluate(&Evaluation::object(context, grants, target))
    }
}
