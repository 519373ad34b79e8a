use std::collections::BTreeMap;

use http::Method;
use serde_json::Value;

/// The authenticated caller as seen by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub is_admin: bool,
    pub is_active: bool,
}

/// Everything a rule may look at about the request, fixed before evaluation
/// starts and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AuthContext {
    principal: Option<Principal>,
    method: Method,
    query: BTreeMap<String, String>,
    body: Option<Value>,
}

impl AuthContext {
    pub fn new(principal: Option<Principal>, method: Method) -> Self {
        Self {
            principal,
            method,
            query: BTreeMap::new(),
            body: None,
        }
    }

    pub fn anonymous(method: Method) -> Self {
        Self::new(None, method)
    }

    #[must_use]
    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The principal, whether or not it is active.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// The principal, only if it is active.
    pub fn authenticated(&self) -> Option<&Principal> {
        self.principal.as_ref().filter(|p| p.is_active)
    }

    pub fn principal_id(&self) -> Option<i64> {
        self.authenticated().map(|p| p.id)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// True only when the body is an object whose `key` is JSON `true`.
    pub fn body_flag(&self, key: &str) -> bool {
        self.body
            .as_ref()
            .and_then(|body| body.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn is_safe_method(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    pub fn is_create(&self) -> bool {
        self.method == Method::POST
    }

    pub fn is_update(&self) -> bool {
        matches!(self.method, Method::PUT | Method::PATCH)
    }

    pub fn is_delete(&self) -> bool {
        self.method == Method::DELETE
    }
}
