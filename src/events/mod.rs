//! Directory events.
//!
//! Handlers fire an event after every successful mutation, and the
//! [`Authorizer`](crate::Authorizer) fires [`DirectoryEvent::AccessDenied`] on
//! every denial. Without registered listeners dispatch does nothing.
//!
//! ```rust,ignore
//! use authgate::register_event_listeners;
//! use authgate::events::listeners::LoggingListener;
//!
//! register_event_listeners(|registry| {
//!     registry.listen(LoggingListener::new());
//! });
//! ```
//!
//! Custom listeners implement [`Listener`]:
//!
//! ```rust,ignore
//! use authgate::events::{DirectoryEvent, Listener};
//! use async_trait::async_trait;
//!
//! struct DenialCounter;
//!
//! #[async_trait]
//! impl Listener for DenialCounter {
//!     async fn handle(&self, event: &DirectoryEvent) {
//!         if let DirectoryEvent::AccessDenied { resource, .. } = event {
//!             // bump a counter per resource
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::DirectoryEvent;
pub use listener::Listener;
pub use registry::{EventRegistry, dispatch, register_event_listeners};
