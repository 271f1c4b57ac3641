//! Subscription table of the message bus.
//!
//! Tracks, per channel, the ordered list of subscriptions and their
//! delivery scope. Only [`super::MessageBus`] mutates the table.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::error::DeskError;

/// Type-erased subscriber callback. The typed wrapper built by
/// [`super::MessageBus::subscribe`] downcasts the payload back.
pub(crate) type ErasedCallback =
    Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), DeskError> + Send + Sync>;

/// Identity of a message context (one per component instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContextId(uuid::Uuid);

impl ContextId {
    /// Creates a new random context id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery breadth of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Receives every publication on the channel, wherever it came from.
    Global,
    /// Receives only publications made through the given context.
    Component(ContextId),
}

impl Scope {
    /// Returns `true` if a publication from `origin` reaches this scope.
    /// `None` means the publication was made on the bus directly.
    #[must_use]
    pub fn matches(&self, origin: Option<ContextId>) -> bool {
        match self {
            Self::Global => true,
            Self::Component(id) => origin == Some(*id),
        }
    }
}

/// Opaque handle returned by `subscribe`, used only to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionToken {
    pub(crate) channel: TypeId,
    pub(crate) channel_name: &'static str,
    pub(crate) id: uuid::Uuid,
}

impl SubscriptionToken {
    /// Name of the channel the subscription was made on.
    #[must_use]
    pub const fn channel_name(&self) -> &'static str {
        self.channel_name
    }
}

/// One registered callback.
pub(crate) struct Subscription {
    pub(crate) id: uuid::Uuid,
    pub(crate) scope: Scope,
    active: AtomicBool,
    pub(crate) callback: ErasedCallback,
}

impl Subscription {
    pub(crate) fn new(scope: Scope, callback: ErasedCallback) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            scope,
            active: AtomicBool::new(true),
            callback,
        }
    }

    /// `false` once unsubscribed, even if a delivery already holds it.
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Channel → ordered subscriptions.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionTable {
    channels: HashMap<TypeId, Vec<Arc<Subscription>>>,
}

impl SubscriptionTable {
    /// Appends a subscription to the channel's list.
    pub(crate) fn insert(&mut self, channel: TypeId, subscription: Arc<Subscription>) {
        self.channels.entry(channel).or_default().push(subscription);
    }

    /// Removes the subscription behind `token`. Unknown tokens are ignored.
    /// Returns `true` if something was removed.
    pub(crate) fn remove(&mut self, token: &SubscriptionToken) -> bool {
        let Some(list) = self.channels.get_mut(&token.channel) else {
            return false;
        };
        let Some(pos) = list.iter().position(|s| s.id == token.id) else {
            return false;
        };
        let removed = list.remove(pos);
        removed.deactivate();
        if list.is_empty() {
            self.channels.remove(&token.channel);
        }
        true
    }

    /// Current subscriptions of a channel, in registration order.
    pub(crate) fn snapshot(&self, channel: TypeId) -> Vec<Arc<Subscription>> {
        self.channels.get(&channel).cloned().unwrap_or_default()
    }

    /// Number of subscriptions on a channel.
    pub(crate) fn count(&self, channel: TypeId) -> usize {
        self.channels.get(&channel).map_or(0, Vec::len)
    }
}
