//! In-process publish/subscribe bus.
//!
//! [`MessageBus`] delivers each publication synchronously to every
//! matching subscriber of the channel, in registration order, before
//! `publish` returns. Channels are types implementing [`Channel`], so a
//! subscriber always receives the payload type its channel declares.
//!
//! A callback that returns an error or panics is logged and skipped; the
//! remaining subscribers still receive the message and the publisher never
//! sees the failure. Publishing from inside a callback is allowed, but
//! unbounded recursive publication is a caller bug and is not detected.

use std::any::{Any, TypeId};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::subscription::{
    ContextId, ErasedCallback, Scope, Subscription, SubscriptionTable, SubscriptionToken,
};
use crate::error::DeskError;

/// A named, typed message channel.
pub trait Channel: 'static {
    /// Payload delivered to subscribers.
    type Payload: Any + Send + Sync;

    /// Channel name used in logs.
    const NAME: &'static str;
}

/// Publish/subscribe bus shared by all components.
///
/// Cheap to clone; clones share the same subscription table. Create one
/// per application and inject it into each component.
#[derive(Clone, Default)]
pub struct MessageBus {
    table: Arc<Mutex<SubscriptionTable>>,
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("table", &*self.table())
            .finish()
    }
}

impl MessageBus {
    /// Creates a bus with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new message context bound to this bus.
    #[must_use]
    pub fn context(&self) -> MessageContext {
        MessageContext {
            bus: self.clone(),
            id: ContextId::new(),
        }
    }

    /// Registers `callback` for channel `C`.
    ///
    /// The subscription receives publications made after this call whose
    /// origin matches `scope`.
    pub fn subscribe<C, F>(&self, scope: Scope, callback: F) -> SubscriptionToken
    where
        C: Channel,
        F: Fn(&C::Payload) -> Result<(), DeskError> + Send + Sync + 'static,
    {
        let erased: ErasedCallback = Arc::new(move |payload: &(dyn Any + Send + Sync)| {
            match payload.downcast_ref::<C::Payload>() {
                Some(payload) => callback(payload),
                None => Err(DeskError::Internal(format!(
                    "payload type mismatch on channel {}",
                    C::NAME
                ))),
            }
        });
        let subscription = Arc::new(Subscription::new(scope, erased));
        let token = SubscriptionToken {
            channel: TypeId::of::<C>(),
            channel_name: C::NAME,
            id: subscription.id,
        };
        self.table().insert(TypeId::of::<C>(), subscription);

        tracing::debug!(channel = C::NAME, subscription = %token.id, ?scope, "subscribed");
        token
    }

    /// Removes a subscription. Unknown or already removed tokens are
    /// ignored.
    ///
    /// Takes effect immediately: a delivery already in progress skips the
    /// removed callback if it has not reached it yet.
    pub fn unsubscribe(&self, token: &SubscriptionToken) {
        if self.table().remove(token) {
            tracing::debug!(channel = token.channel_name, subscription = %token.id, "unsubscribed");
        }
    }

    /// Publishes `payload` on channel `C` to every subscriber.
    ///
    /// Publications made directly on the bus only reach
    /// [`Scope::Global`] subscriptions. Returns the number of callbacks
    /// that completed successfully.
    pub fn publish<C: Channel>(&self, payload: &C::Payload) -> usize {
        self.deliver::<C>(None, payload)
    }

    /// Returns the current number of subscriptions on channel `C`.
    #[must_use]
    pub fn subscriber_count<C: Channel>(&self) -> usize {
        self.table().count(TypeId::of::<C>())
    }

    fn deliver<C: Channel>(&self, origin: Option<ContextId>, payload: &C::Payload) -> usize {
        // Copy the list so callbacks may subscribe, unsubscribe or publish
        // without holding the table lock.
        let subscriptions = self.table().snapshot(TypeId::of::<C>());
        let mut delivered = 0;

        for subscription in subscriptions {
            if !subscription.is_active() || !subscription.scope.matches(origin) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                (subscription.callback)(payload)
            }));
            match isolate::<C>(outcome) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        subscription = %subscription.id,
                        code = err.error_code(),
                        error = %err,
                        "continuing delivery"
                    );
                }
            }
        }

        tracing::trace!(channel = C::NAME, delivered, "published");
        delivered
    }

    fn table(&self) -> MutexGuard<'_, SubscriptionTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A component's handle on the bus.
///
/// Publications made through a context are tagged with its id, so
/// [`Scope::Component`] subscriptions of the same context receive them.
#[derive(Debug, Clone)]
pub struct MessageContext {
    bus: MessageBus,
    id: ContextId,
}

impl MessageContext {
    /// Identity of this context.
    #[must_use]
    pub const fn id(&self) -> ContextId {
        self.id
    }

    /// Scope limited to publications made through this context.
    #[must_use]
    pub const fn local_scope(&self) -> Scope {
        Scope::Component(self.id)
    }

    /// The underlying bus.
    #[must_use]
    pub const fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Registers `callback` for channel `C`; see [`MessageBus::subscribe`].
    pub fn subscribe<C, F>(&self, scope: Scope, callback: F) -> SubscriptionToken
    where
        C: Channel,
        F: Fn(&C::Payload) -> Result<(), DeskError> + Send + Sync + 'static,
    {
        self.bus.subscribe::<C, F>(scope, callback)
    }

    /// Removes a subscription; see [`MessageBus::unsubscribe`].
    pub fn unsubscribe(&self, token: &SubscriptionToken) {
        self.bus.unsubscribe(token);
    }

    /// Publishes `payload` on channel `C`, tagged with this context.
    ///
    /// Reaches global subscriptions and this context's component-scoped
    /// subscriptions. Returns the number of successful deliveries.
    pub fn publish<C: Channel>(&self, payload: &C::Payload) -> usize {
        self.bus.deliver::<C>(Some(self.id), payload)
    }
}

/// Folds a callback's error or panic into [`DeskError::Subscriber`].
fn isolate<C: Channel>(outcome: std::thread::Result<Result<(), DeskError>>) -> Result<(), DeskError> {
    let message = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(err)) => err.to_string(),
        Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
    };
    Err(DeskError::Subscriber {
        channel: C::NAME,
        message,
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
