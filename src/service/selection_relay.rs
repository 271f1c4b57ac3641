//! Selection relay: announces the car picked in the catalog.

use crate::domain::{CarSelection, CarSelectionChannel, MessageContext, RecordId};

/// Publishes car selections on [`CarSelectionChannel`].
///
/// Selections are published immediately, without debouncing.
#[derive(Debug, Clone)]
pub struct SelectionRelay {
    context: MessageContext,
}

impl SelectionRelay {
    /// Creates a relay publishing through `context`.
    #[must_use]
    pub const fn new(context: MessageContext) -> Self {
        Self { context }
    }

    /// Announces that `car_id` was selected. Returns the number of
    /// subscribers that handled the selection.
    pub fn select(&self, car_id: RecordId) -> usize {
        let selection = CarSelection { car_id };
        let delivered = self.context.publish::<CarSelectionChannel>(&selection);
        tracing::info!(car_id = %selection.car_id, delivered, "car selected");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use super::*;
    use crate::domain::{MessageBus, Scope};

    #[test]
    fn selection_reaches_global_subscribers_synchronously() {
        let bus = MessageBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe::<CarSelectionChannel, _>(Scope::Global, move |selection| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(selection.car_id.clone());
            Ok(())
        });

        let relay = SelectionRelay::new(bus.context());
        assert_eq!(relay.select(RecordId::from("C1")), 1);
        assert_eq!(relay.select(RecordId::from("C2")), 1);

        let seen = seen.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(seen, vec![RecordId::from("C1"), RecordId::from("C2")]);
    }

    #[test]
    fn selection_without_subscribers_is_dropped() {
        let relay = SelectionRelay::new(MessageBus::new().context());
        assert_eq!(relay.select(RecordId::from("C1")), 0);
    }
}
