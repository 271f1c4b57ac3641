//! Catalog binding: keeps the car list in step with the published filter.
//!
//! The binding stores the latest [`FilterSnapshot`] received on
//! [`CarFilterChannel`] and re-runs the catalog query whenever it changes.
//! Results replace the previous list wholesale and are exposed through a
//! [`tokio::sync::watch`] channel, so views observe each state exactly
//! once in order. The previous page stays visible while a re-query is in
//! flight; a failed query clears it.
//!
//! Queries can complete out of order. Every query is tagged with a
//! generation number; a result whose generation is no longer current is
//! discarded, so the list always reflects the most recent filter.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::collaborators::CarQuery;
use crate::domain::{
    CarFilterChannel, CarSummary, CatalogPage, FilterSnapshot, MessageBus, Scope,
    SubscriptionToken,
};
use crate::error::DeskError;

/// Progress of the catalog query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    /// Nothing requested yet.
    Idle,
    /// A query is in flight.
    Loading,
    /// The most recent query succeeded.
    Loaded,
    /// The most recent query failed; carries the user-facing message.
    Failed(String),
}

/// Observable state of the catalog list.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogState {
    /// Latest filter received, `None` until the first publication.
    pub filters: Option<FilterSnapshot>,
    /// Progress of the query for [`Self::filters`].
    pub query: QueryState,
    /// Page of the latest successful query still current.
    pub page: Option<CatalogPage>,
    /// Generation of the most recent query.
    pub generation: u64,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            filters: None,
            query: QueryState::Idle,
            page: None,
            generation: 0,
        }
    }
}

impl CatalogState {
    /// Cars of the latest result, kept while a newer query is loading.
    #[must_use]
    pub fn cars(&self) -> &[CarSummary] {
        self.page.as_ref().map_or(&[], |page| page.cars.as_slice())
    }

    /// Returns `true` if the latest result holds at least one car.
    #[must_use]
    pub fn has_results(&self) -> bool {
        !self.cars().is_empty()
    }

    /// Returns `true` while no filter has been received.
    #[must_use]
    pub const fn awaiting_filters(&self) -> bool {
        self.filters.is_none()
    }
}

/// Binds the catalog query to the filter channel.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct CatalogBinding {
    query: Arc<dyn CarQuery>,
    state: Arc<watch::Sender<CatalogState>>,
    subscription: Arc<Mutex<Option<SubscriptionToken>>>,
}

impl CatalogBinding {
    /// Creates a disconnected binding over `query`.
    #[must_use]
    pub fn new(query: Arc<dyn CarQuery>) -> Self {
        let (state, _) = watch::channel(CatalogState::default());
        Self {
            query,
            state: Arc::new(state),
            subscription: Arc::new(Mutex::new(None)),
        }
    }

    /// Subscribes to [`CarFilterChannel`] and runs the initial unfiltered
    /// query. Connecting twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Internal`] if no tokio runtime is available
    /// for the initial query.
    pub fn connect(&self, bus: &MessageBus) -> Result<(), DeskError> {
        {
            let mut subscription = self.lock_subscription();
            if subscription.is_some() {
                return Ok(());
            }
            let binding = self.clone();
            let token = bus.subscribe::<CarFilterChannel, _>(Scope::Global, move |snapshot| {
                binding.set_filters(snapshot.clone())
            });
            *subscription = Some(token);
        }
        tracing::debug!("catalog binding connected");
        self.refresh()
    }

    /// Removes the filter subscription. Queries still in flight complete
    /// but no new filter is picked up.
    pub fn disconnect(&self, bus: &MessageBus) {
        if let Some(token) = self.lock_subscription().take() {
            bus.unsubscribe(&token);
            tracing::debug!("catalog binding disconnected");
        }
    }

    /// Returns `true` while subscribed to the filter channel.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.lock_subscription().is_some()
    }

    /// Stores `snapshot` and re-runs the query for it.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Internal`] if no tokio runtime is available.
    pub fn set_filters(&self, snapshot: FilterSnapshot) -> Result<(), DeskError> {
        tracing::debug!(sequence = snapshot.sequence, "filters received");
        let filters = snapshot.clone();
        let generation = self.begin_query(move |state| state.filters = Some(snapshot));
        self.spawn_query(generation, Some(filters))
    }

    /// Re-runs the query for the current filters.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Internal`] if no tokio runtime is available.
    pub fn refresh(&self) -> Result<(), DeskError> {
        let generation = self.begin_query(|_| {});
        let filters = self.state.borrow().filters.clone();
        self.spawn_query(generation, filters)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn state(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    /// Latest filter received.
    #[must_use]
    pub fn filters(&self) -> Option<FilterSnapshot> {
        self.state.borrow().filters.clone()
    }

    /// See [`CatalogState::has_results`].
    #[must_use]
    pub fn has_results(&self) -> bool {
        self.state.borrow().has_results()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    fn begin_query<F>(&self, update: F) -> u64
    where
        F: FnOnce(&mut CatalogState),
    {
        let mut generation = 0;
        self.state.send_modify(|state| {
            update(state);
            state.generation += 1;
            state.query = QueryState::Loading;
            generation = state.generation;
        });
        generation
    }

    fn spawn_query(&self, generation: u64, filters: Option<FilterSnapshot>) -> Result<(), DeskError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            DeskError::Internal("catalog query requires a tokio runtime".to_string())
        })?;
        let query = Arc::clone(&self.query);
        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            let result = query.list_cars(filters.as_ref()).await;
            complete(&state, generation, result);
        });
        Ok(())
    }

    fn lock_subscription(&self) -> std::sync::MutexGuard<'_, Option<SubscriptionToken>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn complete(
    state: &watch::Sender<CatalogState>,
    generation: u64,
    result: Result<CatalogPage, DeskError>,
) {
    state.send_if_modified(|state| {
        if state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "discarding stale catalog result"
            );
            return false;
        }
        match result {
            Ok(page) => {
                tracing::debug!(generation, cars = page.len(), "catalog loaded");
                state.query = QueryState::Loaded;
                state.page = Some(page);
            }
            Err(err) => {
                tracing::warn!(generation, error = %err, "catalog query failed");
                state.query = QueryState::Failed(err.user_message());
                state.page = None;
            }
        }
        true
    });
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{CatalogPage, FilterCriteria, RecordId};

    /// Query answering with one car named after the search key, after a
    /// delay chosen per search key.
    #[derive(Debug, Default)]
    struct ScriptedQuery {
        calls: Mutex<Vec<Option<u64>>>,
    }

    impl ScriptedQuery {
        fn calls(&self) -> Vec<Option<u64>> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    fn car(name: &str) -> CarSummary {
        CarSummary {
            id: RecordId::from(name),
            name: name.to_string(),
            picture_url: None,
            rental_rate_per_day: 40.0,
            transmission: None,
            fuel_type: None,
            seats: 4,
            average_rating: None,
        }
    }

    #[async_trait]
    impl CarQuery for ScriptedQuery {
        async fn list_cars(&self, filter: Option<&FilterSnapshot>) -> Result<CatalogPage, DeskError> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(filter.map(|f| f.sequence));
            let key = filter.map_or("all", |f| f.criteria.search_key.as_str());
            match key {
                "slow" => tokio::time::sleep(Duration::from_millis(500)).await,
                "fast" => tokio::time::sleep(Duration::from_millis(100)).await,
                "broken" => return Err(DeskError::Query("query timed out".to_string())),
                "none" => return Ok(CatalogPage::new(Vec::new())),
                _ => {}
            }
            Ok(CatalogPage::new(vec![car(key)]))
        }
    }

    fn snapshot(sequence: u64, search_key: &str) -> FilterSnapshot {
        let criteria = FilterCriteria {
            search_key: search_key.to_string(),
            ..FilterCriteria::default()
        };
        FilterSnapshot::capture(sequence, &criteria)
    }

    fn names(state: &CatalogState) -> Vec<String> {
        state.cars().iter().map(|c| c.name.clone()).collect()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1_000)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn connect_runs_initial_unfiltered_query() {
        let query = Arc::new(ScriptedQuery::default());
        let binding = CatalogBinding::new(Arc::clone(&query) as Arc<dyn CarQuery>);
        let bus = MessageBus::new();
        assert!(binding.connect(&bus).is_ok());
        assert!(binding.connect(&bus).is_ok());
        assert_eq!(bus.subscriber_count::<CarFilterChannel>(), 1);

        settle().await;
        let state = binding.state();
        assert!(state.awaiting_filters());
        assert_eq!(names(&state), vec!["all"]);
        assert_eq!(query.calls(), vec![None]);
    }

    #[tokio::test(start_paused = true)]
    async fn published_filter_triggers_requery() {
        let query = Arc::new(ScriptedQuery::default());
        let binding = CatalogBinding::new(Arc::clone(&query) as Arc<dyn CarQuery>);
        let bus = MessageBus::new();
        assert!(binding.connect(&bus).is_ok());

        assert_eq!(bus.publish::<CarFilterChannel>(&snapshot(1, "swift")), 1);
        settle().await;

        let state = binding.state();
        assert_eq!(state.filters.as_ref().map(|f| f.sequence), Some(1));
        assert_eq!(names(&state), vec!["swift"]);
        assert_eq!(query.calls(), vec![None, Some(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn late_result_of_older_filter_is_discarded() {
        let binding = CatalogBinding::new(Arc::new(ScriptedQuery::default()));
        let bus = MessageBus::new();
        assert!(binding.connect(&bus).is_ok());

        bus.publish::<CarFilterChannel>(&snapshot(1, "slow"));
        bus.publish::<CarFilterChannel>(&snapshot(2, "fast"));
        settle().await;

        let state = binding.state();
        assert_eq!(state.filters.as_ref().map(|f| f.sequence), Some(2));
        assert_eq!(names(&state), vec!["fast"]);
    }

    #[tokio::test(start_paused = true)]
    async fn watchers_see_loading_then_loaded() {
        let binding = CatalogBinding::new(Arc::new(ScriptedQuery::default()));
        let mut rx = binding.watch();
        assert!(binding.set_filters(snapshot(1, "fast")).is_ok());
        assert!(rx.borrow_and_update().query == QueryState::Loading);

        let Ok(loaded) = rx.wait_for(|s| s.query == QueryState::Loaded).await else {
            panic!("binding dropped");
        };
        assert_eq!(names(&loaded), vec!["fast"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_query_is_reported_without_results() {
        let binding = CatalogBinding::new(Arc::new(ScriptedQuery::default()));
        assert!(binding.set_filters(snapshot(1, "broken")).is_ok());
        settle().await;

        let state = binding.state();
        assert_eq!(state.query, QueryState::Failed("query timed out".to_string()));
        assert!(!binding.has_results());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_result_has_no_results() {
        let binding = CatalogBinding::new(Arc::new(ScriptedQuery::default()));
        assert!(binding.set_filters(snapshot(1, "none")).is_ok());
        settle().await;
        assert_eq!(binding.state().query, QueryState::Loaded);
        assert!(!binding.has_results());
    }

    #[tokio::test(start_paused = true)]
    async fn previous_results_stay_while_requery_is_pending() {
        let binding = CatalogBinding::new(Arc::new(ScriptedQuery::default()));
        assert!(binding.set_filters(snapshot(1, "swift")).is_ok());
        settle().await;
        assert!(binding.has_results());

        assert!(binding.set_filters(snapshot(2, "slow")).is_ok());
        tokio::time::sleep(Duration::from_millis(50)).await;
        let pending = binding.state();
        assert_eq!(pending.query, QueryState::Loading);
        assert!(pending.has_results());
        assert_eq!(names(&pending), vec!["swift"]);

        settle().await;
        assert_eq!(names(&binding.state()), vec!["slow"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_requery_clears_previous_results() {
        let binding = CatalogBinding::new(Arc::new(ScriptedQuery::default()));
        assert!(binding.set_filters(snapshot(1, "swift")).is_ok());
        settle().await;
        assert!(binding.has_results());

        assert!(binding.set_filters(snapshot(2, "broken")).is_ok());
        settle().await;
        assert!(!binding.has_results());
        assert!(binding.state().cars().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnected_binding_ignores_filters() {
        let query = Arc::new(ScriptedQuery::default());
        let binding = CatalogBinding::new(Arc::clone(&query) as Arc<dyn CarQuery>);
        let bus = MessageBus::new();
        assert!(binding.connect(&bus).is_ok());
        binding.disconnect(&bus);
        assert!(!binding.is_connected());

        assert_eq!(bus.publish::<CarFilterChannel>(&snapshot(1, "swift")), 0);
        settle().await;
        assert!(binding.filters().is_none());
        assert_eq!(query.calls(), vec![None]);
    }
}
