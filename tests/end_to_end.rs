//! End-to-end tests wiring a full desk over an in-memory fleet.

#![allow(clippy::panic)]

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;

use rental_desk::app_state::AppState;
use rental_desk::collaborators::{
    InMemoryFleet, Navigator, Notifier, PageAction, PageReference, RecordingNavigator,
    RecordingNotifier, Toast, ToastVariant,
};
use rental_desk::components::{IntentOutcome, TileIntent};
use rental_desk::config::DeskConfig;
use rental_desk::domain::booking::fields;
use rental_desk::domain::{
    CarFilterChannel, DateRange, FieldMap, FilterCriteria, FilterSnapshot, RecordId, Scope,
    Transmission,
};
use rental_desk::error::DeskError;
use rental_desk::modal::{FlowStatus, ModalHost, ModalOutcome, ModalStatus, QueuedModalHost};

const FLEET: &str = r#"[
    {"id":"C1","name":"Swift","rental_rate_per_day":45.0,"transmission":"Manual",
     "fuel_type":"Petrol","seats":5,"average_rating":4.2,"pickup_location":"Delhi"},
    {"id":"C2","name":"Innova","rental_rate_per_day":90.0,"transmission":"Automatic",
     "fuel_type":"Diesel","seats":7,"pickup_location":"Delhi"},
    {"id":"C3","name":"City","rental_rate_per_day":60.0,"transmission":"Automatic",
     "fuel_type":"Petrol","seats":4,"pickup_location":"Delhi"}
]"#;

struct Desk {
    state: AppState,
    fleet: Arc<InMemoryFleet>,
    host: Arc<QueuedModalHost>,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<RecordingNavigator>,
}

fn desk() -> Desk {
    let Ok(fleet) = InMemoryFleet::from_json(FLEET) else {
        panic!("fleet should parse");
    };
    let fleet = Arc::new(fleet);
    let host = Arc::new(QueuedModalHost::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let state = AppState::with_fleet(
        DeskConfig::default(),
        &fleet,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
        Arc::clone(&host) as Arc<dyn ModalHost>,
    );
    Desk {
        state,
        fleet,
        host,
        notifier,
        navigator,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    let Some(date) = NaiveDate::from_ymd_opt(y, m, d) else {
        panic!("invalid test date");
    };
    date
}

fn record_filters(desk: &Desk) -> Arc<Mutex<Vec<FilterSnapshot>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    desk.state
        .bus
        .subscribe::<CarFilterChannel, _>(Scope::Global, move |snapshot| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(snapshot.clone());
            Ok(())
        });
    log
}

fn published(log: &Arc<Mutex<Vec<FilterSnapshot>>>) -> Vec<FilterSnapshot> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn booking_form() -> FieldMap {
    let mut form = FieldMap::new();
    form.insert(fields::CUSTOMER.to_string(), "Asha".into());
    form.insert(fields::START_DATE.to_string(), "2024-05-01".into());
    form.insert(fields::END_DATE.to_string(), "2024-05-03".into());
    form
}

#[tokio::test(start_paused = true)]
async fn seats_then_dates_publish_once_and_narrow_the_catalog() {
    let desk = desk();
    let log = record_filters(&desk);
    let filters = desk.state.filter_coordinator();
    let list = desk.state.car_tile_list();
    assert!(list.connect().is_ok());
    wait(10).await;
    assert!(list.show_initial_message());
    assert_eq!(list.tiles().len(), 3);

    assert!(filters.set_max_seats(4).is_err());
    assert!(filters.set_start_date(Some(date(2024, 5, 1))).is_err());
    assert!(filters.set_end_date(Some(date(2024, 5, 3))).is_ok());
    wait(1_000).await;

    let snapshots = published(&log);
    assert_eq!(snapshots.len(), 1);
    let Some(snapshot) = snapshots.first() else {
        panic!("expected one snapshot");
    };
    let expected = FilterCriteria {
        max_seats: 4,
        date_range: DateRange::new(date(2024, 5, 1), date(2024, 5, 3)),
        ..FilterCriteria::default()
    };
    assert_eq!(snapshot.criteria, expected);

    assert!(!list.show_initial_message());
    let names: Vec<String> = list.tiles().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["City"]);
}

#[tokio::test(start_paused = true)]
async fn unchecking_a_transmission_keeps_the_others() {
    let desk = desk();
    let log = record_filters(&desk);
    let filters = desk.state.filter_coordinator();
    let list = desk.state.car_tile_list();
    assert!(list.connect().is_ok());

    assert!(filters.set_start_date(Some(date(2024, 5, 1))).is_err());
    assert!(filters.set_end_date(Some(date(2024, 5, 3))).is_ok());
    assert!(filters.set_transmission(Transmission::Automatic, true).is_ok());
    assert!(filters.set_transmission(Transmission::Manual, true).is_ok());
    assert!(filters.set_transmission(Transmission::Automatic, false).is_ok());
    wait(1_000).await;

    let snapshots = published(&log);
    assert_eq!(snapshots.len(), 1);
    assert_eq!(
        snapshots.first().map(|s| s.criteria.transmission_types.clone()),
        Some(BTreeSet::from([Transmission::Manual]))
    );
    let names: Vec<String> = list.tiles().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["Swift"]);
}

#[tokio::test(start_paused = true)]
async fn booked_car_disappears_for_overlapping_dates() {
    let desk = desk();
    let filters = desk.state.filter_coordinator();
    let list = desk.state.car_tile_list();
    assert!(list.connect().is_ok());

    let flow = {
        let list = list.clone();
        tokio::spawn(async move {
            list.handle_intent(TileIntent::BookNow(RecordId::from("C1")))
                .await
        })
    };
    let mut session = desk.host.next_booking().await;
    assert!(session.submit(booking_form()).await.is_ok());
    let Ok(IntentOutcome::Booked(outcome)) = flow.await else {
        panic!("expected booking outcome");
    };
    assert!(outcome.is_success());

    let _ = filters.set_start_date(Some(date(2024, 5, 2)));
    let _ = filters.set_end_date(Some(date(2024, 5, 4)));
    wait(1_000).await;
    let names: Vec<String> = list.tiles().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["City", "Innova"]);
}

#[tokio::test]
async fn booking_from_detail_card_notifies_and_navigates() {
    let desk = desk();
    let list = desk.state.car_tile_list();
    let card = desk.state.car_card();
    card.connect(&desk.state.bus);

    let selected = list
        .handle_intent(TileIntent::Selected(RecordId::from("C1")))
        .await;
    assert_eq!(selected, IntentOutcome::Selected(1));

    let flow = {
        let card = card.clone();
        tokio::spawn(async move { card.book_now().await })
    };
    let mut session = desk.host.next_booking().await;
    assert_eq!(session.car_id(), &RecordId::from("C1"));

    let mut incomplete = booking_form();
    incomplete.remove(fields::CUSTOMER);
    let Err(DeskError::Save(message)) = session.submit(incomplete).await else {
        panic!("save without customer should fail");
    };
    assert_eq!(message, "Customer is required");
    assert!(session.is_open());
    assert!(!flow.is_finished());

    let Ok(booking_id) = session.submit(booking_form()).await else {
        panic!("save should succeed");
    };
    let Ok(Ok(outcome)) = flow.await else {
        panic!("booking flow failed");
    };
    assert_eq!(outcome.status, ModalStatus::Success);
    assert_eq!(
        outcome.payload.map(|created| created.record_id),
        Some(booking_id.clone())
    );
    assert_eq!(
        desk.notifier.toasts(),
        vec![Toast::new(
            "Success",
            "Booking Created Successfully",
            ToastVariant::Success
        )]
    );
    assert_eq!(
        desk.navigator.targets(),
        vec![PageReference::RecordPage {
            object_api_name: "Booking__c".to_string(),
            record_id: booking_id,
            action: PageAction::View,
        }]
    );
    assert_eq!(desk.fleet.bookings().await.len(), 1);
}

#[tokio::test]
async fn estimate_resolves_on_finished_status() {
    let desk = desk();
    let list = desk.state.car_tile_list();
    let flow = {
        let list = list.clone();
        tokio::spawn(async move {
            list.handle_intent(TileIntent::EstimateBooking(RecordId::from("C2")))
                .await
        })
    };

    let mut session = desk.host.next_estimate().await;
    assert!(!session.handle_status_change(FlowStatus::Started));
    assert!(session.handle_status_change(FlowStatus::Finished));

    let Ok(IntentOutcome::Estimated(outcome)) = flow.await else {
        panic!("expected estimate outcome");
    };
    assert_eq!(outcome, ModalOutcome::completed());
    assert!(desk.notifier.toasts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn disconnected_list_stops_following_filters() {
    let desk = desk();
    let list = desk.state.car_tile_list();
    assert!(list.connect().is_ok());
    list.disconnect();

    let delivered = desk
        .state
        .bus
        .publish::<CarFilterChannel>(&FilterSnapshot::capture(1, &FilterCriteria::default()));
    assert_eq!(delivered, 0);
    wait(100).await;
    assert!(list.show_initial_message());
}
