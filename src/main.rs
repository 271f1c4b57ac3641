//! rental-desk demo entry point.
//!
//! Wires the desk against an in-memory fleet and replays a scripted
//! session: filter edits, a car selection, an estimate and a booking.
//! Modals are driven by a background task standing in for the user.

use std::sync::Arc;

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use tracing_subscriber::EnvFilter;

use rental_desk::app_state::AppState;
use rental_desk::collaborators::{InMemoryFleet, TracingNavigator, TracingNotifier};
use rental_desk::components::IntentOutcome;
use rental_desk::config::{DeskConfig, LogFormat};
use rental_desk::domain::booking::fields;
use rental_desk::domain::{FieldMap, Transmission};
use rental_desk::modal::{FlowStatus, ModalHost, QueuedModalHost};
use rental_desk::service::QueryState;

/// Fleet used when `FLEET_PATH` is not set.
const SAMPLE_FLEET: &str = r#"[
    {"id": "a0B01", "name": "Maruti Swift", "model": "VXi", "car_family": "Hatchback",
     "rental_rate_per_day": 45.0, "transmission": "Manual", "fuel_type": "Petrol",
     "seats": 5, "average_rating": 4.1, "pickup_location": "Delhi",
     "description": "Compact hatchback for city trips."},
    {"id": "a0B02", "name": "Toyota Innova", "model": "Crysta", "car_family": "MPV",
     "rental_rate_per_day": 90.0, "transmission": "Automatic", "fuel_type": "Diesel",
     "seats": 7, "average_rating": 4.6, "pickup_location": "Delhi"},
    {"id": "a0B03", "name": "Tata Nexon EV", "car_family": "SUV",
     "rental_rate_per_day": 70.0, "transmission": "Automatic", "fuel_type": "Electric",
     "seats": 5, "pickup_location": "Delhi"},
    {"id": "a0B04", "name": "Hyundai Creta", "car_family": "SUV",
     "rental_rate_per_day": 80.0, "transmission": "Manual", "fuel_type": "Diesel",
     "seats": 5, "average_rating": 3.9, "pickup_location": "Mumbai"}
]"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = DeskConfig::from_env();
    init_tracing(config.log_format);
    tracing::info!(debounce = ?config.filter_debounce, "starting rental-desk");

    let fleet = Arc::new(load_fleet(&config)?);
    if fleet.is_empty().await {
        tracing::warn!("fleet has no cars; the catalog will stay empty");
    } else {
        tracing::info!(cars = fleet.len().await, "fleet loaded");
    }
    let host = Arc::new(QueuedModalHost::new());
    let state = AppState::with_fleet(
        config,
        &fleet,
        Arc::new(TracingNotifier),
        Arc::new(TracingNavigator),
        Arc::clone(&host) as Arc<dyn ModalHost>,
    );

    let filters = state.filter_coordinator();
    let options = filters.load_options(state.picklists.as_ref()).await;
    tracing::info!(
        locations = options.pickup_locations.len(),
        transmissions = options.transmission_types.len(),
        fuel_types = options.fuel_types.len(),
        "filter options loaded"
    );

    let list = state.car_tile_list();
    let card = state.car_card();
    list.connect()?;
    card.connect(&state.bus);

    let start = Utc::now().date_naive().succ_opt().context("date out of range")?;
    let end = start.succ_opt().and_then(|d| d.succ_opt()).context("date out of range")?;

    // Edits made before both dates are set are held back.
    if let Err(err) = filters.set_max_seats(6) {
        tracing::info!(%err, "filter held back");
    }
    if let Err(err) = filters.set_start_date(Some(start)) {
        tracing::info!(%err, "filter held back");
    }
    filters.set_end_date(Some(end))?;
    filters.set_transmission(Transmission::Automatic, true)?;

    let mut catalog = list.binding().watch();
    catalog
        .wait_for(|s| s.filters.is_some() && !matches!(s.query, QueryState::Loading))
        .await?;
    for tile in list.tiles() {
        tracing::info!(
            car = %tile.name,
            rate = tile.rental_rate_per_day,
            transmission = %tile.transmission_label,
            fuel = %tile.fuel_type_label,
            "catalog tile"
        );
    }

    let Some(tile) = list.tiles().into_iter().next() else {
        tracing::warn!("no car matches the filter");
        return Ok(());
    };

    list.handle_intent(tile.select()).await;
    let mut detail = card.watch();
    let loaded = detail
        .wait_for(|s| s.has_data() || s.error.is_some())
        .await?
        .clone();
    if let Some(detail) = &loaded.detail {
        tracing::info!(
            car = %detail.product_name,
            seats = %detail.seating_capacity,
            rate = %detail.rental_rate,
            "detail card"
        );
    }

    let driver = tokio::spawn(drive_modals(Arc::clone(&host), start, end));

    if let IntentOutcome::Estimated(outcome) = list.handle_intent(tile.estimate()).await {
        tracing::info!(status = ?outcome.status, "estimate finished");
    }
    let booked = card.book_now().await?;
    tracing::info!(status = ?booked.status, "booking modal closed");

    driver.abort();
    list.disconnect();
    card.disconnect(&state.bus);
    filters.cancel_pending();

    tracing::info!(bookings = fleet.bookings().await.len(), "session complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

fn load_fleet(config: &DeskConfig) -> anyhow::Result<InMemoryFleet> {
    let Some(path) = &config.fleet_path else {
        return Ok(InMemoryFleet::from_json(SAMPLE_FLEET)?);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading fleet from {}", path.display()))?;
    Ok(InMemoryFleet::from_json(&json)?)
}

/// Plays the user inside the modals: finishes estimates and fills in the
/// booking form.
async fn drive_modals(host: Arc<QueuedModalHost>, start: NaiveDate, end: NaiveDate) {
    loop {
        tokio::select! {
            mut session = host.next_estimate() => {
                session.handle_status_change(FlowStatus::Started);
                session.handle_status_change(FlowStatus::Finished);
            }
            mut session = host.next_booking() => {
                let mut form = FieldMap::new();
                form.insert(fields::CUSTOMER.to_string(), "Walk-in customer".into());
                form.insert(fields::START_DATE.to_string(), start.to_string().into());
                form.insert(fields::END_DATE.to_string(), end.to_string().into());
                if let Err(err) = session.submit(form).await {
                    tracing::warn!(%err, "booking rejected");
                    session.cancel();
                }
            }
        }
    }
}
