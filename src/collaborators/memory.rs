//! In-memory fleet backing every collaborator interface.
//!
//! [`InMemoryFleet`] holds car records and the bookings made against them
//! behind [`tokio::sync::RwLock`]s. It answers catalog queries, saves
//! bookings, serves record fields and lists picklist options, which is
//! enough to drive the whole coordination layer without a platform.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{CarQuery, PicklistField, PicklistSource, PicklistValue, RecordLookup, RecordStore};
use crate::domain::booking::fields as booking_fields;
use crate::domain::car::fields as car_fields;
use crate::domain::{
    BOOKING_OBJECT, CarSummary, CatalogPage, FieldMap, FilterCriteria, FilterSnapshot, FuelType,
    RecordId, Transmission,
};
use crate::error::DeskError;

/// Full car record as stored by the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarRecord {
    /// Catalog projection of the car.
    #[serde(flatten)]
    pub summary: CarSummary,
    /// Model designation.
    #[serde(default)]
    pub model: Option<String>,
    /// Car family / segment.
    #[serde(default)]
    pub car_family: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Where the car is picked up.
    pub pickup_location: String,
}

/// A stored booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingRecord {
    /// Booking id.
    pub id: RecordId,
    /// Booked car.
    pub car_id: RecordId,
    /// Customer reference.
    pub customer: String,
    /// First rental day.
    pub start: NaiveDate,
    /// Last rental day.
    pub end: NaiveDate,
    /// Coupon applied, if any.
    pub coupon_code: Option<String>,
}

/// Collaborator implementation over an in-memory car list.
#[derive(Debug, Default)]
pub struct InMemoryFleet {
    cars: RwLock<Vec<CarRecord>>,
    bookings: RwLock<Vec<BookingRecord>>,
}

impl InMemoryFleet {
    /// Creates a fleet holding `cars`.
    #[must_use]
    pub fn new(cars: Vec<CarRecord>) -> Self {
        Self {
            cars: RwLock::new(cars),
            bookings: RwLock::new(Vec::new()),
        }
    }

    /// Parses a JSON array of [`CarRecord`]s.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::InvalidInput`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, DeskError> {
        let cars: Vec<CarRecord> = serde_json::from_str(json)
            .map_err(|e| DeskError::InvalidInput(format!("invalid fleet document: {e}")))?;
        Ok(Self::new(cars))
    }

    /// Adds a car to the fleet.
    pub async fn add_car(&self, car: CarRecord) {
        self.cars.write().await.push(car);
    }

    /// Returns every booking stored so far.
    pub async fn bookings(&self) -> Vec<BookingRecord> {
        self.bookings.read().await.clone()
    }

    /// Number of cars in the fleet.
    pub async fn len(&self) -> usize {
        self.cars.read().await.len()
    }

    /// Returns `true` if the fleet holds no cars.
    pub async fn is_empty(&self) -> bool {
        self.cars.read().await.is_empty()
    }

    fn matches(car: &CarRecord, criteria: &FilterCriteria, bookings: &[BookingRecord]) -> bool {
        let summary = &car.summary;

        let key = criteria.search_key.trim().to_lowercase();
        if !key.is_empty() && !summary.name.to_lowercase().contains(&key) {
            return false;
        }
        if summary.seats > criteria.max_seats {
            return false;
        }
        if summary.rental_rate_per_day > criteria.max_rental_rate {
            return false;
        }
        if summary.average_rating.unwrap_or(0.0) < criteria.min_rating {
            return false;
        }
        let location = criteria.pickup_location.trim();
        if !location.is_empty() && !car.pickup_location.eq_ignore_ascii_case(location) {
            return false;
        }
        if !criteria.transmission_types.is_empty()
            && !summary
                .transmission
                .is_some_and(|t| criteria.transmission_types.contains(&t))
        {
            return false;
        }
        if !criteria.fuel_types.is_empty()
            && !summary
                .fuel_type
                .is_some_and(|f| criteria.fuel_types.contains(&f))
        {
            return false;
        }
        !bookings
            .iter()
            .filter(|b| b.car_id == summary.id)
            .any(|b| criteria.date_range.overlaps(b.start, b.end))
    }

    fn detail_fields(car: &CarRecord) -> FieldMap {
        let summary = &car.summary;
        let mut map = FieldMap::new();
        map.insert(car_fields::NAME.to_string(), summary.name.clone().into());
        if let Some(model) = &car.model {
            map.insert(car_fields::MODEL.to_string(), model.clone().into());
        }
        if let Some(family) = &car.car_family {
            map.insert(car_fields::CAR_FAMILY.to_string(), family.clone().into());
        }
        map.insert(car_fields::SEATS.to_string(), summary.seats.into());
        if let Some(transmission) = summary.transmission {
            map.insert(
                car_fields::TRANSMISSION.to_string(),
                transmission.as_str().into(),
            );
        }
        if let Some(fuel) = summary.fuel_type {
            map.insert(car_fields::FUEL_TYPE.to_string(), fuel.as_str().into());
        }
        map.insert(
            car_fields::RENTAL_RATE.to_string(),
            summary.rental_rate_per_day.into(),
        );
        if let Some(description) = &car.description {
            map.insert(car_fields::DESCRIPTION.to_string(), description.clone().into());
        }
        if let Some(rating) = summary.average_rating {
            map.insert(car_fields::AVERAGE_RATING.to_string(), rating.into());
        }
        map
    }
}

fn text_field<'a>(fields: &'a FieldMap, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Reads a date field; accepts `YYYY-MM-DD` optionally followed by a time.
fn date_field(fields: &FieldMap, name: &str, label: &str) -> Result<NaiveDate, DeskError> {
    let raw = text_field(fields, name).ok_or_else(|| DeskError::Save(format!("{label} is required")))?;
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| DeskError::Save(format!("{label} is not a valid date: {raw}")))
}

#[async_trait]
impl CarQuery for InMemoryFleet {
    async fn list_cars(&self, filter: Option<&FilterSnapshot>) -> Result<CatalogPage, DeskError> {
        let cars = self.cars.read().await;
        let bookings = self.bookings.read().await;

        let mut matched: Vec<CarSummary> = cars
            .iter()
            .filter(|car| filter.is_none_or(|f| Self::matches(car, &f.criteria, &bookings)))
            .map(|car| car.summary.clone())
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(
            sequence = filter.map(|f| f.sequence),
            matched = matched.len(),
            "catalog query executed"
        );
        Ok(CatalogPage::new(matched))
    }
}

#[async_trait]
impl RecordStore for InMemoryFleet {
    async fn save(&self, object: &str, fields: FieldMap) -> Result<RecordId, DeskError> {
        if object != BOOKING_OBJECT {
            return Err(DeskError::Save(format!("unsupported object: {object}")));
        }

        let car_id = text_field(&fields, booking_fields::CAR)
            .map(RecordId::from)
            .ok_or_else(|| DeskError::Save("Car is required".to_string()))?;
        let customer = text_field(&fields, booking_fields::CUSTOMER)
            .ok_or_else(|| DeskError::Save("Customer is required".to_string()))?
            .to_string();
        let start = date_field(&fields, booking_fields::START_DATE, "Start date")?;
        let end = date_field(&fields, booking_fields::END_DATE, "End date")?;
        if start > end {
            return Err(DeskError::Save(
                "End date must not be before start date".to_string(),
            ));
        }
        let coupon_code = text_field(&fields, booking_fields::COUPON_CODE).map(str::to_string);

        if !self.cars.read().await.iter().any(|c| c.summary.id == car_id) {
            return Err(DeskError::Save(format!("Car {car_id} does not exist")));
        }

        let mut bookings = self.bookings.write().await;
        let overlapping = bookings
            .iter()
            .any(|b| b.car_id == car_id && b.start <= end && start <= b.end);
        if overlapping {
            return Err(DeskError::Save(
                "Car is already booked for the selected dates".to_string(),
            ));
        }

        let id = RecordId::generate();
        bookings.push(BookingRecord {
            id: id.clone(),
            car_id: car_id.clone(),
            customer,
            start,
            end,
            coupon_code,
        });

        tracing::info!(booking_id = %id, %car_id, %start, %end, "booking stored");
        Ok(id)
    }
}

#[async_trait]
impl RecordLookup for InMemoryFleet {
    async fn fetch_fields(
        &self,
        record_id: &RecordId,
        fields: &[&str],
    ) -> Result<FieldMap, DeskError> {
        let cars = self.cars.read().await;
        let car = cars
            .iter()
            .find(|c| &c.summary.id == record_id)
            .ok_or_else(|| DeskError::Lookup(format!("record {record_id} not found")))?;

        let mut all = Self::detail_fields(car);
        all.retain(|name, _| fields.contains(&name.as_str()));
        Ok(all)
    }
}

#[async_trait]
impl PicklistSource for InMemoryFleet {
    async fn picklist_values(&self, field: PicklistField) -> Result<Vec<PicklistValue>, DeskError> {
        let values = match field {
            PicklistField::PickupLocation => {
                let cars = self.cars.read().await;
                let locations: BTreeSet<&str> =
                    cars.iter().map(|c| c.pickup_location.as_str()).collect();
                locations.into_iter().map(PicklistValue::plain).collect()
            }
            PicklistField::TransmissionType => Transmission::ALL
                .iter()
                .map(|t| PicklistValue::plain(t.as_str()))
                .collect(),
            PicklistField::FuelType => FuelType::ALL
                .iter()
                .map(|f| PicklistValue::plain(f.as_str()))
                .collect(),
        };
        Ok(values)
    }
}
