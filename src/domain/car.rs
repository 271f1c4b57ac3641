//! Read-only car projections returned by the catalog query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FuelType, RecordId, Transmission};

/// Field names requested from the record lookup for the detail card.
pub mod fields {
    /// Display name.
    pub const NAME: &str = "name";
    /// Model designation.
    pub const MODEL: &str = "model";
    /// Car family / segment.
    pub const CAR_FAMILY: &str = "car_family";
    /// Number of seats.
    pub const SEATS: &str = "seats";
    /// Transmission picklist value.
    pub const TRANSMISSION: &str = "transmission";
    /// Fuel type picklist value.
    pub const FUEL_TYPE: &str = "fuel_type";
    /// Daily rental rate.
    pub const RENTAL_RATE: &str = "rental_rate";
    /// Free-text description.
    pub const DESCRIPTION: &str = "description";
    /// Average review rating.
    pub const AVERAGE_RATING: &str = "average_rating";

    /// Every field shown on the detail card.
    pub const DETAIL: [&str; 9] = [
        NAME,
        MODEL,
        CAR_FAMILY,
        SEATS,
        TRANSMISSION,
        FUEL_TYPE,
        RENTAL_RATE,
        DESCRIPTION,
        AVERAGE_RATING,
    ];
}

/// One row of the catalog list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSummary {
    /// Car record id.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Primary image URL, if one was uploaded.
    #[serde(default)]
    pub picture_url: Option<String>,
    /// Daily rental rate.
    pub rental_rate_per_day: f64,
    /// Gearbox, if known.
    #[serde(default)]
    pub transmission: Option<Transmission>,
    /// Fuel type, if known.
    #[serde(default)]
    pub fuel_type: Option<FuelType>,
    /// Seat count.
    pub seats: u32,
    /// Average review rating, absent when the car has no reviews.
    #[serde(default)]
    pub average_rating: Option<f64>,
}

/// Result of one catalog query. Replaced wholesale on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    /// Matching cars in display order.
    pub cars: Vec<CarSummary>,
    /// When the page was produced.
    pub fetched_at: DateTime<Utc>,
}

impl CatalogPage {
    /// Wraps a list of cars fetched now.
    #[must_use]
    pub fn new(cars: Vec<CarSummary>) -> Self {
        Self {
            cars,
            fetched_at: Utc::now(),
        }
    }

    /// Returns `true` if the query matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    /// Number of matching cars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cars.len()
    }
}
