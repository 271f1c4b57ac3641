//! One tile of the catalog list.

use serde::Serialize;

use crate::domain::{CarSummary, RecordId};

/// What the user did on a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileIntent {
    /// The tile was clicked.
    Selected(RecordId),
    /// The estimate button was pressed.
    EstimateBooking(RecordId),
    /// The book button was pressed.
    BookNow(RecordId),
}

impl TileIntent {
    /// Car the intent refers to.
    #[must_use]
    pub const fn car_id(&self) -> &RecordId {
        match self {
            Self::Selected(id) | Self::EstimateBooking(id) | Self::BookNow(id) => id,
        }
    }
}

/// Display model of one catalog row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarTile {
    /// Car record id.
    pub car_id: RecordId,
    /// Display name.
    pub name: String,
    /// Image URL, if any.
    pub picture_url: Option<String>,
    /// Daily rate.
    pub rental_rate_per_day: f64,
    /// `Transmission: <value>`, empty when unknown.
    pub transmission_label: String,
    /// `Fuel Type: <value>`, empty when unknown.
    pub fuel_type_label: String,
    /// Seat count.
    pub seats: u32,
    /// Average rating, 0 for cars without reviews.
    pub rating: f64,
}

impl From<&CarSummary> for CarTile {
    fn from(car: &CarSummary) -> Self {
        Self {
            car_id: car.id.clone(),
            name: car.name.clone(),
            picture_url: car.picture_url.clone(),
            rental_rate_per_day: car.rental_rate_per_day,
            transmission_label: car
                .transmission
                .map(|t| format!("Transmission: {t}"))
                .unwrap_or_default(),
            fuel_type_label: car
                .fuel_type
                .map(|f| format!("Fuel Type: {f}"))
                .unwrap_or_default(),
            seats: car.seats,
            rating: car.average_rating.unwrap_or(0.0),
        }
    }
}

impl CarTile {
    /// Intent raised by clicking the tile.
    #[must_use]
    pub fn select(&self) -> TileIntent {
        TileIntent::Selected(self.car_id.clone())
    }

    /// Intent raised by the estimate button.
    #[must_use]
    pub fn estimate(&self) -> TileIntent {
        TileIntent::EstimateBooking(self.car_id.clone())
    }

    /// Intent raised by the book button.
    #[must_use]
    pub fn book(&self) -> TileIntent {
        TileIntent::BookNow(self.car_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FuelType, Transmission};

    fn summary() -> CarSummary {
        CarSummary {
            id: RecordId::from("C1"),
            name: "Swift".to_string(),
            picture_url: None,
            rental_rate_per_day: 45.0,
            transmission: Some(Transmission::Manual),
            fuel_type: Some(FuelType::Cng),
            seats: 5,
            average_rating: None,
        }
    }

    #[test]
    fn labels_and_rating_default() {
        let tile = CarTile::from(&summary());
        assert_eq!(tile.transmission_label, "Transmission: Manual");
        assert_eq!(tile.fuel_type_label, "Fuel Type: CNG");
        assert!(tile.rating.abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_attributes_render_empty() {
        let mut car = summary();
        car.transmission = None;
        car.fuel_type = None;
        car.average_rating = Some(4.5);
        let tile = CarTile::from(&car);
        assert!(tile.transmission_label.is_empty());
        assert!(tile.fuel_type_label.is_empty());
        assert!((tile.rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn intents_carry_car_id() {
        let tile = CarTile::from(&summary());
        for intent in [tile.select(), tile.estimate(), tile.book()] {
            assert_eq!(intent.car_id(), &RecordId::from("C1"));
        }
    }
}
