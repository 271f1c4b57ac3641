//! Filter criteria, their validation rules and published snapshots.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, FilterValidationError};

/// Diagnostic attached to the start date input when it is missing.
pub const START_DATE_REQUIRED: &str = "Start date is required";
/// Diagnostic attached to the end date input when it is missing.
pub const END_DATE_REQUIRED: &str = "End date is required";
/// Diagnostic attached to the start date input when it is after the end.
pub const START_AFTER_END: &str = "Start date should be less than end date";
/// Diagnostic attached to the end date input when it is before the start.
pub const END_BEFORE_START: &str = "End date should be greater than start date";

/// Highest rating a car can carry.
pub const MAX_RATING: f64 = 5.0;

/// Gearbox type of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Transmission {
    /// Automatic gearbox.
    Automatic,
    /// Manual gearbox.
    Manual,
}

impl Transmission {
    /// All variants in display order.
    pub const ALL: [Self; 2] = [Self::Automatic, Self::Manual];

    /// Picklist value of the variant.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "Automatic",
            Self::Manual => "Manual",
        }
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transmission {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DeskError::InvalidInput(format!("unknown transmission type: {s}")))
    }
}

/// Fuel type of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FuelType {
    /// Petrol engine.
    Petrol,
    /// Diesel engine.
    Diesel,
    /// Battery electric.
    Electric,
    /// Petrol/electric hybrid.
    Hybrid,
    /// Compressed natural gas.
    #[serde(rename = "CNG")]
    Cng,
}

impl FuelType {
    /// All variants in display order.
    pub const ALL: [Self; 5] = [
        Self::Petrol,
        Self::Diesel,
        Self::Electric,
        Self::Hybrid,
        Self::Cng,
    ];

    /// Picklist value of the variant.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Petrol => "Petrol",
            Self::Diesel => "Diesel",
            Self::Electric => "Electric",
            Self::Hybrid => "Hybrid",
            Self::Cng => "CNG",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FuelType {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DeskError::InvalidInput(format!("unknown fuel type: {s}")))
    }
}

/// Requested rental period. Both ends are required before the filter can
/// be published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First rental day.
    pub start: Option<NaiveDate>,
    /// Last rental day.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a fully specified range.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Returns `true` if the range shares at least one day with
    /// `[start, end]`. An incomplete range overlaps nothing.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        match (self.start, self.end) {
            (Some(own_start), Some(own_end)) => own_start <= end && start <= own_end,
            _ => false,
        }
    }
}

/// The user's current search constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Free-text search on the car name.
    pub search_key: String,
    /// Maximum number of seats (at least 1).
    pub max_seats: u32,
    /// Requested rental period.
    pub date_range: DateRange,
    /// Maximum daily rate (non-negative).
    pub max_rental_rate: f64,
    /// Minimum average rating in `[0, 5]`.
    pub min_rating: f64,
    /// Pickup location name.
    pub pickup_location: String,
    /// Accepted gearboxes; empty accepts any.
    pub transmission_types: BTreeSet<Transmission>,
    /// Accepted fuel types; empty accepts any.
    pub fuel_types: BTreeSet<FuelType>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_key: String::new(),
            max_seats: 8,
            date_range: DateRange::default(),
            max_rental_rate: 10_000.0,
            min_rating: 0.0,
            pickup_location: "Delhi".to_string(),
            transmission_types: BTreeSet::new(),
            fuel_types: BTreeSet::new(),
        }
    }
}

impl FilterCriteria {
    /// Checks the publication rules: both dates present and in order.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterValidationError`] carrying one diagnostic per
    /// offending date input.
    pub fn validate(&self) -> Result<(), FilterValidationError> {
        let mut diagnostics = FilterValidationError::default();

        if self.date_range.start.is_none() {
            diagnostics.start_date = Some(START_DATE_REQUIRED.to_string());
        }
        if self.date_range.end.is_none() {
            diagnostics.end_date = Some(END_DATE_REQUIRED.to_string());
        }
        if let (Some(start), Some(end)) = (self.date_range.start, self.date_range.end)
            && start > end
        {
            diagnostics.start_date = Some(START_AFTER_END.to_string());
            diagnostics.end_date = Some(END_BEFORE_START.to_string());
        }

        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(diagnostics)
        }
    }
}

/// Adds or removes `value` from a checkbox-group set.
///
/// Checking a value already present and unchecking an absent one are both
/// no-ops; other members are never touched. Returns `true` if the set
/// changed.
pub fn apply_checkbox<T: Ord>(set: &mut BTreeSet<T>, value: T, checked: bool) -> bool {
    if checked {
        set.insert(value)
    } else {
        set.remove(&value)
    }
}

/// Immutable copy of [`FilterCriteria`] taken at publication time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSnapshot {
    /// Monotonic publication number of the emitting coordinator.
    pub sequence: u64,
    /// Deep copy of the criteria.
    pub criteria: FilterCriteria,
    /// Publication timestamp.
    pub published_at: DateTime<Utc>,
}

impl FilterSnapshot {
    /// Captures a deep copy of `criteria`.
    #[must_use]
    pub fn capture(sequence: u64, criteria: &FilterCriteria) -> Self {
        Self {
            sequence,
            criteria: criteria.clone(),
            published_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(y, m, d) else {
            panic!("invalid test date");
        };
        date
    }

    #[test]
    fn defaults_match_initial_panel_state() {
        let criteria = FilterCriteria::default();
        assert_eq!(criteria.search_key, "");
        assert_eq!(criteria.max_seats, 8);
        assert_eq!(criteria.pickup_location, "Delhi");
        assert!(criteria.transmission_types.is_empty());
        assert!(criteria.fuel_types.is_empty());
    }

    #[test]
    fn missing_dates_report_both_fields() {
        let Err(err) = FilterCriteria::default().validate() else {
            panic!("expected validation failure");
        };
        assert_eq!(err.start_date.as_deref(), Some(START_DATE_REQUIRED));
        assert_eq!(err.end_date.as_deref(), Some(END_DATE_REQUIRED));
    }

    #[test]
    fn missing_end_only_reports_end() {
        let mut criteria = FilterCriteria::default();
        criteria.date_range.start = Some(date(2024, 5, 1));
        let Err(err) = criteria.validate() else {
            panic!("expected validation failure");
        };
        assert!(err.start_date.is_none());
        assert_eq!(err.end_date.as_deref(), Some(END_DATE_REQUIRED));
    }

    #[test]
    fn reversed_dates_report_both_fields() {
        let mut criteria = FilterCriteria::default();
        criteria.date_range = DateRange::new(date(2024, 5, 3), date(2024, 5, 1));
        let Err(err) = criteria.validate() else {
            panic!("expected validation failure");
        };
        assert_eq!(err.start_date.as_deref(), Some(START_AFTER_END));
        assert_eq!(err.end_date.as_deref(), Some(END_BEFORE_START));
    }

    #[test]
    fn same_day_range_is_valid() {
        let mut criteria = FilterCriteria::default();
        criteria.date_range = DateRange::new(date(2024, 5, 1), date(2024, 5, 1));
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn checkbox_is_idempotent_and_isolated() {
        let mut set = BTreeSet::new();
        assert!(apply_checkbox(&mut set, Transmission::Automatic, true));
        assert!(!apply_checkbox(&mut set, Transmission::Automatic, true));
        assert!(apply_checkbox(&mut set, Transmission::Manual, true));
        assert!(apply_checkbox(&mut set, Transmission::Automatic, false));
        assert!(!apply_checkbox(&mut set, Transmission::Automatic, false));
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![Transmission::Manual]);
    }

    #[test]
    fn picklist_values_parse_case_insensitively() {
        assert_eq!("manual".parse::<Transmission>().ok(), Some(Transmission::Manual));
        assert_eq!("CNG".parse::<FuelType>().ok(), Some(FuelType::Cng));
        assert!("Steam".parse::<FuelType>().is_err());
    }

    #[test]
    fn overlap_requires_complete_range() {
        let range = DateRange::new(date(2024, 5, 1), date(2024, 5, 3));
        assert!(range.overlaps(date(2024, 5, 3), date(2024, 5, 9)));
        assert!(!range.overlaps(date(2024, 5, 4), date(2024, 5, 9)));
        assert!(!DateRange::default().overlaps(date(2024, 5, 1), date(2024, 5, 2)));
    }

    #[test]
    fn snapshot_is_detached_from_source() {
        let mut criteria = FilterCriteria::default();
        criteria.fuel_types.insert(FuelType::Diesel);
        let snapshot = FilterSnapshot::capture(1, &criteria);
        criteria.fuel_types.insert(FuelType::Petrol);
        assert_eq!(snapshot.criteria.fuel_types.len(), 1);
    }
}
