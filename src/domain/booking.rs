//! Booking record vocabulary shared by the booking workflow and stores.

use serde::{Deserialize, Serialize};

use super::RecordId;

/// Object name of booking records.
pub const BOOKING_OBJECT: &str = "Booking__c";

/// Field names of a booking record.
pub mod fields {
    /// The booked car. Injected by the booking workflow, never typed in.
    pub const CAR: &str = "car";
    /// Customer (contact) making the booking.
    pub const CUSTOMER: &str = "customer";
    /// First rental day.
    pub const START_DATE: &str = "start_date";
    /// Last rental day.
    pub const END_DATE: &str = "end_date";
    /// Optional discount coupon.
    pub const COUPON_CODE: &str = "coupon_code";
}

/// Payload of a successful booking workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCreated {
    /// Id of the created booking record.
    pub record_id: RecordId,
}
