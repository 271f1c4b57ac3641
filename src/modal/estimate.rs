//! Estimate modal: hosts the guided estimate process for one car.
//!
//! The process runs inside the modal and reports its progress through
//! status notifications. The modal closes with a bare success once the
//! process reports `FINISHED`; it carries no result value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ModalOutcome, ModalResult, ModalSlot};
use crate::domain::RecordId;
use crate::error::DeskError;

const KIND: &str = "estimate";

/// Status notification emitted by the guided process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStatus {
    /// The process started.
    Started,
    /// The process is waiting on the user.
    Paused,
    /// The process completed.
    Finished,
    /// The process completed and shows a final screen.
    FinishedScreen,
    /// The process failed.
    Error,
}

impl FlowStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Paused => "PAUSED",
            Self::Finished => "FINISHED",
            Self::FinishedScreen => "FINISHED_SCREEN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Started,
            Self::Paused,
            Self::Finished,
            Self::FinishedScreen,
            Self::Error,
        ]
        .into_iter()
        .find(|status| status.as_str() == s.trim())
        .ok_or_else(|| DeskError::InvalidInput(format!("unknown flow status: {s}")))
    }
}

/// Input variable passed to the guided process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowVariable {
    /// Variable name.
    pub name: String,
    /// Variable type as declared by the process.
    #[serde(rename = "type")]
    pub var_type: String,
    /// Value.
    pub value: String,
}

/// Opens estimate modals.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimateModal;

impl EstimateModal {
    /// Opens an estimate modal for `car_id`.
    #[must_use]
    pub fn open(car_id: RecordId) -> (EstimateModalSession, ModalResult<()>) {
        let (slot, result) = ModalSlot::open(KIND);
        tracing::info!(%car_id, "estimate modal opened");
        (EstimateModalSession { car_id, slot }, result)
    }
}

/// One open estimate modal.
#[derive(Debug)]
pub struct EstimateModalSession {
    car_id: RecordId,
    slot: ModalSlot<()>,
}

impl EstimateModalSession {
    /// The car being estimated.
    #[must_use]
    pub const fn car_id(&self) -> &RecordId {
        &self.car_id
    }

    /// Returns `true` until the process finishes or the user cancels.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.slot.is_open()
    }

    /// Variables the guided process is started with.
    #[must_use]
    pub fn input_variables(&self) -> Vec<FlowVariable> {
        vec![FlowVariable {
            name: "recordId".to_string(),
            var_type: "String".to_string(),
            value: self.car_id.to_string(),
        }]
    }

    /// Handles a status notification from the process.
    ///
    /// Only [`FlowStatus::Finished`] closes the modal. Returns `true` if
    /// this notification closed it.
    pub fn handle_status_change(&mut self, status: FlowStatus) -> bool {
        match status {
            FlowStatus::Finished => {
                tracing::info!(car_id = %self.car_id, "estimate process finished");
                self.slot.close(ModalOutcome::completed())
            }
            FlowStatus::Error => {
                tracing::warn!(car_id = %self.car_id, "estimate process reported an error");
                false
            }
            other => {
                tracing::debug!(car_id = %self.car_id, status = %other, "estimate process status");
                false
            }
        }
    }

    /// Dismisses the modal before the process finishes.
    pub fn cancel(mut self) {
        tracing::info!(car_id = %self.car_id, "estimate modal cancelled");
        self.slot.close(ModalOutcome::cancelled());
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::modal::ModalStatus;

    #[tokio::test]
    async fn finished_status_resolves_with_empty_payload() {
        let (mut session, result) = EstimateModal::open(RecordId::from("C1"));
        assert!(!session.handle_status_change(FlowStatus::Started));
        assert!(session.is_open());
        assert!(session.handle_status_change(FlowStatus::Finished));
        assert!(!session.handle_status_change(FlowStatus::Finished));

        let outcome = result.await;
        assert_eq!(outcome.status, ModalStatus::Success);
        assert!(outcome.payload.is_none());
    }

    #[tokio::test]
    async fn error_status_keeps_modal_open() {
        let (mut session, result) = EstimateModal::open(RecordId::from("C1"));
        assert!(!session.handle_status_change(FlowStatus::Error));
        assert!(session.is_open());
        session.cancel();
        assert_eq!(result.await.status, ModalStatus::Cancelled);
    }

    #[test]
    fn input_variables_carry_car_id() {
        let (session, _result) = EstimateModal::open(RecordId::from("C7"));
        assert_eq!(
            session.input_variables(),
            vec![FlowVariable {
                name: "recordId".to_string(),
                var_type: "String".to_string(),
                value: "C7".to_string(),
            }]
        );
    }

    #[test]
    fn status_parses_wire_names() {
        assert_eq!("FINISHED".parse::<FlowStatus>().ok(), Some(FlowStatus::Finished));
        assert_eq!(
            "FINISHED_SCREEN".parse::<FlowStatus>().ok(),
            Some(FlowStatus::FinishedScreen)
        );
        assert!("DONE".parse::<FlowStatus>().is_err());
    }
}
