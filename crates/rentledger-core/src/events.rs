//! Payment change events
//!
//! Payment storage publishes a [`PaymentChange`] after every successful write.
//! The recompute coordinator consumes them from a bounded channel. Publishing
//! never fails the write: a full or closed queue is logged and reported as a
//! stale summary instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::coordinator::FailureLog;
use crate::error::CoreError;
use crate::models::PaymentFact;

/// A committed write to a payment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PaymentChange {
    Inserted { after: PaymentFact },
    Updated { before: PaymentFact, after: PaymentFact },
    Deleted { before: PaymentFact },
}

impl PaymentChange {
    pub fn payment_id(&self) -> &str {
        match self {
            PaymentChange::Inserted { after } => &after.id,
            PaymentChange::Updated { after, .. } => &after.id,
            PaymentChange::Deleted { before } => &before.id,
        }
    }

    /// Period label whose summary this change invalidates, if any.
    ///
    /// Only transitions into or out of "paid" move revenue. Deletes use the
    /// record as it was before deletion.
    pub fn recompute_label(&self) -> Option<&str> {
        match self {
            PaymentChange::Inserted { after } if after.is_paid() => Some(after.period_label.as_str()),
            PaymentChange::Updated { before, after } => match (before.is_paid(), after.is_paid()) {
                (false, true) => Some(after.period_label.as_str()),
                (true, false) => Some(before.period_label.as_str()),
                _ => None,
            },
            PaymentChange::Deleted { before } if before.is_paid() => Some(before.period_label.as_str()),
            _ => None,
        }
    }
}

/// Create the change channel
pub fn channel(capacity: usize) -> (mpsc::Sender<PaymentChange>, mpsc::Receiver<PaymentChange>) {
    mpsc::channel(capacity.max(1))
}

/// Publishing side of the change channel
#[derive(Clone)]
pub struct ChangePublisher {
    tx: Option<mpsc::Sender<PaymentChange>>,
    failures: Arc<FailureLog>,
}

impl ChangePublisher {
    pub fn new(tx: mpsc::Sender<PaymentChange>, failures: Arc<FailureLog>) -> Self {
        Self { tx: Some(tx), failures }
    }

    /// Publisher that drops every event (recompute turned off)
    pub fn disabled(failures: Arc<FailureLog>) -> Self {
        Self { tx: None, failures }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue a change for recompute. Changes that do not affect revenue are not queued.
    ///
    /// Returns whether the change was queued.
    pub fn publish(&self, change: PaymentChange) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        let Some(label) = change.recompute_label().map(str::to_string) else {
            log::debug!(
                target: "rentledger::recompute",
                "Payment {} change does not affect revenue",
                change.payment_id()
            );
            return false;
        };
        let payment_id = change.payment_id().to_string();

        match tx.try_send(change) {
            Ok(()) => true,
            Err(e) => {
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "recompute queue is full",
                    mpsc::error::TrySendError::Closed(_) => "recompute worker has stopped",
                };
                let error = CoreError::QueueUnavailable {
                    message: reason.to_string(),
                };
                self.failures.record(&payment_id, &label, None, &error);
                false
            }
        }
    }
}
