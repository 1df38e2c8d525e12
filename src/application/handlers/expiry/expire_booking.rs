//! ExpireBookingHandler - Handles an expiry message for a booking.
//!
//! The message may arrive late, twice, or after the booking was paid.
//! Correctness rests on two checks: the status read below, and the
//! ledger's guarded release, which refuses anything not `created`.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::foundation::BookingId;
use crate::ports::{LedgerError, NotificationChannel, NotificationSender, SeatLedger};

/// What happened to the booking named in an expiry message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// Seats were returned; lists the channels that delivered a notice.
    Released {
        booking_id: BookingId,
        notified: Vec<NotificationChannel>,
    },

    /// The booking was already confirmed or cancelled. Nothing changed.
    AlreadyResolved { booking_id: BookingId },

    /// No such booking in the ledger.
    NotFound { booking_id: BookingId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpiryError {
    /// The payload is not a booking. Retrying cannot help.
    #[error("Malformed expiry message: {0}")]
    Malformed(String),

    #[error("Ledger error for booking {booking_id}: {source}")]
    Ledger {
        booking_id: BookingId,
        #[source]
        source: LedgerError,
    },
}

impl ExpiryError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ExpiryError::Malformed(_) => false,
            ExpiryError::Ledger { source, .. } => source.is_retryable(),
        }
    }
}

/// Cancels an expired booking and notifies its holder.
pub struct ExpireBookingHandler {
    ledger: Arc<dyn SeatLedger>,
    email: Option<Arc<dyn NotificationSender>>,
    telegram: Option<Arc<dyn NotificationSender>>,
}

impl ExpireBookingHandler {
    pub fn new(ledger: Arc<dyn SeatLedger>) -> Self {
        Self {
            ledger,
            email: None,
            telegram: None,
        }
    }

    pub fn with_email(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.email = Some(sender);
        self
    }

    pub fn with_telegram(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.telegram = Some(sender);
        self
    }

    /// Decodes a raw message body and handles it.
    pub async fn handle_payload(&self, payload: &[u8]) -> Result<ExpiryOutcome, ExpiryError> {
        let booking: Booking =
            serde_json::from_slice(payload).map_err(|e| ExpiryError::Malformed(e.to_string()))?;
        self.handle(&booking).await
    }

    pub async fn handle(&self, booking: &Booking) -> Result<ExpiryOutcome, ExpiryError> {
        let booking_id = booking.id;
        let ledger_error = |source| ExpiryError::Ledger { booking_id, source };

        // 1. Skip bookings that were already resolved
        match self
            .ledger
            .booking_status(booking_id)
            .await
            .map_err(ledger_error)?
        {
            None => {
                tracing::warn!(booking_id = %booking_id, "Expiry for unknown booking");
                return Ok(ExpiryOutcome::NotFound { booking_id });
            }
            Some(status @ (BookingStatus::Confirmed | BookingStatus::Cancelled)) => {
                tracing::info!(booking_id = %booking_id, status = %status, "Booking already resolved, skipping expiry");
                return Ok(ExpiryOutcome::AlreadyResolved { booking_id });
            }
            Some(BookingStatus::Created) => {}
        }

        // 2. Release seats; the ledger refuses if a confirm won the race
        match self.ledger.release(booking_id, booking.event_id).await {
            Ok(()) => {}
            Err(LedgerError::AlreadyFinalized(_)) => {
                tracing::info!(booking_id = %booking_id, "Booking finalized concurrently, skipping expiry");
                return Ok(ExpiryOutcome::AlreadyResolved { booking_id });
            }
            Err(LedgerError::BookingNotFound(_)) => {
                tracing::warn!(booking_id = %booking_id, "Booking vanished before release");
                return Ok(ExpiryOutcome::NotFound { booking_id });
            }
            Err(e) => return Err(ledger_error(e)),
        }

        tracing::info!(
            booking_id = %booking_id,
            event_id = %booking.event_id,
            seats = booking.count,
            "Booking expired, seats released"
        );

        // 3. Notify; failures never undo the release
        let notified = self.notify(booking).await;

        Ok(ExpiryOutcome::Released {
            booking_id,
            notified,
        })
    }

    async fn notify(&self, booking: &Booking) -> Vec<NotificationChannel> {
        let mut notified = Vec::new();

        let targets = [
            (
                booking.notifications.email,
                self.email.as_ref(),
                booking.recipients.email.as_deref(),
            ),
            (
                booking.notifications.telegram,
                self.telegram.as_ref(),
                booking.recipients.telegram_chat_id.as_deref(),
            ),
        ];

        for (wanted, sender, recipient) in targets {
            if !wanted {
                continue;
            }
            let (Some(sender), Some(recipient)) = (sender, recipient) else {
                tracing::debug!(booking_id = %booking.id, "Notification requested but channel or recipient missing");
                continue;
            };
            match sender
                .send(recipient, &booking.event_name, booking.count)
                .await
            {
                Ok(()) => notified.push(sender.channel()),
                Err(e) => tracing::warn!(
                    booking_id = %booking.id,
                    channel = %sender.channel(),
                    error = %e,
                    "Failed to send cancellation notice"
                ),
            }
        }

        notified
    }
}
