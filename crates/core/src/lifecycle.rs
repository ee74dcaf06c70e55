//! Order lifecycle state machine.
//!
//! An order carries two independent status fields, payment and delivery,
//! plus the payment method and whether the customer's phone was verified by
//! OTP. Every change to either field is validated here before it reaches the
//! database, where it is applied as a compare-and-set update.
//!
//! ```text
//! payment:   pending ──> completed
//!                   └──> failed
//!
//! delivery:  pending ──> shipped ──> out_for_delivery ──> delivered
//!                           │                 │
//!                           └──────> failed <─┘
//! ```
//!
//! Cross-field rules:
//!
//! - A manual (UPI) order ships only after an admin completed its payment.
//! - A COD order ships only if the phone was OTP-verified at checkout.
//! - A failed payment freezes delivery.
//! - Once delivery has started, the payment can no longer be rejected.
//! - COD cash is collected at the door: the payment cannot be completed by
//!   hand, and delivering the order completes it.

use serde::{Deserialize, Serialize};

use crate::types::{DeliveryStatus, PaymentMethod, PaymentStatus};

/// Reasons a transition is refused.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("payment cannot move from {from} to {to}")]
    InvalidPayment {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    #[error("delivery cannot move from {from} to {to}")]
    InvalidDelivery {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },
    #[error("payment must be verified before the order ships")]
    PaymentNotCompleted,
    #[error("cash on delivery orders need a verified phone number before shipping")]
    PhoneNotVerified,
    #[error("order payment has failed")]
    PaymentFailed,
    #[error("payment cannot be rejected after the order has shipped")]
    DeliveryStarted,
    #[error("cash on delivery payments are completed when the order is delivered")]
    CollectOnDelivery,
}

impl PaymentStatus {
    /// Whether the payment field may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed)
        )
    }

    /// Whether no further payment transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl DeliveryStatus {
    /// Whether the delivery field may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Shipped)
                | (Self::Shipped, Self::OutForDelivery | Self::Failed)
                | (Self::OutForDelivery, Self::Delivered | Self::Failed)
        )
    }

    /// Whether no further delivery transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    /// Delivery statuses reachable in one step, ignoring cross-field rules.
    #[must_use]
    pub fn successors(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }
}

/// The lifecycle-relevant fields of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderState {
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub phone_verified: bool,
}

/// Result of applying a delivery transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// The order after the transition.
    pub state: OrderState,
    /// Set when the transition also completed the payment (COD delivered).
    pub payment_completed: bool,
}

impl OrderState {
    /// State of a freshly placed order.
    #[must_use]
    pub const fn placed(payment_method: PaymentMethod, phone_verified: bool) -> Self {
        Self {
            payment_method,
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::Pending,
            phone_verified,
        }
    }

    /// Validate a payment transition.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] describing the first rule violated.
    pub const fn check_payment(&self, next: PaymentStatus) -> Result<(), TransitionError> {
        if !self.payment_status.can_transition_to(next) {
            return Err(TransitionError::InvalidPayment {
                from: self.payment_status,
                to: next,
            });
        }

        match next {
            PaymentStatus::Failed if !matches!(self.delivery_status, DeliveryStatus::Pending) => {
                Err(TransitionError::DeliveryStarted)
            }
            PaymentStatus::Completed if matches!(self.payment_method, PaymentMethod::Cod) => {
                Err(TransitionError::CollectOnDelivery)
            }
            _ => Ok(()),
        }
    }

    /// Validate and apply a payment transition.
    ///
    /// # Errors
    ///
    /// See [`OrderState::check_payment`].
    pub const fn apply_payment(self, next: PaymentStatus) -> Result<Self, TransitionError> {
        match self.check_payment(next) {
            Ok(()) => Ok(Self {
                payment_status: next,
                ..self
            }),
            Err(e) => Err(e),
        }
    }

    /// Validate a delivery transition.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] describing the first rule violated.
    pub const fn check_delivery(&self, next: DeliveryStatus) -> Result<(), TransitionError> {
        if matches!(self.payment_status, PaymentStatus::Failed) {
            return Err(TransitionError::PaymentFailed);
        }

        if !self.delivery_status.can_transition_to(next) {
            return Err(TransitionError::InvalidDelivery {
                from: self.delivery_status,
                to: next,
            });
        }

        if matches!(next, DeliveryStatus::Shipped) {
            match self.payment_method {
                PaymentMethod::Manual
                    if !matches!(self.payment_status, PaymentStatus::Completed) =>
                {
                    return Err(TransitionError::PaymentNotCompleted);
                }
                PaymentMethod::Cod if !self.phone_verified => {
                    return Err(TransitionError::PhoneNotVerified);
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Validate and apply a delivery transition, reporting side effects.
    ///
    /// # Errors
    ///
    /// See [`OrderState::check_delivery`].
    pub const fn apply_delivery(
        self,
        next: DeliveryStatus,
    ) -> Result<DeliveryOutcome, TransitionError> {
        if let Err(e) = self.check_delivery(next) {
            return Err(e);
        }

        let payment_completed = matches!(next, DeliveryStatus::Delivered)
            && matches!(self.payment_method, PaymentMethod::Cod)
            && matches!(self.payment_status, PaymentStatus::Pending);

        let payment_status = if payment_completed {
            PaymentStatus::Completed
        } else {
            self.payment_status
        };

        Ok(DeliveryOutcome {
            state: Self {
                delivery_status: next,
                payment_status,
                ..self
            },
            payment_completed,
        })
    }

    /// Delivery statuses an admin may move this order to right now.
    #[must_use]
    pub fn allowed_deliveries(&self) -> Vec<DeliveryStatus> {
        self.delivery_status
            .successors()
            .into_iter()
            .filter(|next| self.check_delivery(*next).is_ok())
            .collect()
    }

    /// Whether an admin may verify (complete) the payment right now.
    #[must_use]
    pub const fn can_verify_payment(&self) -> bool {
        self.check_payment(PaymentStatus::Completed).is_ok()
    }

    /// Whether an admin may reject (fail) the payment right now.
    #[must_use]
    pub const fn can_reject_payment(&self) -> bool {
        self.check_payment(PaymentStatus::Failed).is_ok()
    }

    /// Whether the order still expects action.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.delivery_status.is_terminal()
            && !matches!(self.payment_status, PaymentStatus::Failed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manual() -> OrderState {
        OrderState::placed(PaymentMethod::Manual, false)
    }

    fn cod() -> OrderState {
        OrderState::placed(PaymentMethod::Cod, true)
    }

    #[test]
    fn test_payment_transitions() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Failed.can_transition_to(Pending));
    }

    #[test]
    fn test_delivery_transitions() {
        use DeliveryStatus::*;
        assert!(Pending.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(OutForDelivery));
        assert!(OutForDelivery.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Failed));
        assert!(OutForDelivery.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(OutForDelivery));
        assert!(!Shipped.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Shipped));
        for status in DeliveryStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_successors() {
        assert_eq!(
            DeliveryStatus::Shipped.successors(),
            vec![DeliveryStatus::OutForDelivery, DeliveryStatus::Failed]
        );
        assert!(DeliveryStatus::Delivered.successors().is_empty());
    }

    #[test]
    fn test_manual_order_cannot_ship_before_payment() {
        assert_eq!(
            manual().check_delivery(DeliveryStatus::Shipped),
            Err(TransitionError::PaymentNotCompleted)
        );

        let paid = manual().apply_payment(PaymentStatus::Completed).unwrap();
        assert!(paid.check_delivery(DeliveryStatus::Shipped).is_ok());
    }

    #[test]
    fn test_cod_order_requires_verified_phone() {
        let unverified = OrderState::placed(PaymentMethod::Cod, false);
        assert_eq!(
            unverified.check_delivery(DeliveryStatus::Shipped),
            Err(TransitionError::PhoneNotVerified)
        );
        assert!(cod().check_delivery(DeliveryStatus::Shipped).is_ok());
    }

    #[test]
    fn test_cod_payment_cannot_be_completed_by_hand() {
        assert_eq!(
            cod().check_payment(PaymentStatus::Completed),
            Err(TransitionError::CollectOnDelivery)
        );
        assert!(!cod().can_verify_payment());
        assert!(cod().can_reject_payment());
    }

    #[test]
    fn test_cod_delivery_completes_payment() {
        let shipped = cod().apply_delivery(DeliveryStatus::Shipped).unwrap();
        assert!(!shipped.payment_completed);

        let out = shipped
            .state
            .apply_delivery(DeliveryStatus::OutForDelivery)
            .unwrap();
        let delivered = out.state.apply_delivery(DeliveryStatus::Delivered).unwrap();

        assert!(delivered.payment_completed);
        assert_eq!(delivered.state.payment_status, PaymentStatus::Completed);
        assert_eq!(delivered.state.delivery_status, DeliveryStatus::Delivered);
        assert!(!delivered.state.is_open());
    }

    #[test]
    fn test_manual_delivery_does_not_touch_payment() {
        let state = OrderState {
            delivery_status: DeliveryStatus::OutForDelivery,
            payment_status: PaymentStatus::Completed,
            ..manual()
        };
        let outcome = state.apply_delivery(DeliveryStatus::Delivered).unwrap();
        assert!(!outcome.payment_completed);
    }

    #[test]
    fn test_failed_payment_freezes_delivery() {
        let failed = manual().apply_payment(PaymentStatus::Failed).unwrap();
        assert_eq!(
            failed.check_delivery(DeliveryStatus::Shipped),
            Err(TransitionError::PaymentFailed)
        );
        assert!(failed.allowed_deliveries().is_empty());
        assert!(!failed.is_open());
    }

    #[test]
    fn test_payment_cannot_fail_after_shipping() {
        let shipped = cod().apply_delivery(DeliveryStatus::Shipped).unwrap().state;
        assert_eq!(
            shipped.check_payment(PaymentStatus::Failed),
            Err(TransitionError::DeliveryStarted)
        );
    }

    #[test]
    fn test_terminal_payment_is_rejected() {
        let paid = manual().apply_payment(PaymentStatus::Completed).unwrap();
        assert_eq!(
            paid.check_payment(PaymentStatus::Failed),
            Err(TransitionError::InvalidPayment {
                from: PaymentStatus::Completed,
                to: PaymentStatus::Failed,
            })
        );
    }

    #[test]
    fn test_allowed_deliveries() {
        assert!(manual().allowed_deliveries().is_empty());
        assert_eq!(cod().allowed_deliveries(), vec![DeliveryStatus::Shipped]);
    }

    #[test]
    fn test_error_messages() {
        let err = TransitionError::InvalidDelivery {
            from: DeliveryStatus::Pending,
            to: DeliveryStatus::Delivered,
        };
        assert_eq!(err.to_string(), "delivery cannot move from pending to delivered");
    }
}
