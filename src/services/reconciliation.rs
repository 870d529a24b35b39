//! Financial reconciliation: the single authoritative balance rule.
//!
//! Pure computation over one booking's snapshot; no I/O, total over any
//! well-formed input, callable at any point in the lifecycle (including for
//! cancelled or completed bookings when hunting for paid-cancellation
//! anomalies). Every place in the crate that needs a balance goes through
//! [`reconcile`]; the rule is never re-derived at call sites.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{extra_charge, payment};

/// Canonical financial snapshot of a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFinancials {
    /// Room amount plus extra charges, minus any check-out discount.
    pub payable: Decimal,
    /// Sum of payments with a counted status (authorized or completed).
    pub paid: Decimal,
    /// `max(payable - paid, 0)`; never negative.
    pub pending: Decimal,
    pub is_fully_paid: bool,
}

/// Computes the canonical pending-balance determination for one booking.
///
/// `discount` is non-zero only on the early/forced check-out path; it
/// reduces the payable total before the balance is taken. Payments with
/// status `pending` or `failed` are excluded entirely.
pub fn reconcile(
    room_amount: Decimal,
    discount: Decimal,
    payments: &[payment::Model],
    extra_charges: &[extra_charge::Model],
) -> BookingFinancials {
    let extras: Decimal = extra_charges.iter().map(|c| c.total()).sum();
    let payable = (room_amount + extras - discount).max(Decimal::ZERO);

    let paid: Decimal = payments
        .iter()
        .filter(|p| p.status.is_counted())
        .map(|p| p.amount)
        .sum();

    let pending = (payable - paid).max(Decimal::ZERO);

    BookingFinancials {
        payable,
        paid,
        pending,
        is_fully_paid: pending.is_zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::payment::{PaymentMethod, PaymentStatus, PaymentType};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn payment(amount: Decimal, status: PaymentStatus) -> payment::Model {
        payment::Model {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            amount,
            method: PaymentMethod::Cash,
            status,
            payment_type: PaymentType::Partial,
            processed_by: Uuid::new_v4(),
            shift_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn charge(amount: Decimal, quantity: i32) -> extra_charge::Model {
        extra_charge::Model {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            description: "minibar".into(),
            amount,
            quantity,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn completed_payment_settles_room_plus_extras() {
        let fin = reconcile(
            dec!(150000),
            Decimal::ZERO,
            &[payment(dec!(170000), PaymentStatus::Completed)],
            &[charge(dec!(20000), 1)],
        );
        assert_eq!(fin.payable, dec!(170000));
        assert_eq!(fin.paid, dec!(170000));
        assert_eq!(fin.pending, dec!(0));
        assert!(fin.is_fully_paid);
    }

    #[test]
    fn pending_payment_counts_for_nothing() {
        let fin = reconcile(
            dec!(150000),
            Decimal::ZERO,
            &[payment(dec!(170000), PaymentStatus::Pending)],
            &[charge(dec!(20000), 1)],
        );
        assert_eq!(fin.paid, dec!(0));
        assert_eq!(fin.pending, dec!(170000));
        assert!(!fin.is_fully_paid);
    }

    #[test]
    fn failed_payment_of_any_amount_does_not_settle() {
        let fin = reconcile(
            dec!(100000),
            Decimal::ZERO,
            &[payment(dec!(9999999), PaymentStatus::Failed)],
            &[],
        );
        assert_eq!(fin.paid, dec!(0));
        assert!(!fin.is_fully_paid);
    }

    #[test]
    fn overpayment_never_yields_negative_pending() {
        let fin = reconcile(
            dec!(100000),
            Decimal::ZERO,
            &[payment(dec!(120000), PaymentStatus::Authorized)],
            &[],
        );
        assert_eq!(fin.pending, dec!(0));
        assert!(fin.is_fully_paid);
    }

    #[test]
    fn mixed_statuses_count_only_authorized_and_completed() {
        let fin = reconcile(
            dec!(200000),
            Decimal::ZERO,
            &[
                payment(dec!(50000), PaymentStatus::Authorized),
                payment(dec!(50000), PaymentStatus::Completed),
                payment(dec!(40000), PaymentStatus::Pending),
                payment(dec!(60000), PaymentStatus::Failed),
            ],
            &[],
        );
        assert_eq!(fin.paid, dec!(100000));
        assert_eq!(fin.pending, dec!(100000));
    }

    #[test]
    fn discount_reduces_payable_before_balance() {
        let fin = reconcile(
            dec!(150000),
            dec!(30000),
            &[payment(dec!(120000), PaymentStatus::Completed)],
            &[],
        );
        assert_eq!(fin.payable, dec!(120000));
        assert!(fin.is_fully_paid);

        // Discount larger than the total clamps at zero
        let fin = reconcile(dec!(50000), dec!(80000), &[], &[]);
        assert_eq!(fin.payable, dec!(0));
        assert!(fin.is_fully_paid);
    }

    #[test]
    fn quantity_multiplies_extra_charges() {
        let fin = reconcile(dec!(0), Decimal::ZERO, &[], &[charge(dec!(7500), 4)]);
        assert_eq!(fin.payable, dec!(30000));
    }

    #[test]
    fn reconcile_is_deterministic() {
        let payments = [payment(dec!(80000), PaymentStatus::Completed)];
        let charges = [charge(dec!(20000), 2)];
        let a = reconcile(dec!(150000), Decimal::ZERO, &payments, &charges);
        let b = reconcile(dec!(150000), Decimal::ZERO, &payments, &charges);
        assert_eq!(a, b);
    }
}
