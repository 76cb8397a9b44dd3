//! Payment-to-job balance reconciliation.
//!
//! A job's `outstanding_balance` moves only when a payment enters or leaves the
//! `completed` status:
//!
//! | event | non-refund | refund |
//! |---|---|---|
//! | adjust (becomes effective) | `balance - amount` | `balance + amount` |
//! | reverse (stops being effective) | `balance + amount` | `balance - amount` |
//!
//! Every result is clamped at zero. These functions are pure; `crate::payments`
//! runs them inside a transaction that holds the job row lock.
use models::enums::{PaymentStatus, PaymentType};
use models::{payment, validate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::ServiceError;

/// The balance-relevant facts of one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentEffect {
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
}

impl PaymentEffect {
    pub fn new(amount: Decimal, payment_type: PaymentType, status: PaymentStatus) -> Self {
        Self { amount, payment_type, status }
    }

    /// Only completed payments move the balance.
    pub fn is_effective(&self) -> bool { self.status.is_completed() }
}

impl From<&payment::Model> for PaymentEffect {
    fn from(p: &payment::Model) -> Self {
        Self::new(p.amount, p.payment_type, p.status)
    }
}

fn floor(balance: Decimal) -> Decimal { balance.max(Decimal::ZERO) }

/// Apply a payment that has become effective.
pub fn adjust(balance: Decimal, amount: Decimal, payment_type: PaymentType) -> Decimal {
    if payment_type.is_refund() {
        floor(balance + amount)
    } else {
        floor(balance - amount)
    }
}

/// Undo [`adjust`]: the exact inverse, including for refunds.
pub fn reverse(balance: Decimal, amount: Decimal, payment_type: PaymentType) -> Decimal {
    if payment_type.is_refund() {
        floor(balance - amount)
    } else {
        floor(balance + amount)
    }
}

/// Non-refund payments require something left to pay.
pub fn ensure_payable(job_id: Uuid, balance: Decimal, payment_type: PaymentType) -> Result<(), ServiceError> {
    if !payment_type.is_refund() && balance <= Decimal::ZERO {
        return Err(ServiceError::JobAlreadySettled { job_id });
    }
    Ok(())
}

/// A balance must fit the job's money column before it is written back.
pub fn ensure_storable(balance: Decimal) -> Result<Decimal, ServiceError> {
    if validate::fits_money("outstanding_balance", balance).is_err() {
        return Err(ServiceError::field("amount", format!("would push the job balance above {}", validate::MONEY_MAX)));
    }
    Ok(balance)
}

/// Balance after recording `new` against a job.
///
/// Fails with `JobAlreadySettled` for a non-refund payment when the job owes
/// nothing, whatever the payment's status.
pub fn on_create(job_id: Uuid, balance: Decimal, new: PaymentEffect) -> Result<Decimal, ServiceError> {
    ensure_payable(job_id, balance, new.payment_type)?;
    if new.is_effective() {
        Ok(adjust(balance, new.amount, new.payment_type))
    } else {
        Ok(balance)
    }
}

/// Balance after editing a payment that stays on the same job.
///
/// A previously completed payment is reversed with its old amount and type
/// first; the new values are then applied if the payment is completed.
pub fn on_update(job_id: Uuid, balance: Decimal, old: PaymentEffect, new: PaymentEffect) -> Result<Decimal, ServiceError> {
    let reversed = on_delete(balance, old);
    apply_if_effective(job_id, reversed, new)
}

/// Balance after removing a payment.
pub fn on_delete(balance: Decimal, old: PaymentEffect) -> Decimal {
    if old.is_effective() {
        reverse(balance, old.amount, old.payment_type)
    } else {
        balance
    }
}

/// Apply `new` to a balance that no longer includes any prior effect of the
/// same payment. Used directly when a payment moves between jobs.
pub fn apply_if_effective(job_id: Uuid, balance: Decimal, new: PaymentEffect) -> Result<Decimal, ServiceError> {
    if !new.is_effective() {
        return Ok(balance);
    }
    ensure_payable(job_id, balance, new.payment_type)?;
    Ok(adjust(balance, new.amount, new.payment_type))
}

/// Balance derived from scratch: `total - upfront - paid + refunded`, floored.
///
/// Used when a job's price terms change.
pub fn recompute<I>(total_price: Decimal, upfront: Decimal, payments: I) -> Decimal
where
    I: IntoIterator<Item = PaymentEffect>,
{
    let net_paid = payments
        .into_iter()
        .filter(PaymentEffect::is_effective)
        .fold(Decimal::ZERO, |acc, p| {
            if p.payment_type.is_refund() { acc - p.amount } else { acc + p.amount }
        });
    floor(total_price - upfront - net_paid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn completed(amount: Decimal, t: PaymentType) -> PaymentEffect {
        PaymentEffect::new(amount, t, PaymentStatus::Completed)
    }

    fn job() -> Uuid { Uuid::new_v4() }

    #[test]
    fn completed_payment_reduces_balance() {
        assert_eq!(on_create(job(), dec!(800.00), completed(dec!(400.00), PaymentType::Advance)).unwrap(), dec!(400.00));
    }

    #[test]
    fn overpayment_clamps_to_zero() {
        assert_eq!(on_create(job(), dec!(100.00), completed(dec!(250.00), PaymentType::Full)).unwrap(), dec!(0));
    }

    #[test]
    fn completed_refund_increases_balance() {
        assert_eq!(on_create(job(), dec!(100.00), completed(dec!(50.00), PaymentType::Refund)).unwrap(), dec!(150.00));
    }

    #[test]
    fn refund_allowed_on_settled_job() {
        assert_eq!(on_create(job(), dec!(0), completed(dec!(30.00), PaymentType::Refund)).unwrap(), dec!(30.00));
    }

    #[test]
    fn pending_payment_leaves_balance_untouched() {
        let p = PaymentEffect::new(dec!(100.00), PaymentType::Partial, PaymentStatus::Pending);
        assert_eq!(on_create(job(), dec!(300.00), p).unwrap(), dec!(300.00));
    }

    #[test]
    fn settled_job_rejects_non_refund_payment() {
        let id = job();
        let err = on_create(id, dec!(0), completed(dec!(1.00), PaymentType::Partial)).unwrap_err();
        assert!(matches!(err, ServiceError::JobAlreadySettled { job_id } if job_id == id));
    }

    #[test]
    fn settled_job_rejects_pending_non_refund_payment() {
        let p = PaymentEffect::new(dec!(10.00), PaymentType::Advance, PaymentStatus::Pending);
        assert!(on_create(job(), dec!(0), p).is_err());
    }

    #[test]
    fn two_payments_settle_then_third_is_rejected() {
        let id = job();
        let b = on_create(id, dec!(800.00), completed(dec!(400.00), PaymentType::Advance)).unwrap();
        assert_eq!(b, dec!(400.00));
        let b = on_create(id, b, completed(dec!(400.00), PaymentType::Full)).unwrap();
        assert_eq!(b, dec!(0.00));
        assert!(matches!(
            on_create(id, b, completed(dec!(0.01), PaymentType::Partial)),
            Err(ServiceError::JobAlreadySettled { .. })
        ));
    }

    #[test]
    fn deleting_completed_refund_restores_balance() {
        let refund = completed(dec!(50.00), PaymentType::Refund);
        let b = on_create(job(), dec!(100.00), refund).unwrap();
        assert_eq!(b, dec!(150.00));
        assert_eq!(on_delete(b, refund), dec!(100.00));
    }

    #[test]
    fn cancelling_completed_payment_restores_balance() {
        let id = job();
        let full = completed(dec!(200.00), PaymentType::Full);
        let b = on_create(id, dec!(200.00), full).unwrap();
        assert_eq!(b, dec!(0));
        let cancelled = PaymentEffect { status: PaymentStatus::Cancelled, ..full };
        assert_eq!(on_update(id, b, full, cancelled).unwrap(), dec!(200.00));
    }

    #[test]
    fn deleting_non_completed_payment_is_a_no_op() {
        let p = PaymentEffect::new(dec!(70.00), PaymentType::Partial, PaymentStatus::Refunded);
        assert_eq!(on_delete(dec!(20.00), p), dec!(20.00));
    }

    #[test]
    fn pending_to_completed_applies_new_amount() {
        let id = job();
        let old = PaymentEffect::new(dec!(100.00), PaymentType::Partial, PaymentStatus::Pending);
        let new = completed(dec!(120.00), PaymentType::Partial);
        assert_eq!(on_update(id, dec!(500.00), old, new).unwrap(), dec!(380.00));
    }

    #[test]
    fn amount_edit_on_completed_payment_is_not_double_counted() {
        let id = job();
        let old = completed(dec!(100.00), PaymentType::Partial);
        let b = on_create(id, dec!(500.00), old).unwrap();
        let new = completed(dec!(150.00), PaymentType::Partial);
        assert_eq!(on_update(id, b, old, new).unwrap(), dec!(350.00));
    }

    #[test]
    fn switching_type_to_refund_flips_direction() {
        let id = job();
        let old = completed(dec!(40.00), PaymentType::Partial);
        let b = on_create(id, dec!(100.00), old).unwrap();
        assert_eq!(b, dec!(60.00));
        let new = completed(dec!(40.00), PaymentType::Refund);
        assert_eq!(on_update(id, b, old, new).unwrap(), dec!(140.00));
    }

    #[test]
    fn completing_on_settled_job_after_reversal_is_checked() {
        let id = job();
        let old = PaymentEffect::new(dec!(10.00), PaymentType::Partial, PaymentStatus::Pending);
        let new = completed(dec!(10.00), PaymentType::Partial);
        assert!(matches!(on_update(id, dec!(0), old, new), Err(ServiceError::JobAlreadySettled { .. })));
    }

    #[test]
    fn adjust_then_reverse_is_identity_without_clamping() {
        let cases = [
            (dec!(0), dec!(5.00), PaymentType::Refund),
            (dec!(10.00), dec!(10.00), PaymentType::Full),
            (dec!(999.99), dec!(0.01), PaymentType::Advance),
            (dec!(300.00), dec!(125.50), PaymentType::Partial),
            (dec!(12.34), dec!(1000.00), PaymentType::Refund),
        ];
        for (balance, amount, t) in cases {
            assert_eq!(reverse(adjust(balance, amount, t), amount, t), balance, "{balance} {amount} {t:?}");
        }
    }

    #[test]
    fn balance_never_negative_over_event_sequence() {
        let id = job();
        let mut balance = dec!(250.00);
        let events = [
            completed(dec!(100.00), PaymentType::Advance),
            completed(dec!(300.00), PaymentType::Full),
            completed(dec!(25.00), PaymentType::Refund),
            PaymentEffect::new(dec!(500.00), PaymentType::Partial, PaymentStatus::Pending),
        ];
        for e in events {
            balance = match on_create(id, balance, e) {
                Ok(b) => b,
                Err(_) => balance,
            };
            assert!(balance >= Decimal::ZERO);
            balance = on_delete(balance, completed(dec!(60.00), PaymentType::Refund));
            assert!(balance >= Decimal::ZERO);
        }
    }

    #[test]
    fn oversized_balance_is_a_field_error() {
        let near_max = dec!(99999998.00);
        let balance = on_create(Uuid::nil(), near_max, completed(dec!(1.00), PaymentType::Refund)).unwrap();
        assert_eq!(ensure_storable(balance).unwrap(), dec!(99999999.00));
        let balance = on_create(Uuid::nil(), near_max, completed(dec!(5.00), PaymentType::Refund)).unwrap();
        match ensure_storable(balance) {
            Err(ServiceError::Validation(f)) => assert!(f.get("amount").is_some()),
            other => panic!("unexpected {other:?}"),
        }
        let reopened = on_delete(near_max, completed(dec!(10.00), PaymentType::Full));
        assert!(ensure_storable(reopened).is_err());
    }

    #[test]
    fn recompute_nets_refunds_and_ignores_inactive_payments() {
        let payments = [
            completed(dec!(300.00), PaymentType::Advance),
            completed(dec!(50.00), PaymentType::Refund),
            PaymentEffect::new(dec!(400.00), PaymentType::Full, PaymentStatus::Cancelled),
        ];
        assert_eq!(recompute(dec!(1000.00), dec!(100.00), payments), dec!(650.00));
        assert_eq!(recompute(dec!(100.00), dec!(0), [completed(dec!(500.00), PaymentType::Full)]), dec!(0));
    }
}
