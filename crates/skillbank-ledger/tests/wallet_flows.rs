mod common;

use common::Harness;
use skillbank_ledger::LedgerError;
use skillbank_types::models::{
    ChargeStatus, EntryKind, NotificationKind, SortOrder, WithdrawalStatus, source,
};

#[test]
fn withdrawal_approved_after_escrow() {
    let h = Harness::new();
    let user = h.user("ali");
    h.fund(&user, 100_000);

    let request = h
        .ledger
        .request_withdrawal(&user, 30_000, "07801112222", None)
        .unwrap();
    let held = h.balance(&user);
    assert_eq!((held.balance, held.reserved_balance), (70_000, 30_000));

    let approved = h
        .ledger
        .approve_withdrawal(&h.admin, &request.id, Some("sent via ZainCash"))
        .unwrap();
    assert_eq!(approved.status, WithdrawalStatus::Approved);
    assert_eq!(approved.admin_id.as_deref(), Some(h.admin.id_string().as_str()));

    let after = h.balance(&user);
    assert_eq!((after.balance, after.reserved_balance), (70_000, 0));
    h.assert_consistent(&user);
}

#[test]
fn withdrawal_rejected_restores_balance() {
    let h = Harness::new();
    let user = h.user("ali");
    h.fund(&user, 100_000);

    let request = h
        .ledger
        .request_withdrawal(&user, 30_000, "07801112222", None)
        .unwrap();
    h.ledger
        .reject_withdrawal(&h.admin, &request.id, Some("number does not match"))
        .unwrap();

    let after = h.balance(&user);
    assert_eq!((after.balance, after.reserved_balance), (100_000, 0));

    let inbox = h
        .ledger
        .db()
        .list_notifications(&user.id_string(), false, 10)
        .unwrap();
    assert_eq!(inbox[0].kind, NotificationKind::WithdrawalRejected);
    assert!(inbox[0].body.contains("number does not match"));
    h.assert_consistent(&user);
}

#[test]
fn deposit_verified_credits_once() {
    let h = Harness::new();
    let user = h.user("zainab");

    let charge = h
        .ledger
        .submit_charge(&user, &h.claim(&user, 25_000))
        .unwrap();
    assert_eq!(charge.status, ChargeStatus::Pending);
    assert_eq!(h.balance(&user).balance, 0);

    let verified = h
        .ledger
        .verify_charge(&h.admin, &charge.id, Some("matches statement"))
        .unwrap();
    assert_eq!(verified.status, ChargeStatus::Verified);
    assert!(verified.verified_at.is_some());
    assert_eq!(h.balance(&user).balance, 25_000);

    let again = h.ledger.verify_charge(&h.admin, &charge.id, None);
    assert!(matches!(again, Err(LedgerError::InvalidState { .. })));
    let reject = h.ledger.reject_charge(&h.admin, &charge.id, None);
    assert!(matches!(reject, Err(LedgerError::InvalidState { .. })));
    assert_eq!(h.balance(&user).balance, 25_000);

    let entries = h.ledger.entries(&user, SortOrder::Asc, 10).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::Deposit);
    assert_eq!(entries[0].source, source::ZAINCASH_MANUAL);
    assert_eq!(entries[0].reference_id.as_deref(), Some(charge.id.as_str()));
}

#[test]
fn rejected_deposit_leaves_balance_and_echoes_notes() {
    let h = Harness::new();
    let user = h.user("zainab");
    let charge = h
        .ledger
        .submit_charge(&user, &h.claim(&user, 25_000))
        .unwrap();

    let rejected = h
        .ledger
        .reject_charge(&h.admin, &charge.id, Some("blurry screenshot"))
        .unwrap();
    assert_eq!(rejected.status, ChargeStatus::Rejected);
    assert_eq!(h.balance(&user).balance, 0);

    let inbox = h
        .ledger
        .db()
        .list_notifications(&user.id_string(), true, 10)
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::DepositRejected);
    assert!(inbox[0].body.contains("blurry screenshot"));
}

#[test]
fn peer_payment_moves_funds_between_wallets() {
    let h = Harness::new();
    let x = h.user("sara");
    let y = h.user("mina");
    h.fund(&x, 50_000);

    let payment = h
        .ledger
        .send_payment(&x, "MINA", 20_000, Some("calculus tutoring"))
        .unwrap();
    assert_eq!(payment.recipient_id, y.id_string());

    assert_eq!(h.balance(&x).balance, 30_000);
    assert_eq!(h.balance(&y).balance, 20_000);
    assert_eq!(h.balance(&x).balance + h.balance(&y).balance, 50_000);

    let inbox = h
        .ledger
        .db()
        .list_notifications(&y.id_string(), true, 10)
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::PaymentReceived);
    assert_eq!(inbox[0].related_id.as_deref(), Some(payment.id.as_str()));

    assert_eq!(h.ledger.my_payments(&x, SortOrder::Desc, 10).unwrap().len(), 1);
    assert_eq!(h.ledger.my_payments(&y, SortOrder::Desc, 10).unwrap().len(), 1);
    h.assert_consistent(&x);
    h.assert_consistent(&y);
}

#[test]
fn payment_validation() {
    let h = Harness::new();
    let x = h.user("sara");
    h.user("mina");
    h.fund(&x, 10_000);

    assert!(matches!(
        h.ledger.send_payment(&x, "sara", 100, None),
        Err(LedgerError::Validation(_))
    ));
    assert!(matches!(
        h.ledger.send_payment(&x, "nobody", 100, None),
        Err(LedgerError::NotFound(_))
    ));
    assert!(matches!(
        h.ledger.send_payment(&x, "mina", 0, None),
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert!(matches!(
        h.ledger.send_payment(&x, "mina", 10_001, None),
        Err(LedgerError::InsufficientFunds {
            available: 10_000,
            requested: 10_001
        })
    ));
    assert!(h.ledger.my_payments(&x, SortOrder::Desc, 10).unwrap().is_empty());
}

#[test]
fn duplicate_deposit_claims_are_refused() {
    let h = Harness::new();
    let user = h.user("omar");
    let first = h.claim(&user, 10_000);
    h.ledger.submit_charge(&user, &first).unwrap();

    let mut same_txn = h.claim(&user, 10_000);
    same_txn.external_txn_id = first.external_txn_id.clone();
    assert!(matches!(
        h.ledger.submit_charge(&user, &same_txn),
        Err(LedgerError::Duplicate(_))
    ));

    let mut same_proof = h.claim(&user, 10_000);
    same_proof.proof.sha256 = first.proof.sha256.clone();
    assert!(matches!(
        h.ledger.submit_charge(&user, &same_proof),
        Err(LedgerError::Duplicate(_))
    ));
}

#[test]
fn proof_must_belong_to_submitter() {
    let h = Harness::new();
    let owner = h.user("omar");
    let other = h.user("huda");
    let claim = h.claim(&owner, 10_000);
    assert!(matches!(
        h.ledger.submit_charge(&other, &claim),
        Err(LedgerError::Validation(_))
    ));
}

#[test]
fn admin_operations_require_admin() {
    let h = Harness::new();
    let user = h.user("omar");
    let charge = h
        .ledger
        .submit_charge(&user, &h.claim(&user, 10_000))
        .unwrap();

    assert!(matches!(
        h.ledger.verify_charge(&user, &charge.id, None),
        Err(LedgerError::Forbidden(_))
    ));
    assert!(matches!(
        h.ledger.all_charges(&user, None, SortOrder::Desc, 10),
        Err(LedgerError::Forbidden(_))
    ));
    assert!(matches!(
        h.ledger.all_withdrawals(&user, None, SortOrder::Desc, 10),
        Err(LedgerError::Forbidden(_))
    ));
    assert!(matches!(
        h.ledger.reconcile(&user, &h.admin.id_string()),
        Err(LedgerError::Forbidden(_))
    ));
    assert_eq!(h.balance(&user).balance, 0);
}

#[test]
fn unknown_requests_are_not_found() {
    let h = Harness::new();
    assert!(matches!(
        h.ledger.verify_charge(&h.admin, "missing", None),
        Err(LedgerError::NotFound(_))
    ));
    assert!(matches!(
        h.ledger.approve_withdrawal(&h.admin, "missing", None),
        Err(LedgerError::NotFound(_))
    ));
}

#[test]
fn admin_listings_filter_by_status() {
    let h = Harness::new();
    let user = h.user("rami");
    h.fund(&user, 100_000);
    let a = h
        .ledger
        .request_withdrawal(&user, 10_000, "0780", None)
        .unwrap();
    h.ledger
        .request_withdrawal(&user, 20_000, "0780", Some("books"))
        .unwrap();
    h.ledger.approve_withdrawal(&h.admin, &a.id, None).unwrap();

    let pending = h
        .ledger
        .all_withdrawals(&h.admin, Some(WithdrawalStatus::Pending), SortOrder::Asc, 10)
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_notes.as_deref(), Some("books"));
    assert_eq!(h.ledger.my_withdrawals(&user, SortOrder::Desc, 10).unwrap().len(), 2);

    let verified = h
        .ledger
        .all_charges(&h.admin, Some(ChargeStatus::Verified), SortOrder::Desc, 10)
        .unwrap();
    assert_eq!(verified.len(), 1);
    assert_eq!(h.ledger.my_charges(&user, SortOrder::Desc, 10).unwrap().len(), 1);
}

#[test]
fn inbox_is_private_to_its_owner() {
    let h = Harness::new();
    let user = h.user("hiba");
    let other = h.user("sami");
    h.fund(&user, 5_000);

    let inbox = h.ledger.inbox(&user, true, 10).unwrap();
    assert_eq!(inbox.unread, 1);
    let id = inbox.notifications[0].id.clone();

    assert!(matches!(
        h.ledger.mark_read(&other, &id),
        Err(LedgerError::NotFound(_))
    ));
    h.ledger.mark_read(&user, &id).unwrap();
    assert_eq!(h.ledger.inbox(&user, true, 10).unwrap().unread, 0);
    assert_eq!(h.ledger.mark_all_read(&user).unwrap(), 0);
}
