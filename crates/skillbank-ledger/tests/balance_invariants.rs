mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::Harness;
use skillbank_ledger::LedgerError;
use skillbank_types::models::{ChargeStatus, NotificationKind, SortOrder, WithdrawalStatus};

#[test]
fn reserved_tracks_pending_withdrawals_through_mixed_activity() {
    let h = Harness::new();
    let a = h.user("dana");
    let b = h.user("yahya");
    h.fund(&a, 200_000);
    h.fund(&b, 40_000);

    let w1 = h.ledger.request_withdrawal(&a, 50_000, "0770", None).unwrap();
    let w2 = h.ledger.request_withdrawal(&a, 25_000, "0770", None).unwrap();
    h.assert_consistent(&a);

    h.ledger.send_payment(&a, "yahya", 60_000, None).unwrap();
    let w3 = h.ledger.request_withdrawal(&b, 90_000, "0771", None).unwrap();
    h.assert_consistent(&b);

    h.ledger.approve_withdrawal(&h.admin, &w1.id, None).unwrap();
    h.ledger.reject_withdrawal(&h.admin, &w2.id, None).unwrap();
    h.ledger.reject_withdrawal(&h.admin, &w3.id, None).unwrap();

    // Overdraft attempts along the way change nothing.
    assert!(h.ledger.request_withdrawal(&a, 1_000_000, "0770", None).is_err());
    assert!(h.ledger.send_payment(&b, "dana", 1_000_000, None).is_err());

    for user in [&a, &b] {
        h.assert_consistent(user);
        assert_eq!(h.balance(user).reserved_balance, 0);
    }
    assert_eq!(h.balance(&a).balance, 200_000 - 50_000 - 60_000);
    assert_eq!(h.balance(&b).balance, 100_000);
}

#[test]
fn approval_only_releases_reserved_funds() {
    let h = Harness::new();
    let user = h.user("farah");
    h.fund(&user, 80_000);
    let request = h.ledger.request_withdrawal(&user, 12_000, "0790", None).unwrap();

    let before = h.balance(&user);
    h.ledger.approve_withdrawal(&h.admin, &request.id, None).unwrap();
    let after = h.balance(&user);

    assert_eq!(after.balance, before.balance);
    assert_eq!(after.reserved_balance, before.reserved_balance - 12_000);

    let second = h.ledger.approve_withdrawal(&h.admin, &request.id, None);
    assert!(matches!(second, Err(LedgerError::InvalidState { .. })));
    assert_eq!(h.balance(&user), after);
}

#[test]
fn rejection_restores_pre_request_total() {
    let h = Harness::new();
    let user = h.user("farah");
    h.fund(&user, 80_000);
    let start = h.balance(&user);

    let request = h.ledger.request_withdrawal(&user, 12_000, "0790", None).unwrap();
    let held = h.balance(&user);
    assert_eq!(held.total(), start.total());

    h.ledger.reject_withdrawal(&h.admin, &request.id, None).unwrap();
    let after = h.balance(&user);
    assert_eq!(after.balance, held.balance + 12_000);
    assert_eq!(after.reserved_balance, held.reserved_balance - 12_000);
    assert_eq!(after.total(), start.total());

    let resolved = h.ledger.my_withdrawals(&user, SortOrder::Desc, 1).unwrap();
    assert_eq!(resolved[0].status, WithdrawalStatus::Rejected);
}

#[test]
fn withdrawal_above_balance_is_refused_without_mutation() {
    let h = Harness::new();
    let user = h.user("bilal");
    h.fund(&user, 20_000);
    let before = h.balance(&user);
    let entries_before = h.ledger.entries(&user, SortOrder::Asc, 50).unwrap().len();

    let err = h
        .ledger
        .request_withdrawal(&user, 20_001, "0750", None)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds {
            available: 20_000,
            requested: 20_001
        }
    ));

    assert_eq!(h.balance(&user), before);
    assert_eq!(
        h.ledger.entries(&user, SortOrder::Asc, 50).unwrap().len(),
        entries_before
    );
    assert!(h.ledger.my_withdrawals(&user, SortOrder::Desc, 10).unwrap().is_empty());
}

#[test]
fn withdrawal_amount_limits_apply() {
    let h = Harness::new();
    let user = h.user("bilal");
    h.fund(&user, 20_000);
    assert!(matches!(
        h.ledger.request_withdrawal(&user, 4_999, "0750", None),
        Err(LedgerError::InvalidAmount { min: 5_000, .. })
    ));
    assert!(matches!(
        h.ledger.request_withdrawal(&user, 10_000, "   ", None),
        Err(LedgerError::Validation(_))
    ));
}

#[test]
fn concurrent_withdrawals_cannot_overdraw() {
    let h = Harness::new();
    let user = h.user("lina");
    h.fund(&user, 100_000);

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let ledger = h.ledger.clone();
            let user = user.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                ledger.request_withdrawal(&user, 60_000, "0770", None)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }), "{err}");
    }

    let after = h.balance(&user);
    assert_eq!((after.balance, after.reserved_balance), (40_000, 60_000));
    h.assert_consistent(&user);
}

#[test]
fn payment_rolls_back_when_credit_fails() {
    let h = Harness::new();
    let x = h.user("sara");
    let y = h.user("mina");
    h.fund(&x, 50_000);
    h.fund(&y, 1_000);

    let y_id = y.id_string();
    fail_balance_updates(&h, &y_id);

    let err = h
        .ledger
        .send_payment(&x, "mina", 20_000, None)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Database(_)), "{err}");

    assert_eq!(h.balance(&x).balance, 50_000);
    assert_eq!(h.balance(&y).balance, 1_000);
    assert!(h.ledger.my_payments(&x, SortOrder::Desc, 10).unwrap().is_empty());
    let inbox = h.ledger.db().list_notifications(&y_id, false, 10).unwrap();
    assert!(inbox.iter().all(|n| n.kind != NotificationKind::PaymentReceived));
    h.assert_consistent(&x);
}

#[test]
fn deposit_stays_pending_when_credit_fails() {
    let h = Harness::new();
    let user = h.user("zainab");
    let charge = h
        .ledger
        .submit_charge(&user, &h.claim(&user, 25_000))
        .unwrap();
    h.balance(&user);

    fail_balance_updates(&h, &user.id_string());
    let err = h
        .ledger
        .verify_charge(&h.admin, &charge.id, Some("matches statement"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Database(_)), "{err}");

    let charges = h.ledger.my_charges(&user, SortOrder::Desc, 10).unwrap();
    assert_eq!(charges[0].status, ChargeStatus::Pending);
    assert!(charges[0].verified_by.is_none());
    assert_eq!(h.balance(&user).balance, 0);
    assert!(h.ledger.entries(&user, SortOrder::Desc, 10).unwrap().is_empty());
    assert_eq!(h.ledger.inbox(&user, false, 10).unwrap().notifications.len(), 0);

    clear_fault(&h);
    h.ledger.verify_charge(&h.admin, &charge.id, None).unwrap();
    assert_eq!(h.balance(&user).balance, 25_000);
    h.assert_consistent(&user);
}

#[test]
fn withdrawal_stays_pending_when_refund_fails() {
    let h = Harness::new();
    let user = h.user("ali");
    h.fund(&user, 100_000);
    let request = h
        .ledger
        .request_withdrawal(&user, 30_000, "07801112222", None)
        .unwrap();

    fail_balance_updates(&h, &user.id_string());
    let err = h
        .ledger
        .reject_withdrawal(&h.admin, &request.id, Some("number does not match"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Database(_)), "{err}");

    let requests = h.ledger.my_withdrawals(&user, SortOrder::Desc, 10).unwrap();
    assert_eq!(requests[0].status, WithdrawalStatus::Pending);
    assert!(requests[0].resolved_at.is_none());
    let held = h.balance(&user);
    assert_eq!((held.balance, held.reserved_balance), (70_000, 30_000));
    h.assert_consistent(&user);

    clear_fault(&h);
    h.ledger.reject_withdrawal(&h.admin, &request.id, None).unwrap();
    let after = h.balance(&user);
    assert_eq!((after.balance, after.reserved_balance), (100_000, 0));
    h.assert_consistent(&user);
}

/// Makes every balance update for `user_id` abort until [`clear_fault`].
fn fail_balance_updates(h: &Harness, user_id: &str) {
    h.ledger
        .db()
        .with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE TEMP TRIGGER fail_balance_update BEFORE UPDATE ON balances
                 WHEN NEW.user_id = '{user_id}'
                 BEGIN SELECT RAISE(ABORT, 'injected fault'); END;"
            ))?;
            Ok(())
        })
        .unwrap();
}

fn clear_fault(h: &Harness) {
    h.ledger
        .db()
        .with_conn(|conn| {
            conn.execute_batch("DROP TRIGGER fail_balance_update")?;
            Ok(())
        })
        .unwrap();
}
