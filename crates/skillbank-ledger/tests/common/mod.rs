#![allow(dead_code)]

use std::sync::Arc;

use skillbank_db::Database;
use skillbank_db::models::{BalanceRow, ChargeRow};
use skillbank_db::queries::users;
use skillbank_ledger::deposits::{ChargeClaim, ProofRef};
use skillbank_ledger::{Ledger, LedgerLimits};
use skillbank_types::models::{Principal, Role};
use uuid::Uuid;

pub struct Harness {
    pub ledger: Ledger,
    pub admin: Principal,
}

impl Harness {
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let ledger = Ledger::new(db, LedgerLimits::default());
        let admin = register(&ledger, "registrar");
        ledger
            .db()
            .with_tx(|tx| {
                Ok::<_, anyhow::Error>(users::grant_role(tx, &admin.id_string(), Role::Admin, None)?)
            })
            .unwrap();
        let admin = ledger.resolve_principal(admin.user_id).unwrap();
        Self { ledger, admin }
    }

    pub fn user(&self, username: &str) -> Principal {
        register(&self.ledger, username)
    }

    /// Registers `username` as the bootstrap owner.
    pub fn owner(&self, username: &str) -> Principal {
        self.ledger
            .register_user(Uuid::new_v4(), username, "argon2-hash", true)
            .unwrap()
    }

    pub fn claim(&self, user: &Principal, amount: i64) -> ChargeClaim {
        ChargeClaim {
            amount,
            payer_phone: "07701234567".into(),
            external_txn_id: format!("ZC-{}", Uuid::new_v4().simple()),
            proof: ProofRef {
                path: format!("{}/{}.png", user.user_id, Uuid::new_v4()),
                sha256: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            },
        }
    }

    /// Submits and verifies a deposit of `amount` for `user`.
    pub fn fund(&self, user: &Principal, amount: i64) -> ChargeRow {
        let charge = self
            .ledger
            .submit_charge(user, &self.claim(user, amount))
            .unwrap();
        self.ledger
            .verify_charge(&self.admin, &charge.id, None)
            .unwrap()
    }

    pub fn balance(&self, user: &Principal) -> BalanceRow {
        self.ledger.balance(user).unwrap()
    }

    /// Checks non-negativity and that the stored balance agrees with the
    /// ledger and the pending withdrawals.
    pub fn assert_consistent(&self, user: &Principal) {
        let report = self
            .ledger
            .reconcile(&self.admin, &user.id_string())
            .unwrap();
        assert!(report.balance >= 0, "{report:?}");
        assert!(report.reserved_balance >= 0, "{report:?}");
        assert!(report.is_consistent(), "{report:?}");
    }
}

fn register(ledger: &Ledger, username: &str) -> Principal {
    ledger
        .register_user(Uuid::new_v4(), username, "argon2-hash", false)
        .unwrap()
}
