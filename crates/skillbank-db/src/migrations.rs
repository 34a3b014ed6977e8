use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, roles, balances, ledger)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE TABLE user_roles (
                user_id     TEXT NOT NULL REFERENCES users(id),
                role        TEXT NOT NULL CHECK (role IN ('admin', 'owner')),
                granted_by  TEXT REFERENCES users(id),
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                PRIMARY KEY (user_id, role)
            );

            CREATE TABLE balances (
                user_id           TEXT PRIMARY KEY REFERENCES users(id),
                balance           INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                reserved_balance  INTEGER NOT NULL DEFAULT 0 CHECK (reserved_balance >= 0),
                version           INTEGER NOT NULL DEFAULT 0,
                updated_at        TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE TABLE ledger_entries (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id),
                kind            TEXT NOT NULL,
                source          TEXT NOT NULL,
                balance_delta   INTEGER NOT NULL,
                reserved_delta  INTEGER NOT NULL,
                balance_after   INTEGER NOT NULL,
                reserved_after  INTEGER NOT NULL,
                reference_id    TEXT,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE INDEX idx_ledger_entries_user
                ON ledger_entries(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (charges, withdrawals, payments)");
        conn.execute_batch(
            "
            CREATE TABLE charge_transactions (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL REFERENCES users(id),
                amount              INTEGER NOT NULL CHECK (amount > 0),
                payer_phone         TEXT NOT NULL,
                external_txn_id     TEXT NOT NULL,
                proof_path          TEXT NOT NULL,
                proof_sha256        TEXT NOT NULL,
                status              TEXT NOT NULL DEFAULT 'pending',
                verified_by         TEXT REFERENCES users(id),
                verification_notes  TEXT,
                verified_at         TEXT,
                created_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                updated_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            -- One live claim per external payment and per proof file
            CREATE UNIQUE INDEX idx_charges_external_txn
                ON charge_transactions(external_txn_id) WHERE status != 'rejected';
            CREATE UNIQUE INDEX idx_charges_proof
                ON charge_transactions(proof_sha256) WHERE status != 'rejected';
            CREATE INDEX idx_charges_status
                ON charge_transactions(status, created_at);

            CREATE TABLE withdrawal_requests (
                id           TEXT PRIMARY KEY,
                user_id      TEXT NOT NULL REFERENCES users(id),
                amount       INTEGER NOT NULL CHECK (amount > 0),
                destination  TEXT NOT NULL,
                user_notes   TEXT,
                status       TEXT NOT NULL DEFAULT 'pending',
                admin_id     TEXT REFERENCES users(id),
                admin_notes  TEXT,
                resolved_at  TEXT,
                created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                updated_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE INDEX idx_withdrawals_user_status
                ON withdrawal_requests(user_id, status);
            CREATE INDEX idx_withdrawals_status
                ON withdrawal_requests(status, created_at);

            CREATE TABLE payments (
                id            TEXT PRIMARY KEY,
                sender_id     TEXT NOT NULL REFERENCES users(id),
                recipient_id  TEXT NOT NULL REFERENCES users(id),
                amount        INTEGER NOT NULL CHECK (amount > 0),
                note          TEXT,
                status        TEXT NOT NULL DEFAULT 'completed',
                created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                CHECK (sender_id != recipient_id)
            );

            CREATE INDEX idx_payments_sender ON payments(sender_id, created_at);
            CREATE INDEX idx_payments_recipient ON payments(recipient_id, created_at);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    if version < 3 {
        info!("Running migration v3 (notification outbox)");
        conn.execute_batch(
            "
            CREATE TABLE notifications (
                id                 TEXT PRIMARY KEY,
                user_id            TEXT NOT NULL REFERENCES users(id),
                kind               TEXT NOT NULL,
                title              TEXT NOT NULL,
                body               TEXT NOT NULL,
                related_id         TEXT,
                read_at            TEXT,
                delivered_at       TEXT,
                delivery_attempts  INTEGER NOT NULL DEFAULT 0,
                last_error         TEXT,
                created_at         TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE INDEX idx_notifications_user
                ON notifications(user_id, created_at);
            CREATE INDEX idx_notifications_undelivered
                ON notifications(created_at) WHERE delivered_at IS NULL;

            INSERT INTO schema_version (version) VALUES (3);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
