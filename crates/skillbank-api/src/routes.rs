use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::middleware::require_auth;
use crate::proofs::MAX_PROOF_SIZE;
use crate::state::AppState;
use crate::{auth, charges, notifications, payments, proofs, roles, wallet, withdrawals};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Every HTTP route. Tracing and CORS layers are added by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/wallet", get(wallet::get_wallet))
        .route("/wallet/entries", get(wallet::get_entries))
        .route("/wallet/reconcile/{user_id}", get(wallet::reconcile))
        .route(
            "/proofs",
            post(proofs::upload_proof).layer(DefaultBodyLimit::max(MAX_PROOF_SIZE)),
        )
        .route("/proofs/{user_id}/{file}", get(proofs::get_proof))
        .route("/charges", post(charges::submit_charge).get(charges::my_charges))
        .route("/admin/charges", get(charges::all_charges))
        .route("/admin/charges/{id}/verify", post(charges::verify_charge))
        .route("/admin/charges/{id}/reject", post(charges::reject_charge))
        .route(
            "/withdrawals",
            post(withdrawals::request_withdrawal).get(withdrawals::my_withdrawals),
        )
        .route("/admin/withdrawals", get(withdrawals::all_withdrawals))
        .route(
            "/admin/withdrawals/{id}/approve",
            post(withdrawals::approve_withdrawal),
        )
        .route(
            "/admin/withdrawals/{id}/reject",
            post(withdrawals::reject_withdrawal),
        )
        .route("/payments", post(payments::send_payment).get(payments::my_payments))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/admin/roles", post(roles::assign_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use skillbank_db::Database;
    use skillbank_ledger::{Ledger, LedgerLimits};
    use tower::ServiceExt;

    use super::*;
    use crate::proofs::ProofStore;
    use crate::state::AppStateInner;

    async fn test_app() -> Router {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let dir = std::env::temp_dir().join(format!("skillbank-api-{}", uuid::Uuid::new_v4()));
        let state = Arc::new(AppStateInner {
            ledger: Ledger::new(db, LedgerLimits::default()),
            jwt_secret: "test-secret".into(),
            proofs: ProofStore::new(dir, "http://localhost:3000").await.unwrap(),
            owner_username: Some("boss".into()),
        });
        router(state)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        read(app.clone().oneshot(req).await.unwrap()).await
    }

    async fn read(resp: axum::response::Response) -> (StatusCode, Value) {
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(app: &Router, username: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": username, "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn upload_proof(app: &Router, token: &str) -> String {
        let req = Request::builder()
            .method("POST")
            .uri("/proofs")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(format!("\u{89}PNG {}", uuid::Uuid::new_v4())))
            .unwrap();
        let (status, body) = read(app.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["path"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public_and_wallet_is_not() {
        let app = test_app().await;
        let (status, _) = call(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "GET", "/wallet", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, _) = call(&app, "GET", "/wallet", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn registration_and_login() {
        let app = test_app().await;
        register(&app, "boss").await;

        let (status, _) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "BOSS", "password": "another pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "boss", "password": "wrong password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "boss", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roles"], json!(["owner"]));
    }

    #[tokio::test]
    async fn deposit_payment_and_role_flow() {
        let app = test_app().await;
        let boss = register(&app, "boss").await;
        let student = register(&app, "student").await;
        let tutor = register(&app, "tutor").await;

        let proof_path = upload_proof(&app, &student).await;
        let (status, charge) = call(
            &app,
            "POST",
            "/charges",
            Some(&student),
            Some(json!({
                "amount": 25_000,
                "payer_phone": "07701234567",
                "external_txn_id": "ZC-1001",
                "proof_path": proof_path,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{charge}");
        let verify_uri = format!("/admin/charges/{}/verify", charge["id"].as_str().unwrap());

        let (status, _) = call(&app, "POST", &verify_uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, verified) = call(&app, "POST", &verify_uri, Some(&boss), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verified["status"], "verified");

        let (status, _) = call(&app, "POST", &verify_uri, Some(&boss), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, wallet) = call(&app, "GET", "/wallet", Some(&student), None).await;
        assert_eq!(wallet["balance"], 25_000);
        assert_eq!(wallet["reserved_balance"], 0);

        let (status, body) = call(
            &app,
            "POST",
            "/withdrawals",
            Some(&student),
            Some(json!({ "amount": 30_000, "destination": "07801112222" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("insufficient"));

        let (status, _) = call(
            &app,
            "POST",
            "/payments",
            Some(&student),
            Some(json!({ "recipient_username": "tutor", "amount": 5_000, "note": "essay review" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, inbox) = call(&app, "GET", "/notifications?unread=true", Some(&tutor), None).await;
        assert_eq!(inbox["unread"], 1);
        assert_eq!(inbox["notifications"][0]["kind"], "payment_received");

        // Roles are loaded per request, so the tutor's existing token picks up the grant.
        let (status, _) = call(&app, "GET", "/admin/charges", Some(&tutor), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, roles) = call(
            &app,
            "POST",
            "/admin/roles",
            Some(&boss),
            Some(json!({ "username": "tutor", "role": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(roles["roles"], json!(["admin"]));
        let (status, all) = call(
            &app,
            "GET",
            "/admin/charges?status=verified&order=asc",
            Some(&tutor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn oversized_proof_gets_json_error() {
        let app = test_app().await;
        let student = register(&app, "student").await;

        let req = Request::builder()
            .method("POST")
            .uri("/proofs")
            .header(header::AUTHORIZATION, format!("Bearer {student}"))
            .header(header::CONTENT_TYPE, "image/jpeg")
            .body(Body::from(vec![0u8; MAX_PROOF_SIZE + 1]))
            .unwrap();
        let (status, body) = read(app.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "proof exceeds 10 MB");

        let req = Request::builder()
            .method("POST")
            .uri("/proofs")
            .header(header::AUTHORIZATION, format!("Bearer {student}"))
            .header(header::CONTENT_TYPE, "image/jpeg")
            .body(Body::empty())
            .unwrap();
        let (status, body) = read(app.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "proof file is empty");
    }

    #[tokio::test]
    async fn concurrent_registrations_conflict_instead_of_failing() {
        let app = test_app().await;
        let attempts = (0..6).map(|_| {
            call(
                &app,
                "POST",
                "/auth/register",
                None,
                Some(json!({ "username": "student", "password": "correct horse" })),
            )
        });
        let statuses: Vec<StatusCode> = futures_util::future::join_all(attempts)
            .await
            .into_iter()
            .map(|(status, _)| status)
            .collect();

        assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
        assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 5);
    }

    #[tokio::test]
    async fn proofs_are_private_to_uploader_and_admins() {
        let app = test_app().await;
        let boss = register(&app, "boss").await;
        let student = register(&app, "student").await;
        let other = register(&app, "other").await;

        let path = upload_proof(&app, &student).await;
        let uri = format!("/proofs/{path}");

        let (status, _) = call(&app, "GET", &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let req = Request::builder()
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {boss}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");

        let req = Request::builder()
            .method("POST")
            .uri("/proofs")
            .header(header::AUTHORIZATION, format!("Bearer {student}"))
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
