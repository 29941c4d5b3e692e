//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde_json::json;

use crate::{
    AppState,
    account::{
        adjust_balance_endpoint, get_account_endpoint, get_accounts_endpoint,
        update_family_target_endpoint, update_target_endpoint,
    },
    endpoints,
    history::{get_adjustment_history_endpoint, get_target_history_endpoint},
    reset::reset_endpoint,
    summary::get_summary_endpoint,
    transaction::{
        bulk_delete_transactions_endpoint, create_transaction_endpoint,
        delete_transaction_endpoint, get_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::ACCOUNTS, get(get_accounts_endpoint))
        .route(endpoints::ACCOUNT, get(get_account_endpoint))
        .route(endpoints::ACCOUNT_TARGET, patch(update_target_endpoint))
        .route(endpoints::FAMILY_TARGET, patch(update_family_target_endpoint))
        .route(endpoints::ACCOUNT_BALANCE, patch(adjust_balance_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(
            endpoints::BULK_DELETE_TRANSACTIONS,
            post(bulk_delete_transactions_endpoint),
        )
        .route(endpoints::TARGET_HISTORY, get(get_target_history_endpoint))
        .route(
            endpoints::ADJUSTMENT_HISTORY,
            get(get_adjustment_history_endpoint),
        )
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .route(endpoints::RESET, post(reset_endpoint))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Report that the server is up.
async fn get_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_404_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, endpoints, endpoints::format_endpoint};

    use super::build_router;

    fn new_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn).expect("Could not initialise app state.");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn health_check_is_ok() {
        let server = new_test_server();

        let response = server.get("/api/health").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_routes_get_a_json_404() {
        let server = new_test_server();

        let response = server.get("/api/nonsense").await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn accounts_are_seeded_at_their_baselines() {
        let server = new_test_server();

        let response = server.get("/api/accounts").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let accounts = response.json::<Value>();
        assert_eq!(accounts.as_array().unwrap().len(), 2);
        assert_eq!(accounts[0]["name"], "Mummy");
        assert_eq!(accounts[0]["targetBalance"], 200_000.0);
        assert_eq!(accounts[1]["name"], "Vaibhav");
        assert_eq!(accounts[1]["actualBalance"], 100_000.0);
    }

    #[tokio::test]
    async fn spending_and_reimbursement_walkthrough() {
        let server = new_test_server();

        // Spend 4000 on groceries.
        let response = server
            .post("/api/transactions")
            .json(&json!({
                "accountId": 1,
                "type": "SPEND",
                "amount": 4000.0,
                "description": "groceries",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let receipt = response.json::<Value>();
        assert_eq!(receipt["account"]["actualBalance"], 196_000.0);
        let spend_id = receipt["transaction"]["id"].as_i64().unwrap();

        let summary = server.get("/api/summary").await.json::<Value>();
        assert_eq!(summary["familyShortfall"], 4000.0);

        // Papa reimburses 10000.
        let response = server
            .post("/api/transactions")
            .json(&json!({
                "accountId": 1,
                "type": "PAPA_TOPUP",
                "amount": 10_000.0,
                "description": "reimbursement",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(
            response.json::<Value>()["account"]["actualBalance"],
            206_000.0
        );

        let summary = server.get("/api/summary").await.json::<Value>();
        assert_eq!(summary["accounts"][0]["shortfall"], -6000.0);
        assert_eq!(summary["familyShortfall"], 0.0);

        // Deleting the spend adds the 4000 back.
        let response = server
            .delete(&format_endpoint(endpoints::TRANSACTION, spend_id))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["actualBalance"], 210_000.0);

        let summary = server.get("/api/summary").await.json::<Value>();
        assert_eq!(summary["accounts"][0]["shortfall"], -10_000.0);
    }

    #[tokio::test]
    async fn overspending_is_rejected_with_bad_request() {
        let server = new_test_server();

        let response = server
            .post("/api/transactions")
            .json(&json!({
                "accountId": 2,
                "type": "SPEND",
                "amount": 999_999.0,
                "description": "a yacht",
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"].is_string());

        let accounts = server.get("/api/accounts").await.json::<Value>();
        assert_eq!(accounts[1]["actualBalance"], 100_000.0);
    }

    #[tokio::test]
    async fn family_target_update_splits_two_to_one_and_leaves_an_audit_trail() {
        let server = new_test_server();

        let response = server
            .patch("/api/accounts/family_target")
            .json(&json!({ "newTotal": 300_000.0, "reason": "raise" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let accounts = response.json::<Value>();
        assert_eq!(accounts[0]["targetBalance"], 200_000.0);
        assert_eq!(accounts[1]["targetBalance"], 100_000.0);

        let history = server.get("/api/history/targets").await.json::<Value>();
        let records = history.as_array().unwrap();
        assert_eq!(records.len(), 2);
        for record in records {
            assert_eq!(record["changeAmount"], 0.0);
            assert_eq!(record["reason"], "[Global Update] raise");
        }
    }

    #[tokio::test]
    async fn balance_adjustment_is_audited_but_not_in_the_ledger() {
        let server = new_test_server();

        let response = server
            .patch("/api/accounts/1/balance")
            .json(&json!({ "newActual": 195_000.0, "reason": "bank statement" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["actualBalance"], 195_000.0);

        let transactions = server.get("/api/transactions").await.json::<Value>();
        assert_eq!(transactions.as_array().unwrap().len(), 0);

        let history = server.get("/api/history/adjustments").await.json::<Value>();
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["oldActualBalance"], 200_000.0);
        assert_eq!(history[0]["newActualBalance"], 195_000.0);
    }

    #[tokio::test]
    async fn reset_restores_the_baseline_from_any_state() {
        let server = new_test_server();

        server
            .post("/api/transactions")
            .json(&json!({
                "accountId": 1,
                "type": "SPEND",
                "amount": 50.0,
                "description": "stationery",
            }))
            .await;
        server
            .patch("/api/accounts/2/target")
            .json(&json!({ "newTarget": 150_000.0, "reason": "growing up" }))
            .await;

        let response = server.post("/api/reset").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let accounts = response.json::<Value>();
        assert_eq!(accounts[0]["actualBalance"], 200_000.0);
        assert_eq!(accounts[1]["targetBalance"], 100_000.0);

        let transactions = server.get("/api/transactions").await.json::<Value>();
        assert_eq!(transactions.as_array().unwrap().len(), 0);
        let history = server.get("/api/history/targets").await.json::<Value>();
        assert_eq!(history.as_array().unwrap().len(), 0);
    }
}
