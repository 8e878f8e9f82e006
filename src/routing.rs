//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::{
        HeaderValue, Method, StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error,
    auth::{auth_guard, post_log_in, post_log_out},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint,
        get_budget_shares_endpoint, get_budgets_endpoint, get_shared_budgets_endpoint,
        share_budget_endpoint, unshare_budget_endpoint, update_budget_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_endpoint,
        update_category_endpoint,
    },
    endpoints,
    summary::get_summary_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transactions_endpoint,
        update_transaction_endpoint,
    },
    user::{delete_user_endpoint, get_users_endpoint, register_user, update_user_endpoint},
};

/// Return a router with all the app's routes.
///
/// Only `cors_origin` may make cross-origin requests, and it may send cookies.
pub fn build_router(state: AppState, cors_origin: HeaderValue) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::USERS, post(register_user));

    let protected_routes = Router::new()
        .route(endpoints::USERS, get(get_users_endpoint))
        .route(
            endpoints::USER,
            put(update_user_endpoint).delete(delete_user_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(endpoints::BUDGET_SHARES, get(get_budget_shares_endpoint))
        .route(endpoints::SHARE_BUDGET, post(share_budget_endpoint))
        .route(endpoints::SHARED_BUDGETS, get(get_shared_budgets_endpoint))
        .route(endpoints::SHARE, delete(unshare_budget_endpoint))
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .allow_credentials(true);

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(cors)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod routing_tests {
    use axum::http::{
        HeaderValue, StatusCode,
        header::{ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN},
    };
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        auth::{COOKIE_TOKEN, PasswordHash, ValidatedPassword},
        endpoints::{self, format_endpoint},
        user::{Role, Username, create_user},
    };

    use super::build_router;

    const ALLOWED_ORIGIN: &str = "http://localhost:5173";

    fn get_test_server() -> (TestServer, AppState) {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "very secret",
            "Etc/UTC",
        )
        .unwrap();
        let hash = PasswordHash::new(ValidatedPassword::new_unchecked("adminpw"), 4).unwrap();
        create_user(
            Username::new_unchecked("admin"),
            hash,
            Role::Admin,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        let app = build_router(state.clone(), HeaderValue::from_static(ALLOWED_ORIGIN));

        (
            TestServer::new(app).expect("Could not create test server."),
            state,
        )
    }

    /// Add a user straight to the database, using a cheap hash so tests run fast.
    fn add_user(state: &AppState, username: &str, password: &str) -> i64 {
        let hash = PasswordHash::new(ValidatedPassword::new_unchecked(password), 4).unwrap();

        create_user(
            Username::new_unchecked(username),
            hash,
            Role::User,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .id
        .as_i64()
    }

    async fn log_in(server: &TestServer, username: &str, password: &str) -> Cookie<'static> {
        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"username": username, "password": password}))
            .await;
        response.assert_status_ok();

        response.cookie(COOKIE_TOKEN)
    }

    fn count_rows(state: &AppState, table: &str) -> i64 {
        state
            .db_connection
            .lock()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    #[tokio::test]
    async fn coffee_is_a_teapot() {
        let (server, _) = get_test_server();

        server
            .get(endpoints::COFFEE)
            .await
            .assert_status(StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let (server, _) = get_test_server();

        let response = server.get("/api/nope").await;

        response.assert_status_not_found();
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn protected_routes_require_log_in() {
        let (server, _) = get_test_server();

        for path in [
            endpoints::CATEGORIES,
            endpoints::TRANSACTIONS,
            endpoints::BUDGETS,
            endpoints::SHARED_BUDGETS,
            endpoints::SUMMARY,
            endpoints::USERS,
        ] {
            server
                .get(path)
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_with_credentials() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::COFFEE)
            .add_header(ORIGIN, HeaderValue::from_static(ALLOWED_ORIGIN))
            .await;

        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static(ALLOWED_ORIGIN))
        );
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some(&HeaderValue::from_static("true"))
        );
    }

    #[tokio::test]
    async fn cors_ignores_other_origins() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::COFFEE)
            .add_header(ORIGIN, HeaderValue::from_static("http://evil.example"))
            .await;

        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn spending_is_summarized_against_budget() {
        let (server, state) = get_test_server();
        add_user(&state, "alice", "alicepw");
        let cookie = log_in(&server, "alice", "alicepw").await;

        let category = server
            .post(endpoints::CATEGORIES)
            .add_cookie(cookie.clone())
            .json(&json!({"name": "Groceries"}))
            .await
            .json::<Value>();
        server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(cookie.clone())
            .json(&json!({
                "description": "Weekly shop",
                "amount": 125.50,
                "category_id": category["id"],
            }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(endpoints::BUDGETS)
            .add_cookie(cookie.clone())
            .json(&json!({"frequency": "monthly", "amount": 2500.00}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::BUDGETS)
            .add_cookie(cookie.clone())
            .json(&json!({"frequency": "monthly", "amount": 100}))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let summary = server
            .get(endpoints::SUMMARY)
            .add_cookie(cookie)
            .await
            .json::<Value>();
        assert_eq!(summary["budgets"][0]["spent"], 125.5);
        assert_eq!(summary["budgets"][0]["remaining"], 2374.5);
        assert_eq!(summary["budgets"][0]["over_budget"], false);
        assert_eq!(
            summary["spending_by_category"],
            json!([{"category": "Groceries", "total": 125.5}])
        );
    }

    #[tokio::test]
    async fn shared_budget_flow() {
        let (server, state) = get_test_server();
        add_user(&state, "alice", "alicepw");
        let bob_id = add_user(&state, "bob", "bobpw");
        let alice = log_in(&server, "alice", "alicepw").await;
        let bob = log_in(&server, "bob", "bobpw").await;
        let budget_id = server
            .post(endpoints::BUDGETS)
            .add_cookie(alice.clone())
            .json(&json!({"frequency": "weekly", "amount": 150}))
            .await
            .json::<Value>()["id"]
            .as_i64()
            .unwrap();

        server
            .post(endpoints::SHARE_BUDGET)
            .add_cookie(bob.clone())
            .json(&json!({"budget_id": budget_id, "to_user_id": bob_id}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        let share = server
            .post(endpoints::SHARE_BUDGET)
            .add_cookie(alice.clone())
            .json(&json!({"budget_id": budget_id, "to_user_id": bob_id}))
            .await;
        share.assert_status(StatusCode::CREATED);
        let share_id = share.json::<Value>()["id"].as_i64().unwrap();

        let shared = server
            .get(endpoints::SHARED_BUDGETS)
            .add_cookie(bob.clone())
            .await
            .json::<Value>();
        assert_eq!(shared[0]["id"], budget_id);
        server
            .get(&format_endpoint(endpoints::BUDGET, budget_id))
            .add_cookie(bob.clone())
            .await
            .assert_status_ok();
        server
            .put(&format_endpoint(endpoints::BUDGET, budget_id))
            .add_cookie(bob.clone())
            .json(&json!({"frequency": "weekly", "amount": 1}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let shares = server
            .get(&format_endpoint(endpoints::BUDGET_SHARES, budget_id))
            .add_cookie(alice.clone())
            .await
            .json::<Value>();
        assert_eq!(shares[0]["to_user_id"], bob_id);

        server
            .delete(&format_endpoint(endpoints::SHARE, share_id))
            .add_cookie(alice)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format_endpoint(endpoints::BUDGET, budget_id))
            .add_cookie(bob)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn deleting_user_removes_everything_they_own() {
        let (server, state) = get_test_server();
        let alice_id = add_user(&state, "alice", "alicepw");
        let bob_id = add_user(&state, "bob", "bobpw");
        let alice = log_in(&server, "alice", "alicepw").await;
        let category = server
            .post(endpoints::CATEGORIES)
            .add_cookie(alice.clone())
            .json(&json!({"name": "Rent"}))
            .await
            .json::<Value>();
        server
            .post(endpoints::TRANSACTIONS)
            .add_cookie(alice.clone())
            .json(&json!({"amount": 800, "category_id": category["id"]}))
            .await
            .assert_status(StatusCode::CREATED);
        let budget_id = server
            .post(endpoints::BUDGETS)
            .add_cookie(alice.clone())
            .json(&json!({"frequency": "yearly", "amount": 12000}))
            .await
            .json::<Value>()["id"]
            .as_i64()
            .unwrap();
        server
            .post(endpoints::SHARE_BUDGET)
            .add_cookie(alice.clone())
            .json(&json!({"budget_id": budget_id, "to_user_id": bob_id}))
            .await
            .assert_status(StatusCode::CREATED);

        let bob = log_in(&server, "bob", "bobpw").await;
        server
            .delete(&format_endpoint(endpoints::USER, alice_id))
            .add_cookie(bob)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let admin = log_in(&server, "admin", "adminpw").await;
        server
            .delete(&format_endpoint(endpoints::USER, alice_id))
            .add_cookie(admin)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        for table in ["category", "transaction", "budget", "shared_budget"] {
            assert_eq!(count_rows(&state, table), 0, "rows left in {table}");
        }
        assert_eq!(count_rows(&state, "user"), 2);
        server
            .get(endpoints::BUDGETS)
            .add_cookie(alice)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_with_wrong_password_is_unauthorized() {
        let (server, state) = get_test_server();
        add_user(&state, "alice", "alicepw");

        let wrong_password = server
            .post(endpoints::LOG_IN)
            .json(&json!({"username": "alice", "password": "nope"}))
            .await;
        let unknown_user = server
            .post(endpoints::LOG_IN)
            .json(&json!({"username": "mallory", "password": "nope"}))
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_user.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.text(), unknown_user.text());
    }
}
