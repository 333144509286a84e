#![allow(dead_code)]

use rocket::http::{Cookie, Status};
use rocket::local::asynchronous::Client;
use serde_json::json;

use vacation_api::orm::testing::{TEST_PASSWORD, test_rocket};

/// Client without cookie tracking, so one test can act as several employees.
pub async fn untracked_client() -> Client {
    Client::untracked(test_rocket())
        .await
        .expect("valid rocket instance")
}

/// Logs in a fixture employee and returns their session cookie.
pub async fn login_as(client: &Client, username: &str) -> Cookie<'static> {
    let response = client
        .post("/api/1/login")
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok, "login as {}", username);
    response
        .cookies()
        .get("session")
        .expect("session cookie")
        .clone()
}

/// Id of a fixture employee, looked up through the admin listing.
pub async fn employee_id(client: &Client, admin: &Cookie<'static>, username: &str) -> i64 {
    let response = client
        .get("/api/1/employees")
        .cookie(admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let employees: serde_json::Value = response.into_json().await.expect("employee list");
    employees
        .as_array()
        .expect("array")
        .iter()
        .find(|e| e["username"] == username)
        .and_then(|e| e["id"].as_i64())
        .expect("fixture employee")
}
