#[macro_use]
extern crate time_test;

mod common;

use rocket::http::Status;
use rocket::tokio;
use serde_json::{Value, json};

use common::{employee_id, login_as, untracked_client};

#[tokio::test]
async fn test_create_employee() {
    let client = untracked_client().await;
    time_test!("test_create_employee");

    let manager = login_as(&client, "manager").await;
    let response = client
        .post("/api/1/employees")
        .cookie(manager.clone())
        .json(&json!({
            "name": "Erin Green",
            "username": "erin",
            "password": "pa55word",
            "email": "erin@example.com",
            "phone_number": "+1 555 0199"
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let erin: Value = response.into_json().await.unwrap();
    assert_eq!(erin["role"], "user");
    assert_eq!(erin["total_vacation_days"], 30);
    assert_eq!(erin["max_sessions"], 1);
    assert_eq!(erin["phone_number"], "+1 555 0199");
    assert!(erin.get("password_hash").is_none());

    let response = client
        .post("/api/1/login")
        .json(&json!({ "username": "erin", "password": "pa55word" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // Username, email and display name must be unique.
    for body in [
        json!({ "name": "Other", "username": "erin", "password": "x" }),
        json!({ "name": "Other", "username": "other", "password": "x", "email": "erin@example.com" }),
        json!({ "name": "Erin Green", "username": "other", "password": "x" }),
    ] {
        let response = client
            .post("/api/1/employees")
            .cookie(manager.clone())
            .json(&body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);
    }

    let response = client
        .post("/api/1/employees")
        .cookie(manager.clone())
        .json(&json!({ "name": "Frank", "username": "frank", "password": "x", "role": "boss" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let exists: Value = client
        .get("/api/1/employees/exists?name=Erin%20Green&username=nobody")
        .cookie(manager)
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(exists["name_exists"], true);
    assert_eq!(exists["username_exists"], false);
    assert!(exists["email_exists"].is_null());
}

#[tokio::test]
async fn test_employee_endpoints_require_admin() {
    let client = untracked_client().await;
    time_test!("test_employee_endpoints_require_admin");

    let alice = login_as(&client, "alice").await;
    let response = client
        .get("/api/1/employees")
        .cookie(alice.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .post("/api/1/employees")
        .cookie(alice)
        .json(&json!({ "name": "Mallory", "username": "mallory", "password": "x" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client.get("/api/1/employees").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[tokio::test]
async fn test_system_settings_validation() {
    let client = untracked_client().await;
    time_test!("test_system_settings_validation");

    let manager = login_as(&client, "manager").await;
    let bob_id = employee_id(&client, &manager, "bob").await;
    let url = format!("/api/1/employees/{}/settings", bob_id);

    let cases = [
        (json!({ "role": "boss", "total_vacation_days": 20, "max_sessions": 1, "username": "bob" }), Status::BadRequest),
        (json!({ "role": "user", "total_vacation_days": -1, "max_sessions": 1, "username": "bob" }), Status::BadRequest),
        (json!({ "role": "user", "total_vacation_days": 20, "max_sessions": 0, "username": "bob" }), Status::BadRequest),
        (json!({ "role": "user", "total_vacation_days": 20, "max_sessions": 101, "username": "bob" }), Status::BadRequest),
        (json!({ "role": "user", "total_vacation_days": 20, "max_sessions": 1, "username": "alice" }), Status::Conflict),
    ];
    for (body, expected) in cases {
        let response = client
            .put(url.as_str())
            .cookie(manager.clone())
            .json(&body)
            .dispatch()
            .await;
        assert_eq!(response.status(), expected, "{}", body);
    }

    let response = client
        .put(url.as_str())
        .cookie(manager)
        .json(&json!({ "role": "admin", "total_vacation_days": 25, "max_sessions": 3, "username": "robert" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let bob: Value = response.into_json().await.unwrap();
    assert_eq!(bob["role"], "admin");
    assert_eq!(bob["username"], "robert");
    assert_eq!(bob["total_vacation_days"], 25);
    assert_eq!(bob["max_sessions"], 3);
}

#[tokio::test]
async fn test_profile_is_editable_by_self_only() {
    let client = untracked_client().await;
    time_test!("test_profile_is_editable_by_self_only");

    let manager = login_as(&client, "manager").await;
    let alice_id = employee_id(&client, &manager, "alice").await;
    let bob_id = employee_id(&client, &manager, "bob").await;
    let alice = login_as(&client, "alice").await;

    let response = client
        .put(format!("/api/1/employees/{}/profile", alice_id))
        .cookie(alice.clone())
        .json(&json!({ "address": "1 Main Street", "birth_date": "1990-04-12" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let updated: Value = response.into_json().await.unwrap();
    assert_eq!(updated["address"], "1 Main Street");
    assert_eq!(updated["birth_date"], "1990-04-12");
    // Fields that were not sent keep their value.
    assert_eq!(updated["phone_number"], "+1 555 0100");

    let response = client
        .put(format!("/api/1/employees/{}/profile", bob_id))
        .cookie(alice.clone())
        .json(&json!({ "address": "Elsewhere" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .get(format!("/api/1/employees/{}", bob_id))
        .cookie(alice)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
}

#[tokio::test]
async fn test_change_password() {
    let client = untracked_client().await;
    time_test!("test_change_password");

    let carol = login_as(&client, "carol").await;
    let response = client
        .post("/api/1/me/password")
        .cookie(carol.clone())
        .json(&json!({ "current_password": "wrong", "new_password": "n3w" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .post("/api/1/me/password")
        .cookie(carol)
        .json(&json!({ "current_password": "admin", "new_password": "n3w" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .post("/api/1/login")
        .json(&json!({ "username": "carol", "password": "n3w" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // Admin reset without the old password.
    let manager = login_as(&client, "manager").await;
    let carol_id = employee_id(&client, &manager, "carol").await;
    let response = client
        .put(format!("/api/1/employees/{}/password", carol_id))
        .cookie(manager.clone())
        .json(&json!({ "new_password": "reset" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .put("/api/1/employees/9999/password")
        .cookie(manager)
        .json(&json!({ "new_password": "reset" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn test_hide_and_unhide() {
    let client = untracked_client().await;
    time_test!("test_hide_and_unhide");

    let manager = login_as(&client, "manager").await;
    let dave_id = employee_id(&client, &manager, "dave").await;

    let response = client
        .post(format!("/api/1/employees/{}/hide", dave_id))
        .cookie(manager.clone())
        .json(&json!({ "admin_password": "wrong" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .post(format!("/api/1/employees/{}/hide", dave_id))
        .cookie(manager.clone())
        .json(&json!({ "admin_password": "admin" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let hidden: Value = client
        .get("/api/1/employees/hidden")
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(hidden.as_array().unwrap().len(), 1);
    assert_eq!(hidden[0]["username"], "dave");

    let overview: Value = client
        .get("/api/1/employees/overview")
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert!(
        overview
            .as_array()
            .unwrap()
            .iter()
            .all(|row| row["employee"]["username"] != "dave")
    );

    let response = client
        .post(format!("/api/1/employees/{}/unhide", dave_id))
        .cookie(manager.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let hidden: Value = client
        .get("/api/1/employees/hidden")
        .cookie(manager)
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert!(hidden.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_overview_of_regular_employee_is_own_row() {
    let client = untracked_client().await;
    time_test!("test_overview_of_regular_employee_is_own_row");

    let alice = login_as(&client, "alice").await;
    let overview: Value = client
        .get("/api/1/employees/overview")
        .cookie(alice)
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    let rows = overview.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["employee"]["username"], "alice");
    assert_eq!(rows[0]["active_session_count"], 1);
    assert_eq!(rows[0]["remaining_days"], 30);
}

#[tokio::test]
async fn test_permanent_delete() {
    let client = untracked_client().await;
    time_test!("test_permanent_delete");

    let bob = login_as(&client, "bob").await;
    client
        .post("/api/1/vacations")
        .cookie(bob)
        .json(&json!({ "start_date": "2030-06-01", "end_date": "2030-06-02" }))
        .dispatch()
        .await;

    let manager = login_as(&client, "manager").await;
    let bob_id = employee_id(&client, &manager, "bob").await;
    let manager_id = employee_id(&client, &manager, "manager").await;

    let response = client
        .delete(format!("/api/1/employees/{}/permanent", manager_id))
        .cookie(manager.clone())
        .json(&json!({ "admin_password": "admin" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .delete(format!("/api/1/employees/{}/permanent", bob_id))
        .cookie(manager.clone())
        .json(&json!({ "admin_password": "admin" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client
        .get(format!("/api/1/employees/{}", bob_id))
        .cookie(manager.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    // The admin's notification about bob's request lost its link.
    let notifications: Value = client
        .get("/api/1/notifications")
        .cookie(manager)
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert!(
        notifications
            .as_array()
            .unwrap()
            .iter()
            .all(|n| n["related_vacation_id"].is_null())
    );
}

#[tokio::test]
async fn test_new_vacation_year() {
    let client = untracked_client().await;
    time_test!("test_new_vacation_year");

    let manager = login_as(&client, "manager").await;
    let alice_id = employee_id(&client, &manager, "alice").await;

    // A vacation from an earlier year, filed by an admin so it is approved.
    client
        .post("/api/1/vacations")
        .cookie(manager.clone())
        .json(&json!({
            "employee_id": alice_id,
            "start_date": "2020-03-01",
            "end_date": "2020-03-05"
        }))
        .dispatch()
        .await;

    let employees: Value = client
        .get("/api/1/archive/employees")
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    let alice_row = employees
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"] == alice_id)
        .expect("alice listed");
    assert_eq!(alice_row["archivable_count"], 1);

    let response = client
        .post("/api/1/archive/new-year")
        .cookie(manager.clone())
        .json(&json!({ "employee_ids": [alice_id], "default_days": 28 }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let summary: Value = response.into_json().await.unwrap();
    assert_eq!(summary["archived_vacations"], 1);
    assert_eq!(summary["updated_employees"], 1);

    let archived: Value = client
        .get(format!("/api/1/employees/{}/vacations/archived?year=2020", alice_id))
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(archived.as_array().unwrap().len(), 1);

    let alice: Value = client
        .get(format!("/api/1/employees/{}", alice_id))
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(alice["total_vacation_days"], 28);

    let response = client
        .post("/api/1/archive/new-year")
        .cookie(manager)
        .json(&json!({ "employee_ids": [] }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}
