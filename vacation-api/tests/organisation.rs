#[macro_use]
extern crate time_test;

mod common;

use rocket::http::Status;
use rocket::tokio;
use serde_json::{Value, json};

use common::{login_as, untracked_client};

#[tokio::test]
async fn test_department_and_position_crud() {
    let client = untracked_client().await;
    time_test!("test_department_and_position_crud");

    let manager = login_as(&client, "manager").await;
    let response = client
        .post("/api/1/departments")
        .cookie(manager.clone())
        .json(&json!({ "name": "Finance", "description": "Money" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let finance: Value = response.into_json().await.unwrap();
    let finance_id = finance["id"].as_i64().unwrap();

    let response = client
        .post("/api/1/departments")
        .cookie(manager.clone())
        .json(&json!({ "name": "Finance" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let response = client
        .post("/api/1/positions")
        .cookie(manager.clone())
        .json(&json!({ "name": "Accountant", "department_id": finance_id }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let accountant: Value = response.into_json().await.unwrap();
    let accountant_id = accountant["id"].as_i64().unwrap();

    let response = client
        .post("/api/1/positions")
        .cookie(manager.clone())
        .json(&json!({ "name": "Ghost", "department_id": 9999 }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    let positions: Value = client
        .get("/api/1/positions")
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    let row = positions
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == accountant_id)
        .expect("accountant listed");
    assert_eq!(row["department_name"], "Finance");

    // A department that still has positions cannot go.
    let response = client
        .delete(format!("/api/1/departments/{}", finance_id))
        .cookie(manager.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let response = client
        .put(format!("/api/1/positions/{}", accountant_id))
        .cookie(manager.clone())
        .json(&json!({ "name": "Senior Accountant", "department_id": finance_id }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let renamed: Value = response.into_json().await.unwrap();
    assert_eq!(renamed["name"], "Senior Accountant");

    let response = client
        .delete(format!("/api/1/positions/{}", accountant_id))
        .cookie(manager.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client
        .delete(format!("/api/1/departments/{}", finance_id))
        .cookie(manager.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client
        .get(format!("/api/1/departments/{}", finance_id))
        .cookie(manager)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn test_deleting_position_clears_employees() {
    let client = untracked_client().await;
    time_test!("test_deleting_position_clears_employees");

    let manager = login_as(&client, "manager").await;
    let alice = login_as(&client, "alice").await;

    let me: Value = client
        .get("/api/1/employees/overview")
        .cookie(alice.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    let position_id = me[0]["employee"]["position_id"].as_i64().expect("fixture position");

    // Regular employees can read but not change the catalogue.
    let response = client
        .get("/api/1/positions")
        .cookie(alice.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let response = client
        .delete(format!("/api/1/positions/{}", position_id))
        .cookie(alice.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .delete(format!("/api/1/positions/{}", position_id))
        .cookie(manager)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let me: Value = client
        .get("/api/1/employees/overview")
        .cookie(alice)
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert!(me[0]["employee"]["position_id"].is_null());
}

#[tokio::test]
async fn test_error_reports() {
    let client = untracked_client().await;
    time_test!("test_error_reports");

    // Anonymous reports are accepted.
    let response = client
        .post("/api/1/errors")
        .json(&json!({ "traceback": "panic at startup" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);

    let bob = login_as(&client, "bob").await;
    let response = client
        .post("/api/1/errors")
        .cookie(bob.clone())
        .json(&json!({ "traceback": "calendar failed to render" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);

    let response = client.get("/api/1/errors").cookie(bob).dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);

    let manager = login_as(&client, "manager").await;
    let errors: Value = client
        .get("/api/1/errors")
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    let errors = errors.as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["traceback_text"], "calendar failed to render");
    assert_eq!(errors[0]["username"], "bob");
    assert_eq!(errors[0]["status"], "new");
    assert!(errors[1]["username"].is_null());

    let first_id = errors[0]["id"].as_i64().unwrap();
    let response = client
        .put(format!("/api/1/errors/{}/resolved", first_id))
        .cookie(manager.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let second_id = errors[1]["id"].as_i64().unwrap();
    let response = client
        .delete(format!("/api/1/errors/{}", second_id))
        .cookie(manager.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let errors: Value = client
        .get("/api/1/errors")
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(errors.as_array().unwrap().len(), 1);
    assert_eq!(errors[0]["status"], "resolved");

    let response = client
        .delete(format!("/api/1/errors/{}", second_id))
        .cookie(manager)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn test_notifications_read_and_delete() {
    let client = untracked_client().await;
    time_test!("test_notifications_read_and_delete");

    let dave = login_as(&client, "dave").await;
    for start in ["2030-09-01", "2030-09-10"] {
        client
            .post("/api/1/vacations")
            .cookie(dave.clone())
            .json(&json!({ "start_date": start, "end_date": start }))
            .dispatch()
            .await;
    }

    let manager = login_as(&client, "manager").await;
    let unread: Value = client
        .get("/api/1/notifications/unread-count")
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(unread["unread"], 2);

    let list: Value = client
        .get("/api/1/notifications")
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids[0] > ids[1], "newest first");

    // Someone else's ids are ignored.
    let affected: Value = client
        .post("/api/1/notifications/read")
        .cookie(dave)
        .json(&json!({ "ids": ids }))
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(affected["affected"], 0);

    let affected: Value = client
        .post("/api/1/notifications/read")
        .cookie(manager.clone())
        .json(&json!({ "ids": [ids[0]] }))
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(affected["affected"], 1);

    let affected: Value = client
        .post("/api/1/notifications/read")
        .cookie(manager.clone())
        .json(&json!({ "ids": [] }))
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(affected["affected"], 0);

    let unread: Value = client
        .get("/api/1/notifications/unread-count")
        .cookie(manager.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(unread["unread"], 1);

    let affected: Value = client
        .post("/api/1/notifications/delete")
        .cookie(manager.clone())
        .json(&json!({ "ids": ids }))
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(affected["affected"], 2);

    let list: Value = client
        .get("/api/1/notifications")
        .cookie(manager)
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert!(list.as_array().unwrap().is_empty());
}
