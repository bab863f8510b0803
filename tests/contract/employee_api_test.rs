// Contract tests for the employee HTTP API
//
// Exercises routes, status codes and the JSON error envelope over the
// in-memory store.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{http::StatusCode, test, App};
use serde_json::{json, Value};

use employee_directory::employees::Employee;
use employee_directory::middleware::{RequestId, REQUEST_ID_HEADER};

use helpers::*;

#[actix_web::test]
async fn test_create_employee_returns_201_with_generated_id() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().wrap(RequestId).configure(configure_app(&ctx))).await;

    let req = test::TestRequest::post()
        .uri("/employees")
        .set_json(TestDataFactory::employee_payload("ENG"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));

    let body: Value = test::read_body_json(resp).await;
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert_eq!(body["firstName"], "Joe");
    assert_eq!(body["lastName"], "Shenfield");
    assert_eq!(body["department"]["departmentId"], "ENG");
    assert_eq!(body["address"]["city"], "Springfield");
}

#[actix_web::test]
async fn test_get_employee_round_trip() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let req = test::TestRequest::post()
        .uri("/employees")
        .set_json(TestDataFactory::employee_payload("ENG"))
        .to_request();
    let created: Employee = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/employees/ENG/{}", created.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let fetched: Employee = test::read_body_json(resp).await;
    assert_eq!(fetched, created);
}

#[actix_web::test]
async fn test_get_missing_employee_returns_404_envelope() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let req = test::TestRequest::get()
        .uri("/employees/ENG/does-not-exist")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 404);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("does-not-exist"));
}

#[actix_web::test]
async fn test_null_body_is_bad_request() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let req = test::TestRequest::post()
        .uri("/employees")
        .insert_header(("content-type", "application/json"))
        .set_payload("null")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 400);
}

#[actix_web::test]
async fn test_short_name_is_bad_request() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let mut payload = TestDataFactory::employee_payload("ENG");
    payload["firstName"] = json!("J");

    let req = test::TestRequest::post()
        .uri("/employees")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("at least 2 characters"));
}

#[actix_web::test]
async fn test_missing_department_is_bad_request() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let mut payload = TestDataFactory::employee_payload("ENG");
    payload["department"] = Value::Null;

    let req = test::TestRequest::post()
        .uri("/employees")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.store.document_operations(), 0);
}

#[actix_web::test]
async fn test_duplicate_id_is_conflict() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let mut payload = TestDataFactory::employee_payload("ENG");
    payload["id"] = json!("emp-1");

    let req = test::TestRequest::post()
        .uri("/employees")
        .set_json(payload.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/employees")
        .set_json(payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_update_existing_and_missing() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let req = test::TestRequest::post()
        .uri("/employees")
        .set_json(TestDataFactory::employee_payload("ENG"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;

    let mut changed = created.clone();
    changed["position"] = json!("Staff Engineer");
    let req = test::TestRequest::put()
        .uri("/employees")
        .set_json(changed)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["position"], "Staff Engineer");

    let mut ghost = created;
    ghost["id"] = json!("ghost");
    let req = test::TestRequest::put()
        .uri("/employees")
        .set_json(ghost)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_delete_is_idempotent() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let req = test::TestRequest::post()
        .uri("/employees")
        .set_json(TestDataFactory::employee_payload("ENG"))
        .to_request();
    let created: Employee = test::call_and_read_body_json(&app, req).await;

    for _ in 0..2 {
        let req = test::TestRequest::delete()
            .uri(&format!("/employees/ENG/{}", created.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/employees/ENG/{}", created.id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_list_department_employees() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    for department_id in ["ENG", "ENG", "OPS"] {
        let req = test::TestRequest::post()
            .uri("/employees")
            .set_json(TestDataFactory::employee_payload(department_id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/departments/ENG/employees")
        .to_request();
    let employees: Vec<Employee> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(employees.len(), 2);
    assert!(employees.iter().all(|e| e.partition_key() == Some("ENG")));

    let req = test::TestRequest::get()
        .uri("/departments/HR/employees")
        .to_request();
    let employees: Vec<Employee> = test::call_and_read_body_json(&app, req).await;
    assert!(employees.is_empty());
}

#[actix_web::test]
async fn test_transfer_endpoint_moves_employee() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let req = test::TestRequest::post()
        .uri("/employees")
        .set_json(TestDataFactory::employee_payload("ENG"))
        .to_request();
    let created: Employee = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/employees/ENG/{}/transfer", created.id))
        .set_json(json!({ "departmentId": "OPS", "departmentName": "Operations" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let moved: Employee = test::read_body_json(resp).await;
    assert_eq!(moved.id, created.id);
    assert_eq!(moved.partition_key(), Some("OPS"));

    let req = test::TestRequest::get()
        .uri(&format!("/employees/ENG/{}", created.id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/employees/OPS/{}", created.id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_request_id_is_echoed() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().wrap(RequestId).configure(configure_app(&ctx))).await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((REQUEST_ID_HEADER, "req-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "req-123");
}

#[actix_web::test]
async fn test_ready_once_store_initialized() {
    let ctx = test_context().await;
    let app = test::init_service(App::new().configure(configure_app(&ctx))).await;

    let req = test::TestRequest::get().uri("/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ready"], true);
}
