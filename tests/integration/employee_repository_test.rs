// Integration tests for the employee repository over the in-memory store
//
// Covers:
// - create/get round trip, including repository-assigned ids
// - validation failures that never reach the store
// - not-found as an empty result for point reads
// - idempotent delete
// - department listing across multiple result pages
// - store failures other than a missing document surfacing unchanged

#[path = "../helpers/mod.rs"]
mod helpers;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use employee_directory::core::AppError;
use employee_directory::employees::{
    Address, Department, DocumentEmployeeRepository, EmployeeRepository,
};
use employee_directory::store::{
    CollectionLink, DocumentQuery, DocumentStore, DocumentStoreAdapter, InMemoryDocumentStore,
    QueryPage, ResourceStatus, StoreError, StoreErrorKind, StoreResult, SUB_STATUS_OWNER_MISSING,
};

use helpers::*;

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let ctx = test_context().await;
    let department_id = TestDataFactory::random_department_id();
    let employee = TestDataFactory::employee(&department_id)
        .with_id("emp-001")
        .with_address(Address::new("1 Main St", "Springfield").unwrap());

    let created = ctx.repository.create(employee.clone()).await.unwrap();
    assert_eq!(created, employee);

    let fetched = ctx
        .repository
        .get_by_id("emp-001", &department_id)
        .await
        .unwrap()
        .expect("employee exists");
    assert_eq!(fetched, employee);
}

#[tokio::test]
async fn test_scenario_create_get_delete() {
    let ctx = test_context().await;
    let employee = TestDataFactory::employee("ENG");

    let created = ctx.repository.create(employee).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.first_name.as_str(), "Joe");

    let fetched = ctx
        .repository
        .get_by_id(&created.id, "ENG")
        .await
        .unwrap()
        .expect("created employee is readable");
    assert_eq!(fetched, created);

    ctx.repository.delete(&created.id, "ENG").await.unwrap();

    let after_delete = ctx.repository.get_by_id(&created.id, "ENG").await.unwrap();
    assert!(after_delete.is_none());
}

#[tokio::test]
async fn test_blank_ids_are_distinct() {
    let ctx = test_context().await;
    let department_id = TestDataFactory::random_department_id();

    let mut ids = HashSet::new();
    for _ in 0..25 {
        let created = ctx
            .repository
            .create(TestDataFactory::employee(&department_id).with_id("   "))
            .await
            .unwrap();
        assert!(!created.id.trim().is_empty());
        ids.insert(created.id);
    }

    assert_eq!(ids.len(), 25);
}

#[tokio::test]
async fn test_create_without_department_never_touches_store() {
    let ctx = test_context().await;
    let mut employee = TestDataFactory::employee("ENG");
    employee.department = None;

    let before = ctx.store.document_operations();
    let err = ctx.repository.create(employee).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(ctx.store.document_operations(), before);
}

#[tokio::test]
async fn test_create_with_blank_department_id_is_validation_error() {
    let ctx = test_context().await;
    let mut employee = TestDataFactory::employee("ENG");
    employee.department = Some(Department::new(" "));

    let before = ctx.store.document_operations();
    let err = ctx.repository.create(employee).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(ctx.store.document_operations(), before);
}

#[tokio::test]
async fn test_create_conflict_does_not_overwrite() {
    let ctx = test_context().await;
    let department_id = TestDataFactory::random_department_id();
    let original = TestDataFactory::employee(&department_id).with_id("dup");
    ctx.repository.create(original.clone()).await.unwrap();

    let duplicate = original.clone().with_position("Manager");
    let err = ctx.repository.create(duplicate).await.unwrap_err();
    match err {
        AppError::Store(store_err) => assert_eq!(store_err.kind, StoreErrorKind::Conflict),
        other => panic!("expected store conflict, got {:?}", other),
    }

    let stored = ctx
        .repository
        .get_by_id("dup", &department_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.position, "Engineer");
}

#[tokio::test]
async fn test_get_missing_is_none() {
    let ctx = test_context().await;
    let result = ctx
        .repository
        .get_by_id("does-not-exist", &TestDataFactory::random_department_id())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_get_with_wrong_partition_is_none() {
    let ctx = test_context().await;
    let created = ctx
        .repository
        .create(TestDataFactory::employee("ENG"))
        .await
        .unwrap();

    let result = ctx.repository.get_by_id(&created.id, "OPS").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_get_with_blank_arguments_is_validation_error() {
    let ctx = test_context().await;
    assert!(matches!(
        ctx.repository.get_by_id("", "ENG").await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        ctx.repository.get_by_id("emp-1", "  ").await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_update_replaces_document() {
    let ctx = test_context().await;
    let department_id = TestDataFactory::random_department_id();
    let created = ctx
        .repository
        .create(TestDataFactory::employee(&department_id))
        .await
        .unwrap();

    let changed = created.clone().with_position("Principal Engineer");
    let updated = ctx.repository.update(changed.clone()).await.unwrap();
    assert_eq!(updated, changed);

    let fetched = ctx
        .repository
        .get_by_id(&created.id, &department_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.position, "Principal Engineer");
}

#[tokio::test]
async fn test_update_missing_is_distinguishable_store_not_found() {
    let ctx = test_context().await;
    let employee = TestDataFactory::employee(&TestDataFactory::random_department_id()).with_id("ghost");

    let err = ctx.repository.update(employee).await.unwrap_err();
    assert!(err.is_store_not_found());
}

#[tokio::test]
async fn test_update_into_other_department_does_not_move_document() {
    let ctx = test_context().await;
    let created = ctx
        .repository
        .create(TestDataFactory::employee("ENG"))
        .await
        .unwrap();

    let mut moved = created.clone();
    moved.department = Some(Department::new("OPS"));
    let err = ctx.repository.update(moved).await.unwrap_err();
    assert!(err.is_store_not_found());

    let still_there = ctx.repository.get_by_id(&created.id, "ENG").await.unwrap();
    assert_eq!(still_there, Some(created));
}

#[tokio::test]
async fn test_update_validation_happens_before_store() {
    let ctx = test_context().await;
    let before = ctx.store.document_operations();

    let mut blank_department = TestDataFactory::employee("ENG").with_id("emp-1");
    blank_department.department = Some(Department::new(""));
    assert!(matches!(
        ctx.repository.update(blank_department).await,
        Err(AppError::Validation(_))
    ));

    let blank_id = TestDataFactory::employee("ENG");
    assert!(matches!(
        ctx.repository.update(blank_id).await,
        Err(AppError::Validation(_))
    ));

    let mut no_department = TestDataFactory::employee("ENG").with_id("emp-1");
    no_department.department = None;
    assert!(matches!(
        ctx.repository.update(no_department).await,
        Err(AppError::Validation(_))
    ));

    assert_eq!(ctx.store.document_operations(), before);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let ctx = test_context().await;
    let department_id = TestDataFactory::random_department_id();
    let created = ctx
        .repository
        .create(TestDataFactory::employee(&department_id))
        .await
        .unwrap();

    ctx.repository.delete(&created.id, &department_id).await.unwrap();
    ctx.repository.delete(&created.id, &department_id).await.unwrap();

    let link = CollectionLink::new(DATABASE, COLLECTION);
    assert_eq!(ctx.store.document_count(&link).await, 0);
}

#[tokio::test]
async fn test_delete_requires_both_keys() {
    let ctx = test_context().await;
    let before = ctx.store.document_operations();

    assert!(matches!(
        ctx.repository.delete("", "ENG").await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        ctx.repository.delete("emp-1", "").await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(ctx.store.document_operations(), before);
}

#[tokio::test]
async fn test_list_by_department_drains_all_pages() {
    // page size 3 forces several continuation round trips
    let ctx = test_context_with_page_size(3).await;
    let department_id = TestDataFactory::random_department_id();
    let other_department = TestDataFactory::random_department_id();

    for number in 0..10 {
        ctx.repository
            .create(TestDataFactory::numbered_employee(&department_id, number))
            .await
            .unwrap();
    }
    ctx.repository
        .create(TestDataFactory::numbered_employee(&other_department, 99))
        .await
        .unwrap();

    let employees = ctx.repository.list_by_department(&department_id).await.unwrap();

    assert_eq!(employees.len(), 10);
    assert!(employees
        .iter()
        .all(|e| e.partition_key() == Some(department_id.as_str())));

    let numbers: HashSet<i32> = employees.iter().map(|e| e.employee_id).collect();
    assert_eq!(numbers, (0..10).collect::<HashSet<i32>>());
}

#[tokio::test]
async fn test_list_empty_department_returns_empty() {
    let ctx = test_context().await;
    let employees = ctx
        .repository
        .list_by_department(&TestDataFactory::random_department_id())
        .await
        .unwrap();
    assert!(employees.is_empty());
}

#[tokio::test]
async fn test_list_requires_department_id() {
    let ctx = test_context().await;
    assert!(matches!(
        ctx.repository.list_by_department(" ").await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_concurrent_creates_share_repository() {
    let ctx = test_context().await;
    let department_id = TestDataFactory::random_department_id();

    let mut handles = Vec::new();
    for number in 0..8 {
        let repository = ctx.repository.clone();
        let department_id = department_id.clone();
        handles.push(tokio::spawn(async move {
            repository
                .create(TestDataFactory::numbered_employee(&department_id, number))
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let employees = ctx.repository.list_by_department(&department_id).await.unwrap();
    assert_eq!(employees.len(), 8);
}

#[tokio::test]
async fn test_repository_rejects_foreign_partition_key_path() {
    let adapter = DocumentStoreAdapter::new(Arc::new(InMemoryDocumentStore::new()));
    let collection = adapter
        .initialize(DATABASE, COLLECTION, "/departmentId")
        .await
        .unwrap();

    let err = DocumentEmployeeRepository::new(collection).err().unwrap();
    assert!(matches!(err, AppError::Configuration(_)));
}

/// Store that provisions fine but fails every document call with one error
struct FailingStore {
    error: StoreError,
}

#[async_trait]
impl DocumentStore for FailingStore {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn ensure_database(&self, _database: &str) -> StoreResult<ResourceStatus> {
        Ok(ResourceStatus::Existing)
    }

    async fn ensure_collection(
        &self,
        _database: &str,
        _collection: &str,
        _partition_key_path: &str,
    ) -> StoreResult<ResourceStatus> {
        Ok(ResourceStatus::Existing)
    }

    async fn create_document(
        &self,
        _collection: &CollectionLink,
        _partition_key: &str,
        _document: Value,
    ) -> StoreResult<Value> {
        Err(self.error.clone())
    }

    async fn read_document(
        &self,
        _collection: &CollectionLink,
        _id: &str,
        _partition_key: &str,
    ) -> StoreResult<Value> {
        Err(self.error.clone())
    }

    async fn replace_document(
        &self,
        _collection: &CollectionLink,
        _id: &str,
        _partition_key: &str,
        _document: Value,
    ) -> StoreResult<Value> {
        Err(self.error.clone())
    }

    async fn delete_document(
        &self,
        _collection: &CollectionLink,
        _id: &str,
        _partition_key: &str,
    ) -> StoreResult<()> {
        Err(self.error.clone())
    }

    async fn query_documents(
        &self,
        _collection: &CollectionLink,
        _query: &DocumentQuery,
        _partition_key: Option<&str>,
        _continuation: Option<String>,
    ) -> StoreResult<QueryPage> {
        Err(self.error.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(self.error.clone())
    }
}

async fn failing_repository(error: StoreError) -> DocumentEmployeeRepository {
    let adapter = DocumentStoreAdapter::new(Arc::new(FailingStore { error }));
    let collection = adapter
        .initialize(DATABASE, COLLECTION, PARTITION_KEY_PATH)
        .await
        .unwrap();
    DocumentEmployeeRepository::new(collection).unwrap()
}

fn expect_store_error(result: Result<impl std::fmt::Debug, AppError>, expected: &StoreError) {
    match result {
        Err(AppError::Store(err)) => assert_eq!(&err, expected),
        other => panic!("expected store error {:?}, got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_throttling_surfaces_from_every_operation() {
    let throttled = StoreError::from_status(
        429,
        Some(3200),
        Some("TooManyRequests".to_string()),
        "Request rate is large",
    );
    let repository = failing_repository(throttled.clone()).await;

    expect_store_error(repository.get_by_id("emp-1", "ENG").await, &throttled);
    expect_store_error(repository.delete("emp-1", "ENG").await, &throttled);
    expect_store_error(repository.list_by_department("ENG").await, &throttled);
    expect_store_error(
        repository.create(TestDataFactory::employee("ENG")).await,
        &throttled,
    );
}

#[tokio::test]
async fn test_unavailable_store_is_not_an_empty_result() {
    let unavailable = StoreError::from_status(503, None, None, "Service Unavailable");
    let repository = failing_repository(unavailable.clone()).await;

    let err = repository.get_by_id("emp-1", "ENG").await.unwrap_err();
    match err {
        AppError::Store(err) => assert_eq!(err.kind, StoreErrorKind::Unavailable),
        other => panic!("expected store error, got {:?}", other),
    }
    expect_store_error(repository.delete("emp-1", "ENG").await, &unavailable);
}

#[tokio::test]
async fn test_missing_collection_is_not_a_missing_employee() {
    let gone = StoreError::from_status(
        404,
        Some(SUB_STATUS_OWNER_MISSING),
        Some("NotFound".to_string()),
        "Owner resource does not exist",
    );
    let repository = failing_repository(gone.clone()).await;

    expect_store_error(repository.get_by_id("emp-1", "ENG").await, &gone);
    expect_store_error(repository.delete("emp-1", "ENG").await, &gone);
}
