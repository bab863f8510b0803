// Employee repository over the department-partitioned document collection
//
// Implements:
// - Point read by (id, department) with not-found as an empty result
// - Create with repository-assigned ids, never overwriting
// - Full replace of an existing document (no upsert)
// - Idempotent delete
// - Department listing that drains every result page

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::core::{AppError, Record, Result};
use crate::modules::employees::models::{Employee, PARTITION_KEY_PATH};
use crate::store::{CollectionHandle, DocumentQuery, StoreError};

/// Persistence operations for employees
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Read one employee; `None` when no document exists for the pair
    async fn get_by_id(&self, employee_id: &str, department_id: &str) -> Result<Option<Employee>>;

    /// Insert a new employee, assigning an id when it is blank
    async fn create(&self, employee: Employee) -> Result<Employee>;

    /// Replace an existing employee document
    async fn update(&self, employee: Employee) -> Result<Employee>;

    /// Remove an employee; succeeds when it is already gone
    async fn delete(&self, employee_id: &str, department_id: &str) -> Result<()>;

    /// Every employee of one department, in store order
    async fn list_by_department(&self, department_id: &str) -> Result<Vec<Employee>>;
}

/// Employee repository backed by the bound document collection
pub struct DocumentEmployeeRepository {
    collection: Arc<CollectionHandle>,
}

impl DocumentEmployeeRepository {
    /// Bind to a collection partitioned on the employee department id
    pub fn new(collection: Arc<CollectionHandle>) -> Result<Self> {
        if collection.partition_key_path() != PARTITION_KEY_PATH {
            return Err(AppError::configuration(format!(
                "Collection {} is partitioned on {}, employees require {}",
                collection.link().resource_link(),
                collection.partition_key_path(),
                PARTITION_KEY_PATH
            )));
        }
        Ok(Self { collection })
    }
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} is required", what)));
    }
    Ok(())
}

/// Department id of an employee, validated for use as the partition key
fn partition_key_of(employee: &Employee) -> Result<String> {
    let department = employee
        .department
        .as_ref()
        .ok_or_else(|| AppError::validation("Employee department is required"))?;
    require(&department.department_id, "Department id")?;
    Ok(department.department_id.clone())
}

fn to_document(employee: &Employee) -> Result<Value> {
    serde_json::to_value(employee)
        .map_err(|e| AppError::internal(format!("Failed to serialize employee: {}", e)))
}

fn from_document(document: Value) -> Result<Employee> {
    serde_json::from_value(document).map_err(|e| {
        AppError::Store(StoreError::serialization(format!(
            "Stored employee document is malformed: {}",
            e
        )))
    })
}

/// Log a store failure with its detail and surface it unchanged
fn store_failure(operation: &'static str, err: StoreError) -> AppError {
    tracing::error!(
        operation,
        kind = %err.kind,
        status = ?err.status,
        sub_status = ?err.sub_status,
        code = ?err.code,
        "Document store request failed: {}",
        err.message
    );
    AppError::Store(err)
}

#[async_trait]
impl EmployeeRepository for DocumentEmployeeRepository {
    async fn get_by_id(&self, employee_id: &str, department_id: &str) -> Result<Option<Employee>> {
        require(employee_id, "Employee id")?;
        require(department_id, "Department id")?;

        match self.collection.read(employee_id, department_id).await {
            Ok(document) => Ok(Some(from_document(document)?)),
            Err(err) if err.is_document_not_found() => {
                tracing::debug!(employee_id, department_id, "Employee not found");
                Ok(None)
            }
            Err(err) => Err(store_failure("get_by_id", err)),
        }
    }

    async fn create(&self, mut employee: Employee) -> Result<Employee> {
        let partition_key = partition_key_of(&employee)?;

        if employee.id.trim().is_empty() {
            employee.id = Uuid::new_v4().to_string();
        }

        let document = to_document(&employee)?;
        let stored = self
            .collection
            .create(&partition_key, document)
            .await
            .map_err(|err| store_failure("create", err))?;

        tracing::info!(
            id = %employee.id,
            department_id = %partition_key,
            kind = %employee.kind(),
            "Created {}",
            employee.describe()
        );

        from_document(stored)
    }

    async fn update(&self, employee: Employee) -> Result<Employee> {
        require(&employee.id, "Employee id")?;
        let partition_key = partition_key_of(&employee)?;

        let document = to_document(&employee)?;
        let stored = self
            .collection
            .replace(&employee.id, &partition_key, document)
            .await
            .map_err(|err| store_failure("update", err))?;

        tracing::info!(id = %employee.id, department_id = %partition_key, "Replaced employee");

        from_document(stored)
    }

    async fn delete(&self, employee_id: &str, department_id: &str) -> Result<()> {
        require(employee_id, "Employee id")?;
        require(department_id, "Department id")?;

        match self.collection.delete(employee_id, department_id).await {
            Ok(()) => {
                tracing::info!(employee_id, department_id, "Deleted employee");
                Ok(())
            }
            Err(err) if err.is_document_not_found() => {
                tracing::warn!(
                    employee_id,
                    department_id,
                    "Employee to delete was not found; nothing to do"
                );
                Ok(())
            }
            Err(err) => Err(store_failure("delete", err)),
        }
    }

    async fn list_by_department(&self, department_id: &str) -> Result<Vec<Employee>> {
        require(department_id, "Department id")?;

        let query = DocumentQuery::field_equals(PARTITION_KEY_PATH, department_id);
        let mut employees = Vec::new();
        let mut continuation = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .collection
                .query_page(&query, Some(department_id), continuation.take())
                .await
                .map_err(|err| store_failure("list_by_department", err))?;
            pages += 1;

            for document in page.documents {
                employees.push(from_document(document)?);
            }

            match page.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        tracing::debug!(department_id, count = employees.len(), pages, "Listed department employees");

        Ok(employees)
    }
}
