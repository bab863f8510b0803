use std::sync::Arc;

use crate::core::error::AppError;
use crate::modules::employees::models::{Department, Employee};
use crate::modules::employees::repositories::EmployeeRepository;

/// Service for employee business logic
pub struct EmployeeService {
    repository: Arc<dyn EmployeeRepository>,
}

impl EmployeeService {
    pub fn new(repository: Arc<dyn EmployeeRepository>) -> Self {
        Self { repository }
    }

    /// Get employee by id within its department
    pub async fn get_employee(
        &self,
        employee_id: &str,
        department_id: &str,
    ) -> Result<Employee, AppError> {
        self.repository
            .get_by_id(employee_id, department_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Employee '{}' not found in department '{}'",
                    employee_id, department_id
                ))
            })
    }

    /// Create a new employee. `None` models an absent (null) request body.
    pub async fn create_employee(&self, employee: Option<Employee>) -> Result<Employee, AppError> {
        let employee = require_employee(employee)?;
        self.repository.create(employee).await
    }

    /// Replace an existing employee
    pub async fn update_employee(&self, employee: Option<Employee>) -> Result<Employee, AppError> {
        let employee = require_employee(employee)?;
        self.repository.update(employee).await
    }

    /// Delete an employee; absent employees are not an error
    pub async fn delete_employee(
        &self,
        employee_id: &str,
        department_id: &str,
    ) -> Result<(), AppError> {
        self.repository.delete(employee_id, department_id).await
    }

    /// List all employees of a department
    pub async fn list_department_employees(
        &self,
        department_id: &str,
    ) -> Result<Vec<Employee>, AppError> {
        self.repository.list_by_department(department_id).await
    }

    /// Move an employee to another department.
    ///
    /// Documents cannot change partition in place, so the employee is
    /// recreated under the new department with the same id and the original
    /// document is deleted afterwards.
    pub async fn transfer_employee(
        &self,
        employee_id: &str,
        from_department_id: &str,
        to_department: Department,
    ) -> Result<Employee, AppError> {
        if to_department.department_id.trim().is_empty() {
            return Err(AppError::validation("Target department id is required"));
        }
        if to_department.department_id.trim() == from_department_id.trim() {
            return Err(AppError::validation(format!(
                "Employee '{}' already belongs to department '{}'",
                employee_id, from_department_id
            )));
        }

        let mut employee = self.get_employee(employee_id, from_department_id).await?;
        let target_department_id = to_department.department_id.clone();
        employee.department = Some(to_department);

        let moved = self.repository.create(employee).await?;

        if let Err(err) = self.repository.delete(employee_id, from_department_id).await {
            tracing::error!(
                employee_id,
                from_department_id,
                to_department_id = %target_department_id,
                "Failed to remove original document after transfer; rolling back: {}",
                err
            );
            if let Err(rollback) = self.repository.delete(&moved.id, &target_department_id).await {
                tracing::error!(
                    employee_id,
                    to_department_id = %target_department_id,
                    "Rollback of transferred copy failed: {}",
                    rollback
                );
            }
            return Err(err);
        }

        tracing::info!(
            employee_id,
            from_department_id,
            to_department_id = %target_department_id,
            "Transferred employee"
        );

        Ok(moved)
    }
}

fn require_employee(employee: Option<Employee>) -> Result<Employee, AppError> {
    employee.ok_or_else(|| AppError::validation("Employee is required"))
}
