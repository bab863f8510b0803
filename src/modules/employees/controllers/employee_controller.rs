use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::modules::employees::models::{Department, Employee};
use crate::modules::employees::services::EmployeeService;

/// Body of a department transfer request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEmployeeRequest {
    pub department_id: String,
    #[serde(default)]
    pub department_name: Option<String>,
}

impl From<TransferEmployeeRequest> for Department {
    fn from(request: TransferEmployeeRequest) -> Self {
        Department {
            department_id: request.department_id,
            department_name: request.department_name,
        }
    }
}

/// Get employee by id
/// GET /employees/{department_id}/{employee_id}
pub async fn get_employee(
    service: web::Data<Arc<EmployeeService>>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (department_id, employee_id) = path.into_inner();
    let employee = service.get_employee(&employee_id, &department_id).await?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Create a new employee
/// POST /employees
pub async fn create_employee(
    service: web::Data<Arc<EmployeeService>>,
    request: web::Json<Option<Employee>>,
) -> Result<HttpResponse, AppError> {
    let employee = service.create_employee(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(employee))
}

/// Replace an existing employee
/// PUT /employees
pub async fn update_employee(
    service: web::Data<Arc<EmployeeService>>,
    request: web::Json<Option<Employee>>,
) -> Result<HttpResponse, AppError> {
    let employee = service.update_employee(request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Delete an employee (idempotent)
/// DELETE /employees/{department_id}/{employee_id}
pub async fn delete_employee(
    service: web::Data<Arc<EmployeeService>>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (department_id, employee_id) = path.into_inner();
    service.delete_employee(&employee_id, &department_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// List employees of a department
/// GET /departments/{department_id}/employees
pub async fn list_department_employees(
    service: web::Data<Arc<EmployeeService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let department_id = path.into_inner();
    let employees = service.list_department_employees(&department_id).await?;

    Ok(HttpResponse::Ok().json(employees))
}

/// Move an employee to another department
/// POST /employees/{department_id}/{employee_id}/transfer
pub async fn transfer_employee(
    service: web::Data<Arc<EmployeeService>>,
    path: web::Path<(String, String)>,
    request: web::Json<TransferEmployeeRequest>,
) -> Result<HttpResponse, AppError> {
    let (department_id, employee_id) = path.into_inner();
    let employee = service
        .transfer_employee(&employee_id, &department_id, request.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Configure employee routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/employees")
            .route("", web::post().to(create_employee))
            .route("", web::put().to(update_employee))
            .route("/{department_id}/{employee_id}", web::get().to(get_employee))
            .route("/{department_id}/{employee_id}", web::delete().to(delete_employee))
            .route(
                "/{department_id}/{employee_id}/transfer",
                web::post().to(transfer_employee),
            ),
    )
    .service(
        web::scope("/departments")
            .route("/{department_id}/employees", web::get().to(list_department_employees)),
    );
}
