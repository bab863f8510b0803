// Employees module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{Address, Department, Employee, PersonName};
pub use repositories::{DocumentEmployeeRepository, EmployeeRepository};
pub use services::EmployeeService;
