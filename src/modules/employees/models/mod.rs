mod employee;

pub use employee::{Address, Department, Employee, PersonName, PARTITION_KEY_PATH};
