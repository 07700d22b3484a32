use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::models::employee::{EmployeeFilter, EmployeePayload};
use crate::services::employee::EmployeeService;

pub async fn get_employees(
    service: web::Data<EmployeeService>,
    query: web::Query<EmployeeFilter>,
) -> Result<HttpResponse, AppError> {
    let employees = service.list(&query).await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn get_employee(
    service: web::Data<EmployeeService>,
    employee_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee = service.get(&employee_id).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn create_employee(
    service: web::Data<EmployeeService>,
    new_employee: web::Json<EmployeePayload>,
) -> Result<HttpResponse, AppError> {
    let employee = service.create(new_employee.into_inner()).await?;
    Ok(HttpResponse::Created().json(employee))
}

pub async fn update_employee(
    service: web::Data<EmployeeService>,
    employee_id: web::Path<String>,
    updates: web::Json<EmployeePayload>,
) -> Result<HttpResponse, AppError> {
    let employee = service.update(&employee_id, updates.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn delete_employee(
    service: web::Data<EmployeeService>,
    employee_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service.delete(&employee_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted",
    })))
}
