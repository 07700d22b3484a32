use actix_cors::Cors;
use actix_web::{error, web, HttpRequest};

use crate::errors::AppError;
use crate::handlers;

/// Base64 photos travel inside JSON bodies.
pub const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::validation(format!("Invalid JSON body: {}", err), Vec::new()).into()
}

/// Registers every route. Shared state (`EmployeeService`, `AdminGate`) is
/// expected as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(json_error),
    )
    .service(web::resource("/health").route(web::get().to(handlers::health::health_check)))
    .service(
        web::resource("/admin/login").route(web::post().to(handlers::admin::login_handler)),
    )
    .service(
        web::resource("/employees")
            .route(web::get().to(handlers::employee::get_employees))
            .route(web::post().to(handlers::employee::create_employee)),
    )
    .service(
        web::resource("/employees/{employee_id}")
            .route(web::get().to(handlers::employee::get_employee))
            .route(web::put().to(handlers::employee::update_employee))
            .route(web::delete().to(handlers::employee::delete_employee)),
    );
}

/// Any origin when `allowed_origins` is empty, otherwise only the listed ones.
pub fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);
    if allowed_origins.is_empty() {
        return cors.allow_any_origin();
    }
    allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
