use actix_web::{web, HttpResponse, ResponseError};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::admin::AdminGate;

#[derive(Deserialize, Default)]
pub struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct LoginResponse<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// Checks the admin credentials. Nothing is issued on success: callers must
/// present the credentials again for every protected action.
///
/// A missing or malformed body counts as missing credentials, so every
/// failure keeps the `{success, message}` shape.
pub async fn login_handler(
    gate: web::Data<AdminGate>,
    req: Option<web::Json<LoginRequest>>,
) -> HttpResponse {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    match gate.login(req.username.as_deref(), req.password.as_deref()) {
        Ok(()) => HttpResponse::Ok().json(LoginResponse {
            success: true,
            message: None,
        }),
        Err(err) => {
            if let AppError::Unauthorized(_) = err {
                warn!("Rejected admin login attempt");
            }
            let message = match &err {
                AppError::Validation { message, .. } | AppError::Unauthorized(message) => message.as_str(),
                _ => "Login failed",
            };
            HttpResponse::build(err.status_code()).json(LoginResponse {
                success: false,
                message: Some(message),
            })
        }
    }
}
