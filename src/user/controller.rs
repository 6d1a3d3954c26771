use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::middleware::auth::{create_token, require_user};
use crate::policy::access::Viewer;
use crate::user::model::{LoginRequest, ProfileUpdateRequest, RegistrationRequest, UserProfile};
use crate::user::service::UserService;
use crate::utils::config::AppConfig;
use crate::utils::error::CustomError;
use crate::utils::helpers::envelope;

/// Register and log straight in.
/// POST /auth/registration
pub async fn register_user(
    user_service: web::Data<UserService>,
    config: web::Data<AppConfig>,
    user_info: web::Json<RegistrationRequest>,
) -> Result<HttpResponse, CustomError> {
    let user = user_service.create_user(user_info.into_inner()).await?;
    let token = create_token(&user.id, &config)?;

    Ok(envelope(
        StatusCode::CREATED,
        "User created successfully",
        json!({ "token": token, "profile": UserProfile::from(&user) }),
    ))
}

/// POST /auth/login
pub async fn login_user(
    user_service: web::Data<UserService>,
    config: web::Data<AppConfig>,
    login_info: web::Json<LoginRequest>,
) -> Result<HttpResponse, CustomError> {
    let user = user_service.authenticate_user(&login_info).await?;
    let token = create_token(&user.id, &config)?;

    Ok(envelope(
        StatusCode::OK,
        "Login successful",
        json!({ "token": token }),
    ))
}

/// GET /users/profile/edit
pub async fn get_own_profile(
    viewer: Viewer,
    user_service: web::Data<UserService>,
) -> Result<HttpResponse, CustomError> {
    let user_id = require_user(&viewer)?;
    let user = user_service
        .get_by_id(&user_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("User not found".to_string()))?;

    Ok(envelope(
        StatusCode::OK,
        "Profile fetched successfully",
        json!(UserProfile::from(&user)),
    ))
}

/// PUT /users/profile/edit
pub async fn update_own_profile(
    viewer: Viewer,
    user_service: web::Data<UserService>,
    body: web::Json<ProfileUpdateRequest>,
) -> Result<HttpResponse, CustomError> {
    let user_id = require_user(&viewer)?;
    let user = user_service
        .update_profile(&user_id, body.into_inner())
        .await?;

    Ok(envelope(
        StatusCode::OK,
        "Profile updated successfully",
        json!(UserProfile::from(&user)),
    ))
}
