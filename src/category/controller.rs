use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::category::model::CategoryRequest;
use crate::category::service::CategoryService;
use crate::middleware::auth::require_user;
use crate::policy::access::Viewer;
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::helpers::{envelope, parse_object_id};

/// GET /admin/categories
pub async fn list_categories(
    viewer: Viewer,
    users: web::Data<UserService>,
    categories: web::Data<CategoryService>,
) -> Result<HttpResponse, CustomError> {
    users.require_staff(&require_user(&viewer)?).await?;
    let all = categories.list().await?;

    Ok(envelope(
        StatusCode::OK,
        "Categories fetched successfully",
        json!(all),
    ))
}

/// POST /admin/categories
pub async fn create_category(
    viewer: Viewer,
    users: web::Data<UserService>,
    categories: web::Data<CategoryService>,
    body: web::Json<CategoryRequest>,
) -> Result<HttpResponse, CustomError> {
    users.require_staff(&require_user(&viewer)?).await?;
    let category = categories.create(body.into_inner()).await?;

    Ok(envelope(
        StatusCode::CREATED,
        "Category created successfully",
        json!(category),
    ))
}

/// PUT /admin/categories/{id}
pub async fn update_category(
    viewer: Viewer,
    path: web::Path<String>,
    users: web::Data<UserService>,
    categories: web::Data<CategoryService>,
    body: web::Json<CategoryRequest>,
) -> Result<HttpResponse, CustomError> {
    users.require_staff(&require_user(&viewer)?).await?;
    let id = parse_object_id(&path, "category")?;
    let category = categories.update(&id, body.into_inner()).await?;

    Ok(envelope(
        StatusCode::OK,
        "Category updated successfully",
        json!(category),
    ))
}

/// DELETE /admin/categories/{id}
pub async fn delete_category(
    viewer: Viewer,
    path: web::Path<String>,
    users: web::Data<UserService>,
    categories: web::Data<CategoryService>,
) -> Result<HttpResponse, CustomError> {
    users.require_staff(&require_user(&viewer)?).await?;
    let id = parse_object_id(&path, "category")?;
    categories.delete(&id).await?;

    Ok(envelope(
        StatusCode::OK,
        "Category deleted successfully",
        json!(null),
    ))
}
