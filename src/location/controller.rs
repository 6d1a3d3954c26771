use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::location::model::LocationRequest;
use crate::location::service::LocationService;
use crate::middleware::auth::require_user;
use crate::policy::access::Viewer;
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::helpers::{envelope, parse_object_id};

/// GET /admin/locations
pub async fn list_locations(
    viewer: Viewer,
    users: web::Data<UserService>,
    locations: web::Data<LocationService>,
) -> Result<HttpResponse, CustomError> {
    users.require_staff(&require_user(&viewer)?).await?;
    let all = locations.list().await?;

    Ok(envelope(StatusCode::OK, "Locations fetched successfully", json!(all)))
}

/// POST /admin/locations
pub async fn create_location(
    viewer: Viewer,
    users: web::Data<UserService>,
    locations: web::Data<LocationService>,
    body: web::Json<LocationRequest>,
) -> Result<HttpResponse, CustomError> {
    users.require_staff(&require_user(&viewer)?).await?;
    let location = locations.create(body.into_inner()).await?;

    Ok(envelope(
        StatusCode::CREATED,
        "Location created successfully",
        json!(location),
    ))
}

/// PUT /admin/locations/{id}
pub async fn update_location(
    viewer: Viewer,
    path: web::Path<String>,
    users: web::Data<UserService>,
    locations: web::Data<LocationService>,
    body: web::Json<LocationRequest>,
) -> Result<HttpResponse, CustomError> {
    users.require_staff(&require_user(&viewer)?).await?;
    let id = parse_object_id(&path, "location")?;
    let location = locations.update(&id, body.into_inner()).await?;

    Ok(envelope(StatusCode::OK, "Location updated successfully", json!(location)))
}

/// DELETE /admin/locations/{id}
pub async fn delete_location(
    viewer: Viewer,
    path: web::Path<String>,
    users: web::Data<UserService>,
    locations: web::Data<LocationService>,
) -> Result<HttpResponse, CustomError> {
    users.require_staff(&require_user(&viewer)?).await?;
    let id = parse_object_id(&path, "location")?;
    locations.delete(&id).await?;

    Ok(envelope(StatusCode::OK, "Location deleted successfully", json!(null)))
}
