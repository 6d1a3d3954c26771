use super::controller::{create_location, delete_location, list_locations, update_location};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn location_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/locations")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::get().to(list_locations))
            .route("", web::post().to(create_location))
            .route("/{id}", web::put().to(update_location))
            .route("/{id}", web::delete().to(delete_location)),
    );
}
