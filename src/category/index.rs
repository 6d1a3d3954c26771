use super::controller::{create_category, delete_category, list_categories, update_category};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn category_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/categories")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::get().to(list_categories))
            .route("", web::post().to(create_category))
            .route("/{id}", web::put().to(update_category))
            .route("/{id}", web::delete().to(delete_category)),
    );
}
