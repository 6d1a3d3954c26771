use super::controller::{get_own_profile, login_user, register_user, update_own_profile};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/registration", web::post().to(register_user))
            .route("/login", web::post().to(login_user)),
    )
    .service(
        web::resource("/users/profile/edit")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route(web::get().to(get_own_profile))
            .route(web::put().to(update_own_profile)),
    );
}
