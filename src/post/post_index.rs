use super::post_controller::{
    category_posts, create_post, delete_post, delete_post_confirm, edit_post_form, index,
    post_detail, profile, update_post, upload_post_image,
};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn post_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/category/{category_slug}", web::get().to(category_posts))
        .route("/profile/{username}", web::get().to(profile))
        .service(
            web::resource("/posts")
                .wrap(HttpAuthentication::bearer(verify_token))
                .route(web::post().to(create_post)),
        )
        .service(web::resource("/posts/{post_id}").route(web::get().to(post_detail)))
        .service(
            web::resource("/posts/{post_id}/edit")
                .wrap(HttpAuthentication::bearer(verify_token))
                .route(web::get().to(edit_post_form))
                .route(web::put().to(update_post)),
        )
        .service(
            web::resource("/posts/{post_id}/delete")
                .wrap(HttpAuthentication::bearer(verify_token))
                .route(web::get().to(delete_post_confirm))
                .route(web::delete().to(delete_post)),
        )
        .service(
            web::resource("/posts/{post_id}/image")
                .wrap(HttpAuthentication::bearer(verify_token))
                .route(web::post().to(upload_post_image)),
        );
}
