use super::controller::{
    add_comment, delete_comment, delete_comment_confirm, edit_comment_form, update_comment,
};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts/{post_id}/comment")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::post().to(add_comment))
            .service(
                web::resource("/{comment_id}/edit")
                    .route(web::get().to(edit_comment_form))
                    .route(web::put().to(update_comment)),
            )
            .service(
                web::resource("/{comment_id}/delete")
                    .route(web::get().to(delete_comment_confirm))
                    .route(web::delete().to(delete_comment)),
            ),
    );
}
