use crate::category::index::category_routes;
use crate::comment::index::comment_routes;
use crate::location::index::location_routes;
use crate::pages::index::page_routes;
use crate::post::post_index::post_routes;
use crate::user::index::user_routes;
use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(user_routes);
    // The comment scope sits under /posts/{post_id} and must match first.
    cfg.configure(comment_routes);
    cfg.configure(post_routes);
    cfg.configure(category_routes);
    cfg.configure(location_routes);
    cfg.configure(page_routes);
}
