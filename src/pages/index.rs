use super::controller::{about, rules};
use actix_web::web;

pub fn page_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/pages")
            .route("/about", web::get().to(about))
            .route("/rules", web::get().to(rules)),
    );
}
