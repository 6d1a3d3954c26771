use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use serde_json::json;

mod category;
mod comment;
mod database;
mod location;
mod middleware;
mod pages;
mod policy;
mod post;
mod router;
mod user;
mod utils;

use category::service::CategoryService;
use comment::service::CommentService;
use location::service::LocationService;
use middleware::error_handler::handle_error;
use middleware::not_found::not_found;
use post::post_service::PostService;
use router::index::routes;
use user::service::UserService;
use utils::config::AppConfig;
use utils::helpers::service_name;
use utils::uploads::{CloudinaryConfig, UploadService};

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Blogicum API is running",
        "httpStatusCode": StatusCode::OK.as_u16(),
        "service": service_name(),
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();

    let db = database::connect_to_mongo(&config).await.map_err(|e| {
        error!("Failed to connect to MongoDB: {}", e);
        std::io::Error::other(e)
    })?;

    let user_service = web::Data::new(UserService::new(&db));
    let post_service = web::Data::new(PostService::new(&db));
    let comment_service = web::Data::new(CommentService::new(&db));
    let category_service = web::Data::new(CategoryService::new(&db));
    let location_service = web::Data::new(LocationService::new(&db));
    let upload_service = web::Data::new(UploadService::new(CloudinaryConfig::from_env()));

    let bind_addr = (config.host.clone(), config.port);
    let app_config = web::Data::new(config);

    info!("Starting server on http://{}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_config.clone())
            .app_data(user_service.clone())
            .app_data(post_service.clone())
            .app_data(comment_service.clone())
            .app_data(category_service.clone())
            .app_data(location_service.clone())
            .app_data(upload_service.clone())
            .service(health)
            .configure(routes)
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::NOT_FOUND, not_found)
                    .default_handler(handle_error),
            )
    })
    .bind(bind_addr)?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
