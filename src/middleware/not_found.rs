use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpResponse, Result, dev::ServiceResponse};
use serde_json::json;

use crate::utils::helpers::service_name;

/// JSON body for unmatched routes. A 404 raised by a handler (missing or
/// hidden record) already carries its own body and is left alone.
pub fn not_found<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    if res.response().error().is_some() {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let new_response = HttpResponse::build(StatusCode::NOT_FOUND).json(json!({
        "success": false,
        "message": "Route does not exist",
        "httpStatusCode": StatusCode::NOT_FOUND.as_u16(),
        "error": "NOT_FOUND_ERROR",
        "service": service_name(),
    }));
    let (req, _) = res.into_parts();
    let res = ServiceResponse::new(req, new_response.map_into_right_body());

    Ok(ErrorHandlerResponse::Response(res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::CustomError;
    use actix_web::middleware::ErrorHandlers;
    use actix_web::{App, test, web};

    async fn hidden_post() -> Result<HttpResponse, CustomError> {
        Err(CustomError::NotFoundError("Post not found".into()))
    }

    #[actix_web::test]
    async fn unknown_route_gets_json_404() {
        let app = test::init_service(
            App::new().wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found)),
        )
        .await;

        let req = test::TestRequest::get().uri("/nowhere").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Route does not exist");
    }

    #[actix_web::test]
    async fn handler_404_keeps_its_message() {
        let app = test::init_service(
            App::new()
                .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found))
                .route("/posts/x", web::get().to(hidden_post)),
        )
        .await;

        let req = test::TestRequest::get().uri("/posts/x").to_request();
        let resp = test::call_service(&app, req).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Not Found: Post not found");
    }
}
