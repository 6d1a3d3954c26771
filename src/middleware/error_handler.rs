use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpResponse, Result};
use serde_json::json;

use crate::utils::helpers::service_name;

fn is_json<B>(res: &ServiceResponse<B>) -> bool {
    res.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Wrap bare error responses (extractor failures, auth rejections) in the
/// same JSON envelope as `CustomError`. JSON responses pass through.
pub fn handle_error<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    if is_json(&res) {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let status_code = res.status();
    let error_message = res
        .response()
        .error()
        .map(|e| e.to_string())
        .unwrap_or_else(|| status_code.canonical_reason().unwrap_or("Unknown error").to_string());

    let new_response = HttpResponse::build(status_code).json(json!({
        "success": false,
        "message": error_message,
        "httpStatusCode": status_code.as_u16(),
        "error": status_code.canonical_reason().unwrap_or("Unknown"),
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
    use actix_web::http::StatusCode;
    use actix_web::middleware::ErrorHandlers;
    use actix_web::{App, test, web};

    async fn missing_post() -> Result<HttpResponse, CustomError> {
        Err(CustomError::NotFoundError("Post not found".into()))
    }

    async fn bad_query(_: web::Query<std::collections::HashMap<String, u32>>) -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn keeps_custom_error_bodies() {
        let app = test::init_service(
            App::new()
                .wrap(ErrorHandlers::new().default_handler(handle_error))
                .route("/missing", web::get().to(missing_post)),
        )
        .await;

        let req = test::TestRequest::get().uri("/missing").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "NOT_FOUND_ERROR");
    }

    #[actix_web::test]
    async fn wraps_plain_errors_in_json() {
        let app = test::init_service(
            App::new()
                .wrap(ErrorHandlers::new().default_handler(handle_error))
                .route("/query", web::get().to(bad_query)),
        )
        .await;

        let req = test::TestRequest::get().uri("/query?page=abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["httpStatusCode"], 400);
    }
}
