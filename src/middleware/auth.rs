use actix_web::dev::{Payload, ServiceRequest};
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use futures_util::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::debug;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::policy::access::Viewer;
use crate::utils::config::AppConfig;
use crate::utils::error::CustomError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: String,
    pub exp: usize,
}

pub fn create_token(user_id: &ObjectId, config: &AppConfig) -> Result<String, CustomError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| CustomError::InternalServerError("Invalid token lifetime".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        id: user_id.to_hex(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|_| CustomError::InternalServerError("Token generation failed".to_string()))
}

pub fn decode_token(token: &str, config: &AppConfig) -> Result<Claims, CustomError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        CustomError::UnauthorizedError("Invalid token".to_string())
    })
}

/// Bearer middleware for routes that require a logged-in user.
pub async fn verify_token(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let config = match req.app_data::<web::Data<AppConfig>>() {
        Some(config) => config.clone(),
        None => {
            return Err((
                CustomError::InternalServerError("Auth is not configured".to_string()).into(),
                req,
            ));
        }
    };

    match decode_token(credentials.token(), &config) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(req)
        }
        Err(e) => Err((e.into(), req)),
    }
}

fn viewer_from_claims(claims: &Claims) -> Result<Viewer, CustomError> {
    ObjectId::parse_str(&claims.id)
        .map(Viewer::User)
        .map_err(|_| CustomError::BadRequestError("Invalid user id in token".to_string()))
}

/// Resolve the viewer: claims left by [`verify_token`], else an optional
/// `Authorization: Bearer` header, else anonymous.
pub fn viewer_from_request(req: &HttpRequest) -> Result<Viewer, CustomError> {
    if let Some(claims) = req.extensions().get::<Claims>() {
        return viewer_from_claims(claims);
    }

    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(Viewer::Anonymous);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| CustomError::UnauthorizedError("Malformed authorization header".into()))?;

    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| CustomError::InternalServerError("Auth is not configured".to_string()))?;

    let claims = decode_token(token.trim(), config)?;
    viewer_from_claims(&claims)
}

impl FromRequest for Viewer {
    type Error = CustomError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(viewer_from_request(req))
    }
}

/// Id of the logged-in viewer, for handlers behind [`verify_token`].
pub fn require_user(viewer: &Viewer) -> Result<ObjectId, CustomError> {
    viewer
        .user_id()
        .ok_or_else(|| CustomError::UnauthenticatedError("Login required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use actix_web_httpauth::middleware::HttpAuthentication;

    fn config() -> AppConfig {
        AppConfig {
            jwt_secret: "test-secret".to_string(),
            ..AppConfig::default()
        }
    }

    async fn whoami(viewer: Viewer) -> HttpResponse {
        match viewer {
            Viewer::Anonymous => HttpResponse::Ok().body("anonymous"),
            Viewer::User(id) => HttpResponse::Ok().body(id.to_hex()),
        }
    }

    #[actix_web::test]
    async fn token_round_trips_user_id() {
        let user_id = ObjectId::new();
        let token = create_token(&user_id, &config()).unwrap();
        let claims = decode_token(&token, &config()).unwrap();
        assert_eq!(claims.id, user_id.to_hex());
    }

    #[actix_web::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(&ObjectId::new(), &config()).unwrap();
        let other = AppConfig {
            jwt_secret: "another".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            decode_token(&token, &other),
            Err(CustomError::UnauthorizedError(_))
        ));
    }

    #[actix_web::test]
    async fn missing_header_means_anonymous() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous");
    }

    #[actix_web::test]
    async fn valid_header_identifies_user() {
        let user_id = ObjectId::new();
        let token = create_token(&user_id, &config()).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_hex());
    }

    #[actix_web::test]
    async fn garbage_token_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn protected_route_requires_bearer() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(config())).service(
                web::resource("/private")
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/private").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let user_id = ObjectId::new();
        let token = create_token(&user_id, &config()).unwrap();
        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_hex());
    }
}
