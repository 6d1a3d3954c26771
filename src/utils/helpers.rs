use std::sync::LazyLock;

use actix_web::HttpResponse;
use actix_web::http::{StatusCode, header};
use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use serde_json::{Value, json};

use crate::utils::error::CustomError;

static SERVICE_NAME: LazyLock<String> =
    LazyLock::new(|| std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()));

/// Name reported in every response envelope, read once per process.
pub fn service_name() -> &'static str {
    &SERVICE_NAME
}

/// Success envelope shared by all handlers.
pub fn envelope(status: StatusCode, message: &str, data: Value) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "success": true,
        "message": message,
        "httpStatusCode": status.as_u16(),
        "service": service_name(),
        "data": data,
    }))
}

pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, CustomError> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| CustomError::BadRequestError(format!("Invalid {} ID", what)))
}

/// Optional reference from a request body; blank means "none".
pub fn parse_optional_object_id(
    raw: Option<&str>,
    what: &str,
) -> Result<Option<ObjectId>, CustomError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => parse_object_id(id, what).map(Some),
    }
}

/// 303 to the canonical view of a post.
pub fn redirect_to_post(post_id: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, format!("/posts/{}", post_id)))
        .finish()
}

/// Filter and update that drop a deleted record's id from every post
/// referencing it through `field`.
pub fn detach_reference(field: &str, id: &ObjectId) -> (Document, Document) {
    (
        doc! { field: id },
        doc! { "$set": { field: Bson::Null } },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_points_at_post_view() {
        let resp = redirect_to_post("65f0c0ffee");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/posts/65f0c0ffee"
        );
    }

    #[test]
    fn blank_reference_is_none() {
        assert_eq!(parse_optional_object_id(None, "category").unwrap(), None);
        assert_eq!(parse_optional_object_id(Some("  "), "category").unwrap(), None);
        assert!(parse_optional_object_id(Some("nope"), "category").is_err());

        let id = ObjectId::new();
        assert_eq!(
            parse_optional_object_id(Some(&id.to_hex()), "category").unwrap(),
            Some(id)
        );
    }

    #[test]
    fn detaching_nulls_only_the_given_reference() {
        let id = ObjectId::new();
        let (filter, update) = detach_reference("location_id", &id);
        assert_eq!(filter, doc! { "location_id": id });
        assert_eq!(update, doc! { "$set": { "location_id": Bson::Null } });
    }

    #[test]
    fn service_name_is_read_once() {
        assert!(std::ptr::eq(service_name(), service_name()));
    }

    #[test]
    fn envelope_uses_given_status() {
        let resp = envelope(StatusCode::CREATED, "Post created successfully", json!({}));
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
}
