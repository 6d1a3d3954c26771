use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde_json::json;

use crate::utils::helpers::envelope;

pub async fn about() -> HttpResponse {
    envelope(
        StatusCode::OK,
        "About the project",
        json!({
            "title": "Blogicum",
            "text": "A place to publish notes, travel stories and anything else worth sharing.",
        }),
    )
}

pub async fn rules() -> HttpResponse {
    envelope(
        StatusCode::OK,
        "Community rules",
        json!({
            "title": "Rules",
            "rules": [
                "Be polite to other authors and commenters.",
                "Publish only content you have the rights to.",
                "Scheduled and unpublished posts stay visible to their author only.",
            ],
        }),
    )
}
