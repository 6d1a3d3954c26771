use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use log::warn;
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::category::service::CategoryService;
use crate::comment::model::{Comment, CommentRequest};
use crate::comment::service::CommentService;
use crate::policy::access::{CommentAction, Decision, PostAccessPolicy, PostAction, Viewer};
use crate::post::post_controller::{check, load_post};
use crate::post::post_service::PostService;
use crate::utils::error::CustomError;
use crate::utils::helpers::{envelope, parse_object_id, redirect_to_post};

#[derive(serde::Deserialize)]
pub struct CommentPath {
    pub post_id: String,
    pub comment_id: String,
}

/// Resolve both ids; the comment must hang off the given post.
async fn load_comment(
    path: &CommentPath,
    comments: &CommentService,
) -> Result<(ObjectId, Comment), CustomError> {
    let post_id = parse_object_id(&path.post_id, "post")?;
    let comment_id = parse_object_id(&path.comment_id, "comment")?;

    let comment = comments
        .get_comment_for_post(&comment_id, &post_id)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("Comment not found".to_string()))?;

    Ok((post_id, comment))
}

/// `Some(redirect)` when the viewer does not own the comment.
fn check_comment(decision: Decision, post_id: &ObjectId) -> Option<HttpResponse> {
    match decision {
        Decision::Allow => None,
        Decision::Deny(_) => {
            warn!("Denied change to a comment on post {}", post_id.to_hex());
            Some(redirect_to_post(&post_id.to_hex()))
        }
    }
}

/// Add a comment to a post
/// POST /posts/{post_id}/comment
pub async fn add_comment(
    post_id: web::Path<String>,
    viewer: Viewer,
    body: web::Json<CommentRequest>,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&post_id, "post")?;
    let view = load_post(&post_id, &posts, &categories).await?;

    let policy = PostAccessPolicy::at(Utc::now());
    for action in [PostAction::View, PostAction::Comment] {
        if let Some(redirect) = check(policy.authorize(&viewer, &view, action), &post_id)? {
            return Ok(redirect);
        }
    }

    let author_id = viewer
        .user_id()
        .ok_or_else(|| CustomError::UnauthenticatedError("Login required".to_string()))?;
    let comment = comments
        .add_comment(post_id, author_id, body.into_inner().text)
        .await?;

    Ok(envelope(
        StatusCode::CREATED,
        "Comment created successfully",
        json!(comment),
    ))
}

/// GET /posts/{post_id}/comment/{comment_id}/edit
pub async fn edit_comment_form(
    path: web::Path<CommentPath>,
    viewer: Viewer,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let (post_id, comment) = load_comment(&path, &comments).await?;

    let policy = PostAccessPolicy::at(Utc::now());
    if let Some(redirect) = check_comment(
        policy.authorize_comment(&viewer, &comment, CommentAction::Edit),
        &post_id,
    ) {
        return Ok(redirect);
    }

    Ok(envelope(StatusCode::OK, "Comment fetched for editing", json!(comment)))
}

/// PUT /posts/{post_id}/comment/{comment_id}/edit
pub async fn update_comment(
    path: web::Path<CommentPath>,
    viewer: Viewer,
    body: web::Json<CommentRequest>,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let (post_id, comment) = load_comment(&path, &comments).await?;

    let policy = PostAccessPolicy::at(Utc::now());
    if let Some(redirect) = check_comment(
        policy.authorize_comment(&viewer, &comment, CommentAction::Edit),
        &post_id,
    ) {
        return Ok(redirect);
    }

    let updated = comments
        .update_comment(comment, body.into_inner().text)
        .await?;

    Ok(envelope(StatusCode::OK, "Comment updated successfully", json!(updated)))
}

/// GET /posts/{post_id}/comment/{comment_id}/delete
pub async fn delete_comment_confirm(
    path: web::Path<CommentPath>,
    viewer: Viewer,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let (post_id, comment) = load_comment(&path, &comments).await?;

    let policy = PostAccessPolicy::at(Utc::now());
    if let Some(redirect) = check_comment(
        policy.authorize_comment(&viewer, &comment, CommentAction::Delete),
        &post_id,
    ) {
        return Ok(redirect);
    }

    Ok(envelope(StatusCode::OK, "Confirm comment deletion", json!(comment)))
}

/// DELETE /posts/{post_id}/comment/{comment_id}/delete
pub async fn delete_comment(
    path: web::Path<CommentPath>,
    viewer: Viewer,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let (post_id, comment) = load_comment(&path, &comments).await?;

    let policy = PostAccessPolicy::at(Utc::now());
    if let Some(redirect) = check_comment(
        policy.authorize_comment(&viewer, &comment, CommentAction::Delete),
        &post_id,
    ) {
        return Ok(redirect);
    }

    comments.delete_comment(&comment.id).await?;

    Ok(envelope(StatusCode::OK, "Comment deleted successfully", json!(null)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::access::DenyReason;
    use actix_web::http::header;

    #[test]
    fn foreign_comment_bounces_to_parent_post() {
        let post_id = ObjectId::new();
        let redirect = check_comment(Decision::Deny(DenyReason::Forbidden), &post_id)
            .expect("redirect");
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers().get(header::LOCATION).unwrap(),
            format!("/posts/{}", post_id.to_hex()).as_str()
        );
        assert!(check_comment(Decision::Allow, &post_id).is_none());
    }
}
