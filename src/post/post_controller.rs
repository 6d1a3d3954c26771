use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use futures_util::StreamExt;
use log::warn;
use mongodb::bson::{doc, oid::ObjectId};
use serde_json::json;

use crate::category::service::CategoryService;
use crate::comment::model::CommentView;
use crate::comment::service::CommentService;
use crate::location::service::LocationService;
use crate::middleware::auth::require_user;
use crate::policy::access::{Decision, DenyReason, PostAccessPolicy, PostAction, Viewer};
use crate::post::post_feed::PostFeed;
use crate::post::post_model::{Post, PostForm, PostView, References};
use crate::post::post_service::{PostService, visible_filter};
use crate::user::model::{AuthorSummary, UserProfile};
use crate::user::service::UserService;
use crate::utils::config::AppConfig;
use crate::utils::error::CustomError;
use crate::utils::helpers::{
    envelope, parse_object_id, parse_optional_object_id, redirect_to_post,
};
use crate::utils::pagination::PageQuery;
use crate::utils::uploads::{FileUpload, FileValidator, UploadService};
use crate::utils::validation::{MAX_TITLE_LENGTH, validate_text};

fn post_not_found() -> CustomError {
    CustomError::NotFoundError("Post not found".to_string())
}

/// Turn a denial into the response callers agreed on: hidden posts look
/// missing, foreign posts bounce back to their view.
pub fn check(decision: Decision, post_id: &ObjectId) -> Result<Option<HttpResponse>, CustomError> {
    match decision {
        Decision::Allow => Ok(None),
        Decision::Deny(DenyReason::NotFound) => Err(post_not_found()),
        Decision::Deny(DenyReason::Forbidden) => {
            warn!("Denied change to post {}", post_id.to_hex());
            Ok(Some(redirect_to_post(&post_id.to_hex())))
        }
        Decision::Deny(DenyReason::Unauthenticated) => Err(CustomError::UnauthenticatedError(
            "Login required".to_string(),
        )),
    }
}

/// Authorize `action` on `view` as of now.
pub fn guard(
    viewer: &Viewer,
    view: &PostView,
    action: PostAction,
) -> Result<Option<HttpResponse>, CustomError> {
    let policy = PostAccessPolicy::at(Utc::now());
    check(policy.authorize(viewer, view, action), &view.post.id)
}

/// Post with just enough attached (its category) to judge visibility.
pub async fn load_post(
    post_id: &ObjectId,
    posts: &PostService,
    categories: &CategoryService,
) -> Result<PostView, CustomError> {
    let post = posts.get_post(post_id).await?.ok_or_else(post_not_found)?;
    let category = match post.category_id {
        Some(id) => categories.get_by_id(&id).await?,
        None => None,
    };
    Ok(PostView::new(post).with_category(category))
}

/// Absent keeps, blank clears, an id must name an existing record.
fn reference_change(
    raw: Option<&str>,
    what: &str,
) -> Result<Option<Option<ObjectId>>, CustomError> {
    match raw {
        None => Ok(None),
        Some(raw) => parse_optional_object_id(Some(raw), what).map(Some),
    }
}

async fn resolve_references(
    form: &PostForm,
    categories: &CategoryService,
    locations: &LocationService,
) -> Result<References, CustomError> {
    let category_id = reference_change(form.category_id.as_deref(), "category")?;
    if let Some(Some(id)) = &category_id {
        if categories.get_by_id(id).await?.is_none() {
            return Err(CustomError::BadRequestError("Category does not exist".into()));
        }
    }

    let location_id = reference_change(form.location_id.as_deref(), "location")?;
    if let Some(Some(id)) = &location_id {
        if locations.get_by_id(id).await?.is_none() {
            return Err(CustomError::BadRequestError("Location does not exist".into()));
        }
    }

    Ok(References {
        category_id,
        location_id,
    })
}

fn validate_form(form: &PostForm) -> Result<(), CustomError> {
    validate_text("Title", &form.title, Some(MAX_TITLE_LENGTH))?;
    validate_text("Text", &form.text, None)
}

/// GET /
pub async fn index(
    query: web::Query<PageQuery>,
    config: web::Data<AppConfig>,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
    locations: web::Data<LocationService>,
    users: web::Data<UserService>,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let feed = PostFeed {
        categories: &categories,
        locations: &locations,
        users: &users,
        comments: &comments,
    };

    let policy = PostAccessPolicy::at(Utc::now());
    let filter = visible_filter(&policy.now(), &categories.unpublished_ids().await?);
    let page = feed
        .page(&posts, filter, query.page.as_deref(), config.page_size, |views, counts| {
            policy.filter_visible(views, counts)
        })
        .await?;

    Ok(envelope(StatusCode::OK, "Posts fetched successfully", json!(page)))
}

/// GET /category/{category_slug}
#[allow(clippy::too_many_arguments)]
pub async fn category_posts(
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
    config: web::Data<AppConfig>,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
    locations: web::Data<LocationService>,
    users: web::Data<UserService>,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let category = categories
        .get_by_slug(&slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or_else(|| CustomError::NotFoundError("Category not found".to_string()))?;

    let feed = PostFeed {
        categories: &categories,
        locations: &locations,
        users: &users,
        comments: &comments,
    };

    let policy = PostAccessPolicy::at(Utc::now());
    let mut filter = visible_filter(&policy.now(), &[]);
    filter.insert("category_id", category.id);
    let page = feed
        .page(&posts, filter, query.page.as_deref(), config.page_size, |views, counts| {
            policy.filter_visible(views, counts)
        })
        .await?;

    Ok(envelope(
        StatusCode::OK,
        "Category posts fetched successfully",
        json!({ "category": category, "page": page }),
    ))
}

/// GET /profile/{username}
#[allow(clippy::too_many_arguments)]
pub async fn profile(
    username: web::Path<String>,
    query: web::Query<PageQuery>,
    viewer: Viewer,
    config: web::Data<AppConfig>,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
    locations: web::Data<LocationService>,
    users: web::Data<UserService>,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let owner = users
        .get_by_username(&username)
        .await?
        .ok_or_else(|| CustomError::NotFoundError("User not found".to_string()))?;

    let feed = PostFeed {
        categories: &categories,
        locations: &locations,
        users: &users,
        comments: &comments,
    };

    // The owner sees every post of theirs; others only what is visible.
    let policy = PostAccessPolicy::at(Utc::now());
    let mut filter = if viewer.user_id() == Some(owner.id) {
        doc! {}
    } else {
        visible_filter(&policy.now(), &categories.unpublished_ids().await?)
    };
    filter.insert("author_id", owner.id);
    let page = feed
        .page(&posts, filter, query.page.as_deref(), config.page_size, |views, counts| {
            policy.filter_viewable(&viewer, views, counts)
        })
        .await?;

    Ok(envelope(
        StatusCode::OK,
        "Profile fetched successfully",
        json!({ "profile": UserProfile::from(&owner), "page": page }),
    ))
}

/// GET /posts/{post_id}
pub async fn post_detail(
    post_id: web::Path<String>,
    viewer: Viewer,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
    locations: web::Data<LocationService>,
    users: web::Data<UserService>,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&post_id, "post")?;
    let post = posts.get_post(&post_id).await?.ok_or_else(post_not_found)?;

    let feed = PostFeed {
        categories: &categories,
        locations: &locations,
        users: &users,
        comments: &comments,
    };
    let mut view = feed.view(post).await?;

    let policy = PostAccessPolicy::at(Utc::now());
    if let Some(redirect) = check(policy.authorize(&viewer, &view, PostAction::View), &post_id)? {
        return Ok(redirect);
    }

    let thread = comments.get_comments_for_post(&post_id).await?;
    let author_ids: Vec<ObjectId> = thread.iter().map(|c| c.author_id).collect();
    let authors = users.find_by_ids(&author_ids).await?;
    view.comment_count = thread.len() as u64;

    let thread: Vec<CommentView> = thread
        .into_iter()
        .map(|comment| CommentView {
            author: authors.get(&comment.author_id).map(AuthorSummary::from),
            comment,
        })
        .collect();

    Ok(envelope(
        StatusCode::OK,
        "Post fetched successfully",
        json!({
            "post": view,
            "comments": thread,
            "can_comment": policy.authorize(&viewer, &view, PostAction::Comment).is_allowed(),
        }),
    ))
}

/// POST /posts
pub async fn create_post(
    viewer: Viewer,
    form: web::Json<PostForm>,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
    locations: web::Data<LocationService>,
) -> Result<HttpResponse, CustomError> {
    let author_id = require_user(&viewer)?;
    let form = form.into_inner();
    validate_form(&form)?;
    let refs = resolve_references(&form, &categories, &locations).await?;

    let now = Utc::now();
    let new_post = Post {
        id: ObjectId::new(),
        title: form.title,
        text: form.text,
        pub_date: form.pub_date.unwrap_or(now),
        is_published: form.is_published.unwrap_or(true),
        image: None,
        author_id,
        category_id: refs.category_id.flatten(),
        location_id: refs.location_id.flatten(),
        created_at: now,
        updated_at: now,
    };

    let inserted_post = posts.create_post(new_post).await?;
    Ok(envelope(
        StatusCode::CREATED,
        "Post created successfully",
        json!(inserted_post),
    ))
}

/// GET /posts/{post_id}/edit
pub async fn edit_post_form(
    post_id: web::Path<String>,
    viewer: Viewer,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&post_id, "post")?;
    let view = load_post(&post_id, &posts, &categories).await?;

    if let Some(redirect) = guard(&viewer, &view, PostAction::Edit)? {
        return Ok(redirect);
    }

    Ok(envelope(StatusCode::OK, "Post fetched for editing", json!(view)))
}

/// PUT /posts/{post_id}/edit
pub async fn update_post(
    post_id: web::Path<String>,
    viewer: Viewer,
    form: web::Json<PostForm>,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
    locations: web::Data<LocationService>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&post_id, "post")?;
    let view = load_post(&post_id, &posts, &categories).await?;

    if let Some(redirect) = guard(&viewer, &view, PostAction::Edit)? {
        return Ok(redirect);
    }

    let form = form.into_inner();
    validate_form(&form)?;
    let refs = resolve_references(&form, &categories, &locations).await?;

    let mut post = view.post;
    post.apply_edit(form, refs);

    let updated = posts.update_post(post).await?;
    Ok(envelope(StatusCode::OK, "Post updated successfully", json!(updated)))
}

/// GET /posts/{post_id}/delete
pub async fn delete_post_confirm(
    post_id: web::Path<String>,
    viewer: Viewer,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&post_id, "post")?;
    let view = load_post(&post_id, &posts, &categories).await?;

    if let Some(redirect) = guard(&viewer, &view, PostAction::Delete)? {
        return Ok(redirect);
    }

    Ok(envelope(StatusCode::OK, "Confirm post deletion", json!(view)))
}

/// DELETE /posts/{post_id}/delete
pub async fn delete_post(
    post_id: web::Path<String>,
    viewer: Viewer,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&post_id, "post")?;
    let view = load_post(&post_id, &posts, &categories).await?;

    if let Some(redirect) = guard(&viewer, &view, PostAction::Delete)? {
        return Ok(redirect);
    }

    if !posts.delete_post(&post_id).await? {
        return Err(post_not_found());
    }
    comments.delete_comments_for_post(&post_id).await?;

    Ok(envelope(StatusCode::OK, "Post deleted successfully", json!(null)))
}

/// First non-empty `image` (or `file`) field, refused as soon as it grows
/// past `max_size` bytes.
async fn first_image(
    mut payload: Multipart,
    max_size: usize,
) -> Result<Option<FileUpload>, CustomError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            CustomError::BadRequestError(format!("Error reading multipart field: {}", e))
        })?;

        let Some(content_disposition) = field.content_disposition() else {
            continue;
        };
        if !matches!(content_disposition.get_name(), Some("image") | Some("file")) {
            continue;
        }
        let file_name = content_disposition
            .get_filename()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                CustomError::BadRequestError(format!("Error reading file chunk: {}", e))
            })?;
            if data.len() + chunk.len() > max_size {
                return Err(CustomError::ValidationError(format!(
                    "File too large. Maximum size: {} bytes",
                    max_size
                )));
            }
            data.extend_from_slice(&chunk);
        }

        if !data.is_empty() {
            return Ok(Some(FileUpload::new(file_name, data)));
        }
    }

    Ok(None)
}

/// POST /posts/{post_id}/image
pub async fn upload_post_image(
    post_id: web::Path<String>,
    viewer: Viewer,
    payload: Multipart,
    posts: web::Data<PostService>,
    categories: web::Data<CategoryService>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&post_id, "post")?;
    let view = load_post(&post_id, &posts, &categories).await?;

    if let Some(redirect) = guard(&viewer, &view, PostAction::Edit)? {
        return Ok(redirect);
    }

    let file = first_image(payload, FileValidator::images().max_file_size)
        .await?
        .ok_or_else(|| CustomError::BadRequestError("No image provided".to_string()))?;
    let url = uploads.upload_image(file, "post_images").await?;

    let mut post = view.post;
    post.image = Some(url);
    let updated = posts.update_post(post).await?;

    Ok(envelope(StatusCode::OK, "Image uploaded successfully", json!(updated)))
}
