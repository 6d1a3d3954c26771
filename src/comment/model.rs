use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::user::model::AuthorSummary;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub post_id: ObjectId,
    pub author_id: ObjectId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<AuthorSummary>,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub text: String,
}
