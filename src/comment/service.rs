use std::collections::HashMap;

use chrono::Utc;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use mongodb::{Collection, Database};

use crate::comment::model::Comment;
use crate::utils::error::CustomError;
use crate::utils::validation::validate_text;

pub struct CommentService {
    collection: Collection<Comment>,
}

impl CommentService {
    pub fn new(db: &Database) -> Self {
        CommentService {
            collection: db.collection::<Comment>("comments"),
        }
    }

    /// Add a new comment to a post
    pub async fn add_comment(
        &self,
        post_id: ObjectId,
        author_id: ObjectId,
        text: String,
    ) -> Result<Comment, CustomError> {
        validate_text("Comment", &text, None)?;

        let now = Utc::now();
        let comment = Comment {
            id: ObjectId::new(),
            post_id,
            author_id,
            text,
            created_at: now,
            updated_at: now,
        };

        self.collection
            .insert_one(&comment)
            .await
            .map_err(|e| CustomError::storage("Failed to add comment", e))?;

        Ok(comment)
    }

    /// Comments of a post, oldest first
    pub async fn get_comments_for_post(
        &self,
        post_id: &ObjectId,
    ) -> Result<Vec<Comment>, CustomError> {
        let mut comments: Vec<Comment> = self
            .collection
            .find(doc! { "post_id": post_id })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch comments", e))?
            .try_collect()
            .await
            .map_err(|e| CustomError::storage("Failed to collect comments", e))?;

        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    /// A comment, only if it belongs to the given post
    pub async fn get_comment_for_post(
        &self,
        comment_id: &ObjectId,
        post_id: &ObjectId,
    ) -> Result<Option<Comment>, CustomError> {
        self.collection
            .find_one(doc! { "_id": comment_id, "post_id": post_id })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch comment", e))
    }

    pub async fn update_comment(
        &self,
        mut comment: Comment,
        text: String,
    ) -> Result<Comment, CustomError> {
        validate_text("Comment", &text, None)?;

        comment.text = text;
        comment.updated_at = Utc::now();

        let result = self
            .collection
            .replace_one(doc! { "_id": comment.id }, &comment)
            .await
            .map_err(|e| CustomError::storage("Failed to update comment", e))?;

        if result.matched_count == 0 {
            return Err(CustomError::NotFoundError("Comment not found".to_string()));
        }

        Ok(comment)
    }

    pub async fn delete_comment(&self, comment_id: &ObjectId) -> Result<(), CustomError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": comment_id })
            .await
            .map_err(|e| CustomError::storage("Failed to delete comment", e))?;

        if result.deleted_count == 0 {
            return Err(CustomError::NotFoundError("Comment not found".to_string()));
        }

        Ok(())
    }

    /// Drop every comment of a deleted post
    pub async fn delete_comments_for_post(&self, post_id: &ObjectId) -> Result<u64, CustomError> {
        let result = self
            .collection
            .delete_many(doc! { "post_id": post_id })
            .await
            .map_err(|e| CustomError::storage("Failed to delete comments", e))?;

        info!(
            "Removed {} comments of post {}",
            result.deleted_count,
            post_id.to_hex()
        );
        Ok(result.deleted_count)
    }

    /// Comment counts keyed by post id; posts without comments are absent
    pub async fn count_by_posts(
        &self,
        post_ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, u64>, CustomError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let pipeline = vec![
            doc! { "$match": { "post_id": { "$in": post_ids } } },
            doc! { "$group": { "_id": "$post_id", "count": { "$sum": 1 } } },
        ];

        let rows: Vec<Document> = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| CustomError::storage("Failed to count comments", e))?
            .try_collect()
            .await
            .map_err(|e| CustomError::storage("Failed to collect comment counts", e))?;

        Ok(rows.iter().filter_map(count_row).collect())
    }
}

fn count_row(row: &Document) -> Option<(ObjectId, u64)> {
    let post_id = row.get_object_id("_id").ok()?;
    let count = match row.get("count")? {
        Bson::Int32(n) => *n as u64,
        Bson::Int64(n) => *n as u64,
        _ => return None,
    };
    Some((post_id, count))
}
