use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{Document, doc, oid::ObjectId};
use mongodb::{Collection, Database};

use crate::post::post_model::Post;
use crate::utils::dates;
use crate::utils::error::CustomError;
use crate::utils::pagination::PageWindow;

/// Storage-side form of the visibility rule: published, not scheduled past
/// `now`, and not in one of `hidden_categories`. A missing or dangling
/// category does not hide a post.
pub fn visible_filter(now: &DateTime<Utc>, hidden_categories: &[ObjectId]) -> Document {
    let mut filter = doc! {
        "is_published": true,
        "pub_date": { "$lte": dates::to_key(now) },
    };
    if !hidden_categories.is_empty() {
        filter.insert("category_id", doc! { "$nin": hidden_categories });
    }
    filter
}

pub struct PostService {
    collection: Collection<Post>,
}

impl PostService {
    pub fn new(db: &Database) -> Self {
        PostService {
            collection: db.collection::<Post>("posts"),
        }
    }

    pub async fn create_post(&self, post: Post) -> Result<Post, CustomError> {
        self.collection
            .insert_one(&post)
            .await
            .map_err(|e| CustomError::storage("Failed to create post", e))?;

        info!("Post {} created by {}", post.id.to_hex(), post.author_id.to_hex());
        Ok(post)
    }

    pub async fn get_post(&self, id: &ObjectId) -> Result<Option<Post>, CustomError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch post", e))
    }

    pub async fn count_posts(&self, filter: Document) -> Result<usize, CustomError> {
        let count = self
            .collection
            .count_documents(filter)
            .await
            .map_err(|e| CustomError::storage("Failed to count posts", e))?;
        Ok(count as usize)
    }

    /// One page of posts matching `filter`, newest publication first.
    pub async fn find_page(
        &self,
        filter: Document,
        window: &PageWindow,
    ) -> Result<Vec<Post>, CustomError> {
        self.collection
            .find(filter)
            .sort(doc! { "pub_date": -1, "_id": -1 })
            .skip(window.offset() as u64)
            .limit(window.per_page as i64)
            .await
            .map_err(|e| CustomError::storage("Failed to fetch posts", e))?
            .try_collect()
            .await
            .map_err(|e| CustomError::storage("Failed to collect posts", e))
    }

    pub async fn update_post(&self, mut post: Post) -> Result<Post, CustomError> {
        post.updated_at = Utc::now();

        let result = self
            .collection
            .replace_one(doc! { "_id": post.id }, &post)
            .await
            .map_err(|e| CustomError::storage("Failed to update post", e))?;

        if result.matched_count == 0 {
            return Err(CustomError::NotFoundError("Post not found".to_string()));
        }

        Ok(post)
    }

    pub async fn delete_post(&self, id: &ObjectId) -> Result<bool, CustomError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| CustomError::storage("Failed to delete post", e))?;

        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn visible_filter_bounds_publication_date() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            visible_filter(&now, &[]),
            doc! {
                "is_published": true,
                "pub_date": { "$lte": "2024-05-01T12:00:00.000000Z" },
            }
        );
    }

    #[test]
    fn visible_filter_excludes_hidden_categories() {
        let now = Utc::now();
        let hidden = ObjectId::new();
        let filter = visible_filter(&now, &[hidden]);
        assert_eq!(
            filter.get_document("category_id").unwrap(),
            &doc! { "$nin": [hidden] }
        );
    }
}
