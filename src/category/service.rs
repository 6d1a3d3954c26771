use std::collections::HashMap;

use chrono::Utc;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{Document, doc, oid::ObjectId};
use mongodb::{Collection, Database};

use crate::category::model::{Category, CategoryRequest};
use crate::utils::error::CustomError;
use crate::utils::helpers::detach_reference;
use crate::utils::validation::{MAX_TITLE_LENGTH, validate_slug, validate_text};

pub struct CategoryService {
    collection: Collection<Category>,
    posts: Collection<Document>,
}

impl CategoryService {
    pub fn new(db: &Database) -> Self {
        CategoryService {
            collection: db.collection::<Category>("categories"),
            posts: db.collection::<Document>("posts"),
        }
    }

    fn validate(request: &CategoryRequest) -> Result<(), CustomError> {
        validate_text("Title", &request.title, Some(MAX_TITLE_LENGTH))?;
        validate_slug(&request.slug)
    }

    pub async fn list(&self) -> Result<Vec<Category>, CustomError> {
        self.collection
            .find(doc! {})
            .sort(doc! { "title": 1 })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch categories", e))?
            .try_collect()
            .await
            .map_err(|e| CustomError::storage("Failed to collect categories", e))
    }

    pub async fn get_by_id(&self, id: &ObjectId) -> Result<Option<Category>, CustomError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch category", e))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, CustomError> {
        self.collection
            .find_one(doc! { "slug": slug })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch category", e))
    }

    pub async fn find_by_ids(
        &self,
        ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, Category>, CustomError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let categories: Vec<Category> = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch categories", e))?
            .try_collect()
            .await
            .map_err(|e| CustomError::storage("Failed to collect categories", e))?;

        Ok(categories.into_iter().map(|c| (c.id, c)).collect())
    }

    /// Ids of hidden categories; their posts are hidden too.
    pub async fn unpublished_ids(&self) -> Result<Vec<ObjectId>, CustomError> {
        let hidden: Vec<Category> = self
            .collection
            .find(doc! { "is_published": false })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch categories", e))?
            .try_collect()
            .await
            .map_err(|e| CustomError::storage("Failed to collect categories", e))?;

        Ok(hidden.into_iter().map(|c| c.id).collect())
    }

    async fn slug_taken(&self, slug: &str, except: Option<&ObjectId>) -> Result<bool, CustomError> {
        let mut filter = doc! { "slug": slug };
        if let Some(id) = except {
            filter.insert("_id", doc! { "$ne": id });
        }
        let count = self
            .collection
            .count_documents(filter)
            .await
            .map_err(|e| CustomError::storage("Failed to check slug", e))?;
        Ok(count > 0)
    }

    pub async fn create(&self, request: CategoryRequest) -> Result<Category, CustomError> {
        Self::validate(&request)?;
        if self.slug_taken(&request.slug, None).await? {
            return Err(CustomError::ConflictError("Slug already exists".to_string()));
        }

        let category = Category {
            id: ObjectId::new(),
            title: request.title,
            description: request.description,
            slug: request.slug,
            is_published: request.is_published,
            created_at: Utc::now(),
        };

        self.collection
            .insert_one(&category)
            .await
            .map_err(|e| CustomError::write("Failed to create category", "Slug already exists", e))?;

        info!("Category {} created", category.slug);
        Ok(category)
    }

    pub async fn update(
        &self,
        id: &ObjectId,
        request: CategoryRequest,
    ) -> Result<Category, CustomError> {
        Self::validate(&request)?;
        let mut category = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Category not found".to_string()))?;

        if self.slug_taken(&request.slug, Some(id)).await? {
            return Err(CustomError::ConflictError("Slug already exists".to_string()));
        }

        category.title = request.title;
        category.description = request.description;
        category.slug = request.slug;
        category.is_published = request.is_published;

        self.collection
            .replace_one(doc! { "_id": id }, &category)
            .await
            .map_err(|e| CustomError::write("Failed to update category", "Slug already exists", e))?;

        Ok(category)
    }

    /// Remove a category; its posts stay and lose the reference.
    pub async fn delete(&self, id: &ObjectId) -> Result<(), CustomError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| CustomError::storage("Failed to delete category", e))?;

        if result.deleted_count == 0 {
            return Err(CustomError::NotFoundError("Category not found".to_string()));
        }

        let (filter, update) = detach_reference("category_id", id);
        let detached = self
            .posts
            .update_many(filter, update)
            .await
            .map_err(|e| CustomError::storage("Failed to detach posts from category", e))?;

        info!(
            "Category {} deleted, {} posts detached",
            id.to_hex(),
            detached.modified_count
        );
        Ok(())
    }
}
