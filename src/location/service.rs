use std::collections::HashMap;

use chrono::Utc;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{Document, doc, oid::ObjectId};
use mongodb::{Collection, Database};

use crate::location::model::{Location, LocationRequest};
use crate::utils::error::CustomError;
use crate::utils::helpers::detach_reference;
use crate::utils::validation::{MAX_TITLE_LENGTH, validate_text};

pub struct LocationService {
    collection: Collection<Location>,
    posts: Collection<Document>,
}

impl LocationService {
    pub fn new(db: &Database) -> Self {
        LocationService {
            collection: db.collection::<Location>("locations"),
            posts: db.collection::<Document>("posts"),
        }
    }

    pub async fn list(&self) -> Result<Vec<Location>, CustomError> {
        self.collection
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch locations", e))?
            .try_collect()
            .await
            .map_err(|e| CustomError::storage("Failed to collect locations", e))
    }

    pub async fn get_by_id(&self, id: &ObjectId) -> Result<Option<Location>, CustomError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch location", e))
    }

    pub async fn find_by_ids(
        &self,
        ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, Location>, CustomError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let locations: Vec<Location> = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch locations", e))?
            .try_collect()
            .await
            .map_err(|e| CustomError::storage("Failed to collect locations", e))?;

        Ok(locations.into_iter().map(|l| (l.id, l)).collect())
    }

    pub async fn create(&self, request: LocationRequest) -> Result<Location, CustomError> {
        validate_text("Name", &request.name, Some(MAX_TITLE_LENGTH))?;

        let location = Location {
            id: ObjectId::new(),
            name: request.name,
            is_published: request.is_published,
            created_at: Utc::now(),
        };

        self.collection
            .insert_one(&location)
            .await
            .map_err(|e| CustomError::storage("Failed to create location", e))?;

        info!("Location {} created", location.name);
        Ok(location)
    }

    pub async fn update(
        &self,
        id: &ObjectId,
        request: LocationRequest,
    ) -> Result<Location, CustomError> {
        validate_text("Name", &request.name, Some(MAX_TITLE_LENGTH))?;

        let mut location = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Location not found".to_string()))?;
        location.name = request.name;
        location.is_published = request.is_published;

        self.collection
            .replace_one(doc! { "_id": id }, &location)
            .await
            .map_err(|e| CustomError::storage("Failed to update location", e))?;

        Ok(location)
    }

    /// Remove a location; its posts stay and lose the reference.
    pub async fn delete(&self, id: &ObjectId) -> Result<(), CustomError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| CustomError::storage("Failed to delete location", e))?;

        if result.deleted_count == 0 {
            return Err(CustomError::NotFoundError("Location not found".to_string()));
        }

        let (filter, update) = detach_reference("location_id", id);
        self.posts
            .update_many(filter, update)
            .await
            .map_err(|e| CustomError::storage("Failed to detach posts from location", e))?;

        info!("Location {} deleted", id.to_hex());
        Ok(())
    }
}
