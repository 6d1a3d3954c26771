use std::collections::HashMap;

use chrono::Utc;
use futures_util::TryStreamExt;
use log::info;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};

use crate::user::model::{LoginRequest, ProfileUpdateRequest, RegistrationRequest, User};
use crate::utils::error::CustomError;
use crate::utils::hashing;
use crate::utils::validation::{validate_email, validate_password, validate_username};

pub struct UserService {
    collection: Collection<User>,
}

impl UserService {
    pub fn new(db: &Database) -> Self {
        UserService {
            collection: db.collection::<User>("users"),
        }
    }

    async fn username_exists(
        &self,
        username: &str,
        except: Option<&ObjectId>,
    ) -> Result<bool, CustomError> {
        let mut filter = doc! { "username": username };
        if let Some(id) = except {
            filter.insert("_id", doc! { "$ne": id });
        }
        let count = self
            .collection
            .count_documents(filter)
            .await
            .map_err(|e| CustomError::storage("Failed to check username existence", e))?;
        Ok(count > 0)
    }

    pub async fn create_user(&self, request: RegistrationRequest) -> Result<User, CustomError> {
        validate_username(&request.username)?;
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        if self.username_exists(&request.username, None).await? {
            return Err(CustomError::ConflictError(
                "Username already exists".to_string(),
            ));
        }

        let hashed_password = hashing::hash_password(&request.password)
            .map_err(|e| CustomError::InternalServerError(e.to_string()))?;

        let now = Utc::now();
        let user = User {
            id: ObjectId::new(),
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            password: hashed_password,
            is_staff: false,
            created_at: now,
            updated_at: now,
        };

        self.collection
            .insert_one(&user)
            .await
            .map_err(|e| CustomError::write("Failed to create user", "Username already exists", e))?;

        info!("User {} registered", user.username);
        Ok(user)
    }

    pub async fn authenticate_user(&self, login: &LoginRequest) -> Result<User, CustomError> {
        let user = self
            .get_by_username(&login.username)
            .await?
            .ok_or_else(|| CustomError::UnauthorizedError("Invalid credentials".to_string()))?;

        if !hashing::verify_password(&login.password, &user.password)
            .map_err(|_| CustomError::InternalServerError("Invalid credentials".to_string()))?
        {
            return Err(CustomError::UnauthorizedError(
                "Invalid credentials".to_string(),
            ));
        }

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &ObjectId) -> Result<Option<User>, CustomError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch user", e))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, CustomError> {
        self.collection
            .find_one(doc! { "username": username })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch user", e))
    }

    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<HashMap<ObjectId, User>, CustomError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users: Vec<User> = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .await
            .map_err(|e| CustomError::storage("Failed to fetch users", e))?
            .try_collect()
            .await
            .map_err(|e| CustomError::storage("Failed to collect users", e))?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Staff accounts manage categories and locations.
    pub async fn require_staff(&self, id: &ObjectId) -> Result<User, CustomError> {
        match self.get_by_id(id).await? {
            Some(user) if user.is_staff => Ok(user),
            _ => Err(CustomError::ForbiddenError(
                "Staff privileges required".to_string(),
            )),
        }
    }

    pub async fn update_profile(
        &self,
        id: &ObjectId,
        request: ProfileUpdateRequest,
    ) -> Result<User, CustomError> {
        validate_username(&request.username)?;
        validate_email(&request.email)?;

        let mut user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("User not found".to_string()))?;

        if self.username_exists(&request.username, Some(id)).await? {
            return Err(CustomError::ConflictError(
                "Username already exists".to_string(),
            ));
        }

        user.username = request.username;
        user.email = request.email;
        user.first_name = request.first_name;
        user.last_name = request.last_name;
        user.updated_at = Utc::now();

        self.collection
            .replace_one(doc! { "_id": id }, &user)
            .await
            .map_err(|e| CustomError::write("Failed to update profile", "Username already exists", e))?;

        Ok(user)
    }
}
