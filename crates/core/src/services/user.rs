//! User service.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rollcall_common::{AppError, AppResult, IdGenerator};
use rollcall_db::{
    entities::{user, user::UserRole},
    repositories::{DepartmentRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    department_repo: DepartmentRepository,
    id_gen: IdGenerator,
}

/// Input for registering a user directly (without an account request).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserInput {
    #[validate(length(min = 1, max = 128))]
    pub first_name: String,

    #[validate(length(min = 1, max = 128))]
    pub last_name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 64))]
    pub school_id: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for updating a user profile.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub last_name: Option<String>,

    #[validate(length(max = 1024))]
    pub profile_picture_url: Option<String>,

    /// Department to move the user to; looked up and snapshotted.
    pub department_id: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, department_repo: DepartmentRepository) -> Self {
        Self {
            user_repo,
            department_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user directly.
    ///
    /// Self-registered accounts start unverified; accounts provisioned via
    /// request approval are verified by construction.
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_school_id(&input.school_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A user already exists with this school ID".to_string(),
            ));
        }
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(
                "A user already exists with this email".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let model = user::ActiveModel {
            id: Set(user_id),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            school_id: Set(input.school_id),
            password_hash: Set(password_hash),
            role: Set(UserRole::User),
            department_id: Set(None),
            department_name: Set(None),
            profile_picture_url: Set(None),
            verified: Set(false),
            token: Set(Some(token)),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;

        tracing::info!(user_id = %user.id, school_id = %user.school_id, "User registered");

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user by school ID.
    pub async fn get_by_school_id(&self, school_id: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_school_id(school_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(school_id.to_string()))
    }

    /// Authenticate a user by bearer token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate by email or school ID plus password.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> AppResult<user::Model> {
        let user = match self.user_repo.find_by_email(identifier).await? {
            Some(user) => Some(user),
            None => self.user_repo.find_by_school_id(identifier).await?,
        }
        .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Regenerate a user's authentication token.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(new_token.clone()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await?;

        Ok(new_token)
    }

    /// Update a user profile.
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(url) = input.profile_picture_url {
            active.profile_picture_url = Set(Some(url));
        }
        if let Some(department_id) = input.department_id {
            let department = self
                .department_repo
                .find_by_id(&department_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Department {department_id} not found"))
                })?;
            active.department_id = Set(Some(department.id));
            active.department_name = Set(Some(department.name));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Change a user's role.
    pub async fn update_role(&self, id: &str, role: UserRole) -> AppResult<user::Model> {
        let user = self.user_repo.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();
        active.role = Set(role);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete a user.
    ///
    /// The account record and its bearer credential live on the same row,
    /// so one delete removes both; any store failure surfaces to the caller
    /// rather than leaving half an account behind.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.user_repo.delete_by_id(id).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    /// List users (paginated).
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<user::Model>> {
        self.user_repo.list(limit, offset).await
    }
}

/// Hash a password with Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against an Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_verifies_and_differs() {
        let hash = hash_password("secret1!").unwrap();

        assert_ne!(hash, "secret1!");
        assert!(verify_password("secret1!", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("secret1!").unwrap();
        let b = hash_password("secret1!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_register_input_rejects_short_password() {
        let input = RegisterUserInput {
            first_name: "Ana".to_string(),
            last_name: "Cruz".to_string(),
            email: "ana@x.com".to_string(),
            school_id: "S100".to_string(),
            password: "short".to_string(),
        };

        assert!(input.validate().is_err());
    }
}
