//! # User Repository
//!
//! Staff accounts for the login screen. Passwords are stored as Argon2
//! PHC strings; plaintext never reaches the database.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use clinic_core::validation::{validate_password, validate_required};
use clinic_core::{User, UserRole};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn find_user(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Creates an account.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for an empty username or a short password
    /// - `UniqueViolation` when the username is taken
    pub async fn create_user(&self, username: &str, password: &str, role: UserRole) -> DbResult<User> {
        let username = validate_required(username, "username")?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        debug!(username = %username, role = %role, "Creating user");

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING *
            "#,
        )
        .bind(&username)
        .bind(&password_hash)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username.clone()),
            other => other,
        })?;

        info!(id = user.id, "User created");
        Ok(user)
    }

    /// Checks a login. `None` for an unknown user or a wrong password.
    pub async fn verify_user(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.find_user(username).await? else {
            warn!(username = %username.trim(), "Login failed: unknown user");
            return Ok(None);
        };

        if verify_password(password, &user.password_hash) {
            info!(id = user.id, "Login succeeded");
            Ok(Some(user))
        } else {
            warn!(username = %user.username, "Login failed: wrong password");
            Ok(None)
        }
    }

    pub async fn list_users(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn count_users(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
