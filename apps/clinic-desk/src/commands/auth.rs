//! # Auth Commands
//!
//! Staff accounts. Passwords are stored as argon2 hashes and never leave
//! the database layer.

use tracing::{info, warn};

use clinic_core::{User, UserRole};

use crate::error::ApiError;
use crate::state::DbState;

/// Creates a staff account. `role` is "Admin" or "Staff" (any case).
pub async fn create_user(db: &DbState, username: &str, password: &str, role: &str) -> Result<User, ApiError> {
    let role: UserRole = role.parse()?;
    let user = db.inner().users().create_user(username, password, role).await?;
    info!(id = user.id, username = %user.username, role = %user.role, "User created");
    Ok(user)
}

/// Checks a username and password.
///
/// Unknown users and wrong passwords get the same `UNAUTHORIZED` answer.
pub async fn login(db: &DbState, username: &str, password: &str) -> Result<User, ApiError> {
    match db.inner().users().verify_user(username.trim(), password).await? {
        Some(user) => {
            info!(username = %user.username, "Login succeeded");
            Ok(user)
        }
        None => {
            warn!(username = %username.trim(), "Login refused");
            Err(ApiError::unauthorized())
        }
    }
}

pub async fn list_users(db: &DbState) -> Result<Vec<User>, ApiError> {
    Ok(db.inner().users().list_users().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::db;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_login() {
        let db = db().await;
        create_user(&db, "frontdesk", "s3cret-pass", "staff").await.unwrap();

        let user = login(&db, " frontdesk ", "s3cret-pass").await.unwrap();
        assert_eq!(user.role, UserRole::Staff);

        let err = login(&db, "frontdesk", "wrong-pass").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        let err = login(&db, "nobody", "s3cret-pass").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_create_user_errors() {
        let db = db().await;
        create_user(&db, "admin", "admin1234", "Admin").await.unwrap();

        let err = create_user(&db, "admin", "another-pass", "Admin").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err = create_user(&db, "nurse", "short", "Staff").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_user(&db, "nurse", "long-enough", "Doctor").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert_eq!(list_users(&db).await.unwrap().len(), 1);
    }
}
