use crate::error::{AppError, Result};
use crate::user_models::UserRecord;
use crate::user_storage::UserStorage;
use anyhow::Context;
use tracing::{info, warn};

async fn hash_password(password: &str, cost: u32) -> anyhow::Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")
}

/// A hash we cannot parse counts as a mismatch.
async fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("Password verification task failed")?;

    Ok(verified.unwrap_or_else(|e| {
        warn!("Stored password hash is unusable: {}", e);
        false
    }))
}

pub async fn register(storage: &UserStorage, username: &str, password: &str, cost: u32) -> Result<()> {
    if storage.get(username).await.is_some() {
        return Err(AppError::DuplicateUser);
    }

    let password_hash = hash_password(password, cost).await?;

    if !storage.insert_new(username, UserRecord::new(password_hash)).await? {
        return Err(AppError::DuplicateUser);
    }

    info!("Registered user {}", username);
    Ok(())
}

/// Checks `password` against the stored hash. Unknown users and wrong
/// passwords are the same error.
pub async fn authenticate(storage: &UserStorage, username: &str, password: &str) -> Result<String> {
    let Some(user) = storage.get(username).await else {
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash).await? {
        return Err(AppError::InvalidCredentials);
    }

    Ok(username.to_string())
}

pub async fn change_password(
    storage: &UserStorage,
    username: &str,
    current: &str,
    new: &str,
    cost: u32,
) -> Result<()> {
    let Some(user) = storage.get(username).await else {
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(current, &user.password_hash).await? {
        return Err(AppError::InvalidCredentials);
    }

    let new_hash = hash_password(new, cost).await?;
    storage
        .update(username, |record| record.password_hash = new_hash)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    info!("Password changed for {}", username);
    Ok(())
}
