use chrono::Utc;
use sea_orm::*;
use tracing::{debug, info};

use crate::entity::user;
use crate::oauth::ProviderProfile;

pub async fn find_by_provider_id<C: ConnectionTrait>(
    db: &C,
    provider_id: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::ProviderId.eq(provider_id))
        .one(db)
        .await
}

/// Look up the local user for a provider identity, creating it on first login.
///
/// The display name is taken from the profile only at creation time.
pub async fn find_or_create<C: ConnectionTrait>(
    db: &C,
    profile: &ProviderProfile,
) -> Result<user::Model, DbErr> {
    if let Some(existing) = find_by_provider_id(db, &profile.id).await? {
        return Ok(existing);
    }

    let new_user = user::ActiveModel {
        provider_id: Set(profile.id.clone()),
        username: Set(profile.login.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_user.insert(db).await {
        Ok(user) => {
            info!(user_id = user.id, provider_id = %user.provider_id, "Created user");
            Ok(user)
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!("Concurrent first login: unique constraint caught on insert");
            find_by_provider_id(db, &profile.id)
                .await?
                .ok_or(DbErr::RecordNotFound(format!(
                    "user with provider id {}",
                    profile.id
                )))
        }
        Err(e) => Err(e),
    }
}
