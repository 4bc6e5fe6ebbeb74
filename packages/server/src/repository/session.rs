use chrono::{DateTime, Duration, Utc};
use sea_orm::*;
use tracing::debug;

use crate::entity::{session, user};
use crate::utils::session::new_token;

/// Open a session for `user_id` lasting `ttl_hours`.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    ttl_hours: i64,
) -> Result<session::Model, DbErr> {
    let now = Utc::now();
    session::ActiveModel {
        token: Set(new_token()),
        user_id: Set(user_id),
        created_at: Set(now),
        expires_at: Set(now + Duration::hours(ttl_hours)),
    }
    .insert(db)
    .await
}

/// Resolve a session token to its user. Expired sessions are removed and
/// resolve to `None`.
pub async fn find_user<C: ConnectionTrait>(
    db: &C,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<user::Model>, DbErr> {
    let Some((session, user)) = session::Entity::find_by_id(token.to_owned())
        .find_also_related(user::Entity)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    if session.expires_at <= now {
        debug!(user_id = session.user_id, "Session expired");
        delete(db, token).await?;
        return Ok(None);
    }

    Ok(user)
}

pub async fn delete<C: ConnectionTrait>(db: &C, token: &str) -> Result<(), DbErr> {
    session::Entity::delete_by_id(token.to_owned())
        .exec(db)
        .await?;
    Ok(())
}
