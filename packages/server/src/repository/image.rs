use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::entity::{comment, image, user};

/// Fields of an image row supplied by the uploader.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub description: String,
    pub user_id: i32,
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewImage) -> Result<image::Model, DbErr> {
    image::ActiveModel {
        filename: Set(new.filename),
        description: Set(new.description),
        user_id: Set(new.user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<image::Model>, DbErr> {
    image::Entity::find_by_id(id).one(db).await
}

pub async fn find_with_owner<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<(image::Model, Option<user::Model>)>, DbErr> {
    image::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(db)
        .await
}

/// Every image with its owner, oldest first.
pub async fn list_with_owners<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<(image::Model, Option<user::Model>)>, DbErr> {
    image::Entity::find()
        .find_also_related(user::Entity)
        .order_by_asc(image::Column::Id)
        .all(db)
        .await
}

/// Delete an image row together with the comments that reference it.
///
/// Returns `false` when the image did not exist.
pub async fn delete_with_comments(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    let removed_comments = comment::Entity::delete_many()
        .filter(comment::Column::ImageId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;

    let removed = image::Entity::delete_by_id(id)
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;

    info!(image_id = id, removed_comments, "Deleted image");
    Ok(removed > 0)
}
