use chrono::Utc;
use sea_orm::*;

use crate::entity::{comment, user};

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub image_id: i32,
    pub user_id: i32,
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    new: NewComment,
) -> Result<comment::Model, DbErr> {
    comment::ActiveModel {
        text: Set(new.text),
        image_id: Set(new.image_id),
        user_id: Set(new.user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Comments on an image with their authors, in posting order.
pub async fn list_for_image<C: ConnectionTrait>(
    db: &C,
    image_id: i32,
) -> Result<Vec<(comment::Model, Option<user::Model>)>, DbErr> {
    comment::Entity::find()
        .filter(comment::Column::ImageId.eq(image_id))
        .find_also_related(user::Entity)
        .order_by_asc(comment::Column::Id)
        .all(db)
        .await
}
