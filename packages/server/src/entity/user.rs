use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Identifier assigned by the OAuth provider.
    #[sea_orm(unique)]
    pub provider_id: String,
    pub username: String,

    #[sea_orm(has_many)]
    pub images: HasMany<super::image::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    #[sea_orm(has_many)]
    pub sessions: HasMany<super::session::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
