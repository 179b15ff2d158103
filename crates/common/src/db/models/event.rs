//! Event entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub event_name: String,

    pub start_time: DateTimeUtc,

    pub end_time: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub category: Option<String>,

    /// Physical venue, if any
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    /// Link for online events
    #[sea_orm(column_type = "Text", nullable)]
    pub online_link: Option<String>,

    /// Organizer profile
    pub profile_id: i32,

    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ProfileId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Organizer,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
