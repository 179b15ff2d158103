//! Profile entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub first_name: String,

    pub last_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    pub batch_year: i32,

    pub faculty: String,

    #[sea_orm(nullable)]
    pub current_position: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub profile_image_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::profile_skill::Entity")]
    ProfileSkills,

    #[sea_orm(has_many = "super::event::Entity")]
    OrganizedEvents,

    #[sea_orm(has_many = "super::job::Entity")]
    PostedJobs,
}

impl Related<super::profile_skill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProfileSkills.def()
    }
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrganizedEvents.def()
    }
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostedJobs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
