//! Job posting entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    pub company_name: String,

    #[sea_orm(nullable)]
    pub location: Option<String>,

    pub posted_at: Option<DateTimeUtc>,

    /// Jobs without an expiry stay active indefinitely
    pub expires_at: Option<DateTimeUtc>,

    pub posted_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::PostedBy",
        to = "super::profile::Column::Id",
        on_delete = "SetNull"
    )]
    Poster,

    #[sea_orm(has_many = "super::job_skill::Entity")]
    JobSkills,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Poster.def()
    }
}

impl Related<super::job_skill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobSkills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
