//! SeaORM entity models
//!
//! Database entities read by the recommendation engine

mod event;
mod follow;
mod job;
mod job_skill;
mod profile;
mod profile_skill;
mod skill;

pub use profile::{
    Entity as ProfileEntity,
    Model as Profile,
    ActiveModel as ProfileActiveModel,
    Column as ProfileColumn,
};

pub use skill::{
    Entity as SkillEntity,
    Model as Skill,
    ActiveModel as SkillActiveModel,
    Column as SkillColumn,
};

pub use profile_skill::{
    Entity as ProfileSkillEntity,
    Model as ProfileSkill,
    Column as ProfileSkillColumn,
};

pub use follow::{
    Entity as FollowEntity,
    Model as Follow,
    ActiveModel as FollowActiveModel,
    Column as FollowColumn,
};

pub use event::{
    Entity as EventEntity,
    Model as Event,
    ActiveModel as EventActiveModel,
    Column as EventColumn,
};

pub use job::{
    Entity as JobEntity,
    Model as Job,
    ActiveModel as JobActiveModel,
    Column as JobColumn,
};

pub use job_skill::{
    Entity as JobSkillEntity,
    Model as JobSkill,
    Column as JobSkillColumn,
};
