//! GitHub user entity (PR authors and event senders).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub github_id: i64,
    pub login: String,
    /// Account type as reported by GitHub (`User`, `Bot`, `Organization`)
    pub account_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pull_request::Entity")]
    PullRequest,
    #[sea_orm(has_many = "super::push_event::Entity")]
    PushEvent,
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequest.def()
    }
}

impl Related<super::push_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PushEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
