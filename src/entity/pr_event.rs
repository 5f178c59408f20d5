//! Immutable pull request event row.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pr_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Webhook action (`opened`, `closed`, `labeled`, ...)
    pub event_type: String,
    pub created_at: DateTimeUtc,
    pub payload: Option<Json>,
    pub pull_request_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pull_request::Entity",
        from = "Column::PullRequestId",
        to = "super::pull_request::Column::Id"
    )]
    PullRequest,
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
