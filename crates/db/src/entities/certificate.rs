//! Certificate entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A certificate issued for attending an event. Issued at most once per
/// event/user pair.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificate")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub event_id: String,

    pub user_id: String,

    #[sea_orm(unique)]
    pub serial: String,

    pub issued_at: DateTimeWithTimeZone,

    /// Whether the certificate email went out. Render/send failures leave
    /// this false; delivery is advisory and retried manually.
    #[sea_orm(default_value = false)]
    pub emailed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
