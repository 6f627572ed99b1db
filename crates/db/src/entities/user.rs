//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role carried on a provisioned account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    #[default]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl UserRole {
    /// String form used in API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// A provisioned account.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    /// Authoritative key, generated by the auth subsystem and never
    /// reassigned.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub first_name: String,

    pub last_name: String,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub school_id: String,

    /// Argon2 password hash.
    pub password_hash: String,

    pub role: UserRole,

    /// Department reference, unset when the department name could not be
    /// resolved at provisioning time.
    #[sea_orm(nullable)]
    pub department_id: Option<String>,

    /// Department name snapshot taken at provisioning time.
    #[sea_orm(nullable)]
    pub department_name: Option<String>,

    #[sea_orm(nullable)]
    pub profile_picture_url: Option<String>,

    /// Accounts provisioned through request approval are verified by
    /// construction.
    #[sea_orm(default_value = false)]
    pub verified: bool,

    /// Opaque bearer credential.
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,

    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,

    #[sea_orm(has_many = "super::excuse_letter::Entity")]
    ExcuseLetters,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl Related<super::excuse_letter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExcuseLetters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
