use serde::{Deserialize, Serialize};

/// ユーザーロール
///
/// ロール行が存在しないユーザーは customer として扱う
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}
