//! User entity <-> model mapper

use relay_core::entities::User;
use relay_core::value_objects::Snowflake;

use crate::models::UserModel;

/// Convert UserModel to User entity
///
/// The password hash stays behind in the model; it is never part of the
/// domain entity.
impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: Snowflake::new(model.id),
            username: model.username,
            email: model.email,
            is_active: model.is_active,
            last_login: model.last_login,
            login_attempts: model.login_attempts,
            locked_until: model.locked_until,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
