//! Ownership and role checks which cannot be expressed as route layers

use yamdb_types::claim::{Authored, Authorization, Role};

use crate::{
    auth::token::CurrentUser,
    error::{ApiError, ApiResult},
};

const MODERATING_ROLES: [Role; 2] = [Role::Moderator, Role::Admin];

/// Author can modify own review or comment, moderators and admins can modify any
pub fn can_modify(user: &CurrentUser, resource: &impl Authored) -> bool {
    resource.author_id() == user.id || user.has_any_role(&MODERATING_ROLES)
}

pub fn ensure_can_modify(user: &CurrentUser, resource: &impl Authored) -> ApiResult<()> {
    if can_modify(user, resource) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only author or moderator can change this resource".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owned(i64);

    impl Authored for Owned {
        fn author_id(&self) -> i64 {
            self.0
        }
    }

    fn user(id: i64, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            username: format!("user{id}"),
            role,
            is_staff: false,
        }
    }

    #[test]
    fn test_author_can_modify() {
        assert!(can_modify(&user(1, Role::User), &Owned(1)));
        assert!(!can_modify(&user(2, Role::User), &Owned(1)));
        assert!(ensure_can_modify(&user(2, Role::User), &Owned(1)).is_err());
    }

    #[test]
    fn test_moderators_can_modify() {
        assert!(can_modify(&user(2, Role::Moderator), &Owned(1)));
        assert!(can_modify(&user(3, Role::Admin), &Owned(1)));
    }
}
