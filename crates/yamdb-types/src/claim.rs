use std::{fmt::Display, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

pub trait TimeLimited {
    fn set_validity(&mut self, until: SystemTime);
    fn check_validity(&self) -> bool;
}

/// Role based view of an authenticated principal.
pub trait Authorization {
    fn role(&self) -> Role;

    /// Staff accounts may manage the user directory regardless of role.
    fn is_staff(&self) -> bool {
        false
    }

    fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    fn is_moderator(&self) -> bool {
        self.role() == Role::Moderator
    }

    fn has_role(&self, role: Role) -> bool {
        self.role() == role
    }

    fn has_any_role<'a, I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = &'a Role>,
    {
        roles.into_iter().any(|role| self.has_role(*role))
    }
}

/// Resource owned by a single user account.
pub trait Authored {
    fn author_id(&self) -> i64;
}

/// Payload of bearer tokens issued to API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClaim {
    /// User id
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub exp: u64,
}

impl ApiClaim {
    /// New claim, validity is set when token is issued
    pub fn new_expired(id: i64, username: impl Into<String>, role: Role) -> Self {
        Self {
            sub: id.to_string(),
            username: username.into(),
            role,
            exp: 0,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

impl Authorization for ApiClaim {
    fn role(&self) -> Role {
        self.role
    }
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl TimeLimited for ApiClaim {
    fn set_validity(&mut self, until: SystemTime) {
        self.exp = unix_secs(until);
    }

    fn check_validity(&self) -> bool {
        self.exp > unix_secs(SystemTime::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role() {
        let claim = ApiClaim::new_expired(123, "critic", Role::Moderator);
        assert_eq!(claim.user_id(), Some(123));
        assert!(claim.is_moderator());
        assert!(!claim.is_admin());
        assert!(!claim.is_staff());
        assert!(claim.has_any_role(&[Role::Admin, Role::Moderator]));
        assert!(!claim.has_any_role(&[Role::Admin]));
    }

    #[test]
    fn test_role_parsing() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&Role::Moderator).unwrap();
        assert_eq!(json, "\"moderator\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_validity() {
        let mut claim = ApiClaim::new_expired(1, "u", Role::User);
        assert!(!claim.check_validity());
        claim.set_validity(SystemTime::now() + std::time::Duration::from_secs(60));
        assert!(claim.check_validity());
    }
}
