use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};

/// Usernames that would clash with fixed API paths.
pub const RESERVED_USERNAMES: &[&str] = &["me"];

#[derive(Debug, Clone, PartialEq, Eq, Validate, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[garde(transparent)]
pub struct ValidEmail(#[garde(email, length(max = 254))] String);

#[cfg(feature = "e2e-tests")]
impl ValidEmail {
    pub fn cheat(email: String) -> Self {
        ValidEmail(email)
    }
}

impl FromStr for ValidEmail {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let email = ValidEmail(s.to_string());
        email.validate()?;
        Ok(email)
    }
}

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn not_reserved(value: &str, _ctx: &()) -> garde::Result {
    if RESERVED_USERNAMES.contains(&value) {
        Err(garde::Error::new(format!("username {value} is reserved")))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Validate, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[garde(transparent)]
pub struct ValidUsername(
    #[garde(pattern(r"^[a-zA-Z0-9_-]{3,16}$"), custom(not_reserved))] String,
);

#[cfg(feature = "e2e-tests")]
impl ValidUsername {
    pub fn cheat(username: String) -> Self {
        ValidUsername(username)
    }
}

impl FromStr for ValidUsername {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let username = ValidUsername(s.to_string());
        username.validate()?;
        Ok(username)
    }
}

impl AsRef<str> for ValidUsername {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ValidUsername {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}

/// Release year cannot be in the future.
pub fn validate_year(value: &i32, _ctx: &()) -> garde::Result {
    let now = current_year();
    if *value > now {
        Err(garde::Error::new(format!(
            "year {value} cannot be greater than {now}"
        )))
    } else {
        Ok(())
    }
}
