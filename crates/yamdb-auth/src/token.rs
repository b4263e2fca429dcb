use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use tracing::debug;
use yamdb_types::claim::TimeLimited;

use crate::error::{Error, Result};

pub const MIN_SECRET_LEN: usize = 32;

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

/// Issues and validates HS256 signed bearer tokens
pub struct TokenManager {
    keys: Keys,
    default_validity: std::time::Duration,
    header: Header,
    validation: Validation,
}

impl TokenManager {
    pub fn new(secret: impl AsRef<[u8]>, default_validity: std::time::Duration) -> Result<Self> {
        if secret.as_ref().len() < MIN_SECRET_LEN {
            return Err(Error::WeakSecret(MIN_SECRET_LEN));
        }
        let validation = Validation::default();
        let header = Header::default();
        Ok(Self {
            keys: Keys::new(secret),
            default_validity,
            header,
            validation,
        })
    }

    pub fn issue(&self, mut claims: impl serde::Serialize + TimeLimited) -> Result<String> {
        let now = std::time::SystemTime::now();
        let validity = now + self.default_validity;
        claims.set_validity(validity);
        let token = encode(&self.header, &claims, &self.keys.encoding)?;
        Ok(token)
    }

    #[cfg(test)]
    pub fn issue_expired(&self, mut claims: impl serde::Serialize + TimeLimited) -> Result<String> {
        let now = std::time::SystemTime::now();
        let validity = now - self.default_validity;
        claims.set_validity(validity);
        let token = encode(&self.header, &claims, &self.keys.encoding)?;
        Ok(token)
    }

    pub fn validate<T>(&self, token: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let data = decode::<T>(token, &self.keys.decoding, &self.validation).map_err(|e| {
            debug!("Token rejected: {e}");
            e
        })?;
        Ok(data.claims)
    }

    pub fn default_validity(&self) -> std::time::Duration {
        self.default_validity
    }
}

#[cfg(test)]
mod tests {
    use yamdb_types::claim::{ApiClaim, Role};

    use super::*;

    const SECRET: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_token() {
        let claim = ApiClaim::new_expired(123, "critic", Role::Moderator);
        let manager = TokenManager::new(SECRET, std::time::Duration::from_secs(3600)).unwrap();
        let token = manager.issue(claim).unwrap();
        let res = manager.validate::<ApiClaim>(&token);
        assert!(res.is_ok());
        let claim = res.unwrap();
        assert_eq!(claim.sub, "123");
        assert_eq!(claim.username, "critic");
        assert_eq!(claim.role, Role::Moderator);
        assert!(claim.check_validity());
    }

    #[test]
    fn test_token_expiration() {
        let claim = ApiClaim::new_expired(123, "critic", Role::User);
        let manager = TokenManager::new(SECRET, std::time::Duration::from_secs(3600)).unwrap();
        let token = manager.issue_expired(claim).unwrap();
        let res = manager.validate::<ApiClaim>(&token);
        let err = res.unwrap_err();
        assert!(err.is_expired(), "Unexpected error: {err}");
    }

    #[test]
    fn test_foreign_token() {
        let claim = ApiClaim::new_expired(1, "critic", Role::Admin);
        let other = TokenManager::new(
            b"another-secret-another-secret-xx",
            std::time::Duration::from_secs(3600),
        )
        .unwrap();
        let token = other.issue(claim).unwrap();
        let manager = TokenManager::new(SECRET, std::time::Duration::from_secs(3600)).unwrap();
        let err = manager.validate::<ApiClaim>(&token).unwrap_err();
        assert!(!err.is_expired());
    }

    #[test]
    fn test_weak_secret() {
        let res = TokenManager::new(b"short", std::time::Duration::from_secs(1));
        assert!(matches!(res, Err(Error::WeakSecret(MIN_SECRET_LEN))));
    }
}
