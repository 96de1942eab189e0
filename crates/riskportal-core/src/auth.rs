//! Credentials injected into the gateway, and role gating.
//!
//! The core never looks up a token on its own; callers build
//! [`Credentials`] (from flags, env or config) and hand them in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Vendor,
    #[serde(rename = "RA_Team")]
    RaTeam,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Vendor => "Vendor",
            Role::RaTeam => "RA_Team",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "vendor" => Ok(Role::Vendor),
            "ra_team" | "ra" => Ok(Role::RaTeam),
            _ => Err(AuthError::UnknownRole(s.to_string())),
        }
    }
}

/// Bearer token plus the role it was issued for.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    role: Role,
}

impl Credentials {
    /// # Errors
    ///
    /// [`AuthError::MissingToken`] for a blank token.
    pub fn new(token: impl Into<String>, role: Role) -> Result<Self, AuthError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(Self { token, role })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Fail unless these credentials carry `required`.
    pub fn require(&self, required: Role) -> Result<(), AuthError> {
        if self.role == required {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                required,
                actual: self.role,
            })
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip() {
        assert_eq!("RA_Team".parse::<Role>().unwrap(), Role::RaTeam);
        assert_eq!("vendor".parse::<Role>().unwrap(), Role::Vendor);
        assert_eq!(Role::RaTeam.to_string(), "RA_Team");
        assert!(matches!("admin".parse::<Role>(), Err(AuthError::UnknownRole(_))));
    }

    #[test]
    fn blank_token_is_rejected() {
        assert_eq!(Credentials::new("  ", Role::Vendor), Err(AuthError::MissingToken));
    }

    #[test]
    fn require_checks_role() {
        let creds = Credentials::new("t0k3n", Role::Vendor).unwrap();
        assert!(creds.require(Role::Vendor).is_ok());
        assert_eq!(
            creds.require(Role::RaTeam),
            Err(AuthError::Forbidden {
                required: Role::RaTeam,
                actual: Role::Vendor
            })
        );
    }

    #[test]
    fn debug_hides_token() {
        let creds = Credentials::new("secret", Role::RaTeam).unwrap();
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
