use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{BillingError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Admin,
    Finance,
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "admin",
            Role::Finance => "finance",
            Role::Viewer => "viewer",
        })
    }
}

/// Identity claims as handed over by whatever verified the caller's credential.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Identity {
    #[serde(default)]
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub role: Role,
}

/// The caller on whose behalf a core operation runs. Every read and write is
/// scoped to `company_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    pub role: Role,
}

impl Session {
    pub fn new(company_id: Uuid) -> Self {
        Self {
            company_id,
            user_id: None,
            role: Role::default(),
        }
    }

    pub fn from_identity(identity: &Identity) -> Result<Self> {
        let company_id = identity.company_id.ok_or(BillingError::Unauthenticated)?;
        Ok(Self {
            company_id,
            user_id: identity.user_id,
            role: identity.role,
        })
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_without_company_is_rejected() {
        let identity = Identity {
            company_id: None,
            user_id: Some(Uuid::new_v4()),
            role: Role::Finance,
        };
        assert!(matches!(
            Session::from_identity(&identity),
            Err(BillingError::Unauthenticated)
        ));
    }

    #[test]
    fn identity_carries_through() {
        let company = Uuid::new_v4();
        let identity = Identity {
            company_id: Some(company),
            user_id: None,
            role: Role::Viewer,
        };
        let session = Session::from_identity(&identity).unwrap();
        assert_eq!(session.company_id, company);
        assert_eq!(session.role, Role::Viewer);
    }
}
