use crate::application::ports::SessionTokenCodec;
use crate::domain::Principal;

use super::GatewayError;

/// Result of reading the caller's session token.
#[derive(Debug, Clone)]
pub enum TokenResolution {
    Authorized(Principal),
    Unauthorized,
}

impl TokenResolution {
    /// Absent, malformed, tampered and expired tokens all resolve to `Unauthorized`.
    pub fn resolve(codec: &dyn SessionTokenCodec, raw_token: Option<&str>) -> Self {
        let Some(token) = raw_token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self::Unauthorized;
        };

        match codec.open(token) {
            Ok(principal) => Self::Authorized(principal),
            Err(e) => {
                tracing::debug!(reason = %e, "Session token rejected");
                Self::Unauthorized
            }
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authorized(principal) => Some(principal),
            Self::Unauthorized => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    AnyPrincipal,
    Admin,
}

impl AccessRequirement {
    pub fn authorize<'a>(
        &self,
        resolution: &'a TokenResolution,
    ) -> Result<&'a Principal, GatewayError> {
        let principal = resolution.principal().ok_or(GatewayError::Unauthenticated)?;

        match self {
            Self::AnyPrincipal => Ok(principal),
            Self::Admin if principal.is_admin() => Ok(principal),
            Self::Admin => {
                tracing::warn!(principal = %principal.id, "Admin operation denied");
                Err(GatewayError::Forbidden)
            }
        }
    }
}
