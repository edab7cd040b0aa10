use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokenConfig;

/// Token service for issuing and validating portal access tokens.
///
/// Keys are derived once from the configured signing secret; the service is
/// cheap to clone and safe to share across request handlers.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_minutes: i64,
}

/// Claims carried by a portal access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalClaims {
    /// Subject (account username)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Roles held by the account
    pub roles: Vec<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl PortalClaims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Token response returned to the client.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenService {
    /// Create a new token service from the configured settings.
    pub fn new(config: &TokenConfig) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(anyhow::anyhow!("Token signing secret must not be empty"));
        }
        if config.lifetime_minutes <= 0 {
            return Err(anyhow::anyhow!("Token lifetime must be positive"));
        }

        tracing::info!(
            lifetime_minutes = config.lifetime_minutes,
            "Token service initialized with HS256 key"
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_minutes: config.lifetime_minutes,
        })
    }

    /// Issue an access token expiring one configured lifetime from now.
    pub fn issue(
        &self,
        subject: &str,
        display_name: &str,
        roles: Vec<String>,
    ) -> Result<TokenResponse, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.lifetime_minutes);

        let claims = PortalClaims {
            sub: subject.to_string(),
            name: display_name.to_string(),
            roles,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))?;

        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.lifetime_seconds(),
        })
    }

    /// Validate a token's signature and expiry and return its claims.
    pub fn validate(&self, token: &str) -> Result<PortalClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<PortalClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;

        Ok(token_data.claims)
    }

    /// Token lifetime in seconds (for client info).
    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_config() -> TokenConfig {
        TokenConfig {
            secret: SecretString::new("unit-test-signing-secret-0123456789ab".to_string()),
            lifetime_minutes: 60,
        }
    }

    #[test]
    fn test_service_rejects_empty_secret() {
        let config = TokenConfig {
            secret: SecretString::new(String::new()),
            lifetime_minutes: 60,
        };
        assert!(TokenService::new(&config).is_err());
    }

    #[test]
    fn test_service_rejects_non_positive_lifetime() {
        let config = TokenConfig {
            secret: SecretString::new("unit-test-signing-secret-0123456789ab".to_string()),
            lifetime_minutes: 0,
        };
        assert!(TokenService::new(&config).is_err());
    }

    #[test]
    fn test_issue_and_validate_roundtrip() -> Result<(), anyhow::Error> {
        let service = TokenService::new(&test_config())?;

        let response = service.issue(
            "w.pratt",
            "Wendy Pratt",
            vec!["coordinator".to_string()],
        )?;
        assert!(!response.access_token.is_empty());
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);

        let claims = service.validate(&response.access_token)?;
        assert_eq!(claims.sub, "w.pratt");
        assert_eq!(claims.name, "Wendy Pratt");
        assert!(claims.has_role("coordinator"));
        assert!(!claims.has_role("teacher"));
        assert_eq!(claims.exp - claims.iat, 3600);

        Ok(())
    }

    #[test]
    fn test_validate_rejects_wrong_secret() -> Result<(), anyhow::Error> {
        let issuer = TokenService::new(&test_config())?;
        let other = TokenService::new(&TokenConfig {
            secret: SecretString::new("a-different-signing-secret-0123456789".to_string()),
            lifetime_minutes: 60,
        })?;

        let response = issuer.issue("w.pratt", "Wendy Pratt", vec![])?;
        assert!(other.validate(&response.access_token).is_err());

        Ok(())
    }

    #[test]
    fn test_validate_rejects_expired_token() -> Result<(), anyhow::Error> {
        let config = test_config();
        let service = TokenService::new(&config)?;

        // Encode claims that expired an hour ago with the same key.
        let now = Utc::now().timestamp();
        let claims = PortalClaims {
            sub: "w.pratt".to_string(),
            name: "Wendy Pratt".to_string(),
            roles: vec!["coordinator".to_string()],
            exp: now - 3600,
            iat: now - 7200,
            jti: "expired-jti".to_string(),
        };
        let key = EncodingKey::from_secret(config.secret.expose_secret().as_bytes());
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key)?;

        assert!(service.validate(&token).is_err());

        Ok(())
    }

    #[test]
    fn test_validate_rejects_garbage() -> Result<(), anyhow::Error> {
        let service = TokenService::new(&test_config())?;
        assert!(service.validate("not-a-token").is_err());
        assert!(service.validate("").is_err());
        Ok(())
    }

    #[test]
    fn test_lifetime_drives_expiry() -> Result<(), anyhow::Error> {
        let service = TokenService::new(&TokenConfig {
            secret: SecretString::new("unit-test-signing-secret-0123456789ab".to_string()),
            lifetime_minutes: 15,
        })?;

        let response = service.issue("j.ellis", "James Ellis", vec!["teacher".to_string()])?;
        assert_eq!(response.expires_in, 900);

        let claims = service.validate(&response.access_token)?;
        assert_eq!(claims.exp - claims.iat, 900);

        Ok(())
    }
}
