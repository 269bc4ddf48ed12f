use std::str::FromStr;

use jsonwebtoken::errors::{Error, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AuthConfig;

/// Claims read from an OIDC ID token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Verifies ID tokens issued by the configured identity provider.
pub struct IdTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl IdTokenVerifier {
    pub fn from_config(config: &AuthConfig) -> Result<Self, Error> {
        let algorithm = Algorithm::from_str(&config.algorithm)?;
        let material = config.verification_key.as_bytes();
        let key = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                if material.is_empty() {
                    return Err(ErrorKind::InvalidKeyFormat.into());
                }
                DecodingKey::from_secret(material)
            }
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(material)?,
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(material)?,
            Algorithm::EdDSA => DecodingKey::from_ed_pem(material)?,
        };

        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[&config.client_id]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self { key, validation })
    }

    /// Verify signature, expiry, audience and (when configured) issuer.
    pub fn verify(&self, token: &str) -> Result<IdTokenClaims, Error> {
        Ok(decode::<IdTokenClaims>(token, &self.key, &self.validation)?.claims)
    }
}

/// RP-initiated logout URL at the provider's end-session endpoint.
pub fn logout_url(
    endpoint: &str,
    id_token: Option<&str>,
    post_logout_redirect_uri: &str,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(endpoint)?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(token) = id_token {
            query.append_pair("id_token_hint", token);
        }
        query.append_pair("post_logout_redirect_uri", post_logout_redirect_uri);
    }
    Ok(url)
}
