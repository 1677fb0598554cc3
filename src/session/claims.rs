use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Role;

/// Fields the gateway reads from an access token.
///
/// The signature is not checked here; the backend verifies every token it
/// receives, so these values only drive UI state and early role rejection.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Claims {
    pub sub: Option<String>,
    pub role: Option<Role>,
    pub exp: Option<i64>,
}

impl Claims {
    /// Whether the token's `exp` lies before `now_ts` (seconds)
    pub fn is_expired(&self, now_ts: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_ts)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Subject {
    Text(String),
    Number(i64),
}

/// Role name as issued; unknown names read as None
struct RoleName(Option<Role>);

impl<'de> Deserialize<'de> for RoleName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|raw| RoleName(parse_role(&raw)))
    }
}

/// Payload as issued: a single `role`, or Spring-style `roles`/`authorities` lists
#[derive(Deserialize)]
struct TokenClaims {
    #[serde(default)]
    sub: Option<Subject>,
    #[serde(default)]
    role: Option<RoleName>,
    #[serde(default)]
    roles: Vec<RoleName>,
    #[serde(default)]
    authorities: Vec<RoleName>,
    #[serde(default)]
    exp: Option<i64>,
}

impl From<TokenClaims> for Claims {
    fn from(token: TokenClaims) -> Self {
        let role = token
            .role
            .and_then(|name| name.0)
            .or_else(|| {
                token
                    .roles
                    .into_iter()
                    .chain(token.authorities)
                    .find_map(|name| name.0)
            });

        Claims {
            sub: token.sub.map(|sub| match sub {
                Subject::Text(text) => text,
                Subject::Number(n) => n.to_string(),
            }),
            role,
            exp: token.exp,
        }
    }
}

/// Reading, not verifying: signature, expiry and audience checks are off
fn read_only_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Read the payload of a JWT, returning None for anything malformed
pub fn decode_claims(token: &str) -> Option<Claims> {
    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &read_only_validation())
        .ok()
        .map(|data| data.claims.into())
}

/// Accepts `broker`, `BROKER` and `ROLE_BROKER` spellings
fn parse_role(raw: &str) -> Option<Role> {
    let lower = raw.to_ascii_lowercase();
    match lower.strip_prefix("role_").unwrap_or(&lower) {
        "broker" => Some(Role::Broker),
        "agent" => Some(Role::Agent),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &serde_json::Value) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    encode(&Header::default(), payload, &EncodingKey::from_secret(b"test-secret"))
        .expect("encode test token")
}
