// JWT token creation and verification
// Operator tokens carry the actor role and expire after 8 hours

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::actor::ActorRole;

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (operator id)
/// * `role` - Actor role passed to every mutating registry call
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Operator ID (subject)
    pub sub: Uuid,
    pub role: ActorRole,
    /// Expiry timestamp (seconds since epoch)
    pub exp: usize,
}

/// Creates a JWT token for an operator
///
/// # Arguments
/// * `operator_id` - The operator's ID to include in the token
/// * `role` - The operator's actor role
/// * `secret` - The secret key for signing (from configuration)
///
/// # Token Properties
/// - Expires after 8 hours
/// - Signed with HS256 algorithm
///
/// # Example
/// ```
/// use paddle_registry_api::auth::jwt::create_token;
/// use paddle_registry_api::domain::actor::ActorRole;
/// use uuid::Uuid;
///
/// let token = create_token(Uuid::new_v4(), ActorRole::Organizer, "your-secret-key")
///     .expect("valid token");
/// assert!(!token.is_empty());
/// ```
pub fn create_token(operator_id: Uuid, role: ActorRole, secret: &str) -> Result<String, String> {
    let expiry = Utc::now() + Duration::hours(8);
    let claims = Claims {
        sub: operator_id,
        role,
        exp: expiry.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies and decodes a JWT token
///
/// # Example
/// ```
/// use paddle_registry_api::auth::jwt::{create_token, verify_token};
/// use paddle_registry_api::domain::actor::ActorRole;
/// use uuid::Uuid;
///
/// let operator_id = Uuid::new_v4();
/// let token = create_token(operator_id, ActorRole::Admin, "secret").unwrap();
///
/// let claims = verify_token(&token, "secret").expect("valid token");
/// assert_eq!(claims.sub, operator_id);
/// assert_eq!(claims.role, ActorRole::Admin);
/// ```
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
