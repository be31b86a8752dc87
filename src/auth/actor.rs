use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::validator::DecodedClaims;
use crate::errors::AuthResult;
use crate::utils::constants::{DEFAULT_PROPERTIES_CLAIM, DEFAULT_TYPE_CLAIM};

/// Identity asserted by a validated token, keyed by its `type` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "lowercase")]
pub enum PolicyActor {
    User(UserProperties),
    M2m(M2mProperties),
    Patient(PatientProperties),
    Provider(ProviderProperties),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProperties {
    pub id: i64,
    pub email: String,
    pub identity_provider_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct M2mProperties {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProperties {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_provider_user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProperties {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npi: Option<String>,
}

/// Where the actor claims live in the token payload.
///
/// Identity providers usually namespace custom claims, e.g.
/// `https://example.com/type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorClaims {
    #[serde(default)]
    pub namespace: String,
    #[serde(default = "default_type_claim")]
    pub type_claim: String,
    #[serde(default = "default_properties_claim")]
    pub properties_claim: String,
}

impl Default for ActorClaims {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            type_claim: default_type_claim(),
            properties_claim: default_properties_claim(),
        }
    }
}

impl ActorClaims {
    pub fn type_key(&self) -> String {
        format!("{}{}", self.namespace, self.type_claim)
    }

    pub fn properties_key(&self) -> String {
        format!("{}{}", self.namespace, self.properties_claim)
    }
}

fn default_type_claim() -> String {
    DEFAULT_TYPE_CLAIM.to_owned()
}

fn default_properties_claim() -> String {
    DEFAULT_PROPERTIES_CLAIM.to_owned()
}

impl PolicyActor {
    /// Read the actor from custom claims. Absent or malformed claims fail
    /// with the decode error.
    pub fn from_claims(claims: &DecodedClaims, names: &ActorClaims) -> AuthResult<Self> {
        let actor_type = claims.claim(&names.type_key()).cloned().unwrap_or(Value::Null);
        let properties = claims.claim(&names.properties_key()).cloned().unwrap_or(Value::Null);
        let tagged = json!({ "type": actor_type, "properties": properties });
        Ok(serde_json::from_value(tagged)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PolicyActor::User(_) => "user",
            PolicyActor::M2m(_) => "m2m",
            PolicyActor::Patient(_) => "patient",
            PolicyActor::Provider(_) => "provider",
        }
    }
}
