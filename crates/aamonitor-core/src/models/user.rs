//! Login payloads and the user data kept in the session

use std::fmt;

use serde::{Deserialize, Serialize};

/// User classification issued by the backend (`utid`)
///
/// Older backends send the numeric type id, newer ones a role name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserType {
    /// Numeric user type id
    Id(i64),
    /// Named role
    Name(String),
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// User data returned alongside the token (`_user_data`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    /// Login name
    #[serde(default)]
    pub user_name: Option<String>,
    /// Backend user id
    #[serde(default)]
    pub user_id: Option<i64>,
    /// User classification
    #[serde(default)]
    pub user_type: Option<UserType>,
    /// Company id; `"*"` for fleet administrators, so kept loose
    #[serde(default)]
    pub cid: Option<serde_json::Value>,
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login name
    pub user_name: String,
    /// Clear-text password, sent over the configured transport
    pub password: String,
}

/// Payload of a successful `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    /// Opaque bearer token; absent means the credentials were rejected
    #[serde(default)]
    pub auth_token: Option<String>,
    /// User data
    #[serde(rename = "_user_data", default)]
    pub user_data: Option<UserData>,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    /// User data returned at login
    pub user: UserData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_request_wire_names() {
        let body = serde_json::to_value(LoginRequest {
            user_name: "agent".to_string(),
            password: "pw".to_string(),
        })
        .unwrap();
        assert_eq!(body, json!({"userName": "agent", "password": "pw"}));
    }

    #[test]
    fn test_user_type_accepts_number_or_name() {
        let numeric: UserData = serde_json::from_value(json!({"userType": 1})).unwrap();
        let named: UserData = serde_json::from_value(json!({"userType": "admin"})).unwrap();
        assert_eq!(numeric.user_type, Some(UserType::Id(1)));
        assert_eq!(named.user_type, Some(UserType::Name("admin".to_string())));
    }

    #[test]
    fn test_login_payload_without_token() {
        let payload: LoginPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.auth_token.is_none());
        assert!(payload.user_data.is_none());
    }
}
