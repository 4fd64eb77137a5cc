//! Types for authentication and user management

use serde::{Deserialize, Serialize};

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Stable user identifier
    pub uid: String,

    /// The user's email address
    pub email: Option<String>,

    /// The user's display name
    pub display_name: Option<String>,
}

impl AuthUser {
    pub fn new(uid: &str, email: Option<&str>) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.map(str::to_string),
            display_name: None,
        }
    }

    /// Display name, or the part of the email before `@`
    pub fn display_name_or_default(&self) -> String {
        match (&self.display_name, &self.email) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(email)) => email.split('@').next().unwrap_or_default().to_string(),
            _ => String::new(),
        }
    }
}

/// Email and password sent to the identity API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

/// Answer to sign-in and sign-up
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInResponse {
    pub id_token: String,
    pub refresh_token: String,
    /// Seconds, sent as a string
    pub expires_in: String,
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Answer to a token refresh
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
    pub user_id: String,
}

/// Lifetimes arrive as strings; anything unparsable counts as already expired.
pub(crate) fn parse_expires_in(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        let user = AuthUser::new("u1", Some("ana.lopez@example.com"));
        assert_eq!(user.display_name_or_default(), "ana.lopez");

        let named = AuthUser {
            display_name: Some("Ana".to_string()),
            ..user
        };
        assert_eq!(named.display_name_or_default(), "Ana");

        assert_eq!(AuthUser::new("u2", None).display_name_or_default(), "");
    }

    #[test]
    fn sign_in_response_reads_identity_payload() {
        let response: SignInResponse = serde_json::from_str(
            r#"{
                "kind": "identitytoolkit#VerifyPasswordResponse",
                "localId": "u1",
                "email": "ana@example.com",
                "displayName": "",
                "idToken": "id-token",
                "registered": true,
                "refreshToken": "refresh-token",
                "expiresIn": "3600"
            }"#,
        )
        .unwrap();
        assert_eq!(response.local_id, "u1");
        assert_eq!(parse_expires_in(&response.expires_in), 3600);
    }

    #[test]
    fn expires_in_out_of_range_is_expired() {
        assert_eq!(parse_expires_in("99999999999999999999999"), 0);
        assert_eq!(parse_expires_in("soon"), 0);
        assert_eq!(parse_expires_in(" 60 "), 60);
    }
}
