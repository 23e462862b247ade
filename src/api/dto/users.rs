/*
 * Responsibility
 * - login / register / me の request/response DTO
 * - validation (形式チェック) 用の validate()
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const USERNAME_MAX: usize = 64;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Client sends it back as `Authorization: Bearer {token}`.
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until expiry.
    pub expires_in: u64,
    pub user_id: i64,
    pub username: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub login_time: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("username is required");
        }
        if username.chars().count() > USERNAME_MAX {
            return Err("username must be <= 64 chars");
        }
        if username.contains(char::is_whitespace) {
            return Err("username must not contain whitespace");
        }

        let password_len = self.password.chars().count();
        if password_len < PASSWORD_MIN {
            return Err("password must be >= 8 chars");
        }
        if password_len > PASSWORD_MAX {
            return Err("password must be <= 128 chars");
        }

        if let Some(nickname) = &self.nickname
            && nickname.chars().count() > USERNAME_MAX
        {
            return Err("nickname must be <= 64 chars");
        }
        if let Some(email) = &self.email
            && (email.len() > 255 || !email.contains('@'))
        {
            return Err("email is invalid");
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: i64,
    pub username: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: password.into(),
            nickname: None,
            email: None,
        }
    }

    #[test]
    fn register_validation() {
        assert!(req("alice", "password1").validate().is_ok());
        assert!(req("  ", "password1").validate().is_err());
        assert!(req("al ice", "password1").validate().is_err());
        assert!(req("alice", "short").validate().is_err());
        assert!(req(&"x".repeat(65), "password1").validate().is_err());

        let mut bad_email = req("alice", "password1");
        bad_email.email = Some("not-an-email".into());
        assert_eq!(bad_email.validate(), Err("email is invalid"));
    }

    #[test]
    fn login_response_uses_camel_case() {
        let body = serde_json::to_value(LoginResponse {
            token: "t".into(),
            token_type: "Bearer",
            expires_in: 60,
            user_id: 1,
            username: "alice".into(),
            nickname: None,
            email: None,
            login_time: Utc::now(),
        })
        .unwrap();

        assert_eq!(body["tokenType"], "Bearer");
        assert_eq!(body["userId"], 1);
        assert!(body.get("loginTime").is_some());
    }
}
