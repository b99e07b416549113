//! Wire types for the DacSan backend API.
//!
//! Field names on the wire are camelCase. Every endpoint responds with the
//! same [`ApiResponse`] envelope; business failures carry `message` (and
//! sometimes `errors`/`retryAfter`), never a bare HTTP error body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic message shown when the transport itself fails (no connectivity,
/// timeout). Matches what the app displays to the user.
pub const NETWORK_ERROR_MESSAGE: &str = "Lỗi kết nối mạng. Vui lòng thử lại.";

/// Uniform response envelope used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    /// Seconds to wait before retrying, sent with HTTP 429.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl<T> ApiResponse<T> {
    /// Failure envelope for a transport-level error. Callers never see the
    /// underlying `reqwest` error, only this localized envelope.
    pub fn network_failure() -> Self {
        Self::failure(NETWORK_ERROR_MESSAGE)
    }

    /// Failure envelope with the given message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: None,
            retry_after: None,
        }
    }

    /// Failure envelope attributed to a single field, the shape the backend
    /// uses for per-field validation rejections.
    pub fn field_failure(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            message: message.clone(),
            data: None,
            errors: Some(vec![FieldError {
                resource: None,
                field: Some(field.into()),
                message,
            }]),
            retry_after: None,
        }
    }
}

/// A single field-level error inside the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

/// User role as issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Staff,
    User,
}

/// Account record attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Server-side session metadata returned by login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Access/refresh token pair. `expires_in` is an opaque duration string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: String,
}

// ── Auth ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_or_username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub session: SessionInfo,
    #[serde(default)]
    pub tokens: Option<TokenPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRegistrationOtpRequest {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRegistrationOtpRequest {
    pub email: String,
    pub otp_code: String,
    pub username: String,
    pub password: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRegistrationResponse {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetOtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordWithOtpRequest {
    pub email: String,
    pub otp_code: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSessionRequest {
    pub session_id: String,
}

// ── OTP send responses (registration, reset, profile flows) ──

/// Response to any OTP-send endpoint. The backend varies which fields it
/// fills per flow, so everything is optional; `otp_token` is the handle
/// required to redeem the code later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSendResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp_token: Option<String>,
}

// ── Profile ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: User,
}

/// The only profile fields a client may change directly. Unknown fields are
/// rejected at the boundary rather than silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUploadResponse {
    pub user: User,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPasswordChangeOtpRequest {
    pub current_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPasswordChangeOtpRequest {
    pub current_password: String,
    pub new_password: String,
    pub otp_code: String,
    pub otp_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailUpdateOtpRequest {
    pub new_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailUpdateRequest {
    pub new_email: String,
    pub otp_code: String,
    pub otp_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPhoneUpdateOtpRequest {
    pub new_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPhoneUpdateRequest {
    pub new_phone: String,
    pub otp_code: String,
    pub otp_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_rate_limit_fields() {
        let json = r#"{
            "success": false,
            "message": "Quá nhiều yêu cầu",
            "retryAfter": 60,
            "errors": [{"field": "email", "message": "Email đã tồn tại"}]
        }"#;
        let envelope: ApiResponse<OtpSendResponse> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.retry_after, Some(60));
        let errors = envelope.errors.unwrap();
        assert_eq!(errors[0].field.as_deref(), Some("email"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn otp_send_response_accepts_sparse_payload() {
        let json = r#"{"success": true, "message": "ok", "data": {"otpToken": "T1", "expiresIn": "300"}}"#;
        let envelope: ApiResponse<OtpSendResponse> = serde_json::from_str(json).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.otp_token.as_deref(), Some("T1"));
        assert_eq!(data.expires_in.as_deref(), Some("300"));
        assert!(data.email.is_none());
        assert!(data.expires_at.is_none());
    }

    #[test]
    fn envelope_works_for_payloads_without_default() {
        // LoginResponse has no Default impl; the envelope must not demand
        // one just to leave `data` absent.
        let json = r#"{"success": false, "message": "Sai mật khẩu"}"#;
        let envelope: ApiResponse<LoginResponse> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert!(envelope.errors.is_none());
        assert!(envelope.retry_after.is_none());
    }

    #[test]
    fn user_deserializes_camel_case() {
        let json = r#"{
            "id": 7,
            "username": "ngocanh",
            "email": "anh@example.com",
            "fullName": "Ngọc Anh",
            "phoneNumber": "0912345678",
            "role": "USER",
            "isActive": true,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-06-01T00:00:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.full_name, "Ngọc Anh");
        assert_eq!(user.role, UserRole::User);
        assert!(user.avatar_url.is_none());
    }

    #[test]
    fn profile_update_rejects_unknown_fields() {
        let json = r#"{"fullName": "A", "email": "sneaky@example.com"}"#;
        let result: Result<ProfileUpdateRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn network_failure_envelope_shape() {
        let envelope: ApiResponse<()> = ApiResponse::network_failure();
        assert!(!envelope.success);
        assert_eq!(envelope.message, NETWORK_ERROR_MESSAGE);
        assert!(envelope.data.is_none());
    }
}
