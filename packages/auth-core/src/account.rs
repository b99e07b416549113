//! High-level account flows: login, registration, password reset, logout.
//!
//! Each flow calls the backend and, where the response carries a session,
//! applies it to the [`SessionStore`]. The envelope is handed back to the
//! caller untouched so screens keep access to the server's message.

use std::sync::Arc;

use tracing::{info, warn};

use dacsan_api::{
    ApiClient, ApiResponse, CheckSessionRequest, LoginRequest, LoginResponse, LogoutRequest,
    OtpSendResponse, PasswordResetOtpRequest, RegisterRequest, RegisterResponse,
    ResetPasswordWithOtpRequest, SendRegistrationOtpRequest, VerifyRegistrationOtpRequest,
    VerifyRegistrationResponse,
};

use crate::session::{SessionError, SessionStore};
use crate::validation::{is_valid_email, validate_password};

pub struct AccountService {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
}

impl AccountService {
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// Log in and persist the returned session.
    pub async fn login(
        &self,
        email_or_username: &str,
        password: &str,
    ) -> Result<ApiResponse<LoginResponse>, SessionError> {
        let response = self
            .api
            .login(&LoginRequest {
                email_or_username: email_or_username.to_string(),
                password: password.to_string(),
            })
            .await;

        if response.success {
            if let Some(data) = &response.data {
                let tokens = data.tokens.as_ref();
                self.session
                    .login(
                        data.session.session_id.clone(),
                        data.user.clone(),
                        tokens.map(|t| t.access_token.clone()),
                        tokens.map(|t| t.refresh_token.clone()),
                    )
                    .await?;
                info!(user = %data.user.username, "Logged in");
            }
        }
        Ok(response)
    }

    /// Direct (non-OTP) registration. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResponse<RegisterResponse> {
        self.api.register(request).await
    }

    pub async fn send_registration_otp(
        &self,
        request: &SendRegistrationOtpRequest,
    ) -> ApiResponse<OtpSendResponse> {
        self.api.send_registration_otp(request).await
    }

    /// Redeem a registration OTP. A successful verify doubles as the first
    /// login: the returned user and token pair are persisted as a fresh
    /// session.
    pub async fn verify_registration(
        &self,
        request: &VerifyRegistrationOtpRequest,
    ) -> Result<ApiResponse<VerifyRegistrationResponse>, SessionError> {
        let response = self.api.verify_registration_otp(request).await;

        if response.success {
            if let Some(data) = &response.data {
                // No server session id in this response; the user id
                // stands in until the next full login.
                self.session
                    .login(
                        data.user.id.to_string(),
                        data.user.clone(),
                        Some(data.tokens.access_token.clone()),
                        Some(data.tokens.refresh_token.clone()),
                    )
                    .await?;
                info!(user = %data.user.username, "Registered and logged in");
            }
        }
        Ok(response)
    }

    /// Request a password-reset code for the given email.
    pub async fn request_password_reset(&self, email: &str) -> ApiResponse<OtpSendResponse> {
        if !is_valid_email(email) {
            return ApiResponse::field_failure("email", "Email không hợp lệ");
        }
        self.api
            .send_password_reset_otp(&PasswordResetOtpRequest {
                email: email.to_string(),
            })
            .await
    }

    /// Redeem a password-reset code with the new password.
    pub async fn reset_password(
        &self,
        email: &str,
        otp_code: &str,
        new_password: &str,
    ) -> ApiResponse<()> {
        if let Err(message) = validate_password(new_password) {
            return ApiResponse::field_failure("newPassword", message);
        }
        self.api
            .reset_password_with_otp(&ResetPasswordWithOtpRequest {
                email: email.to_string(),
                otp_code: otp_code.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }

    /// Log out. The server call is best-effort: the local session is
    /// cleared no matter what the backend says.
    pub async fn logout(&self) -> Result<(), SessionError> {
        if let Some(session) = self.session.current_session() {
            if !session.session_id.is_empty() {
                let response = self
                    .api
                    .logout(&LogoutRequest {
                        session_id: session.session_id,
                    })
                    .await;
                if !response.success {
                    warn!(message = %response.message, "Server logout failed, clearing local session anyway");
                }
            }
        }
        self.session.logout().await
    }

    /// Ask the backend whether the stored session is still valid.
    pub async fn check_session(&self) -> bool {
        let Some(session) = self.session.current_session() else {
            return false;
        };
        if session.session_id.is_empty() {
            return false;
        }
        self.api
            .check_session(&CheckSessionRequest {
                session_id: session.session_id,
            })
            .await
            .success
    }
}
