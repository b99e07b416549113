//! Pure REST API client for the DacSan backend.
//!
//! A minimal client for the specialty-food shop API with no UI or storage
//! logic. Every endpoint returns the backend's uniform [`ApiResponse`]
//! envelope; transport failures (no connectivity, timeout) are translated
//! into the same envelope with `success = false` and a localized message,
//! so callers handle exactly one failure shape.
//!
//! # Example
//!
//! ```rust,ignore
//! use dacsan_api::{ApiClient, LoginRequest};
//!
//! let client = ApiClient::new("http://10.0.187.144:3001/api")?;
//!
//! let response = client
//!     .login(&LoginRequest {
//!         email_or_username: "anh@example.com".into(),
//!         password: "secret".into(),
//!     })
//!     .await;
//! if response.success {
//!     let data = response.data.unwrap();
//!     client.set_auth_token(data.tokens.map(|t| t.access_token));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{ApiError, Result};
pub use types::*;

use std::sync::RwLock;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Uniform timeout applied to every request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// DacSan backend API client.
///
/// Holds the Bearer token in an interior-mutable slot so that one shared
/// client instance follows the session: the session layer sets the token on
/// login/bootstrap and clears it on logout.
pub struct ApiClient {
    http: Client,
    base_url: String,
    auth_token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client against the given base URL (including the `/api`
    /// path prefix, e.g. `http://10.0.187.144:3001/api`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            auth_token: RwLock::new(None),
        })
    }

    /// Set or clear the Bearer token attached to subsequent requests.
    pub fn set_auth_token(&self, token: Option<String>) {
        match self.auth_token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    /// Current Bearer token, if any.
    pub fn auth_token(&self) -> Option<String> {
        match self.auth_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Auth endpoints ──

    pub async fn login(&self, request: &LoginRequest) -> ApiResponse<LoginResponse> {
        self.post_json("/auth/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResponse<RegisterResponse> {
        self.post_json("/auth/register", request).await
    }

    pub async fn send_registration_otp(
        &self,
        request: &SendRegistrationOtpRequest,
    ) -> ApiResponse<OtpSendResponse> {
        self.post_json("/auth/send-registration-otp", request).await
    }

    pub async fn verify_registration_otp(
        &self,
        request: &VerifyRegistrationOtpRequest,
    ) -> ApiResponse<VerifyRegistrationResponse> {
        self.post_json("/auth/verify-registration-otp", request)
            .await
    }

    pub async fn send_password_reset_otp(
        &self,
        request: &PasswordResetOtpRequest,
    ) -> ApiResponse<OtpSendResponse> {
        self.post_json("/auth/send-password-reset-otp", request)
            .await
    }

    pub async fn reset_password_with_otp(
        &self,
        request: &ResetPasswordWithOtpRequest,
    ) -> ApiResponse<()> {
        self.post_json("/auth/reset-password-otp", request).await
    }

    pub async fn logout(&self, request: &LogoutRequest) -> ApiResponse<()> {
        self.post_json("/auth/logout", request).await
    }

    pub async fn check_session(&self, request: &CheckSessionRequest) -> ApiResponse<()> {
        self.post_json("/auth/check-session", request).await
    }

    // ── Profile endpoints ──

    pub async fn get_profile(&self) -> ApiResponse<ProfileResponse> {
        let request = self.request(Method::GET, "/profile");
        Self::dispatch("/profile", request).await
    }

    pub async fn update_profile(
        &self,
        request: &ProfileUpdateRequest,
    ) -> ApiResponse<ProfileResponse> {
        let builder = self.request(Method::PATCH, "/profile").json(request);
        Self::dispatch("/profile", builder).await
    }

    /// Upload a new avatar as `multipart/form-data`.
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> ApiResponse<AvatarUploadResponse> {
        let part = match Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
        {
            Ok(part) => part,
            Err(e) => {
                warn!(mime_type, error = %e, "Invalid avatar MIME type");
                return ApiResponse::failure("Ảnh đại diện không hợp lệ");
            }
        };
        let form = Form::new().part("avatar", part);
        let builder = self.request(Method::POST, "/profile/avatar").multipart(form);
        Self::dispatch("/profile/avatar", builder).await
    }

    pub async fn send_password_change_otp(
        &self,
        request: &SendPasswordChangeOtpRequest,
    ) -> ApiResponse<OtpSendResponse> {
        self.post_json("/profile/password/send-otp", request).await
    }

    pub async fn verify_password_change(
        &self,
        request: &VerifyPasswordChangeOtpRequest,
    ) -> ApiResponse<()> {
        self.post_json("/profile/password/verify-otp", request)
            .await
    }

    pub async fn send_email_update_otp(
        &self,
        request: &SendEmailUpdateOtpRequest,
    ) -> ApiResponse<OtpSendResponse> {
        self.post_json("/profile/email/send-otp", request).await
    }

    pub async fn verify_email_update(
        &self,
        request: &VerifyEmailUpdateRequest,
    ) -> ApiResponse<ProfileResponse> {
        self.post_json("/profile/email/verify-otp", request).await
    }

    pub async fn send_phone_update_otp(
        &self,
        request: &SendPhoneUpdateOtpRequest,
    ) -> ApiResponse<OtpSendResponse> {
        self.post_json("/profile/phone/send-otp", request).await
    }

    pub async fn verify_phone_update(
        &self,
        request: &VerifyPhoneUpdateRequest,
    ) -> ApiResponse<ProfileResponse> {
        self.post_json("/profile/phone/verify-otp", request).await
    }

    // ── Request plumbing ──

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.auth_token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResponse<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        Self::dispatch(path, builder).await
    }

    /// Send the request and normalize every outcome into an envelope.
    ///
    /// Non-2xx responses still carry the envelope in the body (including
    /// 429 with `retryAfter`), so the body is parsed regardless of status.
    /// Transport errors and unparseable bodies degrade to the generic
    /// network-failure envelope.
    async fn dispatch<T: DeserializeOwned>(
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResponse<T> {
        match builder.send().await {
            Ok(response) => {
                let status = response.status();
                match response.json::<ApiResponse<T>>().await {
                    Ok(envelope) => {
                        if !envelope.success {
                            debug!(path, %status, message = %envelope.message, "Request rejected");
                        }
                        envelope
                    }
                    Err(e) => {
                        warn!(path, %status, error = %e, "Unparseable response body");
                        ApiResponse::network_failure()
                    }
                }
            }
            Err(e) => {
                warn!(path, error = %e, "Request failed");
                ApiResponse::network_failure()
            }
        }
    }
}
