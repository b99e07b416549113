//! Profile flows: load, update, avatar upload, password change.
//!
//! Every success path that returns a user replaces the cached copy through
//! [`SessionStore::update_user`], so memory, storage, and screen state stay
//! on the same record.

use std::sync::Arc;

use tracing::info;

use dacsan_api::{
    ApiClient, ApiResponse, AvatarUploadResponse, OtpSendResponse, ProfileResponse,
    ProfileUpdateRequest, SendPasswordChangeOtpRequest, VerifyPasswordChangeOtpRequest,
};

use crate::session::{SessionError, SessionStore};
use crate::validation::{is_valid_phone_number, validate_full_name, validate_password};

pub struct ProfileService {
    api: Arc<ApiClient>,
    session: Arc<SessionStore>,
}

impl ProfileService {
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// Fetch the profile from the backend and refresh the cached user.
    pub async fn load(&self) -> Result<ApiResponse<ProfileResponse>, SessionError> {
        let response = self.api.get_profile().await;
        if response.success {
            if let Some(data) = &response.data {
                self.session.update_user(data.user.clone()).await?;
            }
        }
        Ok(response)
    }

    /// Update the mutable profile fields. Validates locally first; a
    /// validation failure comes back as a field-attributed envelope with
    /// no request sent.
    pub async fn update(
        &self,
        request: &ProfileUpdateRequest,
    ) -> Result<ApiResponse<ProfileResponse>, SessionError> {
        if let Some(full_name) = &request.full_name {
            if let Err(message) = validate_full_name(full_name) {
                return Ok(ApiResponse::field_failure("fullName", message));
            }
        }
        if let Some(phone_number) = &request.phone_number {
            if !is_valid_phone_number(phone_number) {
                return Ok(ApiResponse::field_failure(
                    "phoneNumber",
                    "Số điện thoại không hợp lệ",
                ));
            }
        }

        let response = self.api.update_profile(request).await;
        if response.success {
            if let Some(data) = &response.data {
                self.session.update_user(data.user.clone()).await?;
                info!("Profile updated");
            }
        }
        Ok(response)
    }

    /// Upload a new avatar and refresh the cached user with the returned
    /// record.
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ApiResponse<AvatarUploadResponse>, SessionError> {
        let response = self.api.upload_avatar(file_name, mime_type, bytes).await;
        if response.success {
            if let Some(data) = &response.data {
                self.session.update_user(data.user.clone()).await?;
                info!(avatar_url = %data.avatar_url, "Avatar updated");
            }
        }
        Ok(response)
    }

    /// Start the password-change OTP flow. The code goes to the account's
    /// email of record.
    pub async fn send_password_change_otp(
        &self,
        current_password: &str,
    ) -> ApiResponse<OtpSendResponse> {
        if current_password.is_empty() {
            return ApiResponse::field_failure(
                "currentPassword",
                "Mật khẩu hiện tại không được để trống",
            );
        }
        self.api
            .send_password_change_otp(&SendPasswordChangeOtpRequest {
                current_password: current_password.to_string(),
            })
            .await
    }

    /// Redeem the password-change code together with the new password.
    pub async fn verify_password_change(
        &self,
        current_password: &str,
        new_password: &str,
        otp_code: &str,
        otp_token: &str,
    ) -> ApiResponse<()> {
        if let Err(message) = validate_password(new_password) {
            return ApiResponse::field_failure("newPassword", message);
        }
        self.api
            .verify_password_change(&VerifyPasswordChangeOtpRequest {
                current_password: current_password.to_string(),
                new_password: new_password.to_string(),
                otp_code: otp_code.to_string(),
                otp_token: otp_token.to_string(),
            })
            .await
    }
}
