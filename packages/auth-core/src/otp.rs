//! OTP flow controller.
//!
//! Drives the two-phase challenge/response used to change the account's
//! email or phone number: send a code to the new contact value, then redeem
//! it together with the server-issued `otp_token`. A countdown gates when
//! the code may be resent; the countdown is an owned tokio task, started
//! and stopped only by this controller, and aborted on drop so a dismissed
//! screen can never leak a ticker or mutate state afterwards.
//!
//! No operation here returns `Err` or panics: every failure resolves to a
//! `false` result with the `error` field populated, so the worst case is a
//! stuck form that [`OtpFlow::reset`] recovers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use dacsan_api::{
    ApiClient, ApiResponse, OtpSendResponse, ProfileResponse, SendEmailUpdateOtpRequest,
    SendPhoneUpdateOtpRequest, VerifyEmailUpdateRequest, VerifyPhoneUpdateRequest,
};

use crate::validation::{is_valid_email, validate_otp};

/// Resend window applied after every successful send, in seconds.
pub const OTP_RESEND_WINDOW_SECS: u64 = 300;

/// Which contact channel the code is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpChannel {
    Email,
    Phone,
}

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OtpStep {
    #[default]
    Idle,
    /// A send request is in flight.
    Sending,
    /// A code is out and may be redeemed.
    Verifying,
}

/// The contact value an outstanding code validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTarget {
    pub channel: OtpChannel,
    pub value: String,
}

/// Observable state of one flow instance.
#[derive(Debug, Clone, Default)]
pub struct OtpState {
    pub step: OtpStep,
    /// True while a send or verify request is in flight. The UI must
    /// disable the submitting control on this flag; the controller does
    /// not serialize concurrent submissions itself.
    pub loading: bool,
    pub error: Option<String>,
    pub message: Option<String>,
    pub otp_sent: bool,
    /// Seconds until resending is allowed. Never goes negative.
    pub time_remaining: u64,
    pub can_resend: bool,
    /// Server-issued handle required to redeem the code. Present only
    /// while `step == Verifying`.
    pub otp_token: Option<String>,
    pub pending_value: Option<PendingTarget>,
}

/// The endpoints the flow needs. [`ApiClient`] implements this; tests
/// substitute a scripted mock to count invocations.
#[async_trait]
pub trait ProfileOtpApi: Send + Sync {
    async fn send_email_update_otp(&self, new_email: &str) -> ApiResponse<OtpSendResponse>;
    async fn send_phone_update_otp(&self, new_phone: &str) -> ApiResponse<OtpSendResponse>;
    async fn verify_email_update(
        &self,
        new_email: &str,
        otp_code: &str,
        otp_token: &str,
    ) -> ApiResponse<ProfileResponse>;
    async fn verify_phone_update(
        &self,
        new_phone: &str,
        otp_code: &str,
        otp_token: &str,
    ) -> ApiResponse<ProfileResponse>;
}

#[async_trait]
impl ProfileOtpApi for ApiClient {
    async fn send_email_update_otp(&self, new_email: &str) -> ApiResponse<OtpSendResponse> {
        ApiClient::send_email_update_otp(
            self,
            &SendEmailUpdateOtpRequest {
                new_email: new_email.to_string(),
            },
        )
        .await
    }

    async fn send_phone_update_otp(&self, new_phone: &str) -> ApiResponse<OtpSendResponse> {
        ApiClient::send_phone_update_otp(
            self,
            &SendPhoneUpdateOtpRequest {
                new_phone: new_phone.to_string(),
            },
        )
        .await
    }

    async fn verify_email_update(
        &self,
        new_email: &str,
        otp_code: &str,
        otp_token: &str,
    ) -> ApiResponse<ProfileResponse> {
        ApiClient::verify_email_update(
            self,
            &VerifyEmailUpdateRequest {
                new_email: new_email.to_string(),
                otp_code: otp_code.to_string(),
                otp_token: otp_token.to_string(),
            },
        )
        .await
    }

    async fn verify_phone_update(
        &self,
        new_phone: &str,
        otp_code: &str,
        otp_token: &str,
    ) -> ApiResponse<ProfileResponse> {
        ApiClient::verify_phone_update(
            self,
            &VerifyPhoneUpdateRequest {
                new_phone: new_phone.to_string(),
                otp_code: otp_code.to_string(),
                otp_token: otp_token.to_string(),
            },
        )
        .await
    }
}

/// One OTP flow instance. A screen owns exactly one of these for its
/// lifetime; dropping it cancels the countdown.
pub struct OtpFlow {
    api: Arc<dyn ProfileOtpApi>,
    state: Arc<Mutex<OtpState>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl OtpFlow {
    pub fn new(api: Arc<dyn ProfileOtpApi>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(OtpState::default())),
            ticker: Mutex::new(None),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, OtpState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> OtpState {
        self.lock_state().clone()
    }

    pub fn clear_error(&self) {
        self.lock_state().error = None;
    }

    /// Send a code to `value` over `channel`.
    ///
    /// Validates locally first (email syntax for [`OtpChannel::Email`],
    /// non-empty for [`OtpChannel::Phone`] — full phone format is the
    /// server's call); a validation failure sets `error` and sends
    /// nothing. On success the flow moves to `Verifying`, captures the
    /// `otp_token`, and starts the resend countdown.
    pub async fn send_otp(&self, channel: OtpChannel, value: &str) -> bool {
        match channel {
            OtpChannel::Email if !is_valid_email(value) => {
                self.lock_state().error = Some("Email không hợp lệ".to_string());
                return false;
            }
            OtpChannel::Phone if value.trim().is_empty() => {
                self.lock_state().error =
                    Some("Số điện thoại không được để trống".to_string());
                return false;
            }
            _ => {}
        }

        let prior_step = {
            let mut state = self.lock_state();
            let prior = state.step;
            state.step = OtpStep::Sending;
            state.loading = true;
            state.error = None;
            state.message = None;
            prior
        };

        let response = match channel {
            OtpChannel::Email => self.api.send_email_update_otp(value).await,
            OtpChannel::Phone => self.api.send_phone_update_otp(value).await,
        };

        match response.data {
            Some(data) if response.success => {
                self.stop_ticker();
                {
                    let mut state = self.lock_state();
                    state.step = OtpStep::Verifying;
                    state.loading = false;
                    state.otp_sent = true;
                    state.otp_token = data.otp_token;
                    state.pending_value = Some(PendingTarget {
                        channel,
                        value: value.to_string(),
                    });
                    state.time_remaining = OTP_RESEND_WINDOW_SECS;
                    state.can_resend = false;
                    state.error = None;
                    state.message = Some(
                        match channel {
                            OtpChannel::Email => {
                                "Mã OTP đã được gửi. Vui lòng kiểm tra email của bạn"
                            }
                            OtpChannel::Phone => {
                                "Mã OTP đã được gửi. Vui lòng kiểm tra điện thoại của bạn"
                            }
                        }
                        .to_string(),
                    );
                }
                self.start_ticker();
                info!(?channel, "OTP sent");
                true
            }
            _ => {
                let retry_after = response.retry_after;
                {
                    let mut state = self.lock_state();
                    state.step = prior_step;
                    state.loading = false;
                    state.error = Some(if response.message.is_empty() {
                        "Gửi OTP thất bại".to_string()
                    } else {
                        response.message
                    });
                }
                // Rate-limited: honor the server's retry hint by blocking
                // resends for that long.
                if let Some(secs) = retry_after.filter(|secs| *secs > 0) {
                    self.stop_ticker();
                    {
                        let mut state = self.lock_state();
                        state.time_remaining = secs;
                        state.can_resend = false;
                    }
                    self.start_ticker();
                    debug!(retry_after = secs, "Send rate limited");
                }
                false
            }
        }
    }

    /// Redeem `otp_code` for the value submitted to [`Self::send_otp`].
    ///
    /// The code must be six digits (checked locally) and a send must have
    /// succeeded in this flow instance — a missing `otp_token` fails with
    /// a resend prompt before any request goes out. On success the flow
    /// returns to idle; the caller is responsible for refreshing the
    /// cached user afterwards.
    pub async fn verify_otp(&self, otp_code: &str, new_value: &str, channel: OtpChannel) -> bool {
        if let Err(message) = validate_otp(otp_code) {
            self.lock_state().error = Some(message.to_string());
            return false;
        }

        let Some(otp_token) = self.lock_state().otp_token.clone() else {
            self.lock_state().error =
                Some("Không tìm thấy token xác thực. Vui lòng gửi lại OTP.".to_string());
            return false;
        };

        {
            let mut state = self.lock_state();
            state.loading = true;
            state.error = None;
            state.message = None;
        }

        let response = match channel {
            OtpChannel::Email => {
                self.api
                    .verify_email_update(new_value, otp_code, &otp_token)
                    .await
            }
            OtpChannel::Phone => {
                self.api
                    .verify_phone_update(new_value, otp_code, &otp_token)
                    .await
            }
        };

        if response.success {
            self.stop_ticker();
            let mut state = self.lock_state();
            state.step = OtpStep::Idle;
            state.loading = false;
            state.error = None;
            state.otp_sent = false;
            state.time_remaining = 0;
            state.can_resend = false;
            state.otp_token = None;
            state.pending_value = None;
            state.message = Some(
                match channel {
                    OtpChannel::Email => "Cập nhật email thành công",
                    OtpChannel::Phone => "Cập nhật số điện thoại thành công",
                }
                .to_string(),
            );
            info!(?channel, "OTP verified");
            true
        } else {
            // The user may retry with a different code without resending.
            let mut state = self.lock_state();
            state.loading = false;
            state.error = Some(if response.message.is_empty() {
                "Xác nhận OTP thất bại".to_string()
            } else {
                response.message
            });
            false
        }
    }

    /// Replay the last send. Refused while the countdown is still running
    /// or when nothing was ever sent.
    pub async fn resend_otp(&self) -> bool {
        let (target, can_resend) = {
            let state = self.lock_state();
            (state.pending_value.clone(), state.can_resend)
        };
        let Some(target) = target else {
            return false;
        };
        if !can_resend {
            self.lock_state().error =
                Some("Vui lòng chờ trước khi gửi lại mã OTP".to_string());
            return false;
        }
        self.send_otp(target.channel, &target.value).await
    }

    /// Cancel the countdown and restore the initial state.
    pub fn reset(&self) {
        self.stop_ticker();
        *self.lock_state() = OtpState::default();
    }

    /// Spawn the once-per-second countdown. Any prior ticker is aborted
    /// first so two tasks can never decrement the same counter. The
    /// interval is armed here, not inside the task, so the first decrement
    /// is scheduled one second after the send even if the task itself is
    /// polled later.
    fn start_ticker(&self) {
        self.stop_ticker();
        let state = Arc::clone(&self.state);
        let mut interval = tokio::time::interval_at(
            Instant::now() + Duration::from_secs(1),
            Duration::from_secs(1),
        );
        let handle = tokio::spawn(async move {
            loop {
                interval.tick().await;
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.time_remaining > 1 {
                    state.time_remaining -= 1;
                } else {
                    state.time_remaining = 0;
                    state.can_resend = true;
                    break;
                }
            }
        });
        match self.ticker.lock() {
            Ok(mut guard) => *guard = Some(handle),
            Err(poisoned) => *poisoned.into_inner() = Some(handle),
        }
    }

    fn stop_ticker(&self) {
        let handle = match self.ticker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for OtpFlow {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
