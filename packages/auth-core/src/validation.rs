//! Form validation helpers shared by the auth and profile flows.
//!
//! Every check runs locally, before any network call; messages are the
//! user-facing Vietnamese strings shown by the app.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Anything@anything.anything, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    // Vietnamese mobile number: 10 digits, leading 0
    static ref PHONE_REGEX: Regex = Regex::new(r"^0[0-9]{9}$").unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_REGEX.is_match(email)
}

/// Validates a Vietnamese phone number; separators are stripped first.
pub fn is_valid_phone_number(phone_number: &str) -> bool {
    if phone_number.is_empty() {
        return false;
    }
    let cleaned: String = phone_number.chars().filter(|c| c.is_ascii_digit()).collect();
    PHONE_REGEX.is_match(&cleaned)
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.is_empty() {
        return Err("Mật khẩu không được để trống");
    }
    if password.chars().count() < 6 {
        return Err("Mật khẩu phải có ít nhất 6 ký tự");
    }
    if password.chars().count() > 100 {
        return Err("Mật khẩu không được quá 100 ký tự");
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Tên đăng nhập không được để trống");
    }
    if username.chars().count() < 3 {
        return Err("Tên đăng nhập phải có ít nhất 3 ký tự");
    }
    if username.chars().count() > 50 {
        return Err("Tên đăng nhập không được quá 50 ký tự");
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err("Tên đăng nhập chỉ được chứa chữ cái, số, gạch dưới và gạch ngang");
    }
    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<(), &'static str> {
    if full_name.is_empty() {
        return Err("Họ tên không được để trống");
    }
    if full_name.chars().count() < 2 {
        return Err("Họ tên phải có ít nhất 2 ký tự");
    }
    if full_name.chars().count() > 100 {
        return Err("Họ tên không được quá 100 ký tự");
    }
    Ok(())
}

/// OTP codes are exactly six ASCII digits.
pub fn validate_otp(otp: &str) -> Result<(), &'static str> {
    if otp.is_empty() {
        return Err("Mã OTP không được để trống");
    }
    if otp.chars().count() != 6 {
        return Err("Mã OTP phải có 6 chữ số");
    }
    if !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err("Mã OTP chỉ được chứa chữ số");
    }
    Ok(())
}

pub fn validate_required(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} không được để trống", field_name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("nguoi.dung+tag@shop.vn"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn phone_validation() {
        assert!(is_valid_phone_number("0912345678"));
        assert!(is_valid_phone_number("091 234 5678"));
        assert!(is_valid_phone_number("091-234-5678"));
        assert!(!is_valid_phone_number(""));
        assert!(!is_valid_phone_number("912345678"));
        assert!(!is_valid_phone_number("09123456789"));
    }

    #[test]
    fn password_validation() {
        assert!(validate_password("secret1").is_ok());
        assert_eq!(
            validate_password(""),
            Err("Mật khẩu không được để trống")
        );
        assert_eq!(
            validate_password("abc"),
            Err("Mật khẩu phải có ít nhất 6 ký tự")
        );
        assert!(validate_password(&"x".repeat(101)).is_err());
    }

    #[test]
    fn username_validation() {
        assert!(validate_username("ngoc_anh-91").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("có dấu").is_err());
    }

    #[test]
    fn otp_validation() {
        assert!(validate_otp("123456").is_ok());
        assert_eq!(validate_otp(""), Err("Mã OTP không được để trống"));
        assert_eq!(validate_otp("12345"), Err("Mã OTP phải có 6 chữ số"));
        assert_eq!(validate_otp("12a456"), Err("Mã OTP chỉ được chứa chữ số"));
    }

    #[test]
    fn required_validation() {
        assert!(validate_required("x", "Email").is_ok());
        assert_eq!(
            validate_required("  ", "Email"),
            Err("Email không được để trống".to_string())
        );
    }
}
