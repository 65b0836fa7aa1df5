use rand::Rng;

pub const OTP_LENGTH: usize = 6;

/// Six-digit, zero-padded one-time code from the thread-local CSPRNG.
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(0..1_000_000);
    format!("{:0width$}", code, width = OTP_LENGTH)
}

pub fn is_well_formed_otp(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Opaque single-use token for email verification links.
pub fn generate_verification_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
