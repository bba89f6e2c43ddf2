//! Process exit codes for `wpdash-child`.
//! Enrollment failures use `RegistrationError::exit_code`; these are the stable values.

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1; // Missing input, config error, not registered, fatal
pub const UNAUTHORIZED: i32 = 2; // Registration policy rejected the request
pub const MALFORMED_KEY: i32 = 4; // Candidate key could not be converted
pub const STORAGE_UNAVAILABLE: i32 = 5; // Store read/write failed (retryable)
pub const CORRUPT_ENTRY: i32 = 6; // Stored value could not be interpreted

/// Report an enrollment error and return its exit code.
pub fn report(err: &wpdash_enroll::RegistrationError) -> i32 {
    eprintln!("error: {err}");
    if err.is_retryable() {
        eprintln!("hint: the store may be temporarily unavailable, retry the command");
    }
    err.exit_code()
}
