//! Page objects for the CertGem portal's screens.

mod certificates;
mod gemologists;
mod login;

pub use certificates::{
    CertificatesPage, ExpectedOutcome, FORM_FIELD_IDS, FORM_VIEWPORT, NOT_FOUND_MARKERS,
};
pub use gemologists::{
    GemologistsPage, ERROR_DETAIL, ERROR_SUMMARY, LOAD_TIMEOUT_MS, SUCCESS_DETAIL,
    SUCCESS_SUMMARY,
};
pub use login::{
    LoginPage, CREDENTIAL_ERRORS, EMAIL_REQUIRED, PASSWORD_REQUIRED, URL_WAIT_TIMEOUT_MS,
};
