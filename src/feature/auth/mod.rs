//! Authentication screens

pub mod forgot_password;
pub mod login;
pub mod register;
pub mod setup_currency;

pub use forgot_password::{ForgotPasswordUiState, ForgotPasswordViewModel};
pub use login::{LoginUiState, LoginViewModel};
pub use register::{RegisterUiState, RegisterViewModel};
pub use setup_currency::{supported_currencies, SetupCurrencyUiState, SetupCurrencyViewModel};

pub(crate) const FILL_ALL_FIELDS: &str = "Please fill in all fields";
