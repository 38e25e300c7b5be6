//! Turnstile core types and utilities

pub mod credentials;
pub mod error;
pub mod forms;
pub mod settings;
pub mod validation;

#[cfg(feature = "tracing")]
pub mod tracing;

pub use credentials::{
    ACCESS_TOKEN_COOKIE, CookiePolicy, CredentialPair, REFRESH_TOKEN_COOKIE, SessionState,
    StoredCredentials,
};
pub use error::{CoreError, CoreResult};
pub use forms::{LoginForm, NewPasswordForm, RegisterForm, SendEmailForm, Validate};
pub use settings::Settings;
pub use validation::ValidateConfig;
