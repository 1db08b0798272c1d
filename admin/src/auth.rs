//! Sign-in and registration against the auth endpoints.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::navigator::{Navigator, Route};
use crate::session::{SessionError, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("auth server unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("auth server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("login response carried no token")]
    MissingToken,
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

pub struct AuthClient {
    client: reqwest::Client,
    login_url: String,
    register_url: String,
}

impl AuthClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            login_url: config.login_url(),
            register_url: config.register_url(),
        })
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, AuthError> {
        let response = self
            .client
            .post(&self.login_url)
            .json(credentials)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: LoginResponse = response.json().await?;
        body.token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)
    }

    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        let response = self
            .client
            .post(&self.register_url)
            .json(registration)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AuthError::Status {
        status: status.as_u16(),
        body,
    })
}

#[derive(Clone, Debug, Default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    /// Log in, keep the token in `session` and go to the dashboard.
    pub async fn submit(
        &self,
        client: &AuthClient,
        session: &SessionStore,
        navigator: &impl Navigator,
    ) -> Result<(), AuthError> {
        let credentials = Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        };
        let token = match client.login(&credentials).await {
            Ok(token) => token,
            Err(e) => {
                error!(email = %self.email, error = %e, "login failed");
                return Err(e);
            }
        };
        session.sign_in(token)?;
        info!(email = %self.email, "login succeeded");
        navigator.go_to(Route::Dashboard);
        Ok(())
    }
}

/// Drop the session and return to the sign-in screen.
pub fn sign_out(session: &SessionStore, navigator: &impl Navigator) -> Result<(), SessionError> {
    session.sign_out()?;
    navigator.go_to(Route::SignIn);
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// The request body, or `PasswordMismatch` if the confirmation differs.
    pub fn registration(&self) -> Result<Registration, AuthError> {
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(Registration {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            password: self.password.clone(),
        })
    }

    /// Register, then send the user to sign in.
    pub async fn submit(
        &self,
        client: &AuthClient,
        navigator: &impl Navigator,
    ) -> Result<(), AuthError> {
        let registration = self.registration()?;
        if let Err(e) = client.register(&registration).await {
            error!(email = %self.email, error = %e, "registration failed");
            return Err(e);
        }
        info!(email = %self.email, "registered");
        navigator.go_to(Route::SignIn);
        Ok(())
    }
}
