//! Operator sign-in

use shared_types::LoginRequest;

use crate::api::ConsoleApi;
use crate::error::{ApiError, ConsoleError, ValidationErrors};
use crate::notify::{Notice, NoticeQueue};
use crate::session::Session;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !email.contains('@') {
            errors.add("email", "Email is invalid");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Default)]
pub struct LoginController {
    pub form: LoginForm,
    errors: ValidationErrors,
    submitting: bool,
    session: Session,
    notices: NoticeQueue,
}

impl LoginController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume with a token kept from an earlier sign-in.
    pub fn with_session(session: Session) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    pub fn begin_login(&mut self) -> Result<LoginRequest, ConsoleError> {
        if self.submitting {
            return Err(ConsoleError::Busy);
        }
        if let Err(errors) = self.form.validate() {
            self.notices.error(errors.to_string());
            self.errors = errors.clone();
            return Err(errors.into());
        }
        self.errors = ValidationErrors::new();
        self.submitting = true;
        Ok(LoginRequest {
            email: self.form.email.trim().to_string(),
            password: self.form.password.clone(),
        })
    }

    pub fn finish_login(&mut self, result: Result<String, ApiError>) -> Result<Session, ConsoleError> {
        self.submitting = false;
        match result {
            Ok(token) => {
                let session = Session::with_token(token);
                if !session.is_authenticated() {
                    let e = ApiError::UnexpectedShape("empty token".to_string());
                    self.notices.error(format!("Login failed: {e}"));
                    return Err(ConsoleError::Action(e));
                }
                tracing::info!(email = %self.form.email.trim(), "Operator signed in");
                self.form.password.clear();
                self.session = session.clone();
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                let message = if e.is_unauthorized() {
                    "Invalid email or password".to_string()
                } else {
                    format!("Login failed: {e}")
                };
                self.notices.error(message);
                Err(ConsoleError::Action(e))
            }
        }
    }

    pub async fn login(&mut self, api: &dyn ConsoleApi) -> Result<Session, ConsoleError> {
        let request = self.begin_login()?;
        let result = api.login(&request).await;
        self.finish_login(result)
    }

    pub fn logout(&mut self) {
        self.session = Session::anonymous();
        self.form = LoginForm::default();
    }
}
