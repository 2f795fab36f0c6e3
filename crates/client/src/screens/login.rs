//! Login, sign-up and password reset screen.

use lakshmi_core::{PASSWORD_POLICY_MESSAGE, validate_password};

use crate::context::ShopContext;

use super::{Effect, Route};

/// Which form the screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    #[default]
    Login,
    SignUp,
    ForgotPassword,
}

impl LoginMode {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::SignUp => "Sign Up",
            Self::ForgotPassword => "Reset Password",
        }
    }

    /// The mode the "switch" link leads to.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Login => Self::SignUp,
            Self::SignUp | Self::ForgotPassword => Self::Login,
        }
    }
}

/// Form fields. Which ones are shown depends on the mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub new_password: String,
    pub code: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoginScreen {
    mode: LoginMode,
    pub form: LoginForm,
    password_visible: bool,
    new_password_visible: bool,
    /// In `ForgotPassword`, whether a code has been requested.
    reset_code_sent: bool,
}

impl LoginScreen {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the screen is shown; a signed-in user is sent home.
    #[must_use]
    pub const fn on_open(&self, ctx: &ShopContext) -> Effect {
        if ctx.session().is_authenticated() {
            Effect::Navigate(Route::Home)
        } else {
            Effect::Stay
        }
    }

    #[must_use]
    pub const fn mode(&self) -> LoginMode {
        self.mode
    }

    #[must_use]
    pub const fn password_visible(&self) -> bool {
        self.password_visible
    }

    #[must_use]
    pub const fn new_password_visible(&self) -> bool {
        self.new_password_visible
    }

    #[must_use]
    pub const fn reset_code_sent(&self) -> bool {
        self.reset_code_sent
    }

    /// Switch forms. Secrets are cleared; name and email are kept.
    pub fn set_mode(&mut self, mode: LoginMode) {
        self.mode = mode;
        self.form.password.clear();
        self.form.new_password.clear();
        self.form.code.clear();
        self.password_visible = false;
        self.new_password_visible = false;
        self.reset_code_sent = false;
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    pub fn forgot_password(&mut self) {
        self.set_mode(LoginMode::ForgotPassword);
    }

    pub const fn toggle_password_visibility(&mut self) {
        self.password_visible = !self.password_visible;
    }

    pub const fn toggle_new_password_visibility(&mut self) {
        self.new_password_visible = !self.new_password_visible;
    }

    /// Submit the current form.
    pub async fn submit(&mut self, ctx: &mut ShopContext) -> Effect {
        match self.mode {
            LoginMode::Login => {
                match ctx.login(&self.form.email, &self.form.password).await {
                    Ok(_) => Effect::Navigate(Route::Home),
                    Err(e) => e.into(),
                }
            }
            LoginMode::SignUp => {
                match ctx
                    .register(&self.form.name, &self.form.email, &self.form.password)
                    .await
                {
                    Ok(_) => Effect::Navigate(Route::Home),
                    Err(e) => e.into(),
                }
            }
            LoginMode::ForgotPassword if !self.reset_code_sent => self.request_code(ctx).await,
            LoginMode::ForgotPassword => self.reset_password(ctx).await,
        }
    }

    async fn request_code(&mut self, ctx: &ShopContext) -> Effect {
        if self.form.email.trim().is_empty() {
            return Effect::error("Please enter your email");
        }
        match ctx.api().request_password_reset(&self.form.email).await {
            Ok(()) => {
                self.reset_code_sent = true;
                Effect::success("If an account exists for this email, a reset code has been sent")
            }
            Err(e) => e.into(),
        }
    }

    async fn reset_password(&mut self, ctx: &ShopContext) -> Effect {
        if validate_password(&self.form.new_password).is_err() {
            return Effect::error(PASSWORD_POLICY_MESSAGE);
        }
        let code = self.form.code.trim();
        if code.is_empty() {
            return Effect::error("Please enter the reset code");
        }

        match ctx
            .api()
            .reset_password(&self.form.email, &self.form.new_password, code)
            .await
        {
            Ok(()) => {
                self.set_mode(LoginMode::Login);
                Effect::success("Password updated, please log in")
            }
            Err(e) => e.into(),
        }
    }
}
