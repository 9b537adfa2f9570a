//! Email body templates

use minijinja::{context, Environment, Value};

use crate::error::Result;

const VERIFY_EMAIL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <p>Hi {{ username }},</p>
    <p>Thanks for signing up. Please confirm your email address:</p>
    <p><a href="{{ host }}auth/confirmed_email/{{ token }}">Confirm email</a></p>
    <p>The link is valid for 7 days.</p>
  </body>
</html>
"#;

const RESET_PASSWORD_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <p>Someone asked to reset the password for this account.</p>
    <p><a href="{{ host }}auth/reset-password/{{ token }}">Choose a new password</a></p>
    <p>If it wasn't you, ignore this email.</p>
  </body>
</html>
"#;

/// Rendered verbatim; only for values that never come from user input
fn trusted(value: &str) -> Value {
    Value::from_safe_string(value.to_string())
}

fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("verify_email.html", VERIFY_EMAIL_TEMPLATE)?;
    env.add_template("reset_password.html", RESET_PASSWORD_TEMPLATE)?;
    Ok(env)
}

/// Render the confirmation email
pub fn render_verify_email(host: &str, username: &str, token: &str) -> Result<String> {
    let env = environment()?;
    let template = env.get_template("verify_email.html")?;
    Ok(template.render(context! {
        host => trusted(host),
        username,
        token => trusted(token),
    })?)
}

/// Render the password reset email
pub fn render_reset_password(host: &str, token: &str) -> Result<String> {
    let env = environment()?;
    let template = env.get_template("reset_password.html")?;
    Ok(template.render(context! {
        host => trusted(host),
        token => trusted(token),
    })?)
}
