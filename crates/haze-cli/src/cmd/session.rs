//! `haze signin` / `haze signout`.

use std::io::Write;

use clap::Args;
use futures::executor::block_on;
use haze_core::User;
use haze_core::account::greeting;
use haze_core::error::ErrorCode;
use haze_core::identity::IdentityProvider;
use serde::Serialize;

use super::fail;
use crate::app::App;
use crate::output::{CliError, pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct SigninArgs {
    /// User ID to sign in as.
    #[arg(long)]
    pub uid: String,

    /// Display name; its first word is used in greetings.
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,
}

impl SigninArgs {
    fn profile(&self) -> User {
        let mut user = User::new(self.uid.trim());
        if let Some(name) = &self.name {
            user = user.with_display_name(name);
        }
        if let Some(email) = &self.email {
            user = user.with_email(email);
        }
        user
    }
}

#[derive(Debug, Serialize)]
struct SigninResult {
    uid: String,
    greeting: String,
    likes: usize,
    written_back: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SignoutResult {
    signed_out: bool,
    likes: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notifications: Vec<String>,
}

/// Execute `haze signin`: sign in, then merge this device's likes with the
/// account's cloud record.
///
/// # Errors
///
/// Fails when the uid is blank or the identity provider refuses.
pub fn run_signin(app: &App, args: &SigninArgs) -> anyhow::Result<()> {
    if args.uid.trim().is_empty() {
        return fail(
            app.output,
            &CliError::coded(ErrorCode::SignInFailed, "--uid must not be empty"),
        );
    }
    app.identity.set_profile(Some(args.profile()));

    let mut events = app.identity.subscribe();
    let Some(user) = block_on(app.browser.sign_in(&app.identity)) else {
        return fail(app.output, &CliError::from(ErrorCode::SignInFailed));
    };
    let report = block_on(app.browser.drain_auth_events(&mut events))
        .into_iter()
        .flatten()
        .next_back();
    app.save_session()?;

    let result = SigninResult {
        uid: user.uid.clone(),
        greeting: greeting(Some(&user)),
        likes: app.browser.likes().likes().len(),
        written_back: report.as_ref().is_some_and(|r| r.written_back),
        error_code: report.and_then(|r| r.error).map(ErrorCode::code),
        notifications: app.notifications(),
    };
    render_mode(
        app.output,
        &result,
        |r, w| writeln!(w, "{}\t{}", r.uid, r.likes),
        |r, w| {
            writeln!(w, "{}", r.greeting)?;
            pretty_kv(w, "Signed in", &r.uid)?;
            pretty_kv(w, "Likes", r.likes.to_string())?;
            if r.written_back {
                pretty_kv(w, "Cloud", "updated")?;
            }
            Ok(())
        },
    )
}

/// Execute `haze signout`. Likes stay on this device.
pub fn run_signout(app: &App) -> anyhow::Result<()> {
    if !block_on(app.browser.account().sign_out(&app.identity)) {
        return fail(app.output, &CliError::from(ErrorCode::SignOutFailed));
    }
    app.save_session()?;

    let result = SignoutResult {
        signed_out: true,
        likes: app.browser.likes().likes().len(),
        notifications: app.notifications(),
    };
    render_mode(
        app.output,
        &result,
        |r, w| writeln!(w, "signed_out\t{}", r.likes),
        |r, w| {
            writeln!(w, "Signed out.")?;
            pretty_kv(w, "Likes kept", r.likes.to_string())
        },
    )
}
