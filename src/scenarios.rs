//! Built-in authentication scenarios

use std::path::Path;

use action_flow::{Scenario, Suite};

use crate::errors::{FlowcheckError, Result};
use crate::fixtures::FixtureStore;

pub const SUITE: &str = "authentication";
pub const LOG_IN: &str = "can-log-in";
pub const SIGN_UP: &str = "can-sign-up";

pub const USERNAME: &str = "gary.cole@example.com";
pub const PASSWORD: &str = "pAssw0rd";
pub const PHOTO_FIXTURE: &str = "images/photo.jpg";

/// Qualified names of every built-in scenario
pub fn builtin_names() -> Vec<String> {
    [LOG_IN, SIGN_UP]
        .iter()
        .map(|name| format!("{}/{}", SUITE, name))
        .collect()
}

pub fn log_in() -> Result<Scenario> {
    Ok(Scenario::builder(LOG_IN)
        .suite(SUITE)
        .navigate("/#/log-in")
        .fill("input#username", USERNAME)
        .fill_sensitive("input#password", PASSWORD)
        .click("button", "Log in")
        .expect_hash("#/")
        .build()?)
}

/// Sign-up attaches `images/photo.jpg` from `fixtures` as an `image/jpeg` file.
pub fn sign_up(fixtures: &FixtureStore) -> Result<Scenario> {
    let photo = fixtures.load(Path::new(PHOTO_FIXTURE), Some("photo.jpg"), Some("image/jpeg"))?;
    Ok(Scenario::builder(SIGN_UP)
        .suite(SUITE)
        .navigate("/#/sign-up")
        .fill("input#username", USERNAME)
        .fill("input#firstName", "Gary")
        .fill("input#lastName", "Cole")
        .fill_sensitive("input#password", PASSWORD)
        .select("select#group", "driver")
        .attach("input#photo", photo)
        .click("button", "Sign up")
        .expect_hash("#/log-in")
        .build()?)
}

/// Looks up a built-in by qualified (`authentication/can-log-in`) or short name.
pub fn builtin(name: &str, fixtures: &FixtureStore) -> Result<Scenario> {
    let short = name
        .strip_prefix(SUITE)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(name);
    match short {
        LOG_IN => log_in(),
        SIGN_UP => sign_up(fixtures),
        _ => Err(FlowcheckError::UnknownScenario(name.to_string())),
    }
}

pub fn builtin_suite(fixtures: &FixtureStore) -> Result<Suite> {
    Ok(Suite::new(SUITE)
        .with_scenario(log_in()?)
        .with_scenario(sign_up(fixtures)?))
}
