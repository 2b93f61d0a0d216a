use crate::cli::actions::Action;
use crate::keycloak::KeycloakConfig;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let base_url = matches
        .get_one::<String>("keycloak-url")
        .cloned()
        .context("missing required argument: --keycloak-url")?;

    let admin_username = matches
        .get_one::<String>("admin-username")
        .cloned()
        .context("missing required argument: --admin-username")?;

    let admin_password = matches
        .get_one::<String>("admin-password")
        .cloned()
        .context("missing required argument: --admin-password")?;

    // Defaulted args, always present after parsing
    let realm = matches.get_one::<String>("realm").cloned().unwrap_or_default();
    let client_id = matches
        .get_one::<String>("client-id")
        .cloned()
        .unwrap_or_default();
    let client_secret = matches
        .get_one::<String>("client-secret")
        .cloned()
        .unwrap_or_default();
    let admin_realm = matches
        .get_one::<String>("admin-realm")
        .cloned()
        .unwrap_or_default();

    let config = KeycloakConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        realm,
        client_id,
        client_secret: SecretString::from(client_secret),
        admin_username,
        admin_password: SecretString::from(admin_password),
        admin_realm,
    };

    Ok(Action::Server { port, config })
}
