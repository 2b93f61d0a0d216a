use crate::api;
use crate::cli::actions::Action;
use crate::keycloak::KeycloakClient;
use anyhow::Result;
use std::sync::Arc;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server { port, config } => {
            let client = KeycloakClient::new(config)?;

            api::new(port, Arc::new(client)).await?;
        }
    }

    Ok(())
}
