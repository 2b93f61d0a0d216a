pub mod server;

use crate::keycloak::KeycloakConfig;

#[derive(Debug)]
pub enum Action {
    Server { port: u16, config: KeycloakConfig },
}
