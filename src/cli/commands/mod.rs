use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};
use url::Url;

pub fn validator_base_url() -> ValueParser {
    ValueParser::from(
        move |base_url: &str| -> std::result::Result<String, String> {
            Url::parse(base_url)
                .map(|url| url.to_string())
                .map_err(|err| format!("invalid URL: {err}"))
        },
    )
}

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("ingresso")
        .about("Authentication gateway in front of Keycloak")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("INGRESSO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("keycloak-url")
                .short('k')
                .long("keycloak-url")
                .help("Keycloak base URL, example: https://keycloak.tld:8443")
                .default_value("http://localhost:8080")
                .env("INGRESSO_KEYCLOAK_URL")
                .value_parser(validator_base_url()),
        )
        .arg(
            Arg::new("realm")
                .short('r')
                .long("realm")
                .help("Keycloak realm end-user tokens are issued against")
                .default_value("master")
                .env("INGRESSO_KEYCLOAK_REALM"),
        )
        .arg(
            Arg::new("client-id")
                .long("client-id")
                .help("OIDC client id used for the token and introspection endpoints")
                .default_value("admin-cli")
                .env("INGRESSO_CLIENT_ID"),
        )
        .arg(
            Arg::new("client-secret")
                .long("client-secret")
                .help("OIDC client secret, empty for public clients")
                .default_value("")
                .env("INGRESSO_CLIENT_SECRET"),
        )
        .arg(
            Arg::new("admin-username")
                .long("admin-username")
                .help("Keycloak admin username used for user provisioning")
                .env("INGRESSO_ADMIN_USERNAME")
                .required(true),
        )
        .arg(
            Arg::new("admin-password")
                .long("admin-password")
                .help("Keycloak admin password")
                .env("INGRESSO_ADMIN_PASSWORD")
                .required(true),
        )
        .arg(
            Arg::new("admin-realm")
                .long("admin-realm")
                .help("Realm the admin account lives in")
                .default_value("master")
                .env("INGRESSO_ADMIN_REALM"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("INGRESSO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
