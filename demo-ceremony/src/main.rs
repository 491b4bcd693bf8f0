use clap::{Arg, Command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webauthn_ceremony::{CeremonyClient, ClientConfig, NoticeKind, SoftAuthenticator};

fn cli() -> Command {
    Command::new("demo-ceremony")
        .about("Register and log in against a WebAuthn relying party with a software authenticator")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("server-uri")
                .long("server-uri")
                .help("Relying-party server origin, overrides SERVER_URI"),
        )
        .arg(
            Arg::new("origin")
                .long("origin")
                .help("Client origin written into client data, overrides ORIGIN"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("Account name")
                .env("DEMO_NAME")
                .default_value("user2"),
        )
        .arg(
            Arg::new("display-name")
                .long("display-name")
                .help("Display name used at registration")
                .env("DEMO_DISPLAY_NAME")
                .default_value("User2"),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let matches = cli().get_matches();

    let mut config = ClientConfig::from_env()?;
    if let Some(server_uri) = matches.get_one::<String>("server-uri") {
        config = config.with_server_uri(server_uri)?;
    }
    if let Some(origin) = matches.get_one::<String>("origin") {
        config = config.with_origin(origin.as_str());
    }

    let name = matches
        .get_one::<String>("name")
        .map(String::as_str)
        .unwrap_or("user2");
    let display_name = matches
        .get_one::<String>("display-name")
        .map(String::as_str)
        .unwrap_or("User2");

    tracing::info!(
        "Running ceremonies for {} against {} as {}",
        name,
        config.server_uri,
        config.origin
    );

    let authenticator = SoftAuthenticator::new(config.origin.clone());
    let mut client = CeremonyClient::new(config, authenticator)?;

    let registered = client.register(name, display_name).await;
    let logged_in = client.authenticate(name).await;

    for notice in client.notices().list().await {
        let marker = match notice.kind {
            NoticeKind::Success => "ok",
            NoticeKind::Danger => "FAILED",
        };
        match notice.reason {
            Some(reason) => println!("[{marker}] {} ({reason})", notice.message),
            None => println!("[{marker}] {}", notice.message),
        }
    }

    if registered.is_success() && logged_in.is_success() {
        Ok(())
    } else {
        Err("one or more ceremonies failed".into())
    }
}
