//! keygrant: fetch this machine's licenses after browser approval.
//!
//! Usage:
//!   keygrant authorize --api-url https://api.example.com \
//!       --auth-url https://example.com/authorize --public-key server.pem
//!   keygrant machine-code
//!
//! The access token is read from `KEYGRANT_ACCESS_TOKEN`. Ctrl-C cancels a
//! pending authorization.

use anyhow::{Context, Result};
use clap::Parser;
use keygrant_cli::{
    licenses_json, load_public_key, render_licenses, AuthorizeArgs, Cli, Command, PrintUrl,
};
use keygrant_license::{AccessToken, CancellationToken, LicenseClient, MachineCode};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Command::MachineCode => println!("{}", MachineCode::current()),
        Command::Authorize(args) => authorize(args).await?,
    }
    Ok(())
}

async fn authorize(args: AuthorizeArgs) -> Result<()> {
    let pinned_key = load_public_key(&args.public_key)?;
    let machine_code = args.machine_code();
    let access_token = AccessToken::new(args.access_token.as_str());

    let mut client = LicenseClient::new(args.client_config(), pinned_key)
        .context("failed to create licensing client")?;
    if args.no_browser {
        client = client.with_launcher(PrintUrl);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling authorization");
            on_interrupt.cancel();
        }
    });

    info!(machine_code = %machine_code, "requesting license keys");
    let verified = client
        .get_license_keys(&access_token, &machine_code, &cancel)
        .await
        .context("license retrieval failed")?;

    if args.json {
        println!("{}", licenses_json(&verified)?);
    } else {
        print!("{}", render_licenses(&verified, &machine_code));
    }
    Ok(())
}
