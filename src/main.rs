use anyhow::Context;
use beacon::config::Config;
use beacon::server;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let mut args = std::env::args().skip(1);
    let port = match (args.next(), args.next()) {
        (Some(arg), None) => arg.parse::<u16>().ok(),
        _ => None,
    };
    let Some(port) = port else {
        eprintln!("usage: beacon <port>");
        std::process::exit(1);
    };

    if let Err(e) = serve(port) {
        tracing::error!("Fatal: {:#}", e);
        return Err(e);
    }

    Ok(())
}

fn serve(port: u16) -> anyhow::Result<()> {
    let cfg = Config::load(port).context("loading configuration")?;
    server::listener::run(&cfg)
}
