use anyhow::Result;
use candidate_mailer::cli::{run_preview, Cli, Command};
use candidate_mailer::{core::ConfigManager, start_web_server};
use clap::Parser;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("candidate_mailer=info,rocket::server=off"));

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let mut config = ConfigManager::load()?;
            if let Some(port) = port {
                info!("Port overridden from command line: {}", port);
                config.server.port = port;
            }
            start_web_server(config).await
        }
        Command::Preview { csv_file } => {
            run_preview(&csv_file).await?;
            Ok(())
        }
    }
}
