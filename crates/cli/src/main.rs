use anyhow::Context;
use clap::{Parser, Subcommand};
use libris_app::books::{seed_sample_data, BooksModule};
use libris_kernel::settings::Settings;
use tokio_util::sync::CancellationToken;

/// LIBRIS book catalog service
#[derive(Debug, Parser)]
#[command(name = "libris", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Override the configured listen port
        #[arg(long, env = "LIBRIS_PORT")]
        port: Option<u16>,
    },
    /// Print the effective configuration as JSON
    Config,
    /// Seed a fresh in-memory catalog and print the created books as JSON
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load LIBRIS settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            tracing::info!(env = ?settings.environment, "starting LIBRIS");
            libris_app::serve(settings).await
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .with_context(|| "failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Seed => {
            let module = BooksModule::in_memory();
            let books = seed_sample_data(module.service().as_ref(), &CancellationToken::new())
                .await
                .with_context(|| "failed to seed sample data")?;
            let rendered =
                serde_json::to_string_pretty(&books).with_context(|| "failed to render books")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
