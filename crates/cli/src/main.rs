use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mailtriage_core::{EmailType, FilterSet, ReadFilter, env_non_empty};
use tracing_subscriber::EnvFilter;

mod commands;

const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

#[derive(Parser)]
#[command(name = "mailtriage")]
#[command(about = "Browse and triage ingested email", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Print pages of a filtered view
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "1")]
        pages: usize,
        #[arg(long)]
        url: Option<String>,
    },
    /// Follow a filtered view, revalidating in the background
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        url: Option<String>,
    },
    /// Mark an email read (or unread)
    Mark {
        id: i64,
        #[arg(long)]
        unread: bool,
        #[arg(long)]
        url: Option<String>,
    },
    /// List distinct recipients
    Recipients {
        #[arg(long)]
        url: Option<String>,
    },
    /// Send a test notification through the configured Telegram bot
    Notify { message: String },
}

#[derive(Args)]
struct FilterArgs {
    #[arg(short, long, default_value = "all")]
    read: ReadFilter,
    #[arg(short = 't', long = "type", value_delimiter = ',')]
    email_types: Vec<EmailType>,
    #[arg(long = "recipient")]
    recipients: Vec<String>,
}

impl FilterArgs {
    fn into_filter_set(self) -> FilterSet {
        FilterSet::new(self.read)
            .with_email_types(self.email_types)
            .with_recipients(self.recipients)
    }
}

pub(crate) fn api_url(flag: Option<String>) -> String {
    flag.or_else(|| env_non_empty("MAILTRIAGE_API_URL"))
        .unwrap_or_else(|| DEFAULT_API_URL.to_owned())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(port, host).await?,
        Commands::Browse { filters, pages, url } => {
            commands::browse::run(api_url(url), filters.into_filter_set(), pages).await?;
        },
        Commands::Watch { filters, url } => {
            commands::watch::run(api_url(url), filters.into_filter_set()).await?;
        },
        Commands::Mark { id, unread, url } => commands::mark::run(api_url(url), id, !unread).await?,
        Commands::Recipients { url } => commands::recipients::run(api_url(url)).await?,
        Commands::Notify { message } => commands::notify::run(&message).await?,
    }

    Ok(())
}
