use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exam_connectors::{
    config::Config, LogReconciliationService, ObjectStorageClient, SubmissionFilter,
    SubmissionTable,
};

/// Prints the reconciled submission table and one filtered view of it.
#[derive(Debug, Parser)]
#[command(name = "exam-connectors", version)]
struct Cli {
    /// Student identifier, compared case-insensitively
    #[arg(long)]
    user: Option<String>,

    /// Task number
    #[arg(long)]
    task: Option<String>,

    /// Keep only correct (true) or incorrect (false) submissions
    #[arg(long)]
    correct: Option<bool>,

    /// Column to sort the filtered view by
    #[arg(long, default_value = "D")]
    sort: String,

    /// Sort the filtered view from largest to smallest
    #[arg(long)]
    descending: bool,

    /// Rows of the full table to print first
    #[arg(long, default_value_t = 5)]
    head: usize,

    /// Print the filtered view as JSON
    #[arg(long)]
    json: bool,

    /// Also print the roster from object storage
    #[arg(long)]
    roster: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "exam_connectors=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    tracing::info!(
        host = %config.mongo.host,
        port = config.mongo.port,
        "Loading submission logs"
    );
    let service = LogReconciliationService::connect(&config.mongo).await?;

    print!("{}", service.table().head(cli.head));
    println!();

    let mut filter = SubmissionFilter::new().sort_by(cli.sort, !cli.descending);
    filter.user = cli.user;
    filter.task = cli.task;
    filter.correct = cli.correct;

    let view = service.filter(&filter);
    print_view(&view, cli.json)?;

    if cli.roster {
        let settings = config
            .object_storage
            .context("--roster needs OBJECT_STORAGE_BUCKET to be configured")?;
        let storage = ObjectStorageClient::new(settings)?;
        for name in service.student_names(&storage).await? {
            println!("{}", name);
        }
    }

    Ok(())
}

fn print_view(view: &SubmissionTable, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(view).context("Failed to serialise view")?
        );
    } else {
        print!("{}", view);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_defaults_to_ascending() {
        let cli = Cli::try_parse_from(["exam-connectors"]).unwrap();
        assert!(!cli.descending);
        assert_eq!(cli.sort, "D");

        let cli = Cli::try_parse_from(["exam-connectors", "--descending"]).unwrap();
        assert!(cli.descending);
        assert!(Cli::try_parse_from(["exam-connectors", "--ascending"]).is_err());
    }
}
