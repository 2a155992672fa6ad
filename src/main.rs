//! leech: download one file in the background and follow its progress.
//!
//! Usage: `leech <URL> <DIR> [--name NAME] [--header K:V]... [--config FILE]`

use std::collections::HashMap;
use std::process::ExitCode;

use clap::Parser;
use futures::StreamExt;

use leech::app::Leech;
use leech::logging::init_logging;
use leech::services::converter::format_file_size;
use leech::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use leech::types::download::{DownloadRecord, DownloadStatus};
use leech::types::errors::LeechError;

#[derive(Parser, Debug)]
#[command(name = "leech", version, about = "Download a file with persisted progress")]
struct Cli {
    /// URL of the file to download
    url: String,
    /// Directory to save the file in
    dir: String,
    /// File name; defaults to a unique name derived from the URL
    #[arg(short, long)]
    name: Option<String>,
    /// Request header as `Key: Value`, repeatable
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,
    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<String>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Key: Value`, got `{}`", raw))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut engine = SettingsEngine::new(cli.config.clone());
    let settings = match engine.load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("leech: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings.log_level);

    let leech = match Leech::new(&settings) {
        Ok(leech) => leech,
        Err(e) => {
            eprintln!("leech: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let headers: HashMap<String, String> = cli.headers.into_iter().collect();
    let id = match leech
        .download(&cli.url, &cli.dir, cli.name.as_deref(), headers)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            eprintln!("leech: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Snapshots are only progress output; the exit code comes from the job's
    // final record, since a resubmitted download replays its old status first.
    let mut updates = leech.observe_one(id);
    let outcome = leech.wait_for_outcome(id);
    tokio::pin!(outcome);

    loop {
        tokio::select! {
            finished = &mut outcome => return exit_code(id, finished),
            Some(update) = updates.next() => match update {
                Ok(Some(record)) if !record.status.is_terminal() => print_record(&record),
                Ok(_) => {}
                Err(e) => {
                    eprintln!("leech: {}", e);
                    return ExitCode::FAILURE;
                }
            },
        }
    }
}

fn print_record(record: &DownloadRecord) {
    println!(
        "[{}] {} {}",
        record.status,
        record.file_name,
        format_file_size(record.byte_size)
    );
}

fn exit_code(id: i32, finished: Result<Option<DownloadRecord>, LeechError>) -> ExitCode {
    match finished {
        Ok(Some(record)) => {
            print_record(&record);
            if record.status == DownloadStatus::Complete {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Ok(None) => {
            eprintln!("leech: download {} was removed", id);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("leech: {}", e);
            ExitCode::FAILURE
        }
    }
}
