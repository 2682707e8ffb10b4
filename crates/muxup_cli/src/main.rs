//! Command-line client for the muxup admin API.

use clap::{ArgGroup, Parser, Subcommand};
use muxup_cli::{ApiClient, ClientError, RecordEditor, UploadInfo, UploadResult};
use muxup_core::models::{asset::MuxAsset, settings::MuxSettings};
use muxup_core::query::{SearchVector, SortVector};
use muxup_core::DEFAULT_CLI_SERVER_URL;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "muxup", about = "Mux video uploader admin CLI", version)]
struct Cli {
    /// Server URL (can also be set via MUXUP_SERVER env var)
    #[arg(short, long, env = "MUXUP_SERVER", default_value = DEFAULT_CLI_SERVER_URL)]
    server: String,

    /// Bearer token for the admin API (can also be set via MUXUP_TOKEN)
    #[arg(long, env = "MUXUP_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read or write Mux credentials
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Upload a video from a URL or a local file
    #[command(group(ArgGroup::new("origin").required(true).args(["from_url", "from_computer"])))]
    Upload {
        #[arg(long)]
        title: String,
        /// Let Mux fetch the video from this URL
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        from_url: Option<String>,
        /// Upload a local file (requires --file)
        #[arg(long, requires = "file")]
        from_computer: bool,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List asset records
    List {
        /// Search value
        #[arg(long)]
        search: Option<String>,
        /// Search field: by_title or by_asset_id
        #[arg(long, default_value = "by_title")]
        search_by: String,
        /// Sort field (id, title, isReady, asset_id, upload_id, created_at, updated_at)
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
        #[arg(long, default_value = "0")]
        start: usize,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show one asset record
    Show { id: u64 },
    /// Change the title and/or readiness of a record
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        ready: Option<bool>,
    },
    /// Delete a record and its Mux asset
    Delete {
        id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Report whether Mux credentials are configured
    Get,
    /// Store Mux credentials on the server
    Set {
        #[arg(long, env = "MUX_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
        #[arg(long, env = "MUX_SECRET_KEY", hide_env_values = true)]
        secret_key: String,
        #[arg(long)]
        webhook_signing_secret: Option<String>,
    },
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("response encoding error: {}", err))
}

fn format_asset_row(asset: &MuxAsset) -> String {
    let state = if asset.is_ready {
        "ready"
    } else if asset.error_message.is_some() {
        "error"
    } else {
        "pending"
    };
    format!(
        "{:>6}  {:<8} {:<32} {}",
        asset.id,
        state,
        asset.title,
        asset.asset_id.as_deref().unwrap_or("-")
    )
}

fn format_asset_detail(asset: &MuxAsset) -> String {
    let mut lines = vec![
        format!("id:           {}", asset.id),
        format!("title:        {}", asset.title),
        format!("ready:        {}", asset.is_ready),
        format!("asset_id:     {}", asset.asset_id.as_deref().unwrap_or("-")),
        format!("upload_id:    {}", asset.upload_id.as_deref().unwrap_or("-")),
        format!("playback_id:  {}", asset.playback_id.as_deref().unwrap_or("-")),
    ];
    if let Some(duration) = asset.duration {
        lines.push(format!("duration:     {:.1}s", duration));
    }
    if let Some(message) = &asset.error_message {
        lines.push(format!("error:        {}", message));
    }
    lines.push(format!("created_at:   {}", asset.created_at.to_rfc3339()));
    lines.join("\n")
}

fn format_list_output(items: &[MuxAsset], total: usize, json: bool) -> Result<String, String> {
    if json {
        return to_json(&serde_json::json!({ "items": items, "totalCount": total }));
    }
    let mut rows: Vec<String> = items.iter().map(format_asset_row).collect();
    rows.push(format!("({} of {} records)", items.len(), total));
    Ok(rows.join("\n"))
}

fn search_vector(search: Option<String>, search_by: String) -> Option<SearchVector> {
    search.map(|value| SearchVector::new(search_by, value))
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn run(client: &ApiClient, command: Commands, json: bool) -> Result<String, ClientError> {
    let output = match command {
        Commands::Settings { action } => match action {
            SettingsAction::Get => {
                let configured = client.get_is_configured().await?;
                if json {
                    to_json(&serde_json::json!({ "configured": configured }))
                        .map_err(ClientError::Validation)?
                } else if configured {
                    "Mux is configured".to_string()
                } else {
                    "Mux is not configured".to_string()
                }
            }
            SettingsAction::Set {
                access_token,
                secret_key,
                webhook_signing_secret,
            } => {
                let status = client
                    .set_mux_settings(&MuxSettings {
                        access_token,
                        secret_key,
                        webhook_signing_secret,
                    })
                    .await?;
                if json {
                    to_json(&status).map_err(ClientError::Validation)?
                } else {
                    "Mux settings saved".to_string()
                }
            }
        },
        Commands::Upload {
            title,
            from_url,
            from_computer,
            file,
        } => {
            let (info, bytes) = match (from_url, from_computer, file) {
                (Some(media), _, _) => {
                    let media = (!media.is_empty()).then_some(media);
                    (UploadInfo::from_url(title, media), None)
                }
                (None, true, Some(path)) => {
                    let bytes = tokio::fs::read(&path).await?;
                    (UploadInfo::from_computer(title), Some(bytes))
                }
                _ => {
                    return Err(ClientError::Validation(
                        "Choose --from-url <URL> or --from-computer --file <PATH>".to_string(),
                    ))
                }
            };

            let result = client.submit_upload(&info).await?;
            if let (UploadResult::Direct(ticket), Some(bytes)) = (&result, bytes) {
                tracing::info!(upload_id = %ticket.upload_id, bytes = bytes.len(), "sending file");
                client.put_file(&ticket.url, bytes).await?;
            }
            if json {
                to_json(result.asset()).map_err(ClientError::Validation)?
            } else {
                let asset = result.asset();
                format!("Uploaded: {} (record {})", asset.title, asset.id)
            }
        }
        Commands::List {
            search,
            search_by,
            sort,
            desc,
            start,
            limit,
        } => {
            let search = search_vector(search, search_by);
            let sort = sort.map(|field| SortVector { field, desc });
            let page = client
                .get_mux_assets(search.as_ref(), sort.as_ref(), start, limit)
                .await?;
            format_list_output(&page.items, page.total_count, json)
                .map_err(ClientError::Validation)?
        }
        Commands::Show { id } => {
            let asset = client.get_mux_asset(id).await?;
            if json {
                to_json(&asset).map_err(ClientError::Validation)?
            } else {
                format_asset_detail(&asset)
            }
        }
        Commands::Edit { id, title, ready } => {
            let mut editor = RecordEditor::new();
            editor.open(client.get_mux_asset(id).await?);
            if let Some(title) = title {
                editor.set_title(title);
            }
            if let Some(ready) = ready {
                editor.set_is_ready(ready);
            }
            match editor.submit(client).await? {
                Some(asset) if json => to_json(&asset).map_err(ClientError::Validation)?,
                Some(asset) => format!("Updated: {}", format_asset_row(&asset)),
                None => "Nothing to update".to_string(),
            }
        }
        Commands::Delete { id, yes } => {
            let mut editor = RecordEditor::new();
            editor.open(client.get_mux_asset(id).await?);
            editor.request_delete()?;
            let prompt = format!(
                "Delete '{}' (record {}) and its Mux asset?",
                editor.title(),
                id
            );
            if !yes && !confirm(&prompt)? {
                editor.cancel_delete();
                editor.cancel();
                return Ok("Aborted".to_string());
            }
            let outcome = editor.delete(client).await?;
            if json {
                to_json(&outcome).map_err(ClientError::Validation)?
            } else if outcome.deleted_on_mux {
                format!("Deleted record {} and its Mux asset", id)
            } else {
                format!("Deleted record {}", id)
            }
        }
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "muxup=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let Cli {
        server,
        token,
        json,
        timeout,
        command,
    } = Cli::parse();

    let client = ApiClient::new(&server, token, Duration::from_secs(timeout))?;
    match run(&client, command, json).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("muxup: {}", err);
            std::process::exit(1);
        }
    }
}
