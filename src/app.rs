use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::catalog::{SortKey, ViewQuery};
use crate::cli::args::{CliArgs, Command, EditArgs, ListArgs};
use crate::cli::validation;
use crate::client::{self, CatalogBackend, ClientConfig, HttpBackend, DEFAULT_TIMEOUT_SECONDS};
use crate::config::{self, ConfigFile};
use crate::controller::{CatalogController, DeleteOutcome};
use crate::model::BookId;
use crate::output::{self, OutputFormat};
use crate::prompt::{Prompt, TerminalPrompt};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

type Controller = CatalogController<HttpBackend, TerminalPrompt>;

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label.bold(), value);
}

fn default_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_log_level(verbose).into());
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[derive(Debug)]
struct RunConfig {
    base_url: String,
    timeout: u64,
    user_agent: Option<String>,
    output_format: Option<OutputFormat>,
    sort: Option<SortKey>,
    download_path: Option<String>,
    no_color: bool,
    verbose: u8,
    config_path: Option<PathBuf>,
    command: Command,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let base_url = args
        .base_url
        .or(cfg.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    crate::utils::parse_base_url(&base_url)
        .map_err(|e| format!("invalid base_url '{base_url}': {e}"))?;

    let timeout = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    let output_format = match cfg.output_format.as_deref() {
        Some(raw) => Some(OutputFormat::parse(raw).ok_or_else(|| {
            format!("invalid output_format '{raw}', expected text, json or html")
        })?),
        None => None,
    };

    let sort = match cfg.sort.as_deref() {
        Some(raw) => SortKey::parse(raw).map_err(|e| format!("invalid sort '{raw}': {e}"))?,
        None => None,
    };

    let download_path = cfg
        .download_path
        .map(|p| config::expand_tilde_string(&p));

    Ok(RunConfig {
        base_url,
        timeout,
        user_agent: cfg.user_agent.filter(|ua| !ua.trim().is_empty()),
        output_format,
        sort,
        download_path,
        no_color,
        verbose: args.verbose,
        config_path: args.config.map(|p| config::expand_tilde(&p)),
        command: args.command,
    })
}

fn list_query(list: &ListArgs, default_sort: Option<SortKey>) -> Result<ViewQuery, String> {
    let sort = match list.sort.as_deref() {
        Some(raw) => SortKey::parse(raw).map_err(|e| format!("invalid --sort '{raw}': {e}"))?,
        None => default_sort,
    };
    Ok(ViewQuery::new(
        list.search.clone().unwrap_or_default(),
        list.genre.clone().unwrap_or_default(),
        sort,
    ))
}

fn list_format(list: &ListArgs, configured: Option<OutputFormat>) -> OutputFormat {
    list.format
        .as_deref()
        .and_then(OutputFormat::parse)
        .or_else(|| list.output.as_deref().and_then(output::infer_format_from_path))
        .or(configured)
        .unwrap_or(OutputFormat::Text)
}

async fn write_output(path: Option<&str>, bytes: &[u8]) -> Result<(), String> {
    match path {
        Some(path) => {
            let path = config::expand_tilde(path);
            tokio::fs::write(&path, bytes)
                .await
                .map_err(|e| format!("failed to write output '{}': {e}", path.display()))?;
            debug!(path = %path.display(), bytes = bytes.len(), "output written");
            Ok(())
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(bytes)
                .and_then(|_| stdout.flush())
                .map_err(|e| format!("failed to write to stdout: {e}"))
        }
    }
}

fn build_controller(run: &RunConfig, assume_yes: bool) -> Result<Controller, String> {
    let mut client_config = ClientConfig::new(&run.base_url)
        .map_err(|e| e.to_string())?
        .with_timeout(Duration::from_secs(run.timeout));
    if let Some(user_agent) = run.user_agent.as_ref() {
        client_config.user_agent = user_agent.clone();
    }
    let backend = HttpBackend::new(client_config).map_err(|e| e.to_string())?;
    Ok(CatalogController::new(backend, TerminalPrompt::new(assume_yes)))
}

async fn run_list(run: &RunConfig, list: &ListArgs) -> Result<(), String> {
    let query = list_query(list, run.sort)?;
    let format = list_format(list, run.output_format);
    let mut controller = build_controller(run, false)?.with_query(query);
    let view = controller.refresh().await.map_err(|e| e.to_string())?;

    let bytes = match format {
        OutputFormat::Text => output::render_text(&view.books),
        OutputFormat::Json => output::render_json(&view.books),
        OutputFormat::Html if list.page => {
            let href = controller.backend().config().snapshot_url();
            output::report::render_page(&view, href.as_str())
        }
        OutputFormat::Html => output::render_html_fragment(&view.books),
    };
    write_output(list.output.as_deref(), &bytes).await
}

async fn run_edit(run: &RunConfig, edit: &EditArgs) -> Result<(), String> {
    let id = BookId::new(edit.id.trim());
    let mut controller = build_controller(run, false)?;
    let mut draft = controller.edit(&id).await.map_err(|e| e.to_string())?;

    if edit.dry_run {
        controller.cancel_edit();
        return write_output(None, &output::render_json(&draft)).await;
    }

    let patch = edit.patch();
    if patch.is_empty() {
        warn!(%id, "no field overrides given, committing the record unchanged");
    }
    patch.apply(&mut draft);
    let view = controller.commit(&draft).await.map_err(|e| e.to_string())?;
    write_output(None, &output::render_text(&view.books)).await
}

async fn run_download(run: &RunConfig, requested: Option<&str>) -> Result<(), String> {
    let requested = requested
        .map(config::expand_tilde)
        .or_else(|| run.download_path.as_ref().map(PathBuf::from));
    let dest = client::snapshot_destination(requested.as_deref());
    let controller = build_controller(run, false)?;
    let written = controller
        .download(&dest, true)
        .await
        .map_err(|e| e.to_string())?;
    controller.prompt().notify(&format!(
        "Saved {written} bytes to {}",
        dest.display()
    ));
    Ok(())
}

fn run_init_config(run: &RunConfig, path: Option<&str>) -> Result<(), String> {
    let path = path
        .map(config::expand_tilde)
        .or_else(|| run.config_path.clone())
        .or_else(config::default_config_path)
        .ok_or_else(|| "could not determine a config location, pass a PATH".to_string())?;
    if config::ensure_default_config_file(&path)? {
        format_kv_line("Config", &format!("written to {}", path.display()));
    } else {
        format_kv_line("Config", &format!("already exists at {}", path.display()));
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    debug!(base_url = %run.base_url, timeout = run.timeout, "starting");
    match &run.command {
        Command::List(list) => run_list(&run, list).await,
        Command::Genres => {
            let mut controller = build_controller(&run, false)?;
            controller.refresh().await.map_err(|e| e.to_string())?;
            write_output(None, &output::render_categories_text(controller.categories())).await
        }
        Command::Show { id, json } => {
            let controller = build_controller(&run, false)?;
            let book = controller
                .backend()
                .get_book(&BookId::new(id.trim()))
                .await
                .map_err(|e| e.to_string())?;
            let bytes = if *json {
                output::render_json(&book)
            } else {
                output::render_text(std::slice::from_ref(&book))
            };
            write_output(None, &bytes).await
        }
        Command::Add(add) => {
            let draft = add.clone().into_patch().into_draft();
            let mut controller = build_controller(&run, false)?;
            let view = controller.create(&draft).await.map_err(|e| e.to_string())?;
            write_output(None, &output::render_text(&view.books)).await
        }
        Command::Edit(edit) => run_edit(&run, edit).await,
        Command::Delete { id, yes } => {
            let mut controller = build_controller(&run, *yes)?;
            match controller
                .delete(&BookId::new(id.trim()))
                .await
                .map_err(|e| e.to_string())?
            {
                DeleteOutcome::Deleted(view) => {
                    write_output(None, &output::render_text(&view.books)).await
                }
                DeleteOutcome::Cancelled => Ok(()),
            }
        }
        Command::Download { output } => run_download(&run, output.as_deref()).await,
        Command::InitConfig { path } => run_init_config(&run, path.as_deref()),
    }
}

fn load_user_config(args: &CliArgs) -> Result<ConfigFile, String> {
    if matches!(args.command, Command::InitConfig { .. }) {
        return Ok(ConfigFile::default());
    }
    match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false),
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true),
            None => Ok(ConfigFile::default()),
        },
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = load_user_config(&args)?;
    let run = build_run_config(args, cfg)?;

    if run.no_color {
        colored::control::set_override(false);
    }
    init_logging(run.verbose);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
