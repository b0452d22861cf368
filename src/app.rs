use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::api::{HttpApiOptions, HttpClientApi};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::coordinator::{ViewCoordinator, ViewOptions, ViewUpdate, DEFAULT_PAGE_SIZE};
use crate::format::{FieldFormatter, Locale};
use crate::history::{FileBackend, HistoryStore};
use crate::logging;
use crate::output;

#[derive(Debug, Clone)]
struct RunConfig {
    api: HttpApiOptions,
    page_size: u32,
    history_path: PathBuf,
    locale: Locale,
    no_color: bool,
    field_labels: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Search(String),
    NextPage,
    PreviousPage,
    Row(usize),
    Open(String),
    Back,
    ToggleHistory,
    HistoryChip(usize),
    ClearHistory,
    Reload,
    Help,
    Quit,
    Noop,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if let Some(query) = line.strip_prefix('/') {
        return Command::Search(query.trim().to_string());
    }
    if line == "search" {
        return Command::Search(String::new());
    }
    if let Some(query) = line.strip_prefix("search ") {
        return Command::Search(query.trim().to_string());
    }
    if let Some(id) = line.strip_prefix("open ") {
        let id = id.trim();
        if !id.is_empty() {
            return Command::Open(id.to_string());
        }
    }
    if let Some(n) = line.strip_prefix('h').and_then(|n| n.parse::<usize>().ok()) {
        if n > 0 {
            return Command::HistoryChip(n - 1);
        }
    }
    if let Ok(n) = line.parse::<usize>() {
        if n > 0 {
            return Command::Row(n - 1);
        }
    }
    match line {
        "" => Command::Noop,
        "n" | "next" => Command::NextPage,
        "p" | "prev" => Command::PreviousPage,
        "b" | "back" => Command::Back,
        "h" | "history" => Command::ToggleHistory,
        "clear" => Command::ClearHistory,
        "r" | "reload" => Command::Reload,
        "?" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    out.push_str(cmd.get_name());
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');

    if let Some(long_about) = cmd.get_long_about().or_else(|| cmd.get_about()) {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(cmd.get_name());
    out.push_str(" [OPTIONS]\n\n");

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    for arg in cmd.get_arguments() {
        if arg.is_hide_set() {
            continue;
        }
        let heading = arg.get_help_heading().unwrap_or("Options").to_string();
        match sections.iter_mut().find(|(h, _)| *h == heading) {
            Some((_, args)) => args.push(arg),
            None => sections.push((heading, vec![arg])),
        }
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");
        for arg in args {
            let mut parts: Vec<String> = Vec::new();
            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }
            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }
            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    parts.push(format!("--{alias}"));
                }
            }
            let mut flags = parts.join(", ");
            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                flags.push_str(&format!(" <{value_name}>"));
            }
            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');
            if let Some(help) = arg.get_help() {
                out.push_str("          ");
                out.push_str(help.to_string().trim());
                out.push('\n');
            }
        }
        out.push('\n');
    }

    out.push_str(&output::render_help());
    out.push('\n');
    out
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let base_url = args
        .url
        .or(cfg.base_url)
        .unwrap_or_else(|| HttpApiOptions::default().base_url);
    let timeout_seconds = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(HttpApiOptions::default().timeout_seconds);
    let page_size = args.page_size.or(cfg.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size in config, expected positive integer".to_string());
    }

    let locale_raw = args.locale.or(cfg.locale);
    let locale = match locale_raw.as_deref() {
        Some(raw) => Locale::parse(raw).ok_or_else(|| format!("invalid locale '{raw}'"))?,
        None => Locale::default(),
    };

    let history_path = match args.history_file.or(cfg.history_file) {
        Some(path) => config::expand_tilde(&path),
        None => config::default_history_path()
            .ok_or_else(|| "cannot resolve home directory for history file".to_string())?,
    };

    Ok(RunConfig {
        api: HttpApiOptions {
            base_url,
            timeout_seconds,
            proxy: args.proxy.or(cfg.proxy),
            header: args.header.or(cfg.header),
        },
        page_size,
        history_path,
        locale,
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        field_labels: cfg.field_labels,
    })
}

fn render_screen(view: &ViewCoordinator) -> String {
    let mut out = String::new();
    if let Some(detail) = view.detail_view() {
        out.push_str(&output::render_detail(&detail, view.formatter()));
        out.push_str(&format!("\n{}\n", "[b] back".dimmed()));
        return out;
    }

    let rows = view.visible_records();
    if !view.query().is_empty() {
        out.push_str(&format!("search: {}\n", view.query().bold()));
    }
    out.push_str(&output::render_list(&rows, view.formatter().locale()));
    out.push_str(&output::render_pager(view.pagination(), view.is_list_loading()));
    out.push('\n');
    if let Some(status) = output::render_status(view.status()) {
        out.push_str(&status);
        out.push('\n');
    }
    if view.history_open() {
        out.push_str(&output::render_history(view.history()));
        out.push('\n');
    }
    out
}

fn detail_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("scoring client...");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

enum Flow {
    Render,
    Quiet,
    Quit,
}

fn apply_command(view: &mut ViewCoordinator, command: Command) -> Flow {
    match command {
        Command::Search(query) => view.set_query(&query),
        Command::NextPage => {
            if !view.next_page() {
                println!("{}", "already on the last page".dimmed());
                return Flow::Quiet;
            }
        }
        Command::PreviousPage => {
            if !view.previous_page() {
                println!("{}", "already on the first page".dimmed());
                return Flow::Quiet;
            }
        }
        Command::Row(index) => {
            if !view.select_visible(index) {
                println!("no row {}", index + 1);
                return Flow::Quiet;
            }
        }
        Command::Open(id) => {
            if !view.select_id(&id) {
                println!("client {id} is not on this page or in history");
                return Flow::Quiet;
            }
        }
        Command::Back => view.back(),
        Command::ToggleHistory => view.toggle_history(),
        Command::HistoryChip(index) => {
            if !view.select_history(index) {
                println!("no history entry h{}", index + 1);
                return Flow::Quiet;
            }
        }
        Command::ClearHistory => view.clear_history(),
        Command::Reload => view.reload(),
        Command::Help => {
            println!("{}", output::render_help());
            return Flow::Quiet;
        }
        Command::Quit => return Flow::Quit,
        Command::Noop => {}
        Command::Unknown(raw) => {
            println!("unknown command '{raw}', type ? for help");
            return Flow::Quiet;
        }
    }
    Flow::Render
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let api = HttpClientApi::new(&run.api).map_err(|e| e.to_string())?;
    debug!(base = %api.base_url(), "scoring service configured");
    let backend = FileBackend::new(run.history_path.clone());
    debug!(path = %backend.path().display(), "loading history");
    let history = HistoryStore::load(Box::new(backend));
    let formatter = FieldFormatter::new(run.locale, run.field_labels.clone());
    let mut view = ViewCoordinator::new(
        Arc::new(api),
        history,
        formatter,
        ViewOptions {
            page_size: run.page_size,
        },
    )
    .map_err(|e| e.to_string())?;

    println!(
        ":: {:<10}: {}",
        "Service",
        run.api.base_url.bold()
    );
    println!(":: {:<10}: {}", "Page size", run.page_size);
    println!(":: {:<10}: {}", "History", run.history_path.display());
    println!("type ? for commands");

    view.start();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut spinner: Option<ProgressBar> = None;

    loop {
        let flow = tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => apply_command(&mut view, parse_command(&line)),
                Ok(None) => Flow::Quit,
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    Flow::Quit
                }
            },
            update = view.next_update() => {
                if let ViewUpdate::List(Err(e)) = &update {
                    debug!(page = e.page(), "list load failed");
                }
                Flow::Render
            }
        };

        match flow {
            Flow::Quit => break,
            Flow::Quiet => continue,
            Flow::Render => {}
        }

        let loading = view.selected().is_some() && view.detail_state().is_loading();
        match (&spinner, loading) {
            (None, true) => spinner = Some(detail_spinner()),
            (Some(_), false) => {
                if let Some(pb) = spinner.take() {
                    pb.finish_and_clear();
                }
            }
            _ => {}
        }
        println!("{}", render_screen(&view));
    }

    if let Some(pb) = spinner.take() {
        pb.finish_and_clear();
    }
    view.teardown();
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    logging::init(args.verbose);

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => {
                if let Err(e) = config::ensure_default_config_file(&path) {
                    warn!(error = %e, "could not write default config");
                }
                config::load_config(&path, true)?
            }
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
