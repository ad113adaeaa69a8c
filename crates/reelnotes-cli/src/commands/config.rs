use crate::context::AppContext;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use reelnotes_config::{Config, CredentialStore, API_KEY_ENV, API_KEY_PLACEHOLDER};
use serde_json::json;
use std::path::Path;

pub async fn run_config(ctx: &AppContext, cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(ctx, full, output),
        ConfigCommands::Init { force } => init_config(ctx, force, output),
        ConfigCommands::SetApiKey { key } => set_api_key(ctx, key, output),
    }
}

fn show_config(ctx: &AppContext, full: bool, output: &Output) -> Result<()> {
    let config = &ctx.config;
    let api_key = ctx.api_key().unwrap_or_default();
    let shown_key = if full && !api_key.is_empty() {
        api_key.clone()
    } else {
        mask_string(&api_key)
    };
    let logs = log_target(config.logging.file.as_deref());

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            println!("\n{}", "Configuration".bright_cyan().bold());
            if let Some(problem) = &ctx.config_problem {
                println!("{} {}", "✗".red(), problem);
                println!("  Showing defaults; 'reelnotes config init --force' rewrites the file.");
            } else if !ctx.config_file.exists() {
                println!(
                    "{} {} (defaults in use; run 'reelnotes config init')",
                    "⚠".yellow(),
                    "no config file".dimmed()
                );
            }
            println!();

            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            table.set_header(vec![
                Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
            ]);
            table.add_row(vec![Cell::new("Config file"), Cell::new(ctx.config_file.display())]);
            table.add_row(vec![Cell::new("Bind address"), Cell::new(&config.server.bind_addr)]);
            table.add_row(vec![Cell::new("TMDB base URL"), Cell::new(&config.tmdb.base_url)]);
            table.add_row(vec![
                Cell::new("TMDB API key"),
                if config.is_tmdb_configured(&ctx.credentials) {
                    Cell::new(&shown_key).fg(comfy_table::Color::Green)
                } else {
                    Cell::new(&shown_key).fg(comfy_table::Color::Red)
                },
            ]);
            table.add_row(vec![Cell::new("Review slot"), Cell::new(&config.reviews.slot_key)]);
            table.add_row(vec![
                Cell::new("Review data"),
                Cell::new(ctx.paths.reviews_dir().display()),
            ]);
            table.add_row(vec![
                Cell::new("Seed sample reviews"),
                Cell::new(config.reviews.seed_fixtures),
            ]);
            table.add_row(vec![
                Cell::new("Review id strategy"),
                Cell::new(format!("{:?}", config.reviews.id_strategy).to_lowercase()),
            ]);
            table.add_row(vec![Cell::new("Default user"), Cell::new(&config.reviews.default_user)]);
            table.add_row(vec![Cell::new("Logs"), Cell::new(&logs)]);
            println!("{}", table);

            if !config.is_tmdb_configured(&ctx.credentials) {
                println!();
                println!(
                    "Set {} or run 'reelnotes config set-api-key <KEY>' to reach TMDB.",
                    API_KEY_ENV.bold()
                );
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let mut value = serde_json::to_value(config)?;
            value["tmdb"]["api_key"] = json!(shown_key);
            output.json(&json!({
                "config_file": ctx.config_file,
                "config_file_exists": ctx.config_file.exists(),
                "config_problem": ctx.config_problem,
                "reviews_dir": ctx.paths.reviews_dir(),
                "logs": logs,
                "config": value,
            }));
        }
    }

    Ok(())
}

fn init_config(ctx: &AppContext, force: bool, output: &Output) -> Result<()> {
    if ctx.config_file.exists() && !force {
        output.warn(format!(
            "Config file already exists at {}; pass --force to overwrite",
            ctx.config_file.display()
        ));
        return Ok(());
    }

    ctx.paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories: {}", e))?;
    Config::default()
        .save_to_file(&ctx.config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", ctx.config_file.display(), e))?;

    output.success(format!("Wrote default config to {}", ctx.config_file.display()));
    Ok(())
}

fn set_api_key(ctx: &AppContext, key: String, output: &Output) -> Result<()> {
    let key = key.trim().to_string();
    if key.is_empty() || key == API_KEY_PLACEHOLDER {
        return Err(eyre!("Refusing to store an empty or placeholder API key"));
    }

    let mut credentials = CredentialStore::new(ctx.paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    credentials.set_tmdb_api_key(key.clone());
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;

    output.success(format!("TMDB API key saved ({})", mask_string(&key)));
    if std::env::var(API_KEY_ENV).is_ok() {
        output.warn(format!("{} is set and takes precedence over the stored key", API_KEY_ENV));
    }
    Ok(())
}

/// Where log lines go: the configured file (rotated daily) or stderr.
fn log_target(file: Option<&Path>) -> String {
    match file {
        Some(path) => format!("{} (daily rotation)", path.display()),
        None => "stderr".to_string(),
    }
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == API_KEY_PLACEHOLDER {
        return "<not set>".to_string();
    }
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    match (s.get(..2), s.get(s.len() - 2..)) {
        (Some(head), Some(tail)) => format!("{}***{}", head, tail),
        _ => "*".repeat(s.chars().count()),
    }
}
