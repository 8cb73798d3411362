use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use phototidy::dedup::{self, scanner::DuplicateScanner};
use phototidy::{BatchReport, RenamePolicy, run_rename};
use serde::Serialize;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "phototidy",
    version,
    about = "Find duplicate photos and bulk-rename files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Move visually identical images into a separate folder
    Duplicates {
        /// Folder with photos
        #[arg(short, long, value_name = "DIR")]
        source: String,
        /// Folder that receives the duplicates and `duplicates.txt`
        #[arg(short, long, value_name = "DIR")]
        dest: String,
        /// Also print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename every file in a folder
    Rename {
        /// Folder to rename files in
        #[arg(short, long, value_name = "DIR")]
        path: String,
        /// 1 = numbering, 2 = random name, 3 = custom name (prompted when omitted)
        #[arg(long, value_name = "POLICY")]
        policy: Option<String>,
        /// Base name for the custom policy
        #[arg(long, value_name = "NAME")]
        base_name: Option<String>,
        /// Also print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

const POLICY_CHOICES: [&str; 3] = ["Нумерация", "Рандомное название", "Собственное название"];

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Duplicates { source, dest, json } => {
            let (source, dest) = dedup::validate_inputs(&source, &dest)?;
            println!("▶ Поиск дубликатов в: {}", source.display());

            let progress = ProgressBar::new(0);
            progress.set_style(ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?);
            progress.set_message("вычисление хэшей…");

            let scanner = DuplicateScanner::new(source, dest).with_progress(progress);
            let outcome = benchmark("duplicate search", || dedup::dedup_with(scanner))?;

            println!("📦 Перемещено дубликатов: {}", outcome.moved);
            print_batch(&outcome.batch);
            if json {
                print_json(&outcome)?;
            }
        }

        Commands::Rename {
            path,
            policy,
            base_name,
            json,
        } => {
            let dir = phototidy::rename::validate_dir(&path)?;
            let selector = match policy {
                Some(selector) => selector,
                None => prompt_policy()?,
            };
            let base_name = match base_name {
                None if RenamePolicy::selector_needs_base_name(&selector) => {
                    Some(prompt_base_name()?)
                }
                other => other,
            };

            let outcome = run_rename(&dir.to_string_lossy(), &selector, base_name.as_deref())?;

            print_batch(&outcome.batch);
            if json {
                print_json(&outcome)?;
            }
        }
    }

    Ok(())
}

fn prompt_policy() -> Result<String> {
    let choice = Select::new()
        .with_prompt("Выберите способ переименования")
        .items(&POLICY_CHOICES)
        .default(0)
        .interact()
        .context("Failed to read rename policy")?;
    Ok((choice + 1).to_string())
}

fn prompt_base_name() -> Result<String> {
    Input::<String>::new()
        .with_prompt("Базовое название")
        .interact_text()
        .context("Failed to read base name")
}

fn print_batch(batch: &BatchReport) {
    println!("{}", batch.summary_line());
    for item in batch.failures() {
        eprintln!(
            "⚠️  {}: {}",
            item.path.display(),
            item.outcome.reason().unwrap_or_default()
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run `f()`, log how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    log::info!("{} took {:.2?}", label, start.elapsed());
    result
}
