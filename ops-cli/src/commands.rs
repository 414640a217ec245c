//! Subcommand runners

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use records_store::{BackendConfig, PostgrestBackend, RecordsBackend, SupabaseStorage};
use records_tools::{Dispatcher, OpenAiToolSelector, RecordQueries, SelectorConfig, ToolsRegistry};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use voice_recognition_service::{VoiceConfig, VoiceService};

use crate::cli::Commands;
use crate::dataset;
use crate::interactive::answer;
use crate::loader::{Loader, RowReport, RowStatus};

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

const EXAMPLE_QUERIES: [&str; 5] = [
    "What is Steven Moss's date of birth?",
    "Show me the MRI scans for John Smith",
    "List all scans for Sarah Chen",
    "Add an annotation to Emily Davis's latest scan: mild edema noted",
    "What annotations does Michael Brown have?",
];

/// Each entry lists accepted names for one setting; the first is reported
const QUERY_VARS: &[&[&str]] = &[&["OPENAI_API_KEY", "OPENAI_KEY"], &["SUPABASE_URL"], &["SUPABASE_KEY"]];
const LOAD_VARS: &[&[&str]] = &[&["SUPABASE_URL"], &["SUPABASE_KEY"]];

const DEFAULT_SELECTION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Query => query().await,
        Commands::Generate { count, start, out, seed } => generate(count, start, &out, seed),
        Commands::Renumber { csv, start } => renumber(&csv, start),
        Commands::Load { csv, data_dir } => load(&csv, &data_dir).await,
        Commands::Check => check().await,
    }
}

/// Names of required settings that are unset or blank
pub fn missing_vars<F>(lookup: F, required: &[&[&str]]) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    required
        .iter()
        .filter(|names| !names.iter().any(|name| lookup(name).is_some_and(|v| !v.trim().is_empty())))
        .filter_map(|names| names.first().map(|name| (*name).to_string()))
        .collect()
}

fn require_env(required: &[&[&str]]) -> Result<()> {
    let missing = missing_vars(|key| std::env::var(key).ok(), required);
    if !missing.is_empty() {
        bail!("Missing required environment variables: {}", missing.join(", "));
    }
    Ok(())
}

/// Positive number of seconds from `key`, or `default` when unset
pub fn seconds_var<F>(lookup: F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => bail!("{} must be a positive number of seconds, got '{}'", key, raw),
        },
    }
}

fn backend(config: &BackendConfig) -> Result<Arc<dyn RecordsBackend>> {
    Ok(Arc::new(PostgrestBackend::new(config)?))
}

async fn query() -> Result<()> {
    require_env(QUERY_VARS)?;

    let registry = ToolsRegistry::new();
    let selector = OpenAiToolSelector::new(SelectorConfig::from_env()?, &registry)?;
    let env = |key: &str| std::env::var(key).ok();
    let selection_timeout = seconds_var(env, "MEDVOX_LLM_TIMEOUT_SECS", DEFAULT_SELECTION_TIMEOUT)?;
    let tool_timeout = seconds_var(env, "MEDVOX_TOOL_TIMEOUT_SECS", DEFAULT_TOOL_TIMEOUT)?;
    let dispatcher = Dispatcher::new(RecordQueries::new(backend(&BackendConfig::from_env()?)?))
        .with_call_timeout(tool_timeout);

    println!("{}", "Medical Records Query System".bright_cyan().bold());
    println!("Type 'quit', 'exit' or 'q' to leave.\n");
    println!("Example queries:");
    for example in EXAMPLE_QUERIES {
        println!("  - {}", example);
    }
    println!();

    loop {
        let line = match tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt("Query")
                .allow_empty(true)
                .interact_text()
        })
        .await?
        {
            Ok(line) => line,
            // End of input
            Err(_) => break,
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if QUIT_WORDS.iter().any(|w| text.eq_ignore_ascii_case(w)) {
            break;
        }

        let cancel = CancellationToken::new();
        match answer(&selector, &dispatcher, text, selection_timeout, &cancel).await {
            Ok(steps) if steps.is_empty() => println!("\n{}", "No answer".bright_yellow()),
            Ok(steps) => {
                for step in steps {
                    println!("{}", step);
                }
            }
            Err(e) => println!("\n{} {}", "Error:".bright_red(), e),
        }
        println!("{}", "-".repeat(50));
    }

    println!("Goodbye!");
    Ok(())
}

fn generate(count: usize, start: u32, out: &Path, seed: Option<u64>) -> Result<()> {
    let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let rows = dataset::generate(count, start, &mut rng);
    dataset::write_file(out, &dataset::to_csv(&rows))?;

    println!("✅ Generated {} patients in {}", rows.len(), out.display().to_string().bright_white());
    Ok(())
}

fn renumber(csv: &Path, start: u32) -> Result<()> {
    let input = dataset::read_file(csv)?;
    let (output, count) = dataset::renumber(&input, start)?;
    dataset::write_file(csv, &output)?;

    println!("✅ Renumbered {} scan files in {}", count, csv.display().to_string().bright_white());
    Ok(())
}

async fn load(csv: &Path, data_dir: &Path) -> Result<()> {
    require_env(LOAD_VARS)?;

    let rows = dataset::from_csv(&dataset::read_file(csv)?)?;
    let config = BackendConfig::from_env()?;
    let loader = Loader::new(backend(&config)?, Arc::new(SupabaseStorage::new(&config)?), data_dir);

    let progress = ProgressBar::new(rows.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let summary = loader
        .load_all(&rows, |report| {
            if let Some(line) = describe(report) {
                progress.println(line);
            }
            progress.set_message(report.name.clone());
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    println!(
        "✅ Loaded {} patients, {} skipped, {} failed",
        summary.loaded.to_string().bright_green(),
        summary.skipped.to_string().bright_yellow(),
        summary.failed.to_string().bright_red()
    );
    if summary.loaded == 0 && !rows.is_empty() {
        bail!("No rows were loaded from {}", csv.display());
    }
    Ok(())
}

fn describe(report: &RowReport) -> Option<String> {
    match &report.status {
        RowStatus::Loaded(_) => None,
        RowStatus::Skipped(reason) => Some(format!("⚠️  line {}: {}", report.line, reason)),
        RowStatus::Failed(error) => Some(format!(
            "{} line {} ({}): {}",
            "❌".bright_red(),
            report.line,
            report.name,
            error
        )),
    }
}

async fn check() -> Result<()> {
    let service = VoiceService::new(VoiceConfig::from_env()?)?;
    let status = service
        .check_connection()
        .await
        .with_context(|| format!("Connection check against {} failed", service.provider_name()))?;

    println!("Status Code: {}", status.status_code);
    println!("Response: {}", status.body);
    if !status.ok {
        bail!("{} rejected the credentials", status.provider);
    }
    println!("✅ {} credentials are valid", status.provider.bright_green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn every_missing_setting_is_listed() {
        let missing = missing_vars(lookup(&[("SUPABASE_KEY", "k")]), QUERY_VARS);
        assert_eq!(missing, vec!["OPENAI_API_KEY", "SUPABASE_URL"]);
    }

    #[test]
    fn alias_satisfies_a_setting() {
        let missing = missing_vars(
            lookup(&[("OPENAI_KEY", "sk"), ("SUPABASE_URL", "u"), ("SUPABASE_KEY", "k")]),
            QUERY_VARS,
        );
        assert!(missing.is_empty());
    }

    #[test]
    fn blank_values_count_as_missing() {
        let missing = missing_vars(lookup(&[("SUPABASE_URL", "  "), ("SUPABASE_KEY", "k")]), LOAD_VARS);
        assert_eq!(missing, vec!["SUPABASE_URL"]);
    }

    #[test]
    fn timeout_defaults_when_unset_and_rejects_zero() {
        const KEY: &str = "MEDVOX_LLM_TIMEOUT_SECS";

        let unset = seconds_var(lookup(&[]), KEY, DEFAULT_SELECTION_TIMEOUT).unwrap();
        assert_eq!(unset, Duration::from_secs(30));

        let set = seconds_var(lookup(&[(KEY, " 5 ")]), KEY, DEFAULT_SELECTION_TIMEOUT).unwrap();
        assert_eq!(set, Duration::from_secs(5));

        let err = seconds_var(lookup(&[(KEY, "0")]), KEY, DEFAULT_SELECTION_TIMEOUT).unwrap_err();
        assert!(err.to_string().contains("positive number of seconds"));
    }

    #[test]
    fn skipped_rows_are_described() {
        let report = RowReport {
            line: 2,
            name: "Jane Roe".to_string(),
            status: RowStatus::Skipped("Scan file not found: a.jpg".to_string()),
        };
        assert_eq!(describe(&report).unwrap(), "⚠️  line 2: Scan file not found: a.jpg");
    }
}
