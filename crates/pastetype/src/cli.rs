//! Command-line interface wiring the paste and notify services.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::notify::{BuildContext, BuildEvent, Notifier};
use crate::app::paste::{PasteCommand, PasteOptions};
use crate::domain::buffer::{Position, Selection, TextBuffer};
use crate::infra::clipboard::Clipboard;
use crate::infra::config::Config;
use crate::infra::runtime::ProcessRuntime;
use crate::infra::webhook::WebhookClient;

#[derive(Debug, Parser)]
#[command(
    name = "pastetype",
    version,
    about = "Paste clipboard JSON as generated source code"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate code from clipboard JSON and splice it into a file
    Paste(PasteArgs),
    /// Post a build-status message to the configured chat webhook
    Notify(NotifyArgs),
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct PasteArgs {
    /// File to splice generated code into; when omitted the result is printed
    file: Option<PathBuf>,
    /// Target language (defaults to the file extension, then config)
    #[arg(long)]
    lang: Option<String>,
    /// One-based line to insert at (defaults to end of file)
    #[arg(long, conflicts_with = "select")]
    line: Option<usize>,
    /// One-based inclusive line range to replace
    #[arg(long, value_name = "START:END")]
    select: Option<String>,
    /// Generate type definitions without marshalling code
    #[arg(long)]
    just_types: bool,
    /// Read JSON from a file instead of the clipboard
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
    /// Print the edited buffer to stdout instead of rewriting the file
    #[arg(long)]
    print: bool,
    /// Code generation executable to run
    #[arg(long, value_name = "COMMAND")]
    runtime: Option<String>,
}

#[derive(Debug, Args)]
struct NotifyArgs {
    /// Build event to announce
    #[arg(value_enum)]
    event: BuildEvent,
    /// Branch the build ran on
    #[arg(long, env = "PASTETYPE_BRANCH")]
    branch: Option<String>,
    /// CI build number
    #[arg(long, env = "PASTETYPE_BUILD_NUMBER")]
    build_number: Option<String>,
    /// Link to the CI build page
    #[arg(long, env = "PASTETYPE_BUILD_URL")]
    build_url: Option<String>,
    /// Link testers use to install the build
    #[arg(long, env = "PASTETYPE_DOWNLOAD_URL")]
    download_url: Option<String>,
    /// Webhook endpoint receiving the message
    #[arg(long, env = "PASTETYPE_WEBHOOK_URL")]
    webhook_url: Option<String>,
    /// Channel to post into
    #[arg(long)]
    channel: Option<String>,
    /// Display name shown for the message
    #[arg(long)]
    username: Option<String>,
    /// Avatar URL shown next to the message
    #[arg(long)]
    icon_url: Option<String>,
    /// Print the payload instead of posting it
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Paste(args) => run_paste(args),
            Commands::Notify(args) => run_notify(args).await,
            Commands::Completions { shell } => {
                let mut command = Cli::command();
                clap_complete::generate(shell, &mut command, "pastetype", &mut io::stdout());
                Ok(())
            }
        }
    }
}

fn run_paste(args: PasteArgs) -> Result<()> {
    let config = Config::load()?;
    let language = resolve_language(&args, &config);
    let options = PasteOptions::new(language.clone())
        .with_just_types(args.just_types || config.defaults.just_types)
        .with_profile(config.clean_profile(&language));

    let mut buffer = load_buffer(args.file.as_deref())?;
    apply_target(&mut buffer, &args)?;

    let json = read_json(&args)?;
    let mut command = PasteCommand::new(build_runtime(&args, &config));
    let outcome = match command.run(json, &mut buffer, &options) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(details = %err.details(), "paste failed");
            return Err(err.into());
        }
    };

    match &args.file {
        Some(path) if !args.print => {
            fs::write(path, buffer.to_text())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Inserted {} line(s) into {} at line {}",
                outcome.inserted,
                path.display(),
                outcome.cursor.line + 1
            );
        }
        _ => {
            println!("{}", buffer.to_text().trim_end_matches('\n'));
        }
    }
    Ok(())
}

async fn run_notify(args: NotifyArgs) -> Result<()> {
    let config = Config::load()?;
    let notifier = Notifier::from_config(&config)?
        .with_channel(args.channel)
        .with_username(args.username)
        .with_icon_url(args.icon_url);

    let context = BuildContext {
        branch: args.branch,
        build_number: args.build_number,
        build_url: args.build_url,
        download_url: args.download_url,
    };
    let message = notifier.build_message(args.event, &context)?;

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&message)?);
        return Ok(());
    }

    let url = args
        .webhook_url
        .or_else(|| config.notify.webhook_url.clone())
        .context("no webhook URL configured; pass --webhook-url or set PASTETYPE_WEBHOOK_URL")?;
    WebhookClient::new(url).post(&message).await?;
    tracing::info!(event = %args.event, "notification delivered");
    Ok(())
}

fn load_buffer(path: Option<&Path>) -> Result<TextBuffer> {
    let Some(path) = path else {
        return Ok(TextBuffer::new());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(TextBuffer::from_text(&text))
}

/// Turn `--line`/`--select` into a buffer selection. Without either flag the
/// cursor lands after the last line, so generated code is appended.
fn apply_target(buffer: &mut TextBuffer, args: &PasteArgs) -> Result<()> {
    if let Some(range) = args.select.as_deref() {
        let (first, last) = parse_select(range)?;
        let end_line = last - 1;
        let end_column = buffer.line(end_line).map_or(1, |line| line.len().max(1));
        buffer.select(Selection::new(
            Position::new(first - 1, 0),
            Position::new(end_line, end_column),
        ));
        return Ok(());
    }

    let line = match args.line {
        Some(line) if line >= 1 => line - 1,
        Some(_) => bail!("--line is one-based and must be at least 1"),
        None => buffer.line_count(),
    };
    buffer.set_cursor(Position::new(line, 0));
    Ok(())
}

fn parse_select(range: &str) -> Result<(usize, usize)> {
    let (first, last) = range
        .split_once(':')
        .with_context(|| format!("invalid --select '{range}', expected START:END"))?;
    let first: usize = first
        .trim()
        .parse()
        .with_context(|| format!("invalid --select start '{first}'"))?;
    let last: usize = last
        .trim()
        .parse()
        .with_context(|| format!("invalid --select end '{last}'"))?;
    if first < 1 || last < first {
        bail!("--select is one-based and START must not exceed END");
    }
    Ok((first, last))
}

fn resolve_language(args: &PasteArgs, config: &Config) -> String {
    if let Some(lang) = &args.lang {
        return lang.clone();
    }
    if let Some(lang) = args.file.as_deref().and_then(language_for_path) {
        return lang.to_owned();
    }
    config.defaults.language.clone()
}

/// Map a file extension to the language identifier the runtime expects.
fn language_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?;
    let language = match extension {
        "swift" => "swift",
        "m" | "h" | "mm" => "objective-c",
        "rs" => "rust",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" => "javascript",
        "py" => "python",
        "rb" => "ruby",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "cs" => "csharp",
        "cpp" | "cc" | "cxx" | "hpp" => "c++",
        "dart" => "dart",
        "elm" => "elm",
        _ => return None,
    };
    Some(language)
}

fn build_runtime(args: &PasteArgs, config: &Config) -> ProcessRuntime {
    let command = args
        .runtime
        .clone()
        .unwrap_or_else(|| config.runtime.command.clone());
    ProcessRuntime::new(command)
        .with_args(config.runtime.args.clone())
        .with_top_level(config.runtime.top_level.clone())
}

fn read_json(args: &PasteArgs) -> Result<Option<String>> {
    if let Some(path) = &args.input {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(Some(text));
    }

    match Clipboard::new().read() {
        Ok(text) => Ok(text),
        Err(err) => {
            tracing::warn!(error = %err, "clipboard unavailable");
            Ok(None)
        }
    }
}
