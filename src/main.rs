//! azsum CLI - Azure text and web page summarisation and Q&A
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::Context;
use azsum::{display, model::InputPayload, Config, Summarizer, SummaryLength};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use dialoguer::{Input, Select};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "azsum")]
#[command(author, version, about = "Summarise or ask questions about any text or website using Azure AI", long_about = None)]
struct Cli {
    /// Path to a config file (defaults to ./azsum.toml or ~/.config/azsum/azsum.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise text or a webpage
    Summarize {
        #[command(subcommand)]
        input: SummarizeInput,
        /// Summary length
        #[arg(long, value_enum, default_value_t = SummaryLength::Short, global = true)]
        length: SummaryLength,
        /// Print the result as JSON
        #[arg(long, global = true)]
        json: bool,
    },
    /// Ask a question about text or a webpage
    Ask(AskArgs),
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SummarizeInput {
    /// Summarise text given as an argument, or `-` for stdin
    Text { text: String },
    /// Summarise a webpage by URL
    Url { url: String },
}

#[derive(Args)]
struct AskArgs {
    /// The question to answer
    #[arg(short, long)]
    question: String,
    /// Context text, or `-` for stdin
    #[arg(long, required_unless_present = "url", conflicts_with = "url")]
    text: Option<String>,
    /// Webpage to use as context
    #[arg(long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(Commands::Completions { shell }) = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "azsum", &mut std::io::stdout());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    let summarizer = Summarizer::new(&config)?;

    match cli.command {
        Some(Commands::Summarize {
            input,
            length,
            json,
        }) => {
            let payload = match input {
                SummarizeInput::Text { text } => InputPayload::text(read_arg(text)?),
                SummarizeInput::Url { url } => {
                    println!("Fetching: {}", url);
                    InputPayload::url(url)
                }
            };
            let result = summarizer.summarize(&payload, length).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                display::print_summary(&result.summary);
            }
        }
        Some(Commands::Ask(args)) => {
            let outcome = match (args.text, args.url) {
                (Some(text), _) => summarizer.ask(&read_arg(text)?, &args.question).await,
                (None, Some(url)) => {
                    println!("Fetching: {}", url);
                    summarizer.answer_question_url(&url, &args.question).await?
                }
                (None, None) => anyhow::bail!("either --text or --url is required"),
            };
            display::print_answer(outcome);
        }
        Some(Commands::Completions { .. }) => {}
        None => interactive(&summarizer).await?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "azsum=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read `-` as stdin, anything else verbatim
fn read_arg(value: String) -> anyhow::Result<String> {
    if value != "-" {
        return Ok(value);
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

/// Form-style flow: pick a mode, an input type, then fill in the fields
async fn interactive(summarizer: &Summarizer) -> anyhow::Result<()> {
    println!(
        "{}",
        "Azure Website/Text Summarizer & Q&A".bright_blue().bold()
    );
    println!("Summarize or ask questions about any text or website content using Azure AI\n");

    let mode = Select::new()
        .with_prompt("Choose mode")
        .items(&["Summarization", "Q&A"])
        .default(0)
        .interact()?;
    let use_url = Select::new()
        .with_prompt("Choose input type")
        .items(&["📝 Text", "🌐 URL"])
        .default(0)
        .interact()?
        == 1;

    if mode == 0 {
        let length = match Select::new()
            .with_prompt("Summary length")
            .items(&["Short (≈50 words)", "Long (≈100 words)"])
            .default(0)
            .interact()?
        {
            0 => SummaryLength::Short,
            _ => SummaryLength::Long,
        };

        let (label, empty_warning) = if use_url {
            ("Enter URL to summarize", "Please enter a URL to summarize.")
        } else {
            ("Enter text to summarize", "Please enter some text to summarize.")
        };
        let value = prompt(label)?;
        if value.is_empty() {
            println!("{}", empty_warning.yellow());
            return Ok(());
        }
        let payload = if use_url {
            InputPayload::url(value)
        } else {
            InputPayload::text(value)
        };

        println!("Summarizing...");
        match summarizer.summarize(&payload, length).await {
            Ok(result) => display::print_summary(&result.summary),
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    } else {
        let source = if use_url {
            prompt("Enter URL for Q&A")?
        } else {
            prompt("Enter context text for Q&A")?
        };
        let question = prompt("Ask a question about the content")?;
        if source.is_empty() || question.is_empty() {
            let warning = if use_url {
                "Please enter both a URL and a question."
            } else {
                "Please enter both context and a question."
            };
            println!("{}", warning.yellow());
            return Ok(());
        }

        println!("Searching for answer...");
        let outcome = if use_url {
            summarizer.answer_question_url(&source, &question).await
        } else {
            Ok(summarizer.ask(&source, &question).await)
        };
        match outcome {
            Ok(outcome) => display::print_answer(outcome),
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    Ok(())
}

/// Prompt for a line of input, trimmed; empty input is allowed
fn prompt(label: &str) -> anyhow::Result<String> {
    let value: String = Input::new()
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()?;
    Ok(value.trim().to_string())
}
