//! # essaycraft CLI
//!
//! Command-line interface for the essay writer.
//!
//! Usage:
//!   essaycraft <topic>
//!   essaycraft            (prompts for the topic)
//!
//! Examples:
//!   essaycraft "The history of the printing press"
//!   essaycraft --api-style chat --model gpt-4o-mini "Why bees matter"
//!   essaycraft --max-revisions 1 --json "Tidal energy" > essay.json
//!
//! Keys are read from the environment (or a `.env` file): `TAVILY_API_KEY` is
//! required, `GOOGLE_API_KEY` + `GOOGLE_CSE_ID` enable the search fallback.

use clap::{Parser, ValueEnum};
use essaycraft_agent::{EssayState, EssayWriter, WriterConfig};
use essaycraft_error::{Error, Result};
use essaycraft_provider::{
    ApiStyle, CompletionProvider, FallbackSearch, GoogleSearchConfig, GoogleSearchProvider,
    OpenAICompatProvider, ProviderConfig, SearchProvider, TavilyConfig, TavilyProvider,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "essaycraft")]
#[command(author, version, about = "essaycraft - plan, research, draft, critique, revise")]
struct Cli {
    /// Essay topic (prompted for when omitted)
    #[arg(trailing_var_arg = true)]
    topic: Vec<String>,

    /// OpenAI-compatible base URL
    #[arg(long, env = "COMPLETION_API_URL", default_value = "http://localhost:4000/v1")]
    completion_url: String,

    /// Bearer token for the completion backend
    #[arg(long, env = "COMPLETION_API_KEY", hide_env_values = true)]
    completion_key: Option<String>,

    /// Model name sent to the completion backend
    #[arg(long, env = "COMPLETION_MODEL", default_value = "mistral")]
    model: String,

    /// Which completion endpoint to call
    #[arg(long, env = "COMPLETION_API_STYLE", value_enum, default_value_t = ApiStyleArg::Completions)]
    api_style: ApiStyleArg,

    /// Tavily API key (primary search)
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    tavily_key: String,

    /// Google API key (fallback search)
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_key: Option<String>,

    /// Google custom search engine id (fallback search)
    #[arg(long, env = "GOOGLE_CSE_ID")]
    google_cse_id: Option<String>,

    /// Critique-driven rewrites after the first draft
    #[arg(long, default_value = "3")]
    max_revisions: u32,

    /// Search queries kept per research step
    #[arg(long, default_value = "3")]
    max_queries: usize,

    /// Snippets requested per search query
    #[arg(long, default_value = "2")]
    results_per_query: usize,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "120")]
    timeout: u64,

    /// Cap on tokens generated per completion call
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Also write the final essay to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the whole essay state as JSON instead of the essay
    #[arg(long)]
    json: bool,

    /// Show outline, critique, step trace and token usage
    #[arg(short, long)]
    verbose: bool,

    /// Only print the essay
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ApiStyleArg {
    Completions,
    Chat,
}

impl From<ApiStyleArg> for ApiStyle {
    fn from(arg: ApiStyleArg) -> Self {
        match arg {
            ApiStyleArg::Completions => ApiStyle::Completions,
            ApiStyleArg::Chat => ApiStyle::Chat,
        }
    }
}

type Search = FallbackSearch<TavilyProvider, GoogleSearchProvider>;

fn init_tracing(verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

impl Cli {
    fn provider_config(&self) -> ProviderConfig {
        let config = ProviderConfig::local_proxy()
            .with_base_url(&self.completion_url)
            .with_model(&self.model)
            .with_api_style(self.api_style.into())
            .with_timeout(self.timeout);

        match &self.completion_key {
            Some(key) if !key.is_empty() => config.with_api_key(key),
            _ => config,
        }
    }

    fn writer_config(&self) -> WriterConfig {
        let config = WriterConfig::default()
            .with_max_revisions(self.max_revisions)
            .with_max_queries(self.max_queries)
            .with_results_per_query(self.results_per_query);
        match self.max_tokens {
            Some(max) => config.with_max_tokens(max),
            None => config,
        }
    }

    /// Tavily first; Google only when both of its settings are present.
    fn search(&self) -> Result<Search> {
        let tavily = TavilyProvider::new(
            TavilyConfig::new(&self.tavily_key).with_timeout(self.timeout),
        )?;

        match GoogleSearchConfig::from_parts(self.google_key.clone(), self.google_cse_id.clone()) {
            Some(config) => {
                let google = GoogleSearchProvider::new(config.with_timeout(self.timeout))?;
                Ok(FallbackSearch::new(tavily, google))
            }
            None => {
                tracing::warn!("GOOGLE_API_KEY/GOOGLE_CSE_ID not set, search has no fallback");
                Ok(FallbackSearch::primary_only(tavily))
            }
        }
    }
}

/// Topic from the arguments, or one line from `input` after a prompt.
fn read_topic(args: &[String], input: &mut impl BufRead, prompt: &mut impl Write) -> Result<String> {
    let topic = if args.is_empty() {
        write!(prompt, "Enter the essay topic: ")?;
        prompt.flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
        line
    } else {
        args.join(" ")
    };

    let topic = topic.trim();
    if topic.is_empty() {
        return Err(Error::invalid_argument("essay topic cannot be empty")
            .with_operation("cli::read_topic"));
    }
    Ok(topic.to_string())
}

fn write_output(path: &Path, essay: &str) -> Result<()> {
    std::fs::write(path, format!("{}\n", essay)).map_err(|e| {
        Error::from(e)
            .with_operation("cli::write_output")
            .with_context("path", path.display().to_string())
    })
}

fn print_details<C: CompletionProvider, S: SearchProvider>(
    writer: &EssayWriter<C, S>,
    state: &EssayState,
) {
    println!("\n--- Outline ---\n\n{}", state.outline);
    println!("\n--- Final Critique ---\n\n{}", state.critique);

    println!("\n--- Execution Trace ({} steps) ---", writer.trace().len());
    for step in writer.trace() {
        println!(
            "  {:3}. {:<8} r{} -> {}",
            step.index,
            step.stage.as_str(),
            step.revision,
            step.summary
        );
    }

    let usage = writer.usage();
    println!(
        "\n--- Usage ---\n  calls: {}  prompt tokens: {}  completion tokens: {}  total: {}",
        usage.total_calls,
        usage.total_prompt_tokens,
        usage.total_completion_tokens,
        usage.total_tokens()
    );
}

async fn run(cli: Cli) -> Result<()> {
    let topic = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        read_topic(&cli.topic, &mut input, &mut std::io::stdout())?
    };

    let llm = OpenAICompatProvider::new(cli.provider_config())?;
    let search = cli.search()?;
    tracing::info!(
        provider = llm.name(),
        model = llm.default_model(),
        fallback = search.has_fallback(),
        "providers ready"
    );

    let mut writer = EssayWriter::with_config(llm, search, cli.writer_config());
    let state = writer.write(&topic).await?;

    if let Some(path) = &cli.output {
        write_output(path, &state.draft)?;
        tracing::info!(path = %path.display(), "essay written");
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&state).map_err(|e| {
            Error::parse_failed("failed to serialize essay state")
                .with_operation("cli::run")
                .set_source(e)
        })?;
        println!("{}", json);
        return Ok(());
    }

    if !cli.quiet {
        println!("\nFinal Essay:\n");
    }
    println!("{}", state.draft);

    if cli.verbose {
        print_details(&writer, &state);
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // missing .env is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.quiet) {
        eprintln!("Error: {}", e);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "essay generation failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use essaycraft_error::ErrorKind;
    use std::io::Cursor;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["essaycraft", "--tavily-key", "tvly-test"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_topic_from_args() {
        let args = vec!["The".to_string(), "printing".to_string(), "press".to_string()];
        let mut out: Vec<u8> = Vec::new();
        let topic = read_topic(&args, &mut Cursor::new(""), &mut out).unwrap();

        assert_eq!(topic, "The printing press");
        assert!(out.is_empty());
    }

    #[test]
    fn test_topic_prompted_from_stdin() {
        let mut out: Vec<u8> = Vec::new();
        let topic = read_topic(&[], &mut Cursor::new("  Tidal energy \nignored\n"), &mut out).unwrap();

        assert_eq!(topic, "Tidal energy");
        assert_eq!(String::from_utf8(out).unwrap(), "Enter the essay topic: ");
    }

    #[test]
    fn test_blank_topic_rejected() {
        let err = read_topic(&[], &mut Cursor::new("   \n"), &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = read_topic(&[" ".to_string()], &mut Cursor::new(""), &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_write_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essay.txt");

        write_output(&path, "An essay.").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "An essay.\n");
    }

    #[test]
    fn test_write_output_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("essay.txt");

        let err = write_output(&path, "An essay.").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "cli::write_output");
    }

    #[test]
    fn test_flags_map_to_configs() {
        let cli = parse(&[
            "--completion-url",
            "https://llm.example/v1",
            "--model",
            "llama3",
            "--api-style",
            "chat",
            "--completion-key",
            "sk-test",
            "--max-revisions",
            "1",
            "--max-queries",
            "4",
            "--results-per-query",
            "5",
            "--timeout",
            "30",
            "--max-tokens",
            "900",
            "Why",
            "bees",
            "matter",
        ]);

        let provider = cli.provider_config();
        assert_eq!(provider.base_url, "https://llm.example/v1");
        assert_eq!(provider.default_model, "llama3");
        assert_eq!(provider.api_style, ApiStyle::Chat);
        assert_eq!(provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(provider.timeout_secs, 30);

        let writer = cli.writer_config();
        assert_eq!(writer.max_revisions, 1);
        assert_eq!(writer.max_queries, 4);
        assert_eq!(writer.results_per_query, 5);
        assert_eq!(writer.max_tokens, Some(900));

        assert_eq!(cli.topic, vec!["Why", "bees", "matter"]);
    }

    #[test]
    fn test_writer_defaults() {
        let cli = parse(&["topic"]);
        assert_eq!(cli.max_revisions, 3);
        assert_eq!(cli.writer_config(), WriterConfig::default());
        assert_eq!(cli.writer_config().max_tokens, None);
        assert!(!cli.json);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from(["essaycraft", "--tavily-key", "k", "-v", "-q", "topic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_search_fallback_needs_both_google_settings() {
        let mut cli = parse(&["topic"]);

        cli.google_key = Some("g-key".into());
        cli.google_cse_id = None;
        assert!(!cli.search().unwrap().has_fallback());

        cli.google_cse_id = Some("cse".into());
        assert!(cli.search().unwrap().has_fallback());
    }

    #[test]
    fn test_empty_tavily_key_rejected() {
        let mut cli = parse(&["topic"]);
        cli.tavily_key = String::new();

        let err = cli.search().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
