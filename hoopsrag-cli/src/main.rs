//! HoopsRAG CLI - ask questions about basketball box scores
//!
//! # Commands
//!
//! ```bash
//! # Show the documents generated from a statistics file
//! hoopsrag normalize nba_fantasy_dataset.csv --limit 5
//!
//! # Embed text and show vector stats
//! hoopsrag embed "Jayson Tatum kaç sayı attı?" --query
//!
//! # Retrieve the nearest documents for a question
//! hoopsrag search "Jayson Tatum kaç sayı attı?" -k 3
//!
//! # Answer one question
//! hoopsrag ask "Jayson Tatum kaç sayı attı?" --show-sources
//!
//! # Interactive session
//! hoopsrag chat
//! ```
//!
//! Settings come from `hoopsrag.toml` (or `--config`) and the environment;
//! `RUST_LOG=hoopsrag_lib=debug` shows pipeline progress.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hoopsrag_lib::{
    config::Config,
    embed::{self, Embedder},
    normalize::{normalize, Language},
    record::read_table,
    session::{Reply, Session},
    store::SearchResult,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hoopsrag")]
#[command(about = "Question answering over basketball box scores")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./hoopsrag.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a statistics file into documents and print them
    Normalize {
        /// Statistics file (defaults to the configured data path)
        input: Option<PathBuf>,

        /// Number of documents to print
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Document language: "tr" or "en"
        #[arg(long)]
        lang: Option<Language>,
    },

    /// Embed text with the configured embedder and show vector info
    Embed {
        /// Text to embed
        text: String,

        /// Treat as query (uses the model's query prompt, if any)
        #[arg(short, long)]
        query: bool,
    },

    /// Retrieve the documents nearest to a question
    Search {
        /// Question to search for
        query: String,

        /// Number of results to return
        #[arg(short, long)]
        k: Option<usize>,

        /// Statistics file (defaults to the configured data path)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Answer one question
    Ask {
        /// Question to answer
        question: String,

        /// Number of documents given to the model
        #[arg(short, long)]
        k: Option<usize>,

        /// Statistics file (defaults to the configured data path)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the retrieved documents below the answer
        #[arg(short, long)]
        show_sources: bool,
    },

    /// Ask questions interactively, one per line
    Chat {
        /// Number of documents given to the model
        #[arg(short, long)]
        k: Option<usize>,

        /// Statistics file (defaults to the configured data path)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>, file: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::load(path.map(PathBuf::as_path)).context("failed to load configuration")?;
    if let Some(file) = file {
        config.data_path = file;
    }
    Ok(config)
}

fn start_session(config: Config) -> Result<Session> {
    println!("Loading '{}'...", config.data_path.display());
    let session = Session::start(config).context("failed to start session")?;
    println!(
        "Indexed {} documents ({} rows skipped)",
        session.documents().len(),
        session.skipped().len()
    );
    Ok(session)
}

fn print_results(results: &[SearchResult]) {
    for (i, result) in results.iter().enumerate() {
        println!("#{} (score: {:.4})", i + 1, result.score);
        println!("{}\n", result.document.text);
    }
}

fn print_reply(reply: &Reply, show_sources: bool) {
    println!("\n{}\n", reply.answer.trim());
    if show_sources && reply.from_context() {
        println!("=== Sources ===\n");
        print_results(&reply.sources);
    }
}

fn chat(session: &mut Session, k: Option<usize>) -> Result<()> {
    println!("Ask a question (\"reload\" re-reads the file, \"exit\" quits).");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let question = line?;
        let question = question.trim();

        match question {
            "" => continue,
            "exit" | "quit" => break,
            "reload" => match session.reload() {
                Ok(()) => println!("Reloaded {} documents", session.documents().len()),
                Err(e) => eprintln!("error: {e}"),
            },
            _ => match session.ask(question, k) {
                Ok(reply) => print_reply(&reply, true),
                // the index survives a failed question, so keep going
                Err(e) => eprintln!("error: {e}"),
            },
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { input, limit, lang } => {
            let mut config = load_config(cli.config.as_ref(), input)?;
            if let Some(lang) = lang {
                config.language = lang;
            }

            let table = read_table(&config.data_path, config.delimiter_byte()?)?;
            let template = config.language.template();
            let normalized = normalize(&table, template.as_ref(), config.include_metadata);

            println!(
                "Normalized '{}' into {} documents using the {} template:\n",
                config.data_path.display(),
                normalized.documents.len(),
                template.name()
            );
            for doc in normalized.documents.iter().take(limit) {
                println!("- {}\n", doc.text);
            }

            if !normalized.skipped.is_empty() {
                println!("Skipped {} rows:", normalized.skipped.len());
                for skip in &normalized.skipped {
                    println!("  {skip}");
                }
            }
        }

        Commands::Embed { text, query } => {
            let config = load_config(cli.config.as_ref(), None)?;
            let mut embedder = embed::from_config(&config.embedding)?;

            let embedding = if query {
                println!("Embedding as query: {text}");
                embedder.embed_query(&text)?
            } else {
                println!("Embedding as document: {text}");
                embedder
                    .embed_documents(&[text.as_str()])?
                    .into_iter()
                    .next()
                    .context("embedder returned no vectors")?
            };

            println!("\nEmbedding stats ({}):", embedder.model_name());
            println!("  Dimensions: {}", embedding.len());
            println!("  First 5 values: {:?}", &embedding[..embedding.len().min(5)]);
            println!("  Min: {:.4}", embedding.iter().cloned().fold(f32::INFINITY, f32::min));
            println!("  Max: {:.4}", embedding.iter().cloned().fold(f32::NEG_INFINITY, f32::max));
        }

        Commands::Search { query, k, file } => {
            let config = load_config(cli.config.as_ref(), file)?;
            let mut session = start_session(config)?;

            println!("\nSearching: '{query}'\n");
            let results = session.search(&query, k)?;
            if results.is_empty() {
                println!("No results.");
            }
            print_results(&results);
        }

        Commands::Ask {
            question,
            k,
            file,
            show_sources,
        } => {
            let config = load_config(cli.config.as_ref(), file)?;
            let mut session = start_session(config)?;
            let reply = session.ask(&question, k)?;
            print_reply(&reply, show_sources);
        }

        Commands::Chat { k, file } => {
            let config = load_config(cli.config.as_ref(), file)?;
            let mut session = start_session(config)?;
            chat(&mut session, k)?;
        }
    }

    Ok(())
}
