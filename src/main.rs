use clap::Parser;
use colored::*;
use std::io;
use std::process;
use std::sync::Arc;

use faq_assistant::agent::{Agent, FaqAgent};
use faq_assistant::bridge::{BridgeOptions, StreamingBridge};
use faq_assistant::chat::ChatSession;
use faq_assistant::cli::Args;
use faq_assistant::config::{Config, JsonConfig};
use faq_assistant::index::FaqIndex;
use faq_assistant::logs::{FilesystemLogWriter, InteractionSink};
use faq_assistant::ui::{display_header, TerminalView};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Handle --config-init option
    if args.config_init {
        match JsonConfig::init_config() {
            Ok(path) => {
                println!("{}", format!("Config written to {}", path.display()).green());
                return Ok(());
            }
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red(), e);
                process::exit(1);
            }
        }
    }

    // Load configuration
    let config = match Config::from_env_and_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    if config.verbose {
        eprintln!(
            "{}",
            format!(
                "[faq] Indexing {} (filter: {:?})",
                config.faq_directory.display(),
                config.filter
            )
            .dimmed()
        );
    }

    let index = match FaqIndex::from_directory(&config.faq_directory, &config.filter) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    if index.is_empty() {
        eprintln!(
            "{}",
            "Warning: no FAQ documents matched; answers will not be grounded.".yellow()
        );
    } else if config.verbose {
        eprintln!(
            "{}",
            format!("[faq] Indexed {} documents", index.len()).dimmed()
        );
    }

    // Built once, shared by every exchange of the session
    let agent: Arc<dyn Agent> = Arc::new(FaqAgent::new(&config, Arc::new(index)));
    let sink: Arc<dyn InteractionSink> =
        Arc::new(FilesystemLogWriter::new(&config.logs_directory));
    let bridge = StreamingBridge::with_options(
        agent,
        sink,
        BridgeOptions {
            debounce: config.debounce,
            ..BridgeOptions::default()
        },
    );

    if config.verbose {
        eprintln!("{}", format!("[faq] Using model: {}", config.model).dimmed());
        eprintln!(
            "{}",
            format!("[faq] Logging to {}", config.logs_directory.display()).dimmed()
        );
    }

    let mut session = ChatSession::new(bridge);
    let mut view = TerminalView::new();

    if !args.question.is_empty() {
        let question = args.question.join(" ");
        if session.submit(&question, &mut view).is_err() {
            process::exit(1);
        }
        return Ok(());
    }

    display_header(&format!(
        "Ask me anything about the FAQ in {}",
        config.faq_directory.display()
    ));
    let stdin = io::stdin();
    session.run(stdin.lock(), &mut view)?;

    Ok(())
}
