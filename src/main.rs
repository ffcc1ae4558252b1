//! counsel CLI: visa-type selection expert system.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use visa_counsel::catalog::Catalog;
use visa_counsel::config::VisaTypeConfig;
use visa_counsel::export;
use visa_counsel::fact::Answer;
use visa_counsel::loader::{self, RuleFile};
use visa_counsel::report::Diagnosis;
use visa_counsel::session::Session;
use visa_counsel::validate;

#[derive(Parser)]
#[command(name = "counsel", version, about = "Visa-type selection expert system")]
struct Cli {
    /// Path to the rule catalogue.
    #[arg(long, global = true, default_value = "rules.json")]
    rules: PathBuf,

    /// Path to the visa-type configuration. Falls back to the built-in
    /// ordering when the file is missing.
    #[arg(long, global = true, default_value = "visa_types.toml")]
    visa_types: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive consultation (y/n/u, plus back/restart/quit).
    Consult,

    /// Check the catalogue for integrity issues without consulting.
    Validate,

    /// Export the rule catalogue as CSV.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Import rules from CSV. Previews unless --apply is given.
    Import {
        /// CSV file to import.
        file: PathBuf,

        /// Write the imported rules back to the catalogue file.
        #[arg(long)]
        apply: bool,
    },

    /// List the configured visa types in ask order.
    Types,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let visa_config = load_visa_config(&cli.visa_types);

    match cli.command {
        Commands::Consult => {
            let catalog = loader::load_catalog(&cli.rules, visa_config)?;
            consult(catalog)
        }
        Commands::Validate => {
            let catalog = loader::load_catalog(&cli.rules, visa_config)?;
            let issues = validate::check_catalog(&catalog);
            if issues.is_empty() {
                println!("ok: no issues found in {} rules", catalog.len());
            } else {
                for issue in &issues {
                    println!("{}: {}", issue.severity, issue.message);
                }
                println!("{} issue(s) found", issues.len());
            }
            Ok(())
        }
        Commands::Export { output } => {
            let file = RuleFile::load(&cli.rules)?;
            let csv = export::export_csv(&file.rules);
            match output {
                Some(path) => std::fs::write(&path, csv).into_diagnostic()?,
                None => print!("{csv}"),
            }
            Ok(())
        }
        Commands::Import { file, apply } => {
            let text = std::fs::read_to_string(&file).into_diagnostic()?;
            let outcome = export::import_csv(&text);
            for error in &outcome.errors {
                eprintln!("error: {error}");
            }
            println!("parsed {} rule(s)", outcome.records.len());
            if !outcome.is_clean() {
                miette::bail!("{} row(s) rejected; nothing saved", outcome.errors.len());
            }
            if apply {
                let existing = RuleFile::load(&cli.rules).unwrap_or_default();
                let updated = RuleFile {
                    rules: outcome.records,
                    goal_actions: existing.goal_actions,
                };
                updated.save(&cli.rules)?;
                println!("saved to {}", cli.rules.display());
            } else {
                println!("preview only; re-run with --apply to save");
            }
            Ok(())
        }
        Commands::Types => {
            for code in visa_config.codes() {
                match visa_config.get(code).and_then(|v| v.name.as_deref()) {
                    Some(name) => println!("{code}\t{name}"),
                    None => println!("{code}"),
                }
            }
            Ok(())
        }
    }
}

fn load_visa_config(path: &Path) -> VisaTypeConfig {
    if path.exists() {
        match VisaTypeConfig::load(path) {
            Ok(config) => return config,
            Err(e) => {
                eprintln!("warning: {e}; using built-in visa-type order");
            }
        }
    }
    VisaTypeConfig::fallback()
}

/// Drive one interactive consultation on stdin/stdout.
fn consult(catalog: Catalog) -> Result<()> {
    let mut session = Session::new(Arc::new(catalog));
    let start = session.start();

    if start.is_complete {
        println!("nothing to ask; the catalogue settles without input.");
        print_diagnosis(&session.diagnosis());
        return Ok(());
    }

    println!("answer with y(es) / n(o) / u(nknown); back, restart or quit.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let question = match session.current_question() {
            Some(q) => q.to_string(),
            None => break,
        };
        let related = session.related_visa_types(&question);
        if related.is_empty() {
            print!("? {question} ");
        } else {
            print!("? {question} [{}] ", related.join(", "));
        }
        io::stdout().flush().into_diagnostic()?;

        let line = match lines.next() {
            Some(line) => line.into_diagnostic()?,
            None => break,
        };
        let input = line.trim().to_lowercase();

        match input.as_str() {
            "q" | "quit" | "exit" => return Ok(()),
            "b" | "back" => {
                let outcome = session.back(1);
                match &outcome.current_question {
                    Some(q) => println!("back at: {q}"),
                    None => println!("nothing to go back to"),
                }
                continue;
            }
            "r" | "restart" => {
                session.restart();
                println!("restarted.");
                continue;
            }
            _ => {}
        }

        let answer = match Answer::parse(&input) {
            Some(answer) => answer,
            None => {
                println!("please answer y, n or u (or back / restart / quit)");
                continue;
            }
        };

        let outcome = session.answer(&question, answer)?;

        for fact in &outcome.derived_facts {
            println!("  => {fact}");
        }

        if outcome.is_complete {
            if let Some(diagnosis) = outcome.diagnosis {
                print_diagnosis(&diagnosis);
            }
            return Ok(());
        }
    }

    // Ran out of questions without an explicit completion.
    print_diagnosis(&session.diagnosis());
    Ok(())
}

fn print_diagnosis(diagnosis: &Diagnosis) {
    println!();
    println!("=== diagnosis ===");
    if diagnosis.applicable.is_empty() {
        println!("applicable: none");
    } else {
        println!("applicable:");
        for visa in &diagnosis.applicable {
            println!("  [{}] {}", visa.visa_type, visa.action);
        }
    }
    if !diagnosis.conditional.is_empty() {
        println!("conditional:");
        for visa in &diagnosis.conditional {
            if visa.unknown_conditions.is_empty() {
                println!("  [{}] {}", visa.visa_type, visa.action);
            } else {
                println!(
                    "  [{}] {} (unknown: {})",
                    visa.visa_type,
                    visa.action,
                    visa.unknown_conditions.join("; ")
                );
            }
        }
    }
    if !diagnosis.unknown_conditions.is_empty() {
        println!("answered unknown: {}", diagnosis.unknown_conditions.join("; "));
    }
}
