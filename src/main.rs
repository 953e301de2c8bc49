//! Command-line interface for gamebook-mechanics

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::sync::Arc;

#[cfg(feature = "cli")]
use gamebook_mechanics::schema::{sanitize_for_schema, SchemaValidator, XsdValidator};
#[cfg(feature = "cli")]
use gamebook_mechanics::{BookRepository, BookValidator, Language, RepositoryConfig, SchemaCache};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "mechanics-check")]
#[command(author, version, about = "Gamebook mechanics validation tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the mechanics of a book
    Validate {
        /// Book number
        #[arg(short, long)]
        book: u32,

        /// Book language: en or es
        #[arg(short, long, default_value = "en")]
        lang: String,

        /// Validate only this section
        #[arg(short, long)]
        section: Option<String>,

        /// Data directory or URL (overrides the configuration)
        #[arg(short, long)]
        data: Option<String>,

        /// Repository layout configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output errors as a JSON array
        #[arg(short, long)]
        json: bool,
    },

    /// Validate an XML file against an XSD schema
    Schema {
        /// Path to the XSD schema file
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Path to the XML file to validate
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            book,
            lang,
            section,
            data,
            config,
            json,
        } => cmd_validate(book, lang, section, data, config, json).await,
        Commands::Schema { schema, file } => cmd_schema(schema, file),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

/// Returns whether the book validated without errors
#[cfg(feature = "cli")]
async fn cmd_validate(
    book: u32,
    lang: String,
    section: Option<String>,
    data: Option<String>,
    config: Option<PathBuf>,
    json_output: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let language: Language = lang.parse()?;

    let mut config = match config {
        Some(path) => RepositoryConfig::from_file(path)?,
        None => RepositoryConfig::default(),
    };
    if let Some(data) = data {
        config = config.with_base(data);
    }

    let repository = BookRepository::new(config);
    let schema = Arc::new(SchemaCache::new());
    // A missing schema is reported as a validation error, not a failure
    if let Err(e) = repository.download_schema(&schema).await {
        tracing::warn!("schema not downloaded: {}", e);
    }

    let mut validator = BookValidator::download(&repository, book, language, schema).await?;
    match section {
        Some(section) => validator.validate_section(&section),
        None => validator.validate_book(),
    }

    let errors = validator.errors();
    if json_output {
        println!("{}", serde_json::to_string_pretty(errors)?);
    } else if errors.is_empty() {
        println!("Book {} ({}): no errors", book, language);
    } else {
        for error in errors {
            println!("{}", error);
        }
        println!();
        println!("Book {} ({}): {} error(s)", book, language, errors.len());
    }

    Ok(errors.is_empty())
}

#[cfg(feature = "cli")]
fn cmd_schema(schema_path: PathBuf, file: PathBuf) -> Result<bool, Box<dyn std::error::Error>> {
    let schema = std::fs::read_to_string(&schema_path)?;
    let xml = std::fs::read_to_string(&file)?;

    let schema_name = schema_path.display().to_string();
    let filename = file.display().to_string();
    let output = XsdValidator::new().validate(
        &sanitize_for_schema(&xml),
        &schema,
        &["--noout", "--schema", schema_name.as_str(), filename.as_str()],
    );

    println!("{}", output);
    Ok(output == format!("{} validates", filename))
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
