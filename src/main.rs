//! Template fill CLI application.
//!
//! This binary drives the docfill library against a filesystem store:
//! upload templates, inspect their placeholders and produce filled documents.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docfill::store::{FsDocumentStore, FsLocationStore};
use docfill::{
    DocumentId, FillRequest, FillerConfig, FillerError, LocationRecord, OutputFormat, Principal,
    TemplateService,
};

/// Template Fill Tool
///
/// Scan word-processing templates for #placeholders and fill them with values.
#[derive(Parser)]
#[command(name = "docfill")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Storage directory, overriding the configuration
    #[arg(long, global = true, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a template and record its placeholders
    Upload {
        /// Template file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Stored name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        principal: PrincipalArgs,
    },

    /// Rescan a stored template
    Scan { id: DocumentId },

    /// List the distinct placeholder keys of a template
    Keys { id: DocumentId },

    /// List every recorded placeholder location
    Locations {
        id: DocumentId,

        /// Print JSON records
        #[arg(long)]
        json: bool,
    },

    /// Show placeholder statistics
    Stats {
        id: DocumentId,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Fill a template and store the result
    Fill {
        id: DocumentId,

        /// Value for a placeholder (can be specified multiple times)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// JSON object of placeholder values
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "docx")]
        format: OutputFormat,

        /// Output document name
        #[arg(short, long)]
        name: String,

        /// Also write the output bytes to this path
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        principal: PrincipalArgs,
    },

    /// Remove a stored document and its locations
    Remove { id: DocumentId },
}

#[derive(clap::Args)]
struct PrincipalArgs {
    /// Acting user
    #[arg(long, default_value = "local")]
    user: String,

    /// Owning organization
    #[arg(long, default_value = "default")]
    organization: String,
}

impl From<&PrincipalArgs> for Principal {
    fn from(args: &PrincipalArgs) -> Self {
        Principal::new(args.user.as_str(), args.organization.as_str())
    }
}

/// Command handler owning the configured service.
struct FillHandler {
    service: TemplateService,
    verbose: bool,
}

impl FillHandler {
    /// Builds the service from the configuration and CLI overrides.
    fn new(config: &FillerConfig, verbose: bool) -> Self {
        let root = &config.storage.root;
        let mut service = TemplateService::new(
            Arc::new(FsDocumentStore::new(root)),
            Arc::new(FsLocationStore::new(root)),
        )
        .with_formatter(config.formatter.build());
        if let Some(converter) = config.converter.build() {
            service = service.with_converter(Arc::new(converter));
        }
        Self { service, verbose }
    }

    fn upload(&self, file: &Path, name: Option<&str>, principal: &Principal) -> Result<()> {
        if !file.exists() {
            anyhow::bail!("Input file does not exist: {}", file.display());
        }
        let bytes =
            std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let name = match name {
            Some(name) => name.to_string(),
            None => file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "template.docx".to_string()),
        };
        let content_type = content_type_for(&name);

        let result = self
            .service
            .upload(bytes, &name, content_type, principal)
            .with_context(|| "Upload failed")?;

        println!(
            "✓ Uploaded {} → {} ({} placeholder(s))",
            name, result.id, result.placeholder_count
        );
        Ok(())
    }

    fn scan(&self, id: &DocumentId) -> Result<()> {
        let count = self.service.scan(id).with_context(|| "Scan failed")?;
        println!("✓ Recorded {} placeholder location(s) for {}", count, id);
        Ok(())
    }

    fn keys(&self, id: &DocumentId) -> Result<()> {
        let keys = self.service.list_keys(id).with_context(|| "Listing keys failed")?;
        if keys.is_empty() && self.verbose {
            println!("⚠ No placeholders found");
        }
        for key in keys {
            println!("{}", key);
        }
        Ok(())
    }

    fn locations(&self, id: &DocumentId, json: bool) -> Result<()> {
        let locations = self
            .service
            .list_locations(id)
            .with_context(|| "Listing locations failed")?;
        let records: Vec<LocationRecord> = locations.iter().map(LocationRecord::from).collect();

        if json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }
        for record in &records {
            let indices: Vec<String> = [
                ("header", record.header_index),
                ("footer", record.footer_index),
                ("table", record.table_index),
                ("row", record.row_index),
                ("column", record.column_index),
                ("paragraph", record.paragraph_index),
            ]
            .iter()
            .filter_map(|(label, index)| index.map(|i| format!("{}={}", label, i)))
            .collect();
            println!("{}\t{}\t{}", record.key, record.location_type, indices.join(" "));
        }
        Ok(())
    }

    fn stats(&self, id: &DocumentId, json: bool) -> Result<()> {
        let stats = self.service.stats(id).with_context(|| "Statistics failed")?;
        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }
        println!("Total placeholders: {}", stats.total);
        println!("Distinct keys:      {}", stats.distinct_keys);
        println!("  In headers:    {}", stats.per_type.header);
        println!("  In paragraphs: {}", stats.per_type.paragraph);
        println!("  In tables:     {}", stats.per_type.table);
        println!("  In footers:    {}", stats.per_type.footer);
        Ok(())
    }

    fn fill(&self, request: FillRequest, principal: &Principal, output: Option<&Path>) -> Result<()> {
        if self.verbose {
            println!("Template: {}", request.document_id);
            println!("Format:   {}", request.output_format);
            println!("Values:   {} placeholder(s)", request.values.len());
        }

        let filled = self
            .service
            .fill(&request, principal)
            .with_context(|| "Fill failed")?;

        if self.verbose {
            println!("\nFill Summary:");
            println!("  Substituted: {}", filled.report.substituted);
            println!("  Skipped:     {}", filled.report.skipped);
        }

        if let Some(path) = output {
            let stored = self.service.read(&filled.id)?;
            std::fs::write(path, &stored.bytes)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!(
                "✓ Filled {} → {} ({}) written to {}",
                request.document_id,
                filled.id,
                filled.metadata.original_name,
                path.display()
            );
        } else {
            println!(
                "✓ Filled {} → {} ({})",
                request.document_id, filled.id, filled.metadata.original_name
            );
        }
        Ok(())
    }

    fn remove(&self, id: &DocumentId) -> Result<()> {
        self.service.remove(id).with_context(|| "Remove failed")?;
        println!("✓ Removed {}", id);
        Ok(())
    }
}

fn content_type_for(name: &str) -> &'static str {
    if name.to_lowercase().ends_with(".docx") {
        OutputFormat::Docx.content_type()
    } else {
        "application/octet-stream"
    }
}

/// Keys may be given with or without the leading `#`.
fn normalize_key(key: &str) -> String {
    let key = key.trim();
    if key.starts_with('#') {
        key.to_string()
    } else {
        format!("#{}", key)
    }
}

/// Parses one `KEY=VALUE` assignment.
fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got '{}'", raw))?;
    if key.trim().is_empty() {
        anyhow::bail!("Empty key in '{}'", raw);
    }
    Ok((normalize_key(key), value.to_string()))
}

/// Merges values from a JSON file and `--set` assignments; assignments win.
fn collect_values(file: Option<&Path>, assignments: &[String]) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let parsed: BTreeMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON object of strings", path.display()))?;
        values.extend(parsed.into_iter().map(|(k, v)| (normalize_key(&k), v)));
    }
    for raw in assignments {
        let (key, value) = parse_assignment(raw)?;
        values.insert(key, value);
    }
    Ok(values)
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "docfill=debug" } else { "docfill=info" };
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.trim().is_empty() => tracing_subscriber::EnvFilter::try_new(spec)?,
        _ => tracing_subscriber::EnvFilter::new(default),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => FillerConfig::load(path)?,
        None => FillerConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.storage.root = store.clone();
    }
    let handler = FillHandler::new(&config, cli.verbose);

    match &cli.command {
        Commands::Upload {
            file,
            name,
            principal,
        } => handler.upload(file, name.as_deref(), &principal.into()),
        Commands::Scan { id } => handler.scan(id),
        Commands::Keys { id } => handler.keys(id),
        Commands::Locations { id, json } => handler.locations(id, *json),
        Commands::Stats { id, json } => handler.stats(id, *json),
        Commands::Fill {
            id,
            set,
            values,
            format,
            name,
            output,
            principal,
        } => {
            let mut request = FillRequest::new(*id, name.as_str()).format(*format);
            request.values = collect_values(values.as_deref(), set)?;
            handler.fill(request, &principal.into(), output.as_deref())
        }
        Commands::Remove { id } => handler.remove(id),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("error: invalid RUST_LOG: {:#}", err);
        std::process::exit(1);
    }

    if let Err(err) = run(cli) {
        match err.downcast_ref::<FillerError>() {
            Some(filler) => {
                eprintln!("error[{}]: {:#}", filler.code(), err);
                std::process::exit(if filler.is_client_error() { 2 } else { 1 });
            }
            None => {
                eprintln!("error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}
