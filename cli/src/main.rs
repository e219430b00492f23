//! Command-line front end over `jsonschema-llm-core`.
//!
//! Reads schemas/documents from a file argument or stdin, writes results
//! to stdout as JSON. This binary is a thin shell: all conversion logic
//! lives in the core crate, this file only wires up argument parsing, I/O,
//! and logging.

mod io;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jsonschema_llm_codegen::ClientLanguage;
use jsonschema_llm_core::{
    convert, convert_all_components, extract_component, list_components, rehydrate,
    validation::strict_mode, ConvertOptions, ExtractOptions, Target,
};

#[derive(Parser)]
#[command(name = "jsonschema-llm", version, about = "Convert JSON Schemas into LLM structured-output dialects")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a JSON Schema for a target provider's structured-output mode.
    Convert {
        /// Path to the input schema, or "-" for stdin.
        schema: PathBuf,
        /// Target structured-output dialect.
        #[arg(long, value_enum)]
        target: CliTarget,
        /// Recursion unroll depth for cyclic $refs.
        #[arg(long, default_value_t = 3)]
        recursion_limit: usize,
        /// Maximum schema nesting depth to preserve.
        #[arg(long, default_value_t = 50)]
        max_depth: usize,
    },
    /// Reverse a codec's transforms against a document an LLM produced.
    Rehydrate {
        /// Path to the document to rehydrate, or "-" for stdin.
        data: PathBuf,
        /// Path to the codec produced by a prior `convert` call.
        #[arg(long)]
        codec: PathBuf,
    },
    /// List every extractable component pointer in a schema.
    ListComponents {
        /// Path to the input schema, or "-" for stdin.
        schema: PathBuf,
    },
    /// Extract one component as a standalone schema.
    ExtractComponent {
        /// Path to the input schema, or "-" for stdin.
        schema: PathBuf,
        /// JSON Pointer to the component, e.g. "#/$defs/Address".
        pointer: String,
    },
    /// Extract and convert every component in a schema.
    ConvertAllComponents {
        /// Path to the input schema, or "-" for stdin.
        schema: PathBuf,
        #[arg(long, value_enum)]
        target: CliTarget,
    },
    /// Report what converting a schema for a target would change or drop,
    /// without performing the conversion.
    Audit {
        /// Path to the input schema, or "-" for stdin.
        schema: PathBuf,
        #[arg(long, value_enum)]
        target: CliTarget,
    },
    /// Generate a thin client stub for one of the compiled binding crates.
    Codegen {
        #[arg(long, value_enum)]
        language: CliLanguage,
        /// Compiled binding module/package name to import from.
        #[arg(long)]
        module_name: String,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum CliTarget {
    OpenaiStrict,
    Gemini,
    Claude,
}

impl From<CliTarget> for Target {
    fn from(t: CliTarget) -> Self {
        match t {
            CliTarget::OpenaiStrict => Target::OpenaiStrict,
            CliTarget::Gemini => Target::Gemini,
            CliTarget::Claude => Target::Claude,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum CliLanguage {
    Typescript,
    Python,
}

impl From<CliLanguage> for ClientLanguage {
    fn from(l: CliLanguage) -> Self {
        match l {
            CliLanguage::Typescript => ClientLanguage::TypeScript,
            CliLanguage::Python => ClientLanguage::Python,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(started_at = %chrono::Utc::now(), "jsonschema-llm cli starting");

    match cli.command {
        Command::Convert {
            schema,
            target,
            recursion_limit,
            max_depth,
        } => {
            let schema = io::read_json(&schema)?;
            let config = ConvertOptions {
                target: target.into(),
                recursion_limit,
                max_depth,
                ..ConvertOptions::default()
            };
            let result = convert(&schema, &config).context("conversion failed")?;
            io::write_json(&result)
        }
        Command::Rehydrate { data, codec } => {
            let data = io::read_json(&data)?;
            let codec_json = io::read_json(&codec)?;
            // Accept either a bare codec or a full `convert` result, for
            // convenience when piping one command's output into the other.
            let codec_json = codec_json.get("codec").cloned().unwrap_or(codec_json);
            let codec = serde_json::from_value(codec_json).context("codec is not well-formed")?;
            let result = rehydrate(&data, &codec).context("rehydration failed")?;
            io::write_json(&result)
        }
        Command::ListComponents { schema } => {
            let schema = io::read_json(&schema)?;
            io::write_json(&list_components(&schema))
        }
        Command::ExtractComponent { schema, pointer } => {
            let schema = io::read_json(&schema)?;
            let options = ExtractOptions::default();
            let result = extract_component(&schema, &pointer, &options).context("extraction failed")?;
            io::write_json(&result)
        }
        Command::ConvertAllComponents { schema, target } => {
            let schema = io::read_json(&schema)?;
            let convert_options = ConvertOptions {
                target: target.into(),
                ..ConvertOptions::default()
            };
            let extract_options = ExtractOptions::default();
            let results = convert_all_components(&schema, &convert_options, &extract_options);
            io::write_json(&results)
        }
        Command::Audit { schema, target } => {
            let schema = io::read_json(&schema)?;
            let findings = strict_mode::audit(&schema, target.into());
            io::write_json(&findings)
        }
        Command::Codegen { language, module_name } => {
            let stub = jsonschema_llm_codegen::generate_client_stub(language.into(), &module_name)
                .context("client stub generation failed")?;
            print!("{stub}");
            Ok(())
        }
    }
}
