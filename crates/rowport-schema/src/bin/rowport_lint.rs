use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rowport_schema::{RowSchema, generate_schema_json_pretty};

#[derive(Parser, Debug)]
#[command(name = "rowport-lint", about = "Validate rowport row schema files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate one or more schema files (YAML or JSON).
    Check(CheckArgs),
    /// Print the JSON Schema describing the schema file format.
    JsonSchema,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Schema files to validate.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Force the input format instead of inferring it from the extension.
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Print nothing for files that pass.
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn infer(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

fn load(path: &Path, format: Format) -> Result<RowSchema> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let schema = match format {
        Format::Yaml => RowSchema::from_yaml_str(&text)
            .with_context(|| format!("{}: invalid YAML schema", path.display()))?,
        Format::Json => RowSchema::from_json_str(&text)
            .with_context(|| format!("{}: invalid JSON schema", path.display()))?,
    };
    Ok(schema)
}

fn check(args: &CheckArgs) -> bool {
    let mut ok = true;
    for path in &args.files {
        let format = args.format.unwrap_or_else(|| Format::infer(path));
        match load(path, format) {
            Ok(schema) => match schema.validate() {
                Ok(()) => {
                    if !args.quiet {
                        println!(
                            "{}: ok ({} fields)",
                            path.display(),
                            schema.fields.len()
                        );
                    }
                }
                Err(err) => {
                    ok = false;
                    for issue in err.issues() {
                        eprintln!("{}: {issue}", path.display());
                    }
                }
            },
            Err(err) => {
                ok = false;
                eprintln!("{err:#}");
            }
        }
    }
    ok
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check(args) => {
            if check(&args) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::JsonSchema => {
            println!("{}", generate_schema_json_pretty());
            Ok(ExitCode::SUCCESS)
        }
    }
}
