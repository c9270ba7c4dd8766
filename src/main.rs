use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use calli::config::{LowerConfig, OutputFormat};
use calli::decl;
use calli::il::Disassembler;
use calli::intrinsic::{self, FunctionSignature};
use calli::module::{ModuleBuilder, writer};

// Wrapper type for clap ValueEnum support
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Human,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Human => OutputFormat::Human,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(name = "calli")]
#[command(about = "Lower indirect-call intrinsics to CIL method bodies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower intrinsic declarations and print the resulting bodies
    Lower {
        /// Declarations of the form `Name/arity[:void]`
        decls: Vec<String>,

        /// Read declarations from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format (human, json); overrides the configuration
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Verify each body after sealing
        #[arg(long)]
        verify: bool,

        /// Trace every emitted instruction
        #[arg(long)]
        trace: bool,

        /// Also print each body with its method header, in hex
        #[arg(long)]
        headers: bool,
    },
    /// Print the intrinsic kind and calling convention of each name
    Classify {
        names: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Lower {
            decls,
            file,
            config,
            format,
            verify,
            trace,
            headers,
        } => {
            let mut config = match config {
                Some(path) => match LowerConfig::load(&path) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!("error: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
                None => LowerConfig::default(),
            };
            if let Some(format) = format {
                config.format = format.into();
            }
            config.verify |= verify;
            config.trace |= trace;

            init_logging(config.trace);

            if let Err(e) = run_lower(&decls, file, &config, headers) {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        Commands::Classify { names } => {
            for name in names {
                println!(
                    "{}: {:?}, {}",
                    name,
                    intrinsic::classify(&name),
                    intrinsic::convention_of(&name).name()
                );
            }
        }
    }

    ExitCode::SUCCESS
}

fn init_logging(trace: bool) {
    let default_level = if trace { "trace" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run_lower(
    decls: &[String],
    file: Option<PathBuf>,
    config: &LowerConfig,
    headers: bool,
) -> Result<(), String> {
    // each positional declaration counts as one line
    let mut signatures: Vec<FunctionSignature> = decl::parse_declarations(&decls.join("\n"), 1)
        .map_err(|e| format!("declaration arguments: {}", e))?;
    if let Some(path) = file {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        let first_method = signatures.len() as u32 + 1;
        let from_file = decl::parse_declarations(&content, first_method)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        signatures.extend(from_file);
    }

    if signatures.is_empty() {
        return Err("no declarations given".to_string());
    }

    let module = ModuleBuilder::from_config(config);
    for signature in &signatures {
        let lowered =
            intrinsic::lower_intrinsic(&module, config, signature).map_err(|e| e.to_string())?;
        if lowered.is_none() {
            eprintln!("skipping `{}`: not an indirect-call intrinsic", signature.name);
        }
    }

    let bodies = module.method_bodies();
    match config.format {
        OutputFormat::Human => {
            let signatures = module.standalone_signatures();
            let mut disassembler = Disassembler::new(&bodies).with_signatures(&signatures);
            print!("{}", disassembler.disassemble());
            if headers {
                println!("== Encoded ==");
                for body in &bodies {
                    println!("  [{}] {}", body.parent.row(), hex(&writer::encode_method_body(body)));
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&bodies)
                .map_err(|e| format!("failed to serialize bodies: {}", e))?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
