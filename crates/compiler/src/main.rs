//! Ahoy Compiler CLI
//!
//! Command-line interface for transpiling .ahoy programs to C,
//! building executables, and normalizing source files.

use ahoyc::{CompilerConfig, compile_file, config, emit_c_file, formatter};
use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "ahoyc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ahoy compiler - transpile .ahoy programs to C and build them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .ahoy file to an executable
    Build {
        /// Input .ahoy source file
        input: PathBuf,

        /// Output executable path (defaults to input filename without
        /// the .ahoy extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep the intermediate C file (.c)
        #[arg(long)]
        keep_c: bool,

        /// Extra include directory for imported header discovery
        #[arg(long = "include", value_name = "DIR")]
        include_paths: Vec<PathBuf>,

        /// C compiler to invoke (default: cc, or the ahoy.toml setting)
        #[arg(long)]
        cc: Option<String>,
    },

    /// Transpile a .ahoy file to C without invoking the C compiler
    EmitC {
        /// Input .ahoy source file
        input: PathBuf,

        /// Output .c path (defaults to input with a .c extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Normalize .ahoy source files in place
    Fmt {
        /// Files to format
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Only check; exit nonzero if any file would change
        #[arg(long)]
        check: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            keep_c,
            include_paths,
            cc,
        } => {
            let mut config = load_config(&input);
            config.keep_c |= keep_c;
            config.include_paths.extend(include_paths);
            if let Some(cc) = cc {
                config.cc = cc;
            }
            match compile_file(&input, output.as_deref(), &config) {
                Ok(exe) => println!("Built {}", exe.display()),
                Err(e) => fail(&e),
            }
        }
        Commands::EmitC { input, output } => {
            let config = load_config(&input);
            match emit_c_file(&input, output.as_deref(), &config) {
                Ok(c_path) => println!("Wrote {}", c_path.display()),
                Err(e) => fail(&e),
            }
        }
        Commands::Fmt { files, check } => run_fmt(&files, check),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }
}

/// Project config from ahoy.toml beside the input, if any.
fn load_config(input: &std::path::Path) -> CompilerConfig {
    let dir = input.parent().unwrap_or_else(|| std::path::Path::new("."));
    match CompilerConfig::load(dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("warning: {} ignored: {}", config::MANIFEST_NAME, e);
            CompilerConfig::default()
        }
    }
}

fn run_fmt(files: &[PathBuf], check: bool) {
    let mut dirty = false;
    for file in files {
        let source = match fs::read_to_string(file) {
            Ok(s) => s,
            Err(e) => fail(&format!("Failed to read {}: {}", file.display(), e)),
        };
        let formatted = formatter::format_source(&source);
        if formatted == source {
            continue;
        }
        dirty = true;
        if check {
            println!("{} needs formatting", file.display());
        } else if let Err(e) = fs::write(file, formatted) {
            fail(&format!("Failed to write {}: {}", file.display(), e));
        }
    }
    if check && dirty {
        process::exit(1);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}
