use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use flowc::config::Config;
use flowc::diagnostics::render_error;
use flowc::toolchain::Toolchain;

#[derive(Parser)]
#[command(name = "flow", version, about = "Flow - human syntax, native performance")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, compile, and run a .flow file
    Run {
        /// Source file path
        file: PathBuf,
        /// Show debug output
        #[arg(long)]
        debug: bool,
    },
    /// Parse and compile a .flow file to a native binary
    Build {
        /// Source file path
        file: PathBuf,
        /// Keep the intermediate .cpp file
        #[arg(long)]
        keep: bool,
        /// Show debug output
        #[arg(long)]
        debug: bool,
    },
    /// Show the generated C++ code
    Show {
        /// Source file path
        file: PathBuf,
    },
    /// Dump the parsed program as JSON
    Ast {
        /// Source file path
        file: PathBuf,
        /// Output path; prints to stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // A bare <file>.flow argument runs it implicitly.
    let mut args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1].ends_with(".flow") {
        args.insert(1, "run".to_string());
    }
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Run { file, debug } => {
            let cfg = Config::from_env();
            let debug = debug || cfg.debug;
            if debug {
                eprintln!("[debug] running {}", file.display());
            }

            let source = read_source(&file);
            let cpp_code = generate_or_exit(&source);

            if debug {
                eprintln!("[debug] generated C++:");
                eprintln!("{cpp_code}");
                eprintln!("[debug] ---");
            }

            match Toolchain::new(cfg).compile_and_run(&cpp_code, &file) {
                Ok(code) => std::process::exit(code),
                Err(err) => {
                    render_error(&source, &err);
                    std::process::exit(1);
                }
            }
        }
        Commands::Build { file, keep, debug } => {
            let cfg = Config::from_env();
            if debug || cfg.debug {
                eprintln!("[debug] building {}", file.display());
            }

            let source = read_source(&file);
            let cpp_code = generate_or_exit(&source);

            match Toolchain::new(cfg).compile(&cpp_code, &file, keep) {
                Ok(path) => println!("Built: {}", path.display()),
                Err(err) => {
                    render_error(&source, &err);
                    std::process::exit(1);
                }
            }
        }
        Commands::Show { file } => {
            let source = read_source(&file);
            let cpp_code = generate_or_exit(&source);

            let base = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "program".to_string());

            println!("// Generated from {}", file.display());
            println!("// Save as: {base}.cpp");
            println!();
            println!("{cpp_code}");
        }
        Commands::Ast { file, output } => {
            let source = read_source(&file);
            let program = match flowc::parse(&source) {
                Ok(p) => p,
                Err(err) => {
                    render_error(&source, &err);
                    std::process::exit(1);
                }
            };

            let json = match serde_json::to_string_pretty(&program) {
                Ok(j) => j,
                Err(e) => {
                    eprintln!("error: serialization failed: {e}");
                    std::process::exit(1);
                }
            };

            match output {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, &json) {
                        eprintln!("error: failed to write {}: {e}", path.display());
                        std::process::exit(1);
                    }
                }
                None => println!("{json}"),
            }
        }
    }
}

fn read_source(file: &Path) -> String {
    match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read {}: {e}", file.display());
            std::process::exit(1);
        }
    }
}

fn generate_or_exit(source: &str) -> String {
    match flowc::generate(source) {
        Ok(cpp) => cpp,
        Err(err) => {
            render_error(source, &err);
            std::process::exit(1);
        }
    }
}
