//! protoc-gen-grpcproxy
//!
//! protoc plugin generating pluggable gRPC service proxies for Go. protoc
//! runs it without arguments, writes a `CodeGeneratorRequest` to stdin and
//! reads a `CodeGeneratorResponse` from stdout.

mod plugin;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use prost::Message;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "protoc-gen-grpcproxy")]
#[command(version, about = "Generate gRPC service proxies for Go (protoc plugin)", long_about = None)]
#[command(after_help = "EXAMPLES:\n  \
    # Run through protoc\n  \
    protoc --go_out=. --go-grpc_out=. --grpcproxy_out=. helloworld.proto\n\n  \
    # Standalone package, custom output directory\n  \
    protoc --grpcproxy_out=. --grpcproxy_opt=standalone=true,out_gopath=gen helloworld.proto\n\n  \
    # Replay a captured request without protoc\n  \
    protoc-gen-grpcproxy --request request.bin --output-dir ./out")]
struct Cli {
    /// Read the CodeGeneratorRequest from a file instead of stdin
    #[arg(long)]
    request: Option<PathBuf>,

    /// Write the generated files to a directory instead of emitting a
    /// CodeGeneratorResponse on stdout
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "protoc-gen-grpcproxy:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; stdout carries the encoded response
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let bytes = read_request(cli.request.as_deref())?;
    tracing::debug!(bytes = bytes.len(), "read request");

    // An undecodable request is a protoc-level failure: stderr and non-zero exit
    let request = grpcproxy_parser::decode_request(&bytes)?;
    let response = plugin::generate_response(request);

    match cli.output_dir.as_deref() {
        Some(output_dir) => {
            if let Some(error) = &response.error {
                bail!("{}", error);
            }
            let written = plugin::write_to_directory(&response, output_dir)
                .with_context(|| format!("Failed to write to {}", output_dir.display()))?;
            for name in written {
                eprintln!("{} {}/{}", "✓".green(), output_dir.display(), name);
            }
        }
        None => {
            io::stdout()
                .lock()
                .write_all(&response.encode_to_vec())
                .context("Failed to write CodeGeneratorResponse to stdout")?;
        }
    }

    Ok(())
}

fn read_request(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path)
            .with_context(|| format!("Failed to read request file {}", path.display())),
        None => {
            let mut bytes = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut bytes)
                .context("Failed to read CodeGeneratorRequest from stdin")?;
            Ok(bytes)
        }
    }
}
