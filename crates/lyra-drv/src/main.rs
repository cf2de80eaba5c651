//! Lyra CLI - run a script or print its AST.
//!
//! The launcher reads one script file and either executes it or, with
//! `--ast`, pretty-prints the parsed tree. Exit code 0 on success,
//! non-zero once any diagnostic was reported.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use lyra_drv::{Config, EmitMode, Session};
use lyra_interp::binding::{build_return_int, extract_parameter};
use lyra_interp::{Bindings, TypeTag, Value};

/// Tree-walking interpreter for the Lyra scripting language
#[derive(Parser, Debug)]
#[command(name = "lyra")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tree-walking interpreter for the Lyra scripting language", long_about = None)]
struct Cli {
    /// Script file to interpret
    script: PathBuf,

    /// Print the parsed AST instead of executing
    #[arg(short = 'a', long = "ast")]
    ast: bool,

    /// Enable verbose phase logging
    #[arg(short, long)]
    verbose: bool,
}

/// Demo native bindings mirroring the embedder API.
///
/// `c_foo` logs its first parameter (expects a uint8), `c_foo2` logs and
/// returns an int8. Scripts opt in with
/// `fn c_foo2(): int8 {} = load c_foo2;`.
fn register_demo_bindings(bindings: &mut Bindings) {
    bindings.bind("c_foo", |_callee, args| {
        let parameter = extract_parameter(args, 0).ok_or("Unable to extract parameter!")?;
        if parameter.ty != TypeTag::UInt8 {
            return Err("Invalid parameter type received!".into());
        }
        print!("c_foo!\r\nparameter1 = {}\r\n", parameter.bits());
        Ok(Value::null())
    });
    bindings.bind("c_foo2", |_callee, _args| {
        print!("c_foo2!\r\n");
        build_return_int(TypeTag::Int8, -1).ok_or_else(|| "Unable to build return in binding!".into())
    });
}

fn run(cli: Cli) -> Result<()> {
    let config = Config {
        input: cli.script,
        emit: if cli.ast { EmitMode::Ast } else { EmitMode::Run },
        verbose: cli.verbose,
    };

    let mut bindings = Bindings::new();
    register_demo_bindings(&mut bindings);

    let mut session = Session::new(config);
    session.run(&bindings)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run(cli) {
        // stage diagnostics are already on stderr; add the driver summary
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
