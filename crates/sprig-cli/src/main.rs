use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sprig_lang::{Environment, Interpreter, NamespaceRegistry, Value};
use tracing::debug;

/// Sprig - run a script and print its result
#[derive(Parser, Debug)]
#[command(name = "sprig")]
#[command(about = "Run Sprig scripts", long_about = None)]
struct Args {
    /// Script file to run (reads stdin when neither a file nor --eval is given)
    path: Option<PathBuf>,

    /// Run this source text instead of a file
    #[arg(short, long, conflicts_with = "path")]
    eval: Option<String>,

    /// Bind a global before running, e.g. `-D width=4`
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_define)]
    defines: Vec<(String, String)>,

    /// Print the token list (for debugging)
    #[arg(long)]
    tokens: bool,

    /// Print the parsed AST (for debugging)
    #[arg(long)]
    ast: bool,

    /// Do not install the standard namespaces
    #[arg(long)]
    bare: bool,
}

fn parse_define(s: &str) -> Result<(String, String), String> {
    let (name, value) = s.split_once('=').ok_or_else(|| format!("expected NAME=VALUE, got `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in `{s}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// `true`/`false`, integers and floats keep their type; anything else is a string.
fn literal(text: &str) -> Value {
    match text {
        "true"  => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(f) = text.parse::<f64>() {
        return Value::Float(f);
    }
    Value::from(text)
}

fn read_source(args: &Args) -> Result<String> {
    if let Some(src) = &args.eval {
        return Ok(src.clone());
    }
    if let Some(path) = &args.path {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut src = String::new();
    std::io::stdin().read_to_string(&mut src).context("failed to read stdin")?;
    Ok(src)
}

fn main() -> Result<()> {
    let args = Args::parse();

    use tracing_subscriber::{EnvFilter, fmt};

    // SPRIG_LOG, then RUST_LOG, then warn
    let filter = EnvFilter::try_from_env("SPRIG_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let source = read_source(&args)?;

    let env = Environment::new();
    if !args.bare {
        NamespaceRegistry::standard().install(&env);
    }
    for (name, value) in &args.defines {
        debug!(name = %name, value = %value, "define");
        env.define(name, literal(value));
    }
    let mut interp = Interpreter::with_environment(env);

    if args.tokens {
        for tok in interp.tokenize(&source)?.iter() {
            println!("{:>4}:{:<3} {:?}", tok.line, tok.column, tok.kind);
        }
    }
    if args.ast {
        println!("{:#?}", interp.parse(&source)?);
    }

    match interp.run(&source) {
        Ok(value) => {
            if !value.is_invalid() {
                println!("{value}");
            }
            Ok(())
        }
        Err(e) => bail!("{e}"),
    }
}
