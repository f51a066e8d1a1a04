use std::env;
use std::path::Path;

use solscope_parser::{CombinedJsonParser, CompiledArtifact, ParserConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <COMBINED_JSON> <VERSION> <CONTRACT> [PC...]", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let json = std::fs::read_to_string(path)?;
    let mut config = ParserConfig::default();
    if let Some(dir) = path.parent() {
        config = config.with_base_path(dir);
    }
    let parser = CombinedJsonParser::from_json_str(&json, &args[2], config)?;
    let contract = &args[3];

    let pcs: Vec<usize> = if args.len() > 4 {
        args[4..].iter().map(|pc| pc.parse()).collect::<Result<_, _>>()?
    } else {
        parser.all_pcs(contract, false)?.into_iter().collect()
    };

    for pc in pcs {
        match parser.source_by_pc(contract, pc, false)? {
            Some(found) => println!(
                "{:>6}  {}:{}-{}  {}",
                pc,
                found.source_path.as_deref().unwrap_or("?"),
                found.linenums.0,
                found.linenums.1,
                found.fragment.lines().next().unwrap_or("")
            ),
            None => println!("{:>6}  -", pc),
        }
    }
    Ok(())
}
