use std::env;

use solscope_bytecode::{disassemble, format_instructions, recover_selectors, SelectorScanConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <BYTECODE_HEX>", args[0]);
        std::process::exit(1);
    }
    let bytecode = &args[1];

    let instructions = disassemble(bytecode)?;
    print!("{}", format_instructions(&instructions));

    let selectors = recover_selectors(bytecode, SelectorScanConfig::default().window_size);
    if !selectors.is_empty() {
        println!("\nSelectors:");
        for sel in selectors {
            println!("  0x{}", sel);
        }
    }
    Ok(())
}
