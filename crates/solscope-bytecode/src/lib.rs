//! Solscope Bytecode
//!
//! Índice de program counters a partir da legacy assembly, decodificação de
//! source maps, disassembly e recuperação heurística de seletores.

pub mod opcode;
pub mod parser;
pub mod dispatcher;
pub mod srcmap;
pub mod asm;

pub use asm::{
    skip_deploy_preamble, split_opcodes, AsmData, AsmItem, AssemblyBlock, PcIndex, PcRecord,
    DEPLOY_START_OPCODES,
};
pub use dispatcher::{recover_selectors, recover_selectors_with, SelectorScanConfig};
pub use parser::{disassemble, format_instructions, parse_instructions, Instruction};
pub use srcmap::parse_src_mapping;
