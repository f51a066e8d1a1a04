//! Legacy assembly model and the program-counter index built from it.
//!
//! The compiler's legacy assembly lists every instruction of a code block but
//! not the widths of push operands; those come from the flat `opcodes` listing
//! (`PUSH1 0x80 PUSH1 0x40 MSTORE ...`). Walking both in step yields the PC of
//! every assembly item.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use solscope_core::{Error, Result};
use tracing::warn;

use crate::opcode::push_width_from_name;

/// Deployment preambles, newest compiler era first.
pub const DEPLOY_START_OPCODES: [[&str; 5]; 2] = [
    // 0.4.23 and above
    ["PUSH1", "0x80", "PUSH1", "0x40", "MSTORE"],
    // older releases
    ["PUSH1", "0x60", "PUSH1", "0x40", "MSTORE"],
];

/// Bytes occupied by `PUSHDEPLOYADDRESS` once assembled (`PUSH20 <address>`).
const DEPLOY_ADDRESS_BYTES: usize = 21;

/// Call guard that opens library runtime code: `PUSH20 <address> ADDRESS EQ`.
const LIBRARY_GUARD_TOKENS: usize = 4;

/// One instruction or pseudo-instruction of the legacy assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsmItem {
    pub name: String,
    #[serde(default)]
    pub begin: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default)]
    pub source: Option<i64>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, rename = "jumpType")]
    pub jump_type: Option<String>,
}

impl AsmItem {
    /// First word of the name: `PUSH [tag]` -> `PUSH`.
    pub fn opcode(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// Byte range `[begin, end)` in its source, when both ends are known.
    pub fn byte_range(&self) -> Option<(usize, usize)> {
        let begin = usize::try_from(self.begin?).ok()?;
        let end = usize::try_from(self.end?).ok()?;
        (end >= begin).then_some((begin, end))
    }
}

/// Entry of `.data`: either a nested assembly or a raw hex blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AsmData {
    Block(Box<AssemblyBlock>),
    Raw(String),
}

/// A code block of the legacy assembly (`.code` plus nested `.data`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyBlock {
    #[serde(rename = ".code", default)]
    pub code: Vec<AsmItem>,
    #[serde(rename = ".data", default)]
    pub data: BTreeMap<String, AsmData>,
    #[serde(rename = ".auxdata", default, skip_serializing_if = "Option::is_none")]
    pub auxdata: Option<String>,
    /// Emitted since 0.8.15 at the top level only.
    #[serde(rename = "sourceList", default, skip_serializing_if = "Option::is_none")]
    pub source_list: Option<Vec<String>>,
}

impl AssemblyBlock {
    /// The runtime sub-assembly stored at `.data["0"]`.
    pub fn runtime(&self) -> Option<&AssemblyBlock> {
        match self.data.get("0") {
            Some(AsmData::Block(block)) => Some(block),
            _ => None,
        }
    }

    /// Deployment code, or runtime code when `deploy` is false.
    pub fn code_for(&self, deploy: bool) -> Option<&[AsmItem]> {
        if deploy {
            Some(&self.code)
        } else {
            self.runtime().map(|r| r.code.as_slice())
        }
    }
}

/// Program counter entry: position in the code list and the assembled mnemonic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcRecord {
    /// Index into the assembly item list.
    pub index: usize,
    /// Ordinal among real instructions, i.e. the matching source-map position.
    pub ordinal: usize,
    pub opcode: String,
}

/// PC table and jump targets of one code block.
#[derive(Debug, Clone, Default)]
pub struct PcIndex {
    code: Vec<AsmItem>,
    records: BTreeMap<usize, PcRecord>,
    jump_targets: BTreeSet<usize>,
}

enum JumpRef {
    Tag(String),
    Pc(usize),
}

impl PcIndex {
    /// Walks `code` and the matching `opcodes` tokens of the same block.
    pub fn build(code: &[AsmItem], opcodes: &[&str]) -> Result<Self> {
        let mut records = BTreeMap::new();
        let mut tags: HashMap<String, usize> = HashMap::new();
        let mut jumps: Vec<JumpRef> = Vec::new();
        let mut jump_targets = BTreeSet::new();

        let mut offset = 0usize;
        let mut op_idx = 0usize;
        let mut ordinal = 0usize;

        for (idx, item) in code.iter().enumerate() {
            let opcode = item.opcode();

            if opcode == "PUSHDEPLOYADDRESS" {
                match opcodes.get(op_idx) {
                    Some(&"PUSH20") => {}
                    other => {
                        return Err(Error::DecodeError(format!(
                            "esperado PUSH20 para PUSHDEPLOYADDRESS na posição {} dos opcodes, encontrado '{}'",
                            op_idx,
                            other.copied().unwrap_or("<fim>")
                        )))
                    }
                }
                offset += DEPLOY_ADDRESS_BYTES;
                op_idx += 2;
                ordinal += 1;
                continue;
            }

            if !is_upper(opcode) {
                if opcode == "tag" {
                    if let Some(tag) = &item.value {
                        tags.insert(tag.clone(), offset);
                    }
                }
                continue;
            }

            let token = *opcodes.get(op_idx).ok_or_else(|| {
                Error::DecodeError(format!(
                    "opcodes terminaram antes do item {} ({}) da assembly",
                    idx, item.name
                ))
            })?;

            let size = if opcode.starts_with("PUSH") {
                let width = push_width_from_name(token).ok_or_else(|| {
                    Error::DecodeError(format!(
                        "esperado PUSHn na posição {} dos opcodes, encontrado '{}'",
                        op_idx, token
                    ))
                })?;
                op_idx += if width > 0 { 2 } else { 1 };
                1 + width
            } else {
                op_idx += 1;
                1
            };

            if opcode == "JUMPI" {
                if let Some(target) = idx.checked_sub(1).and_then(|p| jump_ref(&code[p])) {
                    jumps.push(target);
                }
                jump_targets.insert(offset + 1);
            }

            records.insert(
                offset,
                PcRecord { index: idx, ordinal, opcode: token.to_string() },
            );
            ordinal += 1;
            offset += size;
        }

        for jump in jumps {
            match jump {
                JumpRef::Pc(pc) => {
                    jump_targets.insert(pc);
                }
                JumpRef::Tag(tag) => match tags.get(&tag) {
                    Some(pc) => {
                        jump_targets.insert(*pc);
                    }
                    None => warn!(tag = %tag, "destino de JUMPI referencia tag desconhecida"),
                },
            }
        }

        Ok(Self { code: code.to_vec(), records, jump_targets })
    }

    /// The assembly items this index was built from.
    pub fn code(&self) -> &[AsmItem] {
        &self.code
    }

    pub fn record(&self, pc: usize) -> Option<&PcRecord> {
        self.records.get(&pc)
    }

    /// Assembly index of the instruction at `pc`.
    pub fn index_of(&self, pc: usize) -> Option<usize> {
        self.records.get(&pc).map(|r| r.index)
    }

    pub fn item_at(&self, pc: usize) -> Option<&AsmItem> {
        self.index_of(pc).and_then(|i| self.code.get(i))
    }

    /// `pc -> assembly index`.
    pub fn pc2idx(&self) -> BTreeMap<usize, usize> {
        self.records.iter().map(|(pc, r)| (*pc, r.index)).collect()
    }

    pub fn pcs(&self) -> BTreeSet<usize> {
        self.records.keys().copied().collect()
    }

    /// Records at or below `pc`, highest PC first.
    pub fn records_upto(&self, pc: usize) -> impl Iterator<Item = (usize, &PcRecord)> + '_ {
        self.records.range(..=pc).rev().map(|(pc, r)| (*pc, r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// JUMPI destinations and fallthrough PCs.
    pub fn jump_targets(&self) -> &BTreeSet<usize> {
        &self.jump_targets
    }

    pub fn pc2opcode(&self) -> BTreeMap<usize, String> {
        self.records.iter().map(|(pc, r)| (*pc, r.opcode.clone())).collect()
    }

    pub fn opcode2pcs(&self) -> BTreeMap<String, BTreeSet<usize>> {
        let mut out: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        for (pc, r) in &self.records {
            out.entry(r.opcode.clone()).or_default().insert(*pc);
        }
        out
    }
}

/// Skips the deployment code of a full `opcodes` listing, returning the
/// tokens from the runtime preamble onwards. A library's call guard right
/// before the preamble belongs to the runtime and is kept.
pub fn skip_deploy_preamble<'a>(opcodes: &'a [&'a str]) -> Result<&'a [&'a str]> {
    for preamble in DEPLOY_START_OPCODES.iter() {
        let found = opcodes
            .windows(preamble.len())
            .enumerate()
            .skip(1)
            .find(|(_, w)| w == preamble)
            .map(|(pos, _)| pos);
        if let Some(pos) = found {
            let start = if has_library_guard(&opcodes[..pos]) {
                pos - LIBRARY_GUARD_TOKENS
            } else {
                pos
            };
            return Ok(&opcodes[start..]);
        }
    }
    Err(Error::BytecodePreambleNotFound(opcodes.len()))
}

/// Splits the whitespace separated `opcodes` output.
pub fn split_opcodes(opcodes: &str) -> Vec<&str> {
    opcodes.split_whitespace().collect()
}

fn has_library_guard(before: &[&str]) -> bool {
    matches!(before, [.., "PUSH20", _, "ADDRESS", "EQ"])
}

fn jump_ref(prev: &AsmItem) -> Option<JumpRef> {
    if !prev.opcode().starts_with("PUSH") {
        return None;
    }
    let value = prev.value.as_deref()?;
    if prev.name == "PUSH [tag]" {
        return Some(JumpRef::Tag(value.to_string()));
    }
    usize::from_str_radix(value.trim_start_matches("0x"), 16)
        .ok()
        .map(JumpRef::Pc)
}

fn is_upper(s: &str) -> bool {
    s.chars().any(char::is_alphabetic) && !s.chars().any(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_detection() {
        assert!(is_upper("PUSH"));
        assert!(is_upper("LOG1"));
        assert!(!is_upper("tag"));
        assert!(!is_upper(""));
    }

    #[test]
    fn library_guard_detection() {
        assert!(has_library_guard(&["INVALID", "PUSH20", "0x00", "ADDRESS", "EQ"]));
        assert!(!has_library_guard(&["PUSH20", "0x00", "ADDRESS"]));
        assert!(!has_library_guard(&["CALLER", "ADDRESS", "EQ"]));
    }

    #[test]
    fn preamble_at_zero_is_deployment() {
        let tokens = ["PUSH1", "0x80", "PUSH1", "0x40", "MSTORE", "STOP"];
        assert!(matches!(
            skip_deploy_preamble(&tokens),
            Err(Error::BytecodePreambleNotFound(6))
        ));
    }
}
