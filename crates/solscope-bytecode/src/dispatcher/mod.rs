//! Best-effort recovery of 4-byte function selectors from raw runtime bytecode.
//!
//! Solidity dispatchers compare the calldata selector against each function's
//! selector with a `PUSH4 <selector> ... EQ ... JUMPI` sequence. The scan below
//! looks for that shape inside a small byte window, without any AST or
//! assembly metadata. Selectors reached through other patterns (binary-search
//! dispatchers, proxies) may be missed and unrelated `PUSH4` constants may be
//! picked up; callers must treat the result as a hint.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use solscope_core::utils::strip_0x;

use crate::opcode::{opcode_name, push_width, EQ, JUMPI, PUSH4};

/// Bitmask pushed by pre-0.5 dispatchers before the selector comparison.
pub const MASK_SELECTOR: &str = "ffffffff";

/// Default window, in bytes, measured from the start of the `PUSH4` operand.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Configuração da varredura de seletores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorScanConfig {
    /// Bytes permitidos entre o `PUSH4` e o `JUMPI`
    pub window_size: usize,
}

impl Default for SelectorScanConfig {
    fn default() -> Self {
        Self { window_size: DEFAULT_WINDOW_SIZE }
    }
}

struct Window {
    start: usize,
    confidence: u32,
    candidate: String,
}

/// Recovers candidate selectors (8 lowercase hex chars) from a bytecode hex string.
///
/// Never fails: invalid hex pairs and unassigned opcodes are skipped.
pub fn recover_selectors(bytecode_hex: &str, window_size: usize) -> BTreeSet<String> {
    let hex = strip_0x(bytecode_hex.trim()).as_bytes();
    let mut results = BTreeSet::new();
    let mut window: Option<Window> = None;
    let mut i = 0;

    while i + 2 <= hex.len() {
        let opcode = decode_pair(&hex[i..i + 2]).filter(|b| opcode_name(*b).is_some());
        i += 2;

        let Some(opcode) = opcode else {
            continue;
        };

        let width = push_width(opcode);
        if width > 0 {
            let operand_start = i;
            let operand_end = (i + 2 * width).min(hex.len());
            if opcode == PUSH4 && operand_end - operand_start == 8 {
                let operand = &hex[operand_start..operand_end];
                if operand.iter().all(u8::is_ascii_hexdigit) {
                    window = Some(Window {
                        start: operand_start,
                        confidence: 1,
                        candidate: String::from_utf8_lossy(operand).to_ascii_lowercase(),
                    });
                }
            }
            i = operand_end;
        } else if opcode == EQ {
            if let Some(w) = window.as_mut() {
                w.confidence += 1;
            }
        } else if opcode == JUMPI {
            if let Some(w) = window.take() {
                if w.confidence > 1 {
                    results.insert(w.candidate);
                }
            }
        }

        if window.as_ref().is_some_and(|w| i - w.start > 2 * window_size) {
            window = None;
        }
    }

    results.remove(MASK_SELECTOR);
    results
}

/// Same as [`recover_selectors`] using a [`SelectorScanConfig`].
pub fn recover_selectors_with(bytecode_hex: &str, config: &SelectorScanConfig) -> BTreeSet<String> {
    recover_selectors(bytecode_hex, config.window_size)
}

fn decode_pair(pair: &[u8]) -> Option<u8> {
    let s = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(s, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_decoding() {
        assert_eq!(decode_pair(b"63"), Some(0x63));
        assert_eq!(decode_pair(b"zz"), None);
    }

    #[test]
    fn window_expires_before_jumpi() {
        // PUSH4 sel, EQ, then eight JUMPDESTs push the JUMPI out of a 10-byte window
        let code = format!("63aabbccdd14{}57", "5b".repeat(8));
        assert!(recover_selectors(&code, DEFAULT_WINDOW_SIZE).is_empty());
        assert!(recover_selectors(&code, 20).contains("aabbccdd"));
    }
}
