/*!
 * Solscope Utils
 *
 * Utilitários comuns usados em toda a workspace Solscope
 */

use ethereum_types::U256;
use tiny_keccak::{Hasher, Keccak};

/// Remove o prefixo `0x` de uma string hexadecimal
pub fn strip_0x(hex: &str) -> &str {
    hex.strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex)
}

/// Converte uma string hexadecimal para U256
pub fn hex_to_u256(hex: &str) -> Option<U256> {
    let digits = strip_0x(hex).replace('_', "");
    if digits.is_empty() {
        return None;
    }
    U256::from_str_radix(&digits, 16).ok()
}

/// Converte uma string decimal para U256
pub fn decimal_to_u256(decimal: &str) -> Option<U256> {
    let digits = decimal.replace('_', "");
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(&digits).ok()
}

/// Calcula o hash Keccak-256 de dados
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut result = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut result);
    result
}

/// Seletor de 4 bytes de uma assinatura canônica, ex. `transfer(address,uint256)`
pub fn selector_of(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Seletor formatado como 8 caracteres hexadecimais minúsculos
pub fn selector_hex(signature: &str) -> String {
    hex::encode(selector_of(signature))
}

/// Prefixo de 34 caracteres usado nos placeholders de link de bibliotecas
pub fn library_placeholder_hash(qualified_name: &str) -> String {
    let mut encoded = hex::encode(keccak256(qualified_name.as_bytes()));
    encoded.truncate(34);
    encoded
}

/// Simplifica uma versão com hash de commit, ex. `v0.8.13+commit.abaa5c0e` -> `0.8.13`
pub fn simplify_version(raw: &str) -> Option<String> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let tail = &raw[start..];
    let end = tail
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(tail.len());
    let candidate = tail[..end].trim_end_matches('.');
    if candidate.split('.').count() == 3 && semver::Version::parse(candidate).is_ok() {
        Some(candidate.to_string())
    } else {
        None
    }
}
