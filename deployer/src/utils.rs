// deployer/src/utils.rs

use ethers::types::{Address, U256};
use ethers::utils::{format_units as ethers_format_units, parse_units};
use eyre::{eyre, Result};
use serde::Serializer;

// --- Unit Conversion Helpers ---

pub fn format_units(value: U256, decimals: u8) -> Result<String> {
    ethers_format_units(value, decimals as u32).map_err(|e| eyre!("Failed to format units: {}", e))
}

/// Parses a human-readable token amount ("100000", "0.5") into minor units.
///
/// Negative amounts and more fractional digits than `decimals` are refused.
pub fn parse_token_amount(amount: &str, decimals: u8) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(eyre!("empty amount"));
    }
    if trimmed.starts_with('-') {
        return Err(eyre!("negative amount"));
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.len() > decimals as usize {
            return Err(eyre!("more than {} fractional digits", decimals));
        }
    }
    let parsed = parse_units(trimmed, decimals as u32).map_err(|e| eyre!("{}", e))?;
    Ok(parsed.into())
}

// --- Display Helpers ---

/// `0x1234…abcd` form for log lines.
pub fn short_address(address: Address) -> String {
    let full = format!("{:?}", address);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

/// Serializes a `U256` as a plain decimal string instead of ethers' hex form.
pub fn serialize_u256_dec<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}
