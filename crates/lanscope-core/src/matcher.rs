// ── Address matching ──
//
// `parse_address` and `matches` are lenient: out-of-range octets are
// folded in with wrapping arithmetic rather than rejected, and every
// malformed input fails closed. `Cidr` is the strict counterpart used
// to validate ranges before they are saved.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

/// Parse a dotted address into a 32-bit integer.
///
/// Requires exactly four `.`-separated unsigned integers. Octets above 255
/// are not rejected; they overflow into the neighbouring bits.
pub fn parse_address(text: &str) -> Option<u32> {
    let mut value: u32 = 0;
    let mut parts = 0;
    for part in text.split('.') {
        parts += 1;
        if parts > 4 {
            return None;
        }
        let octet: u32 = part.parse().ok()?;
        value = value.wrapping_shl(8).wrapping_add(octet);
    }
    (parts == 4).then_some(value)
}

/// Mask with `prefix` leading one-bits. `prefix` must be in `0..=32`.
pub fn prefix_mask(prefix: u32) -> u32 {
    u32::MAX.checked_shl(32 - prefix).unwrap_or(0)
}

/// Does `address` fall inside `range_expr` (`base/prefix`)?
///
/// Fails closed on a missing base, an unparseable or out-of-range prefix,
/// or an invalid address on either side. Prefix 0 matches every valid
/// address.
pub fn matches(address: &str, range_expr: &str) -> bool {
    let mut parts = range_expr.split('/');
    let base = parts.next().unwrap_or_default();
    let Some(prefix) = parts.next().and_then(|p| p.parse::<u32>().ok()) else {
        return false;
    };
    if base.is_empty() || prefix > 32 {
        return false;
    }
    let (Some(addr), Some(base)) = (parse_address(address), parse_address(base)) else {
        return false;
    };
    let mask = prefix_mask(prefix);
    addr & mask == base & mask
}

// ── Strict CIDR ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("expected base-address/prefix-length, got '{0}'")]
    MissingPrefix(String),

    #[error("invalid base address '{0}'")]
    InvalidAddress(String),

    #[error("invalid prefix length '{0}' (expected 0-32)")]
    InvalidPrefix(String),
}

/// A validated IPv4 CIDR block: four octets in `0..=255`, prefix in `0..=32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    base: Ipv4Addr,
    prefix: u8,
}

impl Cidr {
    pub fn new(base: Ipv4Addr, prefix: u8) -> Result<Self, CidrError> {
        if prefix > 32 {
            return Err(CidrError::InvalidPrefix(prefix.to_string()));
        }
        Ok(Self { base, prefix })
    }

    pub fn parse(expr: &str) -> Result<Self, CidrError> {
        let expr = expr.trim();
        let (base, prefix) = expr
            .split_once('/')
            .ok_or_else(|| CidrError::MissingPrefix(expr.to_owned()))?;
        let base: Ipv4Addr = base
            .parse()
            .map_err(|_| CidrError::InvalidAddress(base.to_owned()))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| CidrError::InvalidPrefix(prefix.to_owned()))?;
        Self::new(base, prefix)
    }

    pub fn base(&self) -> Ipv4Addr {
        self.base
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    fn mask(&self) -> u32 {
        prefix_mask(u32::from(self.prefix))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = self.mask();
        u32::from(addr) & mask == u32::from(self.base) & mask
    }

    /// Number of addresses covered by the block.
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix)
    }
}
