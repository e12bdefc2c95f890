use std::fmt;

use twox_hash::XxHash64;

const SEED: u64 = 0;

/// 64-bit XXH64 digest of a byte sequence. Only content participates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(XxHash64::oneshot(SEED, bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_xxh64_for_empty_input() {
        assert_eq!(Fingerprint::of(b""), Fingerprint(0xef46_db37_51d8_e999));
    }

    #[test]
    fn same_bytes_same_fingerprint() {
        assert_eq!(Fingerprint::of(b"DLLv1"), Fingerprint::of(b"DLLv1"));
        assert_ne!(Fingerprint::of(b"DLLv0"), Fingerprint::of(b"DLLv1"));
    }

    #[test]
    fn renders_as_fixed_width_hex() {
        assert_eq!(Fingerprint::of(b"").to_string(), "ef46db3751d8e999");
        assert_eq!(Fingerprint(0x2a).to_string(), "000000000000002a");
    }
}
