//! Content hashing for description structs and string keys.
//!
//! Every description type in this crate has a stable content hash derived
//! from its semantically significant fields only — object names never
//! participate. Field order matters: hashes are combined left to right and
//! the resulting values are used as compatibility pre-filters, so changing
//! the combination order is a breaking change.

use log::warn;
use std::borrow::Cow;
use std::hash::{Hash, Hasher};

//--------------------------------------------------------------------------------------------------
// Bit mixers

/// Robert Jenkins' 32-bit integer mix.
///
/// Small integers (enum discriminants, counts, bind points) are mixed before
/// combination; identity hashing of such values produces catastrophic
/// clustering in open-addressing tables.
pub fn jenkins_mix32(mut key: u32) -> u32 {
    key = key.wrapping_add(key << 12);
    key ^= key >> 22;
    key = key.wrapping_add(key << 4);
    key ^= key >> 9;
    key = key.wrapping_add(key << 10);
    key ^= key >> 2;
    key = key.wrapping_add(key << 7);
    key = key.wrapping_add(key << 12);
    key
}

/// Thomas Wang's 64-bit integer mix.
pub fn wang_mix64(mut key: u64) -> u64 {
    key = (!key).wrapping_add(key << 21);
    key ^= key >> 24;
    key = key.wrapping_add(key << 3).wrapping_add(key << 8); // key * 265
    key ^= key >> 14;
    key = key.wrapping_add(key << 2).wrapping_add(key << 4); // key * 21
    key ^= key >> 28;
    key = key.wrapping_add(key << 31);
    key
}

/// Folds `value` into `seed`, boost style.
pub fn hash_combine(seed: &mut u64, value: u64) {
    let s = *seed;
    *seed = s
        ^ value
            .wrapping_add(0x9e37_79b9)
            .wrapping_add(s << 6)
            .wrapping_add(s >> 2);
}

/// Hashes a raw byte buffer.
///
/// Bytes are accumulated into 32-bit chunks that are mixed and combined, so
/// the result depends only on the byte content, never on the source buffer's
/// alignment or chunking.
pub fn compute_hash_raw(data: &[u8]) -> u64 {
    let mut seed = 0u64;
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for &b in data {
        buffer |= u32::from(b) << bits;
        bits += 8;
        if bits == 32 {
            hash_combine(&mut seed, u64::from(jenkins_mix32(buffer)));
            buffer = 0;
            bits = 0;
        }
    }
    if bits > 0 {
        hash_combine(&mut seed, u64::from(jenkins_mix32(buffer)));
    }
    seed
}

/// Rolling string hash (x65599).
pub fn str_hash(s: &str) -> u64 {
    let mut h = 0u64;
    for b in s.bytes() {
        h = h.wrapping_mul(65599).wrapping_add(u64::from(b));
    }
    h
}

//--------------------------------------------------------------------------------------------------

/// Seed-carrying combiner used by the per-description hash functions.
///
/// All methods chain, e.g.
/// `DescHasher::new().u32(a).u32(b).finish()`.
#[derive(Clone, Debug, Default)]
pub struct DescHasher {
    seed: u64,
}

impl DescHasher {
    pub fn new() -> DescHasher {
        DescHasher { seed: 0 }
    }

    pub fn u32(mut self, v: u32) -> Self {
        hash_combine(&mut self.seed, u64::from(jenkins_mix32(v)));
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        hash_combine(&mut self.seed, wang_mix64(v));
        self
    }

    pub fn bool(self, v: bool) -> Self {
        self.u32(v as u32)
    }

    pub fn f32_bits(self, v: f32) -> Self {
        self.u32(v.to_bits())
    }

    /// Combines an already-computed sub-hash.
    pub fn combine(mut self, h: u64) -> Self {
        hash_combine(&mut self.seed, h);
        self
    }

    pub fn finish(self) -> u64 {
        self.seed
    }
}

//--------------------------------------------------------------------------------------------------

/// A string key for hash maps, either borrowing its source or owning a copy.
///
/// The hash is computed once at construction. Equality compares hashes first
/// and falls back to a byte comparison only when they collide; a genuine
/// collision between two different strings is logged, since it usually means
/// a weak custom hash.
#[derive(Clone, Debug)]
pub struct StringKey<'a> {
    string: Cow<'a, str>,
    hash: u64,
}

impl<'a> StringKey<'a> {
    /// A key borrowing `s`; must not outlive it.
    pub fn borrowed(s: &'a str) -> StringKey<'a> {
        StringKey {
            hash: str_hash(s),
            string: Cow::Borrowed(s),
        }
    }

    /// A key owning a copy of the string.
    pub fn owned(s: impl Into<String>) -> StringKey<'static> {
        let s = s.into();
        StringKey {
            hash: str_hash(&s),
            string: Cow::Owned(s),
        }
    }

    /// Converts a borrowed key into an owning one.
    pub fn into_owned(self) -> StringKey<'static> {
        StringKey {
            hash: self.hash,
            string: Cow::Owned(self.string.into_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.string
    }

    pub fn hash_value(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for StringKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash {
            return false;
        }
        if self.string == other.string {
            return true;
        }
        warn!(
            "string hash collision: '{}' and '{}' hash to {:#x}",
            self.string, other.string, self.hash
        );
        false
    }
}

impl Eq for StringKey<'_> {}

impl Hash for StringKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixers_avalanche() {
        // neighboring inputs must not produce neighboring outputs
        assert_ne!(jenkins_mix32(1).wrapping_sub(jenkins_mix32(0)), 1);
        assert_ne!(wang_mix64(1).wrapping_sub(wang_mix64(0)), 1);
        assert_ne!(jenkins_mix32(42), 42);
        assert_ne!(wang_mix64(42), 42);
    }

    #[test]
    fn combine_order_matters() {
        let ab = DescHasher::new().u32(1).u32(2).finish();
        let ba = DescHasher::new().u32(2).u32(1).finish();
        assert_ne!(ab, ba);
    }

    #[test]
    fn raw_hash_is_content_only() {
        let data: Vec<u8> = (0u8..37).collect();
        let h0 = compute_hash_raw(&data);
        // same content at a different alignment within a larger buffer
        let mut shifted = vec![0xffu8; 3];
        shifted.extend_from_slice(&data);
        let h1 = compute_hash_raw(&shifted[3..]);
        assert_eq!(h0, h1);
        assert_ne!(compute_hash_raw(&data[..36]), h0);
    }

    #[test]
    fn string_key_modes() {
        let s = String::from("g_Texture");
        let borrowed = StringKey::borrowed(&s);
        let owned = StringKey::owned("g_Texture");
        assert_eq!(borrowed, owned);
        assert_eq!(borrowed.hash_value(), owned.hash_value());
        assert_ne!(StringKey::borrowed("g_Tex"), StringKey::borrowed("g_Tux"));
    }
}
