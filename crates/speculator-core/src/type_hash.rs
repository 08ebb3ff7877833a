//! Deterministic hash-based identity for types and specializations.
//!
//! [`TypeHash`] is a 64-bit hash computed from names and signatures. Two runs
//! (or two processes) hashing the same callable with the same concrete
//! parameter types always agree, which lets directive files and compile caches
//! key on the hash instead of on rendered strings.
//!
//! # Examples
//!
//! ```
//! use speculator_core::TypeHash;
//!
//! let int = TypeHash::from_name("Int");
//! assert_eq!(int, TypeHash::from_name("Int"));
//!
//! let f_int = TypeHash::from_signature("f", &[int]);
//! let f_str = TypeHash::from_signature("f", &[TypeHash::from_name("String")]);
//! assert_ne!(f_int, f_str);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for parameter mixing.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for specialization hashes.
    pub const SIGNATURE: u64 = 0x5ea77ffbcdf5f302;

    /// Parameter position mixing constants.
    /// Each position gets its own constant so parameter order matters.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a type or a specialization.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a specialization hash from a callable name and parameter type hashes.
    ///
    /// Parameter order matters: `(Int, String)` and `(String, Int)` differ.
    #[inline]
    pub fn from_signature(callable: &str, param_hashes: &[TypeHash]) -> Self {
        let mut hash = hash_constants::SIGNATURE ^ xxh64(callable.as_bytes(), 0);
        for (i, param) in param_hashes.iter().enumerate() {
            let marker = hash_constants::PARAM_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
            // wrapping_mul keeps the mix non-commutative
            hash = hash
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(marker ^ param.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
