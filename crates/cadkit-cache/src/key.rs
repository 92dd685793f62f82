//! Cache keys
//!
//! A key is the BLAKE3 digest of a canonical byte stream describing one
//! builder call: the builder's identity (name, explicit version tag, source
//! fingerprint, default arguments) followed by the positional and keyword
//! arguments.
//!
//! The stream is versioned and self-delimiting: every value starts with a
//! tag byte, every variable-length value with a little-endian `u64` length,
//! map entries are emitted in key order and `-0.0` hashes like `0.0`.
//! Changing any of these rules requires bumping [`KEY_FORMAT_VERSION`].

use crate::error::Result;
use blake3::Hasher;
use cadkit_core::Shape;
use std::collections::BTreeMap;
use std::fmt;

/// Version of the canonical argument encoding
pub const KEY_FORMAT_VERSION: u8 = 1;

/// Domain prefix so keys never collide with other BLAKE3 uses
const KEY_DOMAIN: &[u8] = b"cadkit:artifact:";

// Value tags. Part of the key format.
const TAG_UNIT: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STR: u8 = 4;
const TAG_LIST: u8 = 5;
const TAG_MAP: u8 = 6;
const TAG_SHAPE: u8 = 7;

/// A builder argument in canonical form
#[derive(Debug, Clone, PartialEq)]
pub enum CacheArg {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<CacheArg>),
    Map(BTreeMap<String, CacheArg>),
    /// Hashed by the digest of its native serialization
    Shape(Shape),
}

impl CacheArg {
    /// Name of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CacheArg::Unit => "unit",
            CacheArg::Bool(_) => "bool",
            CacheArg::Int(_) => "int",
            CacheArg::Float(_) => "float",
            CacheArg::Str(_) => "string",
            CacheArg::List(_) => "list",
            CacheArg::Map(_) => "map",
            CacheArg::Shape(_) => "shape",
        }
    }

    fn encode(&self, h: &mut Hasher) -> Result<()> {
        match self {
            CacheArg::Unit => {
                h.update(&[TAG_UNIT]);
            }
            CacheArg::Bool(b) => {
                h.update(&[TAG_BOOL, u8::from(*b)]);
            }
            CacheArg::Int(i) => {
                h.update(&[TAG_INT]);
                h.update(&i.to_le_bytes());
            }
            CacheArg::Float(f) => {
                h.update(&[TAG_FLOAT]);
                h.update(&canonical_float_bits(*f).to_le_bytes());
            }
            CacheArg::Str(s) => {
                h.update(&[TAG_STR]);
                encode_bytes(h, s.as_bytes());
            }
            CacheArg::List(items) => {
                h.update(&[TAG_LIST]);
                encode_list(h, items)?;
            }
            CacheArg::Map(map) => {
                h.update(&[TAG_MAP]);
                encode_map(h, map)?;
            }
            CacheArg::Shape(shape) => {
                h.update(&[TAG_SHAPE]);
                h.update(&digest_bytes(&shape.to_bytes()?));
            }
        }
        Ok(())
    }
}

/// `-0.0` and `0.0` share bits; every NaN shares bits
fn canonical_float_bits(f: f64) -> u64 {
    if f == 0.0 {
        0.0f64.to_bits()
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

fn encode_bytes(h: &mut Hasher, bytes: &[u8]) {
    h.update(&(bytes.len() as u64).to_le_bytes());
    h.update(bytes);
}

fn encode_list(h: &mut Hasher, items: &[CacheArg]) -> Result<()> {
    h.update(&(items.len() as u64).to_le_bytes());
    for item in items {
        item.encode(h)?;
    }
    Ok(())
}

fn encode_map(h: &mut Hasher, map: &BTreeMap<String, CacheArg>) -> Result<()> {
    h.update(&(map.len() as u64).to_le_bytes());
    for (k, v) in map {
        encode_bytes(h, k.as_bytes());
        v.encode(h)?;
    }
    Ok(())
}

/// Raw BLAKE3 digest of `bytes`
pub fn digest_bytes(bytes: &[u8]) -> [u8; 32] {
    blake3::hash(bytes).into()
}

/// Lowercase hex BLAKE3 digest of `bytes`
pub fn digest_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

impl From<()> for CacheArg {
    fn from((): ()) -> Self {
        CacheArg::Unit
    }
}

impl From<bool> for CacheArg {
    fn from(b: bool) -> Self {
        CacheArg::Bool(b)
    }
}

impl From<i64> for CacheArg {
    fn from(i: i64) -> Self {
        CacheArg::Int(i)
    }
}

impl From<i32> for CacheArg {
    fn from(i: i32) -> Self {
        CacheArg::Int(i64::from(i))
    }
}

impl From<f64> for CacheArg {
    fn from(f: f64) -> Self {
        CacheArg::Float(f)
    }
}

impl From<&str> for CacheArg {
    fn from(s: &str) -> Self {
        CacheArg::Str(s.to_string())
    }
}

impl From<String> for CacheArg {
    fn from(s: String) -> Self {
        CacheArg::Str(s)
    }
}

impl From<Shape> for CacheArg {
    fn from(shape: Shape) -> Self {
        CacheArg::Shape(shape)
    }
}

impl<T: Into<CacheArg>> From<Vec<T>> for CacheArg {
    fn from(items: Vec<T>) -> Self {
        CacheArg::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, CacheArg>> for CacheArg {
    fn from(map: BTreeMap<String, CacheArg>) -> Self {
        CacheArg::Map(map)
    }
}

/// Identity of a builder function.
///
/// Rust code cannot be fingerprinted at runtime, so `version` is the
/// builder author's promise: bump it whenever the builder's output changes.
/// Script builders also carry a digest of their source as `fingerprint`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuilderId {
    pub name: String,
    pub version: u32,
    pub fingerprint: String,
    pub defaults: BTreeMap<String, CacheArg>,
}

impl BuilderId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<CacheArg>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }
}

/// One invocation of a builder
#[derive(Debug, Clone, PartialEq)]
pub struct CacheCall {
    pub builder: BuilderId,
    pub args: Vec<CacheArg>,
    pub kwargs: BTreeMap<String, CacheArg>,
}

impl CacheCall {
    pub fn new(builder: BuilderId) -> Self {
        Self {
            builder,
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<CacheArg>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<CacheArg>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    /// Derive the cache key for this call
    pub fn key(&self) -> Result<CacheKey> {
        let mut h = Hasher::new();
        h.update(KEY_DOMAIN);
        h.update(&[KEY_FORMAT_VERSION]);

        let b = &self.builder;
        encode_bytes(&mut h, b.name.as_bytes());
        h.update(&b.version.to_le_bytes());
        encode_bytes(&mut h, b.fingerprint.as_bytes());
        encode_map(&mut h, &b.defaults)?;

        encode_list(&mut h, &self.args)?;
        encode_map(&mut h, &self.kwargs)?;

        Ok(CacheKey(h.finalize().to_hex().to_string()))
    }
}

/// Hex BLAKE3 digest naming one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accept a 64-character lowercase hex digest
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == 64 && s.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| CacheKey(s.to_string()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
