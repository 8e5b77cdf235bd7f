//! Hierarchical typed key-value blocks.
//!
//! A [`DataBlock`] holds an ordered list of typed params and an ordered list
//! of named child blocks. It is the structured persistence format used next to
//! JSON: parameters, curves and gradients write themselves into blocks, and a
//! whole block tree encodes to a compact binary buffer (see [`binary`]).
//!
//! Keys are [`HashedKey`]s. Lookups compare the 32-bit FNV-1 hash first and
//! only fall back to the string on a hash hit.
//!
//! Getters are permissive: a missing param, or a param stored with a
//! different type, reads as the zero value of the requested type.
//!
//! # Example
//!
//! ```
//! use particle_params::data_block::DataBlock;
//! use glam::Vec4;
//!
//! let mut block = DataBlock::new();
//! block.set_s32("mode", 2);
//! block.data_block_mut("color").set_vec4f("value", Vec4::ONE);
//!
//! assert_eq!(block.get_s32("mode"), 2);
//! assert_eq!(block.get_f32("missing"), 0.0);
//! assert!(block.get_data_block("color").is_some());
//! ```

pub mod binary;

use glam::{Vec2, Vec3, Vec4};
use std::borrow::Cow;
use std::fmt;

/// 32-bit FNV-1 hash of a string.
pub const fn fnv1(text: &str) -> u32 {
    let bytes = text.as_bytes();
    let mut hash: u32 = 0x811c_9dc5;
    let mut i = 0;
    while i < bytes.len() {
        hash = hash.wrapping_mul(0x0100_0193);
        hash ^= bytes[i] as u32;
        i += 1;
    }
    hash
}

/// A string key with its precomputed hash.
#[derive(Clone, Debug, Eq)]
pub struct HashedKey {
    hash: u32,
    name: Cow<'static, str>,
}

impl HashedKey {
    /// Key for a string literal, usable in constants.
    pub const fn from_static(name: &'static str) -> Self {
        Self {
            hash: fnv1(name),
            name: Cow::Borrowed(name),
        }
    }

    /// Key for a runtime string.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hash: fnv1(&name),
            name: Cow::Owned(name),
        }
    }

    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn matches(&self, hash: u32, name: &str) -> bool {
        self.hash == hash && self.name == name
    }
}

impl PartialEq for HashedKey {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.hash, &other.name)
    }
}

impl std::hash::Hash for HashedKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

impl fmt::Display for HashedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for HashedKey {
    fn from(name: &str) -> Self {
        HashedKey::new(name)
    }
}

/// Type tag of a param, matching the binary encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ParamType {
    S32 = 1,
    U32 = 3,
    F32 = 5,
    Bool = 7,
    Vec2F = 14,
    Vec3F = 15,
    Vec4F = 16,
    String = 22,
}

impl ParamType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(ParamType::S32),
            3 => Some(ParamType::U32),
            5 => Some(ParamType::F32),
            7 => Some(ParamType::Bool),
            14 => Some(ParamType::Vec2F),
            15 => Some(ParamType::Vec3F),
            16 => Some(ParamType::Vec4F),
            22 => Some(ParamType::String),
            _ => None,
        }
    }
}

/// A typed param value.
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    S32(i32),
    U32(u32),
    F32(f32),
    Bool(bool),
    Vec2F(Vec2),
    Vec3F(Vec3),
    Vec4F(Vec4),
    String(String),
}

impl Param {
    pub fn param_type(&self) -> ParamType {
        match self {
            Param::S32(_) => ParamType::S32,
            Param::U32(_) => ParamType::U32,
            Param::F32(_) => ParamType::F32,
            Param::Bool(_) => ParamType::Bool,
            Param::Vec2F(_) => ParamType::Vec2F,
            Param::Vec3F(_) => ParamType::Vec3F,
            Param::Vec4F(_) => ParamType::Vec4F,
            Param::String(_) => ParamType::String,
        }
    }
}

/// Hierarchical block of typed params and named child blocks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataBlock {
    params: Vec<(HashedKey, Param)>,
    blocks: Vec<(HashedKey, DataBlock)>,
}

macro_rules! typed_accessors {
    ($get:ident, $get_or:ident, $set:ident, $variant:ident, $ty:ty, $zero:expr) => {
        #[doc = concat!(
            "Read a `", stringify!($variant), "` param, zero when missing or of another type."
        )]
        #[inline]
        pub fn $get(&self, key: &str) -> $ty {
            self.$get_or(key, $zero)
        }

        #[doc = concat!(
            "Read a `", stringify!($variant), "` param, `default` when missing or of another type."
        )]
        pub fn $get_or(&self, key: &str, default: $ty) -> $ty {
            match self.get_param(key) {
                Some(Param::$variant(value)) => *value,
                _ => default,
            }
        }

        #[doc = concat!(
            "Write a `", stringify!($variant), "` param, replacing any param with this key."
        )]
        #[inline]
        pub fn $set(&mut self, key: &str, value: $ty) {
            self.set_param(key, Param::$variant(value));
        }
    };
}

impl DataBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the block has neither params nor child blocks.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.params.clear();
        self.blocks.clear();
    }

    #[inline]
    pub fn params_count(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn data_blocks_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterate params in insertion order.
    pub fn params(&self) -> impl Iterator<Item = (&HashedKey, &Param)> {
        self.params.iter().map(|(key, param)| (key, param))
    }

    /// Iterate child blocks in insertion order.
    pub fn data_blocks(&self) -> impl Iterator<Item = (&HashedKey, &DataBlock)> {
        self.blocks.iter().map(|(key, block)| (key, block))
    }

    // ------------------------------------------------------------------
    // Params
    // ------------------------------------------------------------------

    pub fn get_param(&self, key: &str) -> Option<&Param> {
        let hash = fnv1(key);
        self.params
            .iter()
            .find(|(k, _)| k.matches(hash, key))
            .map(|(_, param)| param)
    }

    pub fn is_param_exists(&self, key: &str) -> bool {
        self.get_param(key).is_some()
    }

    /// Set a param, replacing the value (and type) of an existing one.
    pub fn set_param(&mut self, key: &str, param: Param) {
        let hash = fnv1(key);
        match self.params.iter_mut().find(|(k, _)| k.matches(hash, key)) {
            Some((_, existing)) => *existing = param,
            None => self.params.push((HashedKey::new(key), param)),
        }
    }

    /// Append a param without checking for an existing key.
    pub(crate) fn push_param(&mut self, key: HashedKey, param: Param) {
        self.params.push((key, param));
    }

    pub fn remove_param(&mut self, key: &str) -> Option<Param> {
        let hash = fnv1(key);
        let index = self.params.iter().position(|(k, _)| k.matches(hash, key))?;
        Some(self.params.remove(index).1)
    }

    typed_accessors!(get_s32, get_s32_or, set_s32, S32, i32, 0);
    typed_accessors!(get_u32, get_u32_or, set_u32, U32, u32, 0);
    typed_accessors!(get_f32, get_f32_or, set_f32, F32, f32, 0.0);
    typed_accessors!(get_bool, get_bool_or, set_bool, Bool, bool, false);
    typed_accessors!(get_vec2f, get_vec2f_or, set_vec2f, Vec2F, Vec2, Vec2::ZERO);
    typed_accessors!(get_vec3f, get_vec3f_or, set_vec3f, Vec3F, Vec3, Vec3::ZERO);
    typed_accessors!(get_vec4f, get_vec4f_or, set_vec4f, Vec4F, Vec4, Vec4::ZERO);

    /// Read a string param, empty when missing or of another type.
    pub fn get_string(&self, key: &str) -> &str {
        match self.get_param(key) {
            Some(Param::String(value)) => value,
            _ => "",
        }
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.set_param(key, Param::String(value.into()));
    }

    // ------------------------------------------------------------------
    // Child blocks
    // ------------------------------------------------------------------

    /// First child block with this key.
    pub fn get_data_block(&self, key: &str) -> Option<&DataBlock> {
        let hash = fnv1(key);
        self.blocks
            .iter()
            .find(|(k, _)| k.matches(hash, key))
            .map(|(_, block)| block)
    }

    pub fn get_data_block_mut(&mut self, key: &str) -> Option<&mut DataBlock> {
        let hash = fnv1(key);
        self.blocks
            .iter_mut()
            .find(|(k, _)| k.matches(hash, key))
            .map(|(_, block)| block)
    }

    /// First child block with this key, created empty when missing.
    pub fn data_block_mut(&mut self, key: &str) -> &mut DataBlock {
        let hash = fnv1(key);
        let index = match self.blocks.iter().position(|(k, _)| k.matches(hash, key)) {
            Some(index) => index,
            None => {
                self.blocks.push((HashedKey::new(key), DataBlock::new()));
                self.blocks.len() - 1
            }
        };
        &mut self.blocks[index].1
    }

    /// Append a new child block, even if one with this key already exists.
    ///
    /// Repeated keys are how lists are stored: see [`DataBlock::data_blocks_named`].
    pub fn add_data_block(&mut self, key: &str) -> &mut DataBlock {
        self.push_data_block(HashedKey::new(key), DataBlock::new());
        let last = self.blocks.len() - 1;
        &mut self.blocks[last].1
    }

    pub(crate) fn push_data_block(&mut self, key: HashedKey, block: DataBlock) {
        self.blocks.push((key, block));
    }

    /// All child blocks with this key, in insertion order.
    pub fn data_blocks_named<'a>(
        &'a self,
        key: &'a str,
    ) -> impl Iterator<Item = &'a DataBlock> + 'a {
        let hash = fnv1(key);
        self.blocks
            .iter()
            .filter(move |(k, _)| k.matches(hash, key))
            .map(|(_, block)| block)
    }

    /// Child block by position.
    pub fn data_block_at(&self, index: usize) -> Option<&DataBlock> {
        self.blocks.get(index).map(|(_, block)| block)
    }

    /// Remove the first child block with this key.
    pub fn remove_data_block(&mut self, key: &str) -> Option<DataBlock> {
        let hash = fnv1(key);
        let index = self.blocks.iter().position(|(k, _)| k.matches(hash, key))?;
        Some(self.blocks.remove(index).1)
    }
}
