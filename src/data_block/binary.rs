//! Binary encoding of [`DataBlock`] trees.
//!
//! Layout (all numbers in native byte order, written as raw POD bytes):
//!
//! ```text
//! u32 magic = fnv1("MZDATA")
//! u32 flags
//! u32 string count
//!     [u16 length][utf-8 bytes][u16 id]      per string
//! block:
//!     u16 param count
//!         [u16 name id][u8 type][payload]    per param
//!     u16 child count
//!         [u16 name id][block]               per child
//! ```
//!
//! Names are interned into the string table once and referenced by id.
//! Trees deeper than [`MAX_DEPTH`] levels below the root are rejected in
//! both directions.

use super::{fnv1, DataBlock, HashedKey, Param, ParamType};
use crate::error::DataBlockError;
use bytemuck::Pod;
use glam::{Vec2, Vec3, Vec4};
use std::collections::HashMap;

/// Header magic of binary data blocks.
pub const MAGIC: u32 = fnv1("MZDATA");

/// Deepest child level below the root the codec accepts.
pub const MAX_DEPTH: usize = 256;

/// Encode a block tree.
pub fn save_binary(block: &DataBlock) -> Result<Vec<u8>, DataBlockError> {
    let mut strings = StringTable::default();
    strings.collect(block)?;

    let mut writer = Writer::default();
    writer.pod(&MAGIC);
    writer.pod(&0u32);
    writer.pod(&(strings.names.len() as u32));
    for (id, name) in strings.names.iter().enumerate() {
        let len =
            u16::try_from(name.len()).map_err(|_| DataBlockError::TooLarge("string bytes"))?;
        writer.pod(&len);
        writer.bytes(name.as_bytes());
        writer.pod(&(id as u16));
    }
    write_block(&mut writer, &strings, block, 0)?;

    Ok(writer.buf)
}

/// Decode a block tree.
pub fn load_binary(data: &[u8]) -> Result<DataBlock, DataBlockError> {
    let mut reader = Reader { data, offset: 0 };

    let magic: u32 = reader.pod("header magic")?;
    if magic != MAGIC {
        return Err(DataBlockError::InvalidMagic(magic));
    }
    let _flags: u32 = reader.pod("header flags")?;

    let string_count: u32 = reader.pod("string count")?;
    let mut strings: HashMap<u16, HashedKey> = HashMap::new();
    for _ in 0..string_count {
        let len: u16 = reader.pod("string length")?;
        let bytes = reader.bytes(len as usize, "string")?;
        let name = std::str::from_utf8(bytes).map_err(|_| DataBlockError::InvalidUtf8)?;
        let id: u16 = reader.pod("string id")?;
        strings.insert(id, HashedKey::new(name));
    }

    let mut block = DataBlock::new();
    read_block(&mut reader, &strings, &mut block, 0)?;
    log::debug!(
        "Loaded data block: {} params, {} blocks, {} bytes",
        block.params_count(),
        block.data_blocks_count(),
        data.len()
    );
    Ok(block)
}

impl DataBlock {
    /// Encode this block tree to bytes. See [`save_binary`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, DataBlockError> {
        save_binary(self)
    }

    /// Decode a block tree from bytes. See [`load_binary`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, DataBlockError> {
        load_binary(data)
    }
}

#[derive(Default)]
struct StringTable {
    names: Vec<String>,
    ids: HashMap<String, u16>,
}

impl StringTable {
    fn intern(&mut self, name: &str) -> Result<(), DataBlockError> {
        if self.ids.contains_key(name) {
            return Ok(());
        }
        let id =
            u16::try_from(self.names.len()).map_err(|_| DataBlockError::TooLarge("strings"))?;
        self.ids.insert(name.to_owned(), id);
        self.names.push(name.to_owned());
        Ok(())
    }

    fn collect(&mut self, block: &DataBlock) -> Result<(), DataBlockError> {
        for (key, _) in block.params() {
            self.intern(key.name())?;
        }
        for (key, child) in block.data_blocks() {
            self.intern(key.name())?;
            self.collect(child)?;
        }
        Ok(())
    }

    fn id(&self, key: &HashedKey) -> u16 {
        // Every name was interned by `collect` before writing starts
        self.ids.get(key.name()).copied().unwrap_or_default()
    }
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    #[inline]
    fn pod<T: Pod>(&mut self, value: &T) {
        self.buf.extend_from_slice(bytemuck::bytes_of(value));
    }

    #[inline]
    fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], DataBlockError> {
        let eof = DataBlockError::UnexpectedEof(what);
        let end = self.offset.checked_add(len).ok_or_else(|| eof.clone())?;
        let slice = self.data.get(self.offset..end).ok_or(eof)?;
        self.offset = end;
        Ok(slice)
    }

    fn pod<T: Pod>(&mut self, what: &'static str) -> Result<T, DataBlockError> {
        let bytes = self.bytes(std::mem::size_of::<T>(), what)?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }
}

fn write_block(
    writer: &mut Writer,
    strings: &StringTable,
    block: &DataBlock,
    depth: usize,
) -> Result<(), DataBlockError> {
    if depth > MAX_DEPTH {
        return Err(DataBlockError::TooDeep(MAX_DEPTH));
    }
    let param_count =
        u16::try_from(block.params_count()).map_err(|_| DataBlockError::TooLarge("params"))?;
    writer.pod(&param_count);
    for (key, param) in block.params() {
        writer.pod(&strings.id(key));
        writer.pod(&(param.param_type() as u8));
        match param {
            Param::S32(v) => writer.pod(v),
            Param::U32(v) => writer.pod(v),
            Param::F32(v) => writer.pod(v),
            Param::Bool(v) => writer.pod(&u8::from(*v)),
            Param::Vec2F(v) => writer.pod(v),
            Param::Vec3F(v) => writer.pod(v),
            Param::Vec4F(v) => writer.pod(v),
            Param::String(v) => {
                let len = u32::try_from(v.len())
                    .map_err(|_| DataBlockError::TooLarge("string bytes"))?;
                writer.pod(&len);
                writer.bytes(v.as_bytes());
            }
        }
    }

    let block_count = u16::try_from(block.data_blocks_count())
        .map_err(|_| DataBlockError::TooLarge("blocks"))?;
    writer.pod(&block_count);
    for (key, child) in block.data_blocks() {
        writer.pod(&strings.id(key));
        write_block(writer, strings, child, depth + 1)?;
    }
    Ok(())
}

fn read_block(
    reader: &mut Reader<'_>,
    strings: &HashMap<u16, HashedKey>,
    block: &mut DataBlock,
    depth: usize,
) -> Result<(), DataBlockError> {
    if depth > MAX_DEPTH {
        return Err(DataBlockError::TooDeep(MAX_DEPTH));
    }
    let lookup = |id: u16| strings.get(&id).cloned().ok_or(DataBlockError::UnknownStringId(id));

    let param_count: u16 = reader.pod("param count")?;
    for _ in 0..param_count {
        let key = lookup(reader.pod("param name")?)?;
        let tag: u8 = reader.pod("param type")?;
        let ty = ParamType::from_tag(tag).ok_or(DataBlockError::UnknownParamType(tag))?;
        let param = match ty {
            ParamType::S32 => Param::S32(reader.pod("s32 param")?),
            ParamType::U32 => Param::U32(reader.pod("u32 param")?),
            ParamType::F32 => Param::F32(reader.pod("f32 param")?),
            ParamType::Bool => Param::Bool(reader.pod::<u8>("bool param")? != 0),
            ParamType::Vec2F => Param::Vec2F(reader.pod::<Vec2>("vec2 param")?),
            ParamType::Vec3F => Param::Vec3F(reader.pod::<Vec3>("vec3 param")?),
            ParamType::Vec4F => Param::Vec4F(reader.pod::<Vec4>("vec4 param")?),
            ParamType::String => {
                let len: u32 = reader.pod("string param length")?;
                let bytes = reader.bytes(len as usize, "string param")?;
                let text = std::str::from_utf8(bytes).map_err(|_| DataBlockError::InvalidUtf8)?;
                Param::String(text.to_owned())
            }
        };
        block.push_param(key, param);
    }

    let block_count: u16 = reader.pod("block count")?;
    for _ in 0..block_count {
        let key = lookup(reader.pod("block name")?)?;
        let mut child = DataBlock::new();
        read_block(reader, strings, &mut child, depth + 1)?;
        block.push_data_block(key, child);
    }
    Ok(())
}
