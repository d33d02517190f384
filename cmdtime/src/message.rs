//! Companion message dictionary
//!
//! Messages between watch and phone are dictionaries of integer keyed
//! tuples:
//!
//! ```text
//! u8   tuple count
//! per tuple:
//!   u32 key     (LE)
//!   u8  type    0 = bytes, 1 = C string, 2 = unsigned, 3 = signed
//!   u16 length  (LE)
//!   value
//! ```

/// Size of the tuple header (key, type, length)
const TUPLE_HEADER_LEN: usize = 7;

const TYPE_BYTES: u8 = 0;
const TYPE_CSTRING: u8 = 1;
const TYPE_UINT: u8 = 2;
const TYPE_INT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No tuple count byte
    Empty,
    /// A tuple header or value runs past the end of the message
    Truncated,
    /// Unsupported value type tag
    UnknownType(u8),
    /// Integers must be 1, 2 or 4 bytes wide
    IntegerWidth(u16),
    /// C string is not valid UTF-8
    InvalidUtf8,
    /// Bytes left over after the announced number of tuples
    TrailingBytes,
    /// Output buffer cannot hold another tuple
    BufferFull,
    /// More than 255 tuples
    TooManyTuples,
}

/// Value of a single tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleValue<'a> {
    Bytes(&'a [u8]),
    CStr(&'a str),
    UInt(u32),
    Int(i32),
}

impl TupleValue<'_> {
    /// Integer value, accepting both signed and unsigned tuples
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            TupleValue::UInt(v) => Some(v as i64),
            TupleValue::Int(v) => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            TupleValue::CStr(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuple<'a> {
    pub key: u32,
    pub value: TupleValue<'a>,
}

/// Borrowed view of a received dictionary
#[derive(Debug, Clone, Copy)]
pub struct Dictionary<'a> {
    count: u8,
    body: &'a [u8],
}

impl<'a> Dictionary<'a> {
    /// Check the header and wrap the message.
    ///
    /// Tuples are decoded lazily by [`Dictionary::iter`]; use
    /// [`Dictionary::validate`] to check the whole message up front.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, Error> {
        let (&count, body) = bytes.split_first().ok_or(Error::Empty)?;
        Ok(Self { count, body })
    }

    /// Number of tuples announced in the header
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Tuples in wire order
    pub fn iter(&self) -> Iter<'a> {
        Iter {
            remaining: self.count,
            rest: self.body,
        }
    }

    /// First tuple with `key`
    pub fn find(&self, key: u32) -> Result<Option<Tuple<'a>>, Error> {
        for tuple in self.iter() {
            let tuple = tuple?;
            if tuple.key == key {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    /// Decode every tuple and make sure nothing follows the last one.
    pub fn validate(&self) -> Result<(), Error> {
        let mut iter = self.iter();
        for tuple in iter.by_ref() {
            tuple?;
        }
        if iter.rest.is_empty() {
            Ok(())
        } else {
            Err(Error::TrailingBytes)
        }
    }
}

/// Iterator over the tuples of a [`Dictionary`]
///
/// Stops after the first error.
pub struct Iter<'a> {
    remaining: u8,
    rest: &'a [u8],
}

impl<'a> Iter<'a> {
    fn read_tuple(&mut self) -> Result<Tuple<'a>, Error> {
        if self.rest.len() < TUPLE_HEADER_LEN {
            return Err(Error::Truncated);
        }
        let (header, rest) = self.rest.split_at(TUPLE_HEADER_LEN);
        let key = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let kind = header[4];
        let len = u16::from_le_bytes([header[5], header[6]]);
        if rest.len() < len as usize {
            return Err(Error::Truncated);
        }
        let (raw, rest) = rest.split_at(len as usize);

        let value = match kind {
            TYPE_BYTES => TupleValue::Bytes(raw),
            TYPE_CSTRING => {
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                let text = core::str::from_utf8(&raw[..end]).map_err(|_| Error::InvalidUtf8)?;
                TupleValue::CStr(text)
            }
            TYPE_UINT => TupleValue::UInt(match *raw {
                [a] => a as u32,
                [a, b] => u16::from_le_bytes([a, b]) as u32,
                [a, b, c, d] => u32::from_le_bytes([a, b, c, d]),
                _ => return Err(Error::IntegerWidth(len)),
            }),
            TYPE_INT => TupleValue::Int(match *raw {
                [a] => a as i8 as i32,
                [a, b] => i16::from_le_bytes([a, b]) as i32,
                [a, b, c, d] => i32::from_le_bytes([a, b, c, d]),
                _ => return Err(Error::IntegerWidth(len)),
            }),
            other => return Err(Error::UnknownType(other)),
        };

        self.rest = rest;
        Ok(Tuple { key, value })
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<Tuple<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tuple = self.read_tuple();
        self.remaining = if tuple.is_ok() { self.remaining - 1 } else { 0 };
        Some(tuple)
    }
}

/// Serialise a dictionary into a caller provided buffer
pub struct DictionaryWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    count: u8,
}

impl<'a> DictionaryWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Result<Self, Error> {
        if buf.is_empty() {
            return Err(Error::BufferFull);
        }
        Ok(Self { buf, len: 1, count: 0 })
    }

    pub fn push_uint(&mut self, key: u32, value: u32) -> Result<&mut Self, Error> {
        self.push(key, TYPE_UINT, &value.to_le_bytes())
    }

    pub fn push_int(&mut self, key: u32, value: i32) -> Result<&mut Self, Error> {
        self.push(key, TYPE_INT, &value.to_le_bytes())
    }

    /// Push a string; the terminating NUL is added on the wire.
    pub fn push_cstr(&mut self, key: u32, value: &str) -> Result<&mut Self, Error> {
        let len = value.len() + 1;
        self.header(key, TYPE_CSTRING, len)?;
        self.buf[self.len..self.len + value.len()].copy_from_slice(value.as_bytes());
        self.buf[self.len + value.len()] = 0;
        self.commit(len);
        Ok(self)
    }

    pub fn push_bytes(&mut self, key: u32, value: &[u8]) -> Result<&mut Self, Error> {
        self.push(key, TYPE_BYTES, value)
    }

    /// Write the tuple count and return the encoded message.
    pub fn finish(self) -> &'a [u8] {
        let Self { buf, len, count } = self;
        buf[0] = count;
        let buf: &'a [u8] = buf;
        &buf[..len]
    }

    fn push(&mut self, key: u32, kind: u8, value: &[u8]) -> Result<&mut Self, Error> {
        self.header(key, kind, value.len())?;
        self.buf[self.len..self.len + value.len()].copy_from_slice(value);
        self.commit(value.len());
        Ok(self)
    }

    /// Write a tuple header at the current end once the value is known to fit.
    fn header(&mut self, key: u32, kind: u8, value_len: usize) -> Result<(), Error> {
        if self.count == u8::MAX {
            return Err(Error::TooManyTuples);
        }
        let value_len_u16 = u16::try_from(value_len).map_err(|_| Error::BufferFull)?;
        if self.buf.len() - self.len < TUPLE_HEADER_LEN + value_len {
            return Err(Error::BufferFull);
        }
        let header = &mut self.buf[self.len..self.len + TUPLE_HEADER_LEN];
        header[..4].copy_from_slice(&key.to_le_bytes());
        header[4] = kind;
        header[5..].copy_from_slice(&value_len_u16.to_le_bytes());
        self.len += TUPLE_HEADER_LEN;
        Ok(())
    }

    fn commit(&mut self, value_len: usize) {
        self.len += value_len;
        self.count += 1;
    }
}
