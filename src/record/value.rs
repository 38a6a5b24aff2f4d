use std::fmt;

use super::error::{RecordError, RecordResult};

/// Attribute data type. Strings are fixed-width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Bool,         // 1 byte
    Int,          // 4 bytes
    Float,        // 4 bytes
    String(usize), // n bytes
}

impl DataType {
    /// On-disk size in bytes.
    pub fn size(&self) -> usize {
        match self {
            DataType::Bool => 1,
            DataType::Int => 4,
            DataType::Float => 4,
            DataType::String(n) => *n,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "BOOL"),
            DataType::Int => write!(f, "INT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::String(n) => write!(f, "STRING[{n}]"),
        }
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
}

impl Value {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "BOOL",
            Value::Int(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "STRING",
        }
    }

    /// Encode into `buf`, which must be exactly `data_type.size()`
    /// bytes. Strings shorter than their fixed width are NUL-padded.
    pub(crate) fn write_to(&self, buf: &mut [u8], data_type: DataType) -> RecordResult<()> {
        debug_assert_eq!(buf.len(), data_type.size());
        match (self, data_type) {
            (Value::Bool(b), DataType::Bool) => buf[0] = *b as u8,
            (Value::Int(i), DataType::Int) => buf.copy_from_slice(&i.to_le_bytes()),
            (Value::Float(x), DataType::Float) => buf.copy_from_slice(&x.to_le_bytes()),
            (Value::String(s), DataType::String(max)) => {
                let bytes = s.as_bytes();
                if bytes.len() > max {
                    return Err(RecordError::StringTooLong {
                        len: bytes.len(),
                        max,
                    });
                }
                buf[..bytes.len()].copy_from_slice(bytes);
                buf[bytes.len()..].fill(0);
            }
            _ => {
                return Err(RecordError::TypeMismatch {
                    expected: data_type.to_string(),
                    actual: self.type_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Decode a value of `data_type` from `buf`. String reads stop at
    /// the first NUL.
    pub(crate) fn read_from(buf: &[u8], data_type: DataType) -> RecordResult<Value> {
        debug_assert_eq!(buf.len(), data_type.size());
        let value = match data_type {
            DataType::Bool => Value::Bool(buf[0] != 0),
            DataType::Int => {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(&buf[..4]);
                Value::Int(i32::from_le_bytes(bytes))
            }
            DataType::Float => {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(&buf[..4]);
                Value::Float(f32::from_le_bytes(bytes))
            }
            DataType::String(n) => {
                let end = buf[..n].iter().position(|&b| b == 0).unwrap_or(n);
                let s = String::from_utf8(buf[..end].to_vec()).map_err(|e| {
                    RecordError::Corrupt(format!("string attribute is not UTF-8: {e}"))
                })?;
                Value::String(s)
            }
        };
        Ok(value)
    }
}
