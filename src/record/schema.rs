use super::error::{RecordError, RecordResult};
use super::value::DataType;

/// Named, typed attribute of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Table schema: ordered attribute list plus the indices of the key
/// attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    attributes: Vec<Attribute>,
    key_indices: Vec<usize>,
    record_size: usize,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>, key_indices: Vec<usize>) -> RecordResult<Self> {
        if attributes.is_empty() {
            return Err(RecordError::InvalidSchema(
                "schema has no attributes".to_string(),
            ));
        }
        for key in &key_indices {
            if *key >= attributes.len() {
                return Err(RecordError::InvalidSchema(format!(
                    "key index {key} out of range"
                )));
            }
        }

        let record_size = attributes.iter().map(|a| a.data_type.size()).sum();
        Ok(Self {
            attributes,
            key_indices,
            record_size,
        })
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute(&self, idx: usize) -> RecordResult<&Attribute> {
        self.attributes
            .get(idx)
            .ok_or(RecordError::InvalidAttribute(idx))
    }

    /// Find an attribute index by name.
    pub fn find_attribute(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn key_indices(&self) -> &[usize] {
        &self.key_indices
    }

    /// Total record size in bytes: attribute values packed in order
    /// with no separators or length prefixes.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Byte offset of attribute `idx` within a record.
    pub fn attribute_offset(&self, idx: usize) -> RecordResult<usize> {
        if idx >= self.attributes.len() {
            return Err(RecordError::InvalidAttribute(idx));
        }
        Ok(self.attributes[..idx]
            .iter()
            .map(|a| a.data_type.size())
            .sum())
    }

    /// Render the schema in its on-disk text form, e.g.
    /// `Schema with <2> attributes (a: INT, b: STRING[4]) with keys (a)`.
    pub fn serialize(&self) -> String {
        let attrs = self
            .attributes
            .iter()
            .map(|a| format!("{}: {}", a.name, a.data_type))
            .collect::<Vec<_>>()
            .join(", ");
        let keys = self
            .key_indices
            .iter()
            .map(|&k| self.attributes[k].name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Schema with <{}> attributes ({}) with keys ({})",
            self.attributes.len(),
            attrs,
            keys
        )
    }

    /// Parse the text form written by [`Schema::serialize`].
    pub fn parse(text: &str) -> RecordResult<Self> {
        super::schema_text::parse(text)
    }
}
