use super::error::{RecordError, RecordResult};
use super::schema::Schema;
use super::value::Value;
use crate::file::PageId;

/// Slot index within a data page.
pub type SlotId = usize;

/// Physical address of a record: data page plus slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page: PageId,
    pub slot: SlotId,
}

impl RecordId {
    pub fn new(page: PageId, slot: SlotId) -> Self {
        Self { page, slot }
    }
}

/// The packed byte image of one row.
///
/// Attributes live at fixed offsets derived from the schema and are
/// read and written in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    data: Vec<u8>,
}

impl Record {
    /// A zeroed record sized for `schema`.
    pub fn new(schema: &Schema) -> Self {
        Self {
            data: vec![0u8; schema.record_size()],
        }
    }

    /// Build a record from one value per attribute, in order.
    pub fn from_values(schema: &Schema, values: &[Value]) -> RecordResult<Self> {
        if values.len() != schema.attribute_count() {
            return Err(RecordError::TypeMismatch {
                expected: format!("{} values", schema.attribute_count()),
                actual: format!("{} values", values.len()),
            });
        }
        let mut record = Self::new(schema);
        for (idx, value) in values.iter().enumerate() {
            record.set_attr(schema, idx, value)?;
        }
        Ok(record)
    }

    pub(crate) fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Read attribute `idx`.
    pub fn get_attr(&self, schema: &Schema, idx: usize) -> RecordResult<Value> {
        self.check_size(schema)?;
        let attr = schema.attribute(idx)?;
        let offset = schema.attribute_offset(idx)?;
        Value::read_from(
            &self.data[offset..offset + attr.data_type.size()],
            attr.data_type,
        )
    }

    /// Write attribute `idx`.
    pub fn set_attr(&mut self, schema: &Schema, idx: usize, value: &Value) -> RecordResult<()> {
        self.check_size(schema)?;
        let attr = schema.attribute(idx)?;
        let offset = schema.attribute_offset(idx)?;
        value.write_to(
            &mut self.data[offset..offset + attr.data_type.size()],
            attr.data_type,
        )
    }

    /// Read every attribute in order.
    pub fn values(&self, schema: &Schema) -> RecordResult<Vec<Value>> {
        (0..schema.attribute_count())
            .map(|idx| self.get_attr(schema, idx))
            .collect()
    }

    fn check_size(&self, schema: &Schema) -> RecordResult<()> {
        if self.data.len() != schema.record_size() {
            return Err(RecordError::RecordSizeMismatch {
                expected: schema.record_size(),
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Attribute, DataType};

    fn test_schema() -> Schema {
        Schema::new(
            vec![
                Attribute::new("id", DataType::Int),
                Attribute::new("name", DataType::String(8)),
                Attribute::new("score", DataType::Float),
                Attribute::new("active", DataType::Bool),
            ],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn test_set_get_round_trip() {
        let schema = test_schema();
        let mut record = Record::new(&schema);

        record.set_attr(&schema, 0, &Value::Int(7)).unwrap();
        record
            .set_attr(&schema, 1, &Value::String("ada".to_string()))
            .unwrap();
        record.set_attr(&schema, 2, &Value::Float(99.5)).unwrap();
        record.set_attr(&schema, 3, &Value::Bool(true)).unwrap();

        assert_eq!(record.get_attr(&schema, 0).unwrap(), Value::Int(7));
        assert_eq!(
            record.get_attr(&schema, 1).unwrap(),
            Value::String("ada".to_string())
        );
        assert_eq!(record.get_attr(&schema, 2).unwrap(), Value::Float(99.5));
        assert_eq!(record.get_attr(&schema, 3).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_overwrite_attribute_leaves_others_intact() {
        let schema = test_schema();
        let mut record = Record::from_values(
            &schema,
            &[
                Value::Int(1),
                Value::String("old".to_string()),
                Value::Float(1.0),
                Value::Bool(false),
            ],
        )
        .unwrap();

        record
            .set_attr(&schema, 1, &Value::String("new".to_string()))
            .unwrap();

        assert_eq!(record.get_attr(&schema, 0).unwrap(), Value::Int(1));
        assert_eq!(
            record.get_attr(&schema, 1).unwrap(),
            Value::String("new".to_string())
        );
        assert_eq!(record.get_attr(&schema, 2).unwrap(), Value::Float(1.0));
    }

    #[test]
    fn test_from_values_and_values() {
        let schema = test_schema();
        let values = vec![
            Value::Int(3),
            Value::String("abc".to_string()),
            Value::Float(-0.5),
            Value::Bool(false),
        ];
        let record = Record::from_values(&schema, &values).unwrap();
        assert_eq!(record.values(&schema).unwrap(), values);
        assert_eq!(record.data().len(), schema.record_size());
    }

    #[test]
    fn test_invalid_attribute_index() {
        let schema = test_schema();
        let record = Record::new(&schema);
        assert!(matches!(
            record.get_attr(&schema, 9),
            Err(RecordError::InvalidAttribute(9))
        ));
    }

    #[test]
    fn test_wrong_value_count() {
        let schema = test_schema();
        let result = Record::from_values(&schema, &[Value::Int(1)]);
        assert!(matches!(result, Err(RecordError::TypeMismatch { .. })));
    }
}
