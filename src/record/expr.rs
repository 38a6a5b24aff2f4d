use std::cmp::Ordering;

use super::error::{RecordError, RecordResult};
use super::record::Record;
use super::schema::Schema;
use super::value::Value;

/// Comparison operator for scan predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// Predicate evaluated against each record during a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Matches every record.
    All,
    /// Compares one attribute against a constant.
    Cmp {
        attr: usize,
        op: CompareOp,
        value: Value,
    },
}

impl Expr {
    pub fn cmp(attr: usize, op: CompareOp, value: Value) -> Self {
        Expr::Cmp { attr, op, value }
    }

    pub fn eval(&self, record: &Record, schema: &Schema) -> RecordResult<bool> {
        match self {
            Expr::All => Ok(true),
            Expr::Cmp { attr, op, value } => {
                let lhs = record.get_attr(schema, *attr)?;
                Ok(op.matches(compare(&lhs, value)?))
            }
        }
    }
}

fn compare(lhs: &Value, rhs: &Value) -> RecordResult<Ordering> {
    let ordering = match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => {
            return Err(RecordError::TypeMismatch {
                expected: lhs.type_name().to_string(),
                actual: rhs.type_name().to_string(),
            });
        }
    };
    Ok(ordering)
}
