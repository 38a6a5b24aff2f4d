mod error;
mod expr;
mod record;
mod schema;
mod schema_text;
mod table;
mod value;

pub use error::{RecordError, RecordResult};
pub use expr::{CompareOp, Expr};
pub use record::{Record, RecordId, SlotId};
pub use schema::{Attribute, Schema};
pub use table::{SLOT_SIZE, Table, TableScan};
pub use value::{DataType, Value};
