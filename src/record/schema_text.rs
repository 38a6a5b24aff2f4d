//! Parser for the textual schema stored in a table's header pages.
//!
//! The grammar is exactly the output language of [`Schema::serialize`]:
//!
//! ```text
//! Schema with <2> attributes (id: INT, name: STRING[8]) with keys (id)
//! ```

use chumsky::{prelude::*, regex::regex, text::ascii::ident};

use super::error::{RecordError, RecordResult};
use super::schema::{Attribute, Schema};
use super::value::DataType;

fn data_type<'a>() -> impl Parser<'a, &'a str, DataType, extra::Err<Rich<'a, char>>> {
    let length = regex(r"\d+").map(|s: &str| s.parse::<usize>().unwrap());
    choice((
        just("INT").to(DataType::Int),
        just("FLOAT").to(DataType::Float),
        just("BOOL").to(DataType::Bool),
        just("STRING[")
            .ignore_then(length)
            .then_ignore(just(']'))
            .map(DataType::String),
    ))
}

fn schema_text<'a>()
-> impl Parser<'a, &'a str, (usize, Vec<Attribute>, Vec<String>), extra::Err<Rich<'a, char>>> {
    let count = regex(r"\d+").map(|s: &str| s.parse::<usize>().unwrap());
    let attribute = ident()
        .then_ignore(just(": "))
        .then(data_type())
        .map(|(name, data_type): (&str, DataType)| Attribute::new(name, data_type));
    let key_names = ident()
        .map(|s: &str| s.to_string())
        .separated_by(just(", "))
        .collect::<Vec<_>>();

    just("Schema with <")
        .ignore_then(count)
        .then_ignore(just("> attributes ("))
        .then(attribute.separated_by(just(", ")).collect::<Vec<_>>())
        .then_ignore(just(") with keys ("))
        .then(key_names)
        .then_ignore(just(')'))
        .then_ignore(end())
        .map(|((count, attributes), keys)| (count, attributes, keys))
}

pub(super) fn parse(text: &str) -> RecordResult<Schema> {
    let (count, attributes, key_names) = schema_text()
        .parse(text)
        .into_result()
        .map_err(|errs| {
            RecordError::InvalidSchema(
                errs.iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

    if count != attributes.len() {
        return Err(RecordError::InvalidSchema(format!(
            "header claims {count} attributes, found {}",
            attributes.len()
        )));
    }

    // The key list is stored by name; resolve back to indices
    let key_indices = key_names
        .iter()
        .map(|name| {
            attributes
                .iter()
                .position(|a| a.name == *name)
                .ok_or_else(|| {
                    RecordError::InvalidSchema(format!("key {name} names no attribute"))
                })
        })
        .collect::<RecordResult<Vec<_>>>()?;

    Schema::new(attributes, key_indices)
}
