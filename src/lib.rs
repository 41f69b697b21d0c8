#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 <div align="center">
   <h1>csv-codec-rs</h1>
   <h3>A format-pluggable CSV codec for typed records</h3>

   ![license](https://shields.io/badge/license-MIT%2FApache--2.0-blue)

  </div>

 # csv-codec-rs

 **csv-codec-rs** parses delimited text into typed records and serializes typed records back into
 delimited text. The text format is described by a [`Dialect`](core::dialect::Dialect); the record
 shape is described by the caller, either with plain closures or with an
 [`EntryMapping`](core::mapping::EntryMapping) whose columns are converted by value processors
 looked up in a [`ValueProcessorRegistry`](core::processor::ValueProcessorRegistry).

 ## Core Concepts

- **Dialect:** delimiter, quote character, comment marker, header and blank-line policy.
- **Tokenizer:** splits one logical line into fields and joins fields back, honoring quotes.
- **ValueProcessor:** converts a single raw string to a typed value and back.
- **ValueProcessorRegistry:** holds at most one processor per type and resolves the closest one
  across the type hierarchy (exact type, superclasses, capabilities, `Option<T>` as the nullable
  form of `T`).
- **EntryParser / EntryConverter:** map a whole record from raw fields and back.
- **ItemReader / ItemWriter:** the CSV reader and writer streaming records end to end.

 ## Features

| **Feature**   | **Description**                                                  |
|---------------|------------------------------------------------------------------|
| chrono        | Registers `NaiveDate`, `NaiveTime` and `NaiveDateTime` processors |
| logger        | Enables a logger `ItemWriter`, useful for debugging purposes     |
| full          | Enables all available features                                   |

 ## Getting Started

```toml
[dependencies]
csv-codec-rs = { version = "<version>", features = ["<full|chrono|logger>"] }
```

Then, on your main.rs:

```rust
# use csv_codec_rs::{
#     core::{
#         dialect::{Dialect, DialectBuilder},
#         item::{ItemReader, ItemWriter},
#         mapping::EntryMapping,
#         processor::ValueProcessorRegistry,
#     },
#     error::CodecError,
#     item::csv::{csv_reader::CsvEntryReaderBuilder, csv_writer::CsvEntryWriterBuilder},
# };
#[derive(Debug, Default, Clone, PartialEq)]
struct Person {
    first: String,
    last: String,
    age: i32,
}

fn main() -> Result<(), CodecError> {
    let input = "John,Doe,30

#comment
Jane,\"Smith, Jr\",25
";

    let registry = ValueProcessorRegistry::with_defaults();
    let mapping = || {
        EntryMapping::<Person>::builder(&registry)
            .required("first", |p| &p.first, |p, v| p.first = v)
            .required("last", |p| &p.last, |p, v| p.last = v)
            .required("age", |p| &p.age, |p, v| p.age = v)
            .build()
    };

    let dialect = DialectBuilder::from_dialect(Dialect::regional())
        .skip_header(false)
        .build()?;

    let reader = CsvEntryReaderBuilder::new()
        .dialect(dialect)
        .from_reader(input.as_bytes(), mapping()?);
    let people = reader.read_all()?;

    assert_eq!(people.len(), 2);
    assert_eq!(people[1].last, "Smith, Jr");

    let writer = CsvEntryWriterBuilder::new()
        .dialect(dialect)
        .from_writer(Vec::new(), mapping()?);
    writer.write_all(&people)?;

    let output = String::from_utf8(writer.into_inner()?).unwrap();
    assert_eq!(output, "John,Doe,30\nJane,\"Smith, Jr\",25\n");

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     (<http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     (<http://opensource.org/licenses/MIT>)

 at your option.

 */

/// Core module: dialect, tokenizer, contracts, value processors and mappings
pub mod core;

/// Error types for codec operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of entry readers / writers (csv reader and writer, logger writer)
pub mod item;
