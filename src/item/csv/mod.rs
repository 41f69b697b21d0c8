//! CSV support for reading and writing typed entries.
//!
//! This module provides components for reading entries from and writing
//! entries to delimited text, driven by a [`Dialect`](crate::core::dialect::Dialect)
//! and by caller-supplied entry parsers and converters.
//!
//! # Module Architecture
//!
//! The CSV module consists of three components:
//!
//! 1. **LineSource / LineSink**: the line layer. The source yields logical
//!    record lines, skipping the header, comments and blank lines and
//!    reassembling quoted fields that span several physical lines. The sink
//!    joins fields back into terminated lines.
//!
//! 2. **CsvEntryReader**: splits each record line into fields and hands them
//!    to an [`EntryParser`](crate::core::item::EntryParser).
//!
//! 3. **CsvEntryWriter**: turns entries into fields with an
//!    [`EntryConverter`](crate::core::item::EntryConverter) and appends them
//!    through a sink.
//!
//! Both the reader and the writer follow the builder pattern for easy
//! configuration.
//!
//! # Ownership and Borrowing Considerations
//!
//! - Writers buffer their output; call `flush`, `close` or `into_inner` to
//!   make sure everything reached the destination
//! - A writer borrowing its destination (`&mut Vec<u8>`) holds that borrow
//!   until dropped, so scope it before reading the buffer
//!
//! # Examples
//!
//! ## Reading with an entry mapping
//!
//! ```
//! use csv_codec_rs::core::dialect::DialectBuilder;
//! use csv_codec_rs::core::item::ItemReader;
//! use csv_codec_rs::core::mapping::EntryMapping;
//! use csv_codec_rs::core::processor::ValueProcessorRegistry;
//! use csv_codec_rs::item::csv::csv_reader::CsvEntryReaderBuilder;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct City {
//!     city: String,
//!     country: String,
//!     pop: u32,
//! }
//!
//! let registry = ValueProcessorRegistry::with_defaults();
//! let mapping = EntryMapping::<City>::builder(&registry)
//!     .required("city", |c| &c.city, |c, v| c.city = v)
//!     .required("country", |c| &c.country, |c, v| c.country = v)
//!     .required("pop", |c| &c.pop, |c, v| c.pop = v)
//!     .build()
//!     .unwrap();
//!
//! let data = "\
//! city|country|pop
//! Boston|United States|4628910
//! Concord|United States|42695
//! ";
//!
//! let dialect = DialectBuilder::new().delimiter('|').build().unwrap();
//! let reader = CsvEntryReaderBuilder::new()
//!     .dialect(dialect)
//!     .from_reader(data.as_bytes(), mapping);
//!
//! let cities = reader.read_all().unwrap();
//!
//! assert_eq!(cities.len(), 2);
//! assert_eq!(cities[0].city, "Boston");
//! assert_eq!(cities[0].pop, 4628910);
//! assert_eq!(cities[1].city, "Concord");
//! ```
//!
//! ## Writing with an entry mapping
//!
//! ```
//! use csv_codec_rs::core::dialect::Dialect;
//! use csv_codec_rs::core::item::ItemWriter;
//! use csv_codec_rs::core::mapping::EntryMapping;
//! use csv_codec_rs::core::processor::ValueProcessorRegistry;
//! use csv_codec_rs::item::csv::csv_writer::CsvEntryWriterBuilder;
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     age: u8,
//!     occupation: Option<String>,
//! }
//!
//! let registry = ValueProcessorRegistry::with_defaults();
//! let mapping = EntryMapping::<Person>::builder(&registry)
//!     .required("name", |p| &p.name, |p, v| p.name = v)
//!     .required("age", |p| &p.age, |p, v| p.age = v)
//!     .optional("occupation", |p| &p.occupation, |p, v| p.occupation = v)
//!     .build()
//!     .unwrap();
//!
//! let people = vec![
//!     Person { name: "Alice".to_string(), age: 28, occupation: Some("Engineer".to_string()) },
//!     Person { name: "Bob".to_string(), age: 35, occupation: None },
//! ];
//!
//! let mut buffer = Vec::new();
//! {
//!     let writer = CsvEntryWriterBuilder::new()
//!         .dialect(Dialect::regional())
//!         .has_headers(true)
//!         .from_writer(&mut buffer, mapping);
//!
//!     writer.write_all(&people).unwrap();
//!     writer.close().unwrap();
//! }
//!
//! assert_eq!(
//!     String::from_utf8(buffer).unwrap(),
//!     "name,age,occupation\nAlice,28,Engineer\nBob,35,\n"
//! );
//! ```

/// A module providing facilities for reading CSV entries.
pub mod csv_reader;

/// A module providing facilities for writing CSV entries.
pub mod csv_writer;

/// Logical record lines in, joined record lines out.
pub mod lines;
