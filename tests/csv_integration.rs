pub mod common;

use std::{
    error::Error,
    fs::{self, read_to_string},
    io::Cursor,
};

use chrono::NaiveDate;
use csv_codec_rs::{
    core::{
        dialect::{Dialect, DialectBuilder},
        item::{EntryFile, ItemReader, ItemWriter, ParsingContext},
        mapping::EntryMapping,
        processor::{Supertype, ValueProcessorRegistry, ValueType},
    },
    error::CodecError,
    item::csv::{
        csv_reader::CsvEntryReaderBuilder,
        csv_writer::CsvEntryWriterBuilder,
        lines::Terminator,
    },
};
use tempfile::tempdir;

#[derive(Debug, Default, Clone, PartialEq)]
struct Person {
    first: String,
    last: String,
    age: i32,
}

fn person_mapping(registry: &ValueProcessorRegistry) -> EntryMapping<Person> {
    EntryMapping::<Person>::builder(registry)
        .required("first", |p| &p.first, |p, v| p.first = v)
        .required("last", |p| &p.last, |p, v| p.last = v)
        .required("age", |p| &p.age, |p, v| p.age = v)
        .build()
        .expect("person mapping should build")
}

fn person(first: &str, last: &str, age: i32) -> Person {
    Person {
        first: first.to_string(),
        last: last.to_string(),
        age,
    }
}

#[test]
fn blank_and_comment_lines_should_never_reach_the_parser() -> Result<(), Box<dyn Error>> {
    let dialect = Dialect::new(',', '"', '#', false, true)?;
    let input = "John,Doe,30\n\n#comment\nJane,\"Smith, Jr\",25\n";

    let reader = CsvEntryReaderBuilder::new().dialect(dialect).from_reader(
        input.as_bytes(),
        |context: &ParsingContext<'_>| -> Result<Person, CodecError> {
            assert!(!context.field(0)?.starts_with('#'));
            assert!(!context.is_empty());
            Ok(person(
                context.field(0)?,
                context.field(1)?,
                context.field(2)?
                    .parse()
                    .map_err(|_| CodecError::Format("age".to_string()))?,
            ))
        },
    );

    assert_eq!(
        reader.read_all()?,
        vec![person("John", "Doe", 30), person("Jane", "Smith, Jr", 25)]
    );
    Ok(())
}

#[test]
fn writing_what_was_read_should_be_stable() -> Result<(), Box<dyn Error>> {
    let registry = ValueProcessorRegistry::with_defaults();
    let dialect = Dialect::regional();
    let input = "first,last,age
\"Jane\",\"Smith, Jr\",25
John,\"Say \"\"hi\"\"\",30
\"Multi
Line\",Doe,41
";

    let reader = CsvEntryReaderBuilder::new()
        .dialect(dialect)
        .from_reader(input.as_bytes(), person_mapping(&registry));
    let people = reader.read_all()?;
    assert_eq!(people[1].last, "Say \"hi\"");
    assert_eq!(people[2].first, "Multi\nLine");

    let writer = CsvEntryWriterBuilder::new()
        .dialect(dialect)
        .has_headers(true)
        .from_writer(Vec::new(), person_mapping(&registry));
    writer.write_all(&people)?;
    let first_pass = String::from_utf8(writer.into_inner()?)?;

    let reader = CsvEntryReaderBuilder::new()
        .dialect(dialect)
        .from_reader(first_pass.as_bytes(), person_mapping(&registry));
    let reread = reader.read_all()?;
    assert_eq!(reread, people);

    let writer = CsvEntryWriterBuilder::new()
        .dialect(dialect)
        .has_headers(true)
        .from_writer(Vec::new(), person_mapping(&registry));
    writer.write_all(&reread)?;
    let second_pass = String::from_utf8(writer.into_inner()?)?;

    assert_eq!(first_pass, second_pass);
    assert_eq!(
        first_pass,
        "first,last,age
Jane,\"Smith, Jr\",25
John,\"Say \"\"hi\"\"\",30
\"Multi
Line\",Doe,41
"
    );
    Ok(())
}

#[test]
fn entries_should_round_trip_through_a_file() -> Result<(), Box<dyn Error>> {
    let registry = ValueProcessorRegistry::with_defaults();
    let path = common::scratch_path("csv");

    let writer = CsvEntryWriterBuilder::new()
        .has_headers(true)
        .terminator(Terminator::CRLF)
        .from_path(&path, person_mapping(&registry))?;
    writer.write(&person("Ada", "Lovelace", 36))?;
    writer.write(&person("Alan", "Turing; OBE", 41))?;
    writer.close()?;

    let file_content = read_to_string(&path)?;
    assert_eq!(
        file_content,
        "first;last;age\r\nAda;Lovelace;36\r\nAlan;\"Turing; OBE\";41\r\n"
    );

    let reader = CsvEntryReaderBuilder::new().from_path(&path, person_mapping(&registry))?;
    assert_eq!(
        reader.read_all()?,
        vec![person("Ada", "Lovelace", 36), person("Alan", "Turing; OBE", 41)]
    );
    reader.close()?;

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn columns_should_bind_by_header_name() -> Result<(), Box<dyn Error>> {
    let registry = ValueProcessorRegistry::with_defaults();
    let mapping = EntryMapping::<Person>::builder(&registry)
        .required("first", |p| &p.first, |p, v| p.first = v)
        .required("last", |p| &p.last, |p, v| p.last = v)
        .required("age", |p| &p.age, |p, v| p.age = v)
        .match_by_header(true)
        .build()?;

    let input = "age;last;first\n30;Doe;John\n";
    let reader = CsvEntryReaderBuilder::new().from_reader(input.as_bytes(), mapping);

    assert_eq!(reader.read()?, Some(person("John", "Doe", 30)));
    assert_eq!(
        reader.headers(),
        Some(&["age".to_string(), "last".to_string(), "first".to_string()][..])
    );
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Stop {
    id: String,
    name: String,
    wheelchair: Option<bool>,
}

impl EntryFile for Stop {
    const FILE_NAME: &'static str = "stops.csv";
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Transfer {
    from: String,
    to: String,
    min_seconds: Option<u32>,
}

impl EntryFile for Transfer {
    const FILE_NAME: &'static str = "transfers.csv";
    const OPTIONAL: bool = true;
}

fn stop_mapping(registry: &ValueProcessorRegistry) -> EntryMapping<Stop> {
    EntryMapping::<Stop>::builder(registry)
        .required("id", |s| &s.id, |s, v| s.id = v)
        .required("name", |s| &s.name, |s, v| s.name = v)
        .optional("wheelchair", |s| &s.wheelchair, |s, v| s.wheelchair = v)
        .build()
        .expect("stop mapping should build")
}

fn transfer_mapping(registry: &ValueProcessorRegistry) -> EntryMapping<Transfer> {
    EntryMapping::<Transfer>::builder(registry)
        .required("from", |t| &t.from, |t, v| t.from = v)
        .required("to", |t| &t.to, |t, v| t.to = v)
        .optional("min_seconds", |t| &t.min_seconds, |t, v| t.min_seconds = v)
        .build()
        .expect("transfer mapping should build")
}

#[test]
fn optional_entry_file_may_be_absent() -> Result<(), Box<dyn Error>> {
    let registry = ValueProcessorRegistry::with_defaults();
    let dir = tempdir()?;
    fs::write(
        dir.path().join("stops.csv"),
        "id,name,wheelchair\nS1,Central,1\nS2,North,\n",
    )?;

    let builder = || CsvEntryReaderBuilder::new().dialect(Dialect::regional());

    let stops = builder()
        .from_entry_dir(dir.path(), stop_mapping(&registry))?
        .expect("stops.csv exists");
    assert_eq!(
        stops.read_all()?,
        vec![
            Stop {
                id: "S1".to_string(),
                name: "Central".to_string(),
                wheelchair: Some(true),
            },
            Stop {
                id: "S2".to_string(),
                name: "North".to_string(),
                wheelchair: None,
            },
        ]
    );

    let transfers = builder().from_entry_dir(dir.path(), transfer_mapping(&registry))?;
    assert!(transfers.is_none());

    fs::write(dir.path().join("transfers.csv"), "from,to,min_seconds\nS1,S2,120\n")?;
    let transfers = builder()
        .from_entry_dir(dir.path(), transfer_mapping(&registry))?
        .expect("transfers.csv exists now");
    assert_eq!(transfers.read()?.and_then(|t| t.min_seconds), Some(120));

    Ok(())
}

#[test]
fn required_entry_file_must_exist() -> Result<(), Box<dyn Error>> {
    let registry = ValueProcessorRegistry::with_defaults();
    let dir = tempdir()?;

    let error = CsvEntryReaderBuilder::new()
        .from_entry_dir(dir.path(), stop_mapping(&registry))
        .err()
        .expect("stops.csv is required");

    assert!(error.is_resource());
    assert!(error.to_string().contains("stops.csv"));
    Ok(())
}

#[test]
fn dialect_should_load_from_configuration() -> Result<(), Box<dyn Error>> {
    let dialect: Dialect =
        serde_json::from_str(r#"{"delimiter": "|", "skip_header": false}"#)?;

    assert_eq!(dialect.delimiter(), '|');
    assert_eq!(dialect.quote(), '"');
    assert!(!dialect.skip_header());
    assert!(dialect.ignore_empty_lines());

    let reader = CsvEntryReaderBuilder::new().dialect(dialect).from_reader(
        "a|\"b|c\"".as_bytes(),
        |context: &ParsingContext<'_>| -> Result<Vec<String>, CodecError> {
            Ok(context.fields().to_vec())
        },
    );
    assert_eq!(reader.read()?, Some(vec!["a".to_string(), "b|c".to_string()]));

    let colliding = serde_json::from_str::<Dialect>(r#"{"delimiter": "\"", "quote": "\""}"#);
    assert!(colliding.is_err());

    let stored = serde_json::to_string(&Dialect::regional())?;
    assert_eq!(serde_json::from_str::<Dialect>(&stored)?, Dialect::regional());
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Holiday {
    date: NaiveDate,
    label: String,
}

#[test]
fn dates_should_use_registered_processors() -> Result<(), Box<dyn Error>> {
    let registry = ValueProcessorRegistry::with_defaults();
    let mapping = || {
        EntryMapping::<Holiday>::builder(&registry)
            .required("date", |h| &h.date, |h, v| h.date = v)
            .required("label", |h| &h.label, |h, v| h.label = v)
            .build()
    };

    let reader = CsvEntryReaderBuilder::new()
        .from_reader(Cursor::new("date;label\n20241225;Christmas\n"), mapping()?);
    let holidays = reader.read_all()?;
    assert_eq!(holidays[0].date, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());

    let writer = CsvEntryWriterBuilder::new().from_writer(Vec::new(), mapping()?);
    writer.write_all(&holidays)?;
    assert_eq!(writer.into_inner()?, b"20241225;Christmas\n");
    Ok(())
}

/// An amount of money stored as a whole number of cents.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Cents(u64);

impl ValueType for Cents {
    fn superclass() -> Option<Supertype<Self>> {
        Some(Supertype::with::<u64>(|cents| cents.0, |raw| Ok(Cents(raw))))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Fare {
    route: String,
    price: Cents,
    discount: Option<Cents>,
}

#[test]
fn custom_types_should_fall_back_to_their_supertype() -> Result<(), Box<dyn Error>> {
    let registry = ValueProcessorRegistry::with_defaults();
    let mapping = || {
        EntryMapping::<Fare>::builder(&registry)
            .required("route", |f| &f.route, |f, v| f.route = v)
            .required("price", |f| &f.price, |f, v| f.price = v)
            .optional("discount", |f| &f.discount, |f, v| f.discount = v)
            .build()
    };

    let dialect = DialectBuilder::new().skip_header(false).build()?;
    let reader = CsvEntryReaderBuilder::new()
        .dialect(dialect)
        .from_reader("R1;250;\nR2;400;50\n".as_bytes(), mapping()?);
    let fares = reader.read_all()?;

    assert_eq!(fares[0].price, Cents(250));
    assert_eq!(fares[0].discount, None);
    assert_eq!(fares[1].discount, Some(Cents(50)));

    let writer = CsvEntryWriterBuilder::new()
        .dialect(dialect)
        .from_writer(Vec::new(), mapping()?);
    writer.write_all(&fares)?;
    assert_eq!(String::from_utf8(writer.into_inner()?)?, "R1;250;\nR2;400;50\n");
    Ok(())
}
