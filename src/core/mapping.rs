use std::collections::HashSet;

use log::debug;

use crate::{
    core::{
        item::{EntryConverter, EntryParser, ParsingContext},
        processor::{Resolved, ValueProcessor, ValueProcessorRegistry, ValueType},
    },
    error::CodecError,
};

/// String conversion used by one mapped column.
trait FieldCodec<T>: Send + Sync {
    fn parse(&self, raw: &str) -> Result<T, CodecError>;
    fn format(&self, value: &T) -> Result<String, CodecError>;
}

impl<T: 'static> FieldCodec<T> for Resolved<T> {
    fn parse(&self, raw: &str) -> Result<T, CodecError> {
        Resolved::parse(self, raw)
    }

    fn format(&self, value: &T) -> Result<String, CodecError> {
        Resolved::format(self, value)
    }
}

/// A processor given explicitly for one column instead of resolved.
struct Explicit<P>(P);

impl<T, P: ValueProcessor<T>> FieldCodec<T> for Explicit<P> {
    fn parse(&self, raw: &str) -> Result<T, CodecError> {
        self.0.parse(raw)
    }

    fn format(&self, value: &T) -> Result<String, CodecError> {
        Ok(self.0.format(value))
    }
}

trait Binding<E>: Send + Sync {
    fn read(&self, raw: &str, entry: &mut E) -> Result<(), CodecError>;
    fn write(&self, entry: &E) -> Result<String, CodecError>;
}

struct FieldBinding<E, T> {
    codec: Box<dyn FieldCodec<T>>,
    get: fn(&E) -> &T,
    set: fn(&mut E, T),
}

impl<E, T> Binding<E> for FieldBinding<E, T> {
    fn read(&self, raw: &str, entry: &mut E) -> Result<(), CodecError> {
        let value = self.codec.parse(raw)?;
        (self.set)(entry, value);
        Ok(())
    }

    fn write(&self, entry: &E) -> Result<String, CodecError> {
        self.codec.format((self.get)(entry))
    }
}

struct Column<E> {
    name: String,
    required: bool,
    binding: Box<dyn Binding<E>>,
}

impl<E> Column<E> {
    fn in_column(&self, error: CodecError) -> CodecError {
        match error {
            CodecError::Format(message) => {
                CodecError::Format(format!("column '{}': {message}", self.name))
            }
            other => other,
        }
    }
}

/// A static column table for the record type `E`.
///
/// Each column pairs a name and a position (its declaration order) with a
/// getter/setter on `E` and a processor resolved once, when the mapping is
/// built. The mapping parses records into `E::default()` and converts
/// entries back into fields in column order.
///
/// # Examples
///
/// ```
/// use csv_codec_rs::core::{
///     dialect::Dialect,
///     item::{EntryConverter, EntryParser, ParsingContext},
///     mapping::EntryMapping,
///     processor::ValueProcessorRegistry,
/// };
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Stop {
///     id: String,
///     name: String,
///     wheelchair: Option<bool>,
/// }
///
/// let registry = ValueProcessorRegistry::with_defaults();
/// let mapping = EntryMapping::<Stop>::builder(&registry)
///     .required("stop_id", |s| &s.id, |s, v| s.id = v)
///     .required("stop_name", |s| &s.name, |s, v| s.name = v)
///     .optional("wheelchair", |s| &s.wheelchair, |s, v| s.wheelchair = v)
///     .build()
///     .unwrap();
///
/// let dialect = Dialect::regional();
/// let fields = vec!["S1".to_string(), "Main Street".to_string(), "".to_string()];
/// let stop = mapping.parse(&ParsingContext::new(&fields, &dialect)).unwrap();
/// assert_eq!(stop.name, "Main Street");
/// assert_eq!(stop.wheelchair, None);
///
/// assert_eq!(mapping.convert(&stop).unwrap(), fields);
/// ```
pub struct EntryMapping<E> {
    columns: Vec<Column<E>>,
    match_by_header: bool,
    strict_field_count: bool,
}

impl<E: 'static> EntryMapping<E> {
    pub fn builder(registry: &ValueProcessorRegistry) -> EntryMappingBuilder<'_, E> {
        EntryMappingBuilder::new(registry)
    }
}

impl<E> EntryMapping<E> {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn raw_value<'a>(
        &self,
        context: &ParsingContext<'a>,
        position: usize,
        column: &Column<E>,
    ) -> Option<&'a str> {
        match context.headers() {
            Some(_) if self.match_by_header => context.by_name(&column.name),
            _ => context.get(position),
        }
    }
}

impl<E: Default> EntryParser<E> for EntryMapping<E> {
    fn parse(&self, context: &ParsingContext<'_>) -> Result<E, CodecError> {
        if self.strict_field_count && context.len() > self.columns.len() {
            return Err(CodecError::Format(format!(
                "expected at most {} field(s) but the record has {}",
                self.columns.len(),
                context.len()
            )));
        }

        let mut entry = E::default();

        for (position, column) in self.columns.iter().enumerate() {
            match self.raw_value(context, position, column) {
                None if column.required => {
                    return Err(CodecError::Format(format!(
                        "missing required column '{}'",
                        column.name
                    )));
                }
                None => {}
                Some("") if !column.required => {}
                Some(raw) => column
                    .binding
                    .read(raw, &mut entry)
                    .map_err(|error| column.in_column(error))?,
            }
        }

        Ok(entry)
    }
}

impl<E> EntryConverter<E> for EntryMapping<E> {
    fn convert(&self, entry: &E) -> Result<Vec<String>, CodecError> {
        self.columns
            .iter()
            .map(|column| {
                column
                    .binding
                    .write(entry)
                    .map_err(|error| column.in_column(error))
            })
            .collect()
    }

    fn header(&self) -> Option<Vec<String>> {
        Some(self.column_names())
    }
}

/// A builder for an [`EntryMapping`].
///
/// Processors are looked up in the registry as columns are declared; the
/// first failed lookup is reported by [`EntryMappingBuilder::build`].
pub struct EntryMappingBuilder<'r, E> {
    registry: &'r ValueProcessorRegistry,
    columns: Vec<Column<E>>,
    error: Option<CodecError>,
    match_by_header: bool,
    strict_field_count: bool,
}

impl<'r, E: 'static> EntryMappingBuilder<'r, E> {
    pub fn new(registry: &'r ValueProcessorRegistry) -> Self {
        Self {
            registry,
            columns: Vec::new(),
            error: None,
            match_by_header: false,
            strict_field_count: false,
        }
    }

    /// Declares a column that every record must have.
    pub fn required<T: ValueType>(
        self,
        name: impl Into<String>,
        get: fn(&E) -> &T,
        set: fn(&mut E, T),
    ) -> Self {
        self.resolved(name.into(), true, get, set)
    }

    /// Declares a column that may be missing or empty, leaving the field at
    /// its default value.
    pub fn optional<T: ValueType>(
        self,
        name: impl Into<String>,
        get: fn(&E) -> &T,
        set: fn(&mut E, T),
    ) -> Self {
        self.resolved(name.into(), false, get, set)
    }

    /// Declares a column converted by `processor` rather than by the
    /// registry.
    pub fn column_with<T, P>(
        mut self,
        name: impl Into<String>,
        required: bool,
        processor: P,
        get: fn(&E) -> &T,
        set: fn(&mut E, T),
    ) -> Self
    where
        T: 'static,
        P: ValueProcessor<T> + 'static,
    {
        self.push(name.into(), required, Box::new(Explicit(processor)), get, set);
        self
    }

    /// Binds columns by header name when the reader captured a header,
    /// instead of by position.
    pub fn match_by_header(mut self, yes: bool) -> Self {
        self.match_by_header = yes;
        self
    }

    /// Rejects records having more fields than declared columns.
    pub fn strict_field_count(mut self, yes: bool) -> Self {
        self.strict_field_count = yes;
        self
    }

    pub fn build(self) -> Result<EntryMapping<E>, CodecError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut names = HashSet::new();
        for column in &self.columns {
            if !names.insert(column.name.as_str()) {
                return Err(CodecError::Registration(format!(
                    "column '{}' is declared twice",
                    column.name
                )));
            }
        }

        debug!(
            "Entry mapping built for {} with {} column(s)",
            std::any::type_name::<E>(),
            self.columns.len()
        );

        Ok(EntryMapping {
            columns: self.columns,
            match_by_header: self.match_by_header,
            strict_field_count: self.strict_field_count,
        })
    }

    fn resolved<T: ValueType>(
        mut self,
        name: String,
        required: bool,
        get: fn(&E) -> &T,
        set: fn(&mut E, T),
    ) -> Self {
        match self.registry.resolve::<T>() {
            Ok(processor) => self.push(name, required, Box::new(processor), get, set),
            Err(error) => {
                if self.error.is_none() {
                    self.error = Some(match error {
                        CodecError::Registration(message) => {
                            CodecError::Registration(format!("column '{name}': {message}"))
                        }
                        other => other,
                    });
                }
            }
        }
        self
    }

    fn push<T: 'static>(
        &mut self,
        name: String,
        required: bool,
        codec: Box<dyn FieldCodec<T>>,
        get: fn(&E) -> &T,
        set: fn(&mut E, T),
    ) {
        self.columns.push(Column {
            name,
            required,
            binding: Box::new(FieldBinding { codec, get, set }),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::EntryMapping;
    use crate::core::{
        dialect::Dialect,
        item::{EntryConverter, EntryParser, ParsingContext},
        processor::{FromStrProcessor, ValueProcessor, ValueProcessorRegistry},
    };
    use crate::error::CodecError;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Person {
        first: String,
        last: String,
        age: i32,
        nickname: Option<String>,
    }

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn mapping(registry: &ValueProcessorRegistry) -> EntryMapping<Person> {
        EntryMapping::<Person>::builder(registry)
            .required("first", |p| &p.first, |p, v| p.first = v)
            .required("last", |p| &p.last, |p, v| p.last = v)
            .required("age", |p| &p.age, |p, v| p.age = v)
            .optional("nickname", |p| &p.nickname, |p, v| p.nickname = v)
            .build()
            .unwrap()
    }

    #[test]
    fn record_should_be_parsed_by_position() {
        let registry = ValueProcessorRegistry::with_defaults();
        let mapping = mapping(&registry);
        let dialect = Dialect::regional();
        let values = fields(&["Jane", "Smith, Jr", "25"]);

        let person = mapping
            .parse(&ParsingContext::new(&values, &dialect))
            .unwrap();

        assert_eq!(
            person,
            Person {
                first: "Jane".to_string(),
                last: "Smith, Jr".to_string(),
                age: 25,
                nickname: None,
            }
        );
    }

    #[test]
    fn entry_should_convert_in_column_order() {
        let registry = ValueProcessorRegistry::with_defaults();
        let mapping = mapping(&registry);
        let person = Person {
            first: "John".to_string(),
            last: "Doe".to_string(),
            age: 30,
            nickname: Some("JD".to_string()),
        };

        assert_eq!(
            mapping.convert(&person).unwrap(),
            fields(&["John", "Doe", "30", "JD"])
        );
        assert_eq!(
            mapping.header(),
            Some(fields(&["first", "last", "age", "nickname"]))
        );
    }

    #[test]
    fn missing_required_column_should_fail() {
        let registry = ValueProcessorRegistry::with_defaults();
        let mapping = mapping(&registry);
        let dialect = Dialect::regional();
        let values = fields(&["John", "Doe"]);

        let error = mapping
            .parse(&ParsingContext::new(&values, &dialect))
            .unwrap_err();
        assert!(error.is_format());
        assert!(error.to_string().contains("age"));
    }

    #[test]
    fn malformed_value_should_name_its_column() {
        let registry = ValueProcessorRegistry::with_defaults();
        let mapping = mapping(&registry);
        let dialect = Dialect::regional();
        let values = fields(&["John", "Doe", "thirty"]);

        let error = mapping
            .parse(&ParsingContext::new(&values, &dialect))
            .unwrap_err();
        assert!(error.to_string().contains("column 'age'"));
    }

    #[test]
    fn columns_should_match_headers_when_asked() {
        let registry = ValueProcessorRegistry::with_defaults();
        let mapping = EntryMapping::<Person>::builder(&registry)
            .required("first", |p| &p.first, |p, v| p.first = v)
            .required("age", |p| &p.age, |p, v| p.age = v)
            .match_by_header(true)
            .build()
            .unwrap();
        let dialect = Dialect::regional();
        let headers = fields(&["age", "unused", "first"]);
        let values = fields(&["41", "x", "Ada"]);

        let person = mapping
            .parse(&ParsingContext::new(&values, &dialect).with_headers(Some(&headers)))
            .unwrap();
        assert_eq!(person.first, "Ada");
        assert_eq!(person.age, 41);

        // without a captured header, positions apply
        let values = fields(&["Ada", "41"]);
        let person = mapping
            .parse(&ParsingContext::new(&values, &dialect))
            .unwrap();
        assert_eq!(person.age, 41);
    }

    #[test]
    fn strict_mapping_should_reject_extra_fields() {
        let registry = ValueProcessorRegistry::with_defaults();
        let mapping = EntryMapping::<Person>::builder(&registry)
            .required("first", |p| &p.first, |p, v| p.first = v)
            .strict_field_count(true)
            .build()
            .unwrap();
        let dialect = Dialect::regional();
        let values = fields(&["Ada", "Lovelace"]);

        assert!(
            mapping
                .parse(&ParsingContext::new(&values, &dialect))
                .unwrap_err()
                .is_format()
        );
    }

    #[test]
    fn unresolvable_column_should_fail_the_build() {
        let registry = ValueProcessorRegistry::new();
        let result = EntryMapping::<Person>::builder(&registry)
            .required("first", |p| &p.first, |p, v| p.first = v)
            .build();

        let error = result.err().unwrap();
        assert!(error.is_registration());
        assert!(error.to_string().contains("column 'first'"));
    }

    #[test]
    fn duplicate_column_should_fail_the_build() {
        let registry = ValueProcessorRegistry::with_defaults();
        let result = EntryMapping::<Person>::builder(&registry)
            .required("first", |p| &p.first, |p, v| p.first = v)
            .required("first", |p| &p.last, |p, v| p.last = v)
            .build();

        assert!(result.err().unwrap().is_registration());
    }

    struct Percent;

    impl ValueProcessor<i32> for Percent {
        fn parse(&self, raw: &str) -> Result<i32, CodecError> {
            FromStrProcessor::<i32>::new().parse(raw.trim_end_matches('%'))
        }

        fn format(&self, value: &i32) -> String {
            format!("{value}%")
        }
    }

    #[test]
    fn explicit_processor_should_override_the_registry() {
        let registry = ValueProcessorRegistry::new();
        let mapping = EntryMapping::<Person>::builder(&registry)
            .column_with("age", true, Percent, |p| &p.age, |p, v| p.age = v)
            .build()
            .unwrap();
        let dialect = Dialect::regional();
        let values = fields(&["12%"]);

        let person = mapping
            .parse(&ParsingContext::new(&values, &dialect))
            .unwrap();
        assert_eq!(person.age, 12);
        assert_eq!(mapping.convert(&person).unwrap(), fields(&["12%"]));
    }
}
