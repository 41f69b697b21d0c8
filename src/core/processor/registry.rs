use std::{
    any::Any,
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::Arc,
};

use log::debug;

use crate::{
    core::processor::{
        Ancestor, BoolProcessor, FromStrProcessor, Relation, StringProcessor, TypeKey,
        ValueProcessor, ValueType,
    },
    error::CodecError,
};

/// Object-safe face of a `ValueProcessor<T>`, working on `dyn Any` values.
trait ErasedProcessor: Send + Sync {
    fn parse_any(&self, raw: &str) -> Result<Box<dyn Any>, CodecError>;

    /// `None` when `value` is not of the processor's type.
    fn format_any(&self, value: &dyn Any) -> Option<String>;
}

struct Erased<T, P> {
    processor: P,
    _pd: PhantomData<fn() -> T>,
}

impl<T: 'static, P: ValueProcessor<T>> ErasedProcessor for Erased<T, P> {
    fn parse_any(&self, raw: &str) -> Result<Box<dyn Any>, CodecError> {
        Ok(Box::new(self.processor.parse(raw)?))
    }

    fn format_any(&self, value: &dyn Any) -> Option<String> {
        value
            .downcast_ref::<T>()
            .map(|value| self.processor.format(value))
    }
}

/// Type-indexed table of [`ValueProcessor`]s.
///
/// At most one processor is registered per exact type. Lookups for a type
/// without an exact entry walk the type's [`crate::core::processor::Lineage`]
/// and use the first registered ancestor.
///
/// The registry is an explicit value: build it once at startup, then share
/// it by reference. It is `Send + Sync`; wrap it in a lock only if it must be
/// mutated while other threads resolve from it.
///
/// # Examples
///
/// ```
/// use csv_codec_rs::core::processor::{FromStrProcessor, TypeKey, ValueProcessorRegistry};
///
/// let mut registry = ValueProcessorRegistry::new();
/// registry.register::<i64, _>(FromStrProcessor::<i64>::new()).unwrap();
///
/// // i32 widens to i64, Option<i32> is the nullable i32
/// let processor = registry.resolve::<Option<i32>>().unwrap();
/// assert_eq!(processor.matched(), TypeKey::of::<i64>());
/// assert_eq!(processor.parse("12").unwrap(), Some(12));
/// assert_eq!(processor.parse("").unwrap(), None);
/// assert!(processor.parse("3000000000").is_err());
///
/// // A second processor for the same exact type is refused
/// assert!(registry.register::<i64, _>(FromStrProcessor::<i64>::new()).is_err());
/// ```
#[derive(Default)]
pub struct ValueProcessorRegistry {
    processors: HashMap<TypeKey, Arc<dyn ErasedProcessor>>,
}

impl ValueProcessorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding a processor for `String`, `bool`, `char`, every
    /// integer and float primitive and, with the `chrono` feature, the naive
    /// date and time types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert::<String, _>(StringProcessor);
        registry.insert::<bool, _>(BoolProcessor);

        macro_rules! from_str {
            ($registry:ident, $($t:ty),*) => {
                $($registry.insert::<$t, _>(FromStrProcessor::<$t>::new());)*
            };
        }

        from_str!(
            registry, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
            f64
        );

        #[cfg(feature = "chrono")]
        {
            use crate::core::processor::datetime::{
                NaiveDateProcessor, NaiveDateTimeProcessor, NaiveTimeProcessor,
            };
            use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

            registry.insert::<NaiveDate, _>(NaiveDateProcessor::default());
            registry.insert::<NaiveTime, _>(NaiveTimeProcessor::default());
            registry.insert::<NaiveDateTime, _>(NaiveDateTimeProcessor::default());
        }

        registry
    }

    /// Registers `processor` for the exact type `T`.
    ///
    /// Fails with [`CodecError::Registration`] when `T` already has one.
    pub fn register<T, P>(&mut self, processor: P) -> Result<(), CodecError>
    where
        T: 'static,
        P: ValueProcessor<T> + 'static,
    {
        let key = TypeKey::of::<T>();
        if self.processors.contains_key(&key) {
            return Err(CodecError::Registration(format!(
                "a value processor is already registered for {key}"
            )));
        }

        self.insert::<T, P>(processor);
        debug!("Value processor registered for {key}");
        Ok(())
    }

    /// Removes the processor registered for the exact type `T`.
    ///
    /// Fails with [`CodecError::Registration`] when there is none.
    pub fn remove<T: 'static>(&mut self) -> Result<(), CodecError> {
        let key = TypeKey::of::<T>();
        match self.processors.remove(&key) {
            Some(_) => {
                debug!("Value processor removed for {key}");
                Ok(())
            }
            None => Err(CodecError::Registration(format!(
                "no value processor is registered for {key}"
            ))),
        }
    }

    /// Whether `T` has an exact registration.
    pub fn contains<T: 'static>(&self) -> bool {
        self.processors.contains_key(&TypeKey::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Resolves the processor for `T`: the exact registration first, then
    /// the first registered type of `T`'s lineage (superclass chain, then
    /// capability sets, most-derived first).
    ///
    /// Fails with [`CodecError::Registration`] when no ancestor has one.
    pub fn resolve<T: ValueType>(&self) -> Result<Resolved<T>, CodecError> {
        let lineage = T::lineage();

        for ancestor in lineage.entries() {
            if let Some(processor) = self.processors.get(&ancestor.key()) {
                if ancestor.relation() != Relation::Exact {
                    debug!(
                        "Value processor for {} resolved through {} ({:?})",
                        std::any::type_name::<T>(),
                        ancestor.key(),
                        ancestor.relation()
                    );
                }
                return Ok(Resolved {
                    processor: Arc::clone(processor),
                    ancestor: ancestor.clone(),
                });
            }
        }

        Err(CodecError::Registration(format!(
            "no value processor is registered for {} or any of its supertypes",
            std::any::type_name::<T>()
        )))
    }

    fn insert<T, P>(&mut self, processor: P)
    where
        T: 'static,
        P: ValueProcessor<T> + 'static,
    {
        let erased: Erased<T, P> = Erased {
            processor,
            _pd: PhantomData,
        };
        self.processors.insert(TypeKey::of::<T>(), Arc::new(erased));
    }
}

impl fmt::Debug for ValueProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.processors.keys()).finish()
    }
}

/// The processor resolved for `T`, possibly registered for one of its
/// ancestors, bundled with the conversions between `T` and that ancestor.
pub struct Resolved<T> {
    processor: Arc<dyn ErasedProcessor>,
    ancestor: Ancestor<T>,
}

impl<T> Clone for Resolved<T> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            ancestor: self.ancestor.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Resolved<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("matched", &self.matched())
            .field("relation", &self.relation())
            .finish()
    }
}

impl<T: 'static> Resolved<T> {
    /// The type whose registration was used.
    pub fn matched(&self) -> TypeKey {
        self.ancestor.key()
    }

    pub fn relation(&self) -> Relation {
        self.ancestor.relation()
    }

    /// Whether both resolutions use the very same registered processor.
    pub fn same_processor<U>(&self, other: &Resolved<U>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.processor), Arc::as_ptr(&other.processor))
    }

    /// Parses `raw` with the resolved processor. For nullable types an empty
    /// string is the absent value.
    pub fn parse(&self, raw: &str) -> Result<T, CodecError> {
        if raw.is_empty() {
            if let Some(null) = self.ancestor.null_value() {
                return Ok(null);
            }
        }

        let value = self.processor.parse_any(raw)?;
        self.ancestor.from_ancestor(value)
    }

    /// Formats `value` with the resolved processor. An absent value formats
    /// to the empty string.
    pub fn format(&self, value: &T) -> Result<String, CodecError> {
        match self.ancestor.to_ancestor(value) {
            None => Ok(String::new()),
            Some(parent) => self.processor.format_any(parent.as_ref()).ok_or_else(|| {
                CodecError::Format(format!(
                    "value processor for {} cannot format a {}",
                    self.ancestor.key(),
                    std::any::type_name::<T>()
                ))
            }),
        }
    }
}
