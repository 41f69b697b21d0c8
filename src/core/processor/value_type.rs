use std::{
    any::{Any, TypeId},
    collections::HashSet,
    fmt::{self, Display},
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::error::CodecError;

/// Identity of a Rust type, usable as a registry key.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How an ancestor relates to the type whose lineage it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// The type itself.
    Exact,
    /// A type on the declared superclass chain.
    Superclass,
    /// A capability set, declared by the type or any of its ancestors.
    Capability,
    /// The plain type behind an `Option`.
    Unboxed,
}

type Up<T> = Arc<dyn Fn(&T) -> Option<Box<dyn Any>> + Send + Sync>;
type Down<T> = Arc<dyn Fn(Box<dyn Any>) -> Result<T, CodecError> + Send + Sync>;
type Null<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// One entry of a lineage: an ancestor type of `T` together with the
/// conversions between `T` and values of that ancestor.
pub struct Ancestor<T> {
    key: TypeKey,
    relation: Relation,
    up: Up<T>,
    down: Down<T>,
    null: Option<Null<T>>,
}

impl<T> Clone for Ancestor<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            relation: self.relation,
            up: Arc::clone(&self.up),
            down: Arc::clone(&self.down),
            null: self.null.clone(),
        }
    }
}

impl<T: ValueType> Ancestor<T> {
    fn exact() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            relation: Relation::Exact,
            up: Arc::new(|value: &T| Some(Box::new(value.clone()) as Box<dyn Any>)),
            down: Arc::new(|value: Box<dyn Any>| {
                value.downcast::<T>().map(|value| *value).map_err(|_| {
                    CodecError::Format(format!(
                        "processor did not produce a {}",
                        std::any::type_name::<T>()
                    ))
                })
            }),
            null: None,
        }
    }
}

impl<T: 'static> Ancestor<T> {
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Converts `value` into the ancestor's representation. `None` stands
    /// for an absent value, written as an empty field.
    pub(crate) fn to_ancestor(&self, value: &T) -> Option<Box<dyn Any>> {
        (self.up)(value)
    }

    pub(crate) fn from_ancestor(&self, value: Box<dyn Any>) -> Result<T, CodecError> {
        (self.down)(value)
    }

    /// Value an empty field stands for, when the type has one.
    pub(crate) fn null_value(&self) -> Option<T> {
        self.null.as_ref().map(|null| null())
    }

    fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = relation;
        self
    }

    /// Re-expresses this ancestor of `T` as an ancestor of `U`, given the
    /// conversions between `U` and `T`.
    fn rebase<U: 'static>(
        self,
        to_parent: Arc<dyn Fn(&U) -> Option<T> + Send + Sync>,
        from_parent: Arc<dyn Fn(T) -> Result<U, CodecError> + Send + Sync>,
    ) -> Ancestor<U> {
        let up = self.up;
        let down = self.down;
        Ancestor {
            key: self.key,
            relation: self.relation,
            up: Arc::new(move |value: &U| to_parent(value).and_then(|parent| up(&parent))),
            down: Arc::new(move |value: Box<dyn Any>| down(value).and_then(|parent| from_parent(parent))),
            null: None,
        }
    }
}

/// The ordered ancestry of a type, as consulted by
/// [`crate::core::processor::ValueProcessorRegistry::resolve`]: the type
/// itself, then its superclass chain, then its capability sets, each group
/// most-derived first. A type appears at most once, at its first position.
pub struct Lineage<T> {
    classes: Vec<Ancestor<T>>,
    capabilities: Vec<Ancestor<T>>,
}

impl<T: ValueType> Lineage<T> {
    /// Walks the declared superclass and capability links of `T`.
    ///
    /// Capabilities declared by `T` come before those inherited from its
    /// superclass. Hierarchies must be acyclic.
    pub fn compute() -> Self {
        let mut classes = vec![Ancestor::exact()];
        let mut capabilities = Vec::new();

        for capability in T::capabilities() {
            capabilities.extend(
                capability
                    .expand()
                    .into_entries()
                    .map(|ancestor| ancestor.with_relation(Relation::Capability)),
            );
        }

        if let Some(superclass) = T::superclass() {
            let inherited = superclass.expand();
            classes.extend(inherited.classes.into_iter().map(|ancestor| {
                let relation = match ancestor.relation {
                    Relation::Exact => Relation::Superclass,
                    other => other,
                };
                ancestor.with_relation(relation)
            }));
            capabilities.extend(inherited.capabilities);
        }

        Self {
            classes,
            capabilities,
        }
        .deduplicated()
    }

    /// Lineage of `Option<T>`: the plain type's ancestors, reading an empty
    /// field as `None` and writing `None` as an empty field.
    fn boxed(self) -> Lineage<Option<T>> {
        let unbox = |ancestor: Ancestor<T>| {
            let relation = match ancestor.relation {
                Relation::Exact => Relation::Unboxed,
                other => other,
            };
            let mut boxed = ancestor.rebase::<Option<T>>(
                Arc::new(|value: &Option<T>| value.clone()),
                Arc::new(|value: T| -> Result<Option<T>, CodecError> { Ok(Some(value)) }),
            );
            boxed.relation = relation;
            boxed.null = Some(Arc::new(|| None::<T>));
            boxed
        };

        let mut classes = vec![Ancestor::<Option<T>>::exact()];
        classes.extend(self.classes.into_iter().map(unbox));
        Lineage {
            classes,
            capabilities: self.capabilities.into_iter().map(unbox).collect(),
        }
    }
}

impl<T: 'static> Lineage<T> {
    /// Ancestors in resolution order.
    pub fn entries(&self) -> impl Iterator<Item = &Ancestor<T>> {
        self.classes.iter().chain(self.capabilities.iter())
    }

    pub fn keys(&self) -> Vec<TypeKey> {
        self.entries().map(Ancestor::key).collect()
    }

    fn into_entries(self) -> impl Iterator<Item = Ancestor<T>> {
        self.classes.into_iter().chain(self.capabilities)
    }

    fn rebase<U: 'static>(
        self,
        to_parent: Arc<dyn Fn(&U) -> Option<T> + Send + Sync>,
        from_parent: Arc<dyn Fn(T) -> Result<U, CodecError> + Send + Sync>,
    ) -> Lineage<U> {
        let rebase = |ancestor: Ancestor<T>| {
            ancestor.rebase(Arc::clone(&to_parent), Arc::clone(&from_parent))
        };
        Lineage {
            classes: self.classes.into_iter().map(rebase).collect(),
            capabilities: self.capabilities.into_iter().map(rebase).collect(),
        }
    }

    fn deduplicated(self) -> Self {
        let mut seen = HashSet::new();
        let classes: Vec<_> = self
            .classes
            .into_iter()
            .filter(|ancestor| seen.insert(ancestor.key))
            .collect();
        let capabilities = self
            .capabilities
            .into_iter()
            .filter(|ancestor| seen.insert(ancestor.key))
            .collect();
        Self {
            classes,
            capabilities,
        }
    }
}

/// A declared link from a type `T` to one of its ancestors: a superclass or
/// a capability set.
///
/// A capability is any type the value converts into and back, typically a
/// newtype shared by several record value types.
pub struct Supertype<T> {
    expand: Box<dyn FnOnce() -> Lineage<T>>,
}

impl<T: ValueType> Supertype<T> {
    /// Links `T` to `S` through `From<T> for S` and `TryFrom<S> for T`.
    pub fn of<S>() -> Self
    where
        S: ValueType + From<T>,
        T: TryFrom<S>,
        <T as TryFrom<S>>::Error: Display,
    {
        Self::with::<S>(
            |value: &T| S::from(value.clone()),
            |value: S| {
                T::try_from(value).map_err(|error| {
                    CodecError::Format(format!(
                        "{} value does not fit {}: {error}",
                        std::any::type_name::<S>(),
                        std::any::type_name::<T>()
                    ))
                })
            },
        )
    }

    /// Links `T` to `S` through explicit conversions.
    pub fn with<S: ValueType>(up: fn(&T) -> S, down: fn(S) -> Result<T, CodecError>) -> Self {
        Self {
            expand: Box::new(move || {
                S::lineage().rebase(
                    Arc::new(move |value: &T| Some(up(value))),
                    Arc::new(down),
                )
            }),
        }
    }

    fn expand(self) -> Lineage<T> {
        (self.expand)()
    }
}

/// A type that value processors can be registered and resolved for.
///
/// The default implementation has no ancestors. Override
/// [`ValueType::superclass`] and [`ValueType::capabilities`] to let a type
/// fall back on the processors of its ancestors.
///
/// # Examples
///
/// ```
/// use csv_codec_rs::core::processor::{Supertype, TypeKey, ValueType};
///
/// #[derive(Clone)]
/// struct Code(u32);
///
/// impl ValueType for Code {}
///
/// #[derive(Clone)]
/// struct RouteKind(u32);
///
/// impl From<RouteKind> for Code {
///     fn from(kind: RouteKind) -> Self {
///         Code(kind.0)
///     }
/// }
///
/// impl From<Code> for RouteKind {
///     fn from(code: Code) -> Self {
///         RouteKind(code.0)
///     }
/// }
///
/// impl ValueType for RouteKind {
///     fn capabilities() -> Vec<Supertype<Self>> {
///         vec![Supertype::of::<Code>()]
///     }
/// }
///
/// assert_eq!(
///     RouteKind::lineage().keys(),
///     vec![TypeKey::of::<RouteKind>(), TypeKey::of::<Code>()]
/// );
/// ```
pub trait ValueType: Clone + Send + Sync + 'static {
    fn superclass() -> Option<Supertype<Self>> {
        None
    }

    fn capabilities() -> Vec<Supertype<Self>> {
        Vec::new()
    }

    fn lineage() -> Lineage<Self> {
        Lineage::compute()
    }
}

/// `Option<T>` is the nullable form of `T` and resolves to `T`'s processors
/// without registering them twice.
impl<T: ValueType> ValueType for Option<T> {
    fn lineage() -> Lineage<Self> {
        T::lineage().boxed()
    }
}

macro_rules! value_type {
    ($($t:ty),* $(,)?) => {
        $(impl ValueType for $t {})*
    };
}

macro_rules! widening {
    ($($t:ty => $s:ty),* $(,)?) => {
        $(
            impl ValueType for $t {
                fn superclass() -> Option<Supertype<Self>> {
                    Some(Supertype::of::<$s>())
                }
            }
        )*
    };
}

value_type!(String, bool, char, f32, f64, i64, u64, i128, u128, isize, usize);

widening!(
    i8 => i16,
    i16 => i32,
    i32 => i64,
    u8 => u16,
    u16 => u32,
    u32 => u64,
);
