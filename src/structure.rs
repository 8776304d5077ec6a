//! Tagged structures: the [`Structure`] capability, the generic [`BasicStruct`] carrier, and
//! the decode-time [`Registry`].

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::value::Value;
use crate::PackStreamError;

/// A domain type that encodes as a PackStream structure.
///
/// Implementors report a signature byte and an ordered field list; the encoder needs nothing
/// else. `#[derive(Structure)]` implements this for plain structs.
pub trait Structure {
    /// The signature identifying this structure's meaning.
    fn signature(&self) -> i8;

    /// The structure's fields, in wire order.
    fn fields(&self) -> Cow<'_, [Value]>;
}

/// A domain type that can be rebuilt from a decoded signature and field list.
pub trait FromStructure: Sized {
    /// Build `Self` from a decoded structure.
    ///
    /// # Errors
    ///
    /// Returns an error if the field count or field kinds do not match.
    fn from_structure(signature: i8, fields: Vec<Value>) -> Result<Self, PackStreamError>;
}

/// Object-safe bound for values stored in [`Value::Domain`].
///
/// Blanket-implemented for every `Structure + Clone + Debug + Send + Sync + 'static` type.
pub trait DomainStructure: Structure + Any + fmt::Debug + Send + Sync {
    #[doc(hidden)]
    fn clone_box(&self) -> Box<dyn DomainStructure>;
    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;
}

impl<T> DomainStructure for T
where
    T: Structure + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn clone_box(&self) -> Box<dyn DomainStructure> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The generic structure carrier.
///
/// Decoding produces this when no registry entry matches the signature, so no information is
/// lost without domain knowledge.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicStruct {
    /// Signed signature byte.
    pub signature: i8,
    /// Fields in wire order.
    pub fields: Vec<Value>,
}

impl BasicStruct {
    /// Construct a structure.
    #[must_use]
    pub const fn new(signature: i8, fields: Vec<Value>) -> Self {
        Self { signature, fields }
    }
}

impl Structure for BasicStruct {
    fn signature(&self) -> i8 {
        self.signature
    }

    fn fields(&self) -> Cow<'_, [Value]> {
        Cow::Borrowed(&self.fields)
    }
}

impl FromStructure for BasicStruct {
    fn from_structure(signature: i8, fields: Vec<Value>) -> Result<Self, PackStreamError> {
        Ok(Self::new(signature, fields))
    }
}

/// A registry-built domain value held inside [`Value::Domain`].
pub struct DomainValue(Box<dyn DomainStructure>);

impl DomainValue {
    /// Box a domain value.
    #[must_use]
    pub fn new<T: DomainStructure>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Borrow the value as `T` if that is its concrete type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    /// Returns true iff the boxed value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Convert into the generic carrier, dropping domain knowledge.
    #[must_use]
    pub fn to_basic(&self) -> BasicStruct {
        BasicStruct::new(self.0.signature(), self.0.fields().into_owned())
    }
}

impl Structure for DomainValue {
    fn signature(&self) -> i8 {
        self.0.signature()
    }

    fn fields(&self) -> Cow<'_, [Value]> {
        self.0.fields()
    }
}

impl Clone for DomainValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl fmt::Debug for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Domain values are equal when they would encode identically.
impl PartialEq for DomainValue {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature() && self.fields() == other.fields()
    }
}

/// A structure reconstruction function: `(signature, fields) -> value`.
pub type Reconstruct = dyn Fn(i8, Vec<Value>) -> Result<Value, PackStreamError> + Send + Sync;

/// Decode-time mapping from signature to reconstruction function.
///
/// Keys are the signed interpretation of the signature byte, matching what the decoder reads.
/// Signatures without an entry decode to [`Value::Struct`].
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<i8, Box<Reconstruct>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Map `signature` to an arbitrary reconstruction function, replacing any previous entry.
    pub fn insert<F>(&mut self, signature: i8, f: F) -> &mut Self
    where
        F: Fn(i8, Vec<Value>) -> Result<Value, PackStreamError> + Send + Sync + 'static,
    {
        self.entries.insert(signature, Box::new(f));
        self
    }

    /// Map `signature` to `T`'s [`FromStructure`] implementation; decoded values land in
    /// [`Value::Domain`].
    ///
    /// `T::from_structure` receives the decoded signature and may reject it. Types using
    /// `#[derive(Structure)]` accept only their own `#[packstream(signature = N)]`, so
    /// registering one under any other signature makes every decode under that key fail with
    /// `InvalidStructure`.
    pub fn register<T>(&mut self, signature: i8) -> &mut Self
    where
        T: FromStructure + DomainStructure,
    {
        self.insert(signature, |sig, fields| {
            T::from_structure(sig, fields).map(Value::domain)
        })
    }

    /// Builder-style [`Registry::register`], with the same signature constraint.
    #[must_use]
    pub fn with<T>(mut self, signature: i8) -> Self
    where
        T: FromStructure + DomainStructure,
    {
        self.register::<T>(signature);
        self
    }

    /// Look up the reconstruction function for `signature`.
    #[must_use]
    pub fn get(&self, signature: i8) -> Option<&Reconstruct> {
        self.entries.get(&signature).map(AsRef::as_ref)
    }

    /// Returns true iff `signature` has an entry.
    #[must_use]
    pub fn contains(&self, signature: i8) -> bool {
        self.entries.contains_key(&signature)
    }

    /// Remove the entry for `signature`. Returns true iff one was present.
    pub fn remove(&mut self, signature: i8) -> bool {
        self.entries.remove(&signature).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true iff the registry has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the value for a decoded structure: registry hit or generic carrier.
    pub(crate) fn reconstruct(
        registry: Option<&Self>,
        signature: i8,
        fields: Vec<Value>,
    ) -> Result<Value, PackStreamError> {
        if let Some(f) = registry.and_then(|r| r.get(signature)) {
            return f(signature, fields);
        }
        crate::log::trace!(signature, "no registry entry, using generic structure");
        Ok(Value::Struct(BasicStruct::new(signature, fields)))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("signatures", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
