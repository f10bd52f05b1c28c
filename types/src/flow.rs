//! Flow identity.
//!
//! A flow names a unit of application functionality. It is a label, not an
//! instance: two values naming the same flow are interchangeable.
//!
//! Identity is a discriminated `{kind, key}` pair compared structurally. The
//! kind tag names the flow enumeration a value came from, so comparing flows
//! from two different enumerations is always a plain `false`.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag naming one closed set of flows (usually one Rust enum).
///
/// A kind is never empty and never contains `:`; both constructors panic
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKind(Cow<'static, str>);

impl FlowKind {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        assert!(is_valid_kind(name.as_bytes()), "flow kind must be non-empty without `:`");
        Self(Cow::Borrowed(name))
    }

    #[must_use]
    pub fn owned(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(
            is_valid_kind(name.as_bytes()),
            "flow kind {name:?} must be non-empty without `:`"
        );
        Self(Cow::Owned(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for FlowKind {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Comparable payload distinguishing flows of the same kind.
///
/// Displayed as the bare name, or `#n` for indices. A name that is empty or
/// starts with `#` or `\` is written with a leading `\`, so every key parses
/// back to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlowKey {
    Index(u32),
    Name(Cow<'static, str>),
}

impl FlowKey {
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            FlowKey::Name(name) => Some(name),
            FlowKey::Index(_) => None,
        }
    }

    #[must_use]
    pub fn as_index(&self) -> Option<u32> {
        match self {
            FlowKey::Index(index) => Some(*index),
            FlowKey::Name(_) => None,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        if let Some(name) = raw.strip_prefix(ESCAPE) {
            return Some(FlowKey::Name(Cow::Owned(name.to_string())));
        }
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix('#') {
            Some(digits) => digits.parse().ok().map(FlowKey::Index),
            None => Some(FlowKey::Name(Cow::Owned(raw.to_string()))),
        }
    }
}

impl From<u32> for FlowKey {
    fn from(value: u32) -> Self {
        FlowKey::Index(value)
    }
}

impl From<&'static str> for FlowKey {
    fn from(value: &'static str) -> Self {
        FlowKey::Name(Cow::Borrowed(value))
    }
}

impl From<String> for FlowKey {
    fn from(value: String) -> Self {
        FlowKey::Name(Cow::Owned(value))
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowKey::Index(index) => write!(f, "#{index}"),
            FlowKey::Name(name) if name.is_empty() || name.starts_with(['#', ESCAPE]) => {
                write!(f, "{ESCAPE}{name}")
            }
            FlowKey::Name(name) => f.write_str(name),
        }
    }
}

/// Identity of a flow: the kind tag plus the key within that kind.
///
/// # Serde
///
/// Serializes as the string `kind::key`. Deserialization rejects strings
/// without a separator or with an empty side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlowId {
    kind: FlowKind,
    key: FlowKey,
}

const SEPARATOR: &str = "::";
const ESCAPE: char = '\\';

const fn is_valid_kind(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            return false;
        }
        i += 1;
    }
    true
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid flow id {raw:?}: expected `kind::key`")]
pub struct FlowIdParseError {
    raw: String,
}

impl FlowId {
    #[must_use]
    pub fn new(kind: impl Into<FlowKind>, key: impl Into<FlowKey>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
        }
    }

    #[must_use]
    pub fn named(kind: impl Into<FlowKind>, name: &'static str) -> Self {
        Self::new(kind, FlowKey::from(name))
    }

    #[must_use]
    pub fn indexed(kind: impl Into<FlowKind>, index: u32) -> Self {
        Self::new(kind, FlowKey::Index(index))
    }

    pub fn parse(raw: &str) -> Result<Self, FlowIdParseError> {
        let err = || FlowIdParseError {
            raw: raw.to_string(),
        };
        let (kind, key) = raw.split_once(SEPARATOR).ok_or_else(err)?;
        if !is_valid_kind(kind.as_bytes()) {
            return Err(err());
        }
        let key = FlowKey::parse(key).ok_or_else(err)?;
        Ok(Self {
            kind: FlowKind::owned(kind),
            key,
        })
    }

    #[must_use]
    pub fn kind(&self) -> &FlowKind {
        &self.kind
    }

    #[must_use]
    pub fn key(&self) -> &FlowKey {
        &self.key
    }

    /// Total equality over every flow kind.
    #[must_use]
    pub fn is_equal(&self, other: &FlowId) -> bool {
        self == other
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.kind, self.key)
    }
}

impl TryFrom<String> for FlowId {
    type Error = FlowIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FlowId> for String {
    fn from(value: FlowId) -> Self {
        value.to_string()
    }
}

/// Anything that names a flow.
///
/// Implemented for [`FlowId`] itself and for every enum declared with
/// [`flow_set!`](crate::flow_set).
pub trait Flow {
    fn flow_id(&self) -> FlowId;
}

impl Flow for FlowId {
    fn flow_id(&self) -> FlowId {
        self.clone()
    }
}

impl<T: Flow + ?Sized> Flow for &T {
    fn flow_id(&self) -> FlowId {
        (**self).flow_id()
    }
}

/// Equality over the `Flow` supertype.
pub trait FlowExt: Flow {
    /// Compares identities; flows of different kinds are never equal.
    fn is_equal(&self, other: &dyn Flow) -> bool {
        self.flow_id() == other.flow_id()
    }
}

impl<T: Flow + ?Sized> FlowExt for T {}

/// Returned when converting a [`FlowId`] into a flow enum it does not belong to.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("flow {0} is not a member of {1}")]
pub struct ForeignFlow(pub FlowId, pub FlowKind);

/// Declares a closed set of flows.
///
/// Derives `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq` and `Hash` on the enum,
/// implements [`Flow`], `From<Enum> for FlowId`, `TryFrom<&FlowId>` and
/// `Display`. The kind tag is the enum name and each key is the variant name.
///
/// ```
/// switchyard_types::flow_set! {
///     pub enum AppFlow {
///         Login,
///         Dashboard,
///     }
/// }
///
/// use switchyard_types::{FlowExt, FlowId};
///
/// assert!(AppFlow::Login.is_equal(&AppFlow::Login));
/// assert_eq!(FlowId::from(AppFlow::Dashboard).to_string(), "AppFlow::Dashboard");
/// ```
///
/// Flows of different sets only compare through [`FlowExt::is_equal`]:
///
/// ```compile_fail,E0308
/// switchyard_types::flow_set! { enum Main { Login } }
/// switchyard_types::flow_set! { enum Side { Login } }
///
/// let _ = Main::Login == Side::Login;
/// ```
#[macro_export]
macro_rules! flow_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const KIND: $crate::FlowKind = $crate::FlowKind::new(stringify!($name));
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant) ),+
                }
            }
        }

        impl $crate::Flow for $name {
            fn flow_id(&self) -> $crate::FlowId {
                $crate::FlowId::named(Self::KIND, self.name())
            }
        }

        impl ::core::convert::From<$name> for $crate::FlowId {
            fn from(flow: $name) -> Self {
                $crate::Flow::flow_id(&flow)
            }
        }

        impl ::core::convert::TryFrom<&$crate::FlowId> for $name {
            type Error = $crate::ForeignFlow;

            fn try_from(id: &$crate::FlowId) -> ::core::result::Result<Self, Self::Error> {
                if *id.kind() == Self::KIND
                    && let Some(name) = id.key().as_name()
                    && let Some(flow) = Self::ALL.iter().copied().find(|f| f.name() == name)
                {
                    return Ok(flow);
                }
                Err($crate::ForeignFlow(id.clone(), Self::KIND))
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}
