use serde::{Deserialize, Serialize};

use crate::handle::TypeHandle;

/// Types the sink can write directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Char,
    Guid,
    Timestamp,
    Duration,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 15] = [
        PrimitiveKind::Bool,
        PrimitiveKind::I8,
        PrimitiveKind::U8,
        PrimitiveKind::I16,
        PrimitiveKind::U16,
        PrimitiveKind::I32,
        PrimitiveKind::U32,
        PrimitiveKind::I64,
        PrimitiveKind::U64,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
        PrimitiveKind::Char,
        PrimitiveKind::Guid,
        PrimitiveKind::Timestamp,
        PrimitiveKind::Duration,
    ];

    /// Builtin type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::Guid => "guid",
            Self::Timestamp => "timestamp",
            Self::Duration => "duration",
        }
    }

    /// Whether this kind can back an enum.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::U8 | Self::I16 | Self::U16 | Self::I32 | Self::U32 | Self::I64 | Self::U64
        )
    }
}

/// A named field of a struct or class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeHandle,
    /// Excluded from encoding regardless of its type.
    pub transient: bool,
}

impl FieldDef {
    /// Field `name` declared with type `ty`.
    pub fn new(name: impl Into<String>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            transient: false,
        }
    }

    /// Exclude this field from the stream.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

/// Structural shape of a registered type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// The open root type. An instance of exactly `object` has no fields.
    Object,
    Primitive(PrimitiveKind),
    String,
    Enum { underlying: PrimitiveKind },
    /// User value type: copied, written inline, no identity.
    Struct { fields: Vec<FieldDef> },
    /// User reference type.
    Class { fields: Vec<FieldDef> },
    Nullable(TypeHandle),
    KeyValuePair { key: TypeHandle, value: TypeHandle },
    Array { element: TypeHandle, rank: usize },
    /// Enumerable with a count. Non-generic collections use `object`.
    Collection { element: TypeHandle },
    Dictionary { key: TypeHandle, value: TypeHandle },
    /// Writes its own representation through [`SelfDescribing`](crate::SelfDescribing).
    SelfDescribing,
    /// Registered but without any serializable layout.
    Opaque,
}

impl TypeKind {
    /// Value types are copied and written inline; everything else is a
    /// reference type with identity.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            Self::Primitive(_)
                | Self::Enum { .. }
                | Self::Struct { .. }
                | Self::Nullable(_)
                | Self::KeyValuePair { .. }
        )
    }

    /// Declared fields of a class or struct.
    pub fn fields(&self) -> Option<&[FieldDef]> {
        match self {
            Self::Struct { fields } | Self::Class { fields } => Some(fields),
            _ => None,
        }
    }

    /// Short variant name for logs and errors.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Primitive(_) => "primitive",
            Self::String => "string",
            Self::Enum { .. } => "enum",
            Self::Struct { .. } => "struct",
            Self::Class { .. } => "class",
            Self::Nullable(_) => "nullable",
            Self::KeyValuePair { .. } => "key-value pair",
            Self::Array { .. } => "array",
            Self::Collection { .. } => "collection",
            Self::Dictionary { .. } => "dictionary",
            Self::SelfDescribing => "self-describing",
            Self::Opaque => "opaque",
        }
    }
}
