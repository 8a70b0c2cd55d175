use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::object::ObjRef;

/// Contents of a slot: a field, an array element, a collection item.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Guid(Uuid),
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
    /// Enum discriminant; narrowed to the enum's underlying type on write.
    Enum(i64),
    Struct(StructValue),
    Nullable(Option<Box<Value>>),
    Pair(Box<Value>, Box<Value>),
    Ref(ObjRef),
}

/// Inline value-type instance. Fields are in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    pub fields: Vec<Value>,
}

impl StructValue {
    /// Field values in declaration order.
    pub fn new(fields: Vec<Value>) -> Self {
        Self { fields }
    }
}

impl Value {
    /// A present nullable value.
    pub fn some(value: Value) -> Self {
        Value::Nullable(Some(Box::new(value)))
    }

    /// An absent nullable value.
    pub fn none() -> Self {
        Value::Nullable(None)
    }

    /// A key/value pair.
    pub fn pair(key: Value, value: Value) -> Self {
        Value::Pair(Box::new(key), Box::new(value))
    }

    /// Whether this is a null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The referenced object, if any.
    pub fn as_obj(&self) -> Option<&ObjRef> {
        match self {
            Value::Ref(obj) => Some(obj),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Char(_) => "char",
            Value::Guid(_) => "guid",
            Value::Timestamp(_) => "timestamp",
            Value::Duration(_) => "duration",
            Value::Enum(_) => "enum",
            Value::Struct(_) => "struct",
            Value::Nullable(_) => "nullable",
            Value::Pair(..) => "pair",
            Value::Ref(_) => "reference",
        }
    }
}

macro_rules! from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

from_primitive! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    Uuid => Guid,
    DateTime<Utc> => Timestamp,
    TimeDelta => Duration,
    StructValue => Struct,
}

impl From<ObjRef> for Value {
    fn from(obj: ObjRef) -> Self {
        Value::Ref(obj)
    }
}

impl From<Option<ObjRef>> for Value {
    fn from(obj: Option<ObjRef>) -> Self {
        obj.map_or(Value::Null, Value::Ref)
    }
}
