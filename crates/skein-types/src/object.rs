use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use skein_sink::{PrimitiveSink, SinkResult};

use crate::error::{TypeError, TypeResult};
use crate::handle::TypeHandle;
use crate::value::Value;

/// A type that writes its own representation.
///
/// The encoder measures how many bytes `save` produced and appends that
/// length after the body.
pub trait SelfDescribing: fmt::Debug {
    fn save(&self, sink: &mut dyn PrimitiveSink) -> SinkResult<()>;
}

/// Payload of a heap object. Which variant is valid depends on the
/// object's runtime type.
#[derive(Debug)]
pub enum Body {
    Str(String),
    /// Field values in declaration order.
    Fields(Vec<Value>),
    /// Elements flattened in row-major order.
    Array { lengths: Vec<usize>, items: Vec<Value> },
    Items(Vec<Value>),
    Entries(Vec<(Value, Value)>),
    /// A value type instance living in a reference slot.
    Boxed(Value),
    Custom(Box<dyn SelfDescribing>),
    Empty,
}

/// A heap object with a runtime type.
pub struct Object {
    ty: TypeHandle,
    body: RefCell<Body>,
}

/// Shared handle to an [`Object`].
///
/// Equality is identity: two handles are equal only if they point at the
/// same instance.
#[derive(Clone)]
pub struct ObjRef(Rc<Object>);

impl ObjRef {
    /// Allocate an instance of `ty`.
    pub fn new(ty: TypeHandle, body: Body) -> Self {
        Self(Rc::new(Object {
            ty,
            body: RefCell::new(body),
        }))
    }

    /// A string instance.
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(TypeHandle::STRING, Body::Str(value.into()))
    }

    /// A class instance with field values in declaration order.
    pub fn with_fields(ty: TypeHandle, fields: Vec<Value>) -> Self {
        Self::new(ty, Body::Fields(fields))
    }

    /// A value of type `ty` boxed into an object with identity.
    pub fn boxed(ty: TypeHandle, value: Value) -> Self {
        Self::new(ty, Body::Boxed(value))
    }

    /// One-dimensional array.
    pub fn vector(ty: TypeHandle, items: Vec<Value>) -> Self {
        Self::new(
            ty,
            Body::Array {
                lengths: vec![items.len()],
                items,
            },
        )
    }

    /// Multi-dimensional array with items in row-major order.
    pub fn array(ty: TypeHandle, lengths: Vec<usize>, items: Vec<Value>) -> Self {
        Self::new(ty, Body::Array { lengths, items })
    }

    /// Collection instance holding `items` in enumeration order.
    pub fn collection(ty: TypeHandle, items: Vec<Value>) -> Self {
        Self::new(ty, Body::Items(items))
    }

    /// Dictionary instance holding `entries` in enumeration order.
    pub fn dictionary(ty: TypeHandle, entries: Vec<(Value, Value)>) -> Self {
        Self::new(ty, Body::Entries(entries))
    }

    /// Instance of a self-describing type.
    pub fn custom(ty: TypeHandle, body: impl SelfDescribing + 'static) -> Self {
        Self::new(ty, Body::Custom(Box::new(body)))
    }

    /// Runtime type of the instance.
    pub fn ty(&self) -> TypeHandle {
        self.0.ty
    }

    /// Borrow the instance data.
    pub fn body(&self) -> Ref<'_, Body> {
        self.0.body.borrow()
    }

    /// Mutably borrow the instance data.
    pub fn body_mut(&self) -> RefMut<'_, Body> {
        self.0.body.borrow_mut()
    }

    /// Replace one field value. Used to tie cycles after construction.
    pub fn set_field(&self, index: usize, value: Value) -> TypeResult<()> {
        match &mut *self.body_mut() {
            Body::Fields(fields) => {
                let len = fields.len();
                let slot = fields
                    .get_mut(index)
                    .ok_or(TypeError::FieldOutOfRange { index, len })?;
                *slot = value;
                Ok(())
            }
            _ => Err(TypeError::NotFieldBearing(format!("{}", self.ty()))),
        }
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &ObjRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the instance, stable for as long as any handle lives.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for ObjRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjRef {}

// Only the header: bodies may point back at this object.
impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjRef({} @ {:#x})", self.ty(), self.addr())
    }
}
