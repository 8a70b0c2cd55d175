//! The registry of every type the encoder can meet at run time.
//!
//! Built-ins are registered on construction. Structural types (arrays,
//! nullables, pairs, generic collections) are interned, so asking for the
//! same shape twice yields the same handle. Nominal types (classes,
//! structs, enums, ...) are declared by name first and given fields
//! afterwards, which lets a type refer to itself.

use std::collections::HashMap;

use crate::error::{TypeError, TypeResult};
use crate::handle::TypeHandle;
use crate::hooks::{HookKind, HookMember};
use crate::kind::{FieldDef, PrimitiveKind, TypeKind};

/// Definition of one registered type.
#[derive(Clone, Debug)]
pub struct TypeDef {
    name: String,
    kind: TypeKind,
    transient: bool,
    sealed: bool,
    pre_write: Vec<HookMember>,
    post_write: Vec<HookMember>,
}

impl TypeDef {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        // Value types, strings and arrays can never be subclassed.
        let sealed = kind.is_value() || matches!(kind, TypeKind::String | TypeKind::Array { .. });
        Self {
            name: name.into(),
            kind,
            transient: false,
            sealed,
            pre_write: Vec::new(),
            post_write: Vec::new(),
        }
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural shape.
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Carries the exclusion marker.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// A slot declared with this type always holds exactly this type.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Copied and written inline, without identity.
    pub fn is_value(&self) -> bool {
        self.kind.is_value()
    }

    /// Hooks of the given category, in registration order.
    pub fn hooks(&self, kind: HookKind) -> &[HookMember] {
        match kind {
            HookKind::PreWrite => &self.pre_write,
            HookKind::PostWrite => &self.post_write,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ShapeKey {
    Array(TypeHandle, usize),
    Nullable(TypeHandle),
    Pair(TypeHandle, TypeHandle),
    List(TypeHandle),
    Dictionary(TypeHandle, TypeHandle),
}

/// Append-only registry of type definitions.
#[derive(Clone, Debug)]
pub struct TypeUniverse {
    defs: Vec<TypeDef>,
    shapes: HashMap<ShapeKey, TypeHandle>,
    names: HashMap<String, TypeHandle>,
}

impl TypeUniverse {
    /// Create a universe holding only the builtin types.
    pub fn new() -> Self {
        let mut universe = Self {
            defs: Vec::new(),
            shapes: HashMap::new(),
            names: HashMap::new(),
        };
        universe.push(TypeDef::new("object", TypeKind::Object));
        universe.push(TypeDef::new("string", TypeKind::String));
        for kind in PrimitiveKind::ALL {
            universe.push(TypeDef::new(kind.name(), TypeKind::Primitive(kind)));
        }
        universe
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Never true: the builtins are always registered.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Definition of `ty`.
    pub fn get(&self, ty: TypeHandle) -> TypeResult<&TypeDef> {
        self.defs.get(ty.index()).ok_or(TypeError::UnknownType(ty))
    }

    /// Name of `ty`, or `<unknown>` for a foreign handle.
    pub fn name(&self, ty: TypeHandle) -> &str {
        self.defs.get(ty.index()).map_or("<unknown>", |d| d.name.as_str())
    }

    /// Look up a registered type by name.
    pub fn by_name(&self, name: &str) -> Option<TypeHandle> {
        self.names.get(name).copied()
    }

    /// The open root type.
    pub fn object(&self) -> TypeHandle {
        TypeHandle::OBJECT
    }

    /// The builtin string type.
    pub fn string(&self) -> TypeHandle {
        TypeHandle::STRING
    }

    /// The builtin handle for `kind`.
    pub fn primitive(&self, kind: PrimitiveKind) -> TypeHandle {
        TypeHandle::primitive(kind)
    }

    // ---------------------------------------------------------------
    // Structural types
    // ---------------------------------------------------------------

    /// Array of `element` with `rank` dimensions. Interned.
    pub fn array_of(&mut self, element: TypeHandle, rank: usize) -> TypeResult<TypeHandle> {
        if rank == 0 {
            return Err(TypeError::InvalidRank(rank));
        }
        self.get(element)?;
        let commas = ",".repeat(rank - 1);
        let name = format!("{}[{commas}]", self.name(element));
        Ok(self.intern(ShapeKey::Array(element, rank), name, TypeKind::Array { element, rank }))
    }

    /// Optional wrapper around a non-nullable value type. Interned.
    pub fn nullable_of(&mut self, underlying: TypeHandle) -> TypeResult<TypeHandle> {
        let def = self.get(underlying)?;
        if !def.is_value() || matches!(def.kind, TypeKind::Nullable(_)) {
            return Err(TypeError::InvalidNullable(def.name.clone()));
        }
        let name = format!("Nullable<{}>", def.name);
        Ok(self.intern(ShapeKey::Nullable(underlying), name, TypeKind::Nullable(underlying)))
    }

    /// Key/value pair struct. Interned.
    pub fn key_value_of(&mut self, key: TypeHandle, value: TypeHandle) -> TypeResult<TypeHandle> {
        self.get(key)?;
        self.get(value)?;
        let name = format!("KeyValuePair<{},{}>", self.name(key), self.name(value));
        Ok(self.intern(ShapeKey::Pair(key, value), name, TypeKind::KeyValuePair { key, value }))
    }

    /// Generic growable list of `element`.
    pub fn list_of(&mut self, element: TypeHandle) -> TypeResult<TypeHandle> {
        self.get(element)?;
        let name = format!("List<{}>", self.name(element));
        Ok(self.intern(ShapeKey::List(element), name, TypeKind::Collection { element }))
    }

    /// Generic dictionary from `key` to `value`.
    pub fn dictionary_of(&mut self, key: TypeHandle, value: TypeHandle) -> TypeResult<TypeHandle> {
        self.get(key)?;
        self.get(value)?;
        let name = format!("Dictionary<{},{}>", self.name(key), self.name(value));
        Ok(self.intern(
            ShapeKey::Dictionary(key, value),
            name,
            TypeKind::Dictionary { key, value },
        ))
    }

    /// Non-generic collection of `object`.
    pub fn collection(&mut self) -> TypeHandle {
        self.intern(
            ShapeKey::List(TypeHandle::OBJECT),
            "List<object>".to_string(),
            TypeKind::Collection { element: TypeHandle::OBJECT },
        )
    }

    /// Non-generic dictionary of `object` to `object`.
    pub fn dictionary(&mut self) -> TypeHandle {
        let key = ShapeKey::Dictionary(TypeHandle::OBJECT, TypeHandle::OBJECT);
        self.intern(
            key,
            "Dictionary<object,object>".to_string(),
            TypeKind::Dictionary { key: TypeHandle::OBJECT, value: TypeHandle::OBJECT },
        )
    }

    // ---------------------------------------------------------------
    // Nominal types
    // ---------------------------------------------------------------

    /// Register a reference type; fields come later via
    /// [`define_fields`](Self::define_fields).
    pub fn declare_class(&mut self, name: &str) -> TypeResult<TypeHandle> {
        self.declare(name, TypeKind::Class { fields: Vec::new() })
    }

    /// Register a value type; fields come later via
    /// [`define_fields`](Self::define_fields).
    pub fn declare_struct(&mut self, name: &str) -> TypeResult<TypeHandle> {
        self.declare(name, TypeKind::Struct { fields: Vec::new() })
    }

    /// Register an enum written as its integer `underlying` value.
    pub fn declare_enum(&mut self, name: &str, underlying: PrimitiveKind) -> TypeResult<TypeHandle> {
        if !underlying.is_integer() {
            return Err(TypeError::InvalidEnumUnderlying(underlying.name()));
        }
        self.declare(name, TypeKind::Enum { underlying })
    }

    /// User collection type with its own name (e.g. a subclassable list).
    pub fn declare_collection(&mut self, name: &str, element: TypeHandle) -> TypeResult<TypeHandle> {
        self.get(element)?;
        self.declare(name, TypeKind::Collection { element })
    }

    /// User dictionary type with its own name.
    pub fn declare_dictionary(
        &mut self,
        name: &str,
        key: TypeHandle,
        value: TypeHandle,
    ) -> TypeResult<TypeHandle> {
        self.get(key)?;
        self.get(value)?;
        self.declare(name, TypeKind::Dictionary { key, value })
    }

    /// Register a type that writes its own bytes.
    pub fn declare_self_describing(&mut self, name: &str) -> TypeResult<TypeHandle> {
        self.declare(name, TypeKind::SelfDescribing)
    }

    /// Register a type with no serializable layout.
    pub fn declare_opaque(&mut self, name: &str) -> TypeResult<TypeHandle> {
        self.declare(name, TypeKind::Opaque)
    }

    /// Set the fields of a declared class or struct, in declaration order.
    pub fn define_fields(&mut self, ty: TypeHandle, fields: Vec<FieldDef>) -> TypeResult<()> {
        for field in &fields {
            self.get(field.ty)?;
        }
        let def = self.get_mut(ty)?;
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(TypeError::DuplicateField {
                    ty: def.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        match &mut def.kind {
            TypeKind::Class { fields: slot } | TypeKind::Struct { fields: slot } => {
                *slot = fields;
                Ok(())
            }
            _ => Err(TypeError::NotFieldBearing(def.name.clone())),
        }
    }

    // ---------------------------------------------------------------
    // Markers and hooks
    // ---------------------------------------------------------------

    /// Exclude every instance and slot of `ty` from the stream.
    pub fn mark_transient(&mut self, ty: TypeHandle) -> TypeResult<()> {
        self.get_mut(ty)?.transient = true;
        Ok(())
    }

    /// Declare that no subtype of `ty` exists. `object` stays open.
    pub fn mark_sealed(&mut self, ty: TypeHandle) -> TypeResult<()> {
        if ty == TypeHandle::OBJECT {
            return Ok(());
        }
        self.get_mut(ty)?.sealed = true;
        Ok(())
    }

    /// Append a pre-write or post-write hook to `ty`.
    pub fn add_hook(&mut self, ty: TypeHandle, kind: HookKind, hook: HookMember) -> TypeResult<()> {
        let def = self.get_mut(ty)?;
        match kind {
            HookKind::PreWrite => def.pre_write.push(hook),
            HookKind::PostWrite => def.post_write.push(hook),
        }
        Ok(())
    }

    /// Hooks of the given category, in registration order.
    pub fn hooks(&self, ty: TypeHandle, kind: HookKind) -> &[HookMember] {
        self.defs.get(ty.index()).map_or(&[], |d| d.hooks(kind))
    }

    fn declare(&mut self, name: &str, kind: TypeKind) -> TypeResult<TypeHandle> {
        if self.names.contains_key(name) {
            return Err(TypeError::DuplicateName(name.to_string()));
        }
        Ok(self.push(TypeDef::new(name, kind)))
    }

    fn intern(&mut self, key: ShapeKey, name: String, kind: TypeKind) -> TypeHandle {
        if let Some(&ty) = self.shapes.get(&key) {
            return ty;
        }
        let ty = self.push(TypeDef::new(name, kind));
        self.shapes.insert(key, ty);
        ty
    }

    fn push(&mut self, def: TypeDef) -> TypeHandle {
        let ty = TypeHandle::new(self.defs.len() as u32);
        self.names.entry(def.name.clone()).or_insert(ty);
        self.defs.push(def);
        ty
    }

    fn get_mut(&mut self, ty: TypeHandle) -> TypeResult<&mut TypeDef> {
        self.defs.get_mut(ty.index()).ok_or(TypeError::UnknownType(ty))
    }
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_match_fixed_handles() {
        let u = TypeUniverse::new();
        assert_eq!(u.get(TypeHandle::OBJECT).unwrap().kind(), &TypeKind::Object);
        assert_eq!(u.get(TypeHandle::STRING).unwrap().kind(), &TypeKind::String);
        for kind in PrimitiveKind::ALL {
            let def = u.get(TypeHandle::primitive(kind)).unwrap();
            assert_eq!(def.kind(), &TypeKind::Primitive(kind));
        }
        assert_eq!(u.len(), 2 + PrimitiveKind::ALL.len());
    }

    #[test]
    fn object_is_open_string_is_sealed() {
        let u = TypeUniverse::new();
        assert!(!u.get(u.object()).unwrap().is_sealed());
        assert!(u.get(u.string()).unwrap().is_sealed());
    }

    #[test]
    fn structural_types_are_interned() {
        let mut u = TypeUniverse::new();
        let i32_ty = u.primitive(PrimitiveKind::I32);
        let a = u.array_of(i32_ty, 2).unwrap();
        let b = u.array_of(i32_ty, 2).unwrap();
        let c = u.array_of(i32_ty, 1).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(u.name(a), "i32[,]");
        assert_eq!(u.name(c), "i32[]");
        assert!(u.get(a).unwrap().is_sealed());
    }

    #[test]
    fn zero_rank_rejected() {
        let mut u = TypeUniverse::new();
        assert_eq!(u.array_of(u.object(), 0), Err(TypeError::InvalidRank(0)));
    }

    #[test]
    fn nullable_requires_value_type() {
        let mut u = TypeUniverse::new();
        let n = u.nullable_of(u.primitive(PrimitiveKind::I32)).unwrap();
        assert_eq!(u.name(n), "Nullable<i32>");
        assert!(matches!(u.nullable_of(u.string()), Err(TypeError::InvalidNullable(_))));
        assert!(matches!(u.nullable_of(n), Err(TypeError::InvalidNullable(_))));
    }

    #[test]
    fn self_referential_class() {
        let mut u = TypeUniverse::new();
        let node = u.declare_class("Node").unwrap();
        u.define_fields(
            node,
            vec![FieldDef::new("next", node), FieldDef::new("name", u.string())],
        )
        .unwrap();
        let fields = u.get(node).unwrap().kind().fields().unwrap();
        assert_eq!(fields[0].ty, node);
        assert_eq!(u.by_name("Node"), Some(node));
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut u = TypeUniverse::new();
        u.declare_class("A").unwrap();
        assert_eq!(u.declare_struct("A"), Err(TypeError::DuplicateName("A".into())));
    }

    #[test]
    fn duplicate_fields_rejected() {
        let mut u = TypeUniverse::new();
        let s = u.declare_struct("P").unwrap();
        let i = u.primitive(PrimitiveKind::I32);
        let err = u
            .define_fields(s, vec![FieldDef::new("x", i), FieldDef::new("x", i)])
            .unwrap_err();
        assert!(matches!(err, TypeError::DuplicateField { .. }));
    }

    #[test]
    fn fields_only_on_classes_and_structs() {
        let mut u = TypeUniverse::new();
        let e = u.declare_enum("Color", PrimitiveKind::U8).unwrap();
        assert!(matches!(u.define_fields(e, vec![]), Err(TypeError::NotFieldBearing(_))));
    }

    #[test]
    fn enum_needs_integer_underlying() {
        let mut u = TypeUniverse::new();
        assert_eq!(
            u.declare_enum("Bad", PrimitiveKind::F64),
            Err(TypeError::InvalidEnumUnderlying("f64"))
        );
    }

    #[test]
    fn markers() {
        let mut u = TypeUniverse::new();
        let c = u.declare_class("Cache").unwrap();
        assert!(!u.get(c).unwrap().is_sealed());
        u.mark_transient(c).unwrap();
        u.mark_sealed(c).unwrap();
        let def = u.get(c).unwrap();
        assert!(def.is_transient());
        assert!(def.is_sealed());

        u.mark_sealed(TypeHandle::OBJECT).unwrap();
        assert!(!u.get(TypeHandle::OBJECT).unwrap().is_sealed());
    }

    #[test]
    fn hooks_keep_registration_order() {
        let mut u = TypeUniverse::new();
        let c = u.declare_class("Hooked").unwrap();
        u.add_hook(c, HookKind::PreWrite, HookMember::stateless("first", || {})).unwrap();
        u.add_hook(c, HookKind::PreWrite, HookMember::stateless("second", || {})).unwrap();
        let names: Vec<_> = u.hooks(c, HookKind::PreWrite).iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
        assert!(u.hooks(c, HookKind::PostWrite).is_empty());
    }

    #[test]
    fn unknown_handle() {
        let u = TypeUniverse::new();
        let bogus = TypeHandle::new(999);
        assert_eq!(u.get(bogus).unwrap_err(), TypeError::UnknownType(bogus));
        assert_eq!(u.name(bogus), "<unknown>");
    }
}
