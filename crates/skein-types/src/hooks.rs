use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::object::ObjRef;

/// When a lifecycle hook runs relative to an object's encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    PreWrite,
    PostWrite,
}

/// Callable body of a hook. Instance hooks receive the object being
/// encoded, static hooks receive `None`.
pub type HookFn = Rc<dyn Fn(Option<&ObjRef>)>;

/// A registered lifecycle hook.
///
/// `params` is the declared parameter count. Only zero (static) and one
/// (instance) are accepted by the encoder; anything else is rejected when
/// the owning type's plan is compiled.
#[derive(Clone)]
pub struct HookMember {
    pub name: String,
    pub params: usize,
    call: HookFn,
}

impl HookMember {
    /// A hook that takes no arguments.
    pub fn stateless(name: impl Into<String>, f: impl Fn() + 'static) -> Self {
        Self {
            name: name.into(),
            params: 0,
            call: Rc::new(move |_| f()),
        }
    }

    /// A hook that receives the instance being encoded.
    pub fn instance(name: impl Into<String>, f: impl Fn(&ObjRef) + 'static) -> Self {
        Self {
            name: name.into(),
            params: 1,
            call: Rc::new(move |obj| {
                if let Some(obj) = obj {
                    f(obj)
                }
            }),
        }
    }

    /// A hook with an arbitrary declared parameter count, as discovered.
    pub fn with_params(name: impl Into<String>, params: usize, call: HookFn) -> Self {
        Self {
            name: name.into(),
            params,
            call,
        }
    }

    /// Static hooks take no instance.
    pub fn is_static(&self) -> bool {
        self.params == 0
    }

    /// Call the hook, passing `instance` unless it is static.
    pub fn invoke(&self, instance: &ObjRef) {
        if self.is_static() {
            (self.call)(None)
        } else {
            (self.call)(Some(instance))
        }
    }
}

impl fmt::Debug for HookMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookMember")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::handle::TypeHandle;
    use crate::object::Body;

    #[test]
    fn instance_hook_sees_object() {
        let seen = Rc::new(Cell::new(false));
        let flag = Rc::clone(&seen);
        let hook = HookMember::instance("before", move |obj| {
            flag.set(obj.ty() == TypeHandle::OBJECT);
        });
        hook.invoke(&ObjRef::new(TypeHandle::OBJECT, Body::Empty));
        assert!(seen.get());
        assert!(!hook.is_static());
    }

    #[test]
    fn stateless_hook_runs() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let hook = HookMember::stateless("tick", move || c.set(c.get() + 1));
        let obj = ObjRef::new(TypeHandle::OBJECT, Body::Empty);
        hook.invoke(&obj);
        hook.invoke(&obj);
        assert_eq!(count.get(), 2);
        assert!(hook.is_static());
    }

    #[test]
    fn debug_omits_body() {
        let hook = HookMember::stateless("noop", || {});
        let debug = format!("{hook:?}");
        assert!(debug.contains("noop"));
        assert!(debug.contains("params"));
    }
}
