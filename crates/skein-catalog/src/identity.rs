use std::collections::HashMap;

use skein_types::ObjRef;

use crate::error::{CatalogError, CatalogResult};
use crate::traits::{Identified, IdentityTracker};

/// Session-scoped identity map.
///
/// Every identified object is kept alive until the tracker is dropped, so
/// an address can never be reused by a different instance mid-session.
#[derive(Debug, Default)]
pub struct ObjectIdentifier {
    objects: Vec<ObjRef>,
    ids: HashMap<usize, i32>,
}

impl ObjectIdentifier {
    /// Create a tracker with no identified objects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id already assigned to `obj`, without assigning one.
    pub fn peek(&self, obj: &ObjRef) -> Option<i32> {
        self.ids.get(&obj.addr()).copied()
    }
}

impl IdentityTracker for ObjectIdentifier {
    fn identify(&mut self, obj: &ObjRef) -> CatalogResult<Identified> {
        if let Some(&id) = self.ids.get(&obj.addr()) {
            return Ok(Identified { id, first_seen: false });
        }
        let id = i32::try_from(self.objects.len())
            .map_err(|_| CatalogError::IdentityExhausted(self.objects.len()))?;
        self.objects.push(obj.clone());
        self.ids.insert(obj.addr(), id);
        Ok(Identified { id, first_seen: true })
    }

    fn object(&self, id: i32) -> Option<ObjRef> {
        usize::try_from(id).ok().and_then(|i| self.objects.get(i)).cloned()
    }

    fn len(&self) -> usize {
        self.objects.len()
    }
}
