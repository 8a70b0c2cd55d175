//! The graph encoder: runtime entry point of an encoding session.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, error, trace, warn};

use skein_catalog::{Identified, IdentityTracker, InMemoryTypeCatalog, ObjectIdentifier, TypeCatalog};
use skein_sink::PrimitiveSink;
use skein_types::{ObjRef, TypeHandle, TypeUniverse, Value};

use crate::classifier::{can_be_created_with_data_only, TypeClassifier};
use crate::compiler::{CompilerState, PlanCompiler};
use crate::config::EncoderConfig;
use crate::error::{EncodeError, EncodeResult};
use crate::plan::{PlanTable, SlotWriter};

type ObjectCallback<'s> = Box<dyn FnMut(&ObjRef) + 's>;
type NewTypeCallback<'s> = Box<dyn FnMut(TypeHandle, i32) + 's>;

/// Optional observers of a session.
#[derive(Default)]
pub struct SessionCallbacks<'s> {
    pre_serialization: Option<ObjectCallback<'s>>,
    post_serialization: Option<ObjectCallback<'s>>,
    new_type: Option<NewTypeCallback<'s>>,
}

impl<'s> SessionCallbacks<'s> {
    /// Callbacks that observe nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs before every object's data is written, ahead of its
    /// pre-write hooks.
    pub fn on_pre_serialization(mut self, f: impl FnMut(&ObjRef) + 's) -> Self {
        self.pre_serialization = Some(Box::new(f));
        self
    }

    /// Runs after every object's data and post-write hooks.
    pub fn on_post_serialization(mut self, f: impl FnMut(&ObjRef) + 's) -> Self {
        self.post_serialization = Some(Box::new(f));
        self
    }

    /// Runs once per type the first time it is cataloged in this session.
    pub fn on_new_type(mut self, f: impl FnMut(TypeHandle, i32) + 's) -> Self {
        self.new_type = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for SessionCallbacks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("pre_serialization", &self.pre_serialization.is_some())
            .field("post_serialization", &self.post_serialization.is_some())
            .field("new_type", &self.new_type.is_some())
            .finish()
    }
}

/// Writes object graphs to a [`PrimitiveSink`].
///
/// One encoder is one session: the type catalog, identity tracker, plan
/// table and the set of already-written objects are shared by every call
/// and discarded with the encoder. Any error poisons the session; further
/// calls fail with [`EncodeError::Poisoned`].
pub struct GraphEncoder<'s> {
    universe: &'s TypeUniverse,
    sink: &'s mut dyn PrimitiveSink,
    catalog: Box<dyn TypeCatalog + 's>,
    identity: Box<dyn IdentityTracker + 's>,
    classifier: TypeClassifier,
    compile_state: CompilerState,
    plans: PlanTable,
    /// Identity ids whose data is already in the stream.
    written: HashSet<i32>,
    next_pending: i32,
    depth: usize,
    announced: usize,
    config: EncoderConfig,
    callbacks: SessionCallbacks<'s>,
    poisoned: bool,
}

impl<'s> GraphEncoder<'s> {
    /// Start a session with default settings, an empty catalog and a
    /// fresh identity tracker.
    pub fn new(universe: &'s TypeUniverse, sink: &'s mut dyn PrimitiveSink) -> EncodeResult<Self> {
        Self::with_config(universe, sink, EncoderConfig::default())
    }

    /// Start a session with the given settings. Fails if `config` is
    /// invalid.
    pub fn with_config(
        universe: &'s TypeUniverse,
        sink: &'s mut dyn PrimitiveSink,
        config: EncoderConfig,
    ) -> EncodeResult<Self> {
        Self::with_parts(
            universe,
            sink,
            Box::new(InMemoryTypeCatalog::new()),
            Box::new(ObjectIdentifier::new()),
            config,
        )
    }

    /// Build a session over an existing catalog and identity tracker.
    /// Plans for every type already in the catalog are compiled here.
    pub fn with_parts(
        universe: &'s TypeUniverse,
        sink: &'s mut dyn PrimitiveSink,
        catalog: Box<dyn TypeCatalog + 's>,
        identity: Box<dyn IdentityTracker + 's>,
        config: EncoderConfig,
    ) -> EncodeResult<Self> {
        config.validate()?;
        let announced = catalog.len();
        let mut encoder = Self {
            universe,
            sink,
            catalog,
            identity,
            classifier: TypeClassifier::new(),
            compile_state: CompilerState::default(),
            plans: PlanTable::new(),
            written: HashSet::new(),
            next_pending: 0,
            depth: 0,
            announced,
            config,
            callbacks: SessionCallbacks::default(),
            poisoned: false,
        };
        encoder.regenerate()?;
        Ok(encoder)
    }

    /// Attach session callbacks.
    pub fn with_callbacks(mut self, callbacks: SessionCallbacks<'s>) -> Self {
        self.callbacks = callbacks;
        self
    }

    // ---------------------------------------------------------------
    // Public entry points
    // ---------------------------------------------------------------

    /// Encode the graph rooted at `root`.
    ///
    /// The root is written as a reference with the open formal type
    /// `object`. Unless disabled in the config, every identified object
    /// whose data was not inlined is then written as an object record,
    /// in identity order.
    pub fn encode(&mut self, root: &ObjRef) -> EncodeResult<()> {
        self.guarded(|enc| {
            let writer = enc.slot_writer(TypeHandle::OBJECT)?;
            writer(enc, &Value::Ref(root.clone()))?;
            if enc.config.drain_pending {
                enc.drain_pending()?;
            }
            Ok(())
        })
    }

    /// Write `obj` as an object record: its type id followed by its data.
    pub fn write_object(&mut self, obj: &ObjRef) -> EncodeResult<()> {
        self.guarded(|enc| enc.write_object_record(obj))
    }

    /// Write the identity id of `obj`, followed by its data if this is
    /// the first time its data is needed and its runtime type can be
    /// rebuilt from data alone.
    pub fn write_reference_body(&mut self, obj: &ObjRef) -> EncodeResult<()> {
        self.guarded(|enc| {
            let may_inline = enc.is_data_only(obj.ty());
            enc.write_identity(obj, may_inline)
        })
    }

    /// Write `value` as a slot declared with type `formal`.
    pub fn write_value(&mut self, formal: TypeHandle, value: &Value) -> EncodeResult<()> {
        self.guarded(|enc| {
            let writer = enc.slot_writer(formal)?;
            writer(enc, value)
        })
    }

    /// The current plan table, one slot per cataloged type.
    pub fn plan_table(&self) -> &PlanTable {
        &self.plans
    }

    /// The session's type catalog.
    pub fn catalog(&self) -> &dyn TypeCatalog {
        &*self.catalog
    }

    /// The session's identity tracker.
    pub fn identity(&self) -> &dyn IdentityTracker {
        &*self.identity
    }

    /// Settings this session was built with.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Whether the data of the object with identity `id` has been written.
    pub fn is_written(&self, id: i32) -> bool {
        self.written.contains(&id)
    }

    /// Whether an earlier call failed.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    // ---------------------------------------------------------------
    // Used by compiled plans
    // ---------------------------------------------------------------

    pub(crate) fn sink(&mut self) -> &mut dyn PrimitiveSink {
        &mut *self.sink
    }

    /// Catalog id of `ty`, compiling plans for any newly cataloged types.
    pub(crate) fn type_id_of(&mut self, ty: TypeHandle) -> EncodeResult<i32> {
        let id = self.catalog.index_of(ty)?;
        if self.plans.len() < self.catalog.len() {
            self.regenerate()?;
        }
        Ok(id)
    }

    pub(crate) fn is_transient(&mut self, ty: TypeHandle) -> bool {
        self.classifier.is_transient(self.universe, ty)
    }

    pub(crate) fn is_data_only(&self, ty: TypeHandle) -> bool {
        can_be_created_with_data_only(self.universe, ty)
    }

    /// Identity id, then the data when it may be inlined and has not been
    /// written yet.
    pub(crate) fn write_identity(&mut self, obj: &ObjRef, may_inline: bool) -> EncodeResult<()> {
        let Identified { id, first_seen } = self.identity.identify(obj)?;
        self.sink.write_i32(id)?;
        if may_inline && self.written.insert(id) {
            trace!(id, first_seen, ty = self.universe.name(obj.ty()), "inlining object data");
            self.write_data(obj)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> EncodeResult<T>) -> EncodeResult<T> {
        if self.poisoned {
            warn!("encoder reused after a failure");
            return Err(EncodeError::Poisoned);
        }
        let result = op(self);
        if let Err(e) = &result {
            self.poisoned = true;
            error!(error = %e, "encoding failed, session poisoned");
        }
        result
    }

    fn write_object_record(&mut self, obj: &ObjRef) -> EncodeResult<()> {
        let type_id = self.type_id_of(obj.ty())?;
        self.sink.write_i32(type_id)?;
        self.write_data(obj)
    }

    /// Run the plan for `obj`'s runtime type, wrapped in session callbacks.
    fn write_data(&mut self, obj: &ObjRef) -> EncodeResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(EncodeError::DepthExceeded(self.config.max_depth));
        }
        let type_id = self.type_id_of(obj.ty())?;
        // Re-fetched on every call: recursion may have grown the table.
        let Some(plan) = self.plans.get(type_id)? else {
            return Ok(());
        };
        if let Some(callback) = self.callbacks.pre_serialization.as_mut() {
            callback(obj);
        }
        self.depth += 1;
        let result = plan.invoke(self, obj);
        self.depth -= 1;
        result?;
        if let Some(callback) = self.callbacks.post_serialization.as_mut() {
            callback(obj);
        }
        trace!(type_id, plan = plan.label(), "wrote object data");
        Ok(())
    }

    /// Write every identified object whose data is not in the stream yet.
    fn drain_pending(&mut self) -> EncodeResult<()> {
        while let Some(obj) = self.identity.object(self.next_pending) {
            let id = self.next_pending;
            self.next_pending += 1;
            if self.written.insert(id) {
                trace!(id, "writing pending object");
                self.write_object_record(&obj)?;
            }
        }
        Ok(())
    }

    /// Slot writer for `formal`; compiling it may catalog new types.
    fn slot_writer(&mut self, formal: TypeHandle) -> EncodeResult<SlotWriter> {
        let writer = {
            let mut compiler =
                PlanCompiler::new(self.universe, &mut *self.catalog, &mut self.classifier, &mut self.compile_state);
            compiler.slot_writer(formal)?
        };
        self.regenerate()?;
        Ok(writer)
    }

    /// Bring the plan table up to the catalog's size.
    fn regenerate(&mut self) -> EncodeResult<()> {
        if self.plans.len() >= self.catalog.len() {
            return Ok(());
        }
        let before = self.plans.len();
        let table = {
            let mut compiler =
                PlanCompiler::new(self.universe, &mut *self.catalog, &mut self.classifier, &mut self.compile_state);
            self.plans.grow(&mut compiler)?
        };
        self.plans = table;
        debug!(
            from = before,
            to = self.plans.len(),
            writers = self.compile_state.cached_writers(),
            "regenerated plan table"
        );
        self.announce_new_types();
        Ok(())
    }

    fn announce_new_types(&mut self) {
        while self.announced < self.catalog.len() {
            let id = self.announced as i32;
            if let (Some(ty), Some(callback)) = (self.catalog.type_at(id), self.callbacks.new_type.as_mut()) {
                callback(ty, id);
            }
            self.announced += 1;
        }
    }
}

impl fmt::Debug for GraphEncoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphEncoder")
            .field("types", &self.catalog.len())
            .field("objects", &self.identity.len())
            .field("plans", &self.plans.len())
            .field("depth", &self.depth)
            .field("config", &self.config)
            .field("callbacks", &self.callbacks)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
