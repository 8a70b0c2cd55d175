use std::io::Write;

use tracing::debug;

use skein_catalog::{InMemoryTypeCatalog, ObjectIdentifier};
use skein_encoder::{EncoderConfig, GraphEncoder};
use skein_sink::{PrimitiveSink, PrimitiveWriter};
use skein_types::{ObjRef, TypeHandle, TypeUniverse};

use crate::config::load_config;
use crate::error::SdkResult;

/// Entry point for applications embedding skein.
///
/// Owns the type universe and the session settings. Each call to
/// [`serialize`](Skein::serialize) is an independent session; use
/// [`session`](Skein::session) to write several roots into one stream
/// with shared identity.
#[derive(Debug)]
pub struct Skein {
    universe: TypeUniverse,
    config: EncoderConfig,
    known_types: Vec<TypeHandle>,
}

impl Skein {
    /// Wrap `universe` with default settings and no known types.
    pub fn new(universe: TypeUniverse) -> Self {
        Self {
            universe,
            config: EncoderConfig::default(),
            known_types: Vec::new(),
        }
    }

    /// Wrap `universe` with explicit settings, validated up front.
    pub fn with_config(universe: TypeUniverse, config: EncoderConfig) -> SdkResult<Self> {
        config.validate()?;
        Ok(Self {
            universe,
            config,
            known_types: Vec::new(),
        })
    }

    /// Settings come from a TOML file.
    pub fn from_config_file(universe: TypeUniverse, path: impl AsRef<std::path::Path>) -> SdkResult<Self> {
        let config = load_config(path)?;
        Self::with_config(universe, config)
    }

    /// Types every session starts with, in id order. A reader that
    /// shares this list needs no type records for them.
    pub fn with_known_types(mut self, types: impl IntoIterator<Item = TypeHandle>) -> Self {
        self.known_types = types.into_iter().collect();
        self
    }

    /// The registered types.
    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    /// Session settings.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// A byte writer with the configured integer encoding and buffer size.
    pub fn writer<W: Write>(&self, inner: W) -> PrimitiveWriter<W> {
        PrimitiveWriter::with_options(inner, self.config.int_encoding, self.config.buffer_capacity)
    }

    /// Start a session writing to `sink`.
    pub fn session<'s>(&'s self, sink: &'s mut dyn PrimitiveSink) -> SdkResult<GraphEncoder<'s>> {
        let catalog = InMemoryTypeCatalog::seeded(self.known_types.iter().copied())?;
        let encoder = GraphEncoder::with_parts(
            &self.universe,
            sink,
            Box::new(catalog),
            Box::new(ObjectIdentifier::new()),
            self.config.clone(),
        )?;
        Ok(encoder)
    }

    /// Encode the graph rooted at `root` into a fresh buffer.
    pub fn serialize(&self, root: &ObjRef) -> SdkResult<Vec<u8>> {
        self.serialize_to(root, Vec::new())
    }

    /// Encode the graph rooted at `root` into `out`, returning it flushed.
    pub fn serialize_to<W: Write>(&self, root: &ObjRef, out: W) -> SdkResult<W> {
        let mut writer = self.writer(out);
        let (types, objects) = {
            let mut session = self.session(&mut writer)?;
            session.encode(root)?;
            (session.catalog().len(), session.identity().len())
        };
        let bytes = writer.position();
        let out = writer.into_inner()?;
        debug!(bytes, types, objects, "serialized graph");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BincodeBlob;
    use crate::error::SdkError;
    use skein_encoder::EncodeError;
    use skein_sink::IntEncoding;
    use skein_types::{FieldDef, Value};

    fn node_skein() -> (Skein, TypeHandle) {
        let mut u = TypeUniverse::new();
        let node = u.declare_class("Node").unwrap();
        let string = u.string();
        u.define_fields(node, vec![FieldDef::new("next", node), FieldDef::new("name", string)])
            .unwrap();
        (Skein::new(u), node)
    }

    fn self_node(ty: TypeHandle) -> ObjRef {
        let node = ObjRef::with_fields(ty, vec![Value::Null, ObjRef::string("A").into()]);
        node.set_field(0, Value::Ref(node.clone())).unwrap();
        node
    }

    fn le(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn serialize_self_node_bytes() {
        let (skein, node) = node_skein();
        let bytes = skein.serialize(&self_node(node)).unwrap();

        let mut expected = le(&[0, 0, 1, 1, 1]);
        expected.push(b'A');
        expected.extend(le(&[0, 0]));
        assert_eq!(bytes, expected);
    }

    #[test]
    fn known_types_fix_ids() {
        let (skein, node) = node_skein();
        let string = skein.universe().string();
        let skein = skein.with_known_types([string, node]);
        let bytes = skein.serialize(&self_node(node)).unwrap();
        assert_eq!(&bytes[..8], &le(&[1, 0])[..]);
    }

    #[test]
    fn varint_is_smaller() {
        let (fixed, node) = node_skein();
        let root = self_node(node);
        let config = EncoderConfig {
            int_encoding: IntEncoding::Varint,
            ..EncoderConfig::default()
        };
        let varint = Skein::with_config(fixed.universe().clone(), config).unwrap();
        assert!(varint.serialize(&root).unwrap().len() < fixed.serialize(&root).unwrap().len());
    }

    #[test]
    fn serialize_is_repeatable() {
        let (skein, node) = node_skein();
        let root = self_node(node);
        assert_eq!(skein.serialize(&root).unwrap(), skein.serialize(&root).unwrap());
    }

    #[test]
    fn serialize_to_file() {
        let (skein, node) = node_skein();
        let root = self_node(node);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");

        let file = std::fs::File::create(&path).unwrap();
        skein.serialize_to(&root, file).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), skein.serialize(&root).unwrap());
    }

    #[test]
    fn from_config_file_applies_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skein.toml");
        std::fs::write(&path, "buffer_capacity = 128\n").unwrap();
        let skein = Skein::from_config_file(TypeUniverse::new(), &path).unwrap();
        assert_eq!(skein.config().buffer_capacity, 128);
    }

    #[test]
    fn one_session_many_roots() {
        let (skein, node) = node_skein();
        let shared = ObjRef::string("s");
        let a = ObjRef::with_fields(node, vec![Value::Null, shared.clone().into()]);
        let b = ObjRef::with_fields(node, vec![Value::Null, shared.into()]);

        let mut writer = skein.writer(Vec::new());
        {
            let mut session = skein.session(&mut writer).unwrap();
            session.encode(&a).unwrap();
            session.encode(&b).unwrap();
            assert_eq!(session.identity().len(), 3);
        }
        let bytes = writer.into_inner().unwrap();
        assert_eq!(bytes.iter().filter(|b| **b == b's').count(), 1);
    }

    #[test]
    fn blob_objects_round_through_the_encoder() {
        let mut u = TypeUniverse::new();
        let blob_ty = u.declare_self_describing("Blob").unwrap();
        let skein = Skein::new(u);
        let root = BincodeBlob(vec![1u16, 2, 3]).into_object(blob_ty);

        let payload = bincode::serialize(&vec![1u16, 2, 3]).unwrap();
        let mut expected = le(&[0, 0, payload.len() as i32]);
        expected.extend(&payload);
        expected.extend((4 + payload.len() as i64).to_le_bytes());
        assert_eq!(skein.serialize(&root).unwrap(), expected);
    }

    #[test]
    fn encode_failures_surface_as_sdk_errors() {
        let mut u = TypeUniverse::new();
        let opaque = u.declare_opaque("Handle").unwrap();
        let skein = Skein::new(u);
        let err = skein.serialize(&ObjRef::new(opaque, skein_types::Body::Empty)).unwrap_err();
        assert!(matches!(err, SdkError::Encode(EncodeError::Unclassifiable { .. })));
    }
}
