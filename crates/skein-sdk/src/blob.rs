use std::fmt;

use serde::Serialize;

use skein_sink::{PrimitiveSink, SinkError, SinkResult};
use skein_types::{ObjRef, SelfDescribing, TypeHandle};

/// Writes any serde-serializable value as one bincode byte array.
///
/// Register a self-describing type for it in the universe and wrap
/// instances with [`BincodeBlob::into_object`].
#[derive(Clone, PartialEq)]
pub struct BincodeBlob<T>(pub T);

impl<T: Serialize + fmt::Debug + 'static> BincodeBlob<T> {
    /// Wrap as an instance of the self-describing type `ty`.
    pub fn into_object(self, ty: TypeHandle) -> ObjRef {
        ObjRef::custom(ty, self)
    }
}

impl<T: fmt::Debug> fmt::Debug for BincodeBlob<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BincodeBlob").field(&self.0).finish()
    }
}

impl<T: Serialize + fmt::Debug> SelfDescribing for BincodeBlob<T> {
    fn save(&self, sink: &mut dyn PrimitiveSink) -> SinkResult<()> {
        let bytes = bincode::serialize(&self.0).map_err(|e| SinkError::Payload(e.to_string()))?;
        sink.write_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use skein_sink::{RecordingSink, Written};

    #[derive(Debug, Serialize)]
    struct Settings {
        name: String,
        retries: u8,
    }

    #[test]
    fn saves_bincode_bytes() {
        let settings = Settings {
            name: "a".into(),
            retries: 3,
        };
        let expected = bincode::serialize(&settings).unwrap();
        let mut sink = RecordingSink::new();
        BincodeBlob(settings).save(&mut sink).unwrap();
        assert_eq!(sink.log(), &[Written::Bytes(expected)]);
    }
}
