use linked_hash_map::LinkedHashMap;
use std::any::Any;

use super::{Node, Value};
use crate::error::Error;

/// Host-supplied access to cross-file reference resolution.
///
/// The core never follows a PPtr or opens another bundle itself; it only
/// needs to ask the host "what schema node describes this reference type"
/// and, separately, to carry the host's file context through to instance
/// construction for `PPtr` nodes.
pub trait AssetFile {
    /// Resolves a `(class, namespace, assembly)` triple to the schema node
    /// describing that reference type, as recorded in the asset file's
    /// out-of-band type table. Returns `None` on a lookup miss, which the
    /// caller turns into a [`Error::Resolution`].
    fn resolve_ref_type(&self, class: &str, namespace: &str, assembly: &str) -> Option<Node>;
}

/// Host-supplied class construction, the callback side of instance
/// materialization (`parse_class` in the reference implementation this is
/// ported from).
pub trait ClassRegistry {
    /// Attempts to construct `class` from the fully decoded field map.
    /// `asset_file` is threaded through for `PPtr` construction, which needs
    /// it to resolve its target lazily; this is the typed equivalent of the
    /// reference implementation injecting an `assetsfile` keyword argument
    /// into the field dict before calling the constructor.
    fn try_construct(
        &self,
        class: &str,
        fields: &LinkedHashMap<String, Value>,
        asset_file: Option<&dyn AssetFile>,
    ) -> Result<Box<dyn Any>, Error>;

    /// The set of keyword arguments `class`'s constructor accepts, used to
    /// partition fields into "accepted at construction" vs. "set afterward"
    /// when the unrestricted attempt above fails. `None` means the registry
    /// doesn't know the class at all.
    fn declared_attrs(&self, class: &str) -> Option<Vec<String>>;

    /// Sets a single attribute on an already-constructed instance, for
    /// fields that didn't fit the constructor's accepted subset.
    fn set_attr(&self, instance: &mut Box<dyn Any>, name: &str, value: Value) -> Result<(), Error>;

    /// The guaranteed-success fallback used when no other construction path
    /// works: wraps the node and its decoded fields so the caller still gets
    /// something usable instead of losing the data.
    fn unknown_object(&self, node: &Node, fields: LinkedHashMap<String, Value>) -> Box<dyn Any>;
}
