//! The boundary between the reconciler and the mutable surface it renders
//! into.
//!
//! The core only ever speaks to the host tree through [`HostAdapter`] and the
//! opaque [`HostId`] handles it returns; it never inspects what a handle
//! points at. A concrete binding (a DOM, a scene graph, the in-memory tree
//! used by the test harness) supplies the primitive operations.

use crate::element::{ElementKind, Handler, PropValue, Props};

/// Opaque handle to a node in the external host tree.
pub type HostId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Missing { id: HostId },
    NotAChild { parent: HostId, child: HostId },
    Unsupported { kind: String },
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Missing { id } => write!(f, "host node {id} missing"),
            HostError::NotAChild { parent, child } => {
                write!(f, "host node {child} is not a child of {parent}")
            }
            HostError::Unsupported { kind } => {
                write!(f, "host cannot materialize {kind} nodes")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Primitive mutations the reconciler requires of a host tree.
///
/// Failures are not caught or retried by the core: an error aborts the
/// current commit mid-walk and propagates to the caller, with mutations
/// already applied left in place.
pub trait HostAdapter {
    /// Materialize a primitive node for a host tag or the reserved text
    /// kind, with its initial properties (listeners included) applied. The
    /// node starts detached; attachment happens at commit time.
    fn create_node(&mut self, kind: &ElementKind, props: &Props) -> Result<HostId, HostError>;

    fn set_property(
        &mut self,
        id: HostId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn clear_property(&mut self, id: HostId, name: &str) -> Result<(), HostError>;

    fn add_listener(&mut self, id: HostId, event: &str, handler: &Handler)
        -> Result<(), HostError>;

    fn remove_listener(
        &mut self,
        id: HostId,
        event: &str,
        handler: &Handler,
    ) -> Result<(), HostError>;

    fn append_child(&mut self, parent: HostId, child: HostId) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: HostId, child: HostId) -> Result<(), HostError>;
}
