//! Client identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the client (thread, process, connection) that issued an
/// operation.
///
/// The checker never orders operations by client; real-time order already
/// implies per-client order for well-formed histories. Client ids are kept
/// for diagnostics and witness reconstruction.
///
/// # Examples
///
/// ```
/// use lincheck_core::ClientId;
///
/// let client = ClientId(3);
/// assert_eq!(client.inner(), 3);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub u32);

impl ClientId {
    /// Creates a new ClientId with the given value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the inner value of the ClientId.
    #[inline]
    pub const fn inner(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client({})", self.0)
    }
}

impl From<u32> for ClientId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<ClientId> for u32 {
    fn from(id: ClientId) -> Self {
        id.0
    }
}
