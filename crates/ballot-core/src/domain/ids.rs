//! Strongly-typed identifiers.
//!
//! `Id<T>` wraps a ULID and carries a zero-sized marker type so that an
//! allocation pass id and a fan-out invocation id cannot be mixed up. ULIDs
//! sort by creation time, which keeps trace output in dispatch order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for `Id<T>`; provides the display prefix.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker for allocation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pass {}

impl IdMarker for Pass {
    fn prefix() -> &'static str {
        "pass-"
    }
}

/// Marker for node fan-out invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Invocation {}

impl IdMarker for Invocation {
    fn prefix() -> &'static str {
        "inv-"
    }
}

/// Identifier of one allocation pass (one `RoutingAllocation`).
pub type PassId = Id<Pass>;

/// Identifier of one `TransportNodesAction::execute` call.
pub type InvocationId = Id<Invocation>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_distinguish_id_kinds() {
        let ulid = Ulid::new();
        let pass = PassId::from_ulid(ulid);
        let invocation = InvocationId::from_ulid(ulid);

        assert_eq!(pass.as_ulid(), invocation.as_ulid());
        assert!(pass.to_string().starts_with("pass-"));
        assert!(invocation.to_string().starts_with("inv-"));
    }

    #[test]
    fn ids_survive_json() {
        let id = InvocationId::from_ulid(Ulid::new());
        let serialized = serde_json::to_string(&id).unwrap();
        let deserialized: InvocationId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn marker_is_zero_sized() {
        assert_eq!(std::mem::size_of::<PassId>(), std::mem::size_of::<Ulid>());
    }
}
