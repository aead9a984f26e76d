use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for node and connection IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Monotonic counter shared by every generated ID.
static COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an ID, or return the existing one.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate an ID of the form `{prefix}_{n}`.
            ///
            /// Uniqueness against IDs that arrived from a loaded document is
            /// the store's job; this only guarantees no two calls collide.
            pub fn with_prefix(prefix: &str) -> Self {
                Self::intern(&format!("{prefix}_{}", next_suffix()))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Interned identifier of a workflow node. 4 bytes, `Copy`, O(1) `Eq`/`Hash`.
    NodeId
);

interned_id!(
    /// Interned identifier of a connection between two nodes.
    ConnectionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("approve_request");
        let b = NodeId::intern("approve_request");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "approve_request");
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = NodeId::with_prefix("script");
        let b = NodeId::with_prefix("script");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("script_"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ConnectionId::intern("conn_a");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"conn_a\"");
        let back: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
