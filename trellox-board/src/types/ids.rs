//! Identifier newtypes
//!
//! Ids are opaque strings. Freshly created entities get a ULID; imported and
//! externally issued ids (identity provider uids, Trello ids) are kept as-is.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh unique id
            pub fn new() -> Self {
                Self(Ulid::new().to_string())
            }

            /// Wrap an existing id
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Board identifier
    BoardId
);
define_id!(
    /// List identifier
    ListId
);
define_id!(
    /// Card identifier
    CardId
);
define_id!(LabelId);
define_id!(CommentId);
define_id!(AttachmentId);
define_id!(ChecklistId);
define_id!(ChecklistItemId);
define_id!(StickyNoteId);
define_id!(
    /// User identifier as issued by the identity provider
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_ulids() {
        let id = CardId::new();
        assert_eq!(id.as_str().len(), 26);
        assert!(Ulid::from_string(id.as_str()).is_ok());
        assert_ne!(id, CardId::new());
    }

    #[test]
    fn test_external_ids_kept_verbatim() {
        let id = BoardId::from("5f2b9c0e1a2b3c4d5e6f7a8b");
        assert_eq!(id.to_string(), "5f2b9c0e1a2b3c4d5e6f7a8b");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = UserId::from("uid-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"uid-1\"");
        let back: UserId = serde_json::from_str("\"uid-1\"").unwrap();
        assert_eq!(back, id);
    }
}
