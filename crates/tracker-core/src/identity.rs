//! # Identifier Newtypes
//!
//! Every record kind has its own UUID-backed identifier. They are always
//! valid by construction and serialize as plain UUID strings, so they can be
//! used directly as path segments and database keys.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse the canonical hyphenated form.
            pub fn parse(s: &str) -> Option<Self> {
                Uuid::parse_str(s.trim()).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a [`crate::Ticket`].
    TicketId
);
uuid_id!(
    /// Identifier of a [`crate::Topic`].
    TopicId
);
uuid_id!(
    /// Identifier of a [`crate::TrackerUser`].
    UserId
);
uuid_id!(
    /// Identifier of a [`crate::MediaInfo`] line item.
    MediaInfoId
);
uuid_id!(
    /// Identifier of an [`crate::Expediture`] line item.
    ExpeditureId
);
uuid_id!(
    /// Identifier of a [`crate::Transaction`].
    TransactionId
);
uuid_id!(
    /// Identifier of a ticket cluster (tickets grouped for joint review).
    ClusterId
);
