//! Strongly typed row identifiers.
//!
//! Every entity in the metadata store is keyed by a 64-bit row id. Wrapping
//! them keeps a class id from being passed where a schema id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the raw row id
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identifier of a row in the schema table
    SchemaId
);
row_id!(
    /// Identifier of a row in the class table
    ClassId
);
row_id!(
    /// Identifier of a row in the enumeration table
    EnumerationId
);
row_id!(
    /// Identifier of a row in the property table
    PropertyId
);
