//! Identifier newtypes
//!
//! Identifiers in the document system are opaque strings (`doc-9`,
//! `proc-1`, `prj-2`). Each kind gets its own type so a process id can never
//! be passed where a document id is expected.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create identifier, rejecting blank input
            ///
            /// # Errors
            /// Returns [`ModelError::EmptyIdentifier`] if `raw` is blank
            pub fn new(raw: impl Into<String>) -> Result<Self, ModelError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(ModelError::EmptyIdentifier { kind: $kind });
                }
                Ok(Self(raw))
            }

            /// Borrow as string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Document identifier
    DocumentId,
    "document"
);

string_id!(
    /// Project (construction object) identifier
    ProjectId,
    "project"
);

string_id!(
    /// Approval process identifier
    ProcessId,
    "process"
);
