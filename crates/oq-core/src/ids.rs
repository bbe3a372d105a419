//! Newtype identifiers threaded through the hazard/risk pipeline.
//!
//! Mirrors the `BusId`/`GenId` pattern: thin `u32`/`u64` wrappers so a
//! source-model ordinal can never be passed where a realization ordinal is
//! expected, even though both are plain integers underneath.

use serde::{Deserialize, Serialize};

macro_rules! newtype_id {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            #[inline]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> $inner {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(v: $inner) -> Self {
                Self(v)
            }
        }
    };
}

newtype_id!(TrtId, u32);
newtype_id!(SourceModelOrdinal, u32);
newtype_id!(RlzOrdinal, u32);
newtype_id!(SiteId, u64);
newtype_id!(AssetOrdinal, u32);
newtype_id!(EventId, u64);
