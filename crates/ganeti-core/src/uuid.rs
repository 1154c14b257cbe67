//! Typed UUIDs for Ganeti objects.
//!
//! The cluster assigns a UUID to every instance, node, node group, NIC and disk. Each kind
//! gets its own wrapper so an instance UUID cannot be passed where a node UUID is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

macro_rules! object_uuids {
    ($($(#[$meta:meta])* $name:ident => $kind:literal;)+) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Object kind, used in error messages.
            pub const KIND: &'static str = $kind;

            /// Wrap a raw UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The raw UUID.
            #[must_use]
            pub const fn get(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| Error::InvalidUuid(format!("{} `{s}`", Self::KIND)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    )+};
}

object_uuids! {
    /// UUID of an instance.
    InstanceUuid => "instance";
    /// UUID of a node.
    NodeUuid => "node";
    /// UUID of a node group.
    GroupUuid => "node group";
    /// UUID of a network interface.
    NicUuid => "nic";
    /// UUID of a disk.
    DiskUuid => "disk";
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUP: &str = "4d3bf3ba-972e-49b0-8680-f783fb07a048";

    #[test]
    fn parses_and_displays_hyphenated() {
        let group: GroupUuid = GROUP.parse().unwrap();
        assert_eq!(group.to_string(), GROUP);
        assert_eq!(group.get(), Uuid::parse_str(GROUP).unwrap());
    }

    #[test]
    fn invalid_input_names_the_kind() {
        let err = "node1.example.com".parse::<NodeUuid>().unwrap_err();
        assert!(matches!(&err, Error::InvalidUuid(msg) if msg == "node `node1.example.com`"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let uuid = InstanceUuid::from_uuid(Uuid::parse_str(GROUP).unwrap());
        assert_eq!(serde_json::to_value(uuid).unwrap(), serde_json::json!(GROUP));

        let back: InstanceUuid = serde_json::from_value(serde_json::json!(GROUP)).unwrap();
        assert_eq!(back, uuid);
    }

    #[test]
    fn rejects_non_uuid_strings() {
        assert!(serde_json::from_str::<DiskUuid>("\"disk0\"").is_err());
        assert!(serde_json::from_str::<NicUuid>("42").is_err());
    }
}
