use serde::{Deserialize, Serialize};

/// Declares a surrogate integer identifier for one entity type.
///
/// Each entity gets its own newtype so a `BeerId` can never be passed where a
/// `BeerOrderId` is expected.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw database value.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier value.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a beer in the catalog.
    BeerId
);
entity_id!(
    /// Identifier of a customer.
    CustomerId
);
entity_id!(
    /// Identifier of a beer order (the aggregate root).
    BeerOrderId
);
entity_id!(
    /// Identifier of a line inside a beer order.
    BeerOrderLineId
);
entity_id!(
    /// Identifier of a shipment of a beer order.
    ShipmentId
);

/// Optimistic-concurrency version counter of a persisted row.
///
/// A row is inserted at version 0 and every successful update bumps it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version a freshly inserted row starts at.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_of_different_entities_keep_their_raw_value() {
        let beer = BeerId::new(7);
        let order = BeerOrderId::from(7);
        assert_eq!(beer.as_i64(), order.as_i64());
        assert_eq!(beer.to_string(), "7");
    }

    #[test]
    fn id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ShipmentId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: ShipmentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ShipmentId::new(42));
    }

    #[test]
    fn version_starts_at_zero_and_increments() {
        let v = Version::initial();
        assert_eq!(v.as_i64(), 0);
        assert_eq!(v.next(), Version::new(1));
        assert!(v < v.next());
    }
}
