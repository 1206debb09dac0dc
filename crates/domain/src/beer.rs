//! Beer catalog entity.

use common::{BeerId, Money};
use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::error::{DomainError, ValidationErrors};
use crate::validation;

/// The mutable fields of a beer, as supplied by a create or full update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeerFields {
    pub name: String,
    pub style: String,
    pub upc: String,
    pub quantity_on_hand: i32,
    pub price: Money,
    pub description: Option<String>,
}

/// Partial update of a beer. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeerPatch {
    pub name: Option<String>,
    pub style: Option<String>,
    pub upc: Option<String>,
    pub quantity_on_hand: Option<i32>,
    pub description: Option<String>,
    pub price: Option<Money>,
}

impl BeerPatch {
    pub fn is_empty(&self) -> bool {
        self == &BeerPatch::default()
    }
}

/// A beer in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beer {
    pub id: Option<BeerId>,
    pub audit: Audit,
    pub name: String,
    pub style: String,
    pub upc: String,
    pub quantity_on_hand: i32,
    pub price: Money,
    pub description: Option<String>,
}

impl Beer {
    /// Creates an unsaved beer, checking its invariants.
    pub fn new(fields: BeerFields) -> Result<Self, DomainError> {
        let beer = Self::restore(None, Audit::default(), fields);
        beer.check_invariants()?;
        Ok(beer)
    }

    /// Rebuilds a beer from stored columns without re-checking invariants.
    pub fn restore(id: Option<BeerId>, audit: Audit, fields: BeerFields) -> Self {
        Self {
            id,
            audit,
            name: fields.name,
            style: fields.style,
            upc: fields.upc,
            quantity_on_hand: fields.quantity_on_hand,
            price: fields.price,
            description: fields.description,
        }
    }

    /// Replaces every mutable field. Identifier and audit columns are kept.
    pub fn replace(&mut self, fields: BeerFields) -> Result<(), DomainError> {
        let replaced = Self::restore(self.id, self.audit, fields);
        replaced.check_invariants()?;
        *self = replaced;
        Ok(())
    }

    /// Merges the supplied fields of `patch` into this beer.
    ///
    /// The merged beer must still satisfy every invariant; otherwise nothing
    /// is changed and the violation is returned.
    pub fn apply_patch(&mut self, patch: BeerPatch) -> Result<(), DomainError> {
        let mut merged = self.clone();
        if let Some(name) = patch.name {
            merged.name = name;
        }
        if let Some(style) = patch.style {
            merged.style = style;
        }
        if let Some(upc) = patch.upc {
            merged.upc = upc;
        }
        if let Some(quantity_on_hand) = patch.quantity_on_hand {
            merged.quantity_on_hand = quantity_on_hand;
        }
        if let Some(description) = patch.description {
            merged.description = Some(description);
        }
        if let Some(price) = patch.price {
            merged.price = price;
        }

        merged.check_invariants()?;
        *self = merged;
        Ok(())
    }

    pub fn check_invariants(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::not_blank(&mut errors, "name", &self.name);
        validation::not_blank(&mut errors, "style", &self.style);
        validation::not_blank(&mut errors, "upc", &self.upc);
        validation::positive_or_zero(&mut errors, "quantityOnHand", self.quantity_on_hand);
        validation::positive_money(&mut errors, "price", self.price);
        errors.into_result()
    }

    /// Returns the mutable fields as a value.
    pub fn fields(&self) -> BeerFields {
        BeerFields {
            name: self.name.clone(),
            style: self.style.clone(),
            upc: self.upc.clone(),
            quantity_on_hand: self.quantity_on_hand,
            price: self.price,
            description: self.description.clone(),
        }
    }

    /// Case-insensitive containment match used by the catalog filters.
    pub fn matches(&self, name: Option<&str>, style: Option<&str>) -> bool {
        fn contains(haystack: &str, needle: Option<&str>) -> bool {
            needle.is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
        }
        contains(&self.name, name) && contains(&self.style, style)
    }
}

/// Read-only snapshot of the beer an order line points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeerRef {
    pub id: BeerId,
    pub name: String,
    pub style: String,
    pub upc: String,
}

impl BeerRef {
    /// Returns `None` for a beer that has not been saved yet.
    pub fn of(beer: &Beer) -> Option<Self> {
        Some(Self {
            id: beer.id?,
            name: beer.name.clone(),
            style: beer.style.clone(),
            upc: beer.upc.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> BeerFields {
        BeerFields {
            name: "Test Beer".to_string(),
            style: "IPA".to_string(),
            upc: "123456".to_string(),
            quantity_on_hand: 100,
            price: Money::from_cents(1299),
            description: None,
        }
    }

    fn saved_beer() -> Beer {
        let mut beer = Beer::new(fields()).unwrap();
        beer.id = Some(BeerId::new(1));
        beer
    }

    #[test]
    fn new_rejects_invalid_fields() {
        let mut invalid = fields();
        invalid.name = " ".to_string();
        invalid.quantity_on_hand = -1;
        invalid.price = Money::zero();

        let err = Beer::new(invalid).unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "quantityOnHand", "price"]);
    }

    #[test]
    fn patch_with_only_price_changes_only_price() {
        let mut beer = saved_beer();
        let before = beer.clone();

        beer.apply_patch(BeerPatch {
            price: Some(Money::from_cents(1499)),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(beer.price, Money::from_cents(1499));
        assert_eq!(beer.id, before.id);
        assert_eq!(beer.audit, before.audit);
        assert_eq!(beer.name, before.name);
        assert_eq!(beer.style, before.style);
        assert_eq!(beer.upc, before.upc);
        assert_eq!(beer.quantity_on_hand, 100);
        assert_eq!(beer.description, before.description);
    }

    #[test]
    fn empty_patch_is_noop() {
        let mut beer = saved_beer();
        let before = beer.clone();
        assert!(BeerPatch::default().is_empty());
        beer.apply_patch(BeerPatch::default()).unwrap();
        assert_eq!(beer, before);
    }

    #[test]
    fn invalid_patch_leaves_beer_untouched() {
        let mut beer = saved_beer();
        let before = beer.clone();

        let result = beer.apply_patch(BeerPatch {
            name: Some("Renamed".to_string()),
            quantity_on_hand: Some(-5),
            ..Default::default()
        });

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(beer, before);
    }

    #[test]
    fn replace_keeps_identity() {
        let mut beer = saved_beer();
        let mut next = fields();
        next.name = "Other".to_string();
        next.description = Some("hoppy".to_string());
        beer.replace(next).unwrap();
        assert_eq!(beer.id, Some(BeerId::new(1)));
        assert_eq!(beer.name, "Other");
        assert_eq!(beer.description.as_deref(), Some("hoppy"));
    }

    #[test]
    fn matches_is_case_insensitive_containment() {
        let beer = saved_beer();
        assert!(beer.matches(Some("test"), None));
        assert!(beer.matches(None, Some("ip")));
        assert!(beer.matches(Some("BEER"), Some("IPA")));
        assert!(!beer.matches(Some("lager"), None));
        assert!(beer.matches(None, None));
    }

    #[test]
    fn beer_ref_requires_saved_beer() {
        let unsaved = Beer::new(fields()).unwrap();
        assert!(BeerRef::of(&unsaved).is_none());
        let reference = BeerRef::of(&saved_beer()).unwrap();
        assert_eq!(reference.id, BeerId::new(1));
        assert_eq!(reference.upc, "123456");
    }
}
