//! Availability Aggregator.

use serde::Serialize;

use crate::lens::Availability;
use crate::variant::Variant;

/// Product-level availability derived from the variant list. Never stored
/// independently of the list it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductAvailability {
    pub availability: Availability,
    pub visible: bool,
}

impl ProductAvailability {
    /// The product `status` column mirrors availability.
    #[must_use]
    pub fn status(&self) -> &'static str {
        self.availability.as_str()
    }
}

/// Precedence: any stocked variant wins, then any preorder, else unavailable.
#[must_use]
pub fn aggregate_availability(variants: &[Variant]) -> ProductAvailability {
    let availability = if variants.iter().any(Variant::is_stocked) {
        Availability::InStock
    } else if variants
        .iter()
        .any(|v| v.availability == Availability::Preorder)
    {
        Availability::Preorder
    } else {
        Availability::Unavailable
    };

    ProductAvailability {
        availability,
        visible: availability != Availability::Unavailable,
    }
}
