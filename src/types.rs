//! Common types for postal-facade.

use crate::ffi;
use bitflags::bitflags;
use std::collections::HashMap;

bitflags! {
    /// Address component categories that take part in expansion.
    ///
    /// The bit values are libpostal's `LIBPOSTAL_ADDRESS_*` constants and are
    /// handed to C unchanged, unknown bits included.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AddressComponents: u16 {
        /// Any component
        const ANY = ffi::LIBPOSTAL_ADDRESS_ANY;
        /// Venue or building name
        const NAME = ffi::LIBPOSTAL_ADDRESS_NAME;
        /// House number
        const HOUSE_NUMBER = ffi::LIBPOSTAL_ADDRESS_HOUSE_NUMBER;
        /// Street
        const STREET = ffi::LIBPOSTAL_ADDRESS_STREET;
        /// Unit / apartment
        const UNIT = ffi::LIBPOSTAL_ADDRESS_UNIT;
        /// Floor
        const LEVEL = ffi::LIBPOSTAL_ADDRESS_LEVEL;
        /// Staircase
        const STAIRCASE = ffi::LIBPOSTAL_ADDRESS_STAIRCASE;
        /// Entrance
        const ENTRANCE = ffi::LIBPOSTAL_ADDRESS_ENTRANCE;
        /// Place category ("restaurants")
        const CATEGORY = ffi::LIBPOSTAL_ADDRESS_CATEGORY;
        /// Proximity phrase ("near")
        const NEAR = ffi::LIBPOSTAL_ADDRESS_NEAR;
        /// Place names: cities, regions, countries
        const TOPONYM = ffi::LIBPOSTAL_ADDRESS_TOPONYM;
        /// Postal code
        const POSTAL_CODE = ffi::LIBPOSTAL_ADDRESS_POSTAL_CODE;
        /// PO box
        const PO_BOX = ffi::LIBPOSTAL_ADDRESS_PO_BOX;
        /// Every category
        const ALL = ffi::LIBPOSTAL_ADDRESS_ALL;
    }
}

impl AddressComponents {
    /// No categories (`LIBPOSTAL_ADDRESS_NONE`).
    pub const NONE: Self = Self::empty();
}

impl From<u16> for AddressComponents {
    fn from(bits: u16) -> Self {
        Self::from_bits_retain(bits)
    }
}

impl From<AddressComponents> for u16 {
    fn from(components: AddressComponents) -> Self {
        components.bits()
    }
}

/// One labeled fragment of a parsed address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedComponent {
    /// libpostal label, e.g. `"house_number"` or `"road"`
    pub label: String,
    /// The text libpostal assigned to the label
    pub value: String,
}

impl ParsedComponent {
    /// Build a component from a label and value.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

macro_rules! parsed_address {
    ($($(#[$doc:meta])* $field:ident),+ $(,)?) => {
        /// Keyed view of a parse result.
        ///
        /// Built from the ordered component list; labels libpostal does not
        /// document land in `other` with their order preserved.
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct ParsedAddress {
            $($(#[$doc])* pub $field: Option<String>,)+
            /// Components with labels outside the known taxonomy
            pub other: Vec<ParsedComponent>,
        }

        impl ParsedAddress {
            /// Every label this view has a field for.
            pub const LABELS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Group components by label. A repeated label keeps its last value.
            pub fn from_components(components: &[ParsedComponent]) -> Self {
                let mut parsed = Self::default();
                for component in components {
                    match component.label.as_str() {
                        $(stringify!($field) => parsed.$field = Some(component.value.clone()),)+
                        _ => parsed.other.push(component.clone()),
                    }
                }
                parsed
            }

            /// Get all non-empty components as a map.
            pub fn components(&self) -> HashMap<String, String> {
                let mut map = HashMap::new();
                $(
                    if let Some(value) = &self.$field {
                        map.insert(stringify!($field).to_string(), value.clone());
                    }
                )+
                for component in &self.other {
                    map.insert(component.label.clone(), component.value.clone());
                }
                map
            }

            /// Check if the parsed address has any components.
            pub fn is_empty(&self) -> bool {
                $(self.$field.is_none() &&)+ self.other.is_empty()
            }
        }
    };
}

parsed_address! {
    /// Venue name
    house,
    /// Place category
    category,
    /// Proximity phrase
    near,
    /// House number
    house_number,
    /// Street name
    road,
    /// Unit / apartment
    unit,
    /// Floor
    level,
    /// Staircase
    staircase,
    /// Entrance
    entrance,
    /// Post office box
    po_box,
    /// Postal code
    postcode,
    /// Neighborhood
    suburb,
    /// City district
    city_district,
    /// City
    city,
    /// Island
    island,
    /// State district
    state_district,
    /// State or province
    state,
    /// Country region
    country_region,
    /// Country
    country,
    /// World region
    world_region,
}

impl From<&[ParsedComponent]> for ParsedAddress {
    fn from(components: &[ParsedComponent]) -> Self {
        Self::from_components(components)
    }
}
