//! The fixed catalogue of canonical listing fields.
//!
//! Every canonical record carries exactly one value per [`Field`]. Only the
//! subset returned by [`Field::monitored`] is compared between observations;
//! the rest is carried into the state table but never diffed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value type a field is coerced to during canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    /// A list of named items, flattened to a JSON array of names.
    NameList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Reference,
    Description,
    Category,
    TotalArea,
    UsefulArea,
    Price,
    Bedrooms,
    Bathrooms,
    Suites,
    Garages,
    CommercialRooms,
    StreetName,
    AddressNumber,
    AddressComp,
    Neighborhood,
    City,
    State,
    Latitude,
    Longitude,
    PublisherName,
    PublisherPhone,
    PublisherLandline,
    PrivativeItems,
    SourceActive,
    CollectionArea,
}

const MONITORED: &[Field] = &[
    Field::Price,
    Field::Title,
    Field::Description,
    Field::TotalArea,
    Field::UsefulArea,
    Field::Bedrooms,
    Field::Bathrooms,
    Field::Suites,
    Field::Garages,
    Field::StreetName,
    Field::AddressNumber,
    Field::Neighborhood,
    Field::PublisherName,
    Field::PublisherPhone,
];

impl Field {
    pub const COUNT: usize = 26;

    /// All fields in catalogue order. A field's position here is its column index.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Title,
        Field::Reference,
        Field::Description,
        Field::Category,
        Field::TotalArea,
        Field::UsefulArea,
        Field::Price,
        Field::Bedrooms,
        Field::Bathrooms,
        Field::Suites,
        Field::Garages,
        Field::CommercialRooms,
        Field::StreetName,
        Field::AddressNumber,
        Field::AddressComp,
        Field::Neighborhood,
        Field::City,
        Field::State,
        Field::Latitude,
        Field::Longitude,
        Field::PublisherName,
        Field::PublisherPhone,
        Field::PublisherLandline,
        Field::PrivativeItems,
        Field::SourceActive,
        Field::CollectionArea,
    ];

    /// Fields compared by the change detector.
    pub fn monitored() -> &'static [Field] {
        MONITORED
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in the output tables.
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Reference => "reference",
            Field::Description => "description",
            Field::Category => "category",
            Field::TotalArea => "total_area",
            Field::UsefulArea => "useful_area",
            Field::Price => "price",
            Field::Bedrooms => "bedrooms",
            Field::Bathrooms => "bathrooms",
            Field::Suites => "suites",
            Field::Garages => "garages",
            Field::CommercialRooms => "commercial_rooms",
            Field::StreetName => "street_name",
            Field::AddressNumber => "address_number",
            Field::AddressComp => "address_comp",
            Field::Neighborhood => "neighborhood",
            Field::City => "city",
            Field::State => "state",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::PublisherName => "publisher_name",
            Field::PublisherPhone => "publisher_phone",
            Field::PublisherLandline => "publisher_landline",
            Field::PrivativeItems => "privative_items",
            Field::SourceActive => "source_active",
            Field::CollectionArea => "collection_area",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::TotalArea
            | Field::UsefulArea
            | Field::Price
            | Field::Bedrooms
            | Field::Bathrooms
            | Field::Suites
            | Field::Garages
            | Field::CommercialRooms
            | Field::Latitude
            | Field::Longitude => FieldKind::Number,
            Field::SourceActive => FieldKind::Bool,
            Field::PrivativeItems => FieldKind::NameList,
            _ => FieldKind::Text,
        }
    }

    /// JSON pointer of the field inside a raw listing record.
    ///
    /// For [`FieldKind::NameList`] this points at the array; element names are
    /// read from each item's `name` key.
    pub fn raw_path(self) -> &'static str {
        match self {
            Field::Title => "/title",
            Field::Reference => "/reference",
            Field::Description => "/description",
            Field::Category => "/category",
            Field::TotalArea => "/area/total",
            Field::UsefulArea => "/area/useful",
            Field::Price => "/prices/rawPrice",
            Field::Bedrooms => "/properties/bedrooms",
            Field::Bathrooms => "/bathrooms/count",
            Field::Suites => "/suites/count",
            Field::Garages => "/garages/count",
            Field::CommercialRooms => "/commercialRooms/count",
            Field::StreetName => "/location/street/name",
            Field::AddressNumber => "/location/street/addressNumber",
            Field::AddressComp => "/location/addressComp",
            Field::Neighborhood => "/location/neighborhood/name",
            Field::City => "/location/city/name",
            Field::State => "/location/state/name",
            Field::Latitude => "/location/geoposition/lat",
            Field::Longitude => "/location/geoposition/lon",
            Field::PublisherName => "/publisher/name",
            Field::PublisherPhone => "/publisher/phones/cellphone/number",
            Field::PublisherLandline => "/publisher/phones/landline/number",
            Field::PrivativeItems => "/privativeItems",
            Field::SourceActive => "/active",
            Field::CollectionArea => "/bairro_coleta",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A canonical field value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text form used for change comparison. `Null` serializes to `""`.
    pub fn to_comparable(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

/// Largest magnitude at which every integer is exactly representable in an f64.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Integral values print without a fractional part (`120000`, not `120000.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_order_matches_discriminants() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i, "{field} out of place");
        }
    }

    #[test]
    fn names_are_unique() {
        let names: std::collections::HashSet<&str> = Field::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), Field::COUNT);
    }

    #[test]
    fn monitored_set_excludes_bookkeeping() {
        let monitored = Field::monitored();
        assert!(monitored.contains(&Field::Price));
        assert!(monitored.contains(&Field::PublisherPhone));
        assert!(!monitored.contains(&Field::City));
        assert!(!monitored.contains(&Field::CollectionArea));
        assert!(!monitored.contains(&Field::PrivativeItems));
        assert_eq!(Field::monitored().len(), 14);
    }

    #[test]
    fn numbers_format_without_spurious_fraction() {
        assert_eq!(format_number(120000.0), "120000");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(72.5), "72.5");
        assert_eq!(format_number(-25.5311), "-25.5311");
    }

    #[test]
    fn null_compares_as_empty() {
        assert_eq!(FieldValue::Null.to_comparable(), "");
        assert_eq!(FieldValue::Bool(true).to_comparable(), "true");
        assert_eq!(FieldValue::Text("Centro".into()).to_comparable(), "Centro");
    }
}
