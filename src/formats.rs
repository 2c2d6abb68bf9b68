use serde::{Deserialize, Serialize};

/// One row of the listing table, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub subdistrict_id: String,
    pub postal_code: String,
    pub subdistrict_name: String,
    pub subdistrict_code: String,
    pub district_name: String,
    pub city_name: String,
    pub province_name: String,
}

/// Provinsi.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Province {
    pub id: u32,
    pub name: String,
}

/// Kota / Kabupaten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    pub id: u32,
    pub name: String,
    pub province_id: u32,
}

/// Kecamatan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct District {
    pub id: u32,
    pub name: String,
    pub city_id: u32,
}

/// Desa / Kelurahan. The id comes from the source table, not from the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdistrict {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub postal_code: String,
    pub district_id: u32,
}
