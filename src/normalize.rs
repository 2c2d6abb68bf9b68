use std::collections::{HashMap, HashSet};

use crate::formats::{City, District, FlatRecord, Province, Subdistrict};

/// The four entity tables derived from one ordered stream of flat rows.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    pub provinces: Vec<Province>,
    pub cities: Vec<City>,
    pub districts: Vec<District>,
    pub subdistricts: Vec<Subdistrict>,
}

#[derive(Debug, Default)]
struct Registry {
    provinces: HashMap<String, u32>,
    // Keyed by name alone: equal city names in different provinces share one row.
    cities: HashMap<String, u32>,
    // District names repeat across cities.
    districts: HashMap<(String, String), u32>,
    misplaced_cities: HashSet<String>,
}

impl Hierarchy {
    pub fn from_records(records: &[FlatRecord]) -> anyhow::Result<Self> {
        let mut registry = Registry::default();
        let mut hierarchy = Hierarchy {
            subdistricts: Vec::with_capacity(records.len()),
            ..Hierarchy::default()
        };

        for record in records {
            let province_id = match registry.provinces.get(&record.province_name).copied() {
                Some(id) => id,
                None => {
                    let id = next_id(registry.provinces.len())?;
                    registry.provinces.insert(record.province_name.clone(), id);
                    hierarchy.provinces.push(Province {
                        id,
                        name: record.province_name.clone(),
                    });
                    id
                }
            };

            let city_id = match registry.cities.get(&record.city_name).copied() {
                Some(id) => {
                    // Ids are dense from 1, so the city row sits at id - 1.
                    let city = &hierarchy.cities[id as usize - 1];
                    if city.province_id != province_id
                        && registry.misplaced_cities.insert(city.name.clone())
                    {
                        tracing::warn!(
                            city = %city.name,
                            kept_province_id = city.province_id,
                            province = %record.province_name,
                            "city name appears under more than one province; keeping the first"
                        );
                    }
                    id
                }
                None => {
                    let id = next_id(registry.cities.len())?;
                    registry.cities.insert(record.city_name.clone(), id);
                    hierarchy.cities.push(City {
                        id,
                        name: record.city_name.clone(),
                        province_id,
                    });
                    id
                }
            };

            let district_key = (record.district_name.clone(), record.city_name.clone());
            let district_id = match registry.districts.get(&district_key).copied() {
                Some(id) => id,
                None => {
                    let id = next_id(registry.districts.len())?;
                    registry.districts.insert(district_key, id);
                    hierarchy.districts.push(District {
                        id,
                        name: record.district_name.clone(),
                        city_id,
                    });
                    id
                }
            };

            hierarchy.subdistricts.push(Subdistrict {
                id: parse_subdistrict_id(&record.subdistrict_id),
                name: record.subdistrict_name.clone(),
                code: record.subdistrict_code.clone(),
                postal_code: record.postal_code.clone(),
                district_id,
            });
        }

        tracing::info!(
            provinces = hierarchy.provinces.len(),
            cities = hierarchy.cities.len(),
            districts = hierarchy.districts.len(),
            subdistricts = hierarchy.subdistricts.len(),
            "normalized hierarchy"
        );

        Ok(hierarchy)
    }
}

fn next_id(registered: usize) -> anyhow::Result<u32> {
    registered
        .checked_add(1)
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| anyhow::anyhow!("id space exhausted after {registered} entries"))
}

/// Source ids are trusted; anything non-numeric becomes 0.
pub fn parse_subdistrict_id(raw: &str) -> i64 {
    match raw.parse::<i64>() {
        Ok(id) => id,
        Err(err) => {
            tracing::warn!(raw, %err, "subdistrict id is not numeric; using 0");
            0
        }
    }
}
