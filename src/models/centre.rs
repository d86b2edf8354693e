use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A point on the Earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds a coordinate pair, rejecting values outside the valid lat/lng ranges
    pub fn new(lat: f64, lng: f64) -> AppResult<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::InvalidInput(format!(
                "Coordinates out of range: ({}, {})",
                lat, lng
            )));
        }
        Ok(Self { lat, lng })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// A directory entry for an eldercare service location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Centre {
    pub id: i64,
    pub friendly_id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub block: Option<String>,
    pub street_name: Option<String>,
    pub building_name: Option<String>,
    pub unit_no: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub operating_hours: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub availability: Option<String>,
    pub google_map_place_id: Option<String>,
}

impl Centre {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// Merges a patch into this centre according to the given policy
    ///
    /// With [`MergePolicy::Override`] every field present in the patch replaces the
    /// current value. With [`MergePolicy::FillEmpty`] a patch field is only written
    /// when the current value is empty (`None`, a blank string or an empty list);
    /// coordinates are never considered empty.
    pub fn apply_patch(&mut self, patch: CentrePatch, policy: MergePolicy) -> AppResult<()> {
        match (patch.lat, patch.lng, policy) {
            (Some(lat), Some(lng), MergePolicy::Override) => {
                let coords = Coordinates::new(lat, lng)?;
                self.lat = coords.lat;
                self.lng = coords.lng;
            }
            (Some(lat), None, MergePolicy::Override) => {
                self.lat = Coordinates::new(lat, self.lng)?.lat;
            }
            (None, Some(lng), MergePolicy::Override) => {
                self.lng = Coordinates::new(self.lat, lng)?.lng;
            }
            _ => {}
        }

        if let Some(name) = patch.name {
            if policy == MergePolicy::Override || self.name.trim().is_empty() {
                self.name = name;
            }
        }

        merge_opt(&mut self.block, patch.block, policy);
        merge_opt(&mut self.street_name, patch.street_name, policy);
        merge_opt(&mut self.building_name, patch.building_name, policy);
        merge_opt(&mut self.unit_no, patch.unit_no, policy);
        merge_opt(&mut self.postal_code, patch.postal_code, policy);
        merge_opt(&mut self.phone, patch.phone, policy);
        merge_opt(&mut self.email, patch.email, policy);
        merge_opt(&mut self.website, patch.website, policy);
        merge_opt(&mut self.availability, patch.availability, policy);
        merge_opt(&mut self.google_map_place_id, patch.google_map_place_id, policy);
        merge_opt(&mut self.min_price, patch.min_price, policy);
        merge_opt(&mut self.max_price, patch.max_price, policy);
        merge_vec(&mut self.operating_hours, patch.operating_hours, policy);
        merge_vec(&mut self.photos, patch.photos, policy);

        Ok(())
    }
}

/// How a [`CentrePatch`] is merged into an existing centre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Every provided field overwrites the stored one
    Override,
    /// Provided fields only fill fields that are currently empty
    FillEmpty,
}

/// A partial centre record, as produced by scrapers or admin edits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CentrePatch {
    pub friendly_id: String,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub block: Option<String>,
    pub street_name: Option<String>,
    pub building_name: Option<String>,
    pub unit_no: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub operating_hours: Option<Vec<String>>,
    pub photos: Option<Vec<String>>,
    pub min_price: Option<i32>,
    pub max_price: Option<i32>,
    pub availability: Option<String>,
    pub google_map_place_id: Option<String>,
}

impl CentrePatch {
    /// Creates a new centre from this patch
    ///
    /// Name and both coordinates are required.
    pub fn into_centre(self, id: i64) -> AppResult<Centre> {
        let name = self.name.filter(|n| !n.trim().is_empty()).ok_or_else(|| {
            AppError::InvalidInput(format!("Centre {} is missing a name", self.friendly_id))
        })?;
        let (lat, lng) = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                return Err(AppError::InvalidInput(format!(
                    "Centre {} is missing coordinates",
                    self.friendly_id
                )))
            }
        };
        let coords = Coordinates::new(lat, lng)?;

        Ok(Centre {
            id,
            friendly_id: self.friendly_id,
            name,
            lat: coords.lat,
            lng: coords.lng,
            block: self.block,
            street_name: self.street_name,
            building_name: self.building_name,
            unit_no: self.unit_no,
            postal_code: self.postal_code,
            phone: self.phone,
            email: self.email,
            website: self.website,
            operating_hours: self.operating_hours.unwrap_or_default(),
            photos: self.photos.unwrap_or_default(),
            min_price: self.min_price,
            max_price: self.max_price,
            availability: self.availability,
            google_map_place_id: self.google_map_place_id,
        })
    }
}

/// Values that can be "empty" for the purpose of a fill-empty merge
trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for i32 {
    fn is_blank(&self) -> bool {
        false
    }
}

fn merge_opt<T: Blank>(current: &mut Option<T>, incoming: Option<T>, policy: MergePolicy) {
    let Some(value) = incoming else {
        return;
    };
    let empty = current.as_ref().map_or(true, Blank::is_blank);
    if policy == MergePolicy::Override || empty {
        *current = Some(value);
    }
}

fn merge_vec(current: &mut Vec<String>, incoming: Option<Vec<String>>, policy: MergePolicy) {
    let Some(values) = incoming else {
        return;
    };
    if policy == MergePolicy::Override || current.is_empty() {
        *current = values;
    }
}
