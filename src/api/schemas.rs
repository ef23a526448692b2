//! Request and response bodies for the versioned API.
//!
//! Payload structs validate themselves before any handler touches the
//! database; responses are built from repository records.

use serde::{Deserialize, Serialize};

use crate::db::{
    ActivityNode, ActivityRecord, BuildingRecord, OrganizationDetail, PhoneRecord,
};
use crate::error::ApiError;
use crate::geo;

// ============================================================================
// Query parameters
// ============================================================================

/// Query parameters for the paginated organization list.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    pub building_id: Option<i64>,
    pub activity_id: Option<i64>,
    pub name_query: Option<String>,
    #[serde(default = "default_true")]
    pub include_child_activities: bool,
}

impl ListQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.page < 1 {
            return Err(ApiError::Validation("page must be at least 1".into()));
        }
        if !(1..=100).contains(&self.per_page) {
            return Err(ApiError::Validation(
                "per_page must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// Offset/limit window shared by the non-paginated list endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl PageQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.skip < 0 {
            return Err(ApiError::Validation("skip must not be negative".into()));
        }
        if !(1..=100).contains(&self.limit) {
            return Err(ApiError::Validation(
                "limit must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }
}

/// Query parameters for name search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl SearchQuery {
    pub fn window(&self) -> PageQuery {
        PageQuery {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Query parameters for the by-activity endpoint.
#[derive(Debug, Deserialize)]
pub struct ByActivityQuery {
    #[serde(default = "default_true")]
    pub include_children: bool,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl ByActivityQuery {
    pub fn window(&self) -> PageQuery {
        PageQuery {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Query parameters for the building list.
#[derive(Debug, Deserialize)]
pub struct BuildingListQuery {
    pub address_query: Option<String>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl BuildingListQuery {
    pub fn window(&self) -> PageQuery {
        PageQuery {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Query parameters for the activity list.
#[derive(Debug, Deserialize)]
pub struct ActivityListQuery {
    pub parent_id: Option<i64>,
    pub level: Option<i32>,
}

impl ActivityListQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(level) = self.level
            && !(1..=3).contains(&level)
        {
            return Err(ApiError::Validation("level must be between 1 and 3".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Create/update payload for buildings.
#[derive(Debug, Deserialize)]
pub struct BuildingPayload {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl BuildingPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !geo::valid_coordinates(self.latitude, self.longitude) {
            return Err(ApiError::Validation(
                "latitude must be in [-90, 90] and longitude in [-180, 180]".into(),
            ));
        }
        Ok(())
    }
}

/// Create/update payload for activities. The level is derived from the
/// parent chain server-side; a provided value is only range-checked.
#[derive(Debug, Deserialize)]
pub struct ActivityPayload {
    pub name: String,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub level: Option<i32>,
}

impl ActivityPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("name must not be empty".into()));
        }
        if let Some(level) = self.level
            && !(1..=3).contains(&level)
        {
            return Err(ApiError::Validation("level must be between 1 and 3".into()));
        }
        Ok(())
    }
}

/// Create payload for organizations.
#[derive(Debug, Deserialize)]
pub struct OrganizationPayload {
    pub name: String,
    pub building_id: i64,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub activity_ids: Vec<i64>,
}

impl OrganizationPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("name must not be empty".into()));
        }
        for phone in &self.phone_numbers {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

/// Partial update payload for organizations.
#[derive(Debug, Deserialize)]
pub struct OrganizationUpdatePayload {
    pub name: Option<String>,
    pub building_id: Option<i64>,
    pub phone_numbers: Option<Vec<String>>,
    pub activity_ids: Option<Vec<i64>>,
}

impl OrganizationUpdatePayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref name) = self.name
            && name.trim().is_empty()
        {
            return Err(ApiError::Validation("name must not be empty".into()));
        }
        if let Some(ref phones) = self.phone_numbers {
            for phone in phones {
                validate_phone(phone)?;
            }
        }
        Ok(())
    }
}

/// Phone numbers must start with `+` or `8`.
fn validate_phone(phone: &str) -> Result<(), ApiError> {
    if !phone.starts_with('+') && !phone.starts_with('8') {
        return Err(ApiError::Validation(format!(
            "phone number {phone:?} must start with \"+\" or \"8\""
        )));
    }
    Ok(())
}

/// Geo search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoSearchKind {
    Radius,
    Rectangle,
}

/// Body for the geo-search endpoint.
#[derive(Debug, Deserialize)]
pub struct GeoSearchRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub search_type: GeoSearchKind,

    // Radius mode.
    pub radius_km: Option<f64>,

    // Rectangle mode.
    pub north_lat: Option<f64>,
    pub south_lat: Option<f64>,
    pub east_lng: Option<f64>,
    pub west_lng: Option<f64>,
}

impl GeoSearchRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !geo::valid_coordinates(self.latitude, self.longitude) {
            return Err(ApiError::Validation("invalid center coordinates".into()));
        }

        match self.search_type {
            GeoSearchKind::Radius => match self.radius_km {
                Some(radius) if radius > 0.0 => Ok(()),
                Some(_) => Err(ApiError::Validation("radius_km must be positive".into())),
                None => Err(ApiError::Validation(
                    "radius search requires radius_km".into(),
                )),
            },
            GeoSearchKind::Rectangle => {
                let (Some(north), Some(south), Some(east), Some(west)) =
                    (self.north_lat, self.south_lat, self.east_lng, self.west_lng)
                else {
                    return Err(ApiError::Validation(
                        "rectangle search requires north_lat, south_lat, east_lng and west_lng"
                            .into(),
                    ));
                };
                if !geo::valid_coordinates(north, east) || !geo::valid_coordinates(south, west) {
                    return Err(ApiError::Validation("invalid rectangle bounds".into()));
                }
                if north <= south {
                    return Err(ApiError::Validation(
                        "north_lat must be greater than south_lat".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BuildingResponse {
    pub id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<BuildingRecord> for BuildingResponse {
    fn from(record: BuildingRecord) -> Self {
        Self {
            id: record.id,
            address: record.address,
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}

/// Activity with nested children (tree endpoints).
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub level: i32,
    pub children: Vec<ActivityResponse>,
}

impl From<ActivityNode> for ActivityResponse {
    fn from(node: ActivityNode) -> Self {
        Self {
            id: node.record.id,
            name: node.record.name,
            parent_id: node.record.parent_id,
            level: node.record.level,
            children: node.children.into_iter().map(Self::from).collect(),
        }
    }
}

/// Activity without children (embedded in organization responses).
#[derive(Debug, Serialize)]
pub struct ActivityShallowResponse {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub level: i32,
}

impl From<ActivityRecord> for ActivityShallowResponse {
    fn from(record: ActivityRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            parent_id: record.parent_id,
            level: record.level,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhoneResponse {
    pub id: i64,
    pub phone_number: String,
}

impl From<PhoneRecord> for PhoneResponse {
    fn from(record: PhoneRecord) -> Self {
        Self {
            id: record.id,
            phone_number: record.phone_number,
        }
    }
}

/// Full organization representation.
#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
    pub building: Option<BuildingResponse>,
    pub phones: Vec<PhoneResponse>,
    pub activities: Vec<ActivityShallowResponse>,
}

impl From<OrganizationDetail> for OrganizationResponse {
    fn from(detail: OrganizationDetail) -> Self {
        Self {
            id: detail.id,
            name: detail.name,
            building_id: detail.building_id,
            building: detail.building.map(BuildingResponse::from),
            phones: detail.phones.into_iter().map(PhoneResponse::from).collect(),
            activities: detail
                .activities
                .into_iter()
                .map(ActivityShallowResponse::from)
                .collect(),
        }
    }
}

/// Compact organization representation for the paginated list.
#[derive(Debug, Serialize)]
pub struct OrganizationSummary {
    pub id: i64,
    pub name: String,
    pub building_address: String,
    pub phone_count: usize,
}

impl From<OrganizationDetail> for OrganizationSummary {
    fn from(detail: OrganizationDetail) -> Self {
        Self {
            id: detail.id,
            name: detail.name,
            building_address: detail
                .building
                .map(|b| b.address)
                .unwrap_or_else(|| "Address unavailable".to_string()),
            phone_count: detail.phones.len(),
        }
    }
}

/// Paginated organization list.
#[derive(Debug, Serialize)]
pub struct PaginatedOrganizations {
    pub items: Vec<OrganizationSummary>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub pages: i64,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: String,
    pub version: &'static str,
}

/// Number of pages needed for `total` items at `per_page` each.
pub fn page_count(total: i64, per_page: i64) -> i64 {
    if per_page <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    10
}

fn default_limit() -> i64 {
    100
}

pub(super) fn default_true() -> bool {
    true
}
