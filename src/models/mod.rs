use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod requests;

pub use requests::{
    LoginRequest, NewPriceEntry, NewProperty, NewReservation, PropertyUpdate, RegisterRequest,
    ReservationStatusUpdate, TokenPair,
};

/// Role carried in the access token claims
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Broker,
    Agent,
}

impl Role {
    /// Create, edit, delete and reprice listings
    pub fn can_manage_properties(self) -> bool {
        matches!(self, Role::Broker)
    }

    /// Place or update a hold on a property for a client
    pub fn can_reserve(self) -> bool {
        matches!(self, Role::Broker | Role::Agent)
    }
}

/// Location information for a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Listing lifecycle as reported by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    #[default]
    Available,
    Reserved,
    Sold,
}

/// A single point in a property's price history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub price: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Core property data model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Location,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: f32,
    #[serde(default)]
    pub area_sqm: f64,
    #[serde(default)]
    pub property_type: String,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default)]
    pub price_history: Vec<PriceEntry>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub broker_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// Price of the most recent history entry.
    ///
    /// History is not assumed to be ordered, so this picks by timestamp
    /// rather than by position.
    pub fn current_price(&self) -> Option<i64> {
        self.price_history
            .iter()
            .max_by_key(|entry| entry.recorded_at)
            .map(|entry| entry.price)
    }

    /// Price history ordered oldest first
    pub fn sorted_history(&self) -> Vec<PriceEntry> {
        let mut history = self.price_history.clone();
        history.sort_by_key(|entry| entry.recorded_at);
        history
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Active,
    Sold,
    Cancelled,
    Expired,
}

/// Time-bounded hold on a property for a prospective buyer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub property_id: i64,
    pub agent_id: i64,
    pub client_name: String,
    #[serde(default)]
    pub client_email: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: ReservationStatus,
    #[serde(default)]
    pub sale_price: Option<i64>,
    /// When the reservation was marked sold, if the backend records it
    #[serde(default)]
    pub sold_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Status as of `now`: an active hold past its end date has lapsed.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ReservationStatus {
        match self.status {
            ReservationStatus::Active if self.ends_at <= now => ReservationStatus::Expired,
            status => status,
        }
    }

    /// Date a sale is booked under; the hold's end date when none was recorded
    pub fn sale_date(&self) -> Option<DateTime<Utc>> {
        match self.status {
            ReservationStatus::Sold => Some(self.sold_at.unwrap_or(self.ends_at)),
            _ => None,
        }
    }
}
