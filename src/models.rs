use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct SignupRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_number: Option<String>,
    pub country_code: String,
    pub country_name: String,
    pub city: String,
    pub area: String,
    pub created_at: DateTime<Utc>,
}

/// A submission that passed validation, normalized for insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignup {
    pub name: String,
    pub email: String,
    pub contact_number: Option<String>,
    pub country_code: String,
    pub country_name: String,
    pub city: String,
    pub area: String,
}

/// The `city, country_name` projection used for statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRow {
    pub city: String,
    pub country_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityGroup {
    pub city: String,
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupOutcome {
    pub city: String,
    pub city_count: u64,
}

/// Columns that can be filtered on with an equality count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    City,
}

impl RecordField {
    pub const fn column(self) -> &'static str {
        match self {
            Self::City => "city",
        }
    }
}

/// Anything carrying a city and a country name can be aggregated.
pub trait Located {
    fn city(&self) -> &str;
    fn country(&self) -> &str;
}

impl Located for SignupRecord {
    fn city(&self) -> &str {
        &self.city
    }

    fn country(&self) -> &str {
        &self.country_name
    }
}

impl Located for LocationRow {
    fn city(&self) -> &str {
        &self.city
    }

    fn country(&self) -> &str {
        &self.country_name
    }
}

