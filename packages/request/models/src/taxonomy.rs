//! Directorate taxonomy for municipal service requests.
//!
//! The source data uses a closed set of directorate names; normalizing them
//! into an enum at ingestion catches typos and upstream schema drift before
//! any downstream stage runs.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Municipal directorate responsible for a service request.
///
/// String forms match the source data exactly (upper case, spaces).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Directorate {
    /// Roads, public transport, and traffic management.
    #[strum(serialize = "URBAN MOBILITY")]
    #[serde(rename = "URBAN MOBILITY")]
    UrbanMobility,

    /// Water supply, sewerage, and pollution control.
    #[strum(serialize = "WATER AND SANITATION")]
    #[serde(rename = "WATER AND SANITATION")]
    WaterAndSanitation,

    /// Electricity generation and distribution.
    #[strum(serialize = "ENERGY")]
    #[serde(rename = "ENERGY")]
    Energy,

    /// Public housing.
    #[strum(serialize = "HUMAN SETTLEMENTS")]
    #[serde(rename = "HUMAN SETTLEMENTS")]
    HumanSettlements,

    /// Refuse collection and disposal.
    #[strum(serialize = "URBAN WASTE MANAGEMENT")]
    #[serde(rename = "URBAN WASTE MANAGEMENT")]
    UrbanWasteManagement,

    /// Rates, billing, and revenue.
    #[strum(serialize = "FINANCE")]
    #[serde(rename = "FINANCE")]
    Finance,

    /// Libraries, clinics, parks, and recreation.
    #[strum(serialize = "COMMUNITY SERVICES AND HEALTH")]
    #[serde(rename = "COMMUNITY SERVICES AND HEALTH")]
    CommunityServicesAndHealth,

    /// Law enforcement, fire, and emergency services.
    #[strum(serialize = "SAFETY AND SECURITY")]
    #[serde(rename = "SAFETY AND SECURITY")]
    SafetyAndSecurity,

    /// Internal administration.
    #[strum(serialize = "CORPORATE SERVICES")]
    #[serde(rename = "CORPORATE SERVICES")]
    CorporateServices,

    /// Business support and investment.
    #[strum(serialize = "ECONOMIC GROWTH")]
    #[serde(rename = "ECONOMIC GROWTH")]
    EconomicGrowth,

    /// Executive office.
    #[strum(serialize = "OFFICE OF THE CITY MANAGER")]
    #[serde(rename = "OFFICE OF THE CITY MANAGER")]
    OfficeOfTheCityManager,

    /// Spatial planning and environmental management.
    #[strum(serialize = "SPATIAL PLANNING AND ENVIRONMENT")]
    #[serde(rename = "SPATIAL PLANNING AND ENVIRONMENT")]
    SpatialPlanningAndEnvironment,
}

impl Directorate {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::UrbanMobility,
            Self::WaterAndSanitation,
            Self::Energy,
            Self::HumanSettlements,
            Self::UrbanWasteManagement,
            Self::Finance,
            Self::CommunityServicesAndHealth,
            Self::SafetyAndSecurity,
            Self::CorporateServices,
            Self::EconomicGrowth,
            Self::OfficeOfTheCityManager,
            Self::SpatialPlanningAndEnvironment,
        ]
    }
}
