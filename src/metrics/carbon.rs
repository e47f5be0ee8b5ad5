//! Carbon estimation utilities
//!
//! Converts transferred bytes into estimated grams of CO2 using a
//! selectable energy model.

use serde::{Deserialize, Serialize};

use crate::PipelineError;

// One-byte model: energy per byte in the data centre and across an
// average of wired, wifi and 4G networks.
const ONE_BYTE_KWH_PER_BYTE_IN_DC: f64 = 0.000_000_000_72;
const ONE_BYTE_FIXED_NETWORK_WIRED: f64 = 0.000_000_000_43;
const ONE_BYTE_FIXED_NETWORK_WIFI: f64 = 0.000_000_001_52;
const ONE_BYTE_FOUR_G_MOBILE: f64 = 0.000_000_008_84;
const ONE_BYTE_CO2_PER_KWH_IN_DC_GREY: f64 = 519.0;
const ONE_BYTE_CO2_PER_KWH_IN_DC_GREEN: f64 = 0.0;
const ONE_BYTE_CO2_PER_KWH_NETWORK_GREY: f64 = 475.0;

// Sustainable Web Design model: system energy per gigabyte split
// into segments, with grid intensity in g/kWh.
const SWD_KWH_PER_GB: f64 = 0.81;
const SWD_DATA_CENTER_SHARE: f64 = 0.15;
const SWD_NETWORK_SHARE: f64 = 0.14;
const SWD_DEVICE_SHARE: f64 = 0.52;
const SWD_PRODUCTION_SHARE: f64 = 0.19;
const SWD_GLOBAL_GRID_INTENSITY: f64 = 442.0;
const SWD_RENEWABLES_GRID_INTENSITY: f64 = 50.0;

const BYTES_PER_GB: f64 = 1_000_000_000.0;

/// Energy model used to turn bytes into grams of CO2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CarbonModel {
    /// Flat per-byte model (data centre + network energy)
    #[default]
    #[serde(rename = "one-byte")]
    OneByte,
    /// Segmented model covering data centre, network, device and production
    #[serde(rename = "swd")]
    SustainableWebDesign,
}

impl std::str::FromStr for CarbonModel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "one-byte" | "onebyte" | "1byte" => Ok(CarbonModel::OneByte),
            "swd" | "sustainable-web-design" => Ok(CarbonModel::SustainableWebDesign),
            _ => Err(PipelineError::Config(format!(
                "Invalid carbon model: {}. Use 'one-byte' or 'swd'",
                s
            ))),
        }
    }
}

impl std::fmt::Display for CarbonModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CarbonModel::OneByte => write!(f, "one-byte"),
            CarbonModel::SustainableWebDesign => write!(f, "swd"),
        }
    }
}

impl CarbonModel {
    /// Grams of CO2 for transferring `bytes`, given the hosting status
    pub fn co2_grams(&self, bytes: f64, green_hosted: bool) -> f64 {
        if bytes <= 0.0 || !bytes.is_finite() {
            return 0.0;
        }
        match self {
            CarbonModel::OneByte => one_byte_grams(bytes, green_hosted),
            CarbonModel::SustainableWebDesign => swd_grams(bytes, green_hosted),
        }
    }
}

fn one_byte_grams(bytes: f64, green_hosted: bool) -> f64 {
    let network_kwh_per_byte = (ONE_BYTE_FIXED_NETWORK_WIRED
        + ONE_BYTE_FIXED_NETWORK_WIFI
        + ONE_BYTE_FOUR_G_MOBILE)
        / 3.0;

    let dc_energy = bytes * ONE_BYTE_KWH_PER_BYTE_IN_DC;
    let network_energy = bytes * network_kwh_per_byte;

    let dc_intensity = if green_hosted {
        ONE_BYTE_CO2_PER_KWH_IN_DC_GREEN
    } else {
        ONE_BYTE_CO2_PER_KWH_IN_DC_GREY
    };

    dc_energy * dc_intensity + network_energy * ONE_BYTE_CO2_PER_KWH_NETWORK_GREY
}

fn swd_grams(bytes: f64, green_hosted: bool) -> f64 {
    let energy = bytes / BYTES_PER_GB * SWD_KWH_PER_GB;

    let dc_intensity = if green_hosted {
        SWD_RENEWABLES_GRID_INTENSITY
    } else {
        SWD_GLOBAL_GRID_INTENSITY
    };

    let data_center = energy * SWD_DATA_CENTER_SHARE * dc_intensity;
    let network = energy * SWD_NETWORK_SHARE * SWD_GLOBAL_GRID_INTENSITY;
    let device = energy * SWD_DEVICE_SHARE * SWD_GLOBAL_GRID_INTENSITY;
    let production = energy * SWD_PRODUCTION_SHARE * SWD_GLOBAL_GRID_INTENSITY;

    data_center + network + device + production
}

/// A model bound to a site's hosting status
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonEstimator {
    pub model: CarbonModel,
    pub green_hosted: bool,
}

impl CarbonEstimator {
    pub fn new(model: CarbonModel, green_hosted: bool) -> Self {
        Self {
            model,
            green_hosted,
        }
    }

    /// Grams of CO2 for a byte count
    pub fn grams(&self, bytes: u64) -> f64 {
        self.model.co2_grams(bytes as f64, self.green_hosted)
    }
}
