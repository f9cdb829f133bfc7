//! Calendar and the per-tile climate model.
//!
//! Temperature depends on latitude (the sunlight angle, `world_y / total_max_y`),
//! the season (an angle offset scaled by axial tilt) and elevation. Tiles
//! whose magma reaches the surface are molten regardless of the sun.

use serde::{Deserialize, Serialize};

use crate::params::TerrainParams;

// =============================================================================
// CALENDAR
// =============================================================================

/// Seasonal sunlight angle offset per month, before axial tilt scaling.
pub const ANGLE_DELTAS: [f64; 12] = [
    0.866_025_403_784_438_6,
    1.0,
    0.866_025_403_784_438_6,
    0.5,
    0.0,
    -0.5,
    -0.866_025_403_784_438_6,
    -1.0,
    -0.866_025_403_784_438_6,
    -0.5,
    0.0,
    0.5,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Month {
    #[default]
    January = 0,
    February = 1,
    March = 2,
    April = 3,
    May = 4,
    June = 5,
    July = 6,
    August = 7,
    September = 8,
    October = 9,
    November = 10,
    December = 11,
}

impl Month {
    pub fn all() -> [Month; 12] {
        [
            Month::January,
            Month::February,
            Month::March,
            Month::April,
            Month::May,
            Month::June,
            Month::July,
            Month::August,
            Month::September,
            Month::October,
            Month::November,
            Month::December,
        ]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Month for a zero-based index, wrapping past December.
    pub fn from_index(index: usize) -> Month {
        Self::all()[index % 12]
    }

    pub fn next(&self) -> Month {
        Self::from_index(self.index() + 1)
    }

    /// Unscaled seasonal angle offset.
    pub fn angle_delta(&self) -> f64 {
        ANGLE_DELTAS[self.index()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// CLIMATE MODEL
// =============================================================================

/// Reported for tiles where magma is at or above both land and water.
pub const MOLTEN_TEMPERATURE: i32 = 1000;

/// Sea-level pressure in millibars.
pub const BASE_PRESSURE: i32 = 1000;

/// Planet-wide climate constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Climate {
    pub axial_tilt: f64,
    /// Equatorial temperature in °C
    pub base_temperature: i32,
    pub temperature_difference: i32,
    pub height_cooling_factor: f64,
    /// Highest world y; maps latitude onto `[-1, 1]`
    pub total_max_y: i32,
}

impl Climate {
    pub fn new(params: &TerrainParams, total_max_y: i32) -> Self {
        Self {
            axial_tilt: params.axial_tilt,
            base_temperature: params.base_temperature,
            temperature_difference: params.temperature_difference,
            height_cooling_factor: params.height_cooling_factor,
            total_max_y,
        }
    }

    /// Angle offset applied in `month`.
    pub fn seasonal_delta(&self, month: Month) -> f64 {
        month.angle_delta() * self.axial_tilt
    }

    /// Temperature of a tile at latitude `world_y` with sunlight shifted by
    /// `delta_angle`.
    pub fn temperature(&self, world_y: i32, magma: i32, land: i32, water: i32, delta_angle: f64) -> i32 {
        if magma >= land && magma >= water {
            return MOLTEN_TEMPERATURE;
        }
        let average_angle = if self.total_max_y == 0 {
            0.0
        } else {
            world_y as f64 / self.total_max_y as f64
        };
        let mut angle = (average_angle + delta_angle).abs();
        // past the pole the sun comes back down
        if angle > 1.0 {
            angle = 2.0 - angle;
        }
        let latitude = angle * self.temperature_difference as f64;
        let height = land.max(water) as f64 * self.height_cooling_factor;
        self.base_temperature + (latitude + height) as i32
    }
}

/// Atmospheric pressure in millibars; roughly 12 mb per 100 m of land.
pub fn pressure(temperature: i32, land: i32) -> i32 {
    BASE_PRESSURE + temperature / 2 + land / -8
}

/// Packed `0xAARRGGBB` soil colour. Dry soil is darker, warm soil redder,
/// cold soil bluer.
pub fn soil_color(temperature: i32, humidity: i32) -> u32 {
    let delta_temperature = if temperature <= -32 {
        0
    } else if temperature >= 32 {
        16
    } else {
        (temperature + 32) / 4
    };
    let delta_humidity = if humidity <= -48 {
        96
    } else if humidity >= 0 {
        0
    } else {
        -2 * humidity
    };
    let base = (112 + delta_humidity) as u32;
    let red = base + delta_temperature as u32;
    let green = base;
    let blue = base - delta_temperature as u32;
    0xFF00_0000 | (red << 16) | (green << 8) | blue
}
