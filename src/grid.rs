//! Coordinates and Maidenhead grid locators.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failure to parse a grid locator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Locators are 2, 4, 6 or 8 characters long
    #[error("locator must be 2, 4, 6 or 8 characters, got {0}")]
    Length(usize),

    /// A character is out of range for its position
    #[error("invalid character {character:?} at position {position}")]
    Character { character: char, position: usize },
}

/// A latitude/longitude pair in signed decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLong {
    /// Latitude, S < 0 < N
    pub lat: f64,
    /// Longitude, W < 0 < E
    pub long: f64,
}

impl LatLong {
    pub fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }
}

impl fmt::Display for LatLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.long)
    }
}

/// A Maidenhead grid locator such as `FN31pr`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    locator: String,
    #[serde(skip)]
    south_west: LatLong,
    #[serde(skip)]
    size: LatLong,
}

impl Grid {
    /// The normalized locator text (fields upper case, subsquares lower case)
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Precision of the locator in characters
    pub fn precision(&self) -> usize {
        self.locator.len()
    }

    /// The south-west corner of the cell
    pub fn south_west(&self) -> LatLong {
        self.south_west
    }

    /// The centre of the cell
    pub fn center(&self) -> LatLong {
        LatLong::new(
            self.south_west.lat + self.size.lat / 2.0,
            self.south_west.long + self.size.long / 2.0,
        )
    }
}

impl FromStr for Grid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.trim().chars().collect();
        if chars.is_empty() || chars.len() > 8 || chars.len() % 2 != 0 {
            return Err(GridError::Length(chars.len()));
        }

        let mut lat = -90.0;
        let mut long = -180.0;
        // Cell size of the pair being read, in degrees of (lat, long)
        let mut size = (10.0, 20.0);
        let mut locator = String::with_capacity(chars.len());

        for (pair, window) in chars.chunks(2).enumerate() {
            let (divisions, base) = match pair {
                0 => (18, 'A'),
                2 => (24, 'a'),
                _ => (10, '0'),
            };
            if pair > 0 {
                size = (size.0 / divisions as f64, size.1 / divisions as f64);
            }

            let mut digits = [0u32; 2];
            for (offset, c) in window.iter().enumerate() {
                let position = pair * 2 + offset;
                let normalized = if base == 'A' {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                };
                let value = (normalized as u32).wrapping_sub(base as u32);
                if !c.is_ascii() || value >= divisions {
                    return Err(GridError::Character {
                        character: *c,
                        position,
                    });
                }
                digits[offset] = value;
                locator.push(normalized);
            }

            long += digits[0] as f64 * size.1;
            lat += digits[1] as f64 * size.0;
        }

        Ok(Self {
            locator,
            south_west: LatLong::new(lat, long),
            size: LatLong::new(size.0, size.1),
        })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_character_locator() {
        let grid: Grid = "fn31PR".parse().unwrap();
        assert_eq!(grid.locator(), "FN31pr");
        assert_eq!(grid.precision(), 6);

        let center = grid.center();
        assert!((center.lat - 41.729).abs() < 0.01);
        assert!((center.long - (-72.708)).abs() < 0.01);
    }

    #[test]
    fn test_parse_field_and_square() {
        let grid: Grid = "JN".parse().unwrap();
        assert_eq!(grid.south_west(), LatLong::new(40.0, 0.0));
        assert_eq!(grid.center(), LatLong::new(45.0, 10.0));

        let grid: Grid = "JN89".parse().unwrap();
        assert_eq!(grid.south_west(), LatLong::new(49.0, 16.0));
    }

    #[test]
    fn test_parse_extended_square() {
        let grid: Grid = "DM32af12".parse().unwrap();
        assert_eq!(grid.locator(), "DM32af12");
        assert!(grid.center().lat > 32.0 && grid.center().lat < 33.0);
    }

    #[test]
    fn test_rejects_malformed_locators() {
        assert_eq!("FN3".parse::<Grid>(), Err(GridError::Length(3)));
        assert_eq!("".parse::<Grid>(), Err(GridError::Length(0)));
        assert_eq!(
            "ZZ00".parse::<Grid>(),
            Err(GridError::Character {
                character: 'Z',
                position: 0
            })
        );
        assert!("FN31zz".parse::<Grid>().is_err());
        assert!("FNAA".parse::<Grid>().is_err());
    }
}
