//! Reference ports used as the origin of the distance penalty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coords::LatLon;
use crate::error::HotspotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    Paita,
    Chimbote,
    #[default]
    Callao,
    Pisco,
    Matarani,
}

impl Port {
    /// North to south.
    pub const ALL: [Port; 5] = [Port::Paita, Port::Chimbote, Port::Callao, Port::Pisco, Port::Matarani];

    pub fn name(self) -> &'static str {
        match self {
            Port::Paita => "Paita",
            Port::Chimbote => "Chimbote",
            Port::Callao => "Callao",
            Port::Pisco => "Pisco",
            Port::Matarani => "Matarani",
        }
    }

    pub fn location(self) -> LatLon {
        match self {
            Port::Paita => LatLon::new(-5.09, -81.11),
            Port::Chimbote => LatLon::new(-9.07, -78.59),
            Port::Callao => LatLon::new(-12.06, -77.15),
            Port::Pisco => LatLon::new(-13.71, -76.22),
            Port::Matarani => LatLon::new(-17.00, -72.10),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Port {
    type Err = HotspotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Port::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Port::ALL.iter().map(|p| p.name()).collect();
                HotspotError::InvalidInput(format!("unknown port '{s}' (known: {})", known.join(", ")))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!("callao".parse::<Port>().unwrap(), Port::Callao);
        assert_eq!("  PAITA ".parse::<Port>().unwrap(), Port::Paita);
        assert_eq!("Matarani".parse::<Port>().unwrap(), Port::Matarani);
    }

    #[test]
    fn unknown_port_is_rejected() {
        assert!(matches!("Lima".parse::<Port>(), Err(HotspotError::InvalidInput(_))));
    }

    #[test]
    fn default_is_callao() {
        assert_eq!(Port::default(), Port::Callao);
        assert_eq!(Port::default().location(), LatLon::new(-12.06, -77.15));
    }

    #[test]
    fn ports_run_north_to_south() {
        assert!(Port::ALL.windows(2).all(|w| w[0].location().lat > w[1].location().lat));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for p in Port::ALL {
            assert_eq!(p.to_string().parse::<Port>().unwrap(), p);
        }
    }
}
