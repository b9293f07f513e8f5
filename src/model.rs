use std::fmt;

use crate::geo::LatLng;

/// Stable identity of a contributed tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(pub u64);

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A community-contributed fruit tree
#[derive(Clone, Debug, PartialEq)]
pub struct TreeRecord {
    pub id: TreeId,
    /// Fruit type tag, e.g. "Lemon"
    pub kind: String,
    pub species: String,
    pub position: LatLng,
    pub in_season: bool,
    pub tooltip: String,
}

impl TreeRecord {
    /// Build a record with the default "<type> Tree / <species>" tooltip
    pub fn new(id: u64, kind: &str, species: &str, position: LatLng, in_season: bool) -> Self {
        let mut tooltip = format!("{kind} Tree\n{species}");
        if in_season {
            tooltip.push_str("\n✨ In Season ✨");
        }
        Self {
            id: TreeId(id),
            kind: kind.to_string(),
            species: species.to_string(),
            position,
            in_season,
            tooltip,
        }
    }
}

/// The viewer's position, or the fallback center when no fix is available
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UserPosition {
    pub position: LatLng,
    pub is_default: bool,
}

impl UserPosition {
    pub fn fix(position: LatLng) -> Self {
        Self {
            position,
            is_default: false,
        }
    }

    pub fn fallback(position: LatLng) -> Self {
        Self {
            position,
            is_default: true,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.is_default {
            "Default Location"
        } else {
            "Your Location"
        }
    }
}

/// The point picked while contributing a new tree
pub type SelectionPoint = LatLng;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tooltip_mentions_season() {
        let lemon = TreeRecord::new(1, "Lemon", "Citrus limon", LatLng::new(0.0, 0.0), true);
        assert!(lemon.tooltip.contains("In Season"));
        let fig = TreeRecord::new(2, "Fig", "Ficus carica", LatLng::new(0.0, 0.0), false);
        assert_eq!(fig.tooltip, "Fig Tree\nFicus carica");
    }

    #[test]
    fn test_user_label() {
        let p = LatLng::new(1.0, 2.0);
        assert_eq!(UserPosition::fix(p).label(), "Your Location");
        assert_eq!(UserPosition::fallback(p).label(), "Default Location");
    }
}
