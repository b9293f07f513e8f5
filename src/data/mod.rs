use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geojson::{feature::Id, Feature, GeoJson, Geometry, Value};
use tracing::{info, warn};

use crate::error::InitializationError;
use crate::geo::LatLng;
use crate::map::{BaseLayer, LineString};
use crate::model::TreeRecord;

/// Load a tree snapshot from a GeoJSON file of point features
pub fn load_trees(path: &Path) -> Result<Vec<TreeRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading trees from {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))?;
    let trees = parse_trees(&geojson);
    info!(count = trees.len(), path = %path.display(), "loaded trees");
    Ok(trees)
}

/// Extract tree records; features without an id or a point are skipped
pub fn parse_trees(geojson: &GeoJson) -> Vec<TreeRecord> {
    let features: Vec<&Feature> = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.iter().collect(),
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => Vec::new(),
    };

    features
        .into_iter()
        .enumerate()
        .filter_map(|(idx, feature)| {
            let tree = parse_tree(feature);
            if tree.is_none() {
                warn!(feature = idx, "skipping feature without numeric id or point geometry");
            }
            tree
        })
        .collect()
}

fn parse_tree(feature: &Feature) -> Option<TreeRecord> {
    // Prefer the properties id, fall back to the feature id
    let id = feature
        .property("id")
        .and_then(|v| v.as_u64())
        .or_else(|| match &feature.id {
            Some(Id::Number(n)) => n.as_u64(),
            _ => None,
        })?;

    let position = match &feature.geometry.as_ref()?.value {
        Value::Point(coords) if coords.len() >= 2 => LatLng::new(coords[1], coords[0]),
        _ => return None,
    };

    let text = |key: &str| feature.property(key).and_then(|v| v.as_str());
    let kind = text("type").unwrap_or("Tree");
    let species = text("species").unwrap_or("Unknown species");
    let in_season = feature
        .property("inSeason")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let mut tree = TreeRecord::new(id, kind, species, position, in_season);
    if let Some(tooltip) = text("tooltip") {
        tree.tooltip = tooltip.to_string();
    }
    Some(tree)
}

/// Load every GeoJSON file in `dir` as background line work.
/// A missing directory is an empty base layer; an unreadable file is fatal.
pub fn load_base_layer(dir: &Path) -> Result<BaseLayer, InitializationError> {
    let mut base = BaseLayer::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return Ok(base);
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("json") | Some("geojson")
            )
        })
        .collect();
    paths.sort();

    for path in paths {
        let fail = |reason: String| InitializationError::Basemap {
            path: path.clone(),
            reason,
        };
        let content = fs::read_to_string(&path).map_err(|e| fail(e.to_string()))?;
        let geojson: GeoJson = content.parse().map_err(|e: geojson::Error| fail(e.to_string()))?;
        let before = base.lines.len();
        process_geojson_lines(&geojson, |line| base.add_line(line));
        info!(path = %path.display(), lines = base.lines.len() - before, "loaded base layer");
    }

    Ok(base)
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| LatLng::new(c[1], c[0]))
        .collect()
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_line(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                if let Some(exterior) = rings.first() {
                    add_line(to_line(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Trees mapped around Buenos Aires, used when no file is given
pub fn sample_trees() -> Vec<TreeRecord> {
    let trees = [
        (1, "Lemon", "Citrus limon", -34.6037, -58.3816, true),
        (2, "Fig", "Ficus carica", -34.6057, -58.3845, false),
        (3, "Loquat", "Eriobotrya japonica", -34.601, -58.383, true),
        (4, "Mulberry", "Morus", -34.608, -58.38, true),
        (5, "Olive", "Olea europaea", -34.61, -58.385, false),
        (6, "Avocado", "Persea americana", -34.602, -58.379, true),
        (7, "Orange", "Citrus sinensis", -34.605, -58.387, true),
    ];
    trees
        .into_iter()
        .map(|(id, kind, species, lat, lng, in_season)| {
            TreeRecord::new(id, kind, species, LatLng::new(lat, lng), in_season)
        })
        .collect()
}

/// Only the in-season trees, as the map page's season filter shows them
pub fn in_season(trees: &[TreeRecord]) -> Vec<TreeRecord> {
    trees.iter().filter(|t| t.in_season).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TreeId;

    const TREES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-58.3816, -34.6037]},
             "properties": {"id": 1, "type": "Lemon", "species": "Citrus limon", "inSeason": true}},
            {"type": "Feature", "id": 9, "geometry": {"type": "Point", "coordinates": [-58.38, -34.60]},
             "properties": {"type": "Durian", "tooltip": "Smells strong"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
             "properties": {"type": "Fig"}},
            {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
             "properties": {"id": 4}}
        ]
    }"#;

    #[test]
    fn test_parse_trees() {
        let geojson: GeoJson = TREES.parse().unwrap();
        let trees = parse_trees(&geojson);
        assert_eq!(trees.len(), 2);

        assert_eq!(trees[0].id, TreeId(1));
        assert_eq!(trees[0].position, LatLng::new(-34.6037, -58.3816));
        assert!(trees[0].in_season);

        assert_eq!(trees[1].id, TreeId(9));
        assert_eq!(trees[1].kind, "Durian");
        assert_eq!(trees[1].species, "Unknown species");
        assert_eq!(trees[1].tooltip, "Smells strong");
        assert!(!trees[1].in_season);
    }

    #[test]
    fn test_lines_from_polygons() {
        let geojson: GeoJson = r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}"#
            .parse()
            .unwrap();
        let mut lines = Vec::new();
        process_geojson_lines(&geojson, |l| lines.push(l));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0][1], LatLng::new(0.0, 1.0));
    }

    #[test]
    fn test_missing_base_dir_is_empty() {
        let base = load_base_layer(Path::new("/nonexistent/fruit-map-data")).unwrap();
        assert!(!base.has_data());
    }

    #[test]
    fn test_sample_ids_are_unique() {
        let trees = sample_trees();
        let mut ids: Vec<_> = trees.iter().map(|t| t.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), trees.len());
        assert!(in_season(&trees).iter().all(|t| t.in_season));
    }
}
