//! Track writers: GeoJSON, GPX, KML and CSV for any `{id -> [points]}` map
//! (cyclone tracks, predicted paths, flown paths).
//!
//! All line-based formats split a track when consecutive points jump more
//! than 180 degrees of longitude, which happens when a track crosses the
//! antimeridian; without the split, renderers draw a line the wrong way
//! around the globe.

use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::json;

use crate::models::TrackPoint;
use crate::Result;

/// Tracks keyed by id (mission name, cyclone id, ...).
pub type TrackMap = BTreeMap<String, Vec<TrackPoint>>;

/// Split a track into antimeridian-safe segments.
fn split_segments(points: &[TrackPoint]) -> Vec<Vec<&TrackPoint>> {
    let mut segments: Vec<Vec<&TrackPoint>> = Vec::new();
    let mut current: Vec<&TrackPoint> = Vec::new();

    for point in points {
        if let Some(previous) = current.last() {
            if (point.longitude - previous.longitude).abs() > 180.0 {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(point);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// GeoJSON segment coordinates, with synthetic points inserted at the
/// +-180 boundary so each segment visibly terminates at the map edge.
fn geojson_segments(points: &[TrackPoint]) -> Vec<Vec<[f64; 2]>> {
    let mut segments: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();

    for point in points {
        let (lon, lat) = (point.longitude, point.latitude);
        if let Some(previous) = current.last() {
            let prev_lon = previous[0];
            if (lon - prev_lon).abs() > 180.0 {
                if prev_lon > 0.0 && lon < 0.0 {
                    current.push([180.0, lat]);
                    segments.push(std::mem::take(&mut current));
                    current.push([-180.0, lat]);
                } else if prev_lon < 0.0 && lon > 0.0 {
                    current.push([-180.0, lat]);
                    segments.push(std::mem::take(&mut current));
                    current.push([180.0, lat]);
                }
            }
        }
        current.push([lon, lat]);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Write a track map as a GeoJSON FeatureCollection of MultiLineStrings.
pub fn save_as_geojson(path: &Path, tracks: &TrackMap) -> Result<()> {
    let features: Vec<_> = tracks
        .iter()
        .map(|(id, points)| {
            json!({
                "type": "Feature",
                "properties": {
                    "id": id,
                    "start_time": points.first().map(TrackPoint::time_str),
                    "end_time": points.last().map(TrackPoint::time_str),
                },
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": geojson_segments(points),
                },
            })
        })
        .collect();

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    super::write_json_pretty(path, &collection)
}

/// Write a track map as GPX, one `<trk>` per track with one `<trkseg>` per
/// antimeridian-safe segment.
pub fn save_as_gpx(path: &Path, tracks: &TrackMap) -> Result<()> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", "WindBorne"));
    gpx.push_attribute(("xmlns", "http://www.topografix.com/GPX/1/1"));
    writer.write_event(Event::Start(gpx))?;

    for (id, points) in tracks {
        writer.write_event(Event::Start(BytesStart::new("trk")))?;
        write_text_element(&mut writer, "name", id)?;

        for segment in split_segments(points) {
            writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
            for point in segment {
                let mut trkpt = BytesStart::new("trkpt");
                trkpt.push_attribute(("lat", point.latitude.to_string().as_str()));
                trkpt.push_attribute(("lon", point.longitude.to_string().as_str()));
                writer.write_event(Event::Start(trkpt))?;
                if let Some(time) = &point.time {
                    write_text_element(&mut writer, "time", time)?;
                }
                writer.write_event(Event::End(BytesEnd::new("trkpt")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("trk")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;
    fs::write(path, writer.into_inner().into_inner())?;
    Ok(())
}

/// Write a track map as KML, one `<Placemark>` per track holding a
/// `<MultiGeometry>` of `<LineString>` segments.
pub fn save_as_kml(path: &Path, tracks: &TrackMap) -> Result<()> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut kml = BytesStart::new("kml");
    kml.push_attribute(("xmlns", "http://www.opengis.net/kml/2.2"));
    writer.write_event(Event::Start(kml))?;
    writer.write_event(Event::Start(BytesStart::new("Document")))?;

    for (id, points) in tracks {
        writer.write_event(Event::Start(BytesStart::new("Placemark")))?;
        write_text_element(&mut writer, "name", id)?;
        writer.write_event(Event::Start(BytesStart::new("MultiGeometry")))?;

        for segment in split_segments(points) {
            writer.write_event(Event::Start(BytesStart::new("LineString")))?;
            let coordinates = segment
                .iter()
                .map(|p| {
                    format!(
                        "{},{},{}",
                        p.longitude,
                        p.latitude,
                        p.altitude.unwrap_or(0.0)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            write_text_element(&mut writer, "coordinates", &coordinates)?;
            writer.write_event(Event::End(BytesEnd::new("LineString")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("MultiGeometry")))?;
        writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Document")))?;
    writer.write_event(Event::End(BytesEnd::new("kml")))?;
    fs::write(path, writer.into_inner().into_inner())?;
    Ok(())
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Write a track map as flat CSV. The id column is included for multi-track
/// maps (or when the caller insists).
pub fn save_as_csv(path: &Path, tracks: &TrackMap, require_ids: bool) -> Result<()> {
    let include_id = require_ids || tracks.len() > 1;
    let mut writer = csv::Writer::from_path(path)?;

    if include_id {
        writer.write_record(["id", "latitude", "longitude", "time"])?;
    } else {
        writer.write_record(["latitude", "longitude", "time"])?;
    }

    for (id, points) in tracks {
        for point in points {
            let latitude = point.latitude.to_string();
            let longitude = point.longitude.to_string();
            if include_id {
                writer.write_record([id.as_str(), &latitude, &longitude, point.time_str()])?;
            } else {
                writer.write_record([latitude.as_str(), &longitude, point.time_str()])?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64, time: &str) -> TrackPoint {
        TrackPoint {
            latitude: lat,
            longitude: lon,
            altitude: None,
            time: Some(time.to_string()),
        }
    }

    fn crossing_track() -> TrackMap {
        let mut tracks = TrackMap::new();
        tracks.insert(
            "WP_90".to_string(),
            vec![
                point(13.0, 178.0, "2025-08-01T00:00:00Z"),
                point(13.2, 179.5, "2025-08-01T06:00:00Z"),
                point(13.4, -179.5, "2025-08-01T12:00:00Z"),
                point(13.6, -178.0, "2025-08-01T18:00:00Z"),
            ],
        );
        tracks
    }

    #[test]
    fn test_split_on_antimeridian() {
        let tracks = crossing_track();
        let segments = split_segments(&tracks["WP_90"]);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1].len(), 2);
    }

    #[test]
    fn test_no_split_without_crossing() {
        let points = vec![
            point(10.0, 10.0, "2025-08-01T00:00:00Z"),
            point(11.0, 12.0, "2025-08-01T06:00:00Z"),
        ];
        assert_eq!(split_segments(&points).len(), 1);
    }

    #[test]
    fn test_geojson_inserts_boundary_points() {
        let tracks = crossing_track();
        let segments = geojson_segments(&tracks["WP_90"]);
        assert_eq!(segments.len(), 2);
        // First segment ends at +180, second starts at -180
        assert_eq!(segments[0].last().unwrap()[0], 180.0);
        assert_eq!(segments[1][0][0], -180.0);
        // Boundary points carry the latitude of the crossing point
        assert_eq!(segments[0].last().unwrap()[1], 13.4);
    }

    #[test]
    fn test_geojson_westward_crossing() {
        let points = vec![
            point(5.0, -179.0, "2025-08-01T00:00:00Z"),
            point(5.5, 179.0, "2025-08-01T06:00:00Z"),
        ];
        let segments = geojson_segments(&points);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].last().unwrap()[0], -180.0);
        assert_eq!(segments[1][0][0], 180.0);
    }

    #[test]
    fn test_geojson_output_is_multilinestring() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.geojson");
        save_as_geojson(&path, &crossing_track()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        let geometry = &value["features"][0]["geometry"];
        assert_eq!(geometry["type"], "MultiLineString");
        assert!(geometry["coordinates"].as_array().unwrap().len() >= 2);
        assert_eq!(value["features"][0]["properties"]["id"], "WP_90");
    }

    #[test]
    fn test_gpx_output_has_two_segments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.gpx");
        save_as_gpx(&path, &crossing_track()).unwrap();

        let gpx = fs::read_to_string(&path).unwrap();
        assert!(gpx.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert_eq!(gpx.matches("<trkseg>").count(), 2);
        assert_eq!(gpx.matches("<trkpt").count(), 4);
        assert!(gpx.contains("<name>WP_90</name>"));
        assert!(gpx.contains("<time>2025-08-01T00:00:00Z</time>"));
    }

    #[test]
    fn test_kml_output_has_two_linestrings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.kml");
        save_as_kml(&path, &crossing_track()).unwrap();

        let kml = fs::read_to_string(&path).unwrap();
        assert_eq!(kml.matches("<LineString>").count(), 2);
        assert!(kml.contains("<MultiGeometry>"));
        // lon,lat,altitude triples
        assert!(kml.contains("178,13,0"));
    }

    #[test]
    fn test_csv_single_track_omits_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.csv");
        save_as_csv(&path, &crossing_track(), false).unwrap();

        let csv = fs::read_to_string(&path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "latitude,longitude,time");
        assert_eq!(lines.next().unwrap(), "13,178,2025-08-01T00:00:00Z");
    }

    #[test]
    fn test_csv_multi_track_includes_id() {
        let mut tracks = crossing_track();
        tracks.insert(
            "WP_91".to_string(),
            vec![point(1.0, 2.0, "2025-08-01T00:00:00Z")],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");
        save_as_csv(&path, &tracks, false).unwrap();

        let csv = fs::read_to_string(&path).unwrap();
        assert!(csv.starts_with("id,latitude,longitude,time"));
        assert!(csv.contains("WP_91,1,2,"));
    }
}
