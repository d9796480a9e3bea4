//! Placemark extraction
//!
//! Two read-only queries against a resolved KML document:
//!
//! - `extract_coordinates`: (latitude, longitude, styleUrl) per placemark,
//!   with the lon,lat order of the source swapped to lat,lon
//! - `extract_addresses`: placemark names
//!
//! Each query re-parses the document from scratch. A placemark missing an
//! expected field is skipped with a warning; only filesystem and XML-level
//! failures abort the query.

use std::fmt;
use std::fs::File;
use std::io::BufReader;

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::resolve::ResolvedDocument;

/// KML 2.2 namespace; elements outside it are ignored.
const KML_NS: &str = "http://www.opengis.net/kml/2.2";

/// One extracted placemark position, coordinates kept as the decimal text
/// found in the document (never reformatted through a float).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub latitude: String,
    pub longitude: String,
    pub style_url: String,
}

/// Why a placemark was excluded from an extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No Point geometry or no coordinates text below it.
    NoGeometry,
    /// Coordinates text has fewer than two comma-separated tokens.
    ShortCoordinates,
    NoStyleUrl,
    NoName,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoGeometry => "no point coordinates",
            SkipReason::ShortCoordinates => "coordinates text too short",
            SkipReason::NoStyleUrl => "no styleUrl",
            SkipReason::NoName => "no name",
        };
        f.write_str(text)
    }
}

/// Raw per-placemark record as found in the document, before the
/// per-pass field requirements are applied.
#[derive(Debug, Default)]
struct RawPlacemark {
    name: Option<String>,
    coordinates: Option<String>,
    style_url: Option<String>,
}

/// Text-bearing child element currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Coordinates,
    StyleUrl,
}

/// Extract (latitude, longitude, styleUrl) triples in document order.
///
/// Placemarks missing coordinates or a styleUrl are skipped with a
/// warning and do not abort the pass.
pub fn extract_coordinates(doc: &ResolvedDocument) -> Result<Vec<Coordinate>, ExtractError> {
    let records = read_placemarks(doc)?;
    let mut coordinates = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for (index, record) in records.iter().enumerate() {
        match coordinate_record(record) {
            Ok(coordinate) => coordinates.push(coordinate),
            Err(reason) => {
                skipped += 1;
                warn!(
                    index,
                    name = record.name.as_deref().unwrap_or("<unnamed>"),
                    %reason,
                    "Skipping placemark"
                );
            }
        }
    }

    debug!(kept = coordinates.len(), skipped, "Extracted coordinates");
    Ok(coordinates)
}

/// Extract placemark names in document order.
///
/// Unnamed placemarks are skipped with a warning.
pub fn extract_addresses(doc: &ResolvedDocument) -> Result<Vec<String>, ExtractError> {
    let records = read_placemarks(doc)?;
    let mut addresses = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for (index, record) in records.iter().enumerate() {
        match record.name.as_deref().ok_or(SkipReason::NoName) {
            Ok(name) => addresses.push(name.to_string()),
            Err(reason) => {
                skipped += 1;
                warn!(index, %reason, "Skipping placemark");
            }
        }
    }

    debug!(kept = addresses.len(), skipped, "Extracted addresses");
    Ok(addresses)
}

/// Apply the coordinate-pass field requirements to one raw record.
///
/// KML stores `lon,lat[,alt]`; the emitted pair is swapped to lat,lon.
fn coordinate_record(record: &RawPlacemark) -> Result<Coordinate, SkipReason> {
    let raw = record
        .coordinates
        .as_deref()
        .ok_or(SkipReason::NoGeometry)?;
    let tokens: Vec<&str> = raw.trim().split(',').collect();
    if tokens.len() < 2 {
        return Err(SkipReason::ShortCoordinates);
    }
    let style_url = record.style_url.as_deref().ok_or(SkipReason::NoStyleUrl)?;

    Ok(Coordinate {
        latitude: tokens[1].to_string(),
        longitude: tokens[0].to_string(),
        style_url: style_url.to_string(),
    })
}

/// Parse the document and collect one raw record per placemark, in
/// document order. First match wins for every field.
fn read_placemarks(doc: &ResolvedDocument) -> Result<Vec<RawPlacemark>, ExtractError> {
    let file = File::open(doc.path())?;
    let mut reader = NsReader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text(true);

    let mut placemarks = Vec::new();
    let mut current: Option<RawPlacemark> = None;
    let mut in_point = false;
    let mut field: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_resolved_event_into(&mut buf) {
            Err(e) => return Err(ExtractError::Xml(e.to_string())),
            Ok((resolve, Event::Start(e))) => {
                if is_kml(&resolve) {
                    match e.local_name().as_ref() {
                        b"Placemark" => {
                            current = Some(RawPlacemark::default());
                            in_point = false;
                        }
                        b"Point" if current.is_some() => in_point = true,
                        b"name" if current.is_some() => field = Some(Field::Name),
                        b"coordinates" if current.is_some() && in_point => {
                            field = Some(Field::Coordinates)
                        }
                        b"styleUrl" if current.is_some() => field = Some(Field::StyleUrl),
                        _ => {}
                    }
                }
            }
            Ok((_, Event::Text(e))) => {
                if let (Some(record), Some(kind)) = (current.as_mut(), field) {
                    let text = e
                        .unescape()
                        .map_err(|e| ExtractError::Xml(e.to_string()))?;
                    set_field(record, kind, text.as_ref());
                }
            }
            Ok((_, Event::CData(e))) => {
                if let (Some(record), Some(kind)) = (current.as_mut(), field) {
                    let text = String::from_utf8_lossy(e.as_ref());
                    set_field(record, kind, text.as_ref());
                }
            }
            Ok((resolve, Event::End(e))) => {
                if is_kml(&resolve) {
                    match e.local_name().as_ref() {
                        b"Placemark" => {
                            if let Some(record) = current.take() {
                                placemarks.push(record);
                            }
                            in_point = false;
                        }
                        b"Point" => in_point = false,
                        _ => {}
                    }
                }
                field = None;
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
        }
        buf.clear();
    }

    Ok(placemarks)
}

fn is_kml(resolve: &ResolveResult) -> bool {
    matches!(resolve, ResolveResult::Bound(Namespace(ns)) if *ns == KML_NS.as_bytes())
}

fn set_field(record: &mut RawPlacemark, kind: Field, text: &str) {
    let slot = match kind {
        Field::Name => &mut record.name,
        Field::Coordinates => &mut record.coordinates,
        Field::StyleUrl => &mut record.style_url,
    };
    if slot.is_none() {
        *slot = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolver;
    use pretty_assertions::assert_eq;

    fn kml_document(placemarks: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
<Document>
<name>Flea market stands</name>
{placemarks}
</Document>
</kml>"#
        )
    }

    fn resolved(kml: &str) -> (tempfile::TempDir, ResolvedDocument) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("places.kml");
        std::fs::write(&input, kml).unwrap();
        let doc = Resolver::new(dir.path().join("staging"))
            .resolve(&input)
            .unwrap();
        (dir, doc)
    }

    const TWO_PLACEMARKS: &str = "\
<Placemark><name>A</name><Point><coordinates>11.5,48.1,0</coordinates></Point><styleUrl>#s1</styleUrl></Placemark>
<Placemark><name>B</name><Point><coordinates>11.6,48.2,0</coordinates></Point><styleUrl>#s2</styleUrl></Placemark>";

    #[test]
    fn test_coordinates_swap_lon_lat_and_keep_text() {
        let (_dir, doc) = resolved(&kml_document(TWO_PLACEMARKS));
        let coordinates = extract_coordinates(&doc).unwrap();

        assert_eq!(
            coordinates,
            vec![
                Coordinate {
                    latitude: "48.1".into(),
                    longitude: "11.5".into(),
                    style_url: "#s1".into(),
                },
                Coordinate {
                    latitude: "48.2".into(),
                    longitude: "11.6".into(),
                    style_url: "#s2".into(),
                },
            ]
        );
    }

    #[test]
    fn test_addresses_in_document_order() {
        let (_dir, doc) = resolved(&kml_document(TWO_PLACEMARKS));
        assert_eq!(extract_addresses(&doc).unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_missing_style_url_skips_only_that_placemark() {
        let placemarks = "\
<Placemark><name>A</name><Point><coordinates>11.5,48.1,0</coordinates></Point><styleUrl>#s1</styleUrl></Placemark>
<Placemark><name>B</name><Point><coordinates>11.6,48.2,0</coordinates></Point></Placemark>
<Placemark><name>C</name><Point><coordinates>11.7,48.3,0</coordinates></Point><styleUrl>#s3</styleUrl></Placemark>";
        let (_dir, doc) = resolved(&kml_document(placemarks));
        let coordinates = extract_coordinates(&doc).unwrap();

        let styles: Vec<&str> = coordinates.iter().map(|c| c.style_url.as_str()).collect();
        assert_eq!(styles, vec!["#s1", "#s3"]);
    }

    #[test]
    fn test_missing_name_skips_address_but_not_coordinates() {
        let placemarks = "\
<Placemark><name>A</name><Point><coordinates>11.5,48.1,0</coordinates></Point><styleUrl>#s1</styleUrl></Placemark>
<Placemark><Point><coordinates>11.6,48.2,0</coordinates></Point><styleUrl>#s2</styleUrl></Placemark>
<Placemark><name>C</name><Point><coordinates>11.7,48.3,0</coordinates></Point><styleUrl>#s3</styleUrl></Placemark>";
        let (_dir, doc) = resolved(&kml_document(placemarks));

        assert_eq!(extract_addresses(&doc).unwrap(), vec!["A", "C"]);
        assert_eq!(extract_coordinates(&doc).unwrap().len(), 3);
    }

    #[test]
    fn test_placemark_without_geometry_is_skipped() {
        let placemarks = "\
<Placemark><name>A</name><styleUrl>#s1</styleUrl></Placemark>
<Placemark><name>B</name><Point><coordinates>11.6,48.2,0</coordinates></Point><styleUrl>#s2</styleUrl></Placemark>";
        let (_dir, doc) = resolved(&kml_document(placemarks));
        let coordinates = extract_coordinates(&doc).unwrap();

        assert_eq!(coordinates.len(), 1);
        assert_eq!(coordinates[0].style_url, "#s2");
        // The same placemark still has a name, so the address pass keeps it
        assert_eq!(extract_addresses(&doc).unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_short_coordinates_text_is_skipped() {
        let placemarks =
            "<Placemark><name>A</name><Point><coordinates>11.5</coordinates></Point><styleUrl>#s1</styleUrl></Placemark>";
        let (_dir, doc) = resolved(&kml_document(placemarks));
        assert_eq!(extract_coordinates(&doc).unwrap(), vec![]);
    }

    #[test]
    fn test_document_name_is_not_an_address() {
        let (_dir, doc) = resolved(&kml_document(
            "<Placemark><name>Only</name></Placemark>",
        ));
        assert_eq!(extract_addresses(&doc).unwrap(), vec!["Only"]);
    }

    #[test]
    fn test_foreign_namespace_placemarks_are_ignored() {
        let kml = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:x="http://example.com/other">
<Document>
<x:Placemark><x:name>Nope</x:name></x:Placemark>
<Placemark><name>Yes</name><Point><coordinates>11.5,48.1</coordinates></Point><styleUrl>#s</styleUrl></Placemark>
</Document>
</kml>"#;
        let (_dir, doc) = resolved(kml);

        assert_eq!(extract_addresses(&doc).unwrap(), vec!["Yes"]);
        assert_eq!(extract_coordinates(&doc).unwrap().len(), 1);
    }

    #[test]
    fn test_umlauts_and_entities_in_names() {
        let placemarks = "<Placemark><name>Hirtenstra\u{df}e 17 &amp; 19</name></Placemark>";
        let (_dir, doc) = resolved(&kml_document(placemarks));
        assert_eq!(
            extract_addresses(&doc).unwrap(),
            vec!["Hirtenstra\u{df}e 17 & 19"]
        );
    }

    #[test]
    fn test_empty_document_yields_empty_lists() {
        let (_dir, doc) = resolved(&kml_document(""));
        assert_eq!(extract_coordinates(&doc).unwrap(), vec![]);
        assert_eq!(extract_addresses(&doc).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        let (_dir, doc) = resolved(
            "<kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document><Placemark></Wrong></Document></kml>",
        );
        let err = extract_coordinates(&doc).unwrap_err();
        assert!(matches!(err, ExtractError::Xml(_)));
    }
}
