//! Décodage des octets importés en FeatureCollection

pub mod delimited;
pub mod geo_json;
pub mod text;

pub use delimited::parse_csv;
pub use geo_json::parse_geojson;
pub use text::{charset_from_content_type, decode_text, resolve_encoding};

use geojson::FeatureCollection;

use crate::GeoIngestError;

/// Décodeur externe de shapefiles zippés
pub trait ShapefileDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], source_label: &str) -> Result<FeatureCollection, GeoIngestError>;
}

/// Décode un jeu de données selon son extension
pub fn decode_dataset(
    bytes: &[u8],
    extension: &str,
    source_label: &str,
    charset: Option<&str>,
    shapefile: Option<&dyn ShapefileDecoder>,
) -> Result<FeatureCollection, GeoIngestError> {
    match extension {
        "geojson" | "json" => parse_geojson(&decode_text(bytes, charset), source_label),
        "csv" => parse_csv(&decode_text(bytes, charset), source_label),
        "zip" => match shapefile {
            Some(decoder) => decoder.decode(bytes, source_label),
            None => Err(GeoIngestError::parse_error(
                source_label,
                "no shapefile decoder is configured for .zip bundles",
            )),
        },
        other => Err(GeoIngestError::UnsupportedExtension(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyShapefile;

    impl ShapefileDecoder for EmptyShapefile {
        fn decode(&self, _bytes: &[u8], _label: &str) -> Result<FeatureCollection, GeoIngestError> {
            Ok(FeatureCollection {
                bbox: None,
                features: Vec::new(),
                foreign_members: None,
            })
        }
    }

    #[test]
    fn test_dispatch_by_extension() {
        let fc = decode_dataset(b"lat,lon\n1,2\n", "csv", "a.csv", None, None).unwrap();
        assert_eq!(fc.features.len(), 1);

        let fc = decode_dataset(
            br#"{"type":"FeatureCollection","features":[]}"#,
            "json",
            "a.json",
            None,
            None,
        )
        .unwrap();
        assert!(fc.features.is_empty());
    }

    #[test]
    fn test_zip_requires_decoder() {
        let err = decode_dataset(b"PK", "zip", "a.zip", None, None).unwrap_err();
        assert!(matches!(err, GeoIngestError::Parse { .. }));

        let fc = decode_dataset(b"PK", "zip", "a.zip", None, Some(&EmptyShapefile)).unwrap();
        assert!(fc.features.is_empty());
    }
}
