//! Validation et lecture des fichiers locaux

use std::path::Path;

use tracing::debug;

use crate::types::Limits;
use crate::GeoIngestError;

/// Extensions acceptées pour un fichier local
pub const LOCAL_EXTENSIONS: &[&str] = &["zip", "csv", "geojson"];

/// Valide un fichier local à partir de son nom et de sa taille.
///
/// Retourne l'extension en minuscules.
pub fn validate_local_file(
    file_name: &str,
    size: u64,
    limits: &Limits,
) -> Result<String, GeoIngestError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| LOCAL_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| GeoIngestError::UnsupportedExtension(file_name.to_string()))?;

    if size > limits.max_local_file_bytes {
        return Err(GeoIngestError::TooLarge {
            label: file_name.to_string(),
            limit: limits.max_local_file_bytes,
        });
    }

    Ok(extension)
}

/// Fichier local validé et lu en mémoire
#[derive(Debug)]
pub struct LocalFile {
    pub name: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Valide puis lit un fichier local.
///
/// La taille est contrôlée sur les métadonnées avant toute lecture.
pub async fn read_local_file(path: &Path, limits: &Limits) -> Result<LocalFile, GeoIngestError> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let metadata = tokio::fs::metadata(path).await?;
    let extension = validate_local_file(&name, metadata.len(), limits)?;

    let bytes = tokio::fs::read(path).await?;
    debug!(file = %name, bytes = bytes.len(), "Local file read");

    Ok(LocalFile {
        name,
        extension,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_local_file() {
        let limits = Limits::default();
        assert_eq!(validate_local_file("a.GeoJSON", 10, &limits).unwrap(), "geojson");
        assert_eq!(validate_local_file("points.csv", 10, &limits).unwrap(), "csv");
        assert_eq!(validate_local_file("shapes.zip", 10, &limits).unwrap(), "zip");
    }

    #[test]
    fn test_rejects_extension() {
        let limits = Limits::default();
        assert!(matches!(
            validate_local_file("a.json", 10, &limits),
            Err(GeoIngestError::UnsupportedExtension(_))
        ));
        assert!(matches!(
            validate_local_file("README", 10, &limits),
            Err(GeoIngestError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn test_size_limit() {
        let limits = Limits::default();
        assert!(validate_local_file("a.csv", 1 << 30, &limits).is_ok());
        assert!(matches!(
            validate_local_file("a.csv", (1 << 30) + 1, &limits),
            Err(GeoIngestError::TooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        std::fs::write(&path, "lat,lon\n1,2\n").unwrap();

        let file = read_local_file(&path, &Limits::default()).await.unwrap();
        assert_eq!(file.extension, "csv");
        assert_eq!(file.name, "points.csv");
        assert_eq!(file.bytes.len(), 12);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = read_local_file(Path::new("nonexistent.csv"), &Limits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoIngestError::Io(_)));
    }
}
