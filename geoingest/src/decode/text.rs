//! Décodage texte des octets importés

use encoding_rs::{Encoding, UTF_8};

/// Extrait le paramètre `charset` d'un en-tête Content-Type
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(|c| c == '"' || c == '\''))
        } else {
            None
        }
    })
}

/// Normalise un libellé d'encodage et le résout, UTF-8 par défaut
pub fn resolve_encoding(label: Option<&str>) -> &'static Encoding {
    let Some(label) = label else {
        return UTF_8;
    };

    let normalized = label
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_ascii_lowercase();
    let normalized = match normalized.as_str() {
        "utf8" => "utf-8",
        other => other,
    };

    Encoding::for_label(normalized.as_bytes()).unwrap_or(UTF_8)
}

/// Décode des octets en texte.
///
/// Chemin rapide : validation UTF-8 SIMD. Sinon décodage avec l'encodage
/// déclaré (remplacement des séquences invalides). Le BOM éventuel est retiré.
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = resolve_encoding(charset);

    if encoding == UTF_8 {
        let without_bom = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        if let Ok(s) = simdutf8::basic::from_utf8(without_bom) {
            return s.to_string();
        }
    }

    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}
