//! Palettes de couleurs des classes

/// Palette séquentielle à 10 niveaux (classes numériques)
pub const SEQUENTIAL: [&str; 10] = [
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026",
    "#800026", "#4d0013",
];

/// Base catégorielle à 10 teintes
pub const CATEGORICAL: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

/// Teintes (degrés) de la base catégorielle, reprises par le générateur
const BASE_HUES: [f64; 10] = [210.0, 30.0, 358.0, 175.0, 110.0, 48.0, 290.0, 350.0, 25.0, 30.0];

/// Luminosités alternées à chaque tour complet des teintes
const CYCLE_LIGHTNESS: [f64; 5] = [0.50, 0.35, 0.65, 0.42, 0.58];

/// Couleurs des classes numériques
pub fn numeric_palette(classes: usize) -> Vec<String> {
    if classes <= SEQUENTIAL.len() {
        SEQUENTIAL[..classes].iter().map(|c| c.to_string()).collect()
    } else {
        generate_palette(classes)
    }
}

/// Couleurs des classes catégorielles
pub fn categorical_palette(classes: usize) -> Vec<String> {
    if classes <= CATEGORICAL.len() {
        CATEGORICAL[..classes].iter().map(|c| c.to_string()).collect()
    } else {
        generate_palette(classes)
    }
}

/// Palette de taille arbitraire : les 10 teintes de base en boucle, la
/// luminosité changeant à chaque tour
pub fn generate_palette(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let hue = BASE_HUES[i % BASE_HUES.len()];
            let lightness = CYCLE_LIGHTNESS[(i / BASE_HUES.len()) % CYCLE_LIGHTNESS.len()];
            hsl_to_hex(hue, 0.65, lightness)
        })
        .collect()
}

/// HSL (teinte en degrés, saturation et luminosité dans [0, 1]) vers `#rrggbb`
pub fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
}

/// Valide `#rgb` ou `#rrggbb` et retourne la forme longue en minuscules
pub fn normalize_color(input: &str) -> Option<String> {
    let hex = input.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => Some(
            std::iter::once('#')
                .chain(hex.chars().flat_map(|c| [c, c]))
                .collect::<String>()
                .to_ascii_lowercase(),
        ),
        6 => Some(format!("#{}", hex.to_ascii_lowercase())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_palette_is_sliced() {
        assert_eq!(numeric_palette(3), vec!["#ffffcc", "#ffeda0", "#fed976"]);
        assert_eq!(numeric_palette(10).len(), 10);
        assert_eq!(numeric_palette(12).len(), 12);
    }

    #[test]
    fn test_categorical_overflow_is_generated() {
        let colors = categorical_palette(25);
        assert_eq!(colors.len(), 25);
        assert!(colors.iter().all(|c| normalize_color(c).as_deref() == Some(c.as_str())));
        // Même teinte, luminosité différente au tour suivant
        assert_ne!(colors[0], colors[10]);
    }

    #[test]
    fn test_hsl_to_hex() {
        assert_eq!(hsl_to_hex(0.0, 1.0, 0.5), "#ff0000");
        assert_eq!(hsl_to_hex(120.0, 1.0, 0.5), "#00ff00");
        assert_eq!(hsl_to_hex(240.0, 1.0, 0.5), "#0000ff");
        assert_eq!(hsl_to_hex(0.0, 0.0, 1.0), "#ffffff");
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#ABC").as_deref(), Some("#aabbcc"));
        assert_eq!(normalize_color(" #12a0Ff ").as_deref(), Some("#12a0ff"));
        assert_eq!(normalize_color("12a0ff"), None);
        assert_eq!(normalize_color("#12345"), None);
        assert_eq!(normalize_color("#ggg"), None);
    }
}
