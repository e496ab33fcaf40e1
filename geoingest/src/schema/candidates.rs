//! Listes de noms candidats et de valeurs connues pour l'inférence de champs

/// Noms de colonnes "continent", par priorité
pub const CONTINENT_CANDIDATES: &[&str] = &[
    "continent",
    "continent_name",
    "region",
    "cont",
    "world_region",
    "region_un",
    "region_wb",
    "continente",
    "kontinent",
];

/// Noms de colonnes "pays", par priorité
pub const COUNTRY_CANDIDATES: &[&str] = &[
    "country",
    "country_name",
    "countryname",
    "cntry_name",
    "nation",
    "name",
    "admin",
    "sovereignt",
    "name_long",
    "name_en",
    "adm0_name",
    "pays",
    "pais",
    "land",
];

/// Codes continent à deux lettres (comparaison exacte après normalisation)
pub const CONTINENT_CODES: &[&str] = &["af", "an", "as", "eu", "na", "oc", "sa"];

/// Fragments de noms de continents (recherche de sous-chaîne après normalisation)
pub const CONTINENT_NAMES: &[&str] = &[
    "africa",
    "antarctica",
    "asia",
    "europe",
    "america",
    "oceania",
    "australia",
];

/// Colonnes techniques jamais retenues comme "pays"
pub const NON_SEMANTIC_KEYS: &[&str] = &[
    "lat",
    "lon",
    "lng",
    "long",
    "latitude",
    "longitude",
    "x",
    "y",
    "z",
    "id",
    "fid",
    "gid",
    "oid",
    "objectid",
    "ogc_fid",
    "uuid",
    "shape_area",
    "shape_leng",
    "shape_length",
    "area",
    "perimeter",
    "geom",
    "geometry",
    "date",
    "time",
    "timestamp",
];
