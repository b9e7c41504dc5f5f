/// Source name constants to ensure consistency across the codebase
pub const GUY_HOQUET_SOURCE: &str = "guy_hoquet";
pub const LAFORET_SOURCE: &str = "laforet";
pub const ORPI_SOURCE: &str = "orpi";

/// Get all supported source names, in merge order
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![GUY_HOQUET_SOURCE, LAFORET_SOURCE, ORPI_SOURCE]
}

/// Country suffix appended to every geocoding query
pub const COUNTRY: &str = "France";

/// Prefix shared by every capital-city `city` value ("PARIS", "PARIS 08", ...)
pub const CAPITAL_CITY: &str = "PARIS";

/// Department names used in geocoding queries. The capital maps to an empty
/// string: the city name alone already pins it down.
pub const DEPARTMENT_NAMES: &[(u32, &str)] = &[
    (75, ""),
    (77, "SEINE-ET-MARNE"),
    (78, "YVELINES"),
    (91, "ESSONNE"),
    (92, "HAUTS-DE-SEINE"),
    (93, "SEINE-SAINT-DENIS"),
    (94, "VAL-DE-MARNE"),
    (95, "VAL D'OISE"),
];

/// Resolve the spelled-out department name for a department code.
///
/// Five-digit capital codes (`75008`) resolve through their first two digits.
/// Unknown codes render as the code itself.
pub fn department_name(dept: u32) -> String {
    let coarse = if dept >= 10_000 { dept / 1000 } else { dept };
    DEPARTMENT_NAMES
        .iter()
        .find(|(code, _)| *code == coarse)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| dept.to_string())
}

/// Laforêt files some capital arrondissements under a neighbouring department.
pub const LAFORET_DEPT_CORRECTIONS: &[(u32, u32)] = &[(94013, 75013), (92016, 75016)];

/// Guy Hoquet lists a single town whose postal string carries no name.
pub const EMPTY_CITY_DEFAULT: &str = "ORSAY";

/// Guy Hoquet department excluded from the target region.
pub const GUY_HOQUET_EXCLUDED_DEPT: u32 = 29;

/// Orpi price literal for listings that are already rented
pub const ALREADY_RENTED: &str = "Loué";

/// Laforêt `furnitures` value of furnished listings
pub const LAFORET_FURNISHED_FLAG: &str = "is_furnished";

/// Station names dropped from the metro list: too common in plain prose.
pub const STATION_BLOCKLIST: &[&str] = &["COMMERCE"];

pub const DEFAULT_STATIONS_URL: &str =
    "https://fr.wikipedia.org/wiki/Liste_des_stations_du_m%C3%A9tro_de_Paris";

pub const DEFAULT_GEOCODER_URL: &str = "https://api-adresse.data.gouv.fr/search/";

pub const DEFAULT_USER_AGENT: &str = "rental_cleaner/0.1 (listing geocoding batch)";

/// Default bounding box of the target region
pub const DEFAULT_MIN_LAT: f64 = 48.0;
pub const DEFAULT_MAX_LAT: f64 = 49.3;
pub const DEFAULT_MAX_LON: f64 = 3.8;
