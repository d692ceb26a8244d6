//! Service endpoints and land-cover tag vocabularies shared by the
//! collectors.

/// USGS Machine-to-Machine API, JSON flavour
pub const M2M_SERVICE_URL: &str = "https://m2m.cr.usgs.gov/api/api/json/stable/";

/// Landsat Collection 2 Level 2 dataset name on M2M
pub const M2M_DATASET_NAME: &str = "landsat_ot_c2_l2";

/// Per-scene files worth downloading: the QA band and the raw
/// surface-temperature band of either sensor family
pub const LANDSAT_BAND_NAMES: &[&str] = &["QA_PIXEL", "ST_B10", "ST_B6"];

/// OpenTopography global DEM API
pub const OPENTOPOGRAPHY_URL: &str = "https://portal.opentopography.org/API/globaldem";

/// Default global DEM dataset: SRTM 1 arc-second
pub const DEFAULT_DEM_TYPE: &str = "SRTMGL1";

/// Overpass API main instance
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// `natural=*` values counted as natural land cover
pub const NATURAL_VALUES: &[&str] = &[
    "fell",
    "grassland",
    "heath",
    "moor",
    "scrub",
    "shrubbery",
    "tree",
    "tree_row",
    "tundra",
    "wood",
];

/// `landuse=*` values counted as semi-natural land cover
pub const SEMI_NATURAL_LANDUSE_VALUES: &[&str] = &[
    "farmland",
    "farmyard",
    "paddy",
    "animal_keeping",
    "flowerbed",
    "forest",
    "meadow",
    "orchard",
    "grass",
];

/// `landuse=*` values counted as urban fabric
pub const URBAN_LANDUSE_VALUES: &[&str] = &[
    "commercial",
    "construction",
    "education",
    "fairground",
    "industrial",
    "residential",
    "retail",
    "institutional",
    "railway",
    "aerodrome",
    "landfill",
    "port",
    "depot",
    "quarry",
    "military",
];
