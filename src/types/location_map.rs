//! Keyword tables that attach a village and a region to a station name.

/// Maps station names to a `(location, region)` pair.
///
/// The first keyword contained in the lower-cased station name decides the location;
/// the location then decides the region. Names that match nothing get the fallbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationMap {
    keywords: Vec<(String, String)>,
    regions: Vec<(String, String)>,
    fallback_location: String,
    fallback_region: String,
}

const DEFAULT_KEYWORDS: [(&str, &str); 17] = [
    ("danterc", "Wolkenstein"),
    ("sciuz", "Wolkenstein"),
    ("vallunga", "Wolkenstein"),
    ("langental", "Wolkenstein"),
    ("seceda", "St. Ulrich"),
    ("setil", "St. Ulrich"),
    ("mont s", "St. Ulrich"),
    ("central", "St. Ulrich"),
    ("posta", "St. Ulrich"),
    ("pana", "St. Christina"),
    ("monte pana", "St. Christina"),
    ("cristauta", "St. Christina"),
    ("iman", "St. Christina"),
    ("brunico", "Brunico"),
    ("bruneck", "Brunico"),
    ("bressanone", "Bressanone"),
    ("brixen", "Bressanone"),
];

const DEFAULT_REGIONS: [(&str, &str); 5] = [
    ("Wolkenstein", "Val Gardena"),
    ("St. Ulrich", "Val Gardena"),
    ("St. Christina", "Val Gardena"),
    ("Brunico", "Puster Valley Gateway"),
    ("Bressanone", "Isarco Valley Gateway"),
];

impl Default for LocationMap {
    fn default() -> Self {
        Self::new(
            DEFAULT_KEYWORDS.iter().map(|(k, v)| (k.to_string(), v.to_string())),
            DEFAULT_REGIONS.iter().map(|(k, v)| (k.to_string(), v.to_string())),
            "Dolomites",
            "Other",
        )
    }
}

impl LocationMap {
    pub fn new(
        keywords: impl IntoIterator<Item = (String, String)>,
        regions: impl IntoIterator<Item = (String, String)>,
        fallback_location: &str,
        fallback_region: &str,
    ) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|(keyword, location)| (keyword.to_lowercase(), location))
                .collect(),
            regions: regions.into_iter().collect(),
            fallback_location: fallback_location.to_string(),
            fallback_region: fallback_region.to_string(),
        }
    }

    /// Returns `(location, region)` for a station name.
    pub fn locate(&self, station_name: &str) -> (String, String) {
        let name = station_name.to_lowercase();
        let location = self
            .keywords
            .iter()
            .find(|(keyword, _)| name.contains(keyword.as_str()))
            .map(|(_, location)| location.clone())
            .unwrap_or_else(|| self.fallback_location.clone());
        let region = self
            .regions
            .iter()
            .find(|(known, _)| *known == location)
            .map(|(_, region)| region.clone())
            .unwrap_or_else(|| self.fallback_region.clone());
        (location, region)
    }
}
