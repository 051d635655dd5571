//! Seed list of target cities and the country/language tables used to
//! stamp generated contacts.

use std::path::Path;

use serde::Deserialize;

use crate::error::OutreachError;
use crate::normalize::{display_name, normalize};

/// Built-in (city, country) pairs, in generation order.
const DEFAULT_CITIES: &[(&str, &str)] = &[
    ("new_york", "usa"),
    ("los_angeles", "usa"),
    ("mexico_city", "mexico"),
    ("sao_paulo", "brazil"),
    ("buenos_aires", "argentina"),
    ("london", "england"),
    ("paris", "france"),
    ("berlin", "germany"),
    ("madrid", "spain"),
    ("rome", "italy"),
    ("moscow", "russia"),
    ("istanbul", "turkey"),
    ("cairo", "egypt"),
    ("johannesburg", "south_africa"),
    ("nairobi", "kenya"),
    ("lagos", "nigeria"),
    ("kinshasa", "democratic_republic_of_the_congo"),
    ("dubai", "united_arab_emirates"),
    ("mumbai", "india"),
    ("delhi", "india"),
    ("bangalore", "india"),
    ("jakarta", "indonesia"),
    ("bangkok", "thailand"),
    ("manila", "philippines"),
    ("tokyo", "japan"),
    ("seoul", "south_korea"),
    ("beijing", "china"),
    ("shanghai", "china"),
    ("hong_kong", "china"),
    ("singapore", "singapore"),
    ("sydney", "australia"),
    ("melbourne", "australia"),
    ("toronto", "canada"),
    ("vancouver", "canada"),
    ("chicago", "usa"),
    ("san_francisco", "usa"),
    ("lima", "peru"),
    ("bogota", "colombia"),
    ("santiago", "chile"),
    ("tehran", "iran"),
    ("karachi", "pakistan"),
];

const ISO3: &[(&str, &str)] = &[
    ("usa", "USA"),
    ("canada", "CAN"),
    ("mexico", "MEX"),
    ("brazil", "BRA"),
    ("argentina", "ARG"),
    ("peru", "PER"),
    ("colombia", "COL"),
    ("chile", "CHL"),
    ("england", "GBR"),
    ("france", "FRA"),
    ("germany", "DEU"),
    ("spain", "ESP"),
    ("italy", "ITA"),
    ("russia", "RUS"),
    ("turkey", "TUR"),
    ("egypt", "EGY"),
    ("south_africa", "ZAF"),
    ("kenya", "KEN"),
    ("nigeria", "NGA"),
    ("democratic_republic_of_the_congo", "COD"),
    ("united_arab_emirates", "ARE"),
    ("iran", "IRN"),
    ("pakistan", "PAK"),
    ("india", "IND"),
    ("indonesia", "IDN"),
    ("thailand", "THA"),
    ("philippines", "PHL"),
    ("japan", "JPN"),
    ("south_korea", "KOR"),
    ("china", "CHN"),
    ("singapore", "SGP"),
    ("australia", "AUS"),
];

/// Primary outreach language per country; anything unlisted gets `en`.
const COUNTRY_LANGUAGE: &[(&str, &str)] = &[
    ("mexico", "es"),
    ("spain", "es"),
    ("argentina", "es"),
    ("colombia", "es"),
    ("peru", "es"),
    ("chile", "es"),
    ("brazil", "pt"),
    ("france", "fr"),
    ("germany", "de"),
    ("italy", "it"),
    ("russia", "ru"),
    ("turkey", "tr"),
    ("egypt", "ar"),
    ("india", "hi"),
    ("indonesia", "id"),
    ("thailand", "th"),
    ("japan", "ja"),
    ("south_korea", "ko"),
    ("china", "zh"),
    ("iran", "fa"),
    ("pakistan", "ur"),
    ("philippines", "tl"),
];

/// Codes seen in city files that are not ISO-639-1.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[("ph", "tl")];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// ISO-3 code for a country slug, falling back to its first three letters.
pub fn to_iso3(country_slug: &str) -> String {
    let slug = normalize(country_slug);
    lookup(ISO3, &slug)
        .map(str::to_string)
        .unwrap_or_else(|| slug.chars().take(3).collect::<String>().to_uppercase())
}

/// ISO-2 language code, resolving aliases and truncating anything longer.
pub fn to_lang2(code: &str) -> String {
    let code = code.trim().to_lowercase();
    lookup(LANGUAGE_ALIASES, &code)
        .map(str::to_string)
        .unwrap_or_else(|| code.chars().take(2).collect())
}

pub fn language_for_country(country_slug: &str) -> &'static str {
    lookup(COUNTRY_LANGUAGE, &normalize(country_slug)).unwrap_or("en")
}

// --- City Seeds ---

/// A target city: its slug (the shard directory name) plus the metadata
/// stamped on every contact generated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitySeed {
    pub slug: String,
    pub name: String,
    pub country_slug: String,
    pub iso3: String,
    pub language: String,
    // Only set for seeds loaded from a city file.
    pub time_zone: Option<String>,
    pub instagram_account: Option<String>,
    pub instagram_hashtag: Option<String>,
}

impl CitySeed {
    pub fn new(city: &str, country: &str) -> Self {
        let country_slug = normalize(country);
        Self {
            slug: normalize(&format!("{city}_{country_slug}")),
            name: display_name(city),
            iso3: to_iso3(&country_slug),
            language: language_for_country(&country_slug).to_string(),
            country_slug,
            time_zone: None,
            instagram_account: None,
            instagram_hashtag: None,
        }
    }

    pub fn with_language(mut self, code: &str) -> Self {
        self.language = to_lang2(code);
        self
    }
}

/// The built-in seed list in its canonical order.
pub fn default_cities() -> Vec<CitySeed> {
    DEFAULT_CITIES
        .iter()
        .map(|(city, country)| CitySeed::new(city, country))
        .collect()
}

// --- City Files ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CityFileEntry {
    id: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    map: Option<CityFileMap>,
    #[serde(default)]
    time_zone: Option<String>,
    #[serde(default)]
    instagram_account: Option<String>,
    #[serde(default)]
    instagram_hashtag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CityFileMap {
    #[serde(default)]
    language: Option<String>,
}

impl TryFrom<CityFileEntry> for CitySeed {
    type Error = OutreachError;

    fn try_from(entry: CityFileEntry) -> Result<Self, Self::Error> {
        let id = normalize(&entry.id);
        if id.is_empty() {
            return Err(OutreachError::Config(format!(
                "city id {:?} has no letters or digits",
                entry.id
            )));
        }
        let country = normalize(&entry.country);
        let city = id
            .strip_suffix(&format!("_{country}"))
            .filter(|_| !country.is_empty())
            .unwrap_or(&id);

        let mut seed = CitySeed::new(city, &country);
        seed.slug = id.clone();
        seed.time_zone = non_blank(entry.time_zone);
        seed.instagram_account = non_blank(entry.instagram_account);
        seed.instagram_hashtag = non_blank(entry.instagram_hashtag);

        Ok(match entry.map.and_then(|m| m.language) {
            Some(code) if !code.trim().is_empty() => seed.with_language(&code),
            _ => seed,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load a JSON array of city objects (`id`, `country`, `map.language`,
/// `timeZone`, `instagramAccount`, `instagramHashtag`) as a replacement seed
/// list. Unknown keys are ignored; an id with no letters or digits is an error.
pub fn load_city_file(path: &Path) -> Result<Vec<CitySeed>, OutreachError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| OutreachError::Config(format!("cannot read {}: {e}", path.display())))?;
    let entries: Vec<CityFileEntry> = serde_json::from_str(&raw).map_err(|e| {
        OutreachError::Config(format!(
            "{} must be a JSON array of city objects: {e}",
            path.display()
        ))
    })?;
    entries
        .into_iter()
        .map(CitySeed::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| match e {
            OutreachError::Config(message) => {
                OutreachError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
}
