use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::normalize::normalize;

// --- Partner Types ---

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PartnerType {
    Influencer,
    Podcaster,
    Journalist,
    Activist,
    Ngo,
    #[default]
    Other,
}

impl PartnerType {
    /// Fixed generation order. Resumed runs walk shards in this order.
    pub const ALL: [PartnerType; 6] = [
        PartnerType::Influencer,
        PartnerType::Podcaster,
        PartnerType::Journalist,
        PartnerType::Activist,
        PartnerType::Ngo,
        PartnerType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerType::Influencer => "influencer",
            PartnerType::Podcaster => "podcaster",
            PartnerType::Journalist => "journalist",
            PartnerType::Activist => "activist",
            PartnerType::Ngo => "ngo",
            PartnerType::Other => "other",
        }
    }
}

impl fmt::Display for PartnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartnerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        PartnerType::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| format!("unknown partner type: {s}"))
    }
}

// --- Contact Records ---

/// Column order of every shard and merged file.
pub const CSV_HEADER: [&str; 11] = [
    "name",
    "email",
    "country",
    "language",
    "city",
    "instagram",
    "twitter",
    "phone",
    "organization",
    "type",
    "notes",
];

/// One row of a shard file. Empty strings stand for absent values.
///
/// Field order is the on-disk column order. Every column defaults to empty
/// so shards written before the `twitter` column existed still load; a
/// blank or unrecognized `type` reads as `other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// ISO-3 country code
    #[serde(default)]
    pub country: String,
    /// ISO-2 language code
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub organization: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_partner_type")]
    pub partner_type: PartnerType,
    #[serde(default)]
    pub notes: String,
}

fn lenient_partner_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PartnerType, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_default())
}

impl ContactRecord {
    /// Identity used for deduplication across every shard.
    ///
    /// Email when present, else Instagram handle, else name within city.
    /// Returns `None` for records with none of these, which are never
    /// considered duplicates of anything.
    pub fn natural_key(&self) -> Option<NaturalKey> {
        let email = self.email.trim().to_lowercase();
        if !email.is_empty() {
            return Some(NaturalKey::Email(email));
        }

        let instagram = self.instagram.trim().trim_start_matches('@').to_lowercase();
        if !instagram.is_empty() {
            return Some(NaturalKey::Instagram(instagram));
        }

        let name = self
            .name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if name.is_empty() {
            return None;
        }
        Some(NaturalKey::NameCity {
            name,
            city: normalize(&self.city),
        })
    }

    /// True when the Twitter column holds nothing, not even a
    /// `not_found` / `not_sure` marker.
    pub fn lacks_twitter(&self) -> bool {
        self.twitter.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NaturalKey {
    Email(String),
    Instagram(String),
    NameCity { name: String, city: String },
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NaturalKey::Email(email) => write!(f, "email:{email}"),
            NaturalKey::Instagram(handle) => write!(f, "ig:{handle}"),
            NaturalKey::NameCity { name, city } => write!(f, "name:{name}@{city}"),
        }
    }
}

// --- Shard Keys ---

/// One persisted record set per (city, partner type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardKey {
    pub city_slug: String,
    pub partner_type: PartnerType,
}

impl ShardKey {
    pub fn new(city_slug: impl Into<String>, partner_type: PartnerType) -> Self {
        Self {
            city_slug: city_slug.into(),
            partner_type,
        }
    }
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.city_slug, self.partner_type)
    }
}
