use ai_client::OpenAi;
use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use outreach_common::{CitySeed, ContactRecord, PartnerType};

use crate::llm::prompts::{generation_user_prompt, GENERATION_SYSTEM_PROMPT};
use crate::traits::ContactGenerator;

/// Response schema for contact generation.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContactsPayload {
    pub contacts: Vec<GeneratedContact>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GeneratedContact {
    /// Person or organization name
    pub name: String,
    /// Public email only; null when not clearly published
    pub email: Option<String>,
    /// ISO-3 country code, exactly as given in the constraints
    pub country: String,
    /// ISO-2 language code, exactly as given in the constraints
    pub language: String,
    pub city: String,
    pub instagram: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    #[serde(rename = "type")]
    pub partner_type: PartnerType,
    pub notes: Option<String>,
}

impl From<GeneratedContact> for ContactRecord {
    fn from(c: GeneratedContact) -> Self {
        ContactRecord {
            name: c.name,
            email: c.email.unwrap_or_default(),
            country: c.country,
            language: c.language,
            city: c.city,
            instagram: c.instagram.unwrap_or_default(),
            twitter: String::new(),
            phone: c.phone.unwrap_or_default(),
            organization: c.organization.unwrap_or_default(),
            partner_type: c.partner_type,
            notes: c.notes.unwrap_or_default(),
        }
    }
}

pub struct OpenAiGenerator {
    ai: OpenAi,
}

impl OpenAiGenerator {
    pub fn new(ai: OpenAi) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl ContactGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        city: &CitySeed,
        partner_type: PartnerType,
        count: usize,
    ) -> Result<Vec<ContactRecord>> {
        let payload: ContactsPayload = self
            .ai
            .extract(
                "contacts_payload",
                GENERATION_SYSTEM_PROMPT,
                generation_user_prompt(city, partner_type, count),
            )
            .await?;

        debug!(
            city = city.slug.as_str(),
            partner_type = partner_type.as_str(),
            requested = count,
            returned = payload.contacts.len(),
            "Contacts generated"
        );

        Ok(payload.contacts.into_iter().map(ContactRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_client::StructuredOutput;

    #[test]
    fn payload_schema_is_strict() {
        let schema = ContactsPayload::openai_schema();
        let item = &schema["properties"]["contacts"]["items"];
        assert_eq!(item["additionalProperties"], serde_json::Value::Bool(false));
        let required: Vec<&str> = item["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"type"));
        assert!(required.contains(&"email"));
        assert_eq!(item["properties"]["type"]["enum"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn nulls_become_empty_columns() {
        let payload: ContactsPayload = serde_json::from_str(
            r#"{"contacts": [{
                "name": "Green Lima",
                "email": null,
                "country": "PER",
                "language": "es",
                "city": "Lima",
                "instagram": "@greenlima",
                "phone": null,
                "organization": null,
                "type": "ngo",
                "notes": "climate"
            }]}"#,
        )
        .unwrap();

        let record: ContactRecord = payload.contacts.into_iter().next().unwrap().into();
        assert_eq!(record.instagram, "@greenlima");
        assert!(record.email.is_empty());
        assert!(record.twitter.is_empty());
        assert_eq!(record.partner_type, PartnerType::Ngo);
    }
}
