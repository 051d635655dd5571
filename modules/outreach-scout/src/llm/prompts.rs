use outreach_common::{CitySeed, PartnerType};

use crate::traits::ReconcileQuery;

pub const GENERATION_SYSTEM_PROMPT: &str = r#"You are a precise research assistant for outreach list building.
Return only JSON that matches the provided JSON Schema. No prose.

Rules:
- Do not invent emails. Only include an email if it is clearly public; otherwise set it to null and prefer an Instagram handle.
- Use Instagram handles or official organization accounts when available. If neither exists, leave instagram null.
- Avoid duplicates by email or Instagram within a single response.
- Prefer accounts relevant to the specified city. National partners are welcome when they have significant influence, a local chapter, a regional office or strong ties to the city.
- Fill 'organization' briefly when the row is a person. Put the show name for podcasters when relevant.
- Focus on contacts who would care about climate change, environmental protection, peace initiatives, nature conservation or geopolitics.
- Include diverse voices from different backgrounds, ages and sectors within each category."#;

pub fn generation_user_prompt(city: &CitySeed, partner_type: PartnerType, count: usize) -> String {
    [
        format!(
            "Task: Propose at least {count} '{partner_type}' contacts in or strongly tied to {}.",
            city.name
        ),
        "They must be plausible relays for announcements about climate, peace, nature or geopolitics.".to_string(),
        "Return only JSON per the schema. Use the provided codes exactly for 'country' and 'language'.".to_string(),
        format!(
            "City metadata: id={}, country_slug={}, tz={}, instagramAccount={}, hashtag={}.",
            city.slug,
            city.country_slug,
            or_none(&city.time_zone),
            or_none(&city.instagram_account),
            or_none(&city.instagram_hashtag),
        ),
        format!(
            "Hard constraints: country={}, language={}, type={partner_type}.",
            city.iso3, city.language
        ),
        "If unsure about an email, set email = null and prefer instagram.".to_string(),
    ]
    .join("\n")
}

pub const RECONCILE_SYSTEM_PROMPT: &str = r#"You find Twitter/X accounts for outreach contacts.

For every contact in the input list, return exactly one entry, in the same order, echoing the contact's name.
- handle: the account handle (e.g. "@example") when you are confident it belongs to this person or organization.
- handle: "not_found" when you are confident no such account exists or you have no information.
- handle: "not_sure" when several accounts could plausibly match, or you cannot tell which is right.

Never guess. A wrong handle is worse than "not_sure"."#;

pub fn reconcile_user_prompt(batch: &[ReconcileQuery]) -> String {
    let mut prompt = format!(
        "Find the Twitter/X handle for each of these {} contacts:\n\n",
        batch.len()
    );
    for (i, query) in batch.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. name: {} | organization: {} | city: {} | country: {}\n",
            i + 1,
            query.name,
            or_unknown(&query.organization),
            or_unknown(&query.city),
            or_unknown(&query.country),
        ));
    }
    prompt
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("none")
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_prompt_pins_shard_constraints() {
        let city = CitySeed::new("mexico_city", "mexico");
        let prompt = generation_user_prompt(&city, PartnerType::Journalist, 100);
        assert!(prompt.contains("at least 100 'journalist' contacts"));
        assert!(prompt.contains("Mexico City"));
        assert!(prompt.contains("country=MEX, language=es, type=journalist"));
        assert!(prompt.contains("id=mexico_city_mexico, country_slug=mexico, tz=none"));
    }

    #[test]
    fn generation_prompt_carries_city_file_metadata() {
        let mut city = CitySeed::new("paris", "france");
        city.time_zone = Some("Europe/Paris".into());
        city.instagram_account = Some("@paris_climat".into());
        city.instagram_hashtag = Some("#parisclimat".into());

        let prompt = generation_user_prompt(&city, PartnerType::Ngo, 50);
        assert!(prompt.contains(
            "City metadata: id=paris_france, country_slug=france, tz=Europe/Paris, \
             instagramAccount=@paris_climat, hashtag=#parisclimat."
        ));
    }

    #[test]
    fn reconcile_prompt_numbers_every_contact() {
        let batch = vec![
            ReconcileQuery {
                name: "Ana".into(),
                organization: "Verde".into(),
                city: "Lima".into(),
                country: "PER".into(),
            },
            ReconcileQuery {
                name: "Bo".into(),
                organization: String::new(),
                city: "Lima".into(),
                country: "PER".into(),
            },
        ];
        let prompt = reconcile_user_prompt(&batch);
        assert!(prompt.contains("these 2 contacts"));
        assert!(prompt.contains("1. name: Ana | organization: Verde"));
        assert!(prompt.contains("2. name: Bo | organization: unknown"));
    }
}
