//! Dummy lead generation for credential-less development

use rand::Rng;

use crate::ScrapedLead;

const NAME_PREFIXES: [&str; 8] = [
    "Peak", "Summit", "Front Range", "Blue Sky", "Pioneer", "Redline", "Cornerstone", "Evergreen",
];

const NAME_SUFFIXES: [&str; 5] = ["Co", "LLC", "Services", "Group", "Brothers"];

/// Fabricate plausible leads for a location (`City, ST`) and industry.
/// Phone numbers use the 555 fiction prefix so a stray dial is harmless.
pub fn generate_dummy_leads(location: &str, industry: &str, count: usize) -> Vec<ScrapedLead> {
    let (city, state) = match location.split_once(',') {
        Some((city, state)) => (city.trim(), state.trim()),
        None => (location.trim(), ""),
    };

    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let prefix = NAME_PREFIXES[i % NAME_PREFIXES.len()];
            let suffix = NAME_SUFFIXES[i % NAME_SUFFIXES.len()];
            let line: u32 = rng.gen_range(100..10_000);
            ScrapedLead {
                name: format!("{prefix} {industry} {suffix}"),
                phone: format!("(303) 555-{line:04}"),
                category: industry.to_string(),
                industry: industry.to_string(),
                address: format!("{} Main St", i + 1),
                website: String::new(),
                city: city.to_string(),
                state: state.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_leads_carry_location_and_industry() {
        let leads = generate_dummy_leads("Denver, CO", "Roofing", 10);
        assert_eq!(leads.len(), 10);
        for lead in &leads {
            assert!(lead.name.contains("Roofing"));
            assert_eq!(lead.city, "Denver");
            assert_eq!(lead.state, "CO");
            assert!(lead.phone.starts_with("(303) 555-"));
        }
    }

    #[test]
    fn names_vary_across_the_batch() {
        let leads = generate_dummy_leads("Denver, CO", "Roofing", 8);
        let first = &leads[0].name;
        assert!(leads.iter().any(|l| &l.name != first));
    }
}
