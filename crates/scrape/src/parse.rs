//! Directory page parsing

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::ScrapedLead;

static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("div.result, div.search-results .v-card").unwrap());
static NAME: Lazy<Selector> = Lazy::new(|| Selector::parse("a.business-name span, a.business-name, h2").unwrap());
static PHONE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.phones, a[href^='tel:']").unwrap());
static ADDRESS: Lazy<Selector> = Lazy::new(|| Selector::parse("div.street-address, address").unwrap());
static WEBSITE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.track-visit-website").unwrap());
static CATEGORY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.categories a").unwrap());

fn text_of(card: ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Pull business cards out of a directory search results page.
///
/// Cards without both a name and a phone number are dropped; a lead we
/// cannot call is useless.
pub fn parse_directory_page(
    html: &str,
    industry: &str,
    city: &str,
    state: &str,
) -> Vec<ScrapedLead> {
    let document = Html::parse_document(html);
    let mut leads = Vec::new();

    for card in document.select(&CARD) {
        let name = text_of(card, &NAME);
        let phone = text_of(card, &PHONE);
        if name.is_empty() || phone.is_empty() {
            continue;
        }

        let category = {
            let listed = text_of(card, &CATEGORY);
            if listed.is_empty() {
                industry.to_string()
            } else {
                listed
            }
        };

        let website = card
            .select(&WEBSITE)
            .next()
            .and_then(|el| el.value().attr("href"))
            .unwrap_or_default()
            .to_string();

        leads.push(ScrapedLead {
            name,
            phone,
            category,
            industry: industry.to_string(),
            address: text_of(card, &ADDRESS),
            website,
            city: city.to_string(),
            state: state.to_string(),
        });
    }

    leads
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body><div class="search-results">
          <div class="result">
            <a class="business-name"><span>Peak Plumbing Co</span></a>
            <div class="phones">(303) 555-0101</div>
            <div class="street-address">12 Main St</div>
            <div class="categories"><a>Plumbers</a></div>
            <a class="track-visit-website" href="https://peakplumbing.example"></a>
          </div>
          <div class="result">
            <a class="business-name"><span>No Phone Plumbing</span></a>
            <div class="street-address">99 Elm St</div>
          </div>
          <div class="result">
            <a class="business-name"><span>Bare Card Plumbing</span></a>
            <div class="phones">(303) 555-0102</div>
          </div>
        </div></body></html>"#;

    #[test]
    fn parses_cards_and_drops_uncallable_ones() {
        let leads = parse_directory_page(PAGE, "Plumbing", "Denver", "CO");
        assert_eq!(leads.len(), 2);

        assert_eq!(leads[0].name, "Peak Plumbing Co");
        assert_eq!(leads[0].phone, "(303) 555-0101");
        assert_eq!(leads[0].category, "Plumbers");
        assert_eq!(leads[0].address, "12 Main St");
        assert_eq!(leads[0].website, "https://peakplumbing.example");
        assert_eq!(leads[0].city, "Denver");
        assert_eq!(leads[0].state, "CO");
    }

    #[test]
    fn missing_category_falls_back_to_the_search_industry() {
        let leads = parse_directory_page(PAGE, "Plumbing", "Denver", "CO");
        assert_eq!(leads[1].name, "Bare Card Plumbing");
        assert_eq!(leads[1].category, "Plumbing");
        assert_eq!(leads[1].website, "");
    }

    #[test]
    fn empty_page_parses_to_nothing() {
        assert!(parse_directory_page("<html></html>", "Plumbing", "Denver", "CO").is_empty());
    }
}
