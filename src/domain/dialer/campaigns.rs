//! Campaign listing parser.
//!
//! The campaign listing endpoint answers with an HTML `<select>` fragment
//! meant for a browser form. Options are reduced to `(value, label)` pairs,
//! skipping the placeholder entry and de-duplicating by value.

use std::collections::HashSet;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

const PLACEHOLDER_LABEL: &str = "PLEASE SELECT A CAMPAIGN";

/// A campaign the agent may connect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignOption {
    pub value: String,
    pub label: String,
}

/// Parses the `<select>` fragment returned by the campaign listing call.
pub fn parse_campaign_options(html: &str) -> Vec<CampaignOption> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse("option[value]").expect("valid selector");
    let mut seen = HashSet::new();
    let mut campaigns = Vec::new();
    for option in fragment.select(&selector) {
        let value = option.value().attr("value").unwrap_or("").trim().to_string();
        if value.is_empty() {
            continue;
        }
        let label = option.text().collect::<String>().trim().to_string();
        if label.to_uppercase().contains(PLACEHOLDER_LABEL) {
            continue;
        }
        if seen.insert(value.clone()) {
            campaigns.push(CampaignOption { value, label });
        }
    }
    campaigns
}
