//! Inquiry deduplicator - one visible row per listing
//!
//! The backend may expose several inquiry rows for the same listing (e.g.
//! historical ones); the manager view intentionally shows a single merged
//! thread per listing.

use domus_client::Inquiry;
use std::collections::HashSet;

/// Collapse an inquiry list to the first record per distinct listing,
/// preserving the original relative order otherwise.
pub fn dedupe_by_listing(inquiries: Vec<Inquiry>) -> Vec<Inquiry> {
    let mut seen = HashSet::new();
    inquiries
        .into_iter()
        .filter(|inquiry| seen.insert(inquiry.listing_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domus_client::{InquiryPayload, InquiryStatus};

    fn inquiry(id: &str, listing_id: &str) -> Inquiry {
        Inquiry {
            id: id.to_string(),
            listing_id: listing_id.to_string(),
            unit_id: None,
            tenant_id: "tenant-1".to_string(),
            manager_id: "manager-1".to_string(),
            status: InquiryStatus::New,
            payload: InquiryPayload::Structured { messages: vec![] },
        }
    }

    #[test]
    fn first_occurrence_per_listing_wins() {
        let input = vec![
            inquiry("1", "listing-5"),
            inquiry("2", "listing-5"),
            inquiry("3", "listing-7"),
        ];

        let deduped = dedupe_by_listing(input);
        let ids: Vec<&str> = deduped.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn order_is_preserved() {
        let input = vec![
            inquiry("9", "listing-c"),
            inquiry("4", "listing-a"),
            inquiry("7", "listing-b"),
            inquiry("1", "listing-a"),
        ];

        let deduped = dedupe_by_listing(input);
        let listings: Vec<&str> = deduped.iter().map(|i| i.listing_id.as_str()).collect();
        assert_eq!(listings, vec!["listing-c", "listing-a", "listing-b"]);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(dedupe_by_listing(vec![]).is_empty());
    }
}
