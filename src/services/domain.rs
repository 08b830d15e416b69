use std::collections::BTreeSet;

use crate::models::Domain;

/// Labels a category by whether its conceptual group is one the partner
/// already earns in
///
/// Membership is an exact, case-sensitive match. A category without a
/// conceptual group is always out of domain, as is everything when the
/// partner has no groups at all.
pub fn classify(conceptual_group: Option<&str>, partner_groups: &BTreeSet<String>) -> Domain {
    match conceptual_group {
        Some(group) if partner_groups.contains(group) => Domain::InDomain,
        _ => Domain::OutOfDomain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_member_group_is_in_domain() {
        assert_eq!(
            classify(Some("Finance"), &groups(&["Finance", "Travel"])),
            Domain::InDomain
        );
    }

    #[test]
    fn test_non_member_group_is_out_of_domain() {
        assert_eq!(
            classify(Some("Health"), &groups(&["Finance"])),
            Domain::OutOfDomain
        );
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert_eq!(
            classify(Some("finance"), &groups(&["Finance"])),
            Domain::OutOfDomain
        );
    }

    #[test]
    fn test_missing_group_never_matches() {
        assert_eq!(classify(None, &groups(&["Finance"])), Domain::OutOfDomain);
    }

    #[test]
    fn test_empty_partner_groups_degrade_to_out_of_domain() {
        assert_eq!(classify(Some("Finance"), &groups(&[])), Domain::OutOfDomain);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let partner = groups(&["Travel"]);
        let first = classify(Some("Travel"), &partner);
        let second = classify(Some("Travel"), &partner);
        assert_eq!(first, second);
    }
}
