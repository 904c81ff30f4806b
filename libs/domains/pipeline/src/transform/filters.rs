//! Translating request filters into the index's native form.

use crate::models::{FilterSpec, NamespaceFilter};

/// Translate client filter specs 1:1 into namespace filters, preserving
/// order. Entries without a namespace are dropped; allow and deny lists
/// pass through untouched.
pub fn translate_filters(specs: &[FilterSpec]) -> Vec<NamespaceFilter> {
    specs
        .iter()
        .filter(|spec| !spec.namespace.is_empty())
        .map(|spec| NamespaceFilter {
            namespace: spec.namespace.clone(),
            allow_list: spec.allow.clone(),
            deny_list: spec.deny.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_lists_through_in_order() {
        let specs = vec![
            FilterSpec {
                namespace: "brand".to_string(),
                allow: vec!["Acme".to_string()],
                deny: vec![],
            },
            FilterSpec {
                namespace: "color".to_string(),
                allow: vec![],
                deny: vec!["red".to_string()],
            },
        ];

        let filters = translate_filters(&specs);
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].namespace, "brand");
        assert_eq!(filters[0].allow_list, vec!["Acme"]);
        assert_eq!(filters[1].deny_list, vec!["red"]);
    }

    #[test]
    fn drops_entries_without_namespace() {
        let specs = vec![FilterSpec {
            namespace: String::new(),
            allow: vec!["x".to_string()],
            deny: vec![],
        }];
        assert!(translate_filters(&specs).is_empty());
    }
}
