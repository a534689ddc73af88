//! Expandable content sections: the product-details accordion and the FAQ.
//!
//! Both groups behave the same way: at most one item is open at a time,
//! opening an item closes its siblings, and opening an already-open item
//! simply closes it. Only openings are logged; closings are silent.

use serde::{Deserialize, Serialize};

/// Which content group a section belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    ProductDetails,
    Faq,
}

impl ContentKind {
    fn id_prefix(&self) -> &'static str {
        match self {
            ContentKind::ProductDetails => "accordion-item",
            ContentKind::Faq => "faq",
        }
    }
}

/// One expandable section.
#[derive(Debug, Clone)]
pub struct SectionItem {
    pub id: String,
    pub title: String,
    open: bool,
}

/// Details of a section that was just opened, for event logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOpened {
    pub kind: ContentKind,
    pub content_id: String,
    pub section_title: String,
    pub content_index: usize,
}

/// A group of sections with exclusive-open behavior.
#[derive(Debug, Clone)]
pub struct SectionGroup {
    kind: ContentKind,
    items: Vec<SectionItem>,
}

impl SectionGroup {
    pub fn new(kind: ContentKind, titles: &[&str]) -> Self {
        let items = titles
            .iter()
            .enumerate()
            .map(|(index, title)| SectionItem {
                id: format!("{}-{index}", kind.id_prefix()),
                title: (*title).to_string(),
                open: false,
            })
            .collect();
        Self { kind, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Toggles the section at `index`.
    ///
    /// Closes every section first, then re-opens the target unless it was
    /// the one that had been open. Returns opening details for logging, or
    /// `None` for a close (or an out-of-range index).
    pub fn toggle(&mut self, index: usize) -> Option<SectionOpened> {
        if index >= self.items.len() {
            return None;
        }
        let was_open = self.items[index].open;
        for item in &mut self.items {
            item.open = false;
        }
        if was_open {
            return None;
        }
        self.items[index].open = true;
        let item = &self.items[index];
        Some(SectionOpened {
            kind: self.kind,
            content_id: item.id.clone(),
            section_title: item.title.clone(),
            content_index: index,
        })
    }

    /// IDs of the currently open sections (zero or one entry).
    pub fn expanded_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.open)
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn expanded_count(&self) -> usize {
        self.items.iter().filter(|item| item.open).count()
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, bool)> {
        self.items.iter().map(|item| (item.title.as_str(), item.open))
    }
}

/// Open/closed state reported on every event envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedSections {
    pub accordion: Vec<String>,
    pub faq: Vec<String>,
}

/// Both content groups on the page.
#[derive(Debug, Clone)]
pub struct ContentSections {
    pub product_details: SectionGroup,
    pub faq: SectionGroup,
}

impl ContentSections {
    pub fn new(product_detail_titles: &[&str], faq_titles: &[&str]) -> Self {
        Self {
            product_details: SectionGroup::new(ContentKind::ProductDetails, product_detail_titles),
            faq: SectionGroup::new(ContentKind::Faq, faq_titles),
        }
    }

    pub fn group_mut(&mut self, kind: ContentKind) -> &mut SectionGroup {
        match kind {
            ContentKind::ProductDetails => &mut self.product_details,
            ContentKind::Faq => &mut self.faq,
        }
    }

    pub fn expanded(&self) -> ExpandedSections {
        ExpandedSections {
            accordion: self.product_details.expanded_ids(),
            faq: self.faq.expanded_ids(),
        }
    }

    /// Total number of open sections across both groups.
    pub fn expanded_count(&self) -> usize {
        self.product_details.expanded_count() + self.faq.expanded_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> SectionGroup {
        SectionGroup::new(
            ContentKind::ProductDetails,
            &["Specifications", "Shipping", "Warranty"],
        )
    }

    #[test]
    fn test_open_is_exclusive() {
        let mut group = group();
        assert!(group.toggle(0).is_some());
        let opened = group.toggle(2).expect("opening a sibling");
        assert_eq!(opened.content_id, "accordion-item-2");
        assert_eq!(opened.section_title, "Warranty");
        assert_eq!(group.expanded_count(), 1, "never two open at once");
        assert_eq!(group.expanded_ids(), vec!["accordion-item-2".to_string()]);
    }

    #[test]
    fn test_toggling_open_item_closes_silently() {
        let mut group = group();
        group.toggle(1);
        assert!(group.toggle(1).is_none(), "close must not log");
        assert_eq!(group.expanded_count(), 0);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut group = group();
        assert!(group.toggle(9).is_none());
        assert_eq!(group.expanded_count(), 0);
    }

    #[test]
    fn test_faq_ids_and_sub_action() {
        let mut sections = ContentSections::new(&["Specs"], &["Returns?", "Battery?"]);
        let opened = sections.group_mut(ContentKind::Faq).toggle(1).unwrap();
        assert_eq!(opened.content_id, "faq-1");
        assert_eq!(opened.kind, ContentKind::Faq);
        let expanded = sections.expanded();
        assert!(expanded.accordion.is_empty());
        assert_eq!(expanded.faq, vec!["faq-1".to_string()]);
        assert_eq!(sections.expanded_count(), 1);
    }
}
