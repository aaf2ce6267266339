//! Deliverable declaration scanning, reconciliation, and placeholder synthesis.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extraction::rules::{normalize_whitespace, DeclarationExtractor, FieldExtractor};
use crate::models::config::{ExtractionConfig, PagePolicy};
use crate::models::schedule::Deliverable;
use crate::pdf::RawDocument;

/// Outcome of scanning a document for deliverables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableScan {
    /// Deliverables in schedule order, declared or synthesized.
    pub deliverables: Vec<Deliverable>,

    /// Unique declarations found in the document.
    pub detected_count: usize,

    /// Pages (1-based) whose declarations were used.
    pub source_pages: Vec<usize>,

    /// Pages with declarations that the page policy ignored.
    pub ignored_pages: Vec<usize>,

    /// Repeated declarations dropped during deduplication.
    pub duplicates_removed: usize,

    /// True when no declaration was found and placeholders were generated.
    pub synthesized: bool,

    /// Count the total amount is divided by. Zero when neither declared nor detected.
    pub final_count: u32,
}

/// Builds the deliverable list for a document.
pub struct ScheduleBuilder {
    config: ExtractionConfig,
    extractor: DeclarationExtractor,
}

impl ScheduleBuilder {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            extractor: DeclarationExtractor::new(),
        }
    }

    /// Set the page policy.
    pub fn with_page_policy(mut self, policy: PagePolicy) -> Self {
        self.config.page_policy = policy;
        self
    }

    pub fn page_policy(&self) -> PagePolicy {
        self.config.page_policy
    }

    /// Scan the pages, reconcile with the declared count, and synthesize
    /// placeholders when nothing was declared.
    pub fn scan(&self, document: &RawDocument, declared_count: u32) -> DeliverableScan {
        let mut seen = HashSet::new();
        let mut deliverables = Vec::new();
        let mut source_pages = Vec::new();
        let mut ignored_pages = Vec::new();
        let mut duplicates_removed = 0;

        for (page, text) in document.text_pages() {
            let normalized = normalize_whitespace(text);
            let found = self.extractor.extract_all(&normalized);
            if found.is_empty() {
                continue;
            }

            let take = match self.config.page_policy {
                PagePolicy::FirstMatchingPageOnly => source_pages.is_empty(),
                PagePolicy::AllPages => true,
            };

            if !take {
                ignored_pages.push(page);
                continue;
            }

            debug!("Page {}: {} deliverable declarations", page, found.len());
            source_pages.push(page);
            for m in found {
                if seen.insert(m.value) {
                    deliverables.push(m.value);
                } else {
                    duplicates_removed += 1;
                }
            }
        }

        if !ignored_pages.is_empty() {
            warn!(
                "Declarations on pages {:?} ignored; only page {:?} is used",
                ignored_pages, source_pages
            );
        }

        let detected_count = deliverables.len();
        let final_count = reconcile_count(declared_count, detected_count);

        let synthesized = deliverables.is_empty();
        if synthesized {
            let count = if declared_count == 0 {
                self.config.default_deliverable_count
            } else {
                declared_count
            }
            .min(self.config.max_deliverables);
            debug!("No declarations found, synthesizing {} placeholders", count);
            deliverables = synthesize_placeholders(count, self.config.placeholder_step_days);
        }

        DeliverableScan {
            deliverables,
            detected_count,
            source_pages,
            ignored_pages,
            duplicates_removed,
            synthesized,
            final_count,
        }
    }
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

/// Final deliverable count: the declared count, raised to the detected count
/// when more declarations were found. Never lowered.
pub fn reconcile_count(declared: u32, detected: usize) -> u32 {
    let detected = u32::try_from(detected).unwrap_or(u32::MAX);
    declared.max(detected)
}

/// Placeholders `ENTREGABLE_1..=count`, due every `step_days` days.
pub fn synthesize_placeholders(count: u32, step_days: u32) -> Vec<Deliverable> {
    (1..=count.max(1))
        .map(|i| Deliverable::placeholder(i, i.saturating_mul(step_days)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::{DeliverableName, Ordinal};
    use pretty_assertions::assert_eq;

    fn doc(pages: &[&str]) -> RawDocument {
        RawDocument::from_texts(pages.iter().copied())
    }

    #[test]
    fn test_first_matching_page_wins() {
        let document = doc(&[
            "Condiciones generales sin plazos",
            "PRIMER ENTREGABLE HASTA 30 DIAS\nSEGUNDO ENTREGABLE HASTA 60 DIAS",
            "TERCER ENTREGABLE HASTA 90 DIAS",
        ]);
        let scan = ScheduleBuilder::default().scan(&document, 0);

        assert_eq!(
            scan.deliverables,
            vec![
                Deliverable::declared(Ordinal::Primer, 30),
                Deliverable::declared(Ordinal::Segundo, 60),
            ]
        );
        assert_eq!(scan.source_pages, vec![2]);
        assert_eq!(scan.ignored_pages, vec![3]);
        assert_eq!(scan.final_count, 2);
        assert!(!scan.synthesized);
    }

    #[test]
    fn test_all_pages_policy_merges() {
        let document = doc(&[
            "PRIMER ENTREGABLE HASTA 30 DIAS",
            "PRIMER ENTREGABLE HASTA 30 DIAS SEGUNDO ENTREGABLE HASTA 60 DIAS",
        ]);
        let scan = ScheduleBuilder::default()
            .with_page_policy(PagePolicy::AllPages)
            .scan(&document, 0);

        assert_eq!(scan.detected_count, 2);
        assert_eq!(scan.source_pages, vec![1, 2]);
        assert_eq!(scan.duplicates_removed, 1);
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let document = doc(&[
            "SEGUNDO ENTREGABLE HASTA 60 DIAS PRIMER ENTREGABLE HASTA 30 DIAS \
             SEGUNDO ENTREGABLE HASTA 60 DIAS PRIMER ENTREGABLE HASTA 45 DIAS",
        ]);
        let scan = ScheduleBuilder::default().scan(&document, 0);

        assert_eq!(
            scan.deliverables,
            vec![
                Deliverable::declared(Ordinal::Segundo, 60),
                Deliverable::declared(Ordinal::Primer, 30),
                Deliverable::declared(Ordinal::Primer, 45),
            ]
        );
        assert_eq!(scan.duplicates_removed, 1);
    }

    #[test]
    fn test_accented_and_plain_labels_deduplicate() {
        let document = doc(&["SÉPTIMO ENTREGABLE HASTA 210 DIAS SEPTIMO ENTREGABLE HASTA 210 DÍAS"]);
        let scan = ScheduleBuilder::default().scan(&document, 0);
        assert_eq!(scan.deliverables.len(), 1);
    }

    #[test]
    fn test_declared_count_raised_never_lowered() {
        let two = doc(&["PRIMER ENTREGABLE HASTA 30 DIAS SEGUNDO ENTREGABLE HASTA 60 DIAS"]);
        let builder = ScheduleBuilder::default();

        assert_eq!(builder.scan(&two, 1).final_count, 2);
        assert_eq!(builder.scan(&two, 4).final_count, 4);
        assert_eq!(builder.scan(&two, 4).deliverables.len(), 2);
    }

    #[test]
    fn test_default_placeholders() {
        let scan = ScheduleBuilder::default().scan(&RawDocument::default(), 0);

        assert!(scan.synthesized);
        assert_eq!(scan.final_count, 0);
        let deadlines: Vec<u32> = scan.deliverables.iter().map(|d| d.deadline_days).collect();
        assert_eq!(deadlines, vec![30, 60, 90, 120, 150]);
        assert_eq!(scan.deliverables[0].name, DeliverableName::Placeholder(1));
    }

    #[test]
    fn test_placeholders_follow_declared_count() {
        let scan = ScheduleBuilder::default().scan(&doc(&["texto"]), 3);

        assert!(scan.synthesized);
        assert_eq!(scan.final_count, 3);
        assert_eq!(scan.deliverables.len(), 3);
        assert_eq!(scan.deliverables[2], Deliverable::placeholder(3, 90));
    }

    #[test]
    fn test_reconcile_count() {
        assert_eq!(reconcile_count(0, 0), 0);
        assert_eq!(reconcile_count(3, 2), 3);
        assert_eq!(reconcile_count(2, 5), 5);
    }
}
