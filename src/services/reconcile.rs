// Reconciliation pipeline
// Matches library items against the catalog, labels them and collects results

use super::{AvailabilitySource, LabelWriter, MetadataSource};
use crate::models::{Label, LibraryItem, MatchedShow, Provider, ReconciliationResult};
use crate::title;

/// Counters for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub items: usize,
    pub matched: usize,
    pub ended: usize,
    pub labels_written: usize,
    pub label_failures: usize,
    pub lookup_failures: usize,
}

pub struct Reconciler<'a> {
    availability: &'a dyn AvailabilitySource,
    metadata: &'a dyn MetadataSource,
    writer: &'a dyn LabelWriter,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        availability: &'a dyn AvailabilitySource,
        metadata: &'a dyn MetadataSource,
        writer: &'a dyn LabelWriter,
    ) -> Self {
        Self {
            availability,
            metadata,
            writer,
            dry_run: false,
        }
    }

    /// Log label changes instead of writing them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process `items` one at a time, in order.
    ///
    /// `on_progress(done, total)` is called after every item. Per-item
    /// failures are logged and never stop the run.
    pub async fn run<F>(
        &self,
        items: &[LibraryItem],
        providers: &[Provider],
        mut on_progress: F,
    ) -> (Vec<ReconciliationResult>, RunSummary)
    where
        F: FnMut(usize, usize),
    {
        let mut results = Vec::new();
        let mut summary = RunSummary {
            items: items.len(),
            ..Default::default()
        };

        for (index, item) in items.iter().enumerate() {
            if let Some(result) = self.reconcile_item(item, providers, &mut summary).await {
                results.push(result);
            }
            on_progress(index + 1, items.len());
        }

        (results, summary)
    }

    async fn reconcile_item(
        &self,
        item: &LibraryItem,
        providers: &[Provider],
        summary: &mut RunSummary,
    ) -> Option<ReconciliationResult> {
        let search_name = title::normalize(&item.title);

        let (matched, external) = tokio::join!(
            self.availability.find_best_match(&item.title, providers),
            self.metadata.lookup_status(&search_name),
        );

        let show = match matched {
            Ok(Some(show)) => show,
            Ok(None) => {
                tracing::debug!("No catalog match for '{}'", item.title);
                return None;
            }
            Err(e) => {
                tracing::warn!("Catalog lookup failed for '{}': {}", item.title, e);
                summary.lookup_failures += 1;
                return None;
            }
        };
        summary.matched += 1;
        tracing::debug!("'{}' matched catalog entry {}", item.title, show.external_id);

        if let Some(ext) = &external {
            tracing::debug!(
                "'{}' -> TVMaze #{} '{}' (imdb {}, thetvdb {}), status {}",
                search_name,
                ext.id,
                ext.name,
                ext.imdb_id.as_deref().unwrap_or("-"),
                ext.thetvdb_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                ext.status.as_deref().unwrap_or("unknown")
            );
        }

        let ended = external.as_ref().is_some_and(|s| s.is_ended());
        if ended {
            summary.ended += 1;
        }

        let labels = derive_labels(&show, providers, ended);
        if labels.is_empty() {
            // Leave any manually applied labels alone
            tracing::debug!("'{}' not available on any monitored provider", item.title);
        } else if self.dry_run {
            tracing::info!(
                "[dry run] would label '{}' with {}",
                item.title,
                label_names(&labels)
            );
        } else {
            match self.writer.apply_labels(&item.id, &labels).await {
                Ok(()) => {
                    tracing::debug!("Labelled '{}' with {}", item.title, label_names(&labels));
                    summary.labels_written += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to update labels for '{}': {}", item.title, e);
                    summary.label_failures += 1;
                }
            }
        }

        Some(ReconciliationResult { show, ended })
    }
}

/// Monitored providers carrying an offer for `show`, in configured order,
/// plus the `Ended` marker when the show has finished airing.
pub fn derive_labels(show: &MatchedShow, providers: &[Provider], ended: bool) -> Vec<Label> {
    let mut labels: Vec<Label> = providers
        .iter()
        .filter(|p| show.has_offer_for(p.id))
        .map(Label::from)
        .collect();

    if ended {
        labels.push(Label::ended());
    }

    labels
}

fn label_names(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|l| l.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogProvider, ExternalShow, ItemId, LabelId, Offer, ProviderId};
    use crate::services::{Result, ServiceError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::Barrier;

    #[derive(Default)]
    struct FakeCatalog {
        shows: HashMap<String, MatchedShow>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl AvailabilitySource for FakeCatalog {
        async fn list_providers(&self) -> Result<Vec<CatalogProvider>> {
            Ok(Vec::new())
        }

        async fn find_best_match(
            &self,
            title: &str,
            _providers: &[Provider],
        ) -> Result<Option<MatchedShow>> {
            if self.failing.iter().any(|t| t == title) {
                return Err(ServiceError::Decode {
                    service: "fake",
                    field: "data",
                });
            }
            Ok(self.shows.get(title).cloned())
        }
    }

    #[derive(Default)]
    struct FakeMetadata {
        statuses: HashMap<String, String>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MetadataSource for FakeMetadata {
        async fn lookup_status(&self, title: &str) -> Option<ExternalShow> {
            self.queries.lock().unwrap().push(title.to_string());
            self.statuses.get(title).map(|status| ExternalShow {
                id: 1,
                name: title.to_string(),
                status: Some(status.clone()),
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        calls: Mutex<Vec<(ItemId, Vec<Label>)>>,
        failing: Vec<ItemId>,
    }

    #[async_trait]
    impl LabelWriter for RecordingWriter {
        async fn apply_labels(&self, item_id: &ItemId, labels: &[Label]) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((item_id.clone(), labels.to_vec()));
            if self.failing.contains(item_id) {
                return Err(ServiceError::Decode {
                    service: "fake",
                    field: "labels",
                });
            }
            Ok(())
        }
    }

    fn item(id: &str, title: &str) -> LibraryItem {
        LibraryItem {
            id: ItemId::from(id),
            title: title.to_string(),
        }
    }

    fn provider(id: i64, name: &str) -> Provider {
        Provider {
            id: ProviderId(id),
            name: name.to_string(),
        }
    }

    fn offer(id: i64, kind: &str) -> Offer {
        Offer {
            provider_id: ProviderId(id),
            monetization_kind: kind.to_string(),
            provider_short_name: format!("p{id}"),
            provider_clear_name: format!("Provider {id}"),
        }
    }

    fn show(title: &str, offers: Vec<Offer>) -> MatchedShow {
        MatchedShow {
            title: title.to_string(),
            external_id: format!("{title}-id"),
            offers,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let catalog = FakeCatalog {
            shows: HashMap::from([(
                "Show X".to_string(),
                show("Show X", vec![offer(8, "FLATRATE")]),
            )]),
            ..Default::default()
        };
        let metadata = FakeMetadata::default();
        let writer = RecordingWriter::default();
        let providers = vec![provider(8, "NetFlix")];
        let items = vec![item("1", "Show X"), item("2", "Show Y (2020)")];

        let reconciler = Reconciler::new(&catalog, &metadata, &writer);
        let (results, summary) = reconciler.run(&items, &providers, |_, _| {}).await;

        let calls = writer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, ItemId::from("1"));
        assert_eq!(
            calls[0].1,
            vec![Label {
                id: LabelId::Provider(ProviderId(8)),
                name: "NetFlix".to_string()
            }]
        );

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].show.title, "Show X");
        assert!(!results[0].ended);
        assert_eq!(summary.items, 2);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.labels_written, 1);
    }

    #[tokio::test]
    async fn test_ended_marker_added() {
        let catalog = FakeCatalog {
            shows: HashMap::from([(
                "Lost: Missing Pieces (2004)".to_string(),
                show("Lost", vec![offer(9, "FLATRATE"), offer(8, "ADS")]),
            )]),
            ..Default::default()
        };
        // Metadata is queried with the normalized title
        let metadata = FakeMetadata {
            statuses: HashMap::from([("Lost".to_string(), "Ended".to_string())]),
            ..Default::default()
        };
        let writer = RecordingWriter::default();
        let providers = vec![provider(8, "Netflix"), provider(9, "Hulu")];
        let items = vec![item("7", "Lost: Missing Pieces (2004)")];

        let (results, summary) = Reconciler::new(&catalog, &metadata, &writer)
            .run(&items, &providers, |_, _| {})
            .await;

        assert_eq!(*metadata.queries.lock().unwrap(), vec!["Lost".to_string()]);

        let calls = writer.calls.lock().unwrap();
        let ids: Vec<LabelId> = calls[0].1.iter().map(|l| l.id).collect();
        // Configured order, then the marker
        assert_eq!(
            ids,
            vec![
                LabelId::Provider(ProviderId(8)),
                LabelId::Provider(ProviderId(9)),
                LabelId::Ended
            ]
        );
        assert_eq!(calls[0].1[2].name, "Ended");
        assert!(results[0].ended);
        assert_eq!(summary.ended, 1);
    }

    #[tokio::test]
    async fn test_no_offers_skips_write_but_keeps_result() {
        let catalog = FakeCatalog {
            shows: HashMap::from([("Obscure".to_string(), show("Obscure", vec![]))]),
            ..Default::default()
        };
        let metadata = FakeMetadata::default();
        let writer = RecordingWriter::default();

        let (results, summary) = Reconciler::new(&catalog, &metadata, &writer)
            .run(&[item("3", "Obscure")], &[provider(8, "Netflix")], |_, _| {})
            .await;

        assert!(writer.calls.lock().unwrap().is_empty());
        assert_eq!(results.len(), 1);
        assert!(results[0].show.offers.is_empty());
        assert_eq!(summary.labels_written, 0);
    }

    #[tokio::test]
    async fn test_ended_without_offers_still_labels() {
        let catalog = FakeCatalog {
            shows: HashMap::from([("Firefly".to_string(), show("Firefly", vec![]))]),
            ..Default::default()
        };
        let metadata = FakeMetadata {
            statuses: HashMap::from([("Firefly".to_string(), "Ended".to_string())]),
            ..Default::default()
        };
        let writer = RecordingWriter::default();

        Reconciler::new(&catalog, &metadata, &writer)
            .run(&[item("4", "Firefly")], &[provider(8, "Netflix")], |_, _| {})
            .await;

        let calls = writer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec![Label::ended()]);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_run() {
        let catalog = FakeCatalog {
            shows: HashMap::from([
                ("A".to_string(), show("A", vec![offer(8, "FLATRATE")])),
                ("C".to_string(), show("C", vec![offer(8, "FLATRATE")])),
            ]),
            failing: vec!["B".to_string()],
        };
        let metadata = FakeMetadata::default();
        let writer = RecordingWriter {
            failing: vec![ItemId::from("1")],
            ..Default::default()
        };
        let items = vec![item("1", "A"), item("2", "B"), item("3", "C")];

        let mut progress = Vec::new();
        let (results, summary) = Reconciler::new(&catalog, &metadata, &writer)
            .run(&items, &[provider(8, "Netflix")], |done, total| {
                progress.push((done, total))
            })
            .await;

        let titles: Vec<_> = results.iter().map(|r| r.show.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
        assert_eq!(writer.calls.lock().unwrap().len(), 2);
        assert_eq!(summary.lookup_failures, 1);
        assert_eq!(summary.label_failures, 1);
        assert_eq!(summary.labels_written, 1);
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_dry_run_never_writes() {
        let catalog = FakeCatalog {
            shows: HashMap::from([("A".to_string(), show("A", vec![offer(8, "FLATRATE")]))]),
            ..Default::default()
        };
        let metadata = FakeMetadata::default();
        let writer = RecordingWriter::default();

        let (results, _) = Reconciler::new(&catalog, &metadata, &writer)
            .dry_run(true)
            .run(&[item("1", "A")], &[provider(8, "Netflix")], |_, _| {})
            .await;

        assert!(writer.calls.lock().unwrap().is_empty());
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_derive_labels_dedupes_offers() {
        let show = show(
            "X",
            vec![offer(8, "FLATRATE"), offer(8, "FREE"), offer(73, "ADS")],
        );
        let providers = vec![provider(73, "Tubi"), provider(8, "Netflix")];

        let labels = derive_labels(&show, &providers, false);
        let names: Vec<_> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Tubi", "Netflix"]);
    }

    // Both lookups must be in flight together: each waits for the other
    struct BarrierCatalog(Arc<Barrier>);
    struct BarrierMetadata(Arc<Barrier>);

    #[async_trait]
    impl AvailabilitySource for BarrierCatalog {
        async fn list_providers(&self) -> Result<Vec<CatalogProvider>> {
            Ok(Vec::new())
        }

        async fn find_best_match(
            &self,
            title: &str,
            _providers: &[Provider],
        ) -> Result<Option<MatchedShow>> {
            self.0.wait().await;
            Ok(Some(show(title, vec![])))
        }
    }

    #[async_trait]
    impl MetadataSource for BarrierMetadata {
        async fn lookup_status(&self, _title: &str) -> Option<ExternalShow> {
            self.0.wait().await;
            None
        }
    }

    #[tokio::test]
    async fn test_lookups_run_concurrently() {
        let barrier = Arc::new(Barrier::new(2));
        let catalog = BarrierCatalog(barrier.clone());
        let metadata = BarrierMetadata(barrier);
        let writer = RecordingWriter::default();
        let items = vec![item("1", "A"), item("2", "B")];

        let reconciler = Reconciler::new(&catalog, &metadata, &writer);
        let run = reconciler.run(&items, &[], |_, _| {});
        let (results, _) = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("lookups were awaited one after the other");

        assert_eq!(results.len(), 2);
    }
}
