//! Handle enrichment over a filesystem store.

use std::time::Duration;

use outreach_common::{PartnerType, ShardKey};
use outreach_scout::enrichment::{Enricher, EnrichmentSettings};
use outreach_scout::store::{FsShardStore, ShardStore};
use outreach_scout::testing::{contact, MockReconciler};

fn settings(batch_size: usize) -> EnrichmentSettings {
    EnrichmentSettings {
        batch_size,
        delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn batches_span_shards_and_only_changed_shards_are_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsShardStore::new(dir.path());
    let done = ShardKey::new("berlin_germany", PartnerType::Ngo);
    let open = ShardKey::new("paris_france", PartnerType::Influencer);
    let open_too = ShardKey::new("paris_france", PartnerType::Other);

    let mut finished = contact("Finished", "f@example.org", "");
    finished.twitter = "@finished".into();
    store.write(&done, &[finished]).unwrap();
    store
        .write(&open, &[contact("Ana", "ana@example.org", ""), contact("Ben", "ben@example.org", "")])
        .unwrap();
    store.write(&open_too, &[contact("Cleo", "cleo@example.org", "")]).unwrap();

    let untouched_before = std::fs::read(store.shard_path(&done)).unwrap();

    let reconciler = MockReconciler::new()
        .answer("Ana", "@ana_real")
        .answer("Cleo", "not_sure");
    let stats = Enricher::new(&reconciler, settings(2))
        .enrich_shards(&store)
        .await
        .unwrap();

    assert_eq!(stats.candidates, 3);
    assert_eq!(stats.batches, 2);
    assert_eq!(stats.shards_rewritten, 2);
    assert_eq!(reconciler.calls()[0].len(), 2);

    let paris = store.read(&open).unwrap();
    assert_eq!(paris[0].twitter, "@ana_real");
    assert_eq!(paris[1].twitter, "not_found");
    assert_eq!(store.read(&open_too).unwrap()[0].twitter, "not_sure");
    assert_eq!(std::fs::read(store.shard_path(&done)).unwrap(), untouched_before);
}

#[tokio::test]
async fn second_pass_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsShardStore::new(dir.path());
    store
        .write(
            &ShardKey::new("lima_peru", PartnerType::Podcaster),
            &[contact("Dee", "dee@example.org", ""), contact("Eli", "eli@example.org", "")],
        )
        .unwrap();

    let first = MockReconciler::new().answer("Dee", "not_sure");
    Enricher::new(&first, settings(20)).enrich_shards(&store).await.unwrap();

    let second = MockReconciler::new().answer("Dee", "@dee");
    let stats = Enricher::new(&second, settings(20)).enrich_shards(&store).await.unwrap();

    assert_eq!(stats.candidates, 0);
    assert!(second.calls().is_empty());
    let records = store.read(&ShardKey::new("lima_peru", PartnerType::Podcaster)).unwrap();
    assert_eq!(records[0].twitter, "not_sure");
    assert_eq!(records[1].twitter, "not_found");
}

#[tokio::test]
async fn mismatched_batch_leaves_its_shard_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsShardStore::new(dir.path());
    let key = ShardKey::new("lima_peru", PartnerType::Ngo);
    store
        .write(&key, &[contact("Fay", "fay@example.org", ""), contact("Gus", "gus@example.org", "")])
        .unwrap();
    let before = std::fs::read(store.shard_path(&key)).unwrap();

    let reconciler = MockReconciler::new().answer("Fay", "@fay").short_on_call(0);
    let stats = Enricher::new(&reconciler, settings(5)).enrich_shards(&store).await.unwrap();

    assert_eq!(stats.batches_mismatched, 1);
    assert_eq!(stats.shards_rewritten, 0);
    assert_eq!(std::fs::read(store.shard_path(&key)).unwrap(), before);
}

#[tokio::test]
async fn merged_file_can_be_enriched_directly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("merged.csv");
    outreach_scout::store::write_contacts(&path, &[contact("Hal", "hal@example.org", "")]).unwrap();

    let reconciler = MockReconciler::new().answer("Hal", "x.com/hal_ok");
    let stats = Enricher::new(&reconciler, settings(20)).enrich_file(&path).await.unwrap();

    assert_eq!(stats.resolved, 1);
    let records = outreach_scout::store::read_contacts(&path).unwrap();
    assert_eq!(records[0].twitter, "@hal_ok");
}

const HEADER: &str = "name,email,country,language,city,instagram,twitter,phone,organization,type,notes\n";

#[tokio::test]
async fn irregular_rows_survive_enrichment() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsShardStore::new(dir.path());
    let key = ShardKey::new("paris_france", PartnerType::Ngo);
    let path = store.shard_path(&key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        format!(
            "{HEADER}Good,g@example.org,FRA,fr,Paris,,,,,ngo,\n\
             Odd,o@example.org,FRA,fr,Paris,,,,,Ngo,\n\
             Short,s@example.org,FRA,fr,Paris\n"
        ),
    )
    .unwrap();

    let reconciler = MockReconciler::new().answer("Odd", "@odd");
    let stats = Enricher::new(&reconciler, settings(20)).enrich_shards(&store).await.unwrap();

    assert_eq!(stats.candidates, 3);
    assert_eq!(stats.shards_rewritten, 1);
    let records = store.read(&key).unwrap();
    let rows: Vec<_> = records.iter().map(|r| (r.name.as_str(), r.twitter.as_str())).collect();
    assert_eq!(rows, vec![("Good", "not_found"), ("Odd", "@odd"), ("Short", "not_found")]);
    assert_eq!(records[2].city, "Paris");
}

#[tokio::test]
async fn shard_with_unreadable_rows_is_not_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsShardStore::new(dir.path());
    let key = ShardKey::new("paris_france", PartnerType::Other);
    let path = store.shard_path(&key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let original = format!(
        "{HEADER}Good,g@example.org,FRA,fr,Paris,,,,,other,\n\
         Blogger,b@example.org,FRA,fr,Paris,,,,,blogger,\n"
    );
    std::fs::write(&path, &original).unwrap();

    let reconciler = MockReconciler::new();
    let stats = Enricher::new(&reconciler, settings(20)).enrich_shards(&store).await.unwrap();

    assert_eq!(stats.shards_failed, 1);
    assert_eq!(stats.candidates, 0);
    assert!(reconciler.calls().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
}

#[tokio::test]
async fn file_with_unreadable_rows_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("merged.csv");
    let original = format!("{HEADER}Wide,w@example.org,FRA,fr,Paris,,,,,ngo,,extra\n");
    std::fs::write(&path, &original).unwrap();

    let reconciler = MockReconciler::new();
    let err = Enricher::new(&reconciler, settings(20)).enrich_file(&path).await.unwrap_err();

    assert!(matches!(err, outreach_common::OutreachError::Persistence { .. }));
    assert!(reconciler.calls().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
}
