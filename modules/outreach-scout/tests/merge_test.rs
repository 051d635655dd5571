//! Merge over a filesystem store.

use std::fs;

use outreach_common::{PartnerType, ShardKey, CSV_HEADER};
use outreach_scout::pipeline::{merge_dataset, merge_records};
use outreach_scout::store::{read_contacts, FsShardStore, ShardStore};
use outreach_scout::testing::contact;

fn seeded_store(dir: &std::path::Path) -> FsShardStore {
    let store = FsShardStore::new(dir.join("out"));
    store
        .write(
            &ShardKey::new("paris_france", PartnerType::Influencer),
            &[
                contact("Claire", "claire@example.org", ""),
                contact("Dup by insta", "", "@shared"),
            ],
        )
        .unwrap();
    store
        .write(
            &ShardKey::new("berlin_germany", PartnerType::Ngo),
            &[
                contact("Anna", "anna@example.org", ""),
                contact("Shared", "", "shared"),
            ],
        )
        .unwrap();
    store
        .write(
            &ShardKey::new("berlin_germany", PartnerType::Podcaster),
            &[contact("Anna again", "Anna@Example.org", "")],
        )
        .unwrap();
    store
}

#[test]
fn merge_keeps_first_record_in_dataset_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path());

    let (merged, stats) = merge_records(&store).unwrap();
    let names: Vec<_> = merged.iter().map(|r| r.name.as_str()).collect();

    // berlin/podcaster precedes berlin/ngo by partner-type order, berlin precedes paris.
    assert_eq!(names, vec!["Anna again", "Shared", "Claire"]);
    assert_eq!(stats.records_read, 5);
    assert_eq!(stats.duplicates, 2);
}

#[test]
fn merge_is_byte_identical_on_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path());
    let output = dir.path().join("merged.csv");

    merge_dataset(&store, &output).unwrap();
    let first = fs::read(&output).unwrap();
    merge_dataset(&store, &output).unwrap();
    let second = fs::read(&output).unwrap();

    assert_eq!(first, second);
    let header = String::from_utf8(first).unwrap();
    assert!(header.starts_with(&CSV_HEADER.join(",")));
    assert_eq!(read_contacts(&output).unwrap().len(), 3);
}

#[test]
fn irregular_rows_pass_through_merge() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsShardStore::new(dir.path());
    let path = store.shard_path(&ShardKey::new("paris_france", PartnerType::Ngo));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        "name,email,country,language,city,instagram,twitter,phone,organization,type,notes\n\
         Good,g@example.org,FRA,fr,Paris,,,,,ngo,\n\
         Odd,o@example.org,FRA,fr,Paris,,,,,Ngo,\n\
         Blogger,b@example.org,FRA,fr,Paris,,,,,blogger,\n",
    )
    .unwrap();

    let (merged, stats) = merge_records(&store).unwrap();
    let names: Vec<_> = merged.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Good", "Odd", "Blogger"]);
    assert_eq!(stats.duplicates, 0);
}
