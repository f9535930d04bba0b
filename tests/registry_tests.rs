use dupe_ledger::hasher::fingerprint_reader;
use dupe_ledger::{FileIdentity, Fingerprint, Registry};
use tempfile::tempdir;

fn make_entries(count: usize) -> Vec<(Fingerprint, FileIdentity)> {
    (0..count)
        .map(|i| {
            let fp = fingerprint_reader(format!("content-{}", i).as_bytes()).unwrap();
            (fp, FileIdentity::new(format!("/data/dir_{}", i % 3), format!("file_{}.bin", i)))
        })
        .collect()
}

#[test]
fn test_round_trip_is_independent_of_insertion_order() {
    let tmp = tempdir().unwrap();
    let forward_path = tmp.path().join("forward.json");
    let reverse_path = tmp.path().join("reverse.json");
    let entries = make_entries(50);

    let forward = Registry::new(&forward_path);
    for (fp, identity) in entries.iter().cloned() {
        assert!(forward.insert_if_absent(fp, identity).inserted());
    }
    forward.persist().unwrap();

    let reverse = Registry::new(&reverse_path);
    for (fp, identity) in entries.iter().rev().cloned() {
        reverse.insert_if_absent(fp, identity);
    }
    reverse.persist().unwrap();

    let reloaded_forward = Registry::load(&forward_path);
    let reloaded_reverse = Registry::load(&reverse_path);
    assert_eq!(reloaded_forward.entries(), forward.entries());
    assert_eq!(reloaded_forward.entries(), reloaded_reverse.entries());

    // Sorted keys make the persisted text itself order-independent.
    assert_eq!(
        std::fs::read_to_string(&forward_path).unwrap(),
        std::fs::read_to_string(&reverse_path).unwrap()
    );
}

#[test]
fn test_loaded_entries_keep_first_seen_identity() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("database.json");
    let fp = fingerprint_reader(&b"shared"[..]).unwrap();

    let registry = Registry::new(&path);
    registry.insert_if_absent(fp, FileIdentity::new("/first", "a.txt"));
    registry.persist().unwrap();

    let reloaded = Registry::load(&path);
    let outcome = reloaded.insert_if_absent(fp, FileIdentity::new("/second", "a.txt"));
    assert_eq!(outcome.existing(), Some(&FileIdentity::new("/first", "a.txt")));
    assert_eq!(reloaded.lookup(&fp).unwrap().directory, "/first");
}

#[test]
fn test_persist_to_explicit_path() {
    let tmp = tempdir().unwrap();
    let registry = Registry::new(tmp.path().join("default.json"));
    registry.insert_if_absent(
        fingerprint_reader(&b"z"[..]).unwrap(),
        FileIdentity::new("/z", "z"),
    );

    let export = tmp.path().join("export").join("copy.json");
    registry.persist_to(&export).unwrap();
    assert!(!registry.path().exists());
    assert_eq!(Registry::load(&export).len(), 1);
}
