//! End-to-end scenarios exercising the Coordinator's public operations
//! against a real temp-dir project, no mocked filesystem.

mod helpers;

use std::time::Duration;

use helpers::TestHarness;

#[test]
fn simple_keyword_clean_project() {
    let h = TestHarness::from_files(&[("a.py", "def hello():\n    return 'world'\n")]);

    let results = h.coordinator.engine().search("hello", 10).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, "a.py");
    assert_eq!(results[0].line_number, 1);
    assert_eq!(results[0].text, "def hello():");
    assert!(results[0].score > 0.0);
    assert_eq!(results[0].language, "python");
}

#[test]
fn multi_term_ranking_favors_code_over_markup() {
    let h = TestHarness::from_files(&[
        ("x.ts", "async function fetchUser() {}\n"),
        ("y.ts", "function fetchUser() {}\n"),
        ("z.md", "fetch the user\n"),
    ]);

    let results = h.coordinator.engine().search("fetchUser", 10).unwrap();

    assert!(!results.is_empty());
    assert!(matches!(results[0].path.as_str(), "x.ts" | "y.ts"));
    let md_rank = results.iter().position(|r| r.path == "z.md");
    if let Some(pos) = md_rank {
        assert_eq!(pos, results.len() - 1);
    }
}

#[test]
fn incremental_update_via_watcher() {
    let h = TestHarness::from_files(&[("a.py", "def hello():\n    return 'world'\n")]);

    h.coordinator.start_watcher().expect("watcher should start");
    h.write("a.py", "def hello():\n    return 'world'\nXYZ_MARKER\n");

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    let mut results = Vec::new();
    while std::time::Instant::now() < deadline {
        results = h.coordinator.engine().search("XYZ_MARKER", 10).unwrap();
        if !results.is_empty() {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, "a.py");
    assert_eq!(results[0].line_number, 3);
}

#[test]
fn snapshot_version_mismatch_forces_rebuild() {
    use prism_core::store::IndexStore;

    let h = TestHarness::from_files(&[("a.py", "alpha\n")]);
    let config = prism_core::config::PrismConfig::new(h.root());
    let snapshot_path = config.snapshot_path();
    assert!(snapshot_path.exists());

    // Overwrite with a structurally valid snapshot tagged with an old
    // version: it must be discarded wholesale, not partially trusted.
    let mut stale = IndexStore::new("0.0", "stale", h.root().display().to_string());
    stale.insert_or_replace_file("a.py", b"alpha\n");
    prism_core::snapshot::save(&stale, &snapshot_path, &config).unwrap();

    let reopened = prism_core::coordinator::Coordinator::new(config);
    let summary = reopened.init().unwrap();

    assert_eq!(summary.file_count, 1);
    assert_eq!(reopened.engine().search("alpha", 10).unwrap().len(), 1);
}

#[test]
fn delta_reindex_adds_modifies_and_deletes() {
    let h = TestHarness::from_files(&[
        ("a.ts", "alpha marker\n"),
        ("b.ts", "beta marker\n"),
        ("c.ts", "gamma marker\n"),
    ]);

    let before_c = h.coordinator.engine().search("gamma", 10).unwrap();
    assert_eq!(before_c.len(), 1);

    h.remove("b.ts");
    h.write("a.ts", "alpha marker\nnew line\n");

    let summary = h.coordinator.reindex().unwrap();
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.modified, 1);
    assert_eq!(summary.unchanged, 1);

    assert!(h.coordinator.get_file_context("b.ts").is_err());
    let a_results = h.coordinator.engine().search("new line", 10).unwrap();
    assert_eq!(a_results.len(), 1);

    let after_c = h.coordinator.engine().search("gamma", 10).unwrap();
    assert_eq!(after_c, before_c);
}

#[test]
fn cache_coherence_under_mutation() {
    let h = TestHarness::from_files(&[("a.py", "def hello():\n")]);

    let r1 = h.coordinator.engine().search("alpha", 10).unwrap();
    assert!(r1.is_empty());

    h.write("a.py", "def hello():\n    alpha = 1\n");
    h.coordinator.update_file("a.py").unwrap();

    let r2 = h.coordinator.engine().search("alpha", 10).unwrap();
    assert_eq!(r2.len(), 1);
    assert_eq!(r2[0].line_number, 2);
}
