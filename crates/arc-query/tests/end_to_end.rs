//! End-to-end scenarios spanning a real git repository and an in-memory
//! store, exercising the facade the way the `arc` CLI does.

use std::path::Path;
use std::process::Command;

use arc_model::edge::EdgeBuilder;
use arc_model::enums::{EdgeRel, NodeType};
use arc_model::id::commit_id;
use arc_model::node::NodeBuilder;
use arc_store::Storage;
use arc_query::{ExportOptions, ImpactType, QueryFacade, RelatedDirection};
use arc_store::SqliteStore;
use chrono::Utc;

fn init_repo(dir: &Path) -> String {
    let run = |args: &[&str]| {
        let status = Command::new("git").args(args).current_dir(dir).status().unwrap();
        assert!(status.success(), "git {args:?} failed");
    };
    run(&["init", "-q"]);
    run(&["config", "user.email", "test@example.com"]);
    run(&["config", "user.name", "Test"]);
    std::fs::write(dir.join("auth.rs"), "fn login() {}\n").unwrap();
    run(&["add", "."]);
    run(&["commit", "-q", "-m", "add login"]);

    let output = Command::new("git").args(["rev-parse", "HEAD"]).current_dir(dir).output().unwrap();
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn decision_trail_walks_from_blamed_commit_to_adr() {
    let repo = tempfile::tempdir().unwrap();
    let sha = init_repo(repo.path());

    let store = SqliteStore::open_in_memory().unwrap();
    let now = Utc::now();

    let commit = NodeBuilder::new(commit_id(&sha), NodeType::Commit, "vcs").build(now, now);
    let pr = NodeBuilder::new("pr:acme/widget#9", NodeType::Pr, "remote").build(now, now);
    let issue = NodeBuilder::new("issue:SEC-1", NodeType::Issue, "remote").build(now, now);
    let adr = NodeBuilder::new("adr:require-mfa", NodeType::Adr, "adr").title("Require MFA").build(now, now);
    for node in [&commit, &pr, &issue, &adr] {
        store.upsert_node(node).unwrap();
    }
    store.upsert_edge(&EdgeBuilder::new(commit_id(&sha), "pr:acme/widget#9", EdgeRel::Merges, "remote").build(now, now)).unwrap();
    store.upsert_edge(&EdgeBuilder::new("pr:acme/widget#9", "issue:SEC-1", EdgeRel::Mentions, "remote").build(now, now)).unwrap();
    store.upsert_edge(&EdgeBuilder::new("adr:require-mfa", "issue:SEC-1", EdgeRel::Decides, "adr").build(now, now)).unwrap();

    let facade = QueryFacade::new(&store, repo.path());
    let trail = facade.decision_trail("auth.rs", 1, 5, 3).unwrap();

    // Newest/most-important first: the ADR that justifies the change leads,
    // the blamed commit itself trails last.
    let ids: Vec<&str> = trail.iter().map(|e| e.node_id.as_str()).collect();
    assert_eq!(ids, vec!["adr:require-mfa", "issue:SEC-1", "pr:acme/widget#9", commit_id(&sha).as_str()]);

    let positions: Vec<usize> = trail.iter().map(|e| e.trail_position).collect();
    assert_eq!(positions, vec![3, 2, 1, 0]);
}

#[test]
fn impact_reports_direct_then_indirect_components() {
    let store = SqliteStore::open_in_memory().unwrap();
    let now = Utc::now();
    for id in ["component:api", "component:auth", "component:db"] {
        store.upsert_node(&NodeBuilder::new(id, NodeType::Component, "test").build(now, now)).unwrap();
    }
    store.upsert_edge(&EdgeBuilder::new("component:api", "component:auth", EdgeRel::DependsOn, "test").build(now, now)).unwrap();
    store.upsert_edge(&EdgeBuilder::new("component:auth", "component:db", EdgeRel::DependsOn, "test").build(now, now)).unwrap();

    let repo = tempfile::tempdir().unwrap();
    let facade = QueryFacade::new(&store, repo.path());
    let result = facade.impact("component:api", 3, &[ImpactType::Direct, ImpactType::Indirect]).unwrap();

    let auth = result.iter().find(|r| r.node_id == "component:auth").unwrap();
    let db = result.iter().find(|r| r.node_id == "component:db").unwrap();
    assert_eq!(auth.impact_type, ImpactType::Direct);
    assert_eq!(db.impact_type, ImpactType::Indirect);
}

#[test]
fn export_snapshot_is_stable_across_repeated_calls() {
    let store = SqliteStore::open_in_memory().unwrap();
    let now = Utc::now();
    store.upsert_node(&NodeBuilder::new("commit:aaaa", NodeType::Commit, "vcs").build(now, now)).unwrap();
    store.upsert_node(&NodeBuilder::new("file:a.rs", NodeType::File, "vcs").build(now, now)).unwrap();
    store.upsert_edge(&EdgeBuilder::new("commit:aaaa", "file:a.rs", EdgeRel::Modifies, "vcs").build(now, now)).unwrap();

    let repo = tempfile::tempdir().unwrap();
    let facade = QueryFacade::new(&store, repo.path());
    let generated_at = Utc::now();

    let first = facade.export(ExportOptions::default(), generated_at).unwrap();
    let second = facade.export(ExportOptions::default(), generated_at).unwrap();

    let bytes_first = arc_query::export::serialize_canonical(&first).unwrap();
    let bytes_second = arc_query::export::serialize_canonical(&second).unwrap();
    assert_eq!(bytes_first, bytes_second);
    assert_eq!(first.entities.len(), 2);
}

#[test]
fn related_reports_both_directions() {
    let store = SqliteStore::open_in_memory().unwrap();
    let now = Utc::now();
    store.upsert_node(&NodeBuilder::new("commit:aaaa", NodeType::Commit, "vcs").build(now, now)).unwrap();
    store.upsert_node(&NodeBuilder::new("file:a.rs", NodeType::File, "vcs").build(now, now)).unwrap();
    store.upsert_edge(&EdgeBuilder::new("commit:aaaa", "file:a.rs", EdgeRel::Modifies, "vcs").build(now, now)).unwrap();

    let repo = tempfile::tempdir().unwrap();
    let facade = QueryFacade::new(&store, repo.path());

    let outgoing = facade.related("commit:aaaa", RelatedDirection::Outgoing, 10).unwrap();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].node_id, "file:a.rs");

    let incoming = facade.related("file:a.rs", RelatedDirection::Incoming, 10).unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].node_id, "commit:aaaa");
}
