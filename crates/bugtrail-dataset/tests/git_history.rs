//! Integration test: mine a real git repository built in a temp dir.

use bugtrail_dataset::history::{load_history, GitRepository, RepositorySource};
use bugtrail_dataset::linker::link_tickets;
use bugtrail_dataset::pipeline::{assemble_dataset, build_dataset};
use bugtrail_dataset::tickets::RawTicket;
use bugtrail_dataset::timeline::build_timeline;
use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository, Signature, Time};

fn date(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, month, day, 12, 0, 0).unwrap()
}

fn signature(at: DateTime<Utc>) -> Signature<'static> {
    Signature::new("dev", "dev@example.com", &Time::new(at.timestamp(), 0)).unwrap()
}

fn commit_at(repo: &Repository, at: DateTime<Utc>, message: &str) -> Oid {
    let sig = signature(at);
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

fn tag_at(repo: &Repository, name: &str, target: Oid, at: DateTime<Utc>) {
    let object = repo.find_object(target, None).unwrap();
    repo.tag(name, &object, &signature(at), name, false).unwrap();
}

fn ticket(key: &str, opened: DateTime<Utc>) -> RawTicket {
    RawTicket {
        key: key.into(),
        opening_date: opened,
        affected_version_names: vec![],
    }
}

/// Tags in Jan/Feb/Mar/Apr with a few commits between them.
fn quarterly_repo(dir: &std::path::Path) -> (Repository, Vec<Oid>) {
    let repo = Repository::init(dir).unwrap();
    let mut oids = Vec::new();
    oids.push(commit_at(&repo, date(1, 2), "initial import"));
    tag_at(&repo, "release-1.0", oids[0], date(1, 20));
    oids.push(commit_at(&repo, date(1, 25), "ABC-1: fix null offset"));
    tag_at(&repo, "release-1.1", oids[1], date(2, 20));
    oids.push(commit_at(&repo, date(3, 5), "ABC-3: rework storage"));
    tag_at(&repo, "release-1.2", oids[2], date(3, 20));
    oids.push(commit_at(&repo, date(4, 2), "polish"));
    tag_at(&repo, "release-2.0", oids[3], date(4, 20));
    (repo, oids)
}

#[test]
fn commits_and_tags_are_read_from_git() {
    let dir = tempfile::tempdir().unwrap();
    let (_repo, oids) = quarterly_repo(dir.path());

    let source = GitRepository::open(dir.path()).unwrap();
    let commits = source.commits().unwrap();
    assert_eq!(commits.len(), 4);
    assert_eq!(commits[0].id, oids[0].to_string());
    assert_eq!(commits[0].id.len(), 40);
    assert_eq!(commits[0].date, date(1, 2));

    let mut tags = source.tags().unwrap();
    tags.sort_by_key(|t| t.date);
    let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["release-1.0", "release-1.1", "release-1.2", "release-2.0"]
    );
    assert_eq!(tags[1].date, date(2, 20));
}

#[test]
fn scenario_a_half_horizon_drops_march_commits() {
    let dir = tempfile::tempdir().unwrap();
    quarterly_repo(dir.path());
    let source = GitRepository::open(dir.path()).unwrap();

    let dataset = build_dataset(&source, &Vec::<RawTicket>::new(), "ABC").unwrap();
    let indexes: Vec<_> = dataset.releases.iter().map(|r| r.index).collect();
    assert_eq!(indexes, vec![1, 2]);
    assert!(dataset.commits.iter().all(|c| c.date <= date(2, 20)));
    assert!(!dataset.commits.iter().any(|c| c.message.contains("ABC-3")));
}

#[test]
fn scenario_b_fix_and_opening_release() {
    let dir = tempfile::tempdir().unwrap();
    quarterly_repo(dir.path());
    let source = GitRepository::open(dir.path()).unwrap();

    let commits = load_history(&source).unwrap();
    let releases = build_timeline(source.tags().unwrap(), &commits).unwrap();
    let linked = link_tickets(vec![ticket("ABC-1", date(1, 10))], &commits, &releases);

    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].fixed_release.index, 2);
    assert_eq!(linked[0].opening_release.index, 1);
}

#[test]
fn scenario_c_revert_pair_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    commit_at(&repo, date(1, 1), "initial");
    let c1 = commit_at(&repo, date(1, 5), "add experimental cache");
    let message = format!("Revert \"add experimental cache\"\n\nThis reverts commit {c1}.\n");
    let c2 = commit_at(&repo, date(1, 6), &message);

    let source = GitRepository::open(dir.path()).unwrap();
    let commits = load_history(&source).unwrap();
    let ids: Vec<_> = commits.iter().map(|c| c.id.clone()).collect();

    assert_eq!(commits.len(), 1);
    assert!(!ids.contains(&c1.to_string()));
    assert!(!ids.contains(&c2.to_string()));
}

#[test]
fn scenario_d_ticket_without_commit_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    quarterly_repo(dir.path());
    let source = GitRepository::open(dir.path()).unwrap();

    let tickets = vec![ticket("ABC-1", date(1, 10)), ticket("ABC-2", date(1, 10))];
    let dataset = assemble_dataset(&source, &tickets, "ABC").unwrap();
    assert!(dataset.tickets.iter().all(|t| t.key != "ABC-2"));
    assert_eq!(dataset.tickets.len(), 1);
}

#[test]
fn scenario_e_ticket_fixed_after_horizon_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    quarterly_repo(dir.path());
    let source = GitRepository::open(dir.path()).unwrap();
    let tickets = vec![ticket("ABC-1", date(1, 10)), ticket("ABC-3", date(1, 10))];

    let unreduced = assemble_dataset(&source, &tickets, "ABC").unwrap();
    let abc3 = unreduced.tickets.iter().find(|t| t.key == "ABC-3").unwrap();
    assert_eq!(abc3.fixed_release.index, 3);

    let dataset = build_dataset(&source, &tickets, "ABC").unwrap();
    let keys: Vec<_> = dataset.tickets.iter().map(|t| t.key.as_str()).collect();
    assert_eq!(keys, vec!["ABC-1"]);
}

#[test]
fn branch_walk_starts_from_named_branch() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, oids) = quarterly_repo(dir.path());
    let first = repo.find_commit(oids[1]).unwrap();
    repo.branch("maintenance", &first, false).unwrap();

    let source = GitRepository::open(dir.path())
        .unwrap()
        .with_branch(Some("maintenance".into()));
    let commits = source.commits().unwrap();
    assert_eq!(commits.len(), 2);
}
