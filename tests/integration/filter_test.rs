//! Filter matching over parsed canonical dumps

use super::helpers::load_fixture;

use tdstream::{parse_dumps, Filter, FilterField, Matcher};

fn matching_names(filter: &Filter) -> Vec<String> {
    let dumps = parse_dumps(load_fixture("canonical.xml").as_bytes()).unwrap();
    dumps
        .iter()
        .flat_map(|dump| dump.threads.iter())
        .filter(|thread| filter.matches(thread))
        .map(|thread| thread.name.clone())
        .collect()
}

#[test]
fn name_prefix_selects_the_pool_threads() {
    let filter = Filter::new(FilterField::Name, Matcher::prefix("http-"));
    assert_eq!(matching_names(&filter), ["http-8080-exec-1"]);
}

#[test]
fn name_pattern_is_anchored_only_where_written() {
    let filter = Filter::new(
        FilterField::Name,
        Matcher::pattern(r"^main$").unwrap(),
    );
    assert_eq!(matching_names(&filter), ["main"]);

    let loose = Filter::new(FilterField::Name, Matcher::pattern("exec").unwrap());
    assert_eq!(matching_names(&loose), ["http-8080-exec-1"]);
}

#[test]
fn native_id_exact_match_finds_one_thread() {
    let filter = Filter::new(FilterField::NativeId, Matcher::exact("0x1b53"));
    assert_eq!(matching_names(&filter), ["workers <pool>"]);
}

#[test]
fn stacktrace_substring_scans_call_frames() {
    let filter = Filter::new(
        FilterField::Stacktrace,
        Matcher::substring("SocketInputStream"),
    );
    assert_eq!(matching_names(&filter), ["http-8080-exec-1"]);

    let ctor = Filter::new(FilterField::Stacktrace, Matcher::exact("com.example.Request"));
    assert_eq!(matching_names(&ctor), ["http-8080-exec-1"]);
}

#[test]
fn stacktrace_matching_skips_lock_frames() {
    // Both threads hold or await org.example.Connection, but only as locks.
    let filter = Filter::new(
        FilterField::Stacktrace,
        Matcher::substring("org.example.Connection"),
    );
    assert!(matching_names(&filter).is_empty());
}
