//! End-to-end extraction of HotSpot dumps from a server log

use super::helpers::extract_fixture;

use tdstream::{parse_dumps, Frame, ThreadState, Vendor};

#[test]
fn both_dumps_are_found_with_timestamp_ids() {
    let out = extract_fixture(Vendor::Sun, "sun_threads.log");
    let dumps = parse_dumps(out.as_bytes()).unwrap();

    assert_eq!(dumps.len(), 2);
    assert_eq!(dumps.get(0).unwrap().id, "2009-04-30 14:02:41");
    assert_eq!(dumps.get(1).unwrap().id, "2009-04-30 14:03:10");
}

#[test]
fn threads_carry_header_fields_and_states() {
    let out = extract_fixture(Vendor::Sun, "sun_threads.log");
    let dumps = parse_dumps(out.as_bytes()).unwrap();
    let first = dumps.get(0).unwrap();

    assert_eq!(first.threads.len(), 4);

    let exec1 = first.thread_by_name("http-8080-exec-1").unwrap();
    assert_eq!(exec1.state, ThreadState::Running);
    assert_eq!(exec1.java_id, "0x0855c400");
    assert_eq!(exec1.native_id, "0x1b52");

    let exec2 = first.thread_by_name("http-8080-exec-2").unwrap();
    assert_eq!(exec2.state, ThreadState::WaitingForMonitorEntry);

    let worker = first.thread_by_name("background-worker").unwrap();
    assert_eq!(worker.state, ThreadState::WaitingOnCondition);

    let main = first.thread_by_name("main").unwrap();
    assert_eq!(main.state, ThreadState::ObjectWait);
}

#[test]
fn frames_distinguish_calls_constructors_and_locks() {
    let out = extract_fixture(Vendor::Sun, "sun_threads.log");
    let dumps = parse_dumps(out.as_bytes()).unwrap();
    let first = dumps.get(0).unwrap();

    let exec1 = first.thread_by_name("http-8080-exec-1").unwrap();
    assert_eq!(exec1.frames.len(), 4);
    assert!(exec1.frames.get(0).unwrap().is_native());
    assert_eq!(
        exec1.frames.get(1).unwrap().class(),
        "java.net.SocketInputStream.read"
    );

    let worker = first.thread_by_name("background-worker").unwrap();
    assert!(matches!(
        worker.frames.get(1),
        Some(Frame::Constructor { class, line, .. })
            if class == "org.example.PollingTask" && *line == 58
    ));
}

#[test]
fn lock_ownership_is_resolvable_across_threads() {
    let out = extract_fixture(Vendor::Sun, "sun_threads.log");
    let dumps = parse_dumps(out.as_bytes()).unwrap();
    let first = dumps.get(0).unwrap();

    let owner = first.find_lock_owner("0x8ff21878").unwrap();
    assert_eq!(owner.name, "http-8080-exec-1");

    let exec2 = first.thread_by_name("http-8080-exec-2").unwrap();
    assert!(exec2
        .frames
        .iter()
        .any(|frame| matches!(frame, Frame::Lock { owner: false, .. })));
}

#[test]
fn heap_section_and_log_noise_stay_out_of_the_dumps() {
    let out = extract_fixture(Vendor::Sun, "sun_threads.log");

    assert!(!out.contains("Heap"));
    assert!(!out.contains("eden"));
    assert!(!out.contains("INFO"));

    let dumps = parse_dumps(out.as_bytes()).unwrap();
    let second = dumps.get(1).unwrap();
    assert_eq!(second.threads.len(), 1);
    assert_eq!(second.threads.front().unwrap().frames.len(), 1);
}
