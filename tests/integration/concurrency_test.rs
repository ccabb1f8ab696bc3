//! Extraction and parsing carry no shared state between threads

use super::helpers::{extract_fixture, load_fixture};

use std::thread;

use tdstream::{parse_dumps, Vendor};

#[test]
fn parallel_extractions_match_serial_output() {
    let serial_sun = extract_fixture(Vendor::Sun, "sun_threads.log");
    let serial_ibm = extract_fixture(Vendor::Ibm, "ibm_javacore.txt");

    let sun = thread::spawn(|| extract_fixture(Vendor::Sun, "sun_threads.log"));
    let ibm = thread::spawn(|| extract_fixture(Vendor::Ibm, "ibm_javacore.txt"));

    assert_eq!(sun.join().unwrap(), serial_sun);
    assert_eq!(ibm.join().unwrap(), serial_ibm);
}

#[test]
fn parsers_are_independent_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                let dumps = parse_dumps(load_fixture("canonical.xml").as_bytes()).unwrap();
                dumps.len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}

#[test]
fn ordinal_dump_ids_are_scoped_to_one_extraction() {
    // A fresh extractor run restarts its fallback numbering, so two runs over
    // the same unstamped input agree.
    let input = "Full thread dump Java HotSpot(TM) Server VM:\n";
    let run = || {
        let mut out = Vec::new();
        Vendor::Sun
            .create_extractor()
            .extract(&mut input.as_bytes(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    };

    let first = run();
    assert!(first.contains("<dump id=\"1\">"));
    assert_eq!(run(), first);
}
