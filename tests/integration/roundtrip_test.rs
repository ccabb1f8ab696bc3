//! Round-trip tests between the canonical reader and writer

use super::helpers::{extract_fixture, load_fixture};

use tdstream::{parse_dumps, Dump, DumpParser, DumpWriter, KeepAll, List, Vendor};

fn write_back(dumps: &List<Dump>) -> String {
    let mut writer = DumpWriter::new(Vec::new());
    writer.dumps(dumps).unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test]
fn canonical_fixture_round_trips_byte_for_byte() {
    let text = load_fixture("canonical.xml");
    let dumps = parse_dumps(text.as_bytes()).unwrap();
    assert_eq!(write_back(&dumps), text);
}

#[test]
fn escaped_names_are_decoded_and_re_encoded() {
    let text = load_fixture("canonical.xml");
    let dumps = parse_dumps(text.as_bytes()).unwrap();

    let first = dumps.get(0).unwrap();
    assert!(first.thread_by_name("workers <pool>").is_some());

    let echoed = write_back(&dumps);
    assert!(echoed.contains("name=\"workers &lt;pool&gt;\""));
    assert!(!echoed.contains("name=\"workers <pool>\""));
}

#[test]
fn serialization_is_idempotent() {
    let text = load_fixture("canonical.xml");
    let once = write_back(&parse_dumps(text.as_bytes()).unwrap());
    let twice = write_back(&parse_dumps(once.as_bytes()).unwrap());
    assert_eq!(once, twice);
}

#[test]
fn extractor_output_round_trips() {
    for (vendor, fixture) in [
        (Vendor::Sun, "sun_threads.log"),
        (Vendor::Ibm, "ibm_javacore.txt"),
    ] {
        let canonical = extract_fixture(vendor, fixture);
        let dumps = parse_dumps(canonical.as_bytes()).unwrap();
        assert_eq!(write_back(&dumps), canonical, "{vendor} output drifted");
    }
}

#[test]
fn truncated_documents_keep_completed_dumps() {
    let text = load_fixture("canonical.xml");
    let cut = text.find("<dump id=\"1\">").unwrap();

    let mut parser = DumpParser::new(KeepAll);
    let err = parser.parse(text[..cut].as_bytes()).unwrap_err();

    assert!(err.offset().is_some());
    assert_eq!(parser.dumps().len(), 1);
    assert_eq!(parser.dumps().get(0).unwrap().id, "2009-04-30 14:02:41");
}
