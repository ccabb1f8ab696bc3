//! Visitor retention over complete canonical documents

use super::helpers::load_fixture;

use tdstream::{
    parse_dumps, Dump, DumpParser, DumpVisitor, DumpWriter, Retention, Thread, ThreadState,
};

/// Keeps only threads in the given state, materializing everything else away.
struct StateFilter(ThreadState);

impl DumpVisitor for StateFilter {
    fn enter_thread(
        &mut self,
        _name: &str,
        _native_id: &str,
        _java_id: &str,
        state: ThreadState,
    ) -> Retention {
        if state == self.0 {
            Retention::KEEP
        } else {
            Retention::DISCARD
        }
    }
}

/// Skips one dump wholesale, by id.
struct SkipNamed(&'static str);

impl DumpVisitor for SkipNamed {
    fn enter_dump(&mut self, id: &str) -> Retention {
        if id == self.0 {
            Retention::SKIP
        } else {
            Retention::KEEP
        }
    }
}

/// Retains an empty shell for every dump: kept, but with nested content
/// skipped.
struct ShellsOnly;

impl DumpVisitor for ShellsOnly {
    fn enter_dump(&mut self, _id: &str) -> Retention {
        Retention::KEEP | Retention::SKIP
    }
}

/// Echoes a filtered document straight back out through a [`DumpWriter`],
/// without retaining anything in the parser.
struct Echo<'a> {
    writer: DumpWriter<&'a mut Vec<u8>>,
}

impl DumpVisitor for Echo<'_> {
    fn enter_dump(&mut self, id: &str) -> Retention {
        self.writer.open_dump(id).unwrap();
        Retention::DISCARD
    }

    fn leave_dump(&mut self, _dump: Option<&Dump>, _inbound: Retention) -> Retention {
        self.writer.close_dump().unwrap();
        Retention::DISCARD
    }

    fn leave_thread(&mut self, thread: Option<&Thread>, _inbound: Retention) -> Retention {
        if let Some(thread) = thread {
            if thread.state == ThreadState::Running {
                self.writer.thread(thread).unwrap();
            }
        }
        Retention::DISCARD
    }
}

#[test]
fn state_filter_drops_non_matching_threads() {
    let mut parser = DumpParser::new(StateFilter(ThreadState::Running));
    parser
        .parse(load_fixture("canonical.xml").as_bytes())
        .unwrap();

    let dumps = parser.dumps();
    assert_eq!(dumps.len(), 2);
    assert_eq!(dumps.get(0).unwrap().threads.len(), 1);
    assert!(dumps.get(0).unwrap().thread_by_name("http-8080-exec-1").is_some());
    assert!(dumps.get(1).unwrap().threads.is_empty());
}

#[test]
fn skipped_dump_vanishes_and_the_rest_survives() {
    let mut parser = DumpParser::new(SkipNamed("2009-04-30 14:02:41"));
    parser
        .parse(load_fixture("canonical.xml").as_bytes())
        .unwrap();

    let dumps = parser.dumps();
    assert_eq!(dumps.len(), 1);
    assert_eq!(dumps.get(0).unwrap().id, "1");
    assert_eq!(dumps.get(0).unwrap().threads.len(), 1);
}

#[test]
fn keep_with_skip_retains_empty_shells() {
    let mut parser = DumpParser::new(ShellsOnly);
    parser
        .parse(load_fixture("canonical.xml").as_bytes())
        .unwrap();

    let dumps = parser.dumps();
    assert_eq!(dumps.len(), 2);
    assert!(dumps.iter().all(|dump| dump.threads.is_empty()));
}

#[test]
fn echo_visitor_rewrites_a_filtered_document() {
    let mut buf = Vec::new();
    {
        let mut writer = DumpWriter::new(&mut buf);
        writer.open_dumps().unwrap();

        let mut parser = DumpParser::new(Echo { writer });
        parser
            .parse(load_fixture("canonical.xml").as_bytes())
            .unwrap();
        assert!(parser.dumps().is_empty());

        parser.visitor_mut().writer.close_dumps().unwrap();
    }

    let echoed = String::from_utf8(buf).unwrap();
    let dumps = parse_dumps(echoed.as_bytes()).unwrap();
    assert_eq!(dumps.len(), 2);
    assert_eq!(dumps.get(0).unwrap().threads.len(), 1);
    assert_eq!(
        dumps.get(0).unwrap().threads.front().unwrap().name,
        "http-8080-exec-1"
    );
    assert!(dumps.get(1).unwrap().threads.is_empty());
}
