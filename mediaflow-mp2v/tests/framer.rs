//! End-to-end framer scenarios

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;
use mediaflow_attr::{DictMgr, Rational};
use mediaflow_mp2v::{Mp2vFramer, UrefMp2vExt};
use mediaflow_stream::{Event, FrameSink, Uref, CLOCK_FREQ};
use proptest::prelude::*;

// Hand-assembled ISO 13818-2 records: 1920x1080, 16:9, 25 fps, main
// profile/level, 4:2:0, progressive sequence.

fn seq_header() -> Vec<u8> {
    seq_header_with_rate(3)
}

fn seq_header_with_rate(frame_rate_code: u8) -> Vec<u8> {
    vec![
        0x00, 0x00, 0x01, 0xb3, //
        0x78, 0x04, 0x38, // 1920x1080
        0x30 | frame_rate_code, // 16:9
        0x0b, 0xb8, 0x23, 0x80, // bitrate 0x2ee0, vbv_buffer 0x70
    ]
}

fn seq_ext() -> Vec<u8> {
    vec![
        0x00, 0x00, 0x01, 0xb5, //
        0x14, 0x8a, 0x00, 0x01, 0x00, 0x00,
    ]
}

fn gop(closed: bool, broken: bool) -> Vec<u8> {
    vec![
        0x00, 0x00, 0x01, 0xb8, //
        0x00, 0x00, 0x00,
        (u8::from(closed) << 6) | (u8::from(broken) << 5),
    ]
}

fn pic_header(temporal_reference: u16, coding_type: u8) -> Vec<u8> {
    pic_header_with_vbv(temporal_reference, coding_type, 0xffff)
}

fn pic_header_with_vbv(temporal_reference: u16, coding_type: u8, vbv_delay: u16) -> Vec<u8> {
    vec![
        0x00, 0x00, 0x01, 0x00, //
        (temporal_reference >> 2) as u8,
        ((temporal_reference & 0x3) as u8) << 6 | coding_type << 3 | (vbv_delay >> 13) as u8,
        (vbv_delay >> 5) as u8,
        ((vbv_delay & 0x1f) as u8) << 3,
    ]
}

fn slice() -> Vec<u8> {
    vec![0x00, 0x00, 0x01, 0x01, 0xaa, 0xbb, 0xcc, 0xdd]
}

fn end_code() -> Vec<u8> {
    vec![0x00, 0x00, 0x01, 0xb7]
}

fn stream_of(parts: &[Vec<u8>]) -> Vec<u8> {
    parts.iter().flatten().copied().collect()
}

#[derive(Default)]
struct Collector {
    flow_defs: Vec<Uref>,
    frames: Vec<Uref>,
}

impl FrameSink for Collector {
    fn flow_def(&mut self, flow_def: &Uref) {
        self.flow_defs.push(flow_def.dup());
    }

    fn frame(&mut self, frame: Uref) {
        self.frames.push(frame);
    }
}

struct Harness {
    mgr: DictMgr,
    framer: Mp2vFramer,
    events: Rc<RefCell<Vec<Event>>>,
    sink: Rc<RefCell<Collector>>,
}

impl Harness {
    fn new() -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let probe_events = Rc::clone(&events);
        let mut framer = Mp2vFramer::new(Box::new(move |event: Event| {
            probe_events.borrow_mut().push(event);
        }));
        let sink = Rc::new(RefCell::new(Collector::default()));
        framer.set_output(sink.clone());
        let mgr = DictMgr::new(8);
        let mut harness = Self {
            mgr,
            framer,
            events,
            sink,
        };
        harness.send_flow_def("block.mpeg2video.");
        harness
    }

    fn send_flow_def(&mut self, def: &str) {
        let mut uref = Uref::new(&self.mgr);
        uref.set_flow_def(def);
        self.framer.input(uref);
    }

    fn data(&mut self, bytes: &[u8]) {
        self.data_with(bytes, |_| {});
    }

    fn data_with(&mut self, bytes: &[u8], customize: impl FnOnce(&mut Uref)) {
        let mut uref = Uref::new(&self.mgr);
        uref.set_block(Bytes::copy_from_slice(bytes));
        customize(&mut uref);
        self.framer.input(uref);
    }

    fn count(&self, event: Event) -> usize {
        self.events.borrow().iter().filter(|&&e| e == event).count()
    }
}

#[test]
fn sequence_acquisition_emits_one_annotated_frame() {
    let mut h = Harness::new();
    h.data(&stream_of(&[
        seq_header(),
        seq_ext(),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]));

    assert_eq!(h.count(Event::SyncAcquired), 1);
    assert_eq!(h.count(Event::NewFlowDefinition), 1);

    let sink = h.sink.borrow();
    assert_eq!(sink.frames.len(), 1);
    let frame = &sink.frames[0];
    assert_eq!(frame.pic_number(), Some(0));
    assert!(frame.random());
    assert_eq!(frame.mp2v_type(), Some(1));
    // The frame is the whole input, end code included.
    assert_eq!(frame.block().unwrap().len(), 12 + 10 + 8 + 8 + 4);
    assert!(frame.block().unwrap().starts_with(&[0x00, 0x00, 0x01, 0xb3]));

    // Derived flow definition.
    assert_eq!(sink.flow_defs.len(), 1);
    let flow_def = &sink.flow_defs[0];
    assert_eq!(flow_def.flow_def(), Some("block.mpeg2video.pic.planar8_420."));
    assert_eq!(flow_def.hsize(), Some(1920));
    assert_eq!(flow_def.vsize(), Some(1080));
    assert_eq!(flow_def.aspect(), Some(Rational::new(1, 1)));
    assert_eq!(flow_def.fps(), Some(Rational::new(25, 1)));
    assert_eq!(flow_def.octetrate(), Some(0x2ee0 * 400 / 8));
    assert_eq!(flow_def.cpb_buffer(), Some(0x70 * 16 * 1024 / 8));
    assert_eq!(flow_def.profile_level(), Some(0x48));
    assert_eq!(flow_def.max_octetrate(), Some(15_000_000 / 8));
    assert!(flow_def.progressive());
    assert_eq!(flow_def.planes(), Some(3));
    assert_eq!(flow_def.plane(0), Some((1, 1, 1, "y8")));
    assert_eq!(flow_def.plane(1), Some((2, 2, 1, "u8")));
}

#[test]
fn identical_sequence_derives_flow_definition_once() {
    let mut h = Harness::new();
    h.data(&stream_of(&[
        seq_header(),
        seq_ext(),
        pic_header(0, 1),
        slice(),
        seq_header(),
        seq_ext(),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]));

    assert_eq!(h.count(Event::NewFlowDefinition), 1);
    let sink = h.sink.borrow();
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(sink.flow_defs.len(), 1);
    assert!(sink.frames.iter().all(|f| f.random()));
}

#[test]
fn changed_sequence_derives_flow_definition_again() {
    let mut h = Harness::new();
    h.data(&stream_of(&[
        seq_header(),
        seq_ext(),
        pic_header(0, 1),
        slice(),
        seq_header_with_rate(5), // 30 fps now
        seq_ext(),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]));

    assert_eq!(h.count(Event::NewFlowDefinition), 2);
    let sink = h.sink.borrow();
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(sink.flow_defs.last().unwrap().fps(), Some(Rational::new(30, 1)));
}

#[test]
fn discontinuity_before_first_slice_drops_partial_frame() {
    let mut h = Harness::new();
    // Partial frame: sequence headers only, no picture or slice yet.
    h.data(&stream_of(&[seq_header(), seq_ext()]));
    assert!(h.sink.borrow().frames.is_empty());

    // The discontinuous buffer restarts assembly from scratch.
    let full_frame = stream_of(&[
        seq_header(),
        seq_ext(),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]);
    h.data_with(&full_frame, Uref::set_discontinuity);

    let sink = h.sink.borrow();
    assert_eq!(sink.frames.len(), 1);
    // No closed GOP in sight, so the frame is marked discontinuous.
    assert!(sink.frames[0].discontinuity());
    assert!(sink.frames[0].random());
}

#[test]
fn discontinuity_is_absorbed_by_closed_gop() {
    let mut h = Harness::new();
    h.data(&stream_of(&[seq_header(), seq_ext()]));
    let full_frame = stream_of(&[
        seq_header(),
        seq_ext(),
        gop(true, false),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]);
    h.data_with(&full_frame, Uref::set_discontinuity);

    let sink = h.sink.borrow();
    assert_eq!(sink.frames.len(), 1);
    assert!(!sink.frames[0].discontinuity());
}

#[test]
fn broken_link_marks_frame_discontinuous() {
    let mut h = Harness::new();
    h.data(&stream_of(&[
        seq_header(),
        seq_ext(),
        gop(true, true),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]));

    let sink = h.sink.borrow();
    assert_eq!(sink.frames.len(), 1);
    assert!(sink.frames[0].discontinuity());
}

#[test]
fn picture_numbers_follow_temporal_references() {
    let mut h = Harness::new();
    h.data(&stream_of(&[
        seq_header(),
        seq_ext(),
        pic_header(0, 1),
        slice(),
        gop(true, false),
        pic_header(0, 1),
        slice(),
        pic_header(1, 2),
        slice(),
        end_code(),
    ]));

    let sink = h.sink.borrow();
    let numbers: Vec<_> = sink.frames.iter().map(|f| f.pic_number()).collect();
    assert_eq!(numbers, vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn sequence_insertion_prepends_cached_headers() {
    let mut h = Harness::new();
    h.framer.set_sequence_insertion(true);
    h.data(&stream_of(&[
        seq_header(),
        seq_ext(),
        gop(true, false),
        pic_header(0, 1),
        slice(),
        gop(true, false),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]));

    let sink = h.sink.borrow();
    assert_eq!(sink.frames.len(), 2);
    // The second frame had no sequence header of its own; the cached one
    // (with its extension) is prepended.
    let expected_prefix = stream_of(&[seq_header(), seq_ext(), gop(true, false)]);
    let block = sink.frames[1].block().unwrap();
    assert!(block.starts_with(&expected_prefix));
    assert!(sink.frames[1].random());
}

#[test]
fn timestamps_ride_the_buffer_that_starts_the_frame() {
    let mut h = Harness::new();
    let first = stream_of(&[seq_header(), seq_ext(), pic_header(0, 1), slice()]);
    let second = stream_of(&[
        seq_header(),
        seq_ext(),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]);

    h.data_with(&first, |uref| {
        uref.set_pts(1000);
        uref.set_dts(500);
    });
    h.data_with(&second, |uref| uref.set_pts(99_000));

    let sink = h.sink.borrow();
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(sink.frames[0].pts(), Some(1000));
    assert_eq!(sink.frames[0].dts(), Some(500));
    assert_eq!(sink.frames[1].pts(), Some(99_000));
    // The DTS advances by one frame duration (25 fps) per picture.
    assert_eq!(sink.frames[1].dts(), Some(500 + CLOCK_FREQ / 25));
}

#[test]
fn vbv_delay_is_rescaled_to_the_system_clock() {
    let mut h = Harness::new();
    h.data(&stream_of(&[
        seq_header(),
        seq_ext(),
        pic_header_with_vbv(0, 1, 900),
        slice(),
        end_code(),
    ]));

    let sink = h.sink.borrow();
    assert_eq!(
        sink.frames[0].vbv_delay(),
        Some(900 * CLOCK_FREQ / 90_000)
    );
}

#[test]
fn wrong_flow_definition_raises_error() {
    let mut h = Harness::new();
    h.send_flow_def("block.h264.");
    assert_eq!(h.count(Event::FlowDefinitionError), 1);

    // Data is now rejected as well, since the input flow was cleared.
    h.data(&seq_header());
    assert_eq!(h.count(Event::FlowDefinitionError), 2);
}

#[test]
fn structural_error_drops_frame_and_loses_sync() {
    let mut h = Harness::new();
    h.data(&stream_of(&[
        seq_header_with_rate(0), // invalid frame rate code
        seq_ext(),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]));

    assert_eq!(h.count(Event::SyncAcquired), 1);
    assert_eq!(h.count(Event::SyncLost), 1);
    assert!(h.sink.borrow().frames.is_empty());
    assert_eq!(h.count(Event::NewFlowDefinition), 0);

    // The next sequence header re-acquires synchronization.
    h.data(&stream_of(&[
        seq_header(),
        seq_ext(),
        pic_header(0, 1),
        slice(),
        end_code(),
    ]));
    assert_eq!(h.count(Event::SyncAcquired), 2);
    assert_eq!(h.sink.borrow().frames.len(), 1);
}

#[test]
fn lifecycle_events() {
    let h = Harness::new();
    assert_eq!(h.count(Event::Ready), 1);
    let events = Rc::clone(&h.events);
    drop(h);
    assert_eq!(
        events.borrow().iter().filter(|&&e| e == Event::Dead).count(),
        1
    );
}

// Fragmentation equivalence: however the input is split into buffers, the
// emitted frames are byte-identical.

fn reference_stream() -> Vec<u8> {
    stream_of(&[
        seq_header(),
        seq_ext(),
        pic_header(0, 1),
        slice(),
        gop(true, false),
        pic_header(0, 1),
        slice(),
        pic_header(1, 2),
        slice(),
        end_code(),
    ])
}

fn frames_for(chunks: &[&[u8]]) -> Vec<Vec<u8>> {
    let mut h = Harness::new();
    for chunk in chunks {
        if !chunk.is_empty() {
            h.data(chunk);
        }
    }
    let sink = h.sink.borrow();
    sink.frames
        .iter()
        .map(|frame| frame.block().unwrap().to_vec())
        .collect()
}

#[test]
fn every_single_split_is_equivalent_to_the_whole() {
    let stream = reference_stream();
    let whole = frames_for(&[&stream]);
    assert_eq!(whole.len(), 3);

    for split in 1..stream.len() {
        let fragmented = frames_for(&[&stream[..split], &stream[split..]]);
        assert_eq!(fragmented, whole, "split at byte {split}");
    }
}

#[test]
fn byte_at_a_time_is_equivalent_to_the_whole() {
    let stream = reference_stream();
    let whole = frames_for(&[&stream]);

    let bytes: Vec<&[u8]> = stream.chunks(1).collect();
    assert_eq!(frames_for(&bytes), whole);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_fragmentation_is_equivalent_to_the_whole(
        splits in prop::collection::vec(0usize..200, 0..8)
    ) {
        let stream = reference_stream();
        let whole = frames_for(&[&stream]);

        let mut cuts: Vec<usize> = splits
            .into_iter()
            .map(|s| s % stream.len())
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut chunks = Vec::new();
        let mut last = 0;
        for cut in cuts {
            chunks.push(&stream[last..cut]);
            last = cut;
        }
        chunks.push(&stream[last..]);

        prop_assert_eq!(frames_for(&chunks), whole);
    }
}
