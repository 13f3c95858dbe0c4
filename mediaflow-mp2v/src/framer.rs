//! The framer state machine
//!
//! Frames are assembled in the octet-stream accumulator and delimited by the
//! next sequence, group-of-pictures or picture start code (or an explicit
//! sequence end). Emission parses the frame's headers, derives the output
//! flow definition when sequence parameters change, stamps clock and picture
//! attributes, and hands the frame to the output sink.
//!
//! Synchronization is acquired on a sequence header and lost on structural
//! errors; recovery needs no extra machinery since the next sequence header
//! re-acquires it.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use mediaflow_attr::Rational;
use mediaflow_stream::{Event, FrameSink, OctetStream, Probe, Uref, CLOCK_FREQ};

use crate::error::{Mp2vError, Result};
use crate::syntax;

/// The only accepted input flow definition prefix.
pub const EXPECTED_FLOW_DEF: &str = "block.mpeg2video.";

const FLOW_DEF_420: &str = "block.mpeg2video.pic.planar8_420.";
const FLOW_DEF_422: &str = "block.mpeg2video.pic.planar8_422.";
const FLOW_DEF_444: &str = "block.mpeg2video.pic.planar8_444.";

/// MPEG-2 specific attributes on frame records and flow definitions.
pub trait UrefMp2vExt {
    /// Set the picture coding type (I, P or B).
    fn set_mp2v_type(&mut self, coding_type: u8);
    /// Read the picture coding type.
    fn mp2v_type(&self) -> Option<u8>;
    /// Set the profile/level indication of the flow.
    fn set_profile_level(&mut self, profile_level: u8);
    /// Read the profile/level indication.
    fn profile_level(&self) -> Option<u8>;
    /// Set the low-delay flag of the flow.
    fn set_lowdelay(&mut self);
    /// Whether the flow is low delay.
    fn lowdelay(&self) -> bool;
}

impl UrefMp2vExt for Uref {
    fn set_mp2v_type(&mut self, coding_type: u8) {
        self.attrs_mut().set_small_unsigned("mp2v.type", coding_type);
    }

    fn mp2v_type(&self) -> Option<u8> {
        self.attrs().get_small_unsigned("mp2v.type")
    }

    fn set_profile_level(&mut self, profile_level: u8) {
        self.attrs_mut()
            .set_small_unsigned("mp2v.profilelevel", profile_level);
    }

    fn profile_level(&self) -> Option<u8> {
        self.attrs().get_small_unsigned("mp2v.profilelevel")
    }

    fn set_lowdelay(&mut self) {
        self.attrs_mut().set_void("mp2v.lowdelay");
    }

    fn lowdelay(&self) -> bool {
        self.attrs().get_void("mp2v.lowdelay")
    }
}

/// Control commands of the framer.
pub enum Command {
    /// Read the output sink.
    GetOutput,
    /// Install the output sink.
    SetOutput(Rc<RefCell<dyn FrameSink>>),
    /// Read the sequence-insertion setting.
    GetSequenceInsertion,
    /// Insert cached sequence headers before I frames that lack one.
    SetSequenceInsertion(bool),
}

/// Replies to [`Command`]s.
pub enum Reply {
    /// Command completed with nothing to report.
    Done,
    /// The current output sink.
    Output(Option<Rc<RefCell<dyn FrameSink>>>),
    /// The current sequence-insertion setting.
    SequenceInsertion(bool),
}

/// Timestamps waiting for the picture they apply to.
#[derive(Debug, Default, Clone, Copy)]
struct PendingTimestamps {
    pts_orig: Option<u64>,
    pts: Option<u64>,
    pts_sys: Option<u64>,
    dts_orig: Option<u64>,
    dts: Option<u64>,
    dts_sys: Option<u64>,
}

impl PendingTimestamps {
    fn flush_pts(&mut self) {
        self.pts_orig = None;
        self.pts = None;
        self.pts_sys = None;
    }

    fn flush_dts(&mut self) {
        self.dts_orig = None;
        self.dts = None;
        self.dts_sys = None;
    }

    fn increment_dts(&mut self, duration: u64) {
        if let Some(dts) = &mut self.dts_orig {
            *dts += duration;
        }
        if let Some(dts) = &mut self.dts {
            *dts += duration;
        }
        if let Some(dts) = &mut self.dts_sys {
            *dts += duration;
        }
    }

    /// Take over the timestamps carried by a record promoted to the head of
    /// the accumulator.
    fn adopt(&mut self, uref: &Uref) {
        if let Some(ts) = uref.pts_orig() {
            self.pts_orig = Some(ts);
        }
        if let Some(ts) = uref.pts() {
            self.pts = Some(ts);
        }
        if let Some(ts) = uref.pts_sys() {
            self.pts_sys = Some(ts);
        }
        if let Some(ts) = uref.dts_orig() {
            self.dts_orig = Some(ts);
        }
        if let Some(ts) = uref.dts() {
            self.dts = Some(ts);
        }
        if let Some(ts) = uref.dts_sys() {
            self.dts_sys = Some(ts);
        }
    }
}

macro_rules! apply_timestamp {
    ($pending:expr, $uref:expr, $field:ident, $set:ident, $delete:ident) => {
        match $pending.$field {
            Some(value) => {
                $uref.$set(value);
            }
            None => {
                $uref.$delete();
            }
        }
    };
}

/// Builds frames from chunks of an ISO 13818-2 elementary stream.
pub struct Mp2vFramer {
    probe: Box<dyn Probe>,
    output: Option<Rc<RefCell<dyn FrameSink>>>,
    /// Derived output flow definition.
    flow_def: Option<Uref>,
    flow_def_sent: bool,
    /// Input flow definition, the template the output one is derived from.
    flow_def_input: Option<Uref>,
    /// System time of the last random access point.
    systime_rap: Option<u64>,

    last_picture_number: i64,
    /// Last temporal reference read from the stream, or -1.
    last_temporal_reference: i64,
    got_discontinuity: bool,
    insert_sequence: bool,
    sequence_header: Option<Bytes>,
    sequence_ext: Option<Bytes>,
    sequence_display: Option<Bytes>,
    progressive_sequence: bool,
    fps: Rational,

    stream: OctetStream,

    /// Bytes of the frame being assembled, also the scan cursor.
    next_frame_size: usize,
    /// The frame being assembled starts with a sequence header.
    next_frame_sequence: bool,
    /// Offset of the picture header inside the frame being assembled.
    next_frame_offset: Option<usize>,
    /// A slice header was seen in the frame being assembled.
    next_frame_slice: bool,
    pending: PendingTimestamps,
    acquired: bool,
}

impl Mp2vFramer {
    /// Create a framer raising events on `probe`.
    pub fn new(probe: Box<dyn Probe>) -> Self {
        let mut framer = Self {
            probe,
            output: None,
            flow_def: None,
            flow_def_sent: false,
            flow_def_input: None,
            systime_rap: None,
            last_picture_number: -1,
            last_temporal_reference: -1,
            got_discontinuity: false,
            insert_sequence: false,
            sequence_header: None,
            sequence_ext: None,
            sequence_display: None,
            progressive_sequence: false,
            fps: Rational::default(),
            stream: OctetStream::new(),
            next_frame_size: 0,
            next_frame_sequence: false,
            next_frame_offset: None,
            next_frame_slice: false,
            pending: PendingTimestamps::default(),
            acquired: false,
        };
        framer.probe.throw(Event::Ready);
        framer
    }

    /// Feed one input record: a flow definition or a chunk of the stream.
    pub fn input(&mut self, uref: Uref) {
        if let Some(def) = uref.flow_def().map(str::to_owned) {
            if !def.starts_with(EXPECTED_FLOW_DEF) {
                self.flow_def_input = None;
                self.store_flow_def(None);
                self.probe.throw(Event::FlowDefinitionError);
                return;
            }
            debug!(flow_def = %def, "new input flow definition");
            self.flow_def_input = Some(uref);
            if self.sequence_header.is_some() {
                if let Err(err) = self.parse_sequence() {
                    warn!(error = %err, "cannot derive the flow definition");
                }
            }
            return;
        }

        if self.flow_def_input.is_none() {
            self.probe.throw(Event::FlowDefinitionError);
            return;
        }
        if uref.block().is_none() {
            return;
        }

        if uref.discontinuity() {
            if !self.next_frame_slice {
                // Discontinuities in the headers before the first slice are
                // destructive: drop the partial frame entirely.
                self.stream.clean();
                self.next_frame_size = 0;
                self.reset_frame_flags();
                self.got_discontinuity = true;
            } else if let Some(head) = self.stream.head_attrs_mut() {
                head.set_void("f.error");
            }
        }

        if self.stream.append(uref) {
            if let Some(head) = self.stream.head() {
                self.pending.adopt(head);
            }
        }
        self.work();
    }

    /// Whether sequence headers are inserted before I frames lacking one.
    pub fn sequence_insertion(&self) -> bool {
        self.insert_sequence
    }

    /// Enable or disable sequence header insertion before I frames.
    pub fn set_sequence_insertion(&mut self, insert: bool) {
        self.insert_sequence = insert;
    }

    /// Install the output sink.
    pub fn set_output(&mut self, output: Rc<RefCell<dyn FrameSink>>) {
        self.output = Some(output);
        self.flow_def_sent = false;
    }

    /// Process one control command.
    pub fn control(&mut self, command: Command) -> Reply {
        match command {
            Command::GetOutput => Reply::Output(self.output.clone()),
            Command::SetOutput(output) => {
                self.set_output(output);
                Reply::Done
            }
            Command::GetSequenceInsertion => Reply::SequenceInsertion(self.insert_sequence),
            Command::SetSequenceInsertion(insert) => {
                self.set_sequence_insertion(insert);
                Reply::Done
            }
        }
    }

    // Output plumbing

    fn store_flow_def(&mut self, flow_def: Option<Uref>) {
        let announce = flow_def.is_some();
        self.flow_def = flow_def;
        self.flow_def_sent = false;
        if announce {
            self.probe.throw(Event::NewFlowDefinition);
        }
    }

    fn output(&mut self, uref: Uref) {
        let Some(sink) = self.output.clone() else {
            debug!("no output configured, dropping frame");
            return;
        };
        let mut sink = sink.borrow_mut();
        if !self.flow_def_sent {
            if let Some(flow_def) = &self.flow_def {
                sink.flow_def(flow_def);
                self.flow_def_sent = true;
            }
        }
        sink.frame(uref);
    }

    fn sync_acquired(&mut self) {
        if !self.acquired {
            self.acquired = true;
            self.probe.throw(Event::SyncAcquired);
        }
    }

    fn sync_lost(&mut self) {
        if self.acquired {
            self.acquired = false;
            self.probe.throw(Event::SyncLost);
        }
    }

    // Assembly loop

    /// Find the next start code at or after the cursor and read its value.
    fn find_start(&mut self) -> Option<u8> {
        let mut offset = self.next_frame_size;
        if !self.stream.find(&syntax::START_CODE_PREFIX, &mut offset) {
            return None;
        }
        // Keep the cursor on the match so the scan resumes there.
        self.next_frame_size = offset;
        let mut code = [0u8; 1];
        self.stream.extract(offset + 3, &mut code).then_some(code[0])
    }

    fn reset_frame_flags(&mut self) {
        self.next_frame_sequence = false;
        self.next_frame_offset = None;
        self.next_frame_slice = false;
    }

    fn adopt_promoted(&mut self, promoted: Vec<Uref>) {
        for uref in &promoted {
            self.pending.adopt(uref);
        }
    }

    fn work(&mut self) {
        while !self.stream.is_empty() {
            let Some(start) = self.find_start() else {
                return;
            };

            if !self.acquired {
                let promoted = self.stream.consume(self.next_frame_size);
                self.adopt_promoted(promoted);
                self.next_frame_size = 0;
                match start {
                    syntax::PIC_START_CODE => {
                        self.pending.flush_pts();
                        self.pending.flush_dts();
                    }
                    syntax::SEQ_START_CODE => {
                        self.sync_acquired();
                        self.next_frame_sequence = true;
                    }
                    _ => {}
                }
                self.next_frame_size += 4;
                continue;
            }

            if self.next_frame_offset.is_none() {
                match start {
                    syntax::PIC_START_CODE => {
                        self.next_frame_offset = Some(self.next_frame_size);
                    }
                    syntax::SEQ_START_CODE if self.next_frame_size == 0 => {
                        // The accumulator was dropped on a discontinuity and
                        // the frame re-starts on a sequence header.
                        self.next_frame_sequence = true;
                    }
                    _ => {}
                }
                self.next_frame_size += 4;
                continue;
            }

            if start == syntax::EXT_START_CODE {
                self.next_frame_size += 4;
                continue;
            }

            if start > syntax::PIC_START_CODE && start <= syntax::PIC_LAST_CODE {
                // slice header
                self.next_frame_slice = true;
                self.next_frame_size += 4;
                continue;
            }

            if start == syntax::END_START_CODE {
                // The end code belongs to the frame it terminates.
                self.next_frame_size += 4;
            }

            if let Err(err) = self.output_frame() {
                warn!(error = %err, "dropping frame with erroneous headers");
                let promoted = self.stream.consume(self.next_frame_size);
                self.adopt_promoted(promoted);
                self.next_frame_size = 0;
                self.sync_lost();
                self.reset_frame_flags();
                continue;
            }

            let promoted = self.stream.consume(self.next_frame_size);
            self.adopt_promoted(promoted);
            self.reset_frame_flags();
            self.next_frame_size = 4;
            match start {
                syntax::SEQ_START_CODE => self.next_frame_sequence = true,
                syntax::GOP_START_CODE => {}
                syntax::PIC_START_CODE => self.next_frame_offset = Some(0),
                other => {
                    if other == syntax::END_START_CODE {
                        // The end code went out with the frame.
                        self.next_frame_size = 0;
                    }
                    self.sync_lost();
                }
            }
        }
    }

    // Emission

    fn output_frame(&mut self) -> Result<()> {
        let Some(head) = self.stream.head() else {
            return Ok(());
        };
        let attrs = head.attrs().dup();
        let block = self
            .stream
            .copy_range(0, self.next_frame_size)
            .ok_or(Mp2vError::Truncated("frame"))?;
        let mut uref = Uref::from_parts(attrs, Some(block));

        if self.next_frame_sequence {
            self.handle_sequence(&uref)?;
        }
        self.handle_picture(&mut uref)?;

        if let Some(rap) = self.systime_rap {
            uref.set_systime_rap(rap);
        }
        self.output(uref);
        Ok(())
    }

    /// Extract the sequence header, sequence extension and display extension
    /// opening the frame, cache them, and re-derive the flow definition when
    /// they changed.
    fn handle_sequence(&mut self, uref: &Uref) -> Result<()> {
        let frame = uref.block().cloned().unwrap_or_default();
        let seq_size =
            syntax::seq_total_size(&frame).ok_or(Mp2vError::Truncated("sequence"))?;
        let sequence_header = frame.slice(0..seq_size);

        let mut sequence_ext = None;
        let mut sequence_display = None;
        if let Some((ext_offset, id)) = syntax::find_extension(&frame, seq_size) {
            // In MPEG-2 mode the sequence extension is mandatory and comes
            // first.
            if id != syntax::EXT_ID_SEQX {
                return Err(Mp2vError::WrongExtension(id));
            }
            let ext_end = ext_offset + syntax::SEQX_HEADER_SIZE;
            if frame.len() < ext_end {
                return Err(Mp2vError::Truncated("sequence extension"));
            }
            sequence_ext = Some(frame.slice(ext_offset..ext_end));

            if let Some((display_offset, id)) = syntax::find_extension(&frame, ext_end) {
                if id == syntax::EXT_ID_SEQDX {
                    let header = frame
                        .get(display_offset..display_offset + syntax::SEQDX_HEADER_SIZE)
                        .ok_or(Mp2vError::Truncated("sequence display extension"))?;
                    let display_end = display_offset + syntax::seqdx_total_size(header);
                    if frame.len() < display_end {
                        return Err(Mp2vError::Truncated("sequence display extension"));
                    }
                    sequence_display = Some(frame.slice(display_offset..display_end));
                }
            }
        }

        let unchanged = self.sequence_header.as_ref() == Some(&sequence_header)
            && self.sequence_ext == sequence_ext
            && self.sequence_display == sequence_display;

        // Replace the cached headers either way, releasing the buffers the
        // older ones kept alive.
        self.sequence_header = Some(sequence_header);
        self.sequence_ext = sequence_ext;
        self.sequence_display = sequence_display;

        if unchanged {
            return Ok(());
        }
        self.parse_sequence()
    }

    /// Derive the output flow definition from the cached sequence headers.
    fn parse_sequence(&mut self) -> Result<()> {
        let Some(sequence_header) = self.sequence_header.clone() else {
            return Ok(());
        };
        let seq = &sequence_header[..];
        let mut horizontal = syntax::seq_horizontal(seq) as u64;
        let mut vertical = syntax::seq_vertical(seq) as u64;
        let aspect = syntax::seq_aspect(seq);
        let frame_rate_code = syntax::seq_frame_rate_code(seq);
        let mut bitrate = syntax::seq_bitrate(seq) as u64;
        let mut vbv_buffer = syntax::seq_vbv_buffer(seq) as u64;

        let mut frame_rate = syntax::FRAME_RATES[frame_rate_code as usize];
        if frame_rate.num == 0 {
            return Err(Mp2vError::InvalidFrameRate(frame_rate_code));
        }

        let Some(flow_def_input) = &self.flow_def_input else {
            return Ok(());
        };
        let mut flow_def = flow_def_input.dup();

        if let Some(ext) = self.sequence_ext.clone() {
            let ext = &ext[..];
            let profile_level = syntax::seqx_profile_level(ext);
            let progressive = syntax::seqx_progressive(ext);
            let chroma = syntax::seqx_chroma(ext);
            horizontal |= (syntax::seqx_horizontal(ext) as u64) << 12;
            vertical |= (syntax::seqx_vertical(ext) as u64) << 12;
            bitrate |= (syntax::seqx_bitrate(ext) as u64) << 18;
            vbv_buffer |= (syntax::seqx_vbv_buffer(ext) as u64) << 10;
            let lowdelay = syntax::seqx_lowdelay(ext);
            frame_rate.num *= (syntax::seqx_frame_rate_n(ext) + 1) as i64;
            frame_rate.den *= (syntax::seqx_frame_rate_d(ext) + 1) as u64;
            frame_rate = frame_rate.simplified();

            flow_def.set_profile_level(profile_level);
            let max_octetrate = match profile_level & syntax::LEVEL_MASK {
                syntax::LEVEL_LOW => 4_000_000 / 8,
                syntax::LEVEL_MAIN => 15_000_000 / 8,
                syntax::LEVEL_HIGH_1440 => 60_000_000 / 8,
                syntax::LEVEL_HIGH => 80_000_000 / 8,
                level => return Err(Mp2vError::InvalidLevel(level)),
            };
            flow_def.set_max_octetrate(max_octetrate);
            if progressive {
                flow_def.set_progressive();
            }
            self.progressive_sequence = progressive;
            flow_def.set_macropixel(1);
            flow_def.set_planes(0);
            flow_def.add_plane(1, 1, 1, "y8");
            match chroma {
                syntax::CHROMA_420 => {
                    flow_def.add_plane(2, 2, 1, "u8");
                    flow_def.add_plane(2, 2, 1, "v8");
                    flow_def.set_flow_def(FLOW_DEF_420);
                }
                syntax::CHROMA_422 => {
                    flow_def.add_plane(2, 1, 1, "u8");
                    flow_def.add_plane(2, 1, 1, "v8");
                    flow_def.set_flow_def(FLOW_DEF_422);
                }
                syntax::CHROMA_444 => {
                    flow_def.add_plane(1, 1, 1, "u8");
                    flow_def.add_plane(1, 1, 1, "v8");
                    flow_def.set_flow_def(FLOW_DEF_444);
                }
                chroma => return Err(Mp2vError::InvalidChroma(chroma)),
            }
            if lowdelay {
                flow_def.set_lowdelay();
            }
        } else {
            self.progressive_sequence = false;
        }

        flow_def.set_hsize(horizontal);
        flow_def.set_vsize(vertical);
        let sar = match aspect {
            syntax::ASPECT_SQUARE => Rational::new(1, 1),
            syntax::ASPECT_4_3 => {
                Rational::new(vertical as i64 * 4, horizontal * 3).simplified()
            }
            syntax::ASPECT_16_9 => {
                Rational::new(vertical as i64 * 16, horizontal * 9).simplified()
            }
            syntax::ASPECT_2_21 => {
                Rational::new(vertical as i64 * 221, horizontal * 100).simplified()
            }
            aspect => return Err(Mp2vError::InvalidAspect(aspect)),
        };
        flow_def.set_aspect(sar);
        flow_def.set_fps(frame_rate);
        self.fps = frame_rate;
        flow_def.set_octetrate(bitrate * 400 / 8);
        flow_def.set_cpb_buffer(vbv_buffer * 16 * 1024 / 8);

        if let Some(display) = &self.sequence_display {
            flow_def.set_hsize_visible(syntax::seqdx_horizontal(display) as u64);
            flow_def.set_vsize_visible(syntax::seqdx_vertical(display) as u64);
        }

        self.store_flow_def(Some(flow_def));
        Ok(())
    }

    /// Parse the picture header and its coding extension, stamping picture
    /// and clock attributes onto the frame. Returns the coding type.
    fn parse_picture(&mut self, uref: &mut Uref, frame: &[u8]) -> Result<u8> {
        let picture_offset = self.next_frame_offset.ok_or(Mp2vError::MissingPicture)?;

        let mut closed_gop = false;
        let mut broken_link = false;
        if picture_offset != 0 {
            // There are headers in front, one of them may be a GOP header.
            if let Some(gop_offset) =
                syntax::find_start_code(frame, 0, syntax::GOP_START_CODE)
            {
                let gop = frame
                    .get(gop_offset..gop_offset + syntax::GOP_HEADER_SIZE)
                    .ok_or(Mp2vError::Truncated("group of pictures"))?;
                closed_gop = syntax::gop_closed(gop);
                broken_link = syntax::gop_broken_link(gop);
                self.last_temporal_reference = -1;
            }
        }

        if broken_link || (!closed_gop && self.got_discontinuity) {
            uref.set_discontinuity();
        }

        let pic = frame
            .get(picture_offset..picture_offset + syntax::PIC_HEADER_SIZE)
            .ok_or(Mp2vError::Truncated("picture"))?;
        let temporal_reference = syntax::pic_temporal_reference(pic) as i64;
        let coding_type = syntax::pic_coding_type(pic);
        let vbv_delay = syntax::pic_vbv_delay(pic);

        let picture_number =
            self.last_picture_number + (temporal_reference - self.last_temporal_reference);
        if temporal_reference > self.last_temporal_reference {
            self.last_temporal_reference = temporal_reference;
            self.last_picture_number = picture_number;
        }
        uref.set_pic_number(picture_number.max(0) as u64);
        uref.set_mp2v_type(coding_type);
        if vbv_delay != syntax::VBV_DELAY_NONE {
            uref.set_vbv_delay(vbv_delay as u64 * CLOCK_FREQ / 90_000);
        }

        debug_assert!(self.fps.num > 0, "sequence parsed before first picture");
        let mut duration = CLOCK_FREQ * self.fps.den / self.fps.num as u64;
        if let Some((ext_offset, id)) =
            syntax::find_extension(frame, picture_offset + syntax::PIC_HEADER_SIZE)
        {
            // In MPEG-2 mode the picture coding extension is mandatory here.
            if id != syntax::EXT_ID_PICX {
                return Err(Mp2vError::WrongExtension(id));
            }
            let ext = frame
                .get(ext_offset..ext_offset + syntax::PICX_HEADER_SIZE)
                .ok_or(Mp2vError::Truncated("picture coding extension"))?;
            let intra_dc = syntax::picx_intra_dc(ext);
            let structure = syntax::picx_structure(ext);
            let tff = syntax::picx_tff(ext);
            let rff = syntax::picx_rff(ext);
            let progressive = syntax::picx_progressive_frame(ext);

            if intra_dc != 0 {
                warn!(
                    bit_depth = 8 + intra_dc,
                    "bit depth possibly not supported"
                );
            }

            if self.progressive_sequence {
                if rff {
                    duration *= 1 + u64::from(tff);
                }
            } else if structure == syntax::STRUCTURE_FRAME {
                if rff {
                    duration += duration / 2;
                }
            } else {
                // field picture
                duration /= 2;
            }

            if structure & syntax::STRUCTURE_TOP_FIELD != 0 {
                uref.set_tf();
            }
            if structure & syntax::STRUCTURE_BOTTOM_FIELD != 0 {
                uref.set_bf();
            }
            if tff {
                uref.set_tff();
            }
            uref.set_duration(duration);
            if progressive {
                uref.set_progressive();
            }
        }

        apply_timestamp!(self.pending, uref, pts_orig, set_pts_orig, delete_pts_orig);
        apply_timestamp!(self.pending, uref, pts, set_pts, delete_pts);
        apply_timestamp!(self.pending, uref, pts_sys, set_pts_sys, delete_pts_sys);
        apply_timestamp!(self.pending, uref, dts_orig, set_dts_orig, delete_dts_orig);
        apply_timestamp!(self.pending, uref, dts, set_dts, delete_dts);
        apply_timestamp!(self.pending, uref, dts_sys, set_dts_sys, delete_dts_sys);
        self.pending.flush_pts();
        self.pending.increment_dts(duration);

        Ok(coding_type)
    }

    /// Parse the picture and mark random access, inserting cached sequence
    /// headers in front of bare I frames when configured to.
    fn handle_picture(&mut self, uref: &mut Uref) -> Result<()> {
        let frame = uref.block().cloned().unwrap_or_default();
        let coding_type = self.parse_picture(uref, &frame)?;

        if coding_type == syntax::PIC_TYPE_I {
            let carried_rap = uref.systime_rap();
            if self.next_frame_sequence {
                uref.set_random();
                self.systime_rap = carried_rap;
            } else if self.insert_sequence {
                if let Some(sequence_header) = &self.sequence_header {
                    let mut assembled = BytesMut::with_capacity(
                        sequence_header.len()
                            + self.sequence_ext.as_ref().map_or(0, Bytes::len)
                            + self.sequence_display.as_ref().map_or(0, Bytes::len)
                            + frame.len(),
                    );
                    assembled.extend_from_slice(sequence_header);
                    if let Some(ext) = &self.sequence_ext {
                        assembled.extend_from_slice(ext);
                    }
                    if let Some(display) = &self.sequence_display {
                        assembled.extend_from_slice(display);
                    }
                    assembled.extend_from_slice(&frame);
                    uref.set_block(assembled.freeze());
                    uref.set_random();
                    self.systime_rap = carried_rap;
                }
            }
        }
        Ok(())
    }
}

impl Drop for Mp2vFramer {
    fn drop(&mut self) {
        self.probe.throw(Event::Dead);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaflow_stream::event::NullProbe;

    #[test]
    fn test_sequence_insertion_control() {
        let mut framer = Mp2vFramer::new(Box::new(NullProbe));
        assert!(!framer.sequence_insertion());
        assert!(matches!(
            framer.control(Command::SetSequenceInsertion(true)),
            Reply::Done
        ));
        assert!(matches!(
            framer.control(Command::GetSequenceInsertion),
            Reply::SequenceInsertion(true)
        ));
    }

    #[test]
    fn test_get_output_starts_empty() {
        let mut framer = Mp2vFramer::new(Box::new(NullProbe));
        assert!(matches!(
            framer.control(Command::GetOutput),
            Reply::Output(None)
        ));
    }

    #[test]
    fn test_mp2v_attrs() {
        let mgr = mediaflow_attr::DictMgr::new(2);
        let mut uref = Uref::new(&mgr);
        uref.set_mp2v_type(syntax::PIC_TYPE_B);
        uref.set_profile_level(0x48);
        uref.set_lowdelay();
        assert_eq!(uref.mp2v_type(), Some(syntax::PIC_TYPE_B));
        assert_eq!(uref.profile_level(), Some(0x48));
        assert!(uref.lowdelay());
    }
}
