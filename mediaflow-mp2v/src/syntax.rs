//! ISO 13818-2 syntax: start codes, header sizes and field accessors
//!
//! Accessors take the whole record, beginning at its `00 00 01 xx` start
//! code, and index fixed bit positions the way the standard lays them out.
//! Callers are responsible for handing in at least the record's header size;
//! the accessors themselves do not bounds-check.

use mediaflow_attr::Rational;

/// Prefix of every start code.
pub const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

/// Picture start code.
pub const PIC_START_CODE: u8 = 0x00;
/// Last slice start code; slices span `PIC_START_CODE + 1` to here.
pub const PIC_LAST_CODE: u8 = 0xaf;
/// Sequence header start code.
pub const SEQ_START_CODE: u8 = 0xb3;
/// Extension start code.
pub const EXT_START_CODE: u8 = 0xb5;
/// Sequence end start code.
pub const END_START_CODE: u8 = 0xb7;
/// Group-of-pictures start code.
pub const GOP_START_CODE: u8 = 0xb8;

/// Size of a sequence header without quantiser matrices.
pub const SEQ_HEADER_SIZE: usize = 12;
/// Size of one quantiser matrix.
pub const SEQ_MATRIX_SIZE: usize = 64;
/// Size of a sequence extension.
pub const SEQX_HEADER_SIZE: usize = 10;
/// Size of a sequence display extension without colour description.
pub const SEQDX_HEADER_SIZE: usize = 9;
/// Extra size of the colour description inside a display extension.
pub const SEQDX_COLOR_SIZE: usize = 3;
/// Size of a group-of-pictures header.
pub const GOP_HEADER_SIZE: usize = 8;
/// Size of a picture header.
pub const PIC_HEADER_SIZE: usize = 8;
/// Size of a picture coding extension.
pub const PICX_HEADER_SIZE: usize = 9;

/// Sequence extension identifier.
pub const EXT_ID_SEQX: u8 = 0x1;
/// Sequence display extension identifier.
pub const EXT_ID_SEQDX: u8 = 0x2;
/// Picture coding extension identifier.
pub const EXT_ID_PICX: u8 = 0x8;

/// Square pixels.
pub const ASPECT_SQUARE: u8 = 1;
/// 4:3 display aspect ratio.
pub const ASPECT_4_3: u8 = 2;
/// 16:9 display aspect ratio.
pub const ASPECT_16_9: u8 = 3;
/// 2.21:1 display aspect ratio.
pub const ASPECT_2_21: u8 = 4;

/// Mask extracting the level from the profile/level indication.
pub const LEVEL_MASK: u8 = 0xf;
/// Low level.
pub const LEVEL_LOW: u8 = 10;
/// Main level.
pub const LEVEL_MAIN: u8 = 8;
/// High-1440 level.
pub const LEVEL_HIGH_1440: u8 = 6;
/// High level.
pub const LEVEL_HIGH: u8 = 4;

/// 4:2:0 chroma format.
pub const CHROMA_420: u8 = 1;
/// 4:2:2 chroma format.
pub const CHROMA_422: u8 = 2;
/// 4:4:4 chroma format.
pub const CHROMA_444: u8 = 3;

/// Intra-coded picture.
pub const PIC_TYPE_I: u8 = 1;
/// Predictive-coded picture.
pub const PIC_TYPE_P: u8 = 2;
/// Bidirectionally-predictive-coded picture.
pub const PIC_TYPE_B: u8 = 3;

/// Top field picture structure.
pub const STRUCTURE_TOP_FIELD: u8 = 1;
/// Bottom field picture structure.
pub const STRUCTURE_BOTTOM_FIELD: u8 = 2;
/// Frame picture structure.
pub const STRUCTURE_FRAME: u8 = 3;

/// VBV delay value meaning "no delay information".
pub const VBV_DELAY_NONE: u16 = 0xffff;

/// Frame rates by frame-rate code. Codes 0, 14 and 15 are invalid; 9 to 13
/// are legacy values produced by old encoders, recognized for robustness.
pub const FRAME_RATES: [Rational; 16] = [
    Rational::new(0, 0),
    Rational::new(24000, 1001),
    Rational::new(24, 1),
    Rational::new(25, 1),
    Rational::new(30000, 1001),
    Rational::new(30, 1),
    Rational::new(50, 1),
    Rational::new(60000, 1001),
    Rational::new(60, 1),
    Rational::new(15000, 1001),
    Rational::new(5000, 1001),
    Rational::new(10000, 1001),
    Rational::new(12000, 1001),
    Rational::new(15000, 1001),
    Rational::new(0, 0),
    Rational::new(0, 0),
];

/// Find the next `00 00 01 code` sequence at or after `offset`.
pub fn find_start_code(frame: &[u8], offset: usize, code: u8) -> Option<usize> {
    let pattern = [0x00, 0x00, 0x01, code];
    let mut at = offset;
    while at + pattern.len() <= frame.len() {
        if frame[at..at + pattern.len()] == pattern {
            return Some(at);
        }
        at += 1;
    }
    None
}

/// Find the next extension start code at or after `offset`; returns its
/// position and the extension identifier following it.
pub fn find_extension(frame: &[u8], offset: usize) -> Option<(usize, u8)> {
    let at = find_start_code(frame, offset, EXT_START_CODE)?;
    frame.get(at + 4).map(|&id| (at, id >> 4))
}

/// Total size of the sequence header starting the frame, accounting for the
/// optional quantiser matrices. `None` when the frame is too short.
pub fn seq_total_size(frame: &[u8]) -> Option<usize> {
    let mut size = SEQ_HEADER_SIZE;
    let mut flags = *frame.get(11)?;
    if flags & 0x2 != 0 {
        // intra quantiser matrix
        size += SEQ_MATRIX_SIZE;
        flags = *frame.get(11 + SEQ_MATRIX_SIZE)?;
    }
    if flags & 0x1 != 0 {
        // non-intra quantiser matrix
        size += SEQ_MATRIX_SIZE;
    }
    (frame.len() >= size).then_some(size)
}

// Sequence header

/// `horizontal_size_value`, 12 bits.
pub fn seq_horizontal(seq: &[u8]) -> u16 {
    (seq[4] as u16) << 4 | (seq[5] >> 4) as u16
}

/// `vertical_size_value`, 12 bits.
pub fn seq_vertical(seq: &[u8]) -> u16 {
    ((seq[5] & 0xf) as u16) << 8 | seq[6] as u16
}

/// `aspect_ratio_information`, 4 bits.
pub fn seq_aspect(seq: &[u8]) -> u8 {
    seq[7] >> 4
}

/// `frame_rate_code`, 4 bits.
pub fn seq_frame_rate_code(seq: &[u8]) -> u8 {
    seq[7] & 0xf
}

/// `bit_rate_value`, 18 bits, in units of 400 bit/s.
pub fn seq_bitrate(seq: &[u8]) -> u32 {
    (seq[8] as u32) << 10 | (seq[9] as u32) << 2 | (seq[10] >> 6) as u32
}

/// `vbv_buffer_size_value`, 10 bits, in units of 16 KiB.
pub fn seq_vbv_buffer(seq: &[u8]) -> u32 {
    ((seq[10] & 0x1f) as u32) << 5 | (seq[11] >> 3) as u32
}

// Extensions (common)

/// Extension identifier of any extension record.
pub fn ext_id(ext: &[u8]) -> u8 {
    ext[4] >> 4
}

// Sequence extension

/// `profile_and_level_indication`, 8 bits.
pub fn seqx_profile_level(ext: &[u8]) -> u8 {
    (ext[4] & 0xf) << 4 | ext[5] >> 4
}

/// `progressive_sequence` flag.
pub fn seqx_progressive(ext: &[u8]) -> bool {
    ext[5] & 0x8 != 0
}

/// `chroma_format`, 2 bits.
pub fn seqx_chroma(ext: &[u8]) -> u8 {
    (ext[5] >> 1) & 0x3
}

/// `horizontal_size_extension`, the 2 high bits widening the sequence value.
pub fn seqx_horizontal(ext: &[u8]) -> u8 {
    (ext[5] & 0x1) << 1 | ext[6] >> 7
}

/// `vertical_size_extension`, the 2 high bits widening the sequence value.
pub fn seqx_vertical(ext: &[u8]) -> u8 {
    (ext[6] >> 5) & 0x3
}

/// `bit_rate_extension`, the 12 high bits widening the sequence value.
pub fn seqx_bitrate(ext: &[u8]) -> u16 {
    ((ext[6] & 0x1f) as u16) << 7 | (ext[7] >> 1) as u16
}

/// `vbv_buffer_size_extension`, the 8 high bits widening the sequence value.
pub fn seqx_vbv_buffer(ext: &[u8]) -> u8 {
    ext[8]
}

/// `low_delay` flag.
pub fn seqx_lowdelay(ext: &[u8]) -> bool {
    ext[9] & 0x80 != 0
}

/// `frame_rate_extension_n`, 2 bits.
pub fn seqx_frame_rate_n(ext: &[u8]) -> u8 {
    (ext[9] >> 5) & 0x3
}

/// `frame_rate_extension_d`, 5 bits.
pub fn seqx_frame_rate_d(ext: &[u8]) -> u8 {
    ext[9] & 0x1f
}

// Sequence display extension

/// Whether the display extension carries a colour description.
pub fn seqdx_has_color(ext: &[u8]) -> bool {
    ext[4] & 0x1 != 0
}

/// Total size of a display extension record.
pub fn seqdx_total_size(ext: &[u8]) -> usize {
    SEQDX_HEADER_SIZE + if seqdx_has_color(ext) { SEQDX_COLOR_SIZE } else { 0 }
}

/// `display_horizontal_size`, 14 bits.
pub fn seqdx_horizontal(ext: &[u8]) -> u16 {
    let off = if seqdx_has_color(ext) { SEQDX_COLOR_SIZE } else { 0 };
    (ext[5 + off] as u16) << 6 | (ext[6 + off] >> 2) as u16
}

/// `display_vertical_size`, 14 bits.
pub fn seqdx_vertical(ext: &[u8]) -> u16 {
    let off = if seqdx_has_color(ext) { SEQDX_COLOR_SIZE } else { 0 };
    ((ext[6 + off] & 0x1) as u16) << 13 | (ext[7 + off] as u16) << 5 | (ext[8 + off] >> 3) as u16
}

// Group of pictures header

/// `closed_gop` flag.
pub fn gop_closed(gop: &[u8]) -> bool {
    gop[7] & 0x40 != 0
}

/// `broken_link` flag.
pub fn gop_broken_link(gop: &[u8]) -> bool {
    gop[7] & 0x20 != 0
}

// Picture header

/// `temporal_reference`, 10 bits.
pub fn pic_temporal_reference(pic: &[u8]) -> u16 {
    (pic[4] as u16) << 2 | (pic[5] >> 6) as u16
}

/// `picture_coding_type`, 3 bits.
pub fn pic_coding_type(pic: &[u8]) -> u8 {
    (pic[5] >> 3) & 0x7
}

/// `vbv_delay`, 16 bits of 90 kHz ticks; [`VBV_DELAY_NONE`] means absent.
pub fn pic_vbv_delay(pic: &[u8]) -> u16 {
    ((pic[5] & 0x7) as u16) << 13 | (pic[6] as u16) << 5 | (pic[7] >> 3) as u16
}

// Picture coding extension

/// `intra_dc_precision`, 2 bits; 0 means 8-bit.
pub fn picx_intra_dc(ext: &[u8]) -> u8 {
    (ext[6] >> 2) & 0x3
}

/// `picture_structure`, 2 bits.
pub fn picx_structure(ext: &[u8]) -> u8 {
    ext[6] & 0x3
}

/// `top_field_first` flag.
pub fn picx_tff(ext: &[u8]) -> bool {
    ext[7] & 0x80 != 0
}

/// `repeat_first_field` flag.
pub fn picx_rff(ext: &[u8]) -> bool {
    ext[7] & 0x02 != 0
}

/// `progressive_frame` flag.
pub fn picx_progressive_frame(ext: &[u8]) -> bool {
    ext[8] & 0x80 != 0
}
