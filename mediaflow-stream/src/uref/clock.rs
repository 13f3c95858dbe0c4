//! Clock attributes (`k.*`)
//!
//! All timestamps and durations are expressed in ticks of the 27 MHz system
//! clock. The `orig` variants carry the timestamps as they appeared in the
//! stream, the plain variants the program timeline, and the `sys` variants
//! the local system timeline.

use super::unsigned_attr;
use super::Uref;

/// Frequency of the system clock, in Hz.
pub const CLOCK_FREQ: u64 = 27_000_000;

impl Uref {
    unsigned_attr!(set_systime, systime, delete_systime, "k.systime");
    unsigned_attr!(
        set_systime_rap,
        systime_rap,
        delete_systime_rap,
        "k.systime.rap"
    );
    unsigned_attr!(set_pts, pts, delete_pts, "k.pts");
    unsigned_attr!(set_pts_orig, pts_orig, delete_pts_orig, "k.pts.orig");
    unsigned_attr!(set_pts_sys, pts_sys, delete_pts_sys, "k.pts.sys");
    unsigned_attr!(set_dts, dts, delete_dts, "k.dts");
    unsigned_attr!(set_dts_orig, dts_orig, delete_dts_orig, "k.dts.orig");
    unsigned_attr!(set_dts_sys, dts_sys, delete_dts_sys, "k.dts.sys");
    unsigned_attr!(set_vbv_delay, vbv_delay, delete_vbv_delay, "k.vbvdelay");
    unsigned_attr!(set_duration, duration, delete_duration, "k.duration");
}
