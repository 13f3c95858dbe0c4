//! Flow attributes (`f.*`) and block flow attributes (`b.*`)

use super::Uref;
use super::{string_attr, unsigned_attr, void_attr};

impl Uref {
    string_attr!(set_flow_def, flow_def, delete_flow_def, "f.def");
    string_attr!(set_raw_def, raw_def, delete_raw_def, "f.rawdef");
    string_attr!(set_program, program, delete_program, "f.program");
    string_attr!(set_lang, lang, delete_lang, "f.lang");

    void_attr!(set_discontinuity, discontinuity, delete_discontinuity, "f.disc");
    void_attr!(set_random, random, delete_random, "f.random");
    void_attr!(set_error, error, delete_error, "f.error");

    unsigned_attr!(set_octetrate, octetrate, delete_octetrate, "b.octetrate");
    unsigned_attr!(
        set_max_octetrate,
        max_octetrate,
        delete_max_octetrate,
        "b.max_octetrate"
    );
    unsigned_attr!(set_cpb_buffer, cpb_buffer, delete_cpb_buffer, "b.cpb_buffer");
}
