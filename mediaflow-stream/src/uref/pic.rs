//! Picture attributes (`p.*`)

use super::Uref;
use super::{rational_attr, unsigned_attr, void_attr};

impl Uref {
    unsigned_attr!(set_pic_number, pic_number, delete_pic_number, "p.num");
    unsigned_attr!(set_hsize, hsize, delete_hsize, "p.hsize");
    unsigned_attr!(set_vsize, vsize, delete_vsize, "p.vsize");
    unsigned_attr!(
        set_hsize_visible,
        hsize_visible,
        delete_hsize_visible,
        "p.hsizevis"
    );
    unsigned_attr!(
        set_vsize_visible,
        vsize_visible,
        delete_vsize_visible,
        "p.vsizevis"
    );
    unsigned_attr!(set_hposition, hposition, delete_hposition, "p.hposition");
    unsigned_attr!(set_vposition, vposition, delete_vposition, "p.vposition");

    rational_attr!(set_aspect, aspect, delete_aspect, "p.aspect");
    rational_attr!(set_fps, fps, delete_fps, "p.fps");

    void_attr!(set_progressive, progressive, delete_progressive, "p.progressive");
    void_attr!(set_tf, tf, delete_tf, "p.tf");
    void_attr!(set_bf, bf, delete_bf, "p.bf");
    void_attr!(set_tff, tff, delete_tff, "p.tff");

    /// Set the number of pixels per macropixel.
    pub fn set_macropixel(&mut self, macropixel: u8) {
        self.attrs.set_small_unsigned("p.macropixel", macropixel);
    }

    /// Read the number of pixels per macropixel.
    pub fn macropixel(&self) -> Option<u8> {
        self.attrs.get_small_unsigned("p.macropixel")
    }

    /// Set the number of pixel planes. Setting 0 restarts the plane list.
    pub fn set_planes(&mut self, planes: u8) {
        self.attrs.set_small_unsigned("p.planes", planes);
    }

    /// Read the number of pixel planes.
    pub fn planes(&self) -> Option<u8> {
        self.attrs.get_small_unsigned("p.planes")
    }

    /// Append a pixel plane described by its subsampling, macropixel size and
    /// chroma name.
    pub fn add_plane(&mut self, hsub: u8, vsub: u8, macropixel_size: u8, chroma: &str) {
        let index = self.planes().unwrap_or(0);
        self.attrs
            .set_small_unsigned(&format!("p.{index}.hsub"), hsub);
        self.attrs
            .set_small_unsigned(&format!("p.{index}.vsub"), vsub);
        self.attrs
            .set_small_unsigned(&format!("p.{index}.macropixel"), macropixel_size);
        self.attrs.set_string(&format!("p.{index}.chroma"), chroma);
        self.set_planes(index + 1);
    }

    /// Read one pixel plane back.
    pub fn plane(&self, index: u8) -> Option<(u8, u8, u8, &str)> {
        if index >= self.planes().unwrap_or(0) {
            return None;
        }
        Some((
            self.attrs.get_small_unsigned(&format!("p.{index}.hsub"))?,
            self.attrs.get_small_unsigned(&format!("p.{index}.vsub"))?,
            self.attrs
                .get_small_unsigned(&format!("p.{index}.macropixel"))?,
            self.attrs.get_string(&format!("p.{index}.chroma"))?,
        ))
    }
}
