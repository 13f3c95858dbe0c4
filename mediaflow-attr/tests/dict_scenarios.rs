//! End-to-end dictionary scenarios

use mediaflow_attr::{AttrType, DictMgr, Rational};

#[test]
fn shorthand_set_get_delete() {
    let mgr = DictMgr::new(4);
    let mut dict = mgr.alloc(0);

    let slot = dict.set_reserve("k.pts", AttrType::Unsigned, 8);
    slot.copy_from_slice(&9000u64.to_be_bytes());

    let value = dict.get("k.pts", AttrType::Unsigned).expect("k.pts set");
    assert_eq!(value.len(), 8);
    assert_eq!(u64::from_be_bytes(value.try_into().unwrap()), 9000);

    assert!(dict.delete("k.pts", AttrType::Unsigned));
    assert!(dict.get("k.pts", AttrType::Unsigned).is_none());
    assert_eq!(dict.size(), 1);
}

#[test]
fn string_shrink_zeroes_slot_tail() {
    let mgr = DictMgr::new(4);
    let mut dict = mgr.alloc(0);

    dict.set_reserve("f.def", AttrType::String, 6)
        .copy_from_slice(b"block\0");
    dict.set_reserve("f.def", AttrType::String, 4)
        .copy_from_slice(b"blo\0");

    let value = dict.get("f.def", AttrType::String).expect("f.def set");
    assert_eq!(value, b"blo\0");
    // The slot keeps its 6-byte footprint; the two superfluous bytes of the
    // original value are zeroed. "f.def" is a shorthand string, so the value
    // slot starts right after code + 16-bit size.
    assert_eq!(&dict.as_bytes()[3..9], b"blo\0\0\0");
}

#[test]
fn dup_preserves_iteration_and_values() {
    let mgr = DictMgr::new(4);
    let mut dict = mgr.alloc(0);
    dict.set_unsigned("p.hsize", 1920);
    dict.set_unsigned("p.vsize", 1080);
    dict.set_rational("p.aspect", Rational::new(16, 9));

    let copy = dict.dup();

    let original: Vec<_> = dict.iter().map(|e| (e.code, e.value.to_vec())).collect();
    let duplicated: Vec<_> = copy.iter().map(|e| (e.code, e.value.to_vec())).collect();
    assert_eq!(original, duplicated);

    assert_eq!(copy.get_unsigned("p.hsize"), Some(1920));
    assert_eq!(copy.get_unsigned("p.vsize"), Some(1080));
    assert_eq!(copy.get_rational("p.aspect"), Some(Rational::new(16, 9)));
}

#[test]
fn pool_cycle_keeps_dictionaries_independent() {
    let mgr = DictMgr::new(2);
    let mut dict = mgr.alloc(0);
    dict.set_unsigned("k.pts", 1);
    drop(dict);

    // The recycled buffer must come back as an empty dictionary.
    let recycled = mgr.alloc(0);
    assert_eq!(recycled.size(), 1);
    assert!(recycled.get_unsigned("k.pts").is_none());
}
