/// Computes the field id of a textual label.
///
/// This is the label hash used on the wire: `h = h * 223 + byte` over the UTF-8 bytes of
/// the label, modulo 2^32. Records and variants are serialized in ascending order of this
/// value, so it must match the deployed network bit for bit.
pub fn idl_hash(label: &str) -> u32 {
    label
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(223).wrapping_add(u32::from(b)))
}
