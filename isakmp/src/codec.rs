//! Field-level encode primitive shared by every payload module (§4.A)
//!
//! Every multi-octet integer on the wire is big-endian; [`zerocopy::network_endian`]
//! types already enforce that for fixed-size headers, and payload bodies decode
//! by slicing the borrowed buffer directly (`FromBytes::read_from_prefix` plus
//! indexing), so the only primitive left to share is the length back-patch below.

/// Write a big-endian 16-bit length-of-payload field
///
/// Lengths are only known once the body has been emitted, so every payload
/// generator writes a placeholder header first, serializes its body, then
/// comes back and patches the length in, rather than pre-computing it.
pub fn patch_length_u16(buf: &mut [u8], at: usize, total_len: usize) {
    let len = total_len as u16;
    buf[at..at + 2].copy_from_slice(&len.to_be_bytes());
}
