use std::hash::Hasher;

/// A fast, non-cryptographic hash used for choosing batch boundaries.
/// Content identity uses sha256 digests instead.
pub fn get_bytes_hash(bytes: &[u8]) -> u64 {
  let mut hasher = twox_hash::XxHash64::default();
  hasher.write(bytes);
  hasher.finish()
}
