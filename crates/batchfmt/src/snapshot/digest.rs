use sha2::Digest as _;
use sha2::Sha256;
use std::fmt;

/// A sha256 content hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
  pub fn to_hex(&self) -> String {
    self.0.iter().map(|b| format!("{:02x}", b)).collect()
  }
}

impl fmt::Display for Digest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_hex())
  }
}

impl fmt::Debug for Digest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Digest({})", &self.to_hex()[..12])
  }
}

/// Builds a digest from a sequence of length-prefixed fields so
/// that `["ab", "c"]` and `["a", "bc"]` never collide.
pub struct DigestBuilder(Sha256);

impl Default for DigestBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl DigestBuilder {
  pub fn new() -> Self {
    DigestBuilder(Sha256::new())
  }

  pub fn add_bytes(&mut self, bytes: &[u8]) -> &mut Self {
    self.0.update((bytes.len() as u64).to_le_bytes());
    self.0.update(bytes);
    self
  }

  pub fn add_str(&mut self, text: &str) -> &mut Self {
    self.add_bytes(text.as_bytes())
  }

  pub fn add_digest(&mut self, digest: &Digest) -> &mut Self {
    self.add_bytes(&digest.0)
  }

  pub fn finish(self) -> Digest {
    Digest(self.0.finalize().into())
  }
}
