//! Deterministic identifiers for evaluation runs.
//!
//! Run identifiers are derived from the task description so that two runs
//! of the same configuration report the same id.

/// Extremely small non-cryptographic FNV-1a hash.
#[derive(Copy, Clone, Debug)]
pub struct SimpleHash(u32);

impl SimpleHash {
    /// Create a new hash state with the FNV offset basis.
    pub fn new() -> Self {
        Self(2_166_136_261)
    }

    /// Feed bytes into the hash function.
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ (*b as u32)).wrapping_mul(16_777_619);
        }
    }

    /// Finalise the hash and return an 8-character lowercase hex string.
    pub fn finish_hex(&self) -> String {
        format!("{:08x}", self.0)
    }
}

impl Default for SimpleHash {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a `run-xxxxxxxx` identifier from the parts describing a task.
pub fn run_id(parts: &[&str]) -> String {
    let mut hasher = SimpleHash::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(&[0x1f]);
    }
    format!("run-{}", hasher.finish_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_reference_value() {
        let mut h = SimpleHash::new();
        h.update(b"a");
        assert_eq!(h.finish_hex(), "e40c292c");
    }

    #[test]
    fn run_id_is_stable_and_order_sensitive() {
        assert_eq!(run_id(&["a", "b"]), run_id(&["a", "b"]));
        assert_ne!(run_id(&["a", "b"]), run_id(&["b", "a"]));
        assert_ne!(run_id(&["ab"]), run_id(&["a", "b"]));
        assert!(run_id(&["x"]).starts_with("run-"));
    }
}
