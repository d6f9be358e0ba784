//! Small deterministic PRNG for effects and transitions.

/// Mix a 32-bit value into a well-distributed hash (`SplitMix`-style finalizer)
#[inline]
pub const fn hash32(mut x: u32) -> u32 {
    x = x.wrapping_add(0x9e37_79b9);
    x = (x ^ (x >> 16)).wrapping_mul(0x85eb_ca6b);
    x = (x ^ (x >> 13)).wrapping_mul(0xc2b2_ae35);
    x ^ (x >> 16)
}

/// Xorshift32 generator
#[derive(Debug, Clone)]
pub struct FastRng {
    state: u32,
}

impl FastRng {
    /// Create a generator; a zero seed is remapped since xorshift sticks at 0.
    pub const fn new(seed: u32) -> Self {
        let state = hash32(seed);
        Self {
            state: if state == 0 { 0x6d2b_79f5 } else { state },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Random byte
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_u8(&mut self) -> u8 {
        (self.next_u32() >> 24) as u8
    }

    /// Random value in `0..bound` (returns 0 for an empty range)
    #[allow(clippy::cast_possible_truncation)]
    pub fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        ((u64::from(self.next_u32()) * u64::from(bound)) >> 32) as u32
    }

    /// Random float in `0.0..1.0`
    #[allow(clippy::cast_precision_loss)]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}
