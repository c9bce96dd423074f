//! Combined Tausworthe generator with an LCG fourth component.
//!
//! Each pixel owns an independent four word state, so given the same seed the
//! draw sequence is bit-identical on every worker and on the device kernel.

const SCALE: f32 = 2.328_306_4e-10;

#[inline]
#[must_use]
pub const fn taus_step(z: u32, s1: u32, s2: u32, s3: u32, m: u32) -> u32 {
    let b = ((z << s1) ^ z) >> s2;
    ((z & m) << s3) ^ b
}

#[inline]
#[must_use]
pub const fn lcg_step(z: u32, a: u32, c: u32) -> u32 {
    a.wrapping_mul(z).wrapping_add(c)
}

/// Mixes a 32-bit word; used to spread seeds across pixels and frames.
#[inline]
#[must_use]
pub const fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TausRng {
    pub state: [u32; 4],
}

impl TausRng {
    #[must_use]
    pub const fn new(state: [u32; 4]) -> Self {
        Self { state }
    }

    /// Seed for pixel `(x, y)` of a frame.
    ///
    /// The three Tausworthe words are forced above the minimum values
    /// (2, 8, 16) below which their sequences collapse.
    #[must_use]
    pub const fn seed_for_pixel(frame_seed: u32, x: u32, y: u32) -> Self {
        let base = hash_u32(frame_seed ^ hash_u32(x.wrapping_mul(0x9e37_79b9) ^ hash_u32(y)));
        let s0 = hash_u32(base ^ 0x1234_5678) | 0x80;
        let s1 = hash_u32(base ^ 0x2345_6789) | 0x80;
        let s2 = hash_u32(base ^ 0x3456_789a) | 0x80;
        let s3 = hash_u32(base ^ 0x4567_89ab);
        Self { state: [s0, s1, s2, s3] }
    }

    /// Uniform draw in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn next_f32(&mut self) -> f32 {
        self.state[0] = taus_step(self.state[0], 13, 19, 12, 0xFFFF_FFFE);
        self.state[1] = taus_step(self.state[1], 2, 25, 4, 0xFFFF_FFF8);
        self.state[2] = taus_step(self.state[2], 3, 11, 17, 0xFFFF_FFF0);
        self.state[3] = lcg_step(self.state[3], 1_664_525, 1_013_904_223);
        SCALE * (self.state[0] ^ self.state[1] ^ self.state[2] ^ self.state[3]) as f32
    }
}
