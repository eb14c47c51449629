use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Divisor mapping a signed 32-bit draw onto the unit interval.
const I32_MAX_F64: f64 = 0x7fff_ffff as f64;

/// State of a combined Tausworthe ("tau") generator: three 64-bit words,
/// mutated in place by every draw.
///
/// There is no global instance. Every routine that needs randomness takes a
/// `&mut RngState`, so determinism and thread ownership stay with the caller.
/// Two states holding the same words produce identical sequences.
///
/// # Example
/// ```
/// use descent::random::RngState;
///
/// let mut a = RngState::new([12345, 67890, 13579]);
/// let mut b = a;
/// assert_eq!(a.next_int(), b.next_int());
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RngState {
    words: [i64; 3],
}

impl RngState {
    pub fn new(words: [i64; 3]) -> Self {
        RngState { words }
    }

    /// Creates a state from a single seed. The three words are drawn in the
    /// signed 32-bit range from a seeded `StdRng`, so the same seed always
    /// yields the same state.
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut words = [0i64; 3];
        for w in words.iter_mut() {
            *w = rng.random_range(i32::MIN as i64..i32::MAX as i64);
        }
        RngState { words }
    }

    pub fn words(&self) -> [i64; 3] {
        self.words
    }

    /// Derives an independent state for a worker by drawing three words from
    /// `self`. Forking `k` times in a fixed order is deterministic.
    pub fn fork(&mut self) -> RngState {
        let mut words = [0i64; 3];
        for w in words.iter_mut() {
            *w = self.next_int() as i64;
        }
        RngState { words }
    }

    /// Draws the next signed 32-bit integer.
    ///
    /// Each word goes through one shift-xor round (mask, shift left, shift
    /// right, xor); the result is the xor of the three updated words truncated
    /// to 32 bits. The full signed range is possible, negatives included.
    #[inline]
    pub fn next_int(&mut self) -> i32 {
        let [s0, s1, s2] = &mut self.words;

        *s0 = (((*s0 & 0xffff_fffe) << 12) & 0xffff_ffff)
            ^ ((((*s0 << 13) & 0xffff_ffff) ^ *s0) >> 19);
        *s1 = (((*s1 & 0xffff_fff8) << 4) & 0xffff_ffff)
            ^ ((((*s1 << 2) & 0xffff_ffff) ^ *s1) >> 25);
        *s2 = (((*s2 & 0xffff_fff0) << 17) & 0xffff_ffff)
            ^ ((((*s2 << 3) & 0xffff_ffff) ^ *s2) >> 11);

        (*s0 ^ *s1 ^ *s2) as i32
    }

    /// Draws `next_int() / 0x7fffffff` as an `f32`.
    ///
    /// A negative integer draw gives a negative result, so the output lies in
    /// `[-1, 1]` rather than `[0, 1]`. Candidate building only uses it as a
    /// relative priority, where the sign is irrelevant.
    #[inline]
    pub fn next_float01(&mut self) -> f32 {
        (self.next_int() as f64 / I32_MAX_F64) as f32
    }
}
