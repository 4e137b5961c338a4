//! Type-directed hashing for [`HashMap`](crate::HashMap) keys.
//!
//! Each key type says how its *value* is hashed: integers go through a mixing
//! function, strings are folded byte by byte over their content. Nothing is
//! derived from a type's in-memory layout.

/// Multiplier of the polynomial byte fold.
const FOLD_MULTIPLIER: u64 = 31;

/// A key that can be hashed into the slot array of a `HashMap`.
///
/// Borrowed and owned forms of a key must hash identically, so that a map
/// keyed by `String` can be searched with a `&str`.
///
/// #   Collisions
///
/// Strings are folded with `h * 31 + byte` before mixing, and mixing cannot
/// separate inputs whose folds are already equal. `"Aa"` and `"BB"` fold to the
/// same value, and so does any concatenation of such blocks: `"AaBB"`,
/// `"BBAa"`, `"AaAa"` and `"BBBB"` all share one full hash. Every such key
/// lands on the same natural index whatever the capacity, so a handful more of
/// them than the hop range exhausts the window and inserting fails with
/// [`Error::HopWindowExhausted`](crate::Error::HopWindowExhausted).
pub trait KeyHash {
    /// Returns the full 64-bit hash of this key.
    fn key_hash(&self) -> u64;
}

/// SplitMix64 finaliser. A bijection on `u64`, so distinct integers never
/// share a full hash, while neighbouring integers land far apart.
#[inline]
pub(crate) fn mix(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Folds `bytes` into `seed` with the polynomial `h = h * 31 + byte`.
#[inline]
fn fold_bytes(seed: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(seed, |h, &b| h.wrapping_mul(FOLD_MULTIPLIER).wrapping_add(u64::from(b)))
}

macro_rules! key_hash_integer {
    ($($t:ty),* $(,)?) => {
        $(
            impl KeyHash for $t {
                #[inline]
                fn key_hash(&self) -> u64 {
                    //  Sign-extension is intended: -1i8 and -1i64 hash alike.
                    mix(*self as u64)
                }
            }
        )*
    };
}

key_hash_integer!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl KeyHash for u128 {
    fn key_hash(&self) -> u64 {
        mix(mix(*self as u64) ^ ((*self >> 64) as u64))
    }
}

impl KeyHash for i128 {
    fn key_hash(&self) -> u64 {
        (*self as u128).key_hash()
    }
}

impl KeyHash for bool {
    fn key_hash(&self) -> u64 {
        mix(u64::from(*self))
    }
}

impl KeyHash for char {
    fn key_hash(&self) -> u64 {
        mix(u64::from(u32::from(*self)))
    }
}

impl KeyHash for str {
    fn key_hash(&self) -> u64 {
        mix(fold_bytes(0, self.as_bytes()))
    }
}

impl KeyHash for String {
    fn key_hash(&self) -> u64 {
        self.as_str().key_hash()
    }
}

impl<T: KeyHash + ?Sized> KeyHash for &T {
    fn key_hash(&self) -> u64 {
        (**self).key_hash()
    }
}

impl<T: KeyHash + ?Sized> KeyHash for Box<T> {
    fn key_hash(&self) -> u64 {
        (**self).key_hash()
    }
}

impl<A: KeyHash, B: KeyHash> KeyHash for (A, B) {
    fn key_hash(&self) -> u64 {
        let h = self.0.key_hash();
        mix(h.wrapping_mul(FOLD_MULTIPLIER).wrapping_add(self.1.key_hash()))
    }
}

impl<A: KeyHash, B: KeyHash, C: KeyHash> KeyHash for (A, B, C) {
    fn key_hash(&self) -> u64 {
        let h = (&self.0, &self.1).key_hash();
        mix(h.wrapping_mul(FOLD_MULTIPLIER).wrapping_add(self.2.key_hash()))
    }
}
