//! CRC64 with the ECMA-182 polynomial, as used by OSS in `x-oss-hash-crc64ecma`.
//!
//! The checksum is the reflected variant with all-ones initial value and final
//! xor, computed table-driven eight bytes at a time. [`combine`] merges the
//! checksums of two adjacent segments without touching their data.

/// Reversed ECMA-182 polynomial.
pub const ECMA_POLY: u64 = 0xC96C5795D7870F42;

static TABLES: [[u64; 256]; 8] = make_tables();

const fn make_tables() -> [[u64; 256]; 8] {
    let mut tables = [[0u64; 256]; 8];

    let mut i = 0;
    while i < 256 {
        let mut crc = i as u64;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ ECMA_POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    let mut i = 0;
    while i < 256 {
        let mut crc = tables[0][i];
        let mut k = 1;
        while k < 8 {
            crc = tables[0][(crc & 0xff) as usize] ^ (crc >> 8);
            tables[k][i] = crc;
            k += 1;
        }
        i += 1;
    }

    tables
}

/// Continue `crc` over `data`.
///
/// `crc` is a finished checksum (start with `0`), so chunks can be fed one by one.
pub fn update(crc: u64, data: &[u8]) -> u64 {
    let t = &TABLES;
    let mut crc = !crc;

    let mut chunks = data.chunks_exact(8);
    for c in &mut chunks {
        // Little endian load keeps the reflected byte order on every platform.
        crc ^= u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]);
        crc = t[7][(crc & 0xff) as usize]
            ^ t[6][((crc >> 8) & 0xff) as usize]
            ^ t[5][((crc >> 16) & 0xff) as usize]
            ^ t[4][((crc >> 24) & 0xff) as usize]
            ^ t[3][((crc >> 32) & 0xff) as usize]
            ^ t[2][((crc >> 40) & 0xff) as usize]
            ^ t[1][((crc >> 48) & 0xff) as usize]
            ^ t[0][(crc >> 56) as usize];
    }
    for &b in chunks.remainder() {
        crc = t[0][((crc ^ b as u64) & 0xff) as usize] ^ (crc >> 8);
    }

    !crc
}

/// Checksum of a whole buffer.
#[inline]
pub fn checksum(data: &[u8]) -> u64 {
    update(0, data)
}

/// Merge `crc1` (over segment A) and `crc2` (over segment B of `len2` bytes)
/// into the checksum of `A ++ B`.
pub fn combine(mut crc1: u64, crc2: u64, mut len2: u64) -> u64 {
    if len2 == 0 {
        return crc1;
    }

    let mut even = [0u64; 64];
    // Operator for one zero bit.
    let mut odd = [0u64; 64];
    odd[0] = ECMA_POLY;
    let mut row = 1u64;
    for v in odd.iter_mut().skip(1) {
        *v = row;
        row <<= 1;
    }

    // Two zero bits, then four.
    gf2_matrix_square(&mut even, &odd);
    gf2_matrix_square(&mut odd, &even);

    // Apply len2 zero bytes to crc1, squaring the operator each round.
    loop {
        gf2_matrix_square(&mut even, &odd);
        if len2 & 1 != 0 {
            crc1 = gf2_matrix_times(&even, crc1);
        }
        len2 >>= 1;
        if len2 == 0 {
            break;
        }

        gf2_matrix_square(&mut odd, &even);
        if len2 & 1 != 0 {
            crc1 = gf2_matrix_times(&odd, crc1);
        }
        len2 >>= 1;
        if len2 == 0 {
            break;
        }
    }

    crc1 ^ crc2
}

fn gf2_matrix_times(mat: &[u64; 64], mut vec: u64) -> u64 {
    let mut sum = 0;
    let mut i = 0;
    while vec != 0 {
        if vec & 1 != 0 {
            sum ^= mat[i];
        }
        vec >>= 1;
        i += 1;
    }
    sum
}

fn gf2_matrix_square(square: &mut [u64; 64], mat: &[u64; 64]) {
    for (n, v) in square.iter_mut().enumerate() {
        *v = gf2_matrix_times(mat, mat[n]);
    }
}

/// Incremental CRC64 digest.
///
/// ```
/// use ossreq_core::crc64::Crc64;
///
/// let mut d = Crc64::new();
/// d.update(b"1234");
/// d.update(b"56789");
/// assert_eq!(d.finish(), 0x995DC9BBDF1939FA);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc64 {
    value: u64,
    len: u64,
}

impl Crc64 {
    /// Create an empty digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.value = update(self.value, data);
        self.len += data.len() as u64;
    }

    /// Append another digest computed over the bytes that follow ours.
    pub fn combine(&mut self, other: &Crc64) {
        self.value = combine(self.value, other.value, other.len);
        self.len += other.len;
    }

    /// Number of bytes consumed.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether no bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current checksum.
    pub fn finish(&self) -> u64 {
        self.value
    }
}
