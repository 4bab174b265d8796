//! XDR primitives and the experiment container layout.
//!
//! Layout, all integers and floats big-endian:
//!
//! ```text
//! experiment := count:u32 coin*count
//! coin       := name_len:u32 name[name_len] pad[0..3] snapshot_count:u32 snapshot*snapshot_count
//! snapshot   := price:f64 volume:f64
//! ```
//!
//! Names are padded with zero bytes to a 4-byte boundary; the padding is not
//! counted in `name_len`.

use coinset_core::{Cryptocoin, CryptocoinExperiment, DateSnapshot, Error, Result};

/// Size of one encoded snapshot.
pub const SNAPSHOT_SIZE: usize = 16;

/// Zero bytes needed after `len` bytes to reach a 4-byte boundary.
#[inline]
pub fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Append-only XDR encoder.
#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a length-prefixed, zero-padded byte string.
    pub fn put_opaque(&mut self, bytes: &[u8]) -> Result<()> {
        self.put_u32(length_u32(bytes.len(), "opaque length")?);
        self.buf.extend_from_slice(bytes);
        self.buf.resize(self.buf.len() + padding(bytes.len()), 0);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

fn length_u32(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::inconsistent(format!("{what} {len} exceeds u32::MAX")))
}

/// Bounds-checked XDR decoder over a byte slice.
#[derive(Debug)]
pub struct XdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::decode(
                format!(
                    "truncated {what}: need {n} bytes, {} remaining",
                    self.remaining()
                ),
                self.pos,
            ));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    pub fn get_u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take_array(what)?))
    }

    pub fn get_f64(&mut self, what: &str) -> Result<f64> {
        Ok(f64::from_be_bytes(self.take_array(what)?))
    }

    /// Read a length-prefixed byte string and verify its padding is zero.
    pub fn get_opaque(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.get_u32(what)? as usize;
        let bytes = self.take(len, what)?;

        let pad_start = self.pos;
        let pad = self.take(padding(len), what)?;
        if pad.iter().any(|&b| b != 0) {
            return Err(Error::decode(format!("non-zero padding after {what}"), pad_start));
        }
        Ok(bytes)
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::decode(
                format!("{} trailing bytes", self.remaining()),
                self.pos,
            ));
        }
        Ok(())
    }
}

/// Exact encoded size of an experiment.
pub fn encoded_len(experiment: &CryptocoinExperiment) -> usize {
    4 + experiment
        .coins
        .iter()
        .map(|c| 4 + c.name.len() + padding(c.name.len()) + 4 + c.snapshots.len() * SNAPSHOT_SIZE)
        .sum::<usize>()
}

/// Encode an experiment. Output depends only on the experiment's contents.
pub fn encode(experiment: &CryptocoinExperiment) -> Result<Vec<u8>> {
    let mut w = XdrWriter::with_capacity(encoded_len(experiment));

    w.put_u32(length_u32(experiment.coins.len(), "coin count")?);
    for coin in &experiment.coins {
        w.put_opaque(&coin.name)?;
        w.put_u32(length_u32(coin.snapshots.len(), "snapshot count")?);
        for snap in &coin.snapshots {
            w.put_f64(snap.price);
            w.put_f64(snap.volume);
        }
    }

    Ok(w.into_inner())
}

/// Decode an experiment, rejecting truncated, padded-wrong or oversized input.
pub fn decode(bytes: &[u8]) -> Result<CryptocoinExperiment> {
    let mut r = XdrReader::new(bytes);

    let count_pos = r.position();
    let count = r.get_u32("coin count")? as usize;
    // Smallest possible coin is two u32 words
    if count > r.remaining() / 8 {
        return Err(Error::decode(
            format!("coin count {count} exceeds remaining {} bytes", r.remaining()),
            count_pos,
        ));
    }

    let mut coins = Vec::with_capacity(count);
    for _ in 0..count {
        coins.push(decode_coin(&mut r)?);
    }

    r.finish()?;
    Ok(CryptocoinExperiment { coins })
}

fn decode_coin(r: &mut XdrReader<'_>) -> Result<Cryptocoin> {
    let name = r.get_opaque("coin name")?.to_vec();

    let count_pos = r.position();
    let count = r.get_u32("snapshot count")? as usize;
    if count > r.remaining() / SNAPSHOT_SIZE {
        return Err(Error::decode(
            format!(
                "snapshot count {count} exceeds remaining {} bytes",
                r.remaining()
            ),
            count_pos,
        ));
    }

    let mut snapshots = Vec::with_capacity(count);
    for _ in 0..count {
        let price = r.get_f64("snapshot price")?;
        let volume = r.get_f64("snapshot volume")?;
        snapshots.push(DateSnapshot { price, volume });
    }

    Ok(Cryptocoin { name, snapshots })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn btc_experiment() -> CryptocoinExperiment {
        CryptocoinExperiment {
            coins: vec![Cryptocoin::new(
                b"btc".as_slice(),
                vec![DateSnapshot::new(1.0, 0.0), DateSnapshot::new(50000.0, 1000.0)],
            )],
        }
    }

    #[test]
    fn test_padding() {
        assert_eq!(padding(0), 0);
        assert_eq!(padding(1), 3);
        assert_eq!(padding(3), 1);
        assert_eq!(padding(4), 0);
        assert_eq!(padding(5), 3);
    }

    #[test]
    fn test_single_coin_layout() {
        let exp = btc_experiment();
        let bytes = encode(&exp).unwrap();

        assert_eq!(bytes.len(), 52);
        assert_eq!(encoded_len(&exp), 52);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 3]);
        assert_eq!(&bytes[8..12], b"btc\0");
        assert_eq!(&bytes[12..16], &[0, 0, 0, 2]);
        assert_eq!(&bytes[16..24], &1.0f64.to_be_bytes());
        assert_eq!(&bytes[24..32], &0.0f64.to_be_bytes());
        assert_eq!(&bytes[32..40], &50000.0f64.to_be_bytes());
        assert_eq!(&bytes[40..48], &1000.0f64.to_be_bytes());

        assert_eq!(decode(&bytes).unwrap(), exp);
    }

    #[test]
    fn test_empty_experiment() {
        let bytes = encode(&CryptocoinExperiment::new()).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_aligned_name_has_no_padding() {
        let exp = CryptocoinExperiment {
            coins: vec![Cryptocoin::new(b"AVAX".as_slice(), vec![])],
        };
        let bytes = encode(&exp).unwrap();
        assert_eq!(bytes.len(), 4 + 4 + 4 + 4);
        assert_eq!(decode(&bytes).unwrap(), exp);
    }

    #[test]
    fn test_every_truncation_fails() {
        let bytes = encode(&btc_experiment()).unwrap();
        for cut in 1..=bytes.len() {
            let truncated = &bytes[..bytes.len() - cut];
            match decode(truncated) {
                Err(Error::Decode { byte_offset, .. }) => assert!(byte_offset <= truncated.len()),
                other => panic!("cut {cut}: expected decode error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&btc_experiment()).unwrap();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        match decode(&bytes) {
            Err(Error::Decode { byte_offset, reason }) => {
                assert_eq!(byte_offset, 52);
                assert!(reason.contains("trailing"));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_nonzero_padding_rejected() {
        let mut bytes = encode(&btc_experiment()).unwrap();
        bytes[11] = 0xff;
        match decode(&bytes) {
            Err(Error::Decode { byte_offset, .. }) => assert_eq!(byte_offset, 11),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_counts_rejected() {
        // Claims four billion coins in an eight-byte file
        let bytes = [0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0];
        assert!(matches!(decode(&bytes), Err(Error::Decode { byte_offset: 0, .. })));

        let mut bytes = encode(&btc_experiment()).unwrap();
        bytes[12..16].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(decode(&bytes), Err(Error::Decode { byte_offset: 12, .. })));
    }

    #[test]
    fn test_reencode_is_byte_identical() {
        let exp = CryptocoinExperiment {
            coins: vec![
                Cryptocoin::new(b"ada".as_slice(), vec![DateSnapshot::new(1.25, 3.5); 3]),
                Cryptocoin::new(b"matic".as_slice(), vec![DateSnapshot::new(-0.0, f64::MAX); 3]),
            ],
        };
        let bytes = encode(&exp).unwrap();
        let again = encode(&decode(&bytes).unwrap()).unwrap();
        assert_eq!(again, bytes);
    }

    fn experiment_strategy() -> impl Strategy<Value = CryptocoinExperiment> {
        (0usize..8).prop_flat_map(|length| {
            proptest::collection::vec(
                (
                    proptest::collection::vec(any::<u8>(), 0..9),
                    proptest::collection::vec((-1e9f64..1e9, 0.0f64..1e12), length),
                ),
                0..6,
            )
            .prop_map(|coins| CryptocoinExperiment {
                coins: coins
                    .into_iter()
                    .map(|(name, snaps)| Cryptocoin {
                        name,
                        snapshots: snaps
                            .into_iter()
                            .map(|(price, volume)| DateSnapshot { price, volume })
                            .collect(),
                    })
                    .collect(),
            })
        })
    }

    proptest! {
        #[test]
        fn prop_roundtrip(exp in experiment_strategy()) {
            let bytes = encode(&exp).unwrap();
            prop_assert_eq!(bytes.len(), encoded_len(&exp));
            let decoded = decode(&bytes).unwrap();
            prop_assert_eq!(encode(&decoded).unwrap(), bytes);
            prop_assert_eq!(decoded, exp);
        }
    }
}
