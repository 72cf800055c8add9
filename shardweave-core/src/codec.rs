//! Reed-Solomon coding over GF(256)
//!
//! Codewords are systematic: message bytes first, then `n_parity` bytes of
//! remainder. Syndromes are taken at `α^0 .. α^(n_parity-1)`. Decoding
//! locates unknown errors with a Berlekamp–Massey style iteration and a
//! brute-force root search, then corrects them with the Forney algorithm.
//! Known erasure positions bypass the locator and cost one parity byte each
//! instead of two.
//!
//! Codeword positions are addressed as indices into the byte slice; position
//! `i` of an `L`-byte codeword corresponds to the locator value `α^(L-1-i)`.

use crate::constants::{FIELD_ORDER, FIELD_SIZE, MAX_POLYNOMIAL_ORDER};
use crate::error::CodingError;
use crate::field::GaloisField;
use crate::polynomial::{convolve, horner, Polynomial};
use hashbrown::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Generator polynomials memoized by parity count
#[derive(Default)]
struct GeneratorCache<'f> {
    polys: Mutex<HashMap<usize, Arc<Polynomial<'f>>>>,
}

impl<'f> GeneratorCache<'f> {
    fn get_or_build(
        &self,
        n_parity: usize,
        build: impl FnOnce() -> Result<Polynomial<'f>, CodingError>,
    ) -> Result<Arc<Polynomial<'f>>, CodingError> {
        // A panic while holding the lock cannot leave a half-built entry, so
        // a poisoned map is still consistent.
        let mut polys = self.polys.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(g) = polys.get(&n_parity) {
            return Ok(Arc::clone(g));
        }
        let g = Arc::new(build()?);
        polys.insert(n_parity, Arc::clone(&g));
        Ok(g)
    }

    fn len(&self) -> usize {
        self.polys.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Reed-Solomon encoder/decoder bound to one field
///
/// Holds the generator cache; share one `Codec` between calls (and threads)
/// so the generator for a given parity count is built only once.
pub struct Codec<'f> {
    field: &'f GaloisField,
    generators: GeneratorCache<'f>,
}

impl<'f> Codec<'f> {
    /// Create a codec over `field` with an empty generator cache
    pub fn new(field: &'f GaloisField) -> Self {
        Self {
            field,
            generators: GeneratorCache::default(),
        }
    }

    /// Field the codec computes in
    pub fn field(&self) -> &'f GaloisField {
        self.field
    }

    /// Number of generator polynomials cached so far
    pub fn cached_generators(&self) -> usize {
        self.generators.len()
    }

    /// The generator `g(x) = (x - α^0)(x - α^1)...(x - α^(n_parity-1))`
    pub fn generator(&self, n_parity: usize) -> Result<Arc<Polynomial<'f>>, CodingError> {
        self.generators.get_or_build(n_parity, || {
            #[cfg(feature = "logging")]
            debug!("Building generator polynomial for {} parity symbols", n_parity);

            let mut g = Polynomial::one(self.field);
            for i in 0..n_parity {
                let factor = Polynomial::new(self.field, vec![1, self.field.power(i)])?;
                g = g.multiply(&factor)?;
            }
            Ok(g)
        })
    }

    /// Encode `input` into `input ‖ parity`
    ///
    /// The parity bytes are the remainder of `input(x) · x^n_parity` divided
    /// by the generator.
    pub fn systematic_encode(&self, input: &[u8], n_parity: usize) -> Result<Vec<u8>, CodingError> {
        let gen = self.generator(n_parity)?;
        let gen = gen.coefficients();

        let mut res = vec![0u8; input.len() + n_parity];
        res[..input.len()].copy_from_slice(input);
        for i in 0..input.len() {
            let c = res[i];
            if c != 0 {
                for (j, &g) in gen.iter().enumerate() {
                    res[i + j] ^= self.field.multiply(g, c);
                }
            }
        }
        res[..input.len()].copy_from_slice(input);
        Ok(res)
    }

    /// Evaluate the codeword at `α^0 .. α^(n_parity-1)`
    pub fn syndromes(&self, codeword: &[u8], n_parity: usize) -> Result<Vec<u8>, CodingError> {
        if codeword.len() > MAX_POLYNOMIAL_ORDER {
            return Err(CodingError::InvalidPolynomial {
                order: codeword.len(),
                max: MAX_POLYNOMIAL_ORDER,
            });
        }
        Ok((0..n_parity)
            .map(|i| horner(self.field, codeword, self.field.power(i)))
            .collect())
    }

    /// Locate unknown error positions in a `message_len`-byte codeword
    ///
    /// Builds the error locator incrementally from the syndromes, then finds
    /// its roots by trying every position.
    pub fn find_error_positions(
        &self,
        syndromes: &[u8],
        message_len: usize,
    ) -> Result<Vec<usize>, CodingError> {
        if message_len > FIELD_SIZE {
            return Err(CodingError::InvalidPolynomial {
                order: message_len,
                max: FIELD_SIZE,
            });
        }

        let mut err_poly = Polynomial::one(self.field);
        let mut old_poly = Polynomial::one(self.field);
        for i in 0..syndromes.len() {
            old_poly = old_poly.append(0)?;

            let locator = err_poly.coefficients();
            let mut delta = syndromes[i];
            for j in 1..locator.len() {
                delta ^= self
                    .field
                    .multiply(locator[locator.len() - 1 - j], syndromes[i - j]);
            }

            if delta != 0 {
                if old_poly.order() > err_poly.order() {
                    let new_poly = old_poly.scale(delta);
                    old_poly = err_poly.scale(self.field.divide(1, delta)?);
                    err_poly = new_poly;
                }
                err_poly = err_poly.add(&old_poly.scale(delta));
            }
        }

        let errors = err_poly.order() - 1;
        if 2 * errors > syndromes.len() {
            return Err(CodingError::TooManyErrors {
                errors,
                capacity: syndromes.len() / 2,
            });
        }

        let positions: Vec<usize> = (0..message_len)
            .filter(|&i| err_poly.evaluate(self.field.power(FIELD_ORDER - i)) == 0)
            .map(|i| message_len - 1 - i)
            .collect();

        if positions.len() != errors {
            return Err(CodingError::ErrorLocatingFailed {
                found: positions.len(),
                expected: errors,
            });
        }

        #[cfg(feature = "logging")]
        trace!("Located {} errors: {:?}", errors, positions);

        Ok(positions)
    }

    /// Strip the contribution of known erasures from the syndromes
    ///
    /// The result has one entry fewer per erasure and can be fed to
    /// [`Codec::find_error_positions`] to locate the remaining unknown errors.
    pub fn forney_syndromes(
        &self,
        syndromes: &[u8],
        erasures: &[usize],
        message_len: usize,
    ) -> Result<Vec<u8>, CodingError> {
        check_in_range(erasures, message_len)?;
        let mut fsynd = syndromes.to_vec();
        for &pos in erasures {
            let x = self.field.power(message_len - 1 - pos);
            for i in 0..fsynd.len().saturating_sub(1) {
                fsynd[i] = self.field.multiply(fsynd[i], x) ^ fsynd[i + 1];
            }
            fsynd.pop();
        }
        Ok(fsynd)
    }

    /// Forney correction of `codeword` at the given positions
    ///
    /// The errata locator is built from `positions` directly, so this works
    /// for located errors and for erasures whose positions the caller knows.
    pub fn correct_errata(
        &self,
        codeword: &mut [u8],
        syndromes: &[u8],
        positions: &[usize],
    ) -> Result<(), CodingError> {
        if positions.is_empty() {
            return Ok(());
        }
        let len = codeword.len();
        let count = positions.len();
        if count > syndromes.len() {
            return Err(CodingError::TooManyErrors {
                errors: count,
                capacity: syndromes.len(),
            });
        }
        check_in_range(positions, len)?;
        check_distinct_locators(positions, len)?;

        // Errata locator: product of (X_i x + 1)
        let mut locator = Polynomial::one(self.field);
        for &pos in positions {
            let x = self.field.power(len - 1 - pos);
            locator = locator.multiply(&Polynomial::new(self.field, vec![x, 1])?)?;
        }

        // Evaluator: S(x) · Λ(x) mod x^count
        let reversed: Vec<u8> = syndromes[..count].iter().rev().copied().collect();
        let product = convolve(self.field, &reversed, locator.coefficients());
        let evaluator = &product[product.len() - count..];

        // Formal derivative keeps the odd powers only
        let lc = locator.coefficients();
        let derivative: Vec<u8> = lc.iter().skip(lc.len() & 1).step_by(2).copied().collect();

        for &pos in positions {
            let x = self.field.power(pos + FIELD_SIZE - len);
            let y = horner(self.field, evaluator, x);
            let z = horner(self.field, &derivative, self.field.multiply(x, x));
            codeword[pos] ^= self.field.divide(y, self.field.multiply(x, z))?;
        }
        Ok(())
    }

    /// Correct unknown errors in place, returning how many were fixed
    pub fn decode_in_place(&self, codeword: &mut [u8], n_parity: usize) -> Result<usize, CodingError> {
        let synd = self.syndromes(codeword, n_parity)?;
        if synd.iter().all(|&s| s == 0) {
            return Ok(0);
        }
        let positions = self.find_error_positions(&synd, codeword.len())?;
        self.correct_errata(codeword, &synd, &positions)?;
        self.check_corrected(codeword, n_parity, positions.len())?;

        #[cfg(feature = "logging")]
        debug!("Corrected {} symbol errors", positions.len());

        Ok(positions.len())
    }

    /// Decode a copy of `codeword`, leaving the input untouched
    pub fn decode(&self, codeword: &[u8], n_parity: usize) -> Result<Vec<u8>, CodingError> {
        let mut work = codeword.to_vec();
        self.decode_in_place(&mut work, n_parity)?;
        Ok(work)
    }

    /// Correct known erasures plus any unknown errors, in place
    ///
    /// Erased positions are zeroed first. `e` erasures and `v` unknown
    /// errors are recoverable while `e + 2v <= n_parity`, provided no two
    /// erasures share a locator value. In a 256-byte codeword positions 0
    /// and 255 both map to `α^0`, so erasing both fails with
    /// [`CodingError::ErrorLocatingFailed`].
    pub fn decode_with_erasures(
        &self,
        codeword: &mut [u8],
        n_parity: usize,
        erasures: &[usize],
    ) -> Result<usize, CodingError> {
        if erasures.is_empty() {
            return self.decode_in_place(codeword, n_parity);
        }
        if erasures.len() > n_parity {
            return Err(CodingError::TooManyErrors {
                errors: erasures.len(),
                capacity: n_parity,
            });
        }
        let len = codeword.len();
        check_in_range(erasures, len)?;
        check_distinct_locators(erasures, len)?;
        for &pos in erasures {
            codeword[pos] = 0;
        }

        let synd = self.syndromes(codeword, n_parity)?;
        if synd.iter().all(|&s| s == 0) {
            return Ok(0);
        }
        let fsynd = self.forney_syndromes(&synd, erasures, len)?;
        let errors = self.find_error_positions(&fsynd, len)?;

        let mut errata = Vec::with_capacity(erasures.len() + errors.len());
        errata.extend_from_slice(erasures);
        errata.extend_from_slice(&errors);
        self.correct_errata(codeword, &synd, &errata)?;
        self.check_corrected(codeword, n_parity, errata.len())?;

        #[cfg(feature = "logging")]
        debug!(
            "Corrected {} erasures and {} errors",
            erasures.len(),
            errors.len()
        );

        Ok(errata.len())
    }

    fn check_corrected(&self, codeword: &[u8], n_parity: usize, fixed: usize) -> Result<(), CodingError> {
        let residual = self
            .syndromes(codeword, n_parity)?
            .iter()
            .filter(|&&s| s != 0)
            .count();
        if residual != 0 {
            return Err(CodingError::ErrorLocatingFailed {
                found: fixed,
                expected: fixed + residual,
            });
        }
        Ok(())
    }
}

fn check_in_range(positions: &[usize], len: usize) -> Result<(), CodingError> {
    match positions.iter().find(|&&p| p >= len) {
        Some(&bad) => Err(CodingError::InvalidFragments(format!(
            "errata position {} outside {}-byte codeword",
            bad, len
        ))),
        None => Ok(()),
    }
}

/// Positions must map to pairwise distinct locator values `α^(len-1-pos)`
fn check_distinct_locators(positions: &[usize], len: usize) -> Result<(), CodingError> {
    let mut seen = [false; FIELD_ORDER];
    let mut distinct = 0;
    for &pos in positions {
        let slot = &mut seen[(len - 1 - pos) % FIELD_ORDER];
        if !*slot {
            *slot = true;
            distinct += 1;
        }
    }
    if distinct != positions.len() {
        return Err(CodingError::ErrorLocatingFailed {
            found: distinct,
            expected: positions.len(),
        });
    }
    Ok(())
}

impl Codec<'static> {
    /// Process-wide codec over [`GaloisField::shared`]
    pub fn shared() -> &'static Codec<'static> {
        static CODEC: OnceLock<Codec<'static>> = OnceLock::new();
        CODEC.get_or_init(|| Codec::new(GaloisField::shared()))
    }
}

impl std::fmt::Debug for Codec<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("field", self.field)
            .field("cached_generators", &self.cached_generators())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, RngCore, SeedableRng};

    fn codec() -> &'static Codec<'static> {
        Codec::shared()
    }

    #[test]
    fn test_generator_small() {
        // (x - 1)(x - 2) = x^2 + 3x + 2
        let g = codec().generator(2).unwrap();
        assert_eq!(g.coefficients(), &[1, 3, 2]);
    }

    #[test]
    fn test_generator_roots() {
        let f = GaloisField::shared();
        let g = codec().generator(10).unwrap();
        assert_eq!(g.order(), 11);
        for i in 0..10 {
            assert_eq!(g.evaluate(f.power(i)), 0);
        }
        assert_ne!(g.evaluate(f.power(10)), 0);
    }

    #[test]
    fn test_generator_is_memoized() {
        let c = Codec::new(GaloisField::shared());
        let a = c.generator(16).unwrap();
        let b = c.generator(16).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(c.cached_generators(), 1);
        c.generator(4).unwrap();
        assert_eq!(c.cached_generators(), 2);
    }

    #[test]
    fn test_encode_is_systematic_and_valid() {
        let msg = b"hello, erasure world";
        let cw = codec().systematic_encode(msg, 8).unwrap();
        assert_eq!(cw.len(), msg.len() + 8);
        assert_eq!(&cw[..msg.len()], msg);
        let synd = codec().syndromes(&cw, 8).unwrap();
        assert!(synd.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_encode_zero_message() {
        let cw = codec().systematic_encode(&[0u8; 40], 12).unwrap();
        assert!(cw.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_clean_codeword_is_noop() {
        let cw = codec().systematic_encode(&[1, 2, 3, 4], 4).unwrap();
        assert_eq!(codec().decode(&cw, 4).unwrap(), cw);
    }

    #[test]
    fn test_decode_corrects_up_to_half_parity() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut msg = vec![0u8; 200];
        rng.fill_bytes(&mut msg);
        let cw = codec().systematic_encode(&msg, 50).unwrap();

        let mut damaged = cw.clone();
        let mut hit = Vec::new();
        while hit.len() < 25 {
            let p = rng.gen_range(0..damaged.len());
            if !hit.contains(&p) {
                damaged[p] ^= rng.gen_range(1..=255u8);
                hit.push(p);
            }
        }

        let mut work = damaged.clone();
        let fixed = codec().decode_in_place(&mut work, 50).unwrap();
        assert_eq!(fixed, 25);
        assert_eq!(work, cw);
        // decode() does not touch its input
        assert_ne!(damaged, cw);
    }

    #[test]
    fn test_decode_rejects_too_many_errors() {
        let msg = [0x5Au8; 100];
        let cw = codec().systematic_encode(&msg, 20).unwrap();
        let mut damaged = cw.clone();
        for b in damaged.iter_mut().step_by(3).take(11) {
            *b ^= 0xFF;
        }
        let err = codec().decode(&damaged, 20).unwrap_err();
        assert!(
            matches!(
                err,
                CodingError::TooManyErrors { .. } | CodingError::ErrorLocatingFailed { .. }
            ),
            "unexpected {:?}",
            err
        );
    }

    #[test]
    fn test_correct_errata_empty_positions() {
        let mut cw = vec![1u8, 2, 3];
        codec().correct_errata(&mut cw, &[9, 9], &[]).unwrap();
        assert_eq!(cw, vec![1, 2, 3]);
    }

    #[test]
    fn test_correct_errata_known_positions() {
        let msg: Vec<u8> = (0..60u8).collect();
        let cw = codec().systematic_encode(&msg, 6).unwrap();
        let mut damaged = cw.clone();
        let positions = [3usize, 17, 40, 41, 62, 65];
        for &p in &positions {
            damaged[p] = 0;
        }
        let synd = codec().syndromes(&damaged, 6).unwrap();
        codec()
            .correct_errata(&mut damaged, &synd, &positions)
            .unwrap();
        assert_eq!(damaged, cw);
    }

    #[test]
    fn test_forney_syndromes_cancel_erasures() {
        let msg = [7u8; 30];
        let cw = codec().systematic_encode(&msg, 8).unwrap();
        let mut damaged = cw.clone();
        damaged[2] ^= 0x11;
        damaged[20] ^= 0x99;
        let synd = codec().syndromes(&damaged, 8).unwrap();
        let fsynd = codec()
            .forney_syndromes(&synd, &[2, 20], damaged.len())
            .unwrap();
        assert_eq!(fsynd.len(), 6);
        assert!(fsynd.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_decode_with_erasures_and_errors() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(99);
        let mut msg = vec![0u8; 150];
        rng.fill_bytes(&mut msg);
        let cw = codec().systematic_encode(&msg, 40).unwrap();

        // 20 erasures + 10 unknown errors: 20 + 2*10 = 40
        let erasures: Vec<usize> = (100..120).collect();
        let mut damaged = cw.clone();
        for &p in &erasures {
            damaged[p] = rng.gen();
        }
        for p in (0..50).step_by(5) {
            damaged[p] ^= 0xA5;
        }

        let fixed = codec()
            .decode_with_erasures(&mut damaged, 40, &erasures)
            .unwrap();
        assert_eq!(fixed, 30);
        assert_eq!(damaged, cw);
    }

    #[test]
    fn test_decode_with_erasures_at_capacity() {
        let msg = [0xC3u8; 20];
        let cw = codec().systematic_encode(&msg, 20).unwrap();
        let erasures: Vec<usize> = (0..20).collect();
        let mut damaged = cw.clone();
        codec()
            .decode_with_erasures(&mut damaged, 20, &erasures)
            .unwrap();
        assert_eq!(damaged, cw);
    }

    #[test]
    fn test_too_many_erasures() {
        let mut cw = codec().systematic_encode(&[1, 2, 3], 2).unwrap();
        let err = codec()
            .decode_with_erasures(&mut cw, 2, &[0, 1, 2])
            .unwrap_err();
        assert_eq!(
            err,
            CodingError::TooManyErrors {
                errors: 3,
                capacity: 2
            }
        );
    }

    #[test]
    fn test_oversized_codeword() {
        assert!(matches!(
            codec().syndromes(&[0u8; 300], 4),
            Err(CodingError::InvalidPolynomial { .. })
        ));
    }

    #[test]
    fn test_forney_syndromes_position_out_of_range() {
        assert!(matches!(
            codec().forney_syndromes(&[1, 2, 3], &[10], 4),
            Err(CodingError::InvalidFragments(_))
        ));
    }

    #[test]
    fn test_full_length_codeword_erasures() {
        let msg: Vec<u8> = (0..128u32).map(|i| (i * 37 + 11) as u8).collect();
        let cw = codec().systematic_encode(&msg, 128).unwrap();
        assert_eq!(cw.len(), 256);

        // Positions 0..128 have distinct locators and fill the parity budget
        let erasures: Vec<usize> = (0..128).collect();
        let mut damaged = cw.clone();
        codec()
            .decode_with_erasures(&mut damaged, 128, &erasures)
            .unwrap();
        assert_eq!(damaged, cw);
    }

    #[test]
    fn test_aliased_erasures_rejected() {
        let msg = [0x5Au8; 128];
        let mut cw = codec().systematic_encode(&msg, 128).unwrap();
        // 0 and 255 both map to α^0 in a 256-byte codeword
        assert_eq!(
            codec().decode_with_erasures(&mut cw, 128, &[0, 255]),
            Err(CodingError::ErrorLocatingFailed {
                found: 1,
                expected: 2
            })
        );

        let mut short = codec().systematic_encode(&[1, 2, 3], 4).unwrap();
        assert_eq!(
            codec().decode_with_erasures(&mut short, 4, &[5, 5]),
            Err(CodingError::ErrorLocatingFailed {
                found: 1,
                expected: 2
            })
        );
    }
}
