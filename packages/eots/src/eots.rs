use crate::error::Error;
use crate::Result;

use k256::elliptic_curve::{
    ops::{MulByGenerator, Reduce},
    point::{AffineCoordinates, DecompressPoint},
    subtle::Choice,
    PrimeField,
};
use k256::{AffinePoint, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar, U256};
use sha2::{Digest, Sha256};

const CHALLENGE_TAG: &[u8] = b"BIP0340/challenge";

// adapted from https://github.com/RustCrypto/elliptic-curves/blob/520f67d26be1773bd600d05796cc26d797dd7182/k256/src/schnorr.rs#L181-L187
fn tagged_hash(tag: &[u8]) -> Sha256 {
    let tag_hash = Sha256::digest(tag);
    let mut digest = Sha256::new();
    digest.update(tag_hash);
    digest.update(tag_hash);
    digest
}

/// BIP-340 challenge `e = int(hash_tag(R.x || P.x || m)) mod n`
fn challenge(r_x: &[u8; 32], p_x: &[u8; 32], msg_hash: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(
        &tagged_hash(CHALLENGE_TAG)
            .chain_update(r_x)
            .chain_update(p_x)
            .chain_update(msg_hash)
            .finalize(),
    )
}

fn x_only(p: &AffinePoint) -> [u8; 32] {
    p.x().into()
}

fn to_array(bytes: &[u8]) -> Result<[u8; 32]> {
    bytes
        .try_into()
        .map_err(|_| Error::InvalidInputLength(bytes.len()))
}

/// Lifts an x coordinate to the curve point with even y, as BIP-340 does for
/// x-only keys and nonces.
fn lift_x(x_bytes: [u8; 32]) -> Option<AffinePoint> {
    let x = FieldBytes::from(x_bytes);
    AffinePoint::decompress(&x, Choice::from(0)).into()
}

/// Returns `(k, k·G)` with `k` negated when needed so that `k·G` has even y
fn normalize(k: Scalar) -> (Scalar, AffinePoint) {
    let point = ProjectivePoint::mul_by_generator(&k).to_affine();
    if bool::from(point.y_is_odd()) {
        let k = -k;
        (k, ProjectivePoint::mul_by_generator(&k).to_affine())
    } else {
        (k, point)
    }
}

/// SecRand is the type for a secret randomness
/// It is formed as a scalar on the Secp256k1 curve
pub type SecRand = Scalar;

/// new_sec_rand parses the given bytes into a new secret randomness
/// the given byte slice has to be a 32-byte scalar
pub fn new_sec_rand(r: &[u8]) -> Result<SecRand> {
    let array = to_array(r)?;
    SecRand::from_repr_vartime(array.into()).ok_or(Error::SecretRandomnessParseFailed {})
}

/// PubRand is the type for a public randomness
/// It is formed as a point with even y coord on the Secp256k1 curve
pub type PubRand = ProjectivePoint;

/// new_pub_rand parses the 32-byte x coordinate of a public randomness
pub fn new_pub_rand(x_bytes: &[u8]) -> Result<PubRand> {
    let array = to_array(x_bytes)?;
    lift_x(array)
        .map(ProjectivePoint::from)
        .ok_or(Error::PublicRandomnessParseFailed {})
}

/// pub_rand_from_sec_rand returns the public randomness `r·G`, lifted to even y
pub fn pub_rand_from_sec_rand(sec_rand: &SecRand) -> PubRand {
    ProjectivePoint::from(normalize(*sec_rand).1)
}

/// pub_rand_to_bytes returns the 32-byte x coordinate of a public randomness
pub fn pub_rand_to_bytes(pub_rand: &PubRand) -> [u8; 32] {
    x_only(&pub_rand.to_affine())
}

/// Signature is an extractable one-time signature (EOTS)
/// i.e., s in a Schnorr signature (R, s)
pub type Signature = Scalar;

pub fn new_sig(r: &[u8]) -> Result<Signature> {
    let array = to_array(r)?;
    Signature::from_repr_vartime(array.into()).ok_or(Error::SignatureParseFailed {})
}

pub fn sig_to_bytes(sig: &Signature) -> [u8; 32] {
    sig.to_bytes().into()
}

/// SecretKey is a secret key, formed as a non-zero 32-byte scalar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKey {
    inner: k256::SecretKey,
}

/// PublicKey is an x-only public key, i.e. the point with even y coordinate
/// on the Secp256k1 curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: AffinePoint,
}

impl SecretKey {
    pub fn from_bytes(x: [u8; 32]) -> Result<Self> {
        let scalar = Scalar::from_repr_vartime(x.into()).ok_or(Error::SecretKeyParseFailed {})?;
        Self::from_scalar(scalar)
    }

    pub fn from_hex(x_hex: &str) -> Result<Self> {
        let x_slice = hex::decode(x_hex)?;
        SecretKey::from_bytes(to_array(&x_slice)?)
    }

    fn from_scalar(scalar: Scalar) -> Result<Self> {
        let nz: Option<NonZeroScalar> = NonZeroScalar::new(scalar).into();
        let nz = nz.ok_or(Error::SecretKeyParseFailed {})?;
        Ok(SecretKey {
            inner: k256::SecretKey::from(nz),
        })
    }

    /// pubkey gets the x-only public key corresponding to the secret key
    pub fn pubkey(&self) -> PublicKey {
        let (_, point) = normalize(*self.inner.to_nonzero_scalar());
        PublicKey { point }
    }

    /// sign creates a signature with the given secret randomness and message hash.
    ///
    /// Both the key and the randomness are negated when their points have odd y, so the
    /// signature verifies against the x-only public key and public randomness.
    pub fn sign(&self, sec_rand: &SecRand, msg_hash: &[u8; 32]) -> Signature {
        let (x, p) = normalize(*self.inner.to_nonzero_scalar());
        let (r, r_point) = normalize(*sec_rand);
        let c = challenge(&x_only(&r_point), &x_only(&p), msg_hash);
        r + c * x
    }

    /// to_bytes converts the secret key into bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes().to_vec()
    }
}

impl PublicKey {
    pub fn from_bytes(x_bytes: [u8; 32]) -> Result<Self> {
        lift_x(x_bytes)
            .map(|point| PublicKey { point })
            .ok_or(Error::PublicKeyParseFailed {})
    }

    pub fn from_slice(x_bytes: &[u8]) -> Result<Self> {
        PublicKey::from_bytes(to_array(x_bytes)?)
    }

    pub fn from_hex(p_hex: &str) -> Result<Self> {
        let p_slice = hex::decode(p_hex)?;
        PublicKey::from_slice(&p_slice)
    }

    /// to_bytes converts the public key into its 32-byte x-only form
    pub fn to_bytes(&self) -> Vec<u8> {
        x_only(&self.point).to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(x_only(&self.point))
    }

    /// verify verifies whether the given signature w.r.t. the
    /// public key, public randomness and message hash
    pub fn verify(&self, pub_rand: &PubRand, msg_hash: &[u8; 32], sig: &Signature) -> bool {
        let p = ProjectivePoint::from(self.point);
        let r_x = pub_rand_to_bytes(pub_rand);
        let c = challenge(&r_x, &x_only(&self.point), msg_hash);
        let recovered_r = ProjectivePoint::mul_by_generator(sig) - p * c;
        recovered_r.eq(pub_rand)
    }

    /// verify_bytes is `verify` over the wire encodings of the public randomness, message hash
    /// and signature
    pub fn verify_bytes(&self, pub_rand: &[u8], msg_hash: &[u8], sig: &[u8]) -> Result<bool> {
        let pub_rand = new_pub_rand(pub_rand)?;
        let msg_hash = to_array(msg_hash)?;
        let sig = new_sig(sig)?;
        Ok(self.verify(&pub_rand, &msg_hash, &sig))
    }

    /// extract_secret_key recovers the secret key from two signatures over distinct message
    /// hashes made with the same public randomness
    pub fn extract_secret_key(
        &self,
        pub_rand: &[u8],
        msg1_hash: &[u8],
        sig1: &[u8],
        msg2_hash: &[u8],
        sig2: &[u8],
    ) -> Result<SecretKey> {
        let pub_rand = new_pub_rand(pub_rand)?;
        extract(
            self,
            &pub_rand,
            &to_array(msg1_hash)?,
            &new_sig(sig1)?,
            &to_array(msg2_hash)?,
            &new_sig(sig2)?,
        )
    }
}

/// extract extracts the secret key from the public key, public
/// randomness, and two pairs of message hashes and signatures.
///
/// The returned key is the one matching the x-only public key, i.e. it may be the negation of
/// the key the signer holds.
pub fn extract(
    pk: &PublicKey,
    pub_rand: &PubRand,
    msg1: &[u8; 32],
    sig1: &Signature,
    msg2: &[u8; 32],
    sig2: &Signature,
) -> Result<SecretKey> {
    if msg1 == msg2 {
        return Err(Error::SameMessage {});
    }
    let p_x = x_only(&pk.point);
    let r_x = pub_rand_to_bytes(pub_rand);

    let e_delta = challenge(&r_x, &p_x, msg1) - challenge(&r_x, &p_x, msg2);
    let s_delta = sig1 - sig2;

    // (s1 - s2) / (e1 - e2)
    let inverted: Option<Scalar> = e_delta.invert().into();
    let inverted = inverted.ok_or(Error::SameMessage {})?;
    SecretKey::from_scalar(s_delta * inverted).map_err(|_| Error::ZeroSecretKey {})
}
