//! Werkzeug password digests
//!
//! Accounts created before the Argon2id migration carry digests of the form
//! `<method>$<salt>$<hex>`, where method is `pbkdf2:sha256:<iterations>` or
//! `scrypt:<n>:<r>:<p>`. The salt enters the KDF as its literal UTF-8 bytes.
//! These digests are only ever verified, never produced.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

/// Longest derived key accepted from a stored digest
const MAX_KEY_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kdf {
    Pbkdf2Sha256 { iterations: u32 },
    Scrypt { log_n: u8, r: u32, p: u32 },
}

/// A parsed `<method>$<salt>$<hex>` digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WerkzeugDigest<'a> {
    kdf: Kdf,
    salt: &'a str,
    expected: Vec<u8>,
}

/// True when `digest` uses one of the werkzeug method prefixes
pub fn is_werkzeug(digest: &str) -> bool {
    digest.starts_with("pbkdf2:") || digest.starts_with("scrypt:")
}

fn parse_num<T: std::str::FromStr>(value: Option<&str>, what: &str) -> Result<T, String> {
    value
        .ok_or_else(|| format!("missing {what}"))?
        .parse()
        .map_err(|_| format!("invalid {what}"))
}

impl<'a> WerkzeugDigest<'a> {
    pub fn parse(digest: &'a str) -> Result<Self, String> {
        let mut parts = digest.splitn(3, '$');
        let method = parts.next().unwrap_or_default();
        let salt = parts.next().ok_or("missing salt")?;
        let hex_hash = parts.next().ok_or("missing hash")?;

        let mut fields = method.split(':');
        let kdf = match fields.next() {
            Some("pbkdf2") => {
                match fields.next() {
                    Some("sha256") => {}
                    Some(other) => return Err(format!("unsupported pbkdf2 hash '{other}'")),
                    None => return Err("missing pbkdf2 hash".to_string()),
                }
                let iterations: u32 = parse_num(fields.next(), "iteration count")?;
                if iterations == 0 {
                    return Err("iteration count must be positive".to_string());
                }
                Kdf::Pbkdf2Sha256 { iterations }
            }
            Some("scrypt") => {
                let n: u64 = parse_num(fields.next(), "scrypt n")?;
                let r = parse_num(fields.next(), "scrypt r")?;
                let p = parse_num(fields.next(), "scrypt p")?;
                if n < 2 || !n.is_power_of_two() {
                    return Err("scrypt n must be a power of two".to_string());
                }
                Kdf::Scrypt {
                    log_n: n.trailing_zeros() as u8,
                    r,
                    p,
                }
            }
            _ => return Err(format!("unknown method '{method}'")),
        };
        if fields.next().is_some() {
            return Err(format!("unexpected fields in method '{method}'"));
        }

        let expected = hex::decode(hex_hash).map_err(|e| format!("invalid hash: {e}"))?;
        if expected.is_empty() || expected.len() > MAX_KEY_LEN {
            return Err(format!("unexpected hash length {}", expected.len()));
        }

        Ok(Self {
            kdf,
            salt,
            expected,
        })
    }

    /// Re-derive the key from `plaintext` and compare in constant time
    pub fn verify(&self, plaintext: &str) -> Result<bool, String> {
        let mut derived = vec![0u8; self.expected.len()];

        match self.kdf {
            Kdf::Pbkdf2Sha256 { iterations } => {
                pbkdf2_hmac::<Sha256>(
                    plaintext.as_bytes(),
                    self.salt.as_bytes(),
                    iterations,
                    &mut derived,
                );
            }
            Kdf::Scrypt { log_n, r, p } => {
                let params = scrypt::Params::new(log_n, r, p, derived.len())
                    .map_err(|e| format!("invalid scrypt parameters: {e}"))?;
                scrypt::scrypt(
                    plaintext.as_bytes(),
                    self.salt.as_bytes(),
                    &params,
                    &mut derived,
                )
                .map_err(|e| format!("scrypt failed: {e}"))?;
            }
        }

        Ok(constant_time_eq(&derived, &self.expected))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
