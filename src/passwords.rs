use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to parse password hash: {0}")]
    InvalidHash(String),

    #[error("Invalid argon2 parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, PasswordError>;

/// A freshly hashed password and the salt stored next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub ok: bool,
    /// The stored hash is legacy or uses outdated parameters.
    pub needs_rehash: bool,
}

#[derive(Clone)]
pub struct Passwords<'a> {
    a2: Argon2<'a>,
    min_len: usize,
    max_len: usize,
}

impl<'a> Passwords<'a> {
    pub fn new(mem_kib: u32, iters: u32, lanes: u32) -> Result<Self> {
        let params = Params::new(mem_kib, iters, lanes, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let a2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(Self {
            a2,
            min_len: 8,
            max_len: 512,
        })
    }

    /// Production parameters: 64 MiB, 2 passes, 1 lane.
    pub fn standard() -> Self {
        Self {
            a2: Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                Params::new(65536, 2, 1, None).unwrap_or_default(),
            ),
            min_len: 8,
            max_len: 512,
        }
    }

    pub fn hash(&self, password: &str) -> Result<HashedPassword> {
        self.guard_length(password)?;
        let salt = SaltString::generate(&mut OsRng);
        let phc = self
            .a2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(HashedPassword {
            hash: phc.to_string(),
            salt: salt.as_str().to_string(),
        })
    }

    /// Check `password` against a stored PHC string, or against a legacy
    /// `md5(password + salt)` hex digest. Legacy matches always need a rehash.
    pub fn verify(&self, password: &str, pw_hash: &str, salt: &str) -> Result<Verification> {
        if is_legacy_digest(pw_hash) {
            let ok = legacy_digest(password, salt).eq_ignore_ascii_case(pw_hash);
            return Ok(Verification {
                ok,
                needs_rehash: ok,
            });
        }

        let parsed =
            PasswordHash::new(pw_hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
        let ok = self
            .a2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        let needs_rehash = ok
            && !(parsed.algorithm == Algorithm::Argon2id.ident()
                && parsed.version == Some(Version::V0x13.into())
                && parsed.params.get_decimal("m") == Some(self.a2.params().m_cost())
                && parsed.params.get_decimal("t") == Some(self.a2.params().t_cost())
                && parsed.params.get_decimal("p") == Some(self.a2.params().p_cost()));
        Ok(Verification { ok, needs_rehash })
    }

    /// Spend the same Argon2 work as `verify` for a user that does not exist,
    /// so both failures take equally long. Never succeeds.
    pub fn verify_missing(&self, password: &str) -> Verification {
        let salt = SaltString::generate(&mut OsRng);
        let _ = self.a2.hash_password(password.as_bytes(), &salt);
        Verification {
            ok: false,
            needs_rehash: false,
        }
    }

    fn guard_length(&self, s: &str) -> Result<()> {
        let len = s.chars().count();
        if len < self.min_len || len > self.max_len {
            return Err(PasswordError::HashingFailed(
                "password length out of bounds".into(),
            ));
        }
        Ok(())
    }
}

fn is_legacy_digest(pw_hash: &str) -> bool {
    pw_hash.len() == 32 && pw_hash.bytes().all(|b| b.is_ascii_hexdigit())
}

fn legacy_digest(password: &str, salt: &str) -> String {
    format!("{:x}", md5::compute(format!("{password}{salt}")))
}
