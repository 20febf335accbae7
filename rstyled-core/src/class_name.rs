//! Generated class names.
//!
//! Names have form `<prefix>-<ident>`, where ident is drawn from a ChaCha8 stream.
//! Each generator remembers names it issued and never returns one twice.
use std::{
    collections::HashSet,
    sync::atomic::{AtomicU64, Ordering},
};

use rand::{distributions::Distribution, seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::registry::RegistryOptions;

const DEFAULT_SEED: u64 = 0xdede_dede_dede_dede;

// Generators created without explicit seed get different streams,
// so two registries in one document don't hand out the same names.
static GENERATORS_CREATED: AtomicU64 = AtomicU64::new(0);

struct CssIdentChars;
impl Distribution<char> for CssIdentChars {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        const ALLOWED_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        *ALLOWED_CHARS.choose(rng).unwrap_or(&b'x') as char
    }
}

#[derive(Debug)]
pub struct ClassNameGenerator {
    rng: ChaCha8Rng,
    prefix: String,
    ident_len: usize,
    issued: HashSet<String>,
}

impl ClassNameGenerator {
    pub fn new(options: &RegistryOptions) -> Self {
        let seed = options.seed.unwrap_or_else(|| {
            let index = GENERATORS_CREATED.fetch_add(1, Ordering::Relaxed);
            DEFAULT_SEED ^ index.wrapping_mul(0x9e37_79b9_7f4a_7c15)
        });
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            prefix: options.class_prefix.to_string(),
            ident_len: options.ident_len.max(1),
            issued: HashSet::new(),
        }
    }

    /// Returns class name that was not returned by this generator before.
    pub fn next_name(&mut self) -> String {
        loop {
            let ident = (&mut self.rng)
                .sample_iter(CssIdentChars)
                .take(self.ident_len)
                .collect::<String>();
            let name = format!("{}-{}", self.prefix, ident);
            if self.issued.insert(name.clone()) {
                return name;
            }
            log::trace!("class name {name} collided, drawing another one");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> ClassNameGenerator {
        ClassNameGenerator::new(&RegistryOptions {
            seed: Some(seed),
            ..Default::default()
        })
    }

    #[test]
    fn check_name_format() {
        let name = seeded(1).next_name();
        let (prefix, ident) = name.split_once('-').unwrap();
        assert_eq!(prefix, "css");
        assert_eq!(ident.len(), 7);
        assert!(ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn check_seed_is_deterministic() {
        let mut first = seeded(42);
        let mut second = seeded(42);
        for _ in 0..10 {
            assert_eq!(first.next_name(), second.next_name());
        }
    }

    #[test]
    fn check_names_are_unique() {
        // Single char ident has only 36 variants, so collisions are guaranteed.
        let mut generator = ClassNameGenerator::new(&RegistryOptions {
            class_prefix: "x".into(),
            ident_len: 1,
            seed: Some(7),
        });
        let names = (0..36).map(|_| generator.next_name()).collect::<HashSet<_>>();
        assert_eq!(names.len(), 36);
    }

    #[test]
    fn check_unseeded_generators_differ() {
        let options = RegistryOptions::default();
        let first = ClassNameGenerator::new(&options).next_name();
        let second = ClassNameGenerator::new(&options).next_name();
        assert_ne!(first, second);
    }
}
