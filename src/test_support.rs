//! Test-only helpers, the inlined equivalent of the separate `mltd-utils`
//! dev-crate this workspace is grounded in: a colored `env_logger` installer
//! and small randomized-fixture generators seeded from a `rand_xoshiro`
//! generator.

#![cfg(test)]

use rand::{thread_rng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

#[macro_export]
macro_rules! init_test_logger {
    () => {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Debug)
            .try_init();
    };
}

pub(crate) fn rand_bytes(len: usize) -> Vec<u8> {
    let mut rng = Xoshiro256PlusPlus::from_rng(thread_rng()).unwrap();
    let mut buf = vec![0u8; len];
    rng.fill_bytes(&mut buf);
    buf
}

pub(crate) fn rand_range<T, R>(range: R) -> T
where
    T: rand::distributions::uniform::SampleUniform,
    R: rand::distributions::uniform::SampleRange<T>,
{
    let mut rng = Xoshiro256PlusPlus::from_rng(thread_rng()).unwrap();
    rng.gen_range(range)
}
