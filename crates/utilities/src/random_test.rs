use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Runs the given test `iterations` times with a random number generator.
///
/// The seed is printed so that a failing run can be reproduced by setting the
/// `WFST_SEED` environment variable.
pub fn random_test<F>(iterations: usize, mut test: F)
where
    F: FnMut(&mut StdRng),
{
    let seed: u64 = match std::env::var("WFST_SEED") {
        Ok(value) => value.parse().expect("WFST_SEED should be a number"),
        Err(_) => rand::random(),
    };

    info!("random_test seed: {seed}");
    println!("random_test seed: {seed}");

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..iterations {
        test(&mut rng);
    }
}
