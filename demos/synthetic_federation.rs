// demos/synthetic_federation.rs
//
// Federates a synthetic treatment-seeking survey across a handful of countries.
// Run with `RUST_LOG=info cargo run --example synthetic_federation`.
use fedsurvey::federated::{simulate, FederatedConfig, SimulationConfig};
use fedsurvey::SurveyTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const COUNTRIES: [(&str, usize); 5] = [
    ("United States", 420),
    ("United Kingdom", 180),
    ("Canada", 90),
    ("Germany", 45),
    ("Bulgaria", 6),
];

/// Eight encoded answers per respondent; the label depends on a few of them.
fn synthetic_survey(seed: u64) -> Result<SurveyTable, fedsurvey::FedError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.8).map_err(|e| fedsurvey::FedError::InvalidParameter(e.to_string()))?;
    let (mut rows, mut labels, mut groups) = (Vec::new(), Vec::new(), Vec::new());

    for (country_idx, &(country, n)) in COUNTRIES.iter().enumerate() {
        let shift = country_idx as f64 * 0.15;
        for _ in 0..n {
            let family_history = rng.random_range(0..2) as f64;
            let work_interfere = rng.random_range(0..4) as f64;
            let benefits = rng.random_range(0..3) as f64;
            let age = rng.random_range(18.0..65.0);
            let mut row = vec![family_history, work_interfere, benefits, age];
            row.extend((0..4).map(|_| rng.random_range(0..3) as f64));

            let score = 1.4 * family_history + 0.7 * work_interfere + 0.3 * benefits - 2.2 - shift
                + noise.sample(&mut rng);
            rows.push(row);
            labels.push(if score > 0.0 { 1.0 } else { 0.0 });
            groups.push(country.to_string());
        }
    }
    SurveyTable::from_rows(rows, labels, groups)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let table = synthetic_survey(7)?;
    let config = SimulationConfig::default().with_federated(
        FederatedConfig::default()
            .with_num_rounds(10)
            .with_noise_scale(0.01)
            .with_participation_probability(0.8),
    );

    let outcome = simulate(&table, &config)?;

    for dropped in &outcome.partition.dropped {
        println!("Excluded: {}", dropped);
    }
    println!("Clients: {:?}", outcome.partition.client_ids());
    for round in outcome.result.metrics.rounds() {
        println!(
            "Round {}: {} participant(s), global accuracy {:.4}",
            round.round + 1,
            round.participants(),
            round.global_accuracy
        );
    }
    for (client, contribution) in outcome.result.metrics.contributions() {
        println!("Contribution of {}: {}", client, contribution);
    }
    println!("{}", outcome.report);
    Ok(())
}
