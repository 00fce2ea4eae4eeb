//! End-to-end federation scenarios.

use super::*;
use crate::dataset::{InMemoryDataset, SurveyTable};
use crate::model::{ModelParameters, ParamOps};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Three-feature rows whose label follows a noisy linear rule. The first two
/// rows of every group are forced to classes 0 and 1.
fn synthetic_table(groups: &[(&str, usize)], seed: u64) -> SurveyTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let (mut rows, mut labels, mut keys) = (Vec::new(), Vec::new(), Vec::new());
    for &(group, n) in groups {
        for i in 0..n {
            let x: Vec<f64> = (0..3).map(|_| rng.random_range(-2.0..2.0)).collect();
            let score = 1.5 * x[0] - x[1] + 0.5 * rng.random_range(-1.0..1.0);
            let label = match i {
                0 => 0.0,
                1 => 1.0,
                _ if score > 0.3 => 1.0,
                _ => 0.0,
            };
            rows.push(x);
            labels.push(label);
            keys.push(group.to_string());
        }
    }
    SurveyTable::from_rows(rows, labels, keys).unwrap()
}

fn scenario() -> (Vec<ClientDataset>, GlobalHoldout) {
    let table = synthetic_table(&[("A", 50), ("B", 60), ("C", 5)], 7);
    let outcome = Partitioner::default().partition(&table);
    let holdout = GlobalHoldout::from_table(&table, 0.2, 42).unwrap();
    (outcome.clients, holdout)
}

fn coordinator(federated: FederatedConfig) -> Coordinator {
    Coordinator::new(federated, LocalTrainingConfig::default()).unwrap()
}

fn exact() -> FederatedConfig {
    FederatedConfig::default()
        .with_noise_scale(0.0)
        .with_participation_probability(1.0)
}

#[test]
fn test_small_group_is_excluded() {
    let table = synthetic_table(&[("A", 50), ("B", 60), ("C", 5)], 7);
    let outcome = Partitioner::default().partition(&table);

    assert_eq!(outcome.clients.len(), 2);
    assert_eq!(outcome.client_ids(), vec!["A", "B"]);
    assert_eq!(outcome.dropped_count(), 1);
    assert_eq!(outcome.dropped[0].group(), "C");
}

#[test]
fn test_noiseless_full_round_is_exact_weighted_average() {
    let (clients, holdout) = scenario();
    let result = coordinator(exact().with_num_rounds(1))
        .run_seeded(&clients, &holdout, 1)
        .unwrap();

    let trainer = LocalTrainer::default();
    let locals: Vec<LocalOutcome> = clients.iter().map(|c| trainer.train(c).unwrap()).collect();
    let total: usize = locals.iter().map(|l| l.training_size).sum();
    let expected = locals.iter().fold(ModelParameters::zeros(3), |acc, l| {
        acc.add(&l.params.scale(l.training_size as f64))
    });
    let expected = expected.scale(1.0 / total as f64);

    let got = result.model.params();
    for (g, e) in got.coefficients.iter().zip(expected.coefficients.iter()) {
        assert!((g - e).abs() < 1e-12, "{} vs {}", g, e);
    }
    assert!((got.intercept - expected.intercept).abs() < 1e-12);
}

#[test]
fn test_round_without_participants_keeps_model() {
    let (clients, holdout) = scenario();
    let coord = coordinator(FederatedConfig::default().with_participation_probability(0.0));
    let before = GlobalModel::from_params(ModelParameters::new(ndarray::array![0.1, -0.2, 0.3], 0.05));

    let mut rng = StdRng::seed_from_u64(3);
    let (after, metrics) = coord.round(0, before.clone(), &clients, &holdout, &mut rng).unwrap();

    let bits = |m: &GlobalModel| -> Vec<u64> {
        m.params()
            .coefficients
            .iter()
            .chain(std::iter::once(&m.params().intercept))
            .map(|v| v.to_bits())
            .collect()
    };
    assert_eq!(bits(&after), bits(&before));
    assert_eq!(metrics.participants(), 0);
    assert!(metrics
        .clients
        .iter()
        .all(|c| c.status == ParticipationStatus::Skipped && c.test_accuracy.is_none()));
    assert_eq!(metrics.global_accuracy, before.evaluate(&holdout).0);
}

#[test]
fn test_single_participant_becomes_global_model() {
    let (clients, holdout) = scenario();
    let single = &clients[..1];
    let coord = coordinator(FederatedConfig::default().with_participation_probability(1.0));

    let mut rng = StdRng::seed_from_u64(11);
    let (after, _) = coord
        .round(0, GlobalModel::zeros(3), single, &holdout, &mut rng)
        .unwrap();

    // Replay the round's draws: one participation draw, then one noise seed.
    let mut replay = StdRng::seed_from_u64(11);
    let _: f64 = replay.random();
    let noise_seed: u64 = replay.random();
    let local = LocalTrainer::default().train(&single[0]).unwrap();
    let noised = GaussianPerturbation::new(0.01)
        .unwrap()
        .perturb(&local.params, &mut StdRng::seed_from_u64(noise_seed));

    assert_eq!(after.params(), &noised);
}

#[test]
fn test_runs_are_deterministic() {
    let (clients, holdout) = scenario();
    let coord = coordinator(FederatedConfig::default());
    let a = coord.run_seeded(&clients, &holdout, 42).unwrap();
    let b = coord.run_seeded(&clients, &holdout, 42).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.metrics.len(), 10);
}

#[test]
fn test_rounds_do_not_depend_on_round_count() {
    let (clients, holdout) = scenario();
    let short = coordinator(FederatedConfig::default().with_num_rounds(5))
        .run_seeded(&clients, &holdout, 42)
        .unwrap();
    let long = coordinator(FederatedConfig::default().with_num_rounds(10))
        .run_seeded(&clients, &holdout, 42)
        .unwrap();

    assert_eq!(short.metrics.len(), 5);
    assert_eq!(short.metrics.rounds(), &long.metrics.rounds()[..5]);
}

#[test]
fn test_training_size_is_resampled_row_count() {
    let (clients, holdout) = scenario();
    let result = coordinator(exact().with_num_rounds(2))
        .run_seeded(&clients, &holdout, 5)
        .unwrap();

    for round in result.metrics.rounds() {
        for (record, client) in round.clients.iter().zip(&clients) {
            assert_eq!(record.status, ParticipationStatus::Trained);
            assert_eq!(record.training_size, client.train().rows());
            assert_eq!(record.training_size, 2 * client.train().count_label(1.0));
        }
    }
    assert_eq!(
        result.metrics.contributions()[0].1,
        2 * clients[0].training_size()
    );
}

#[test]
fn test_participation_rate_is_roughly_configured() {
    let (clients, holdout) = scenario();
    let result = coordinator(FederatedConfig::default().with_num_rounds(200).with_noise_scale(0.0))
        .run_seeded(&clients, &holdout, 9)
        .unwrap();

    let flags: usize = result.metrics.participation_counts().iter().sum();
    let rate = flags as f64 / 400.0;
    assert!((rate - 0.8).abs() < 0.08, "participation rate {}", rate);
}

#[test]
fn test_degenerate_client_is_recorded_as_gap() {
    let (mut clients, holdout) = scenario();
    let train = InMemoryDataset::from_rows(vec![vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 1.0]], vec![1.0, 1.0]).unwrap();
    let test = InMemoryDataset::from_rows(vec![vec![0.5, 0.5, 0.5]], vec![0.0]).unwrap();
    clients.push(ClientDataset::new("D", train, test).unwrap());

    let result = coordinator(exact().with_num_rounds(1))
        .run_seeded(&clients, &holdout, 1)
        .unwrap();
    let round = &result.metrics.rounds()[0];

    assert_eq!(round.clients[2].status, ParticipationStatus::Degenerate);
    assert_eq!(round.clients[2].status.flag(), 0);
    assert!(round.clients[2].training_loss.is_none());
    assert_eq!(round.participants(), 2);

    let without = coordinator(exact().with_num_rounds(1))
        .run_seeded(&clients[..2], &holdout, 1)
        .unwrap();
    assert_eq!(result.model, without.model);
}

#[test]
fn test_invalid_inputs_fail_fast() {
    let (clients, holdout) = scenario();
    let coord = coordinator(FederatedConfig::default());

    assert!(matches!(
        coord.run_seeded(&[], &holdout, 1),
        Err(crate::error::FedError::NoClients)
    ));

    let narrow = GlobalHoldout::new(ndarray::array![[0.0], [1.0]], ndarray::array![0.0, 1.0]).unwrap();
    assert!(matches!(
        coord.run_seeded(&clients, &narrow, 1),
        Err(crate::error::FedError::FeatureMismatch { .. })
    ));
}

#[test]
fn test_global_model_round_trips_through_file() -> Result<(), Box<dyn std::error::Error>> {
    let (clients, holdout) = scenario();
    let result = coordinator(FederatedConfig::default().with_num_rounds(2)).run_seeded(&clients, &holdout, 3)?;

    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("global.bin");
    result.model.save_to_file(&path)?;
    assert_eq!(GlobalModel::load_from_file(&path)?, result.model);
    Ok(())
}

#[test]
fn test_simulate_end_to_end() {
    let table = synthetic_table(&[("A", 50), ("B", 60), ("C", 5)], 7);
    let config = SimulationConfig::default()
        .with_federated(FederatedConfig::default().with_num_rounds(3));
    let outcome = simulate(&table, &config).unwrap();

    assert_eq!(outcome.partition.clients.len(), 2);
    assert_eq!(outcome.result.metrics.len(), 3);
    assert_eq!(outcome.report.clients.len(), 2);
    assert!(outcome.report.holdout.accuracy > 0.5);
    assert!(outcome.report.to_json().unwrap().contains("holdout"));
}

#[test]
fn test_simulate_without_surviving_clients() {
    let table = synthetic_table(&[("A", 8), ("B", 9)], 1);
    let result = simulate(&table, &SimulationConfig::default());
    assert!(matches!(result, Err(crate::error::FedError::NoClients)));
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_matches_sequential() {
    let (clients, holdout) = scenario();
    let seq = coordinator(FederatedConfig::default()).run_seeded(&clients, &holdout, 4).unwrap();
    let par = coordinator(FederatedConfig::default().with_parallel_clients(true))
        .run_seeded(&clients, &holdout, 4)
        .unwrap();
    assert_eq!(seq, par);
}
