use digits::{BestEntry, BestModels, Topology};

fn entry(id: usize, accuracy: f32) -> BestEntry {
    BestEntry {
        key: format!("combination-{}", id),
        epoch: 1,
        accuracy,
        model: Topology::new(Vec::new()),
    }
}

#[test]
fn test_capacity_and_ordering_hold_for_random_offers() {
    for seed in 0..20u64 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let capacity = rng.usize(1..6);
        let mut best = BestModels::new(capacity).unwrap();
        let mut discarded: Vec<f32> = Vec::new();

        for id in 0..200 {
            // Coarse scores so ties are frequent
            let accuracy = rng.u8(0..20) as f32 * 5.0;
            let full = best.len() == capacity;
            let evicted = if full { best.entries().first().map(|e| e.accuracy) } else { None };

            if best.offer(entry(id, accuracy)) {
                discarded.extend(evicted);
            } else {
                discarded.push(accuracy);
            }

            assert!(best.len() <= capacity);
            let scores: Vec<f32> = best.entries().iter().map(|e| e.accuracy).collect();
            assert!(scores.windows(2).all(|w| w[0] <= w[1]), "not ascending: {:?}", scores);

            if best.len() == capacity {
                let lowest = scores[0];
                assert!(discarded.iter().all(|&d| d <= lowest), "seed {}: {:?} vs {}", seed, discarded, lowest);
            }
        }
    }
}

#[test]
fn test_first_seen_wins_ties() {
    let mut best = BestModels::new(2).unwrap();
    best.offer(entry(0, 90.0));
    best.offer(entry(1, 90.0));
    assert!(!best.offer(entry(2, 90.0)));

    // A better entry evicts the later of the two tied entries
    assert!(best.offer(entry(3, 95.0)));
    let keys: Vec<_> = best.entries().iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["combination-0", "combination-3"]);
}

#[test]
fn test_retained_snapshot_survives_later_mutation() {
    let mut live = Topology::for_hidden_layers(&[3]).unwrap();
    let mut best = BestModels::new(1).unwrap();
    best.offer(BestEntry {
        key: "live".to_string(),
        epoch: 1,
        accuracy: 10.0,
        model: live.clone(),
    });

    if let digits::Layer::Bias { bias } = &mut live.layers[1] {
        bias.fill(42.0);
    }

    assert_ne!(best.entries()[0].model, live);
}
