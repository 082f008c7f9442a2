use hashchain_core::{pow, Block, Chain, Check, MiningStrategy};
use rand::{seq::SliceRandom, Rng};

fn build_chain(difficulty: u32, payloads: &[&str]) -> Chain {
    let mut chain = Chain::new(difficulty).expect("difficulty in range");
    for payload in payloads {
        chain.add_block(*payload);
    }
    chain
}

#[test]
fn test_mined_blocks_meet_difficulty() {
    for difficulty in 0..=3 {
        let chain = build_chain(difficulty, &["x", "y"]);
        let target = "0".repeat(difficulty as usize);
        for block in chain.blocks().iter().skip(1) {
            assert!(block.hash_hex().starts_with(&target));
            assert!(pow::meets_difficulty(&block.hash, difficulty));
        }
        assert!(chain.is_chain_valid());
    }
}

#[test]
fn test_sequentially_built_chain_is_valid() {
    let mut rng = rand::thread_rng();
    let payloads: Vec<String> = (0..8)
        .map(|i| format!("payload-{i}-{}", rng.gen::<u32>()))
        .collect();
    let mut chain = Chain::new(1).unwrap();
    for payload in &payloads {
        let block = chain.add_block(payload.as_str());
        assert_eq!(&block.payload, payload);
    }
    assert_eq!(chain.len(), payloads.len() + 1);
    assert!(chain.validate().is_ok());
}

#[test]
fn test_links_follow_previous_hashes() {
    let chain = build_chain(2, &["A", "B", "C"]);
    let blocks = chain.blocks();
    assert_eq!(blocks[1].previous_hash, blocks[0].hash);
    assert_eq!(blocks[2].previous_hash, blocks[1].hash);
    assert_eq!(blocks[3].previous_hash, blocks[2].hash);
    assert_eq!(chain.latest().payload, "C");
    assert_eq!(chain.get(2).map(|b| b.payload.as_str()), Some("B"));
    assert!(chain.get(4).is_none());
}

#[test]
fn test_tampering_any_field_is_detected_at_that_index() {
    let mutations: [fn(&mut Block); 5] = [
        |b| b.payload.push_str("-tampered"),
        |b| b.nonce = b.nonce.wrapping_add(1),
        |b| b.index += 100,
        |b| b.timestamp += 1,
        |b| b.previous_hash[0] ^= 0xff,
    ];
    let mut rng = rand::thread_rng();
    let pristine = build_chain(1, &["a", "b", "c", "d", "e"]);

    for mutate in mutations {
        let target = rng.gen_range(1..pristine.len());
        let mut chain = pristine.clone();
        mutate(&mut chain.blocks_mut()[target]);

        let violation = chain.validate().expect_err("tampering must be detected");
        assert!(!chain.is_chain_valid());
        assert_eq!(violation.index(), target);
        assert_eq!(violation.check(), Check::HashConsistency);
    }
}

#[test]
fn test_swapped_blocks_break_first_link() {
    let mut chain = build_chain(1, &["A", "B", "C"]);
    chain.blocks_mut().swap(1, 2);
    let violation = chain.validate().unwrap_err();
    assert_eq!(violation.index(), 1);
    assert_eq!(violation.check(), Check::PreviousHashLink);
}

#[test]
fn test_swapping_random_pair_is_detected() {
    let mut rng = rand::thread_rng();
    let pristine = build_chain(1, &["a", "b", "c", "d", "e", "f"]);
    let mut indices: Vec<usize> = (1..pristine.len()).collect();
    indices.shuffle(&mut rng);
    let (i, j) = (indices[0].min(indices[1]), indices[0].max(indices[1]));

    let mut chain = pristine.clone();
    chain.blocks_mut().swap(i, j);
    let violation = chain.validate().unwrap_err();
    assert_eq!(violation.index(), i);
    assert_eq!(violation.check(), Check::PreviousHashLink);
}

#[test]
fn test_scenario_tampered_payload() {
    let mut chain = build_chain(2, &["A", "B", "C"]);
    assert_eq!(chain.len(), 4);
    assert!(chain.is_chain_valid());

    chain.blocks_mut()[2].payload = "TAMPERED".to_string();
    assert!(!chain.is_chain_valid());
    assert_eq!(chain.validate().unwrap_err().index(), 2);
}

#[test]
fn test_zero_difficulty_uses_first_nonce() {
    let mut chain = Chain::new(0).unwrap();
    for payload in ["p", "q", "r"] {
        let block = chain.add_block(payload);
        assert_eq!(block.nonce, 0);
        assert!(block.is_consistent());
    }
    assert!(chain.is_chain_valid());
}

#[test]
fn test_parallel_strategy_builds_valid_chain() {
    let mut chain = Chain::with_strategy(3, MiningStrategy::Parallel).unwrap();
    for payload in ["A", "B", "C"] {
        chain.add_block(payload);
    }
    for block in chain.blocks().iter().skip(1) {
        assert!(block.hash_hex().starts_with("000"));
    }
    assert!(chain.is_chain_valid());
}

#[test]
fn test_chain_json_round_trip_keeps_validity() {
    let mut chain = build_chain(2, &["A", "B"]);
    let json = serde_json::to_string_pretty(&chain).unwrap();
    let restored: Chain = serde_json::from_str(&json).unwrap();
    assert!(restored.is_chain_valid());

    chain.blocks_mut()[1].payload = "B'".into();
    let json = serde_json::to_string(&chain).unwrap();
    let restored: Chain = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.validate().unwrap_err().index(), 1);
}
