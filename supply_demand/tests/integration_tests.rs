use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use supply_demand::analysis::{validate_schedules, MarketStructure};
use supply_demand::builder::{build_market, build_market_with_rng};
use supply_demand::equilibrium::{find_equilibrium, total_surplus};
use supply_demand::schedule::schedule_table;
use supply_demand::segments::sample_segments;
use supply_demand::{
    simulate, Limits, MarketError, MarketParams, PricePoint, Role, Segment,
};

const SEED: u64 = 12345;

fn buyers_uniform_segments() -> Vec<Segment> {
    vec![Segment::uniform(20, 30, 50), Segment::uniform(10, 10, 20)]
}

fn sellers_normal_segment() -> Vec<Segment> {
    vec![Segment::normal(25, 15, 35)]
}

fn is_non_increasing(values: &[i64]) -> bool {
    values.windows(2).all(|w| w[0] >= w[1])
}

fn is_non_decreasing(values: &[i64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

#[test]
fn test_uniform_segments_are_inclusive_and_deterministic() {
    let segments = buyers_uniform_segments();
    let values = sample_segments(&segments, &mut StdRng::seed_from_u64(SEED)).unwrap();

    assert_eq!(values.len(), 30);
    assert!(values.iter().all(|v| (10..=50).contains(v)));

    let again = sample_segments(&segments, &mut StdRng::seed_from_u64(SEED)).unwrap();
    assert_eq!(values, again);
}

#[test]
fn test_samples_stay_in_bounds_across_many_seeds() {
    let segments = vec![
        Segment::uniform(50, 0, 3),
        Segment::normal(50, 20, 40),
        Segment::normal(50, 20, 40).with_std_dev(2.0),
        // Wide spread relative to bounds forces heavy clamping
        Segment::normal(50, 10, 12).with_mean(10.0).with_std_dev(25.0),
    ];

    for seed in 0..200 {
        let values = sample_segments(&segments, &mut StdRng::seed_from_u64(seed)).unwrap();
        assert_eq!(values.len(), 200);
        assert!(values[..50].iter().all(|v| (0..=3).contains(v)));
        assert!(values[50..150].iter().all(|v| (20..=40).contains(v)));
        assert!(values[150..].iter().all(|v| (10..=12).contains(v)));
    }
}

#[test]
fn test_heavy_clamping_hits_both_endpoints() {
    let segment = Segment::normal(500, 10, 12).with_std_dev(50.0);
    let values = sample_segments(&[segment], &mut StdRng::seed_from_u64(SEED)).unwrap();
    assert!(values.contains(&10));
    assert!(values.contains(&12));
}

#[test]
fn test_segments_override_simple_params() {
    let params = MarketParams {
        num_buyers: 1,
        num_sellers: 1,
        min_wtp: 0,
        max_wtp: 0,
        min_cost: 0,
        max_cost: 0,
        ..MarketParams::default()
    }
    .with_seed(SEED)
    .with_buyer_segments(buyers_uniform_segments())
    .with_seller_segments(sellers_normal_segment());

    let market = build_market(&params).unwrap();
    assert_eq!(market.demand.len(), 30);
    assert_eq!(market.supply.len(), 25);
    assert!(is_non_increasing(&market.demand));
    assert!(is_non_decreasing(&market.supply));
    assert!(market.supply.iter().all(|v| (15..=35).contains(v)));
}

#[test]
fn test_sort_invariants_hold_for_every_seed() {
    let params = MarketParams::default()
        .with_buyer_segments(buyers_uniform_segments())
        .with_seller_segments(sellers_normal_segment());

    for seed in 0..100 {
        let market = build_market(&params.clone().with_seed(seed)).unwrap();
        assert!(is_non_increasing(&market.demand), "seed {seed}");
        assert!(is_non_decreasing(&market.supply), "seed {seed}");
        assert!(validate_schedules(&market.demand, &market.supply).is_ok());
    }
}

#[test]
fn test_different_seeds_change_the_market() {
    let a = build_market(&MarketParams::default().with_seed(SEED)).unwrap();
    let b = build_market(&MarketParams::default().with_seed(SEED + 1)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_shared_rng_ties_seller_draws_to_buyer_consumption() {
    // Same sellers, different buyer counts: seller draws shift with buyer consumption
    let small = MarketParams {
        num_buyers: 5,
        ..MarketParams::default()
    };
    let large = MarketParams {
        num_buyers: 50,
        ..MarketParams::default()
    };

    let a = build_market_with_rng(&small, &mut StdRng::seed_from_u64(SEED)).unwrap();
    let b = build_market_with_rng(&large, &mut StdRng::seed_from_u64(SEED)).unwrap();
    assert_ne!(a.supply, b.supply);
}

#[test]
fn test_equilibrium_literal_cases() {
    let cases: [(&[i64], &[i64], usize, f64); 6] = [
        (&[40, 35, 30, 20], &[10, 15, 18, 22], 3, 19.0),
        (&[50, 40, 30], &[5, 10, 20], 3, 25.0),
        (&[10, 9], &[12, 13], 0, 11.0),
        (&[10, 8], &[], 0, 10.0),
        (&[], &[5, 7], 0, 5.0),
        (&[], &[], 0, 0.0),
    ];

    for (demand, supply, quantity, price) in cases {
        let eq = find_equilibrium(demand, supply);
        assert_eq!(eq.quantity, quantity, "demand={demand:?} supply={supply:?}");
        assert_relative_eq!(eq.price, price);
    }
}

#[test]
fn test_surplus_literal_cases() {
    assert_relative_eq!(total_surplus(&[10, 8, 6], &[3, 5, 7], 3), 9.0);
    assert_relative_eq!(total_surplus(&[10, 8, 6], &[3, 5, 7], 0), 0.0);
    assert_relative_eq!(total_surplus(&[30, 25], &[10, 20], 999), 25.0);
    assert_relative_eq!(
        total_surplus(&[50, 40, 30, 20], &[10, 15, 18, 22], 3),
        ((50 - 10) + (40 - 15) + (30 - 18)) as f64
    );
}

#[test]
fn test_surplus_at_matched_quantity_is_never_negative() {
    let params = MarketParams::default()
        .with_buyer_segments(vec![Segment::normal(40, 5, 60)])
        .with_seller_segments(vec![Segment::uniform(40, 10, 70)]);

    for seed in 0..100 {
        let market = build_market(&params.clone().with_seed(seed)).unwrap();
        let eq = find_equilibrium(&market.demand, &market.supply);
        let surplus = total_surplus(&market.demand, &market.supply, eq.quantity as i64);
        assert!(surplus >= 0.0, "seed {seed}: surplus {surplus}");
    }
}

#[test]
fn test_schedule_table_literal_cases() {
    assert_eq!(
        schedule_table(&[40, 35, 30]),
        vec![
            PricePoint { quantity: 1, price: 40 },
            PricePoint { quantity: 2, price: 35 },
            PricePoint { quantity: 3, price: 30 },
        ]
    );
    assert!(schedule_table(&[]).is_empty());
}

#[test]
fn test_infeasible_legacy_params_fail_before_sampling() {
    let params = MarketParams {
        min_wtp: 5,
        max_wtp: 10,
        min_cost: 11,
        max_cost: 20,
        ..MarketParams::default()
    }
    .with_seed(SEED);

    assert_eq!(
        simulate(&params, &Limits::default()),
        Err(MarketError::Infeasible {
            max_wtp: 10,
            min_cost: 11
        })
    );
}

#[test]
fn test_infeasible_segments_fall_back_to_no_trade() {
    let params = MarketParams::default()
        .with_seed(SEED)
        .with_buyer_segments(vec![Segment::uniform(5, 1, 10)])
        .with_seller_segments(vec![Segment::uniform(5, 20, 30)]);

    let outcome = simulate(&params, &Limits::default()).unwrap();
    assert_eq!(outcome.equilibrium.quantity, 0);
    let best_wtp = outcome.demand[0].price;
    let best_cost = outcome.supply[0].price;
    assert_relative_eq!(
        outcome.equilibrium.price,
        (best_wtp + best_cost) as f64 / 2.0
    );
    assert_relative_eq!(outcome.surplus.total_max, 0.0);
}

#[test]
fn test_zero_participants_in_segments() {
    let params = MarketParams::default()
        .with_buyer_segments(vec![Segment::uniform(0, 10, 20)])
        .with_seller_segments(vec![Segment::uniform(1, 5, 15)]);

    let err = simulate(&params, &Limits::default()).unwrap_err();
    assert_eq!(err, MarketError::EmptyPopulation { role: Role::Buyer });
    assert!(err.to_string().contains("zero participants"));
}

#[test]
fn test_simulate_matches_manual_pipeline() {
    let params = MarketParams::default()
        .with_seed(SEED)
        .with_buyer_segments(vec![Segment::uniform(6, 30, 40), Segment::uniform(4, 20, 29)])
        .with_seller_segments(vec![Segment::uniform(5, 10, 15), Segment::uniform(5, 16, 25)]);

    let outcome = simulate(&params, &Limits::default()).unwrap();
    let market = build_market(&params).unwrap();
    let eq = find_equilibrium(&market.demand, &market.supply);

    assert_eq!(outcome.demand, schedule_table(&market.demand));
    assert_eq!(outcome.supply, schedule_table(&market.supply));
    assert_eq!(outcome.equilibrium, eq);
    assert_relative_eq!(
        outcome.surplus.total_max,
        total_surplus(&market.demand, &market.supply, eq.quantity as i64)
    );

    let structure = MarketStructure::analyze(&market.demand, &market.supply);
    assert_eq!(structure.potential_trades, 10);
    assert_eq!(structure.equilibrium, Some(eq));
}

#[test]
fn test_params_from_json_wire_format() {
    let json = r#"{
        "seed": 123,
        "buyer_segments": [
            {"n": 6, "p_min": 30, "p_max": 40},
            {"n": 4, "p_min": 20, "p_max": 29}
        ],
        "seller_segments": [
            {"n": 5, "p_min": 10, "p_max": 15, "dist": "normal"},
            {"n": 5, "p_min": 16, "p_max": 25}
        ]
    }"#;
    let params: MarketParams = serde_json::from_str(json).unwrap();
    assert_eq!(params.seed, Some(123));
    assert_eq!(params.num_buyers, 10);

    let outcome = simulate(&params, &Limits::default()).unwrap();
    assert_eq!(outcome.demand.len(), 10);
    assert_eq!(outcome.supply.len(), 10);
}

#[test]
fn test_limits_are_injected_not_hard_coded() {
    let params = MarketParams {
        num_buyers: 150,
        ..MarketParams::default()
    }
    .with_seed(SEED);

    assert!(matches!(
        simulate(&params, &Limits::default()),
        Err(MarketError::Limit { role: Role::Buyer, .. })
    ));

    let generous = Limits {
        max_buyers: 200,
        ..Limits::default()
    };
    let outcome = simulate(&params, &generous).unwrap();
    assert_eq!(outcome.demand.len(), 150);
}
