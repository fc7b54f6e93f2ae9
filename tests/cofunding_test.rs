use cofund::{
    analyze_cofunding, analyze_grants, AnalysisConfig, AnalysisError, BundlingResult, CoFundingOptions, GrantRecord,
    GrantsByFoundation, Priority, RecommendOptions, RecommendationType,
};

fn grants(rows: Vec<(&str, Vec<&str>)>) -> GrantsByFoundation {
    let mut grants = GrantsByFoundation::new();
    for (foundation, recipients) in rows {
        let records = grants.entry(foundation.to_string()).or_default();
        for recipient in recipients {
            records.push(
                GrantRecord::new(foundation, format!("{} Foundation", foundation), recipient, 1_000.0, 2023)
                    .with_purpose("youth literacy"),
            );
        }
    }
    grants
}

/// P, Q and R fund the same four recipients; S and T share two others; U barely overlaps.
fn clustered() -> BundlingResult {
    let rows = vec![
        ("P", vec!["G1", "G2", "G3", "G4"]),
        ("Q", vec!["G1", "G2", "G3", "G4"]),
        ("R", vec!["G1", "G2", "G3", "G4"]),
        ("S", vec!["H1", "H2"]),
        ("T", vec!["H1", "H2"]),
        ("U", vec!["G1", "H1", "V1", "V2", "V3", "V4"]),
    ];
    analyze_grants(grants(rows), 2, &AnalysisConfig::default()).unwrap()
}

fn options(threshold: f64, max: usize, known: &[&str]) -> CoFundingOptions {
    CoFundingOptions {
        similarity_threshold: threshold,
        max_recommendations: max,
        known_foundations: known.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn test_peer_groups_follow_shared_portfolios() {
    let config = AnalysisConfig::default();
    let result = analyze_cofunding(&clustered(), &options(0.3, 10, &[]), &config).unwrap();

    assert_eq!(result.network_stats.node_count, 5);
    assert_eq!(result.network_stats.edge_count, 4);
    assert_eq!(result.network_stats.component_count, 2);
    assert!(!result.network_stats.is_connected);
    assert!(result.network_stats.diameter.is_none());

    let groups: Vec<&Vec<String>> = result.peer_groups.iter().map(|g| &g.foundations).collect();
    assert_eq!(groups, vec![&vec!["P", "Q", "R"], &vec!["S", "T"]]);
    assert_eq!(result.peer_groups[0].cluster_density, 1.0);

    // U's pairs fall below the threshold but remain in the full similarity list
    assert!(result.similarities.iter().any(|s| s.overlap.involves("U")));
    assert!(result.above_threshold.iter().all(|s| !s.overlap.involves("U")));
}

#[test]
fn test_recommendations_capped_and_ranked() {
    let config = AnalysisConfig::default();
    let bundling = clustered();

    for max in [0, 1, 3, 5, 50] {
        let result = analyze_cofunding(&bundling, &options(0.3, max, &[]), &config).unwrap();
        assert!(result.recommendations.len() <= max);

        for pair in result.recommendations.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
            if pair[0].priority == pair[1].priority {
                assert!(pair[0].confidence >= pair[1].confidence);
            }
        }
    }

    let full = analyze_cofunding(&bundling, &options(0.3, 50, &[]), &config).unwrap();
    let peers = full
        .recommendations
        .iter()
        .filter(|r| r.recommendation_type == RecommendationType::PeerFunder)
        .count();
    let members: Vec<&str> = full
        .recommendations
        .iter()
        .filter(|r| r.recommendation_type == RecommendationType::ClusterMember)
        .map(|r| r.foundation_id.as_str())
        .collect();
    assert_eq!(peers, 4);
    // Only the three-member group qualifies, at density 1.0 x 0.8
    assert_eq!(members, vec!["P", "Q", "R"]);
    assert!(full
        .recommendations
        .iter()
        .filter(|r| r.recommendation_type == RecommendationType::ClusterMember)
        .all(|r| r.priority == Priority::Medium && (r.confidence - 0.8).abs() < 1e-9));
}

#[test]
fn test_known_foundations_anchor_recommendations() {
    let config = AnalysisConfig::default();
    let result = analyze_cofunding(&clustered(), &options(0.3, 10, &["P"]), &config).unwrap();

    assert!(!result.recommendations.is_empty());
    for rec in &result.recommendations {
        assert_ne!(rec.foundation_id, "P");
        assert_eq!(rec.justified_by, vec!["P"]);
    }
    let ids: Vec<(&str, Priority)> = result
        .recommendations
        .iter()
        .map(|r| (r.foundation_id.as_str(), r.priority))
        .collect();
    assert_eq!(
        ids,
        vec![
            ("Q", Priority::High),
            ("R", Priority::High),
            ("Q", Priority::Medium),
            ("R", Priority::Medium),
        ]
    );
}

#[test]
fn test_high_threshold_yields_empty_network() {
    let rows = vec![("W1", vec!["K1", "K2", "K3"]), ("W2", vec!["K3", "K4", "K5"])];
    let bundling = analyze_grants(grants(rows), 2, &AnalysisConfig::default()).unwrap();
    let result = analyze_cofunding(&bundling, &options(0.9, 10, &[]), &AnalysisConfig::default()).unwrap();

    assert_eq!(result.similarities.len(), 1);
    assert!(result.above_threshold.is_empty());
    assert!(result.peer_groups.is_empty());
    assert!(result.recommendations.is_empty());
    assert_eq!(result.network_stats.node_count, 0);
    assert!(result.network.nodes.is_empty());
}

#[test]
fn test_network_handle_reused_across_requesters() {
    let bundling = clustered();
    let config = AnalysisConfig::default();
    let similarities = analyze_cofunding(&bundling, &options(0.3, 10, &[]), &config)
        .unwrap()
        .above_threshold;
    let network = cofund::network::build_network(
        &similarities,
        0.3,
        cofund::network::NetworkSettings {
            community_seed: config.community_seed,
            bridge_betweenness_threshold: config.bridge_betweenness_threshold,
        },
    );

    assert_eq!(network.neighbors("S"), vec!["T"]);
    let for_s = network.recommend(
        &bundling.bundled_grantees,
        &RecommendOptions {
            known_foundations: ["S".to_string()].into_iter().collect(),
            ..RecommendOptions::default()
        },
    );
    let peers: Vec<&str> = for_s
        .iter()
        .filter(|r| r.recommendation_type == RecommendationType::PeerFunder)
        .map(|r| r.foundation_id.as_str())
        .collect();
    assert_eq!(peers, vec!["T"]);
    // The P/Q/R group is still suggested, with no known member behind it
    assert!(for_s
        .iter()
        .filter(|r| r.recommendation_type == RecommendationType::ClusterMember)
        .all(|r| r.justified_by.is_empty()));

    let for_q = network.recommend(
        &bundling.bundled_grantees,
        &RecommendOptions {
            known_foundations: ["Q".to_string()].into_iter().collect(),
            ..RecommendOptions::default()
        },
    );
    assert!(for_q.iter().all(|r| r.foundation_id == "P" || r.foundation_id == "R"));
}

#[test]
fn test_negative_threshold_rejected() {
    let err = analyze_cofunding(&clustered(), &options(-0.1, 10, &[]), &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidParameter { name: "similarity_threshold", .. }));
}
