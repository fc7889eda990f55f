// tests/scenarios.rs
//
// End-to-end product scenarios through `AnalysisSession`, with the remote
// scorer disabled or failing so the local engine decides.

use std::sync::Arc;
use std::time::Duration;

use ecolojia_nova::analyze::remote::{DisabledScorer, FailingScorer};
use ecolojia_nova::result::ResultSource;
use ecolojia_nova::{AnalysisError, AnalysisSession, RemoteError, SessionConfig};

fn session_without_remote() -> AnalysisSession {
    AnalysisSession::new(
        Arc::new(FailingScorer::new(RemoteError::Network("connection refused".into()))),
        SessionConfig {
            fallback_delay: Duration::ZERO,
            ..Default::default()
        },
    )
}

const COCA: &str = "Eau gazéifiée, sucre, sirop de glucose-fructose, arôme naturel de cola, \
                    colorant E150d, acidifiant E338, édulcorant E952, conservateur E211";

#[tokio::test]
async fn soda_with_unreachable_remote_is_ultra_processed() {
    let s = session_without_remote();
    let r = s
        .analyze_product("Coca-Cola Original", COCA)
        .await
        .expect("fallback must resolve");

    assert_eq!(r.nova_group, 4);
    assert!(r.is_processed);
    assert_eq!(r.source, ResultSource::Local);
    assert!(r.additives.total >= 4, "got {:?}", r.additives);
    for code in ["E150d", "E338", "E952", "E211"] {
        assert!(
            r.additives.detected.iter().any(|a| a.code == code),
            "{code} not detected"
        );
    }
    assert!(r.health_score < 30, "score {} should be well below 50", r.health_score);
    assert!(r.reasoning.contains("NOVA 4"));
}

#[tokio::test]
async fn single_natural_ingredient_is_unprocessed() {
    let s = session_without_remote();
    let r = s
        .analyze_product("Miel de Lavande", "Miel 100% naturel")
        .await
        .unwrap();

    assert_eq!(r.nova_group, 1);
    assert_eq!(r.additives.total, 0);
    assert!(r.health_score >= 85, "score {}", r.health_score);
    assert!(!r.is_processed);
}

#[tokio::test]
async fn empty_product_name_is_rejected() {
    let s = session_without_remote();
    let err = s.analyze_product("", "sucre, sel").await.unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
    assert_eq!(err.code(), "invalid_input");
    assert!(s.current_analysis().is_none());
}

#[tokio::test]
async fn culinary_ingredients_only_are_group_two() {
    let s = session_without_remote();
    let r = s
        .analyze_product("Assaisonnement", "huile d'olive, sel marin")
        .await
        .unwrap();
    assert_eq!(r.nova_group, 2);
    assert!(!r.is_processed);
}

#[tokio::test]
async fn bread_with_two_processed_markers_is_group_three() {
    let s = session_without_remote();
    let r = s
        .analyze_product("Pain", "farine de blé, eau, levure, sel")
        .await
        .unwrap();
    assert_eq!(r.nova_group, 3);
    assert!(r.is_processed);
    assert_eq!(r.additives.total, 0);
}

#[tokio::test]
async fn disabled_remote_also_degrades_gracefully() {
    let s = AnalysisSession::new(
        Arc::new(DisabledScorer),
        SessionConfig {
            fallback_delay: Duration::ZERO,
            ..Default::default()
        },
    );
    let r = s.analyze_product("Yaourt", "lait, ferments lactiques").await.unwrap();
    assert_eq!(r.source, ResultSource::Local);
    assert!(!r.recommendations.is_empty());
    assert!(r.check_invariants().is_ok());
    assert_eq!(s.current_analysis().as_ref(), Some(&r));
}
