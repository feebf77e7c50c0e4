mod common;

use common::*;
use damage_inspect::application::services::PersistenceStatus;
use damage_inspect::domain::{
    damage::{DamageType, PriceEstimate, Severity},
    errors::DomainError,
    identity::{Identity, Role},
};

#[tokio::test]
async fn dedups_thresholds_and_persists() -> anyhow::Result<()> {
    let fx = customer_with_vehicle().await?;
    let detector = StubDetector::new(scenario_detections());
    let svc = service(detector.clone(), fx.store.clone());

    let report = svc.inspect(&fx.identity, png_bytes(160, 120)).await?;

    assert_eq!(detector.calls(), 1);
    assert_eq!(report.records.len(), 2);
    let retak = &report.records[0];
    assert_eq!(retak.damage_type, DamageType::Retak);
    assert_eq!(retak.confidence, 0.9);
    assert_eq!(retak.severity, Severity::RusakSedang);
    assert_eq!(retak.occurrences, 1);
    assert!(matches!(retak.price, PriceEstimate::Range(_)));
    let penyok = &report.records[1];
    assert_eq!(penyok.damage_type, DamageType::Penyok);
    assert_eq!(penyok.confidence, 0.6);
    assert_eq!(penyok.severity, Severity::RusakSedang);

    let metrics = report.evaluation.expect("metrics for non-empty result");
    assert_eq!(metrics.accuracy, 1.0);
    assert_eq!(metrics.f1_score, 1.0);
    assert_eq!(metrics.support, 2);

    assert_eq!((report.image.width, report.image.height), (160, 120));
    assert_eq!(report.persistence, PersistenceStatus::Saved(2));
    assert_eq!(fx.store.count_detection_results(fx.identity.user_id).await?, 2);
    Ok(())
}

#[tokio::test]
async fn no_detections_means_no_rows_and_no_metrics() -> anyhow::Result<()> {
    let fx = customer_with_vehicle().await?;
    let svc = service(StubDetector::new(vec![det(2, 0.2)]), fx.store.clone());

    let report = svc.inspect(&fx.identity, png_bytes(64, 64)).await?;

    assert!(report.records.is_empty());
    assert!(report.evaluation.is_none());
    assert_eq!(report.persistence, PersistenceStatus::Saved(0));
    assert_eq!((report.image.width, report.image.height), (64, 64));
    assert_eq!(fx.store.count_detection_results(fx.identity.user_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn unknown_label_aborts_before_persisting() -> anyhow::Result<()> {
    let fx = customer_with_vehicle().await?;
    let svc = service(StubDetector::new(vec![det(0, 0.9), det(99, 0.8)]), fx.store.clone());

    let err = svc.inspect(&fx.identity, png_bytes(64, 64)).await.unwrap_err();

    assert!(matches!(err, DomainError::UnknownLabel(ref l) if l == "99"));
    assert_eq!(fx.store.count_detection_results(fx.identity.user_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn storage_outage_still_reports_detections() -> anyhow::Result<()> {
    let fx = customer_with_vehicle().await?;
    break_detection_inserts(&fx.store).await?;
    let svc = service(StubDetector::new(scenario_detections()), fx.store.clone());

    let report = svc.inspect(&fx.identity, png_bytes(96, 96)).await?;

    assert_eq!(report.persistence, PersistenceStatus::Failed);
    assert_eq!(report.records.len(), 2);
    assert!(!report.image.base64.is_empty());
    assert_eq!(fx.store.count_detection_results(fx.identity.user_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn user_without_vehicle_skips_inference() -> anyhow::Result<()> {
    let fx = customer_with_vehicle().await?;
    let other = fx.store.create_user("joko", "Joko", Role::Montir).await?;
    let detector = StubDetector::new(scenario_detections());
    let svc = service(detector.clone(), fx.store.clone());

    let err = svc
        .inspect(&Identity { user_id: other, role: Role::Montir }, png_bytes(32, 32))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::VehicleNotFound(id) if id == other));
    assert_eq!(detector.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn undecodable_upload_is_rejected() -> anyhow::Result<()> {
    let fx = customer_with_vehicle().await?;
    let detector = StubDetector::new(scenario_detections());
    let svc = service(detector.clone(), fx.store.clone());

    let err = svc.inspect(&fx.identity, b"definitely not a jpeg".to_vec()).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidImage(_)));

    let err = svc.inspect(&fx.identity, Vec::new()).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidImage(_)));

    assert_eq!(detector.calls(), 0);
    Ok(())
}
