//! Tests for the elastic IP lifecycle adapter.

use std::time::Duration;

use rstest::{fixture, rstest};
use tokio::time::Instant;

use super::*;
use crate::test_support::{FakeVpc, VpcCall, VpcOperation};
use crate::vpc::{Bandwidth, BandwidthUpdateOpts, PublicIp, PublicIpUpdateOpts};
use crate::wait::WaitError;

#[fixture]
fn config() -> ElasticIpConfig {
    ElasticIpConfig {
        region: None,
        publicip: Some(PublicIpBlock {
            ip_type: String::from("5_bgp"),
            ip_address: None,
            port_id: None,
        }),
        bandwidth: Some(BandwidthBlock {
            name: String::from("eip-bw"),
            size: 10,
            share_type: String::from("PER"),
            charge_mode: None,
        }),
        value_specs: [(String::from("enterprise_project_id"), String::from("0"))]
            .into_iter()
            .collect(),
    }
}

fn resource(fake: &FakeVpc) -> ElasticIpResource<FakeVpc> {
    ElasticIpResource::new(fake.clone(), Timeouts::default())
        .with_poll_intervals(Duration::ZERO, Duration::ZERO)
}

fn seeded() -> FakeVpc {
    let fake = FakeVpc::new();
    fake.seed(
        PublicIp {
            id: String::from("eip-9"),
            status: String::from("ACTIVE"),
            ip_type: String::from("5_bgp"),
            public_ip_address: String::from("192.0.2.9"),
            port_id: Some(String::from("port-1")),
            private_ip_address: Some(String::from("10.0.0.9")),
            tenant_id: String::from("project-1"),
            bandwidth_id: String::from("bw-9"),
            bandwidth_size: 10,
            bandwidth_share_type: String::from("PER"),
            ..PublicIp::default()
        },
        Bandwidth {
            id: String::from("bw-9"),
            name: String::from("eip-bw"),
            size: 10,
            share_type: String::from("PER"),
            charge_mode: String::from("traffic"),
            ..Bandwidth::default()
        },
    );
    fake
}

fn status_error() -> ApiError {
    ApiError::Status {
        url: String::from("https://vpc.example.test/v1/project-1/publicips/eip-9"),
        status: 500,
        body: String::from("internal error"),
    }
}

#[rstest]
#[tokio::test]
async fn create_then_read_returns_configured_values(config: ElasticIpConfig) {
    let fake = FakeVpc::new().activate_after(2);
    let eip = resource(&fake);

    let created = eip.create(&config).await.expect("create should succeed");
    let read = eip
        .read(&created.id)
        .await
        .expect("read should succeed")
        .found()
        .expect("address should exist");

    assert_eq!(created.id, "eip-1");
    assert_eq!(created.status, "ACTIVE");
    assert_eq!(created.value_specs, config.value_specs);
    let bandwidth = config.bandwidth.as_ref().expect("fixture has bandwidth");
    assert_eq!(&read.bandwidth, bandwidth);
    assert_eq!(read.publicip.ip_type, "5_bgp");
    assert_eq!(read.publicip.ip_address.as_deref(), Some("192.0.2.1"));
    assert_eq!(read.bandwidth_id, "bw-1");
    assert_eq!(fake.count(VpcOperation::Apply), 1);
    assert!(fake.count(VpcOperation::GetPublicIp) >= 3);
}

#[rstest]
#[tokio::test]
async fn create_sends_both_blocks_and_value_specs(config: ElasticIpConfig) {
    let fake = FakeVpc::new();
    resource(&fake)
        .create(&config)
        .await
        .expect("create should succeed");

    let Some(VpcCall::Apply(opts)) = fake.calls().into_iter().next() else {
        panic!("first call should allocate");
    };
    assert_eq!(opts.publicip.ip_type, "5_bgp");
    assert_eq!(opts.bandwidth.size, 10);
    assert_eq!(opts.bandwidth.charge_mode, "");
    assert_eq!(opts.value_specs, config.value_specs);
}

#[rstest]
#[tokio::test]
async fn create_accepts_down_as_usable(config: ElasticIpConfig) {
    let fake = FakeVpc::new().settle_as("DOWN");
    let state = resource(&fake)
        .create(&config)
        .await
        .expect("DOWN is a usable state");
    assert_eq!(state.status, "DOWN");
}

#[rstest]
#[tokio::test]
async fn create_error_status_aborts_with_allocated_id(config: ElasticIpConfig) {
    let fake = FakeVpc::new().activate_after(1).settle_as("ERROR");
    let err = resource(&fake)
        .create(&config)
        .await
        .expect_err("ERROR status should abort");

    assert_eq!(
        err,
        ElasticIpError::WaitActive {
            id: String::from("eip-1"),
            source: WaitError::UnexpectedState {
                state: String::from("ERROR"),
                target: String::from("ACTIVE"),
            },
        }
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn create_timeout_reports_allocated_id(config: ElasticIpConfig) {
    let fake = FakeVpc::new().activate_after(u32::MAX);
    let timeouts = Timeouts {
        create: Duration::from_secs(60),
        delete: Duration::from_secs(600),
    };
    let eip = ElasticIpResource::new(fake.clone(), timeouts);
    let started = Instant::now();

    let err = eip
        .create(&config)
        .await
        .expect_err("never-active address should time out");

    assert!(started.elapsed() >= Duration::from_secs(60));
    match err {
        ElasticIpError::WaitActive {
            id,
            source: WaitError::Timeout { last_state, .. },
        } => {
            assert_eq!(id, "eip-1");
            assert_eq!(last_state, "PENDING");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(fake.public_ip("eip-1").is_some());
}

#[rstest]
#[tokio::test]
async fn rejected_allocation_makes_no_further_calls(config: ElasticIpConfig) {
    let fake = FakeVpc::new();
    fake.fail_next(VpcOperation::Apply, status_error());

    let err = resource(&fake)
        .create(&config)
        .await
        .expect_err("allocation should fail");

    assert!(matches!(err, ElasticIpError::Allocate { .. }));
    assert_eq!(fake.calls().len(), 1);
}

#[rstest]
#[tokio::test]
async fn create_without_bandwidth_fails_before_any_call(config: ElasticIpConfig) {
    let fake = FakeVpc::new();
    let input = ElasticIpConfig {
        bandwidth: None,
        ..config
    };

    let err = resource(&fake)
        .create(&input)
        .await
        .expect_err("missing block");

    assert_eq!(err, ElasticIpError::MissingBlock { block: "bandwidth" });
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn read_absent_address_reports_gone() {
    let fake = FakeVpc::new();
    let outcome = resource(&fake).read("eip-404").await.expect("read");
    assert!(outcome.is_gone());
}

#[tokio::test]
async fn read_transport_failure_is_an_error() {
    let fake = seeded();
    fake.fail_next(VpcOperation::GetPublicIp, status_error());

    let err = resource(&fake).read("eip-9").await.expect_err("read");
    assert!(matches!(err, ElasticIpError::Fetch { ref id, .. } if id == "eip-9"));
}

#[tokio::test]
async fn read_bandwidth_failure_names_the_bandwidth() {
    let fake = seeded();
    fake.fail_next(VpcOperation::GetBandwidth, status_error());

    let err = resource(&fake).read("eip-9").await.expect_err("read");
    let ElasticIpError::FetchBandwidth { ref id, ref source } = err else {
        panic!("expected bandwidth fetch error, got {err:?}");
    };
    assert_eq!(id, "bw-9");
    assert_eq!(*source, status_error());
    assert_eq!(fake.count(VpcOperation::GetPublicIp), 1);
}

#[tokio::test]
async fn read_takes_name_and_charge_mode_from_bandwidth() {
    let fake = seeded();
    let state = resource(&fake)
        .read("eip-9")
        .await
        .expect("read")
        .found()
        .expect("seeded address");

    assert_eq!(state.bandwidth.name, "eip-bw");
    assert_eq!(state.bandwidth.charge_mode.as_deref(), Some("traffic"));
    assert_eq!(state.publicip.port_id.as_deref(), Some("port-1"));
    assert_eq!(state.private_ip_address.as_deref(), Some("10.0.0.9"));
}

#[tokio::test]
async fn delete_absent_address_succeeds() {
    let fake = FakeVpc::new();
    resource(&fake)
        .delete("eip-404")
        .await
        .expect("deleting an absent address is a no-op");

    assert_eq!(fake.calls(), vec![VpcCall::GetPublicIp(String::from("eip-404"))]);
}

#[tokio::test]
async fn delete_releases_then_confirms() {
    let fake = seeded();
    resource(&fake).delete("eip-9").await.expect("delete");

    assert_eq!(
        fake.calls(),
        vec![
            VpcCall::GetPublicIp(String::from("eip-9")),
            VpcCall::DeletePublicIp(String::from("eip-9")),
            VpcCall::GetPublicIp(String::from("eip-9")),
        ]
    );
    assert!(fake.public_ip("eip-9").is_none());
    assert!(fake.bandwidth("bw-9").is_none());
}

#[rstest]
#[tokio::test]
async fn delete_reissues_release_until_gone(config: ElasticIpConfig) {
    let fake = FakeVpc::new().release_after(3);
    let eip = resource(&fake);
    let created = eip.create(&config).await.expect("create");

    eip.delete(&created.id).await.expect("delete");

    assert_eq!(fake.count(VpcOperation::DeletePublicIp), 3);
}

#[tokio::test]
async fn delete_failure_is_reported() {
    let fake = seeded();
    fake.fail_next(VpcOperation::DeletePublicIp, status_error());

    let err = resource(&fake).delete("eip-9").await.expect_err("delete");
    assert_eq!(
        err,
        ElasticIpError::Release {
            id: String::from("eip-9"),
            source: WaitError::Refresh(status_error()),
        }
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn delete_waits_for_the_delete_timeout(config: ElasticIpConfig) {
    let fake = FakeVpc::new().release_after(u32::MAX);
    let timeouts = Timeouts {
        create: Duration::from_secs(30),
        delete: Duration::from_secs(120),
    };
    let eip = ElasticIpResource::new(fake.clone(), timeouts);
    let created = eip.create(&config).await.expect("create");

    let started = Instant::now();
    let err = eip.delete(&created.id).await.expect_err("delete never completes");

    assert!(started.elapsed() >= Duration::from_secs(120));
    assert!(matches!(
        err,
        ElasticIpError::Release {
            source: WaitError::Timeout { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn update_without_changes_makes_no_calls() {
    let fake = seeded();
    let eip = resource(&fake);
    let prior = eip.import("eip-9").await.expect("import");
    fake.clear_calls();

    let state = eip
        .update("eip-9", &prior, &prior.to_config())
        .await
        .expect("update");

    assert_eq!(state, prior);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn update_records_desired_value_specs_without_calls() {
    let fake = seeded();
    let eip = resource(&fake);
    let prior = eip
        .import("eip-9")
        .await
        .expect("import")
        .with_value_specs([(String::from("k"), String::from("a"))].into_iter().collect());
    fake.clear_calls();
    let mut desired = prior.to_config();
    desired
        .value_specs
        .insert(String::from("k"), String::from("b"));

    let state = eip.update("eip-9", &prior, &desired).await.expect("update");

    assert_eq!(state.value_specs, desired.value_specs);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn resize_issues_one_bandwidth_update_only() {
    let fake = seeded();
    let eip = resource(&fake);
    let prior = eip.import("eip-9").await.expect("import");
    fake.clear_calls();
    let mut desired = prior.to_config();
    if let Some(bandwidth) = desired.bandwidth.as_mut() {
        bandwidth.size = 20;
    }
    desired
        .value_specs
        .insert(String::from("enterprise_project_id"), String::from("ep-2"));

    let state = eip.update("eip-9", &prior, &desired).await.expect("update");

    let updates: Vec<_> = fake
        .calls()
        .into_iter()
        .filter(|call| {
            matches!(
                call.operation(),
                VpcOperation::UpdateBandwidth | VpcOperation::UpdatePublicIp
            )
        })
        .collect();
    assert_eq!(
        updates,
        vec![VpcCall::UpdateBandwidth {
            id: String::from("bw-9"),
            opts: BandwidthUpdateOpts {
                name: String::from("eip-bw"),
                size: 20,
            },
        }]
    );
    assert_eq!(state.bandwidth.size, 20);
    assert_eq!(state.value_specs, desired.value_specs);
}

#[tokio::test]
async fn unbinding_port_sends_null_port() {
    let fake = seeded();
    let eip = resource(&fake);
    let prior = eip.import("eip-9").await.expect("import");
    let mut desired = prior.to_config();
    if let Some(publicip) = desired.publicip.as_mut() {
        publicip.port_id = None;
    }

    let state = eip.update("eip-9", &prior, &desired).await.expect("update");

    assert!(fake.calls().contains(&VpcCall::UpdatePublicIp {
        id: String::from("eip-9"),
        opts: PublicIpUpdateOpts { port_id: None },
    }));
    assert_eq!(fake.count(VpcOperation::UpdateBandwidth), 0);
    assert_eq!(state.publicip.port_id, None);
}

#[tokio::test]
async fn port_failure_keeps_bandwidth_change() {
    let fake = seeded();
    let eip = resource(&fake);
    let prior = eip.import("eip-9").await.expect("import");
    let mut desired = prior.to_config();
    if let (Some(bandwidth), Some(publicip)) =
        (desired.bandwidth.as_mut(), desired.publicip.as_mut())
    {
        bandwidth.size = 20;
        publicip.port_id = Some(String::from("port-2"));
    }
    fake.fail_next(VpcOperation::UpdatePublicIp, status_error());

    let err = eip
        .update("eip-9", &prior, &desired)
        .await
        .expect_err("port update should fail");

    assert!(matches!(err, ElasticIpError::UpdatePort { ref id, .. } if id == "eip-9"));
    assert_eq!(fake.bandwidth("bw-9").map(|bw| bw.size), Some(20));
}

#[tokio::test]
async fn force_new_change_is_refused_without_calls() {
    let fake = seeded();
    let eip = resource(&fake);
    let prior = eip.import("eip-9").await.expect("import");
    fake.clear_calls();
    let mut desired = prior.to_config();
    if let Some(publicip) = desired.publicip.as_mut() {
        publicip.ip_type = String::from("5_sbgp");
    }

    let err = eip
        .update("eip-9", &prior, &desired)
        .await
        .expect_err("type change needs replacement");

    assert_eq!(
        err,
        ElasticIpError::RequiresReplacement {
            field: "publicip.type"
        }
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn import_absent_address_fails() {
    let fake = FakeVpc::new();
    let err = resource(&fake).import("eip-404").await.expect_err("import");
    assert_eq!(
        err,
        ElasticIpError::Gone {
            id: String::from("eip-404")
        }
    );
}

async fn create_via_trait<L: Lifecycle>(
    lifecycle: &L,
    config: &L::Config,
) -> Result<L::State, L::Error> {
    lifecycle.create(config).await
}

#[rstest]
#[tokio::test]
async fn drives_through_lifecycle_trait(config: ElasticIpConfig) {
    let fake = FakeVpc::new();
    let eip = resource(&fake);

    let created = create_via_trait(&eip, &config)
        .await
        .expect("create via trait");
    assert_eq!(created.id, "eip-1");
    let outcome = Lifecycle::read(&eip, "eip-1").await.expect("read via trait");
    assert!(!outcome.is_gone());
    Lifecycle::delete(&eip, "eip-1").await.expect("delete via trait");
    assert!(Lifecycle::read(&eip, "eip-1").await.expect("read").is_gone());
    assert_eq!(Lifecycle::timeouts(&eip), Timeouts::default());
}
