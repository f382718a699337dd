//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::ffi::OsString;
use std::future::ready;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::vpc::{
    ApiError, ApiFuture, ApplyOpts, Bandwidth, BandwidthUpdateOpts, PublicIp, PublicIpUpdateOpts,
    VpcApi,
};

/// Operation kinds understood by [`FakeVpc`], used for failure injection.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum VpcOperation {
    /// `POST publicips`.
    Apply,
    /// `GET publicips/{id}`.
    GetPublicIp,
    /// `PUT publicips/{id}`.
    UpdatePublicIp,
    /// `DELETE publicips/{id}`.
    DeletePublicIp,
    /// `GET bandwidths/{id}`.
    GetBandwidth,
    /// `PUT bandwidths/{id}`.
    UpdateBandwidth,
}

/// Records a single request made through [`FakeVpc`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VpcCall {
    /// Allocation with the submitted options.
    Apply(ApplyOpts),
    /// Public IP fetch.
    GetPublicIp(String),
    /// Port binding update.
    UpdatePublicIp {
        /// Public IP identifier.
        id: String,
        /// Submitted update.
        opts: PublicIpUpdateOpts,
    },
    /// Release request.
    DeletePublicIp(String),
    /// Bandwidth fetch.
    GetBandwidth(String),
    /// Bandwidth update.
    UpdateBandwidth {
        /// Bandwidth identifier.
        id: String,
        /// Submitted update.
        opts: BandwidthUpdateOpts,
    },
}

impl VpcCall {
    /// Returns the operation kind of the call.
    #[must_use]
    pub const fn operation(&self) -> VpcOperation {
        match self {
            Self::Apply(_) => VpcOperation::Apply,
            Self::GetPublicIp(_) => VpcOperation::GetPublicIp,
            Self::UpdatePublicIp { .. } => VpcOperation::UpdatePublicIp,
            Self::DeletePublicIp(_) => VpcOperation::DeletePublicIp,
            Self::GetBandwidth(_) => VpcOperation::GetBandwidth,
            Self::UpdateBandwidth { .. } => VpcOperation::UpdateBandwidth,
        }
    }
}

#[derive(Debug)]
struct FakeAddress {
    eip: PublicIp,
    pending_gets: u32,
    deletes_left: u32,
}

#[derive(Debug)]
struct FakeState {
    next_id: u32,
    addresses: BTreeMap<String, FakeAddress>,
    bandwidths: BTreeMap<String, Bandwidth>,
    calls: Vec<VpcCall>,
    failures: Vec<(VpcOperation, ApiError)>,
    pending_gets: u32,
    settled_status: String,
    deletes_to_release: u32,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            next_id: 0,
            addresses: BTreeMap::new(),
            bandwidths: BTreeMap::new(),
            calls: Vec::new(),
            failures: Vec::new(),
            pending_gets: 0,
            settled_status: String::from("ACTIVE"),
            deletes_to_release: 1,
        }
    }
}

impl FakeState {
    fn record(&mut self, call: VpcCall) -> Result<(), ApiError> {
        let operation = call.operation();
        self.calls.push(call);
        self.failures
            .iter()
            .position(|(op, _)| *op == operation)
            .map_or(Ok(()), |index| Err(self.failures.remove(index).1))
    }

    fn apply(&mut self, opts: &ApplyOpts) -> PublicIp {
        self.next_id += 1;
        let n = self.next_id;
        let id = format!("eip-{n}");
        let bandwidth_id = format!("bw-{n}");
        let address = if opts.publicip.ip_address.is_empty() {
            format!("192.0.2.{n}")
        } else {
            opts.publicip.ip_address.clone()
        };
        let eip = PublicIp {
            id: id.clone(),
            status: String::from("PENDING"),
            ip_type: opts.publicip.ip_type.clone(),
            public_ip_address: address,
            private_ip_address: None,
            port_id: None,
            tenant_id: String::from("project-1"),
            create_time: String::from("2024-01-01 00:00:00"),
            bandwidth_id: bandwidth_id.clone(),
            bandwidth_size: opts.bandwidth.size,
            bandwidth_share_type: opts.bandwidth.share_type.clone(),
        };
        let bandwidth = Bandwidth {
            id: bandwidth_id.clone(),
            name: opts.bandwidth.name.clone(),
            size: opts.bandwidth.size,
            share_type: opts.bandwidth.share_type.clone(),
            charge_mode: opts.bandwidth.charge_mode.clone(),
            tenant_id: String::from("project-1"),
            ..Bandwidth::default()
        };
        self.bandwidths.insert(bandwidth_id, bandwidth);
        self.addresses.insert(
            id,
            FakeAddress {
                eip: eip.clone(),
                pending_gets: self.pending_gets,
                deletes_left: self.deletes_to_release,
            },
        );
        eip
    }

    fn get(&mut self, id: &str) -> Result<PublicIp, ApiError> {
        let settled = self.settled_status.clone();
        let address = self
            .addresses
            .get_mut(id)
            .ok_or_else(|| not_found("publicips", id))?;
        if address.pending_gets > 0 {
            address.pending_gets -= 1;
            address.eip.status = String::from("PENDING");
        } else {
            address.eip.status = settled;
        }
        Ok(address.eip.clone())
    }

    fn update_port(&mut self, id: &str, opts: &PublicIpUpdateOpts) -> Result<PublicIp, ApiError> {
        let address = self
            .addresses
            .get_mut(id)
            .ok_or_else(|| not_found("publicips", id))?;
        address.eip.port_id.clone_from(&opts.port_id);
        address.eip.private_ip_address = opts.port_id.as_ref().map(|_| String::from("10.0.0.10"));
        Ok(address.eip.clone())
    }

    fn delete(&mut self, id: &str) -> Result<(), ApiError> {
        let address = self
            .addresses
            .get_mut(id)
            .ok_or_else(|| not_found("publicips", id))?;
        address.deletes_left = address.deletes_left.saturating_sub(1);
        if address.deletes_left == 0
            && let Some(released) = self.addresses.remove(id)
        {
            self.bandwidths.remove(&released.eip.bandwidth_id);
        }
        Ok(())
    }

    fn get_bandwidth(&self, id: &str) -> Result<Bandwidth, ApiError> {
        self.bandwidths
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("bandwidths", id))
    }

    fn update_bandwidth(
        &mut self,
        id: &str,
        opts: &BandwidthUpdateOpts,
    ) -> Result<Bandwidth, ApiError> {
        let bandwidth = self
            .bandwidths
            .get_mut(id)
            .ok_or_else(|| not_found("bandwidths", id))?;
        if !opts.name.is_empty() {
            bandwidth.name.clone_from(&opts.name);
        }
        if opts.size != 0 {
            bandwidth.size = opts.size;
        }
        let updated = bandwidth.clone();
        for address in self.addresses.values_mut() {
            if address.eip.bandwidth_id == id {
                address.eip.bandwidth_size = updated.size;
            }
        }
        Ok(updated)
    }
}

fn not_found(collection: &str, id: &str) -> ApiError {
    ApiError::NotFound {
        url: format!("https://vpc.example.test/v1/project-1/{collection}/{id}"),
    }
}

/// In-memory [`VpcApi`] that records every call.
///
/// Clones share state, so a test can keep a handle while the resource owns
/// another.
#[derive(Clone, Debug, Default)]
pub struct FakeVpc {
    state: Arc<Mutex<FakeState>>,
}

impl FakeVpc {
    /// Creates an empty fake whose allocations become active immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `PENDING` for the first `gets` fetches of each new allocation.
    #[must_use]
    pub fn activate_after(self, gets: u32) -> Self {
        self.lock().pending_gets = gets;
        self
    }

    /// Status reported once an allocation has finished provisioning.
    #[must_use]
    pub fn settle_as(self, status: &str) -> Self {
        self.lock().settled_status = status.to_owned();
        self
    }

    /// Number of release requests needed before a new allocation vanishes.
    #[must_use]
    pub fn release_after(self, deletes: u32) -> Self {
        self.lock().deletes_to_release = deletes.max(1);
        self
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: VpcOperation, error: ApiError) {
        self.lock().failures.push((operation, error));
    }

    /// Inserts an existing address together with its bandwidth.
    pub fn seed(&self, eip: PublicIp, bandwidth: Bandwidth) {
        let mut state = self.lock();
        let deletes_left = state.deletes_to_release;
        state.bandwidths.insert(bandwidth.id.clone(), bandwidth);
        state.addresses.insert(
            eip.id.clone(),
            FakeAddress {
                eip,
                pending_gets: 0,
                deletes_left,
            },
        );
    }

    /// Returns a snapshot of the calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<VpcCall> {
        self.lock().calls.clone()
    }

    /// Counts recorded calls of one kind.
    #[must_use]
    pub fn count(&self, operation: VpcOperation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Returns the stored address, if it still exists.
    #[must_use]
    pub fn public_ip(&self, id: &str) -> Option<PublicIp> {
        self.lock()
            .addresses
            .get(id)
            .map(|address| address.eip.clone())
    }

    /// Returns the stored bandwidth, if it still exists.
    #[must_use]
    pub fn bandwidth(&self, id: &str) -> Option<Bandwidth> {
        self.lock().bandwidths.get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VpcApi for FakeVpc {
    fn apply<'a>(&'a self, opts: &'a ApplyOpts) -> ApiFuture<'a, PublicIp> {
        let mut state = self.lock();
        let result = state
            .record(VpcCall::Apply(opts.clone()))
            .map(|()| state.apply(opts));
        Box::pin(ready(result))
    }

    fn get_public_ip<'a>(&'a self, id: &'a str) -> ApiFuture<'a, PublicIp> {
        let mut state = self.lock();
        let result = state
            .record(VpcCall::GetPublicIp(id.to_owned()))
            .and_then(|()| state.get(id));
        Box::pin(ready(result))
    }

    fn update_public_ip<'a>(
        &'a self,
        id: &'a str,
        opts: &'a PublicIpUpdateOpts,
    ) -> ApiFuture<'a, PublicIp> {
        let mut state = self.lock();
        let result = state
            .record(VpcCall::UpdatePublicIp {
                id: id.to_owned(),
                opts: opts.clone(),
            })
            .and_then(|()| state.update_port(id, opts));
        Box::pin(ready(result))
    }

    fn delete_public_ip<'a>(&'a self, id: &'a str) -> ApiFuture<'a, ()> {
        let mut state = self.lock();
        let result = state
            .record(VpcCall::DeletePublicIp(id.to_owned()))
            .and_then(|()| state.delete(id));
        Box::pin(ready(result))
    }

    fn get_bandwidth<'a>(&'a self, id: &'a str) -> ApiFuture<'a, Bandwidth> {
        let mut state = self.lock();
        let result = state
            .record(VpcCall::GetBandwidth(id.to_owned()))
            .and_then(|()| state.get_bandwidth(id));
        Box::pin(ready(result))
    }

    fn update_bandwidth<'a>(
        &'a self,
        id: &'a str,
        opts: &'a BandwidthUpdateOpts,
    ) -> ApiFuture<'a, Bandwidth> {
        let mut state = self.lock();
        let result = state
            .record(VpcCall::UpdateBandwidth {
                id: id.to_owned(),
                opts: opts.clone(),
            })
            .and_then(|()| state.update_bandwidth(id, opts));
        Box::pin(ready(result))
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let scoped: Vec<(&str, Option<&str>)> =
            pairs.iter().map(|(key, value)| (*key, Some(*value))).collect();
        Self::scoped(&scoped).await
    }

    /// Sets (`Some`) or removes (`None`) environment variables while holding
    /// a global mutex.
    pub async fn scoped(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, change) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match change {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
