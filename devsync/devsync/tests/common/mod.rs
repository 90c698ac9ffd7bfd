//! Shared fixtures: in-memory project files and fake network services.

#![allow(dead_code)]

use async_trait::async_trait;
use devsync::Project;
use devsync_core::prelude::*;
use devsync_core::traits::{AccountPublicKey, CreatedAccount, DeployedContract, TransactionReceipt};
use devsync_core::{HexKey, MemoryReaderWriter};
use devsync_files::{AccountChange, ChangeStreams, ContractChange, ProjectLayout};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub const KEY_HEX: &str = "4d9287571c8bff7482ffc27ef68d5b4990f9bd009a1e9fa812aae08ba167d57f";
pub const SERVICE_ADDRESS: u64 = 0xf8d6e0586b0a20c7;
pub const MAINNET_ADDRESS: u64 = 0xe467b9dd11fa00df;
pub const TESTNET_ADDRESS: u64 = 0x8c5303eaa26202d6;

/// Addresses handed out by the emulator, in creation order.
pub const EMULATOR_ADDRESSES: [u64; 6] = [
    0x01cf0e2f2f715450,
    0x179b6b1cb6755e31,
    0xf3fcd2c1a78f5eee,
    0xe03daebed8ca0615,
    0x045a1763c93006ca,
    0x120e725050340cab,
];

pub fn init_tracing() {
    let _ = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn service_key() -> PrivateKey {
    PrivateKey::from_hex(SigAlgo::EcdsaP256, KEY_HEX).unwrap()
}

pub fn account(name: &str, address: u64) -> Account {
    Account {
        name: name.to_string(),
        address: Address::from_u64(address),
        key: AccountKey::Hex(HexKey::new(0, HashAlgo::Sha3_256, service_key())),
    }
}

pub fn service_account() -> Account {
    account("emulator-account", SERVICE_ADDRESS)
}

/// Calls observed by [`FakeServices`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateAccount { payer: String, keys: Vec<AccountPublicKey> },
    Deploy { options: DeployOptions, deployments: Vec<(String, Vec<String>)> },
}

#[derive(Default)]
struct ServicesInner {
    calls: Vec<Call>,
    created: usize,
    fail_create: bool,
    fail_deploy: bool,
}

/// Network fake that records every call.
#[derive(Default)]
pub struct FakeServices {
    inner: Mutex<ServicesInner>,
}

impl FakeServices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.inner.lock().fail_create = fail;
    }

    pub fn set_fail_deploy(&self, fail: bool) {
        self.inner.lock().fail_deploy = fail;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn create_calls(&self) -> Vec<Vec<AccountPublicKey>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateAccount { keys, .. } => Some(keys),
                _ => None,
            })
            .collect()
    }

    pub fn deploy_calls(&self) -> Vec<(DeployOptions, Vec<(String, Vec<String>)>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Deploy {
                    options,
                    deployments,
                } => Some((options, deployments)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Services for FakeServices {
    async fn create_account(
        &self,
        payer: &Account,
        keys: &[AccountPublicKey],
    ) -> Result<(CreatedAccount, TransactionReceipt)> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::CreateAccount {
            payer: payer.name.clone(),
            keys: keys.to_vec(),
        });
        if inner.fail_create {
            return Err(SyncError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "emulator is not running",
            )));
        }

        let address = EMULATOR_ADDRESSES[inner.created % EMULATOR_ADDRESSES.len()];
        inner.created += 1;
        Ok((
            CreatedAccount {
                address: Address::from_u64(address),
                keys: keys.to_vec(),
            },
            TransactionReceipt {
                transaction_id: format!("tx-{}", inner.created),
                error: None,
            },
        ))
    }

    async fn deploy_project(
        &self,
        state: &State,
        options: DeployOptions,
    ) -> Result<Vec<DeployedContract>> {
        let deployments: Vec<(String, Vec<String>)> = state
            .deployments()
            .iter()
            .map(|d| {
                (
                    d.account.clone(),
                    d.contract_names().into_iter().map(String::from).collect(),
                )
            })
            .collect();

        let mut inner = self.inner.lock();
        inner.calls.push(Call::Deploy {
            options,
            deployments: deployments.clone(),
        });
        if inner.fail_deploy {
            return Err(SyncError::deployment("emulator rejected the deployment"));
        }

        let mut results = Vec::new();
        for deployment in state.deployments().iter() {
            let address = state
                .accounts()
                .by_name(&deployment.account)
                .map(|a| a.address);
            for name in deployment.contract_names() {
                let location = state
                    .contracts()
                    .by_name(name)
                    .map(|c| c.location.clone())
                    .unwrap_or_default();
                results.push(DeployedContract {
                    name: name.to_string(),
                    account: deployment.account.clone(),
                    location,
                    result: address.ok_or_else(|| "unknown account".to_string()),
                });
            }
        }
        Ok(results)
    }
}

/// Layout fake with fixed declared deployments and caller-driven change feeds.
pub struct FakeLayout {
    exists: bool,
    deployments: BTreeMap<String, Vec<String>>,
    streams: Mutex<Option<ChangeStreams>>,
}

/// Senders feeding the streams returned by [`FakeLayout::watch`].
pub struct Feeds {
    pub accounts: mpsc::UnboundedSender<AccountChange>,
    pub contracts: mpsc::UnboundedSender<ContractChange>,
}

impl FakeLayout {
    pub fn new(deployments: &[(&str, &[&str])]) -> Arc<Self> {
        Arc::new(Self::build(true, deployments).0)
    }

    pub fn missing() -> Arc<Self> {
        Arc::new(Self::build(false, &[]).0)
    }

    /// Layout whose watch feeds are driven through the returned senders.
    pub fn with_feeds(deployments: &[(&str, &[&str])]) -> (Arc<Self>, Feeds) {
        let (layout, feeds) = Self::build(true, deployments);
        (Arc::new(layout), feeds)
    }

    fn build(exists: bool, deployments: &[(&str, &[&str])]) -> (Self, Feeds) {
        let (accounts_tx, accounts_rx) = mpsc::unbounded_channel();
        let (contracts_tx, contracts_rx) = mpsc::unbounded_channel();
        let layout = Self {
            exists,
            deployments: deployments
                .iter()
                .map(|(account, paths)| {
                    (
                        account.to_string(),
                        paths.iter().map(|p| p.to_string()).collect(),
                    )
                })
                .collect(),
            streams: Mutex::new(Some(ChangeStreams::from_channels(accounts_rx, contracts_rx))),
        };
        let feeds = Feeds {
            accounts: accounts_tx,
            contracts: contracts_tx,
        };
        (layout, feeds)
    }
}

impl ProjectLayout for FakeLayout {
    fn exists(&self) -> Result<()> {
        if self.exists {
            Ok(())
        } else {
            Err(SyncError::initialization(
                "required project folder cadence/contracts does not exist",
            ))
        }
    }

    fn deployments(&self) -> Result<BTreeMap<String, Vec<String>>> {
        self.exists()?;
        Ok(self.deployments.clone())
    }

    fn watch(&self) -> Result<ChangeStreams> {
        self.streams
            .lock()
            .take()
            .ok_or_else(|| SyncError::watch("already watching"))
    }
}

/// In-memory project with the service account configured.
pub struct Fixture {
    pub rw: Arc<MemoryReaderWriter>,
    pub services: Arc<FakeServices>,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        Self {
            rw: Arc::new(MemoryReaderWriter::new()),
            services: FakeServices::new(),
        }
    }

    /// Add a contract source file.
    pub fn file(&self, path: &str, source: &str) -> &Self {
        self.rw.insert(path, source.as_bytes().to_vec());
        self
    }

    pub fn state(&self) -> State {
        let rw: Arc<dyn ReaderWriter> = self.rw.clone();
        let mut state = State::new(rw, "flow.json");
        state.accounts_mut().add_or_update(service_account());
        state
    }

    pub fn project(&self, layout: Arc<FakeLayout>) -> Project {
        self.project_with_state(layout, self.state())
    }

    pub fn project_with_state(&self, layout: Arc<FakeLayout>, state: State) -> Project {
        let services: Arc<dyn Services> = self.services.clone();
        Project::new(service_account(), services, state, layout, SyncConfig::default()).unwrap()
    }

    pub fn saved(&self) -> Option<String> {
        self.rw
            .contents(std::path::Path::new("flow.json"))
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }
}

/// Names attached to the emulator deployment of `account`.
pub fn deployed_names(project: &Project, account: &str) -> Option<Vec<String>> {
    project
        .state()
        .deployments()
        .by_account_and_network(account, "emulator")
        .map(|d| d.contract_names().into_iter().map(String::from).collect())
}
