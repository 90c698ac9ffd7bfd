//! End-to-end startup against a project directory on disk

mod common;

use common::*;
use devsync::Project;
use devsync_core::prelude::*;
use devsync_core::FsReaderWriter;
use devsync_files::ProjectFiles;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const FLOW_JSON: &str = r#"{
  "networks": {
    "emulator": "127.0.0.1:3569"
  },
  "accounts": {
    "emulator-account": {
      "address": "f8d6e0586b0a20c7",
      "key": {
        "type": "hex",
        "index": 0,
        "signatureAlgorithm": "ECDSA_P256",
        "hashAlgorithm": "SHA3_256",
        "privateKey": "4d9287571c8bff7482ffc27ef68d5b4990f9bd009a1e9fa812aae08ba167d57f"
      }
    }
  },
  "contracts": {
    "FungibleToken": {
      "source": "cadence/contracts/FungibleToken.cdc",
      "aliases": {
        "emulator": "ee82856bf20e2aa6"
      }
    }
  },
  "deployments": {},
  "emulators": {
    "default": {
      "port": 3569,
      "serviceAccount": "emulator-account"
    }
  }
}"#;

fn setup_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let contracts = root.join("cadence/contracts");
    fs::create_dir_all(contracts.join("alice")).unwrap();

    fs::write(root.join("flow.json"), FLOW_JSON).unwrap();
    fs::write(
        contracts.join("FungibleToken.cdc"),
        "access(all) contract interface FungibleToken {}",
    )
    .unwrap();
    fs::write(contracts.join("Token.cdc"), "access(all) contract Token {}").unwrap();
    fs::write(
        contracts.join("alice/Market.cdc"),
        "import Token from \"Token\"\naccess(all) contract Market {}",
    )
    .unwrap();
    temp_dir
}

#[tokio::test]
async fn test_startup_on_disk() {
    init_tracing();
    let temp_dir = setup_project();
    let root = temp_dir.path();
    let config = SyncConfig::default();

    let rw: Arc<dyn ReaderWriter> = Arc::new(FsReaderWriter::new(root));
    let state = State::load(rw.clone(), &config.project.state_file).unwrap();
    let layout = Arc::new(ProjectFiles::new(root, &config));
    let services = FakeServices::new();
    let shared: Arc<dyn Services> = services.clone();

    let mut project = Project::open(shared, state, layout, config.clone()).unwrap();
    project.startup().await.unwrap();

    let reloaded = State::load(rw, &config.project.state_file).unwrap();
    assert_eq!(
        reloaded.accounts().names(),
        vec!["emulator-account", "default", "alice"]
    );

    // The aliased contract is kept but never deployed
    let token = reloaded.contracts().by_name("FungibleToken").unwrap();
    assert!(token.is_aliased_on("emulator"));
    let default = reloaded
        .deployments()
        .by_account_and_network("default", "emulator")
        .unwrap();
    assert_eq!(default.contract_names(), vec!["Token"]);

    let alice = reloaded
        .deployments()
        .by_account_and_network("alice", "emulator")
        .unwrap();
    assert_eq!(alice.contract_names(), vec!["Market"]);
    assert_eq!(
        reloaded.contracts().by_name("Market").unwrap().location,
        "cadence/contracts/alice/Market.cdc"
    );

    assert_eq!(services.deploy_calls().len(), 1);

    let saved = fs::read_to_string(root.join(&config.project.state_file)).unwrap();
    assert!(saved.contains("\"emulators\""));
    assert!(saved.contains("\"serviceAccount\""));
}
