//! Deployment outcome reporting.

use devsync_core::error::Result;
use devsync_core::traits::DeployedContract;
use tracing::{info, warn};

/// What a deploy attempt achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentSummary {
    /// Contracts deployed or updated, as `account.Name`
    pub deployed: Vec<String>,
    /// Contracts that failed, with the reason
    pub failed: Vec<(String, String)>,
    /// Set when the deployer failed as a whole
    pub error: Option<String>,
}

impl DeploymentSummary {
    /// Whether every contract was deployed.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed.is_empty()
    }
}

/// Log the outcome of a deploy attempt and summarize it.
pub fn report_deployment(result: &Result<Vec<DeployedContract>>) -> DeploymentSummary {
    let contracts = match result {
        Ok(contracts) => contracts,
        Err(e) => {
            warn!("Deployment failed: {}", e);
            return DeploymentSummary {
                error: Some(e.to_string()),
                ..Default::default()
            };
        }
    };

    let mut summary = DeploymentSummary::default();
    for contract in contracts {
        let label = format!("{}.{}", contract.account, contract.name);
        match &contract.result {
            Ok(address) => {
                info!("Deployed {} to {} ({})", contract.name, address, contract.location);
                summary.deployed.push(label);
            }
            Err(reason) => {
                warn!("Failed to deploy {}: {}", label, reason);
                summary.failed.push((label, reason.clone()));
            }
        }
    }

    info!(
        "Deployment finished: {} deployed, {} failed",
        summary.deployed.len(),
        summary.failed.len()
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use devsync_core::SyncError;
    use devsync_core::address::Address;

    fn deployed(name: &str, result: std::result::Result<Address, String>) -> DeployedContract {
        DeployedContract {
            name: name.to_string(),
            account: "default".to_string(),
            location: format!("cadence/contracts/{}.cdc", name),
            result,
        }
    }

    #[test]
    fn test_mixed_outcomes() {
        let result = Ok(vec![
            deployed("A", Ok(Address::from_u64(0x01cf0e2f2f715450))),
            deployed("B", Err("syntax error".to_string())),
        ]);

        let summary = report_deployment(&result);
        assert_eq!(summary.deployed, vec!["default.A"]);
        assert_eq!(
            summary.failed,
            vec![("default.B".to_string(), "syntax error".to_string())]
        );
        assert!(!summary.is_success());
    }

    #[test]
    fn test_aggregate_failure() {
        let result = Err(SyncError::deployment("network unreachable"));
        let summary = report_deployment(&result);
        assert!(summary.deployed.is_empty());
        assert!(summary.error.unwrap().contains("network unreachable"));
    }

    #[test]
    fn test_empty_project() {
        let summary = report_deployment(&Ok(Vec::new()));
        assert!(summary.is_success());
    }
}
