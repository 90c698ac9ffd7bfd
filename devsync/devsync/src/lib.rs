//! Devsync - keeps a contract project in sync with a development network
//!
//! The engine watches a project's contracts folder, maintains the matching
//! accounts, contracts and deployments in the project configuration, and
//! redeploys the project whenever a contract changes.
//!
//! # Example
//!
//! ```no_run
//! use devsync::Project;
//! use devsync_core::{FsReaderWriter, Services, State, SyncConfig};
//! use devsync_files::ProjectFiles;
//! use std::sync::Arc;
//!
//! # async fn run(services: Arc<dyn Services>) -> devsync_core::Result<()> {
//! let config = SyncConfig::default();
//! let rw = Arc::new(FsReaderWriter::new("./my-project"));
//! let state = State::load(rw, &config.project.state_file)?;
//! let layout = Arc::new(ProjectFiles::new("./my-project", &config));
//!
//! let mut project = Project::open(services, state, layout, config)?;
//! project.startup().await?;
//! project.watch().await?;
//! # Ok(())
//! # }
//! ```

pub mod names;
pub mod program;
pub mod project;
pub mod report;

pub use names::ContractNames;
pub use program::Program;
pub use project::{ACCOUNT_HASH_ALGO, ACCOUNT_SIG_ALGO, Project};
pub use report::{DeploymentSummary, report_deployment};
