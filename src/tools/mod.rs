//! Concrete tools and registry factories
//!
//! Tools:
//! - terminal.write: process execution (streaming + timeout)
//! - file.read / file.write / file.exists / file.list / file.delete
//! - git.status / git.log / git.stage / git.commit
//! - doctor.sensors / doctor.df / doctor.uptime / doctor.ps / doctor.free
//! - deploy.prod / docker.prune (high-impact)
//!
//! Registries are built here, once, and handed to the engine — there is
//! no global registry.

pub mod deploy;
pub mod doctor;
pub mod fs;
pub mod git;
pub mod terminal;

pub use deploy::{DeployProdTool, DockerPruneTool};
pub use doctor::{
    DoctorDfTool, DoctorFreeTool, DoctorPsTool, DoctorSensorsTool, DoctorUptimeTool,
};
pub use fs::{FileDeleteTool, FileExistsTool, FileListTool, FileReadTool, FileWriteTool};
pub use git::{GitCommitTool, GitLogTool, GitStageTool, GitStatusTool};
pub use terminal::TerminalWriteTool;

use crate::errors::Result;
use crate::registry::ToolRegistry;
use std::sync::Arc;

/// Registry with the full standard tool set
pub fn standard_registry() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_many(vec![
        Arc::new(TerminalWriteTool),
        Arc::new(FileReadTool),
        Arc::new(FileWriteTool),
        Arc::new(FileExistsTool),
        Arc::new(FileListTool),
        Arc::new(FileDeleteTool),
        Arc::new(GitStatusTool),
        Arc::new(GitLogTool),
        Arc::new(GitStageTool),
        Arc::new(GitCommitTool),
        Arc::new(DoctorSensorsTool),
        Arc::new(DoctorDfTool),
        Arc::new(DoctorUptimeTool),
        Arc::new(DoctorPsTool),
        Arc::new(DoctorFreeTool),
        Arc::new(DeployProdTool),
        Arc::new(DockerPruneTool),
    ])?;
    Ok(registry)
}

/// Read-only registry for inspection and diagnostic modes
pub fn read_only_registry() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_many(vec![
        Arc::new(FileReadTool),
        Arc::new(FileExistsTool),
        Arc::new(FileListTool),
        Arc::new(GitStatusTool),
        Arc::new(GitLogTool),
        Arc::new(DoctorSensorsTool),
        Arc::new(DoctorDfTool),
        Arc::new(DoctorUptimeTool),
        Arc::new(DoctorPsTool),
        Arc::new(DoctorFreeTool),
    ])?;
    Ok(registry)
}

/// Doctor-mode registry: diagnostic probes plus the safe writes a fix
/// plan needs
pub fn doctor_registry() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_many(vec![
        Arc::new(FileReadTool),
        Arc::new(FileExistsTool),
        Arc::new(FileListTool),
        Arc::new(DoctorSensorsTool),
        Arc::new(DoctorDfTool),
        Arc::new(DoctorUptimeTool),
        Arc::new(DoctorPsTool),
        Arc::new(DoctorFreeTool),
        Arc::new(TerminalWriteTool),
        Arc::new(FileWriteTool),
        Arc::new(GitStageTool),
    ])?;
    Ok(registry)
}
