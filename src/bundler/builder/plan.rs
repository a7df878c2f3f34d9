//! Ordered command plans handed to the external executor.

use std::fmt;

/// Pipeline stages, in the order a packaging plan visits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    WorkspaceSetup,
    Staging,
    Unpack,
    BillOfMaterials,
    ExtraFileSigning,
    BinarySigning,
    PackageBuild,
    InstallerBuild,
    InstallerSigning,
    InstallerRelocation,
    DiskImage,
    DiskImageSigning,
    Notarization,
    Delivery,
    Archive,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::WorkspaceSetup => "workspace-setup",
            Stage::Staging => "staging",
            Stage::Unpack => "unpack",
            Stage::BillOfMaterials => "bill-of-materials",
            Stage::ExtraFileSigning => "extra-file-signing",
            Stage::BinarySigning => "binary-signing",
            Stage::PackageBuild => "package-build",
            Stage::InstallerBuild => "installer-build",
            Stage::InstallerSigning => "installer-signing",
            Stage::InstallerRelocation => "installer-relocation",
            Stage::DiskImage => "disk-image",
            Stage::DiskImageSigning => "disk-image-signing",
            Stage::Notarization => "notarization",
            Stage::Delivery => "delivery",
            Stage::Archive => "archive",
        };
        f.write_str(name)
    }
}

/// Commands contributed by one stage. An empty list is a no-op stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanStage {
    pub stage: Stage,
    pub commands: Vec<String>,
}

/// An ordered packaging plan.
///
/// Stages are kept in push order; [`commands`](Self::commands) flattens them
/// and drops empty entries without reordering or deduplicating.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandPlan {
    stages: Vec<PlanStage>,
}

impl CommandPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    pub fn push<I, S>(&mut self, stage: Stage, commands: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages.push(PlanStage {
            stage,
            commands: commands.into_iter().map(Into::into).collect(),
        });
    }

    /// Stages in plan order.
    pub fn stages(&self) -> &[PlanStage] {
        &self.stages
    }

    /// Whether `stage` contributes at least one command.
    pub fn runs(&self, stage: Stage) -> bool {
        self.stages
            .iter()
            .any(|s| s.stage == stage && s.commands.iter().any(|c| !c.is_empty()))
    }

    /// Commands contributed by `stage`.
    pub fn stage_commands(&self, stage: Stage) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.stage == stage)
            .flat_map(|s| s.commands.iter().map(String::as_str))
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// The flattened command list.
    pub fn commands(&self) -> Vec<String> {
        self.stages
            .iter()
            .flat_map(|s| s.commands.iter())
            .filter(|c| !c.is_empty())
            .cloned()
            .collect()
    }

    pub fn into_commands(self) -> Vec<String> {
        self.stages
            .into_iter()
            .flat_map(|s| s.commands)
            .filter(|c| !c.is_empty())
            .collect()
    }
}
