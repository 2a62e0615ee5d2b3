use crate::archive;
use crate::client::PlatformApi;
use crate::error::Result;
use crate::models::AiLintReport;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintAssessment {
    pub blocking: bool,
    pub reasons: Vec<String>,
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Decide whether `report` blocks a deploy.
///
/// Errors block unless `allow_errors`. Warnings block only when the repo's
/// lint config sets `block_on_warnings` and `allow_warnings` is off.
/// Suppressed findings never block.
pub fn assess(report: &AiLintReport, allow_errors: bool, allow_warnings: bool) -> LintAssessment {
    let mut reasons = Vec::new();

    let errors = report.errors.len();
    if errors > 0 && !allow_errors {
        reasons.push(format!(
            "{errors} blocking error{} reported by AI lint",
            plural(errors)
        ));
    }

    let warnings = report.warnings.len();
    if report.config.block_on_warnings && warnings > 0 && !allow_warnings {
        reasons.push(format!(
            "{warnings} warning{} with block_on_warnings enabled",
            plural(warnings)
        ));
    }

    LintAssessment {
        blocking: !reasons.is_empty(),
        reasons,
    }
}

/// Archive the project and run AI lint on it.
pub fn run_ai_lint(api: &dyn PlatformApi, project_dir: &Path) -> Result<AiLintReport> {
    let archive = archive::build_archive(project_dir)?;
    api.lint(archive)
}
