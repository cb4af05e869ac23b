use crate::invocation::Invocation;
use crate::tool::{BuildHandle, BuildTool};
use crate::{Stage, ToolError};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Drives the `cmake` executable.
pub struct CMakeTool {
    program: String,
}

impl CMakeTool {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_owned(),
        }
    }
}

impl BuildTool for CMakeTool {
    fn name(&self) -> &'static str {
        "cmake"
    }

    fn configure(&self, invocation: &Invocation) -> Result<Box<dyn BuildHandle>, ToolError> {
        std::fs::create_dir_all(&invocation.folders.build)?;
        info!(
            generator = %invocation.generator,
            build_dir = %invocation.folders.build.display(),
            "configuring with cmake"
        );
        run(&self.program, Stage::Configure, &invocation.configure_args())?;
        Ok(Box::new(CMakeHandle {
            program: self.program.clone(),
            invocation: invocation.clone(),
        }))
    }
}

pub struct CMakeHandle {
    program: String,
    invocation: Invocation,
}

impl BuildHandle for CMakeHandle {
    fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    fn build(&mut self) -> Result<(), ToolError> {
        info!(build_dir = %self.invocation.folders.build.display(), "building with cmake");
        run(&self.program, Stage::Build, &self.invocation.build_args())
    }

    fn install(&mut self) -> Result<(), ToolError> {
        info!(prefix = %self.invocation.folders.package.display(), "installing with cmake");
        run(&self.program, Stage::Install, &self.invocation.install_args())
    }
}

/// Run one cmake step with inherited stdio so compiler output reaches the user.
fn run(program: &str, stage: Stage, args: &[String]) -> Result<(), ToolError> {
    debug!("{program} {}", args.join(" "));
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::Unavailable(program.to_owned())
            } else {
                ToolError::Io(e)
            }
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(ToolError::StepFailed {
            stage,
            program: program.to_owned(),
            code: status.code(),
        })
    }
}
