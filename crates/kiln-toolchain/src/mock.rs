use crate::invocation::Invocation;
use crate::tool::{BuildHandle, BuildTool};
use crate::{Stage, ToolError};
use std::sync::{Arc, Mutex};

/// Marker written into the build folder by a successful mock build.
pub const MOCK_BUILD_MARKER: &str = ".kiln-mock-built";
/// Marker written into the package folder by a successful mock install.
pub const MOCK_INSTALL_MARKER: &str = ".kiln-mock-installed";

/// In-process build tool for tests.
///
/// Records every step it is asked to run, writes marker files instead of
/// compiling, and can be told to fail at a given stage.
#[derive(Clone, Default)]
pub struct MockTool {
    fail_at: Option<Stage>,
    calls: Arc<Mutex<Vec<Stage>>>,
}

impl MockTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose `stage` step always fails with exit code 1.
    pub fn failing_at(stage: Stage) -> Self {
        Self {
            fail_at: Some(stage),
            calls: Arc::default(),
        }
    }

    /// Steps attempted so far, including the failing one.
    pub fn calls(&self) -> Vec<Stage> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

fn step(fail_at: Option<Stage>, calls: &Mutex<Vec<Stage>>, stage: Stage) -> Result<(), ToolError> {
    if let Ok(mut calls) = calls.lock() {
        calls.push(stage);
    }
    if fail_at == Some(stage) {
        return Err(ToolError::StepFailed {
            stage,
            program: "mock".to_owned(),
            code: Some(1),
        });
    }
    Ok(())
}

impl BuildTool for MockTool {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn configure(&self, invocation: &Invocation) -> Result<Box<dyn BuildHandle>, ToolError> {
        step(self.fail_at, &self.calls, Stage::Configure)?;

        let build = &invocation.folders.build;
        std::fs::create_dir_all(build)?;
        let cache: String = invocation
            .definitions
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect();
        std::fs::write(build.join("mock-cache.txt"), cache)?;

        Ok(Box::new(MockHandle {
            tool: self.clone(),
            invocation: invocation.clone(),
        }))
    }
}

pub struct MockHandle {
    tool: MockTool,
    invocation: Invocation,
}

impl MockHandle {
    fn compile(&self) -> Result<(), ToolError> {
        std::fs::write(
            self.invocation.folders.build.join(MOCK_BUILD_MARKER),
            format!("generator={}\n", self.invocation.generator),
        )?;
        Ok(())
    }
}

impl BuildHandle for MockHandle {
    fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    fn build(&mut self) -> Result<(), ToolError> {
        step(self.tool.fail_at, &self.tool.calls, Stage::Build)?;
        self.compile()
    }

    fn install(&mut self) -> Result<(), ToolError> {
        step(self.tool.fail_at, &self.tool.calls, Stage::Install)?;
        // The install target compiles before copying.
        self.compile()?;
        let package = &self.invocation.folders.package;
        std::fs::create_dir_all(package.join("lib").join("cmake"))?;
        std::fs::write(package.join(MOCK_INSTALL_MARKER), "installed\n")?;
        Ok(())
    }
}
