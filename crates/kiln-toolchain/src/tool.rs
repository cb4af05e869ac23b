use crate::invocation::Invocation;
use crate::translate::ToolchainConfig;
use crate::ToolError;

/// An external build-file generator kiln can delegate to.
pub trait BuildTool: Send + Sync {
    fn name(&self) -> &str;

    /// Run the tool's own configure step and return a handle bound to that
    /// configuration.
    fn configure(&self, invocation: &Invocation) -> Result<Box<dyn BuildHandle>, ToolError>;
}

/// One configured instance of a build tool, used for a single operation.
pub trait BuildHandle {
    fn invocation(&self) -> &Invocation;

    fn build(&mut self) -> Result<(), ToolError>;

    fn install(&mut self) -> Result<(), ToolError>;
}

pub fn select_tool(name: &str, config: &ToolchainConfig) -> Result<Box<dyn BuildTool>, ToolError> {
    match name {
        "cmake" => Ok(Box::new(crate::cmake::CMakeTool::new(
            &config.cmake_program,
        ))),
        "mock" => Ok(Box::new(crate::mock::MockTool::new())),
        other => Err(ToolError::Unavailable(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_known_tools() {
        let config = ToolchainConfig::default();
        assert_eq!(select_tool("cmake", &config).unwrap().name(), "cmake");
        assert_eq!(select_tool("mock", &config).unwrap().name(), "mock");
    }

    #[test]
    fn select_unknown_tool_fails() {
        assert!(matches!(
            select_tool("meson", &ToolchainConfig::default()),
            Err(ToolError::Unavailable(_))
        ));
    }
}
