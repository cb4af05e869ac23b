use crate::lifecycle::{validate_transition, LifecycleState};
use crate::signal::shutdown_requested;
use crate::CoreError;
use kiln_schema::{
    parse_descriptor_file, BinaryInfo, DependencyRef, IdentityFacts, IdentityPolicy,
    NormalizedDescriptor, PackageIdentity, Settings, Version, DESCRIPTOR_FILE, INFO_FILE,
};
use kiln_toolchain::cmake::CMakeTool;
use kiln_toolchain::{BuildHandle, BuildTool, Folders, Invocation, Translator};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// A native library recipe bound to one settings vector and one set of
/// folders.
///
/// `build()` and `package()` are independent: each configures the build tool
/// from scratch, so either can be called first and nothing carries over
/// between calls.
pub struct Recipe {
    recipe_dir: PathBuf,
    descriptor: NormalizedDescriptor,
    settings: Settings,
    folders: Folders,
    translator: Translator,
    tool: Box<dyn BuildTool>,
}

/// Outcome of a successful build or package operation.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleReport {
    pub state: LifecycleState,
    pub invocation: Invocation,
}

impl Recipe {
    /// Load `kiln.toml` from `recipe_dir`.
    ///
    /// Folders default to the recipe directory as source, with `build/` and
    /// `package/` below it. The build tool defaults to `cmake`.
    pub fn load(recipe_dir: impl Into<PathBuf>, settings: &Settings) -> Result<Self, CoreError> {
        let recipe_dir: PathBuf = recipe_dir.into();
        let descriptor = parse_descriptor_file(recipe_dir.join(DESCRIPTOR_FILE))?.normalize()?;
        Self::from_descriptor(recipe_dir, descriptor, settings)
    }

    pub fn from_descriptor(
        recipe_dir: impl Into<PathBuf>,
        descriptor: NormalizedDescriptor,
        settings: &Settings,
    ) -> Result<Self, CoreError> {
        let recipe_dir: PathBuf = recipe_dir.into();
        let settings = descriptor.effective_settings(settings)?;
        let folders = Folders {
            source: recipe_dir.clone(),
            build: recipe_dir.join("build"),
            package: recipe_dir.join("package"),
            dependencies: Vec::new(),
        };
        let translator = Translator::default();
        let tool = Box::new(CMakeTool::new(&translator.config().cmake_program));
        Ok(Self {
            recipe_dir,
            descriptor,
            settings,
            folders,
            translator,
            tool,
        })
    }

    #[must_use]
    pub fn with_folders(mut self, folders: Folders) -> Self {
        self.folders = folders;
        self
    }

    #[must_use]
    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = translator;
        self
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Box<dyn BuildTool>) -> Self {
        self.tool = tool;
        self
    }

    pub fn descriptor(&self) -> &NormalizedDescriptor {
        &self.descriptor
    }

    /// Settings with the descriptor's option defaults filled in.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn folders(&self) -> &Folders {
        &self.folders
    }

    /// `{branch}_{revision prefix}` of the checkout holding the recipe.
    pub fn resolve_version(&self) -> Result<Version, CoreError> {
        Ok(kiln_vcs::resolve_version(&self.recipe_dir)?)
    }

    /// The invocation `configure()` would hand to the build tool.
    pub fn invocation(&self) -> Result<Invocation, CoreError> {
        self.translator
            .translate(&self.settings, &self.folders)
            .map_err(CoreError::Configuration)
    }

    /// Check exported sources, translate the settings, and run the tool's own
    /// configure step.
    pub fn configure(&self) -> Result<Box<dyn BuildHandle>, CoreError> {
        self.check_exports()?;
        let invocation = self.invocation()?;
        debug!(
            tool = self.tool.name(),
            generator = %invocation.generator,
            quirks = ?invocation.applied_quirks,
            "configuring {}",
            self.descriptor.name
        );
        self.tool
            .configure(&invocation)
            .map_err(CoreError::Configuration)
    }

    /// Configure, then compile.
    pub fn build(&self) -> Result<LifecycleReport, CoreError> {
        info!("building {}", self.descriptor.name);
        let mut state = LifecycleState::Unconfigured;
        let mut handle = self.configure()?;
        advance(&mut state, LifecycleState::Configured)?;
        check_cancelled()?;

        handle.build().map_err(CoreError::BuildFailure)?;
        advance(&mut state, LifecycleState::Built)?;

        Ok(LifecycleReport {
            state,
            invocation: handle.invocation().clone(),
        })
    }

    /// Configure, then compile and install into the package folder.
    pub fn package(&self) -> Result<LifecycleReport, CoreError> {
        info!(
            "packaging {} into {}",
            self.descriptor.name,
            self.folders.package.display()
        );
        let mut state = LifecycleState::Unconfigured;
        let mut handle = self.configure()?;
        advance(&mut state, LifecycleState::Configured)?;
        check_cancelled()?;

        handle.install().map_err(CoreError::InstallFailure)?;
        advance(&mut state, LifecycleState::Installed)?;

        Ok(LifecycleReport {
            state,
            invocation: handle.invocation().clone(),
        })
    }

    /// Identity facts for this build against the given resolution set.
    pub fn identity_facts(&self, resolved: &[DependencyRef]) -> Result<IdentityFacts, CoreError> {
        Ok(IdentityPolicy::packaging_default()
            .full_version_mode()
            .facts(&self.settings, &self.descriptor, resolved)?)
    }

    pub fn package_id(&self, resolved: &[DependencyRef]) -> Result<PackageIdentity, CoreError> {
        Ok(self.identity_facts(resolved)?.digest())
    }

    /// Package, then write the binary info record into the package folder.
    ///
    /// The identity is computed before anything runs, so an unresolved
    /// dependency fails the operation without touching the package folder.
    pub fn package_and_record(
        &self,
        version: Version,
        resolved: &[DependencyRef],
    ) -> Result<(LifecycleReport, BinaryInfo), CoreError> {
        let facts = self.identity_facts(resolved)?;
        let report = self.package()?;

        let record = BinaryInfo::new(
            &self.descriptor.name,
            version,
            facts,
            self.descriptor.build_dirs.clone(),
            chrono::Utc::now().to_rfc3339(),
        );
        let path = self.folders.package.join(INFO_FILE);
        record.write_to_file(&path)?;
        info!(
            "recorded {} {} as {}",
            record.name, record.version, record.short_id
        );
        Ok((report, record))
    }

    fn check_exports(&self) -> Result<(), CoreError> {
        for pattern in &self.descriptor.exports_sources {
            let (path, whole_dir) = match pattern.strip_suffix("/*") {
                Some(dir) => (self.folders.source.join(dir), true),
                None => (self.folders.source.join(pattern), false),
            };
            let present = if whole_dir {
                path.is_dir()
            } else {
                path.exists()
            };
            if !present {
                return Err(CoreError::MissingExport(pattern.clone()));
            }
        }
        Ok(())
    }
}

fn advance(state: &mut LifecycleState, to: LifecycleState) -> Result<(), CoreError> {
    validate_transition(*state, to)?;
    debug!("lifecycle: {state} -> {to}");
    *state = to;
    Ok(())
}

fn check_cancelled() -> Result<(), CoreError> {
    if shutdown_requested() {
        return Err(CoreError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_schema::parse_descriptor_str;
    use std::path::Path;

    fn recipe(dir: &Path, toml: &str) -> Recipe {
        let descriptor = parse_descriptor_str(toml).unwrap().normalize().unwrap();
        Recipe::from_descriptor(dir, descriptor, &Settings::detect_host()).unwrap()
    }

    #[test]
    fn default_folders_live_under_recipe_dir() {
        let dir = tempfile::tempdir().unwrap();
        let r = recipe(dir.path(), "[package]\nname = \"a\"\n");
        assert_eq!(r.folders().source, dir.path());
        assert_eq!(r.folders().build, dir.path().join("build"));
        assert_eq!(r.folders().package, dir.path().join("package"));
        assert_eq!(r.tool.name(), "cmake");
    }

    #[test]
    fn option_defaults_are_filled_in() {
        let dir = tempfile::tempdir().unwrap();
        let r = recipe(
            dir.path(),
            "[package]\nname = \"a\"\n[options]\nshared = true\n",
        );
        assert_eq!(r.settings().option("shared"), Some(true));
    }

    #[test]
    fn exports_check_accepts_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("CMakeLists.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        let r = recipe(
            dir.path(),
            "[package]\nname = \"a\"\nexports_sources = [\"CMakeLists.txt\", \"src/*\"]\n",
        );
        assert!(r.check_exports().is_ok());
    }

    #[test]
    fn exports_check_reports_missing_pattern() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("src"), "not a dir").unwrap();
        let r = recipe(
            dir.path(),
            "[package]\nname = \"a\"\nexports_sources = [\"src/*\"]\n",
        );
        match r.check_exports() {
            Err(CoreError::MissingExport(p)) => assert_eq!(p, "src/*"),
            other => panic!("expected MissingExport, got {other:?}"),
        }
    }

    #[test]
    fn advance_rejects_skipping_configure() {
        let mut state = LifecycleState::Unconfigured;
        assert!(advance(&mut state, LifecycleState::Built).is_err());
        assert_eq!(state, LifecycleState::Unconfigured);
    }
}
