use crate::result::{MemoryResult, StoredResult};
use crate::simulation::{Simulation, Workspace};
use crate::{MabossError, ID_REGEX};
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

lazy_static! {
    /// Names accepted for directories created by `Workspace::save`.
    static ref SAVE_NAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Only existing directories with this prefix can be replaced by `Workspace::save`.
const REPLACEABLE_PREFIX: &str = "rpl_";

impl Workspace {
    /// Create a fresh temporary directory and write the `.bnd` and `.cfg` files of the
    /// `simulation` into it, using `prefix` as the file name stem.
    ///
    /// If writing fails, the directory is removed before the error is returned.
    pub fn create(simulation: &Simulation, prefix: &str) -> Result<Workspace, MabossError> {
        if !ID_REGEX.is_match(prefix) {
            return Err(MabossError::InvalidIdentifier(format!(
                "`{prefix}` is not a valid file prefix."
            )));
        }
        let directory = tempfile::Builder::new().prefix("maboss_").tempdir()?;
        let workspace = Workspace {
            directory,
            prefix: prefix.to_string(),
        };
        std::fs::write(workspace.bnd_file(), simulation.network().to_string())?;
        std::fs::write(workspace.cfg_file(), simulation.to_string())?;
        tracing::debug!(path = %workspace.path().display(), "Simulation workspace created.");
        Ok(workspace)
    }

    pub fn path(&self) -> &Path {
        self.directory.path()
    }

    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    /// Path of the network description.
    pub fn bnd_file(&self) -> PathBuf {
        self.path().join(format!("{}.bnd", self.prefix))
    }

    /// Path of the run configuration.
    pub fn cfg_file(&self) -> PathBuf {
        self.path().join(format!("{}.cfg", self.prefix))
    }

    /// Results exported into this workspace. The returned value only refers to the files,
    /// so it cannot be read once the workspace is dropped.
    pub fn result(&self) -> StoredResult {
        StoredResult::new(self.path(), &self.prefix)
    }

    /// Read the exported results into memory, so that they outlive the workspace.
    pub fn load_result(&self) -> Result<MemoryResult, MabossError> {
        let stored = self.result();
        Ok(MemoryResult::new(
            stored.read_probtraj()?,
            stored.read_fixed_points()?,
        ))
    }

    /// Copy the inputs and all exports of this workspace into a new directory `target`,
    /// so that they are kept after the workspace is dropped.
    ///
    /// The name of `target` must consist of letters, digits, `_` and `-`, and the inputs
    /// are saved as `<name>.bnd` and `<name>.cfg`. Exports keep their file names. An
    /// existing `target` is replaced only if `replace` is set and its name starts with
    /// `rpl_`; otherwise it is left untouched and an `AlreadyExists` error is returned.
    pub fn save(&self, target: &Path, replace: bool) -> Result<(), MabossError> {
        let name = target
            .file_name()
            .and_then(|it| it.to_str())
            .unwrap_or_default();
        if !SAVE_NAME_REGEX.is_match(name) {
            return Err(MabossError::InvalidIdentifier(format!(
                "`{}` is not a valid result directory name.",
                target.display()
            )));
        }
        if target.exists() {
            if !replace {
                return Err(MabossError::Io(std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    format!("Directory `{}` already exists.", target.display()),
                )));
            }
            if !name.starts_with(REPLACEABLE_PREFIX) {
                return Err(MabossError::Io(std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    format!("Only directories starting with `{REPLACEABLE_PREFIX}` can be replaced."),
                )));
            }
            std::fs::remove_dir_all(target)?;
        }
        std::fs::create_dir(target)?;
        std::fs::copy(self.bnd_file(), target.join(format!("{name}.bnd")))?;
        std::fs::copy(self.cfg_file(), target.join(format!("{name}.cfg")))?;
        let exports = format!("{}_", self.prefix);
        for entry in std::fs::read_dir(self.path())? {
            let entry = entry?;
            let file_name = entry.file_name();
            let is_export = file_name
                .to_str()
                .map_or(false, |it| it.starts_with(&exports));
            if is_export && entry.file_type()?.is_file() {
                std::fs::copy(entry.path(), target.join(&file_name))?;
            }
        }
        tracing::info!(target = %target.display(), "Simulation workspace saved.");
        Ok(())
    }

    /// Remove the workspace, reporting errors which would be ignored by `drop`.
    pub fn close(self) -> Result<(), MabossError> {
        self.directory.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::result::ResultSource;
    use crate::simulation::{Simulation, Workspace};
    use crate::{MabossError, Network, Node};
    use std::io::ErrorKind;

    fn simulation() -> Simulation {
        let network = Network::new(vec![Node::new("A", "!A").unwrap()]).unwrap();
        Simulation::new(network)
    }

    #[test]
    fn workspace_writes_inputs_and_cleans_up() {
        let simulation = simulation();
        let workspace = Workspace::create(&simulation, "run").unwrap();
        let path = workspace.path().to_path_buf();
        assert_eq!(
            simulation.network().to_string(),
            std::fs::read_to_string(workspace.bnd_file()).unwrap()
        );
        assert_eq!(
            simulation.to_string(),
            std::fs::read_to_string(workspace.cfg_file()).unwrap()
        );
        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn workspace_results_outlive_workspace() {
        let workspace = Workspace::create(&simulation(), "run").unwrap();
        let stored = workspace.result();
        std::fs::write(stored.probtraj_file(), "Time\tState\tProba\n0\tA\t1\n").unwrap();
        std::fs::write(stored.fp_file(), "Fixed Points (0)\n").unwrap();
        let result = workspace.load_result().unwrap();
        workspace.close().unwrap();
        assert_eq!(Some(1.0), result.last_states_probtraj().unwrap().get(0, "A"));
        assert!(matches!(stored.states_probtraj(), Err(MabossError::Io(_))));
    }

    #[test]
    fn workspace_rejects_bad_prefix() {
        assert!(matches!(
            Workspace::create(&simulation(), "../run"),
            Err(MabossError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn save_copies_inputs_and_exports() {
        let simulation = simulation();
        let workspace = Workspace::create(&simulation, "run").unwrap();
        std::fs::write(workspace.result().probtraj_file(), "Time\tState\tProba\n").unwrap();
        let output = tempfile::tempdir().unwrap();
        let target = output.path().join("saved-run");
        workspace.save(&target, false).unwrap();
        workspace.close().unwrap();

        let mut files = std::fs::read_dir(&target)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        files.sort();
        assert_eq!(
            vec!["run_probtraj.csv", "saved-run.bnd", "saved-run.cfg"],
            files
        );
        assert_eq!(
            simulation.to_string(),
            std::fs::read_to_string(target.join("saved-run.cfg")).unwrap()
        );
    }

    #[test]
    fn save_does_not_overwrite_by_default() {
        let workspace = Workspace::create(&simulation(), "run").unwrap();
        let output = tempfile::tempdir().unwrap();
        for name in ["kept", "rpl_kept"] {
            let target = output.path().join(name);
            std::fs::create_dir(&target).unwrap();
            std::fs::write(target.join("old.txt"), "old").unwrap();
            match workspace.save(&target, false) {
                Err(MabossError::Io(error)) => assert_eq!(ErrorKind::AlreadyExists, error.kind()),
                other => panic!("Unexpected result {:?}", other),
            }
            assert!(target.join("old.txt").exists());
        }
        // Replacing is only allowed for `rpl_` directories.
        let target = output.path().join("kept");
        assert!(matches!(
            workspace.save(&target, true),
            Err(MabossError::Io(_))
        ));
        assert!(target.join("old.txt").exists());
        assert!(!target.join("kept.bnd").exists());
    }

    #[test]
    fn save_replaces_rpl_directories() {
        let workspace = Workspace::create(&simulation(), "run").unwrap();
        let output = tempfile::tempdir().unwrap();
        let target = output.path().join("rpl_run");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("old.txt"), "old").unwrap();
        workspace.save(&target, true).unwrap();
        assert!(!target.join("old.txt").exists());
        assert!(target.join("rpl_run.bnd").exists());
        assert!(target.join("rpl_run.cfg").exists());
    }

    #[test]
    fn save_rejects_bad_names() {
        let workspace = Workspace::create(&simulation(), "run").unwrap();
        let output = tempfile::tempdir().unwrap();
        for name in ["bad name", "bad.dir"] {
            assert!(matches!(
                workspace.save(&output.path().join(name), false),
                Err(MabossError::InvalidIdentifier(_))
            ));
        }
        assert!(matches!(
            workspace.save(std::path::Path::new(".."), false),
            Err(MabossError::InvalidIdentifier(_))
        ));
    }
}
