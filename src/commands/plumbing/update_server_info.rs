use crate::areas::repository::Repository;
use crate::errors::Result;
use anyhow::Context;

impl Repository {
    /// Write `info/refs` so the git directory can be served over dumb HTTP
    ///
    /// Returns the path written. Loose objects and `HEAD` are already in the
    /// layout dumb HTTP clients expect.
    pub fn update_server_info(&self) -> Result<std::path::PathBuf> {
        let git_dir = self
            .git_dir()
            .context("An in-memory repository has no git directory to publish")?;

        let content = self
            .list_branches()?
            .into_iter()
            .map(|reference| format!("{}\t{}\n", reference.target, reference.name))
            .collect::<String>();

        let info_dir = git_dir.join("info");
        std::fs::create_dir_all(&info_dir)
            .with_context(|| format!("Unable to create directory {}", info_dir.display()))?;
        let info_refs = info_dir.join("refs");
        std::fs::write(&info_refs, content)
            .with_context(|| format!("Unable to write {}", info_refs.display()))?;

        tracing::debug!(path = %info_refs.display(), "updated server info");

        Ok(info_refs)
    }
}
