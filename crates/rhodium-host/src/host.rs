use crate::{HostResult, RhodiumConfig, SecretManager};
use rhodium_store::{
    Database, IdGenerator, Installation, Session, bootstrap, load_installation, reinitialize,
};
use tracing::info;

/// How `RhodiumHost::start` treats an existing database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Keep stored parameters, counters, and items; seed only what is missing.
    #[default]
    Preserve,
    /// Drop everything and bootstrap a new installation.
    Reinitialize,
}

/// An opened, bootstrapped installation.
#[derive(Debug, Clone)]
pub struct RhodiumHost {
    config: RhodiumConfig,
    db: Database,
    installation: Installation,
    generator: IdGenerator,
}

impl RhodiumHost {
    /// Open the database and run bootstrap, in that order.
    pub fn start(config: RhodiumConfig, mode: StartMode) -> HostResult<Self> {
        let db = Database::open(config.database_path(), &config.database_options())?;
        let mut session = db.session()?;
        let installation = match mode {
            StartMode::Preserve => bootstrap(&mut session)?,
            StartMode::Reinitialize => reinitialize(&mut session)?,
        };
        drop(session);
        info!(
            path = %db.path().display(),
            node_id = %installation.node_id,
            "host started"
        );
        Ok(Self {
            generator: IdGenerator::from_installation(&installation),
            config,
            db,
            installation,
        })
    }

    /// Open an installation that must already be bootstrapped. No parameters or counters
    /// are written.
    pub fn attach(config: RhodiumConfig) -> HostResult<Self> {
        let db = Database::open(config.database_path(), &config.database_options())?;
        let session = db.session()?;
        let installation = load_installation(&session)?;
        drop(session);
        Ok(Self {
            generator: IdGenerator::from_installation(&installation),
            config,
            db,
            installation,
        })
    }

    pub fn config(&self) -> &RhodiumConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn session(&self) -> HostResult<Session> {
        Ok(self.db.session()?)
    }

    /// The installation as it was when the host started.
    pub fn installation(&self) -> &Installation {
        &self.installation
    }

    pub fn generator(&self) -> &IdGenerator {
        &self.generator
    }

    pub fn secrets(&self) -> SecretManager {
        SecretManager::new(self.config.secret_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HostError;
    use rhodium_store::{StoreError, generate_id};
    use tempfile::TempDir;

    fn config(tmp: &TempDir) -> RhodiumConfig {
        RhodiumConfig::default().with_data_dir(tmp.path())
    }

    #[test]
    fn start_bootstraps_and_issues() {
        let tmp = TempDir::new().expect("tmpdir");
        let host = RhodiumHost::start(config(&tmp), StartMode::Preserve).expect("start");
        assert!(tmp.path().join("rhodium.db").exists());

        let mut session = host.session().expect("session");
        let id = host.generator().generate(&mut session).expect("generate");
        assert_eq!(id.node(), host.installation().node_id);
        assert_eq!(id.counter(), host.installation().counter + 1);
    }

    #[test]
    fn restart_preserves_installation() {
        let tmp = TempDir::new().expect("tmpdir");
        let first = RhodiumHost::start(config(&tmp), StartMode::Preserve).expect("start");
        let mut session = first.session().expect("session");
        generate_id(&mut session).expect("generate");
        drop(session);
        drop(first);

        let attached = RhodiumHost::attach(config(&tmp)).expect("attach");
        let again = RhodiumHost::start(config(&tmp), StartMode::Preserve).expect("restart");
        assert_eq!(again.installation(), attached.installation());
    }

    #[test]
    fn attach_requires_bootstrap() {
        let tmp = TempDir::new().expect("tmpdir");
        let err = RhodiumHost::attach(config(&tmp)).expect_err("not bootstrapped");
        assert!(matches!(err, HostError::Store(StoreError::MissingParameter(_))));
    }

    #[test]
    fn secrets_live_next_to_the_database() {
        let tmp = TempDir::new().expect("tmpdir");
        let host = RhodiumHost::start(config(&tmp), StartMode::Preserve).expect("start");
        assert_eq!(host.secrets().path(), tmp.path().join("rhodium_secret"));
    }
}
