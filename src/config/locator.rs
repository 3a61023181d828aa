use crate::models::YamlStore;
use crate::state::ContextManager;
use camino::{Utf8Path, Utf8PathBuf};

/// Resolves the backing file of a logical store.
///
/// Called on every store access; implementations must not cache results across
/// a context change.
pub trait StoreLocator: Send + Sync {
    fn locate(&self, store: YamlStore) -> Utf8PathBuf;
}

impl<F> StoreLocator for F
where
    F: Fn(YamlStore) -> Utf8PathBuf + Send + Sync,
{
    fn locate(&self, store: YamlStore) -> Utf8PathBuf {
        self(store)
    }
}

/// On-disk layout of a CLASSIC installation, rooted at the application directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    base_dir: Utf8PathBuf,
    context: ContextManager,
}

impl DataLayout {
    pub fn new<P: AsRef<Utf8Path>>(base_dir: P, context: ContextManager) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            context,
        }
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    pub fn context(&self) -> &ContextManager {
        &self.context
    }

    /// `CLASSIC Data`
    pub fn data_dir(&self) -> Utf8PathBuf {
        self.base_dir.join("CLASSIC Data")
    }

    /// `CLASSIC Data/databases`
    pub fn databases_dir(&self) -> Utf8PathBuf {
        self.data_dir().join("databases")
    }

    /// `CLASSIC Data/databases/{Game} FID Mods.txt`
    pub fn fid_mods_file(&self) -> Utf8PathBuf {
        let game = self.context.read(|vars| vars.game.clone());
        self.databases_dir().join(format!("{} FID Mods.txt", game))
    }

    /// `CLASSIC Data/databases/{Game} FID Main.txt`
    pub fn fid_main_file(&self) -> Utf8PathBuf {
        let game = self.context.read(|vars| vars.game.clone());
        self.databases_dir().join(format!("{} FID Main.txt", game))
    }

    /// `CLASSIC Data/databases/{Game} FormIDs.db`
    pub fn formid_db_file(&self) -> Utf8PathBuf {
        let game = self.context.read(|vars| vars.game.clone());
        self.databases_dir().join(format!("{} FormIDs.db", game))
    }

    /// `CLASSIC GFS Report.md`
    pub fn report_file(&self) -> Utf8PathBuf {
        self.base_dir.join("CLASSIC GFS Report.md")
    }
}

impl StoreLocator for DataLayout {
    fn locate(&self, store: YamlStore) -> Utf8PathBuf {
        let game = self.context.read(|vars| vars.game.clone());
        match store {
            YamlStore::Main => self.databases_dir().join("CLASSIC Main.yaml"),
            YamlStore::Settings => self.base_dir.join("CLASSIC Settings.yaml"),
            YamlStore::Ignore => self.base_dir.join("CLASSIC Ignore.yaml"),
            YamlStore::Game => self.databases_dir().join(format!("CLASSIC {}.yaml", game)),
            YamlStore::GameLocal => self.data_dir().join(format!("CLASSIC {} Local.yaml", game)),
            YamlStore::Test => self.base_dir.join("tests").join("test_settings.yaml"),
        }
    }
}
