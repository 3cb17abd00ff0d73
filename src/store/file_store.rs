use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use simd_r_drive::storage_engine::DataStore;
use simd_r_drive::storage_engine::traits::{DataStoreReader, DataStoreWriter};

use super::{Catalog, Collection, CollectionChange, Entity, RecordStore};
use crate::constants::store::{
    BITCODE_PREFIX, COLLECTION_PREFIX, COLLECTION_RECORD_VERSION, DEFAULT_STORE_DIR,
    DEFAULT_STORE_FILENAME, META_KEY, STORE_VERSION,
};
use crate::data::EntityKind;
use crate::errors::IngestError;
use crate::types::LookupKey;

#[derive(Clone, Copy, Debug, bitcode::Encode, bitcode::Decode)]
/// Versioned metadata header stored in file-backed catalog stores.
struct StoreMeta {
    version: u8,
}

/// File-backed record store for persistent catalogs.
///
/// Each collection is persisted under its own key as one payload, so a commit
/// replaces a whole collection in a single write.
pub struct FileRecordStore {
    store: DataStore,
    path: PathBuf,
}

impl fmt::Debug for FileRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRecordStore")
            .field("path", &self.path)
            .finish()
    }
}

impl FileRecordStore {
    /// Open (or create) a file-backed store at `path`.
    ///
    /// A directory path resolves to the default filename inside it.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, IngestError> {
        let path = prepare_store_path(path.into())?;
        let store = DataStore::open(path.as_path()).map_err(store_error("open"))?;
        let store = Self { store, path };
        store.verify_metadata()?;
        Ok(store)
    }

    /// Default store file path under the crate's default store directory.
    pub fn default_path() -> PathBuf {
        Self::default_path_in_dir(DEFAULT_STORE_DIR)
    }

    /// Default store file path inside a custom directory.
    pub fn default_path_in_dir<P: AsRef<Path>>(dir: P) -> PathBuf {
        dir.as_ref().join(DEFAULT_STORE_FILENAME)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn verify_metadata(&self) -> Result<(), IngestError> {
        let Some(bytes) = self.read(META_KEY)? else {
            let meta = StoreMeta {
                version: STORE_VERSION,
            };
            return self.write(META_KEY, &frame(STORE_VERSION, &bitcode::encode(&meta)));
        };
        let body = unframe(&bytes, STORE_VERSION, "catalog store")?;
        let meta: StoreMeta = bitcode::decode(body).map_err(|err| {
            IngestError::Store(format!("failed to decode catalog store metadata: {err}"))
        })?;
        if meta.version != STORE_VERSION {
            return Err(IngestError::Store(format!(
                "catalog store version mismatch (expected {STORE_VERSION}, found {})",
                meta.version
            )));
        }
        Ok(())
    }

    fn read_collection<E: Entity>(&self) -> Result<Collection<E>, IngestError> {
        match self.read(&collection_key(E::KIND))? {
            Some(bytes) => decode_collection(E::KIND, &bytes),
            None => Ok(Collection::new()),
        }
    }

    fn write_collection<E: Entity>(&self, collection: Collection<E>) -> Result<(), IngestError> {
        let payload = encode_collection(E::KIND, collection)?;
        self.write(&collection_key(E::KIND), &payload)
    }

    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, IngestError> {
        let entry = self.store.read(key).map_err(store_error("read"))?;
        Ok(entry.map(|entry| entry.as_ref().to_vec()))
    }

    fn write(&self, key: &[u8], payload: &[u8]) -> Result<(), IngestError> {
        self.store
            .write(key, payload)
            .map(|_| ())
            .map_err(store_error("write"))
    }
}

impl RecordStore for FileRecordStore {
    fn snapshot(&self) -> Result<Catalog, IngestError> {
        Ok(Catalog {
            resource_types: self.read_collection()?,
            frameworks: self.read_collection()?,
            topics: self.read_collection()?,
            documents: self.read_collection()?,
        })
    }

    fn commit(&self, change: CollectionChange) -> Result<(), IngestError> {
        match change {
            CollectionChange::ResourceTypes(collection) => self.write_collection(collection),
            CollectionChange::Frameworks(collection) => self.write_collection(collection),
            CollectionChange::Topics(collection) => self.write_collection(collection),
            CollectionChange::Documents(collection) => self.write_collection(collection),
        }
    }
}

/// Records in insertion order plus the lookup-key index.
///
/// The index is stored as-is: replaying records in insertion order would hand
/// a shared key to the first holder instead of the latest upsert.
type StoredCollection<E> = (Vec<E>, Vec<(LookupKey, <E as Entity>::Id)>);

fn collection_key(kind: EntityKind) -> Vec<u8> {
    [COLLECTION_PREFIX, kind.as_str().as_bytes()].concat()
}

fn encode_collection<E: Entity>(
    kind: EntityKind,
    collection: Collection<E>,
) -> Result<Vec<u8>, IngestError> {
    let keys = collection
        .lookup_keys()
        .map(|(key, id)| (key, id.clone()))
        .collect();
    let stored: StoredCollection<E> = (collection.into_records(), keys);
    let body = bitcode::serialize(&stored)
        .map_err(|err| IngestError::Store(format!("failed to encode {kind} collection: {err}")))?;
    Ok(frame(COLLECTION_RECORD_VERSION, &body))
}

fn decode_collection<E: Entity>(
    kind: EntityKind,
    bytes: &[u8],
) -> Result<Collection<E>, IngestError> {
    if bytes.is_empty() {
        return Ok(Collection::new());
    }
    let body = unframe(bytes, COLLECTION_RECORD_VERSION, kind.as_str())?;
    let (records, keys): StoredCollection<E> = bitcode::deserialize(body)
        .map_err(|err| IngestError::Store(format!("corrupt {kind} collection record: {err}")))?;
    Ok(Collection::from_parts(records, keys))
}

/// `[version][BITCODE_PREFIX][body]`
fn frame(version: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 2);
    out.extend_from_slice(&[version, BITCODE_PREFIX]);
    out.extend_from_slice(body);
    out
}

fn unframe<'b>(bytes: &'b [u8], version: u8, what: &str) -> Result<&'b [u8], IngestError> {
    match bytes {
        [found, BITCODE_PREFIX, body @ ..] if *found == version => Ok(body),
        [found, BITCODE_PREFIX, ..] => Err(IngestError::Store(format!(
            "{what} record version mismatch (expected {version}, found {found})"
        ))),
        _ => Err(IngestError::Store(format!(
            "{what} record is missing its bitcode prefix"
        ))),
    }
}

/// Resolve a directory to the default filename inside it and create parents.
fn prepare_store_path(path: PathBuf) -> Result<PathBuf, IngestError> {
    let path = if path.is_dir() {
        path.join(DEFAULT_STORE_FILENAME)
    } else {
        path
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(path)
}

fn store_error(action: &'static str) -> impl Fn(io::Error) -> IngestError {
    move |err| IngestError::Store(format!("catalog store {action} failed: {err}"))
}
