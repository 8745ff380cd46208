use crate::speeds::{coerce_speed, Edge, EdgeDurations};
use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// Flat key-value store of strings kept in a small TOML file.
#[derive(Debug, Clone)]
pub struct KvStore {
    path: PathBuf,
}

impl KvStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not find data directory"))?;
        Ok(data_dir.join("trichi").join("storage.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<toml::Table> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let table = contents
            .parse::<toml::Table>()
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(table)
    }

    /// Missing keys read as `None`. Numbers written by hand are accepted as
    /// their decimal text.
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let table = self.read_table()?;
        Ok(match table.get(key) {
            Some(toml::Value::String(s)) => Some(s.clone()),
            Some(toml::Value::Integer(i)) => Some(i.to_string()),
            Some(toml::Value::Float(f)) => Some(f.to_string()),
            Some(_) => Some(String::new()),
            None => None,
        })
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut table = match self.read_table() {
            Ok(table) => table,
            Err(e) => {
                warn!("Discarding unreadable store {}: {:#}", self.path.display(), e);
                toml::Table::new()
            }
        };
        table.insert(key.to_string(), toml::Value::String(value.to_string()));

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string(&table)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

/// Reads the three edge durations. Never fails: read errors are logged and
/// every missing or invalid value becomes the default.
pub fn load_speeds(store: &KvStore) -> EdgeDurations {
    let mut speeds = EdgeDurations::default();
    let mut raw: [Option<String>; 3] = Default::default();

    for edge in Edge::ALL {
        match store.get_item(edge.key()) {
            Ok(value) => raw[edge.index()] = value,
            Err(e) => {
                error!("Error loading saved speeds: {:#}", e);
                return EdgeDurations::default();
            }
        }
    }

    info!(
        "Reloading speed settings: {:?} : {:?} : {:?}",
        raw[0], raw[1], raw[2]
    );

    for edge in Edge::ALL {
        if let Some(text) = &raw[edge.index()] {
            speeds.set(edge, coerce_speed(text));
        }
    }
    speeds
}

/// Persists one duration. Failures are logged and otherwise ignored.
pub fn save_speed(store: &KvStore, edge: Edge, ms: u32) {
    if let Err(e) = store.set_item(edge.key(), &ms.to_string()) {
        error!("Error saving {}: {:#}", edge.key(), e);
    }
}

#[derive(Debug)]
enum StorageRequest {
    Load,
    Save { edge: Edge, ms: u32 },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageEvent {
    Loaded(EdgeDurations),
}

/// Background thread owning the store. Requests are handled in the order
/// they were sent; results come back through a calloop channel.
pub struct StorageWorker {
    requests: mpsc::Sender<StorageRequest>,
    handle: Option<JoinHandle<()>>,
}

impl StorageWorker {
    pub fn spawn(store: KvStore, events: calloop::channel::Sender<StorageEvent>) -> Result<Self> {
        let (requests, inbox) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("trichi-storage".to_string())
            .spawn(move || {
                info!("Storage worker using {}", store.path().display());
                for request in inbox {
                    match request {
                        StorageRequest::Load => {
                            let speeds = load_speeds(&store);
                            if events.send(StorageEvent::Loaded(speeds)).is_err() {
                                warn!("UI loop gone, dropping loaded speeds");
                            }
                        }
                        StorageRequest::Save { edge, ms } => save_speed(&store, edge, ms),
                        StorageRequest::Shutdown => break,
                    }
                }
            })
            .context("spawning storage worker")?;

        Ok(Self {
            requests,
            handle: Some(handle),
        })
    }

    pub fn load(&self) {
        self.send(StorageRequest::Load);
    }

    pub fn save(&self, edge: Edge, ms: u32) {
        self.send(StorageRequest::Save { edge, ms });
    }

    fn send(&self, request: StorageRequest) {
        if let Err(e) = self.requests.send(request) {
            error!("Storage worker stopped, dropping {:?}", e.0);
        }
    }
}

impl Drop for StorageWorker {
    fn drop(&mut self) {
        let _ = self.requests.send(StorageRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Storage worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calloop::channel::{self, Event};
    use calloop::EventLoop;
    use std::time::Duration;

    fn temp_store(name: &str) -> KvStore {
        let dir = std::env::temp_dir().join(format!("trichi-test-{}", std::process::id()));
        let path = dir.join(format!("{}.toml", name));
        let _ = std::fs::remove_file(&path);
        KvStore::open(path)
    }

    fn load_through_worker(store: KvStore) -> EdgeDurations {
        let mut event_loop: EventLoop<Option<EdgeDurations>> = EventLoop::try_new().unwrap();
        let (sender, events) = channel::channel();
        event_loop
            .handle()
            .insert_source(events, |event, _, loaded| {
                if let Event::Msg(StorageEvent::Loaded(speeds)) = event {
                    *loaded = Some(speeds);
                }
            })
            .unwrap();

        let worker = StorageWorker::spawn(store, sender).unwrap();
        worker.load();

        let mut loaded = None;
        for _ in 0..100 {
            event_loop
                .dispatch(Some(Duration::from_millis(20)), &mut loaded)
                .unwrap();
            if loaded.is_some() {
                break;
            }
        }
        loaded.expect("worker never answered")
    }

    #[test]
    fn missing_store_yields_defaults() {
        let store = temp_store("missing");
        assert_eq!(store.get_item("speed1").unwrap(), None);
        assert_eq!(load_speeds(&store), EdgeDurations::default());
    }

    #[test]
    fn invalid_values_fall_back_per_key() {
        let store = temp_store("invalid");
        store.set_item("speed1", "500").unwrap();
        store.set_item("speed2", "bad").unwrap();
        store.set_item("speed3", "").unwrap();

        assert_eq!(load_speeds(&store), EdgeDurations::new(500, 1000, 1000));
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let store = temp_store("corrupt");
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "speed1 = [unterminated").unwrap();

        assert!(store.get_item("speed1").is_err());
        assert_eq!(load_speeds(&store), EdgeDurations::default());

        // A write replaces the unreadable file
        save_speed(&store, Edge::First, 640);
        assert_eq!(load_speeds(&store).speed1, 640);
    }

    #[test]
    fn hand_written_numbers_are_accepted() {
        let store = temp_store("numbers");
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "speed1 = 320\nspeed2 = 1500.0\nspeed3 = true\n").unwrap();

        assert_eq!(load_speeds(&store), EdgeDurations::new(320, 1500, 1000));
    }

    #[test]
    fn set_item_keeps_other_keys() {
        let store = temp_store("keep");
        store.set_item("speed1", "111").unwrap();
        store.set_item("theme", "dark").unwrap();
        store.set_item("speed1", "222").unwrap();

        assert_eq!(store.get_item("speed1").unwrap().as_deref(), Some("222"));
        assert_eq!(store.get_item("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn saved_speed_survives_restart() {
        let store = temp_store("restart");
        {
            let (sender, _events) = channel::channel();
            let worker = StorageWorker::spawn(store.clone(), sender).unwrap();
            worker.save(Edge::First, 750);
            // dropping joins the thread after the queued save
        }

        let reloaded = load_through_worker(store);
        assert_eq!(reloaded.speed1, 750);
        assert_eq!(reloaded.speed2, 1000);
        assert_eq!(reloaded.speed3, 1000);
    }
}
