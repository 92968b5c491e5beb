pub mod config;
pub mod data;
pub mod history;
pub mod note;
pub mod settings;
pub mod stats;
pub mod task;
pub mod timer;
pub mod tip;

use serde::Serialize;
use studydesk_core::error::EntityKind;
use studydesk_core::model::SettingKey;
use studydesk_core::{Config, CoreError, JsonFileSink, Store, SystemClock};

/// Opens the store in the data directory.
///
/// A store that has never been saved picks up `tips.auto_rotate` from the
/// config.
pub fn open_store() -> Result<Store, Box<dyn std::error::Error>> {
    let sink = JsonFileSink::open()?;
    let fresh = !sink.path().exists();
    let mut store = Store::load(Box::new(sink), Box::new(SystemClock))?;
    if fresh {
        let config = Config::load_or_default();
        store.set_setting(SettingKey::AutoRotateTips, config.tips.auto_rotate);
    }
    Ok(store)
}

/// Fails the command if any of its saves did not reach disk.
pub fn finish(mut store: Store) -> Result<(), Box<dyn std::error::Error>> {
    match store.take_save_error() {
        Some(e) => Err(CoreError::from(e).into()),
        None => Ok(()),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolves a full id or a unique prefix of one.
pub fn resolve_id<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    needle: &str,
    entity: EntityKind,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut matches = Vec::new();
    for id in ids {
        if id == needle {
            return Ok(id.to_string());
        }
        if !needle.is_empty() && id.starts_with(needle) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [only] => Ok(only.to_string()),
        [] => Err(CoreError::not_found(entity, needle).into()),
        _ => Err(format!(
            "ambiguous {} id prefix: {needle}",
            entity.to_string().to_lowercase()
        )
        .into()),
    }
}

/// First eight characters of an id, for tables.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
