use clap::Subcommand;
use studydesk_core::model::SettingKey;
use studydesk_core::Event;

use super::{finish, open_store, print_json};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show all settings
    Show {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Flip a setting (sound, dark-mode, auto-rotate-tips, notifications)
    Toggle {
        key: SettingKey,
    },
    /// Set a setting explicitly
    Set {
        key: SettingKey,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        SettingsAction::Show { json } => {
            let settings = *store.settings();
            if json {
                print_json(&settings)?;
            } else {
                for key in SettingKey::ALL {
                    let state = if settings.get(key) { "on" } else { "off" };
                    println!("{:<17} {state}", key.as_str());
                }
            }
        }
        SettingsAction::Toggle { key } => {
            let enabled = store.toggle_setting(key);
            if let Some((message, _)) = (Event::SettingToggled { key, enabled }).notification() {
                println!("{message}");
            }
        }
        SettingsAction::Set { key, value } => {
            store.set_setting(key, value);
            println!("{}", key.toggled_message(value));
        }
    }
    finish(store)
}
