//! Navigation sessions over YAML sources.
//!
//! A [`Navigator`] reads lines through a [`TextHost`], indexes them with
//! `yamlnav-core`, caches the results per source and hands them to a
//! [`Picker`]. Confirmed picks move the host cursor and are recorded in a
//! bounded [`HistoryLedger`].

pub mod cache;
pub mod config;
pub mod editor;
pub mod history;
pub mod host;
pub mod logging;
pub mod navigator;
pub mod picker;

pub use cache::{Cache, Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError};
pub use editor::{EditError, edit_value};
pub use history::{HistoryEntry, HistoryKind, HistoryLedger};
pub use host::{HostError, SourceId, TextHost, VfsHost};
pub use navigator::{Jump, NavError, Navigator};
pub use picker::{PickAction, Picker, PickerEntry, Selection};
