//! Column-browser desktop for tree-structured items: layout, selection,
//! drag and drop, and the background plumbing that feeds it.

pub mod config;
pub mod desktop;
pub mod events;
pub mod hooks;
pub mod item;
pub mod keymap;
pub mod measure;
pub mod worker;

pub use config::{AppConfig, ConfigError, DesktopConfig};
pub use desktop::{Desktop, DraggedItem, Gesture, PointerButton, PointerInput};
pub use events::{Activation, DeletionPlan, DesktopEvent, DropOutcome};
pub use item::{IconHandle, Item, ItemId, ItemKind, ItemSpec, Payload, Shortcut};
pub use keymap::{Action, KeyChord, Keymap};
pub use measure::{CharWidthMeasure, TextMeasure};
pub use worker::{StopFlag, TaskOutput, TaskRunner};
