pub mod config;
pub mod error;
pub mod exec;
pub mod menu;
pub mod menu_file;
pub mod nav;
pub mod theme;

pub use error::{MenuError, NavError};
pub use menu::{LabelStyle, MenuEntry, MenuNode, MenuTree, NodeId};
pub use nav::{Activation, LineUpdate, Navigator};
