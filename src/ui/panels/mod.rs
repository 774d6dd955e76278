pub mod display;
pub mod files;
pub mod logs;

pub use display::DisplayPanel;
pub use files::FilesPanel;
pub use logs::LogsPanel;
