use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct BootstrapCommand;

#[derive(Debug, Clone, Default)]
pub struct UploadImageCommand {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct PollUploadCommand;

#[derive(Debug, Clone, Default)]
pub struct SaveActiveCommand;

#[derive(Debug, Clone, Copy)]
pub struct SelectSavedCommand {
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ToggleSavedCommand;

#[derive(Debug, Clone, Default)]
pub struct CloseSavedCommand;

#[derive(Debug, Clone, Copy)]
pub struct MeasureImageCommand {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default)]
pub struct GridCellsQuery;
