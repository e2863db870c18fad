use photo_grid_domain::{
    compute_cells, CellRect, DataUri, GridSpec, ViewerAction, ViewerEffect, ViewerState,
};
use tracing::{info, warn};

use crate::{
    ApplicationError, BootstrapCommand, CloseSavedCommand, GridCellsQuery, ImageReadPipeline,
    ImageStore, MeasureImageCommand, PollUploadCommand, ReadOutcome, ReadRequest,
    SaveActiveCommand, SelectSavedCommand, ToggleSavedCommand, UploadImageCommand,
};

pub struct ApplicationService {
    store: ImageStore,
    reader: Box<dyn ImageReadPipeline>,
    grid: GridSpec,
    state: ViewerState,
}

impl ApplicationService {
    pub fn new(store: ImageStore, reader: Box<dyn ImageReadPipeline>) -> Self {
        Self {
            store,
            reader,
            grid: GridSpec::default(),
            state: ViewerState::default(),
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn bootstrap(&mut self, _command: BootstrapCommand) -> &ViewerState {
        let active = self.store.load_active();
        let saved = self.store.load_saved();
        info!(
            has_active = active.is_some(),
            saved = saved.len(),
            "image store loaded"
        );
        self.dispatch(ViewerAction::Loaded { active, saved });
        &self.state
    }

    /// Starts reading the selected file in the background. Returns `None`
    /// when no file was selected.
    pub fn upload_image(
        &mut self,
        command: UploadImageCommand,
    ) -> Result<Option<u64>, ApplicationError> {
        let Some(path) = command.path else {
            return Ok(None);
        };
        let sequence = self.reader.submit_read(ReadRequest { path })?;
        self.dispatch(ViewerAction::ReadStarted { sequence });
        Ok(Some(sequence))
    }

    /// Applies the newest finished read, if any. Returns true when the
    /// active image changed.
    pub fn poll_upload(&mut self, _command: PollUploadCommand) -> Result<bool, ApplicationError> {
        let Some(outcome) = self.reader.try_receive()? else {
            return Ok(false);
        };
        let before = self.state.active_image.clone();
        self.apply_read(outcome)?;
        Ok(self.state.active_image != before)
    }

    pub fn upload_image_blocking(
        &mut self,
        command: UploadImageCommand,
    ) -> Result<Option<DataUri>, ApplicationError> {
        let Some(path) = command.path else {
            return Ok(None);
        };
        let outcome = self.reader.read_blocking(ReadRequest { path });
        self.dispatch(ViewerAction::ReadStarted {
            sequence: outcome.sequence,
        });
        self.apply_read(outcome)?;
        Ok(self.state.active_image.clone())
    }

    pub fn save_active(&mut self, _command: SaveActiveCommand) -> &[DataUri] {
        let Some(active) = self.state.active_image.clone() else {
            return &self.state.saved_images;
        };
        let saved = self.store.append_saved(&active);
        info!(saved = saved.len(), "active image saved");
        self.dispatch(ViewerAction::SavedListUpdated { saved });
        &self.state.saved_images
    }

    pub fn select_saved(&mut self, command: SelectSavedCommand) -> Result<(), ApplicationError> {
        let count = self.state.saved_images.len();
        if command.index >= count {
            return Err(ApplicationError::NotFound(format!(
                "saved image {} (have {count})",
                command.index
            )));
        }
        self.dispatch(ViewerAction::SelectSaved {
            index: command.index,
        });
        Ok(())
    }

    pub fn toggle_saved(&mut self, _command: ToggleSavedCommand) -> bool {
        self.dispatch(ViewerAction::ToggleSavedModal);
        self.state.show_saved_modal
    }

    pub fn close_saved(&mut self, _command: CloseSavedCommand) {
        self.dispatch(ViewerAction::CloseSavedModal);
    }

    pub fn measure_image(&mut self, command: MeasureImageCommand) -> Result<(), ApplicationError> {
        // Validates the dimensions before they reach the state.
        compute_cells(command.width, command.height, self.grid)?;
        self.dispatch(ViewerAction::ImageMeasured {
            width: command.width,
            height: command.height,
        });
        Ok(())
    }

    /// Overlay cells in natural image pixels. Before the image is measured
    /// every cell is empty.
    pub fn grid_cells(&self, _query: GridCellsQuery) -> Result<Vec<CellRect>, ApplicationError> {
        let (width, height) = self
            .state
            .image_size
            .map(|size| (size.width, size.height))
            .unwrap_or((0.0, 0.0));
        Ok(compute_cells(width, height, self.grid)?)
    }

    fn apply_read(&mut self, outcome: ReadOutcome) -> Result<(), ApplicationError> {
        match outcome.result {
            Ok(image) => {
                info!(
                    sequence = outcome.sequence,
                    mime = image.mime_type(),
                    bytes = image.len(),
                    "image read"
                );
                self.dispatch(ViewerAction::ImageRead {
                    sequence: outcome.sequence,
                    image,
                });
                Ok(())
            }
            Err(error) => {
                warn!(sequence = outcome.sequence, %error, "image read failed");
                let latest = self.state.pending_read == Some(outcome.sequence);
                self.dispatch(ViewerAction::ReadFailed {
                    sequence: outcome.sequence,
                });
                // A superseded read failing is not the caller's problem.
                if latest {
                    Err(error)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn dispatch(&mut self, action: ViewerAction) {
        for effect in self.state.apply(action) {
            match effect {
                ViewerEffect::PersistActive(image) => self.store.set_active(&image),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use super::*;
    use crate::{KeyValueStore, ACTIVE_IMAGE_KEY, SAVED_IMAGES_KEY};

    #[derive(Clone, Default)]
    struct FakeStore {
        values: Rc<RefCell<HashMap<String, String>>>,
    }

    impl KeyValueStore for FakeStore {
        fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
            Ok(self.values.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError> {
            self.values
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    /// Maps file names to canned data URIs; outcomes are released in
    /// submission order when the test calls `finish_all`.
    #[derive(Default)]
    struct FakeReader {
        next_sequence: Cell<u64>,
        queued: RefCell<VecDeque<(u64, PathBuf)>>,
        finished: RefCell<Vec<ReadOutcome>>,
    }

    impl FakeReader {
        fn read(&self, path: &Path) -> Result<DataUri, ApplicationError> {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default();
            if name == "broken" {
                return Err(ApplicationError::Decode("not an image".to_string()));
            }
            Ok(uri(&name.to_ascii_uppercase()))
        }

        fn next(&self) -> u64 {
            let sequence = self.next_sequence.get() + 1;
            self.next_sequence.set(sequence);
            sequence
        }
    }

    impl ImageReadPipeline for Rc<FakeReader> {
        fn submit_read(&self, request: ReadRequest) -> Result<u64, ApplicationError> {
            let sequence = self.next();
            self.queued.borrow_mut().push_back((sequence, request.path));
            Ok(sequence)
        }

        fn try_receive(&self) -> Result<Option<ReadOutcome>, ApplicationError> {
            while let Some((sequence, path)) = self.queued.borrow_mut().pop_front() {
                let result = self.read(&path);
                self.finished.borrow_mut().push(ReadOutcome { sequence, result });
            }
            Ok(self.finished.borrow_mut().pop())
        }

        fn read_blocking(&self, request: ReadRequest) -> ReadOutcome {
            ReadOutcome {
                sequence: self.next(),
                result: self.read(&request.path),
            }
        }
    }

    fn uri(payload: &str) -> DataUri {
        DataUri::from_parts("image/png", payload).expect("uri")
    }

    fn build(session: FakeStore, durable: FakeStore) -> (ApplicationService, Rc<FakeReader>) {
        let reader = Rc::new(FakeReader::default());
        let service = ApplicationService::new(
            ImageStore::new(Box::new(session), Box::new(durable)),
            Box::new(Rc::clone(&reader)),
        );
        (service, reader)
    }

    fn upload(path: &str) -> UploadImageCommand {
        UploadImageCommand {
            path: Some(PathBuf::from(path)),
        }
    }

    #[test]
    fn bootstrap_restores_both_tiers() {
        let session = FakeStore::default();
        let durable = FakeStore::default();
        session
            .set(ACTIVE_IMAGE_KEY, "data:image/png;base64,AAAA")
            .expect("set");
        durable
            .set(SAVED_IMAGES_KEY, r#"["data:image/png;base64,BBBB"]"#)
            .expect("set");
        let (mut service, _) = build(session, durable);

        let state = service.bootstrap(BootstrapCommand);
        assert_eq!(state.active_image, Some(uri("AAAA")));
        assert_eq!(state.saved_images, vec![uri("BBBB")]);
    }

    #[test]
    fn upload_without_file_is_a_no_op() {
        let session = FakeStore::default();
        let (mut service, _) = build(session.clone(), FakeStore::default());
        service.bootstrap(BootstrapCommand);

        let sequence = service
            .upload_image(UploadImageCommand::default())
            .expect("upload");
        assert_eq!(sequence, None);
        assert_eq!(service.state(), &ViewerState::default());
        assert!(session.values.borrow().is_empty());
    }

    #[test]
    fn background_upload_persists_active_image() {
        let session = FakeStore::default();
        let (mut service, _) = build(session.clone(), FakeStore::default());

        service.upload_image(upload("/photos/a.png")).expect("upload");
        assert_eq!(service.state().active_image, None);

        assert!(service.poll_upload(PollUploadCommand).expect("poll"));
        assert_eq!(service.state().active_image, Some(uri("A")));
        assert_eq!(
            session.values.borrow().get(ACTIVE_IMAGE_KEY).cloned(),
            Some("data:image/png;base64,A".to_string())
        );
        assert!(!service.poll_upload(PollUploadCommand).expect("poll"));
    }

    #[test]
    fn later_upload_supersedes_earlier_one() {
        let (mut service, _) = build(FakeStore::default(), FakeStore::default());
        service.upload_image(upload("/photos/first.png")).expect("upload");
        service.upload_image(upload("/photos/second.png")).expect("upload");

        assert!(service.poll_upload(PollUploadCommand).expect("poll"));
        assert_eq!(service.state().active_image, Some(uri("SECOND")));
        assert!(!service.poll_upload(PollUploadCommand).expect("poll"));
        assert_eq!(service.state().active_image, Some(uri("SECOND")));
    }

    #[test]
    fn failed_read_keeps_previous_image() {
        let (mut service, _) = build(FakeStore::default(), FakeStore::default());
        service
            .upload_image_blocking(upload("/photos/a.png"))
            .expect("upload");

        let result = service.upload_image_blocking(upload("/photos/broken.png"));
        assert!(matches!(result, Err(ApplicationError::Decode(_))));
        assert_eq!(service.state().active_image, Some(uri("A")));
        assert_eq!(service.state().pending_read, None);
    }

    #[test]
    fn polling_a_failed_upload_reports_the_error() {
        let (mut service, _) = build(FakeStore::default(), FakeStore::default());
        service.upload_image(upload("/photos/a.png")).expect("upload");
        assert!(service.poll_upload(PollUploadCommand).expect("poll"));

        service.upload_image(upload("/photos/broken.png")).expect("upload");
        let result = service.poll_upload(PollUploadCommand);
        assert!(matches!(result, Err(ApplicationError::Decode(_))));
        assert_eq!(service.state().active_image, Some(uri("A")));
        assert_eq!(service.state().pending_read, None);
    }

    #[test]
    fn superseded_failed_upload_is_ignored() {
        let (mut service, _) = build(FakeStore::default(), FakeStore::default());
        service.upload_image(upload("/photos/broken.png")).expect("upload");
        service.upload_image(upload("/photos/b.png")).expect("upload");

        assert!(service.poll_upload(PollUploadCommand).expect("poll"));
        assert!(!service.poll_upload(PollUploadCommand).expect("stale failure"));
        assert_eq!(service.state().active_image, Some(uri("B")));
    }

    #[test]
    fn save_after_durable_list_is_corrupted_keeps_duplicates() {
        let durable = FakeStore::default();
        durable
            .set(
                SAVED_IMAGES_KEY,
                r#"["data:image/png;base64,A","data:image/png;base64,A"]"#,
            )
            .expect("set");
        let (mut service, _) = build(FakeStore::default(), durable.clone());
        service.bootstrap(BootstrapCommand);

        durable.set(SAVED_IMAGES_KEY, "{corrupted").expect("set");
        service
            .upload_image_blocking(upload("/photos/c.png"))
            .expect("upload");
        let saved = service.save_active(SaveActiveCommand).to_vec();
        assert_eq!(saved, vec![uri("A"), uri("A"), uri("C")]);

        let (mut reloaded, _) = build(FakeStore::default(), durable);
        assert_eq!(reloaded.bootstrap(BootstrapCommand).saved_images, saved);
    }

    #[test]
    fn save_twice_keeps_duplicates() {
        let durable = FakeStore::default();
        let (mut service, _) = build(FakeStore::default(), durable.clone());
        service
            .upload_image_blocking(upload("/photos/a.png"))
            .expect("upload");

        service.save_active(SaveActiveCommand);
        let saved = service.save_active(SaveActiveCommand).to_vec();
        assert_eq!(saved, vec![uri("A"), uri("A")]);

        let (mut reloaded, _) = build(FakeStore::default(), durable);
        assert_eq!(
            reloaded.bootstrap(BootstrapCommand).saved_images,
            vec![uri("A"), uri("A")]
        );
    }

    #[test]
    fn save_without_active_image_is_a_no_op() {
        let durable = FakeStore::default();
        let (mut service, _) = build(FakeStore::default(), durable.clone());
        assert!(service.save_active(SaveActiveCommand).is_empty());
        assert!(durable.values.borrow().is_empty());
    }

    #[test]
    fn selecting_saved_image_makes_it_active_and_persists_it() {
        let session = FakeStore::default();
        let (mut service, _) = build(session.clone(), FakeStore::default());
        service
            .upload_image_blocking(upload("/photos/a.png"))
            .expect("upload");
        service.save_active(SaveActiveCommand);
        service
            .upload_image_blocking(upload("/photos/b.png"))
            .expect("upload");
        assert!(service.toggle_saved(ToggleSavedCommand));

        service
            .select_saved(SelectSavedCommand { index: 0 })
            .expect("select");
        assert_eq!(service.state().active_image, Some(uri("A")));
        assert!(!service.state().show_saved_modal);
        assert_eq!(
            session.values.borrow().get(ACTIVE_IMAGE_KEY).cloned(),
            Some("data:image/png;base64,A".to_string())
        );

        assert!(matches!(
            service.select_saved(SelectSavedCommand { index: 5 }),
            Err(ApplicationError::NotFound(_))
        ));
    }

    #[test]
    fn grid_follows_measured_size() {
        let (mut service, _) = build(FakeStore::default(), FakeStore::default());
        service
            .upload_image_blocking(upload("/photos/a.png"))
            .expect("upload");

        let cells = service.grid_cells(GridCellsQuery).expect("cells");
        assert!(cells.iter().all(|cell| cell.area() == 0.0));

        service
            .measure_image(MeasureImageCommand {
                width: 1000.0,
                height: 500.0,
            })
            .expect("measure");
        let cells = service.grid_cells(GridCellsQuery).expect("cells");
        assert_eq!(cells.len(), 16);
        assert_eq!(cells[6].left, 500.0);
        assert_eq!(cells[6].top, 125.0);
        assert_eq!(cells[6].width, 250.0);
        assert_eq!(cells[6].height, 125.0);
    }

    #[test]
    fn measure_rejects_invalid_dimensions() {
        let (mut service, _) = build(FakeStore::default(), FakeStore::default());
        let result = service.measure_image(MeasureImageCommand {
            width: -4.0,
            height: 10.0,
        });
        assert!(matches!(result, Err(ApplicationError::Domain(_))));
    }
}
