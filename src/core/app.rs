use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::core::files::FileBrowser;
use crate::core::forms::{FormError, GenerationForm, TagEditor};
use crate::domain::{
    Collection, DisplayedImage, EditMode, ImageFile, ImageLayout, ImageListing, NaturalSize,
    TagRequest,
};
use crate::render::overlay::OverlayGeometry;
use crate::session::messages::{Feedback, PointerMsg};
use crate::session::state::{AnnotationError, AnnotationSession, ArrowTicket, CropTicket};
use crate::store::{DatasetStore, DeleteReport, Generator, SavedImage};

/// Side panel shown next to the image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    #[default]
    Generate,
    Edit,
    Tags,
}

/// How the view catches up after an image was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// A new file appeared; fetch the listing again
    RefreshListing,
    /// The displayed file changed in place; reload it under a new URL
    BumpCacheKey,
    /// The saved image is no longer displayed; the view needs nothing
    Unchanged,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Application state over a dataset store
pub struct App<S> {
    store: S,
    listing: ImageListing,
    session: AnnotationSession,
    panel: Panel,
    /// Appended to image URLs so overwritten files are fetched again
    cache_key: u64,
    pub browser: FileBrowser,
    pub tags: TagEditor,
    pub generation: GenerationForm,
}

impl<S: DatasetStore> App<S> {
    pub fn new(store: S, config: &AppConfig) -> Self {
        Self {
            store,
            listing: ImageListing::default(),
            session: AnnotationSession::new(config.min_crop_size),
            panel: Panel::default(),
            cache_key: 0,
            browser: FileBrowser::default(),
            tags: TagEditor::default(),
            generation: GenerationForm::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn listing(&self) -> &ImageListing {
        &self.listing
    }

    pub fn session(&self) -> &AnnotationSession {
        &self.session
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn set_panel(&mut self, panel: Panel) {
        self.panel = panel;
    }

    pub fn cache_key(&self) -> u64 {
        self.cache_key
    }

    /// Fetch the listing again; on failure the old listing stays
    pub async fn refresh(&mut self) -> bool {
        match self.store.list_images().await {
            Ok(listing) => {
                log::info!(
                    "Listed {} originals, {} datasets",
                    listing.originals.len(),
                    listing.datasets.len()
                );
                self.listing = listing;
                true
            }
            Err(err) => {
                log::warn!("Failed to list images: {:?}", err);
                false
            }
        }
    }

    // ========================================================================
    // Displayed image
    // ========================================================================

    /// Show an image, or mark it for deletion while in select mode
    pub fn select_image(&mut self, file: ImageFile, natural: NaturalSize) {
        if self.browser.select_mode() {
            self.browser.toggle(&file.path);
            return;
        }
        self.session.select_image(DisplayedImage::new(file, natural));
    }

    pub fn set_layout(&mut self, layout: Option<ImageLayout>) {
        self.session.set_layout(layout);
    }

    pub fn displayed_path(&self) -> Option<&str> {
        self.session.image().map(DisplayedImage::path)
    }

    /// URL of the displayed image, versioned with the cache key
    pub fn image_url(&self) -> Option<String> {
        self.displayed_path()
            .map(|path| format!("{}?v={}", path, self.cache_key))
    }

    // ========================================================================
    // Edit panel
    // ========================================================================

    pub fn set_mode(&mut self, mode: EditMode) -> Feedback {
        self.session.set_mode(mode)
    }

    /// Pointer input reaches the session only while the edit panel is open
    pub fn handle_pointer(&mut self, msg: PointerMsg) -> Feedback {
        if self.panel != Panel::Edit {
            return Feedback::Ignored;
        }
        self.session.handle_pointer(msg)
    }

    pub fn cancel_crop(&mut self) -> Feedback {
        self.session.cancel_crop()
    }

    pub fn clear_arrow(&mut self) -> Feedback {
        self.session.clear_arrow()
    }

    pub fn overlay_geometry(&self) -> OverlayGeometry {
        if self.panel != Panel::Edit {
            return OverlayGeometry::default();
        }
        self.session.overlay_geometry()
    }

    /// Lock the pending selection and hand out its store request
    ///
    /// The host sends `ticket.request` to the store and passes the result to
    /// [`Self::finish_crop`]. Gestures keep flowing in between.
    pub fn begin_crop(&mut self) -> Result<CropTicket, SubmitError> {
        Ok(self.session.confirm_crop()?)
    }

    /// Settle a crop with the store's result
    pub async fn finish_crop(
        &mut self,
        ticket: &CropTicket,
        result: anyhow::Result<SavedImage>,
    ) -> Result<Recovery, SubmitError> {
        self.session.finish_crop_commit(ticket, result.is_ok());
        let saved = result.inspect_err(|err| log::warn!("Crop failed: {:?}", err))?;
        log::debug!("Crop stored as {}", saved.path);
        self.refresh().await;
        Ok(Recovery::RefreshListing)
    }

    /// Cut the pending selection into a new dataset image
    pub async fn confirm_crop(&mut self) -> Result<Recovery, SubmitError> {
        let ticket = self.begin_crop()?;
        let result = self.store.cut_image(ticket.request.clone()).await;
        self.finish_crop(&ticket, result).await
    }

    /// Lock the arrow points and hand out their store request
    pub fn begin_arrow(&mut self) -> Result<ArrowTicket, SubmitError> {
        Ok(self.session.submit_arrow()?)
    }

    /// Settle an arrow save with the store's result
    ///
    /// Originals gain a new dataset file, so the listing is fetched again.
    /// Dataset images change in place, so only the cache key moves, and only
    /// while the saved image is still the displayed one.
    pub async fn finish_arrow(
        &mut self,
        ticket: &ArrowTicket,
        result: anyhow::Result<SavedImage>,
    ) -> Result<Recovery, SubmitError> {
        self.session.finish_arrow_commit(ticket, result.is_ok());
        let saved = result.inspect_err(|err| log::warn!("Saving arrow failed: {:?}", err))?;
        log::debug!("Arrow stored as {}", saved.path);

        match Collection::of_path(&ticket.request.image_path) {
            Some(Collection::Originals) => {
                self.refresh().await;
                Ok(Recovery::RefreshListing)
            }
            _ if ticket.epoch() != self.session.epoch() => Ok(Recovery::Unchanged),
            _ => {
                self.cache_key = self.cache_key.wrapping_add(1);
                Ok(Recovery::BumpCacheKey)
            }
        }
    }

    /// Burn the arrow into the image
    pub async fn save_arrow(&mut self) -> Result<Recovery, SubmitError> {
        let ticket = self.begin_arrow()?;
        let result = self.store.save_arrow_image(ticket.request.clone()).await;
        self.finish_arrow(&ticket, result).await
    }

    // ========================================================================
    // File browser
    // ========================================================================

    pub fn select_all(&mut self, collection: Collection) {
        self.browser.select_all(&self.listing, collection);
    }

    /// Delete every marked image; `None` when nothing is marked
    pub async fn delete_selected(&mut self) -> Result<Option<DeleteReport>, SubmitError> {
        if self.browser.count() == 0 {
            return Ok(None);
        }
        let report = self.store.delete_images(self.browser.marked()).await?;
        let shown_deleted = self
            .displayed_path()
            .is_some_and(|path| report.deleted.iter().any(|deleted| deleted == path));
        if shown_deleted {
            self.session.clear_image();
        }
        self.refresh().await;
        self.browser.clear();
        if !report.failed.is_empty() {
            log::warn!(
                "Deleted {} images, {} failed",
                report.deleted.len(),
                report.failed.len()
            );
        }
        Ok(Some(report))
    }

    // ========================================================================
    // Tags
    // ========================================================================

    /// Save the typed tag for the displayed image
    pub async fn save_manual_tag(&mut self) -> Result<(), SubmitError> {
        let image_path = self
            .displayed_path()
            .ok_or(FormError::NoImageSelected)?
            .to_string();
        let tag_content = self.tags.manual_tag()?;
        self.store
            .save_tag(TagRequest {
                image_path,
                tag_content: tag_content.clone(),
            })
            .await?;
        self.tags.current = tag_content;
        self.refresh().await;
        Ok(())
    }

    /// Caption the displayed image and store the caption as its tag
    pub async fn generate_tag(&mut self, generator: &impl Generator) -> Result<String, SubmitError> {
        let request = self.tags.tag_request(self.displayed_path())?;
        let image_path = request.image_path.clone();
        let text = generator.generate_tag(request).await?;
        self.store
            .save_tag(TagRequest {
                image_path,
                tag_content: text.clone(),
            })
            .await?;
        self.tags.current = text.clone();
        self.refresh().await;
        Ok(text)
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Generate an image; on success the form is reset, on failure kept
    pub async fn generate_image(
        &mut self,
        generator: &impl Generator,
    ) -> Result<SavedImage, SubmitError> {
        let request = self.generation.request()?;
        log::info!(
            "Generating image with {} and {} references",
            request.model.as_str(),
            request.references.len()
        );
        let saved = generator
            .generate_image(request)
            .await
            .inspect_err(|err| log::warn!("Image generation failed: {:?}", err))?;
        self.generation.reset();
        self.refresh().await;
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::domain::{ArrowRequest, Bounds, CropRequest, PixelPoint, Point};
    use crate::store::{GenerateImageRequest, GenerateTagRequest, ImageModel};

    /// Clones share their call records, like handles to one service
    #[derive(Clone, Default)]
    struct MockStore {
        listing: ImageListing,
        fail: bool,
        list_calls: Rc<RefCell<usize>>,
        crops: Rc<RefCell<Vec<CropRequest>>>,
        arrows: Rc<RefCell<Vec<ArrowRequest>>>,
        tags: Rc<RefCell<Vec<TagRequest>>>,
    }

    impl MockStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn check(&self) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("store unavailable");
            }
            Ok(())
        }
    }

    impl DatasetStore for MockStore {
        async fn list_images(&self) -> anyhow::Result<ImageListing> {
            *self.list_calls.borrow_mut() += 1;
            Ok(self.listing.clone())
        }

        async fn cut_image(&self, request: CropRequest) -> anyhow::Result<SavedImage> {
            self.check()?;
            self.crops.borrow_mut().push(request);
            Ok(SavedImage {
                path: "datasets/crop.png".into(),
            })
        }

        async fn save_arrow_image(&self, request: ArrowRequest) -> anyhow::Result<SavedImage> {
            self.check()?;
            let path = request.image_path.clone();
            self.arrows.borrow_mut().push(request);
            Ok(SavedImage { path })
        }

        async fn save_tag(&self, request: TagRequest) -> anyhow::Result<()> {
            self.check()?;
            self.tags.borrow_mut().push(request);
            Ok(())
        }

        async fn delete_images(&self, paths: Vec<String>) -> anyhow::Result<DeleteReport> {
            self.check()?;
            Ok(DeleteReport {
                deleted: paths,
                failed: Vec::new(),
            })
        }
    }

    struct MockGenerator {
        fail: bool,
        images: RefCell<Vec<GenerateImageRequest>>,
    }

    impl MockGenerator {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                images: RefCell::new(Vec::new()),
            }
        }
    }

    impl Generator for MockGenerator {
        async fn generate_image(&self, request: GenerateImageRequest) -> anyhow::Result<SavedImage> {
            if self.fail {
                anyhow::bail!("model offline");
            }
            self.images.borrow_mut().push(request);
            Ok(SavedImage {
                path: "originals/generated.png".into(),
            })
        }

        async fn generate_tag(&self, request: GenerateTagRequest) -> anyhow::Result<String> {
            if self.fail {
                anyhow::bail!("model offline");
            }
            Ok(format!("caption for {}", request.image_path))
        }
    }

    fn app(store: MockStore) -> App<MockStore> {
        let mut app = App::new(store, &AppConfig::default());
        app.set_panel(Panel::Edit);
        app
    }

    fn show(app: &mut App<MockStore>, path: &str, natural: (u32, u32), shown: (f32, f32)) {
        let collection = Collection::of_path(path).expect("dataset path");
        let name = path.split_once('/').map_or(path, |(_, name)| name);
        app.select_image(
            ImageFile::new(collection, name, false),
            NaturalSize::new(natural.0, natural.1),
        );
        app.set_layout(Some(ImageLayout::filling(Bounds::new(0.0, 0.0, shown.0, shown.1))));
    }

    fn drag(app: &mut App<MockStore>, from: (f32, f32), to: (f32, f32)) {
        app.handle_pointer(PointerMsg::Down(Point::new(from.0, from.1)));
        app.handle_pointer(PointerMsg::Move(Point::new(to.0, to.1)));
        app.handle_pointer(PointerMsg::Up);
    }

    fn place_arrow(app: &mut App<MockStore>) {
        app.set_mode(EditMode::Arrow);
        app.handle_pointer(PointerMsg::Click(Point::new(24.0, 16.0)));
        app.handle_pointer(PointerMsg::Click(Point::new(100.0, 180.0)));
    }

    #[tokio::test]
    async fn test_confirm_crop_sends_natural_rect_and_refreshes() {
        let mut app = app(MockStore::default());
        show(&mut app, "originals/big.png", (4000, 3000), (800.0, 600.0));
        drag(&mut app, (100.0, 100.0), (300.0, 250.0));

        assert_eq!(app.confirm_crop().await.expect("crop"), Recovery::RefreshListing);
        assert_eq!(
            app.store().crops.borrow().as_slice(),
            &[CropRequest {
                image_path: "originals/big.png".into(),
                x: 500,
                y: 500,
                width: 1000,
                height: 750,
            }]
        );
        assert_eq!(*app.store().list_calls.borrow(), 1);
        assert!(app.session().crop().is_idle());
    }

    #[tokio::test]
    async fn test_failed_crop_keeps_pending_box() {
        let mut app = app(MockStore::failing());
        show(&mut app, "originals/big.png", (4000, 3000), (800.0, 600.0));
        drag(&mut app, (100.0, 100.0), (300.0, 250.0));

        assert!(matches!(app.confirm_crop().await, Err(SubmitError::Store(_))));
        assert!(app.session().crop_pending());
        assert_eq!(*app.store().list_calls.borrow(), 0);
    }

    #[tokio::test]
    async fn test_confirm_without_selection_is_rejected() {
        let mut app = app(MockStore::default());
        assert!(matches!(
            app.confirm_crop().await,
            Err(SubmitError::Annotation(AnnotationError::NoImageSelected))
        ));
        show(&mut app, "originals/big.png", (4000, 3000), (800.0, 600.0));
        drag(&mut app, (100.0, 100.0), (105.0, 300.0));
        assert!(matches!(
            app.confirm_crop().await,
            Err(SubmitError::Annotation(AnnotationError::CropNotPending))
        ));
        assert!(app.store().crops.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_arrow_on_original_refreshes_listing() {
        let mut app = app(MockStore::default());
        show(&mut app, "originals/big.png", (4000, 3000), (800.0, 600.0));
        place_arrow(&mut app);

        assert_eq!(app.save_arrow().await.expect("arrow"), Recovery::RefreshListing);
        assert_eq!(
            app.store().arrows.borrow()[0],
            ArrowRequest::new("originals/big.png", PixelPoint::new(120, 80), PixelPoint::new(500, 900))
        );
        assert_eq!(*app.store().list_calls.borrow(), 1);
        assert_eq!(app.cache_key(), 0);
        assert!(app.session().arrow().is_empty());
    }

    #[tokio::test]
    async fn test_arrow_on_dataset_bumps_cache_key() {
        let mut app = app(MockStore::default());
        show(&mut app, "datasets/big.png", (4000, 3000), (800.0, 600.0));
        assert_eq!(app.image_url().as_deref(), Some("datasets/big.png?v=0"));
        place_arrow(&mut app);

        assert_eq!(app.save_arrow().await.expect("arrow"), Recovery::BumpCacheKey);
        assert_eq!(*app.store().list_calls.borrow(), 0);
        assert_eq!(app.image_url().as_deref(), Some("datasets/big.png?v=1"));
        assert!(app.session().arrow().is_empty());
    }

    #[tokio::test]
    async fn test_failed_arrow_keeps_points_for_retry() {
        let mut app = app(MockStore::failing());
        show(&mut app, "datasets/big.png", (4000, 3000), (800.0, 600.0));
        place_arrow(&mut app);
        let before = *app.session().arrow();

        assert!(app.save_arrow().await.is_err());
        assert_eq!(*app.session().arrow(), before);
        assert!(app.session().arrow_ready());
        assert_eq!(app.cache_key(), 0);
    }

    #[tokio::test]
    async fn test_crop_confirmed_while_arrow_save_in_flight() {
        let mut app = app(MockStore::default());
        show(&mut app, "datasets/big.png", (4000, 3000), (800.0, 600.0));
        place_arrow(&mut app);

        let arrow = app.begin_arrow().expect("complete arrow");
        let store = app.store().clone();
        let saving = store.save_arrow_image(arrow.request.clone());

        assert!(matches!(
            app.begin_arrow(),
            Err(SubmitError::Annotation(AnnotationError::SubmissionInFlight(_)))
        ));
        assert!(
            app.handle_pointer(PointerMsg::Click(Point::new(5.0, 5.0)))
                .is_ignored()
        );

        app.set_mode(EditMode::Crop);
        drag(&mut app, (100.0, 100.0), (300.0, 250.0));
        assert_eq!(app.confirm_crop().await.expect("crop"), Recovery::RefreshListing);
        assert_eq!(app.store().crops.borrow().len(), 1);

        let result = saving.await;
        assert_eq!(
            app.finish_arrow(&arrow, result).await.expect("arrow"),
            Recovery::BumpCacheKey
        );
        assert_eq!(app.cache_key(), 1);
        assert!(app.session().arrow().is_empty());
        assert!(app.session().crop().is_idle());
    }

    #[tokio::test]
    async fn test_arrow_finish_after_image_switch_leaves_new_image_alone() {
        let mut app = app(MockStore::default());
        show(&mut app, "datasets/big.png", (4000, 3000), (800.0, 600.0));
        place_arrow(&mut app);
        let arrow = app.begin_arrow().expect("complete arrow");

        show(&mut app, "datasets/other.png", (4000, 3000), (800.0, 600.0));
        app.handle_pointer(PointerMsg::Click(Point::new(24.0, 16.0)));
        let fresh = *app.session().arrow();

        let store = app.store().clone();
        let result = store.save_arrow_image(arrow.request.clone()).await;
        assert_eq!(
            app.finish_arrow(&arrow, result).await.expect("saved"),
            Recovery::Unchanged
        );
        assert_eq!(app.cache_key(), 0);
        assert_eq!(*app.session().arrow(), fresh);
        assert_eq!(fresh.start, Some(PixelPoint::new(120, 80)));
        assert_eq!(app.image_url().as_deref(), Some("datasets/other.png?v=0"));
    }

    #[tokio::test]
    async fn test_crop_finish_after_image_switch_keeps_new_selection() {
        let mut app = app(MockStore::default());
        show(&mut app, "originals/big.png", (4000, 3000), (800.0, 600.0));
        drag(&mut app, (100.0, 100.0), (300.0, 250.0));
        let crop = app.begin_crop().expect("pending crop");

        show(&mut app, "originals/next.png", (800, 600), (800.0, 600.0));
        drag(&mut app, (10.0, 10.0), (60.0, 60.0));

        let store = app.store().clone();
        let result = store.cut_image(crop.request.clone()).await;
        assert_eq!(
            app.finish_crop(&crop, result).await.expect("saved"),
            Recovery::RefreshListing
        );
        assert!(app.session().crop_pending());
    }

    #[tokio::test]
    async fn test_pointer_needs_edit_panel() {
        let mut app = app(MockStore::default());
        show(&mut app, "originals/big.png", (4000, 3000), (800.0, 600.0));
        app.set_panel(Panel::Tags);
        assert!(
            app.handle_pointer(PointerMsg::Down(Point::new(1.0, 1.0)))
                .is_ignored()
        );
        assert!(app.session().crop().is_idle());
    }

    #[tokio::test]
    async fn test_select_mode_marks_instead_of_showing() {
        let mut app = app(MockStore::default());
        show(&mut app, "datasets/shown.png", (100, 100), (100.0, 100.0));
        app.browser.toggle_select_mode();
        app.select_image(
            ImageFile::new(Collection::Datasets, "other.png", false),
            NaturalSize::new(10, 10),
        );
        assert_eq!(app.displayed_path(), Some("datasets/shown.png"));
        assert!(app.browser.is_marked("datasets/other.png"));
    }

    #[tokio::test]
    async fn test_delete_selected_drops_deleted_display() {
        let mut app = app(MockStore::default());
        assert_eq!(app.delete_selected().await.expect("noop"), None);
        assert_eq!(*app.store().list_calls.borrow(), 0);

        show(&mut app, "datasets/shown.png", (100, 100), (100.0, 100.0));
        app.browser.toggle_select_mode();
        app.browser.toggle("datasets/shown.png");
        app.browser.toggle("originals/a.png");

        let report = app.delete_selected().await.expect("delete").expect("report");
        assert_eq!(report.deleted, vec!["datasets/shown.png", "originals/a.png"]);
        assert_eq!(app.displayed_path(), None);
        assert_eq!(app.browser.count(), 0);
        assert_eq!(*app.store().list_calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_manual_tag_saved_and_listing_refreshed() {
        let mut app = app(MockStore::default());
        app.tags.manual_text = "cat".into();
        assert!(matches!(
            app.save_manual_tag().await,
            Err(SubmitError::Form(FormError::NoImageSelected))
        ));

        show(&mut app, "datasets/a.png", (100, 100), (100.0, 100.0));
        app.save_manual_tag().await.expect("tag");
        assert_eq!(app.tags.current, "cat");
        assert_eq!(
            app.store().tags.borrow()[0],
            TagRequest {
                image_path: "datasets/a.png".into(),
                tag_content: "cat".into(),
            }
        );
        assert_eq!(*app.store().list_calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_generate_tag_stores_caption() {
        let mut app = app(MockStore::default());
        show(&mut app, "datasets/a.png", (100, 100), (100.0, 100.0));
        let generator = MockGenerator::new(false);

        assert!(matches!(
            app.generate_tag(&generator).await,
            Err(SubmitError::Form(FormError::MissingPrompts))
        ));
        app.tags.prompts.system = "describe".into();
        app.tags.prompts.user = "briefly".into();

        let text = app.generate_tag(&generator).await.expect("caption");
        assert_eq!(text, "caption for datasets/a.png");
        assert_eq!(app.tags.current, text);
        assert_eq!(app.store().tags.borrow()[0].tag_content, text);
    }

    #[tokio::test]
    async fn test_generate_image_resets_form_only_on_success() {
        let mut app = app(MockStore::default());
        app.generation.prompts.system = "photo".into();
        app.generation.prompts.user = "a dog".into();
        app.generation.model = ImageModel::Flux;

        assert!(app.generate_image(&MockGenerator::new(true)).await.is_err());
        assert_eq!(app.generation.prompts.user, "a dog");

        let generator = MockGenerator::new(false);
        let saved = app.generate_image(&generator).await.expect("generated");
        assert_eq!(saved.path, "originals/generated.png");
        assert_eq!(generator.images.borrow()[0].model, ImageModel::Flux);
        assert!(app.generation.prompts.user.is_empty());
        assert_eq!(*app.store().list_calls.borrow(), 1);
    }
}
