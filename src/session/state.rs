use crate::annotations::handlers::{
    begin_crop_commit, handle_arrow, handle_crop, settle_crop_commit,
};
use crate::domain::{
    ArrowPoints, ArrowRequest, CoordinateMapper, CropPhase, CropRequest, DisplayedImage, EditMode,
    ImageLayout, Point,
};
use crate::render::overlay::{OverlayGeometry, compute_overlay};
use crate::session::messages::{ArrowAction, CropAction, Feedback, PointerMsg};

/// Which annotation a submission belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    Crop,
    Arrow,
}

impl std::fmt::Display for SubmitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SubmitKind::Crop => "crop",
            SubmitKind::Arrow => "arrow",
        })
    }
}

/// Reasons a submission is refused before it reaches the store
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnnotationError {
    #[error("no image selected")]
    NoImageSelected,
    #[error("no crop selection waiting for confirmation")]
    CropNotPending,
    #[error("arrow needs both a start and an end point")]
    ArrowIncomplete,
    #[error("{0} submission already in flight")]
    SubmissionInFlight(SubmitKind),
    #[error("image is not laid out yet")]
    LayoutUnavailable,
}

/// A crop handed out for commit; pass it back to [`AnnotationSession::finish_crop_commit`]
#[derive(Debug, Clone, PartialEq)]
pub struct CropTicket {
    epoch: u64,
    pub request: CropRequest,
}

impl CropTicket {
    /// Image generation the crop was taken from
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// An arrow handed out for commit; pass it back to [`AnnotationSession::finish_arrow_commit`]
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowTicket {
    epoch: u64,
    pub request: ArrowRequest,
}

impl ArrowTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Annotation state for the displayed image
///
/// Owns the crop selection, the arrow points and the edit mode. Selecting
/// another image resets both models; switching mode never does.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    image: Option<DisplayedImage>,
    mode: EditMode,
    crop: CropPhase,
    arrow: ArrowPoints,
    arrow_in_flight: bool,
    /// Bumped on every image change so late results can be recognized
    epoch: u64,
    min_crop_size: f32,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl AnnotationSession {
    pub fn new(min_crop_size: f32) -> Self {
        Self {
            image: None,
            mode: EditMode::default(),
            crop: CropPhase::Idle,
            arrow: ArrowPoints::default(),
            arrow_in_flight: false,
            epoch: 0,
            min_crop_size,
        }
    }

    // ------------------------------------------------------------------
    // Displayed image
    // ------------------------------------------------------------------

    /// Show another image; drops every annotation of the previous one
    pub fn select_image(&mut self, image: DisplayedImage) {
        log::debug!("Displaying {} ({}x{})", image.path(), image.natural.width, image.natural.height);
        self.image = Some(image);
        self.reset_annotations();
    }

    /// Show nothing; drops every annotation
    pub fn clear_image(&mut self) {
        self.image = None;
        self.reset_annotations();
    }

    fn reset_annotations(&mut self) {
        self.crop = CropPhase::Idle;
        self.arrow = ArrowPoints::default();
        self.arrow_in_flight = false;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Update the measured layout (resize, first paint); keeps annotations
    pub fn set_layout(&mut self, layout: Option<ImageLayout>) {
        if let Some(image) = self.image.as_mut() {
            image.layout = layout;
        }
    }

    pub fn image(&self) -> Option<&DisplayedImage> {
        self.image.as_ref()
    }

    /// Changes whenever the displayed image does
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn mapper(&self) -> Option<CoordinateMapper> {
        let image = self.image.as_ref()?;
        CoordinateMapper::new(image.layout?.image, image.natural)
    }

    // ------------------------------------------------------------------
    // Edit mode
    // ------------------------------------------------------------------

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Redirect pointer input; both models keep their data
    pub fn set_mode(&mut self, mode: EditMode) -> Feedback {
        if self.mode == mode {
            return Feedback::Ignored;
        }
        self.mode = mode;
        Feedback::ModeChanged(mode)
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    /// Dispatch a pointer message to the model of the active mode
    pub fn handle_pointer(&mut self, msg: PointerMsg) -> Feedback {
        match msg {
            PointerMsg::Down(at) => self.pointer_down(at),
            PointerMsg::Move(at) => self.pointer_move(at),
            PointerMsg::Up | PointerMsg::Leave => self.pointer_up(),
            PointerMsg::Click(at) => self.click(at),
        }
    }

    pub fn pointer_down(&mut self, at: Point) -> Feedback {
        if self.mode != EditMode::Crop {
            return Feedback::Ignored;
        }
        let Some(display) = self.surface_position(at) else {
            return Feedback::Ignored;
        };
        handle_crop(&mut self.crop, CropAction::Start(display), self.min_crop_size)
    }

    pub fn pointer_move(&mut self, at: Point) -> Feedback {
        if self.mode != EditMode::Crop || !self.crop.is_drawing() {
            return Feedback::Ignored;
        }
        let Some(mapper) = self.mapper() else {
            log::debug!("Ignoring pointer move, image not measurable");
            return Feedback::Ignored;
        };
        handle_crop(
            &mut self.crop,
            CropAction::Update(mapper.display_position(at)),
            self.min_crop_size,
        )
    }

    pub fn pointer_up(&mut self) -> Feedback {
        if self.mode != EditMode::Crop {
            return Feedback::Ignored;
        }
        handle_crop(&mut self.crop, CropAction::Finish, self.min_crop_size)
    }

    pub fn click(&mut self, at: Point) -> Feedback {
        if self.mode != EditMode::Arrow || self.arrow_in_flight {
            return Feedback::Ignored;
        }
        let Some(mapper) = self.mapper() else {
            log::debug!("Ignoring click, image not measurable");
            return Feedback::Ignored;
        };
        if !self.on_surface(at) {
            return Feedback::Ignored;
        }
        handle_arrow(&mut self.arrow, ArrowAction::Place(mapper.pointer_to_natural(at)))
    }

    /// Clamped display position for a pointer on the surface
    fn surface_position(&self, at: Point) -> Option<Point> {
        let Some(mapper) = self.mapper() else {
            log::debug!("Ignoring pointer, no measurable image");
            return None;
        };
        self.on_surface(at).then(|| mapper.display_position(at))
    }

    fn on_surface(&self, at: Point) -> bool {
        self.image
            .as_ref()
            .and_then(|image| image.layout)
            .is_some_and(|layout| layout.surface.contains(at))
    }

    // ------------------------------------------------------------------
    // Crop
    // ------------------------------------------------------------------

    pub fn crop(&self) -> &CropPhase {
        &self.crop
    }

    /// A box is waiting for confirm or cancel
    pub fn crop_pending(&self) -> bool {
        self.crop.is_pending()
    }

    /// Drop a pending box without contacting the store
    pub fn cancel_crop(&mut self) -> Feedback {
        handle_crop(&mut self.crop, CropAction::Cancel, self.min_crop_size)
    }

    /// Confirm the pending box and hand out its natural-pixel payload
    ///
    /// The box stays locked until the ticket is settled.
    pub fn confirm_crop(&mut self) -> Result<CropTicket, AnnotationError> {
        let image = self.image.as_ref().ok_or(AnnotationError::NoImageSelected)?;
        if self.crop.is_committing() {
            return Err(AnnotationError::SubmissionInFlight(SubmitKind::Crop));
        }
        if !self.crop.is_pending() {
            return Err(AnnotationError::CropNotPending);
        }
        let mapper = self.mapper().ok_or(AnnotationError::LayoutUnavailable)?;
        let path = image.path().to_string();
        let sel = begin_crop_commit(&mut self.crop).ok_or(AnnotationError::CropNotPending)?;
        let request = CropRequest::new(path, mapper.crop_rect(sel.bounds()));
        log::info!(
            "Committing crop of {}: {}x{} at ({}, {})",
            request.image_path,
            request.width,
            request.height,
            request.x,
            request.y
        );
        Ok(CropTicket {
            epoch: self.epoch,
            request,
        })
    }

    /// Settle a crop commit; a ticket from a previous image changes nothing
    pub fn finish_crop_commit(&mut self, ticket: &CropTicket, succeeded: bool) -> Feedback {
        if ticket.epoch != self.epoch {
            log::debug!("Dropping crop result for {}, image changed", ticket.request.image_path);
            return Feedback::Ignored;
        }
        settle_crop_commit(&mut self.crop, succeeded)
    }

    // ------------------------------------------------------------------
    // Arrow
    // ------------------------------------------------------------------

    pub fn arrow(&self) -> &ArrowPoints {
        &self.arrow
    }

    pub fn arrow_ready(&self) -> bool {
        self.arrow.is_complete() && !self.arrow_in_flight
    }

    pub fn arrow_in_flight(&self) -> bool {
        self.arrow_in_flight
    }

    pub fn clear_arrow(&mut self) -> Feedback {
        handle_arrow(&mut self.arrow, ArrowAction::Clear)
    }

    /// Hand out the arrow payload and lock the points until settled
    pub fn submit_arrow(&mut self) -> Result<ArrowTicket, AnnotationError> {
        let image = self.image.as_ref().ok_or(AnnotationError::NoImageSelected)?;
        if self.arrow_in_flight {
            return Err(AnnotationError::SubmissionInFlight(SubmitKind::Arrow));
        }
        let (start, end) = self.arrow.segment().ok_or(AnnotationError::ArrowIncomplete)?;
        let request = ArrowRequest::new(image.path(), start, end);
        self.arrow_in_flight = true;
        log::info!(
            "Committing arrow on {}: ({}, {}) -> ({}, {})",
            request.image_path,
            start.x,
            start.y,
            end.x,
            end.y
        );
        Ok(ArrowTicket {
            epoch: self.epoch,
            request,
        })
    }

    /// Settle an arrow commit: success clears the points, failure keeps them
    pub fn finish_arrow_commit(&mut self, ticket: &ArrowTicket, succeeded: bool) -> Feedback {
        if ticket.epoch != self.epoch {
            log::debug!("Dropping arrow result for {}, image changed", ticket.request.image_path);
            return Feedback::Ignored;
        }
        self.arrow_in_flight = false;
        if succeeded {
            handle_arrow(&mut self.arrow, ArrowAction::Clear)
        } else {
            Feedback::Ignored
        }
    }

    // ------------------------------------------------------------------
    // Overlay
    // ------------------------------------------------------------------

    /// Surface-relative geometry of the active mode's annotation
    pub fn overlay_geometry(&self) -> OverlayGeometry {
        let Some(layout) = self.image.as_ref().and_then(|image| image.layout) else {
            return OverlayGeometry::default();
        };
        let Some(mapper) = self.mapper() else {
            return OverlayGeometry::default();
        };
        compute_overlay(
            &mapper,
            layout.image_offset(),
            self.mode,
            &self.crop,
            &self.arrow,
        )
    }
}
