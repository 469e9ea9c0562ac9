//! Current item (image or video) and the host's frame loader.

use std::rc::Rc;

use crossbeam_channel::Receiver;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::foundation::core::{FrameIndex, Fps, ImageSize, Rect, Vec2};
use crate::foundation::error::{CanvasmarkError, CanvasmarkResult};

/// Calibration of image pixels to physical units.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeasureRegion {
    /// Region in image space.
    pub rect: Rect,
    /// Physical size of one pixel along x and y.
    pub delta: Vec2,
    /// Unit name of `delta`.
    pub unit: String,
    /// Preferred region when several are configured.
    #[serde(default)]
    pub high_priority: bool,
}

impl MeasureRegion {
    /// Whole image in pixels.
    pub fn pixels(size: ImageSize) -> Self {
        Self {
            rect: size.rect(),
            delta: Vec2::new(1.0, 1.0),
            unit: "px".to_string(),
            high_priority: true,
        }
    }
}

/// Image or video.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    /// Single image.
    Image,
    /// Frame sequence.
    Video {
        /// Number of frames.
        frame_count: u64,
        /// Source rate, when known.
        #[serde(default)]
        fps: Option<Fps>,
    },
}

/// Metadata of the item shown in a view.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemInfo {
    /// Host identifier.
    pub id: String,
    /// Frame size in pixels.
    pub size: ImageSize,
    /// Image or video.
    pub kind: ItemKind,
    /// Colorspace tag (`"RG16"`, `"sRGB"`, ...).
    #[serde(default)]
    pub colorspace: Option<String>,
    /// Configured calibrations.
    #[serde(default)]
    pub measure_regions: Vec<MeasureRegion>,
}

impl ItemInfo {
    /// Image item.
    pub fn image(id: impl Into<String>, size: ImageSize) -> Self {
        Self {
            id: id.into(),
            size,
            kind: ItemKind::Image,
            colorspace: None,
            measure_regions: Vec::new(),
        }
    }

    /// Video item.
    pub fn video(id: impl Into<String>, size: ImageSize, frame_count: u64, fps: Option<Fps>) -> Self {
        Self {
            kind: ItemKind::Video { frame_count, fps },
            ..Self::image(id, size)
        }
    }

    /// Number of frames (1 for images).
    pub fn frame_count(&self) -> u64 {
        match self.kind {
            ItemKind::Image => 1,
            ItemKind::Video { frame_count, .. } => frame_count,
        }
    }

    /// Return `true` for videos.
    pub fn is_video(&self) -> bool {
        matches!(self.kind, ItemKind::Video { .. })
    }
}

/// One loaded frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameData {
    /// Frame index.
    pub frame: FrameIndex,
    /// Pixel size.
    pub size: ImageSize,
    /// Straight RGBA8 pixels, when the provider supplies them.
    pub rgba: Option<Vec<u8>>,
}

/// Frame loader supplied by the host.
pub trait ItemProvider {
    /// Load `frame` of `item`.
    fn load_frame<'a>(
        &'a self,
        item: &'a ItemInfo,
        frame: FrameIndex,
    ) -> LocalBoxFuture<'a, CanvasmarkResult<FrameData>>;
}

/// Provider without pixel data; frames resolve immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlankProvider;

impl ItemProvider for BlankProvider {
    fn load_frame<'a>(
        &'a self,
        item: &'a ItemInfo,
        frame: FrameIndex,
    ) -> LocalBoxFuture<'a, CanvasmarkResult<FrameData>> {
        async move {
            if frame.0 >= item.frame_count() {
                return Err(CanvasmarkError::precondition(format!(
                    "frame {} out of range for item {}",
                    frame.0, item.id
                )));
            }
            Ok(FrameData {
                frame,
                size: item.size,
                rgba: None,
            })
        }
        .boxed_local()
    }
}

/// Tracks the current item, frame and pending frame load of a view.
pub struct ItemManager {
    provider: Rc<dyn ItemProvider>,
    item: Option<ItemInfo>,
    frame: FrameIndex,
    pending: Option<FrameIndex>,
    frame_data: Option<FrameData>,
    changes: Option<Receiver<ItemInfo>>,
}

impl std::fmt::Debug for ItemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemManager")
            .field("item", &self.item.as_ref().map(|i| &i.id))
            .field("frame", &self.frame)
            .field("pending", &self.pending)
            .finish()
    }
}

impl ItemManager {
    /// Manager loading frames through `provider`.
    pub fn new(provider: Rc<dyn ItemProvider>) -> Self {
        Self {
            provider,
            item: None,
            frame: FrameIndex(0),
            pending: None,
            frame_data: None,
            changes: None,
        }
    }

    /// Current item.
    pub fn item(&self) -> Option<&ItemInfo> {
        self.item.as_ref()
    }

    /// Current frame.
    pub fn frame(&self) -> FrameIndex {
        self.frame
    }

    /// Last loaded frame.
    pub fn frame_data(&self) -> Option<&FrameData> {
        self.frame_data.as_ref()
    }

    /// Number of frames of the current item (0 without item).
    pub fn frame_count(&self) -> u64 {
        self.item.as_ref().map_or(0, ItemInfo::frame_count)
    }

    /// Playback rate: item fps when known, else `fallback`.
    pub fn fps(&self, fallback: f64) -> CanvasmarkResult<Fps> {
        match self.item.as_ref().map(|i| i.kind) {
            Some(ItemKind::Video { fps: Some(fps), .. }) => Ok(fps),
            _ => Fps::from_f64(fallback),
        }
    }

    /// A frame load is pending.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Switch to `item` at frame 0, scheduling its first frame load.
    pub fn set_item(&mut self, item: ItemInfo) {
        tracing::debug!(item = %item.id, "item switched");
        self.item = Some(item);
        self.frame = FrameIndex(0);
        self.frame_data = None;
        self.pending = Some(FrameIndex(0));
    }

    /// Subscribe to host item changes.
    pub fn connect_changes(&mut self, changes: Receiver<ItemInfo>) {
        self.changes = Some(changes);
    }

    /// Latest item announced by the host since the last poll.
    pub fn poll_change(&mut self) -> Option<ItemInfo> {
        self.changes.as_ref()?.try_iter().last()
    }

    /// Schedule loading `frame`, clamped to the item. Returns the clamped frame.
    pub fn request_frame(&mut self, frame: FrameIndex) -> CanvasmarkResult<FrameIndex> {
        let count = self.frame_count();
        if count == 0 {
            return Err(CanvasmarkError::precondition("no item loaded"));
        }
        let frame = FrameIndex(frame.0.min(count - 1));
        self.pending = Some(frame);
        Ok(frame)
    }

    /// Load the pending frame, if any. Returns the frame that became current.
    pub async fn finish_loading(&mut self) -> CanvasmarkResult<Option<FrameIndex>> {
        let (Some(frame), Some(item)) = (self.pending, self.item.as_ref()) else {
            self.pending = None;
            return Ok(None);
        };
        let provider = Rc::clone(&self.provider);
        let loaded = provider.load_frame(item, frame).await;
        self.pending = None;
        let data = loaded?;
        self.frame = data.frame;
        self.frame_data = Some(data);
        Ok(Some(frame))
    }

    /// Calibration used for measurements: `None` while loading or without item; otherwise the
    /// first high-priority region of a video, its first region, or the whole image in pixels.
    pub fn measure_region(&self) -> Option<MeasureRegion> {
        if self.is_loading() {
            return None;
        }
        let item = self.item.as_ref()?;
        if item.is_video() && !item.measure_regions.is_empty() {
            return item
                .measure_regions
                .iter()
                .find(|r| r.high_priority)
                .or_else(|| item.measure_regions.first())
                .cloned();
        }
        Some(MeasureRegion::pixels(item.size))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/managers/item.rs"]
mod tests;
