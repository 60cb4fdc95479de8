//! Per-frame object catalogs and frame ordering.

use std::cmp::Ordering;

use annotation_types::{AnnotatedObject, FrameId, Timestamp};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How frame identifiers of a sequence are ordered.
///
/// A sequence is ordered numerically only when *every* identifier parses as
/// an integer; one opaque identifier switches the whole sequence to
/// lexicographic order. Mixing the two would make the order of `"10"` and
/// `"9"` depend on the other ids in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameOrdering {
    /// Integer order of the identifiers.
    #[default]
    Numeric,
    /// Byte-wise string order.
    Lexicographic,
}

impl FrameOrdering {
    /// Chooses the ordering for a set of identifiers.
    ///
    /// An empty set is numeric.
    pub fn detect<'a>(ids: impl IntoIterator<Item = &'a FrameId>) -> Self {
        if ids.into_iter().all(|id| id.as_integer().is_some()) {
            Self::Numeric
        } else {
            Self::Lexicographic
        }
    }

    /// Compares two identifiers.
    #[must_use]
    pub fn compare(self, a: &FrameId, b: &FrameId) -> Ordering {
        match self {
            Self::Numeric => match (a.as_integer(), b.as_integer()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a.as_str().cmp(b.as_str()),
            },
            Self::Lexicographic => a.as_str().cmp(b.as_str()),
        }
    }

    /// Returns frame positions sorted by identifier.
    ///
    /// The sort is stable: equal identifiers keep their input order.
    pub(crate) fn sorted_positions(self, ids: &[&FrameId]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..ids.len()).collect();
        order.sort_by(|&i, &j| self.compare(ids[i], ids[j]));
        order
    }
}

/// All annotated objects of one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Frame identifier.
    pub id: FrameId,
    /// Capture time, if known.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    /// Objects annotated in the frame.
    #[serde(default)]
    pub objects: Vec<AnnotatedObject>,
}

impl Frame {
    /// Creates a frame without a timestamp.
    #[must_use]
    pub fn new(id: impl Into<FrameId>, objects: Vec<AnnotatedObject>) -> Self {
        Self {
            id: id.into(),
            timestamp: None,
            objects,
        }
    }

    /// Sets the capture time.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// The annotated objects of one sequence, frames in identifier order.
///
/// # Example
///
/// ```
/// use annotation_audit::{Frame, SequenceCatalog};
/// use annotation_types::AnnotatedObject;
///
/// let catalog = SequenceCatalog::new(vec![
///     Frame::new("10", vec![]),
///     Frame::new("9", vec![AnnotatedObject::new("a", "vehicle.car", [0.0; 3])]),
/// ]);
///
/// assert_eq!(catalog.frames()[0].id.as_str(), "9");
/// assert_eq!(catalog.object_count(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Frame>", into = "Vec<Frame>")]
pub struct SequenceCatalog {
    frames: Vec<Frame>,
    ordering: FrameOrdering,
}

impl SequenceCatalog {
    /// Builds a catalog from frames in any order.
    #[must_use]
    pub fn new(frames: Vec<Frame>) -> Self {
        let ordering = FrameOrdering::detect(frames.iter().map(|f| &f.id));
        let ids: Vec<&FrameId> = frames.iter().map(|f| &f.id).collect();
        let order = ordering.sorted_positions(&ids);

        let mut slots: Vec<Option<Frame>> = frames.into_iter().map(Some).collect();
        let frames: Vec<Frame> = order.into_iter().filter_map(|i| slots[i].take()).collect();

        let duplicates = frames
            .windows(2)
            .filter(|w| w[0].id == w[1].id)
            .count();
        if duplicates > 0 {
            warn!(duplicates, "Catalog contains repeated frame identifiers");
        }

        Self { frames, ordering }
    }

    /// Builds a catalog from `(frame, object)` pairs.
    ///
    /// Objects keep their input order within a frame. Frame timestamps are
    /// left unset; per-object timestamps are kept on the objects.
    pub fn from_flat(items: impl IntoIterator<Item = (FrameId, AnnotatedObject)>) -> Self {
        let mut frames: Vec<Frame> = Vec::new();
        let mut index: HashMap<FrameId, usize> = HashMap::new();
        for (id, object) in items {
            let slot = *index.entry(id.clone()).or_insert_with(|| {
                frames.push(Frame::new(id, Vec::new()));
                frames.len() - 1
            });
            frames[slot].objects.push(object);
        }
        Self::new(frames)
    }

    /// Returns frames in identifier order.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the ordering used for the identifiers.
    #[must_use]
    pub const fn ordering(&self) -> FrameOrdering {
        self.ordering
    }

    /// Returns the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the catalog has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the total number of objects across frames.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.frames.iter().map(|f| f.objects.len()).sum()
    }

    /// Returns the position of the first frame with identifier `id`.
    #[must_use]
    pub fn position(&self, id: &FrameId) -> Option<usize> {
        self.frames.iter().position(|f| &f.id == id)
    }
}

impl From<Vec<Frame>> for SequenceCatalog {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

impl From<SequenceCatalog> for Vec<Frame> {
    fn from(catalog: SequenceCatalog) -> Self {
        catalog.frames
    }
}
