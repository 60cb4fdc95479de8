//! Grouping of per-frame annotations into object tracks.

use annotation_types::{AnnotatedObject, FrameId, Timestamp};
use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::catalog::{Frame, FrameOrdering};

/// One observation of an object.
#[derive(Debug, Clone, Copy)]
pub struct TrackSample<'a> {
    /// Frame the observation belongs to.
    pub frame: &'a FrameId,
    /// Position of the frame in sequence order.
    pub frame_index: usize,
    /// Capture time: the object's own timestamp, else the frame's.
    pub timestamp: Option<Timestamp>,
    /// The annotation.
    pub object: &'a AnnotatedObject,
}

impl TrackSample<'_> {
    /// Seconds between two samples, `later - earlier`.
    ///
    /// Uses timestamps when both samples carry one, otherwise the frame gap
    /// times `frame_interval`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds_until(&self, later: &Self, frame_interval: f64) -> f64 {
        match (self.timestamp, later.timestamp) {
            (Some(a), Some(b)) => b.seconds_since(a),
            _ => (later.frame_index as f64 - self.frame_index as f64) * frame_interval,
        }
    }
}

/// Time-ordered observations of one object instance.
#[derive(Debug, Clone)]
pub struct Track<'a> {
    instance_token: &'a str,
    samples: Vec<TrackSample<'a>>,
}

impl<'a> Track<'a> {
    /// Returns the instance token shared by every sample.
    #[must_use]
    pub const fn instance_token(&self) -> &'a str {
        self.instance_token
    }

    /// Returns samples in frame order.
    #[must_use]
    pub fn samples(&self) -> &[TrackSample<'a>] {
        &self.samples
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the track has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the class label of the first sample.
    #[must_use]
    pub fn class_name(&self) -> Option<&'a str> {
        self.samples.first().map(|s| s.object.class_name.as_str())
    }
}

/// Groups annotations sharing an instance token into tracks.
///
/// Objects without an instance token are not tracked. Samples within a track
/// are ordered by frame identifier (numeric when every identifier is
/// integer-like, lexicographic otherwise), ties keeping input order. An
/// instance seen twice in the same frame keeps its first annotation only.
///
/// # Example
///
/// ```
/// use annotation_audit::{Frame, TrackBuilder};
/// use annotation_types::AnnotatedObject;
///
/// let car = |x: f64| AnnotatedObject::new("t", "vehicle.car", [x, 0.0, 0.0]).with_instance("car-1");
/// let frames = vec![
///     Frame::new("2", vec![car(2.0)]),
///     Frame::new("0", vec![car(0.0)]),
///     Frame::new("1", vec![car(1.0)]),
/// ];
///
/// let tracks = TrackBuilder::build(&frames);
/// let xs: Vec<f64> = tracks[0].samples().iter().map(|s| s.object.translation[0]).collect();
/// assert_eq!(xs, vec![0.0, 1.0, 2.0]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackBuilder;

impl TrackBuilder {
    /// Builds tracks from frames in any order.
    ///
    /// Tracks are returned in order of their first sample.
    #[must_use]
    pub fn build(frames: &[Frame]) -> Vec<Track<'_>> {
        let ordering = FrameOrdering::detect(frames.iter().map(|f| &f.id));
        let ids: Vec<&FrameId> = frames.iter().map(|f| &f.id).collect();
        let order = ordering.sorted_positions(&ids);

        let mut tracks: Vec<Track<'_>> = Vec::new();
        let mut by_instance: HashMap<&str, usize> = HashMap::new();
        let mut seen: HashSet<(&str, &FrameId)> = HashSet::new();
        let mut untracked = 0usize;

        for (frame_index, &pos) in order.iter().enumerate() {
            let frame = &frames[pos];
            for object in &frame.objects {
                let Some(instance) = object.instance_token.as_deref() else {
                    untracked += 1;
                    continue;
                };
                if !seen.insert((instance, &frame.id)) {
                    warn!(
                        instance,
                        frame = %frame.id,
                        token = %object.token,
                        "Instance annotated twice in one frame, keeping first"
                    );
                    continue;
                }

                let slot = *by_instance.entry(instance).or_insert_with(|| {
                    tracks.push(Track {
                        instance_token: instance,
                        samples: Vec::new(),
                    });
                    tracks.len() - 1
                });
                tracks[slot].samples.push(TrackSample {
                    frame: &frame.id,
                    frame_index,
                    timestamp: object.timestamp.or(frame.timestamp),
                    object,
                });
            }
        }

        debug!(tracks = tracks.len(), untracked, "Built tracks");
        tracks
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn car(token: &str, instance: &str, x: f64) -> AnnotatedObject {
        AnnotatedObject::new(token, "vehicle.car", [x, 0.0, 0.0]).with_instance(instance)
    }

    fn xs(track: &Track<'_>) -> Vec<f64> {
        track.samples().iter().map(|s| s.object.translation[0]).collect()
    }

    #[test]
    fn orders_numeric_frames() {
        let frames = vec![
            Frame::new("10", vec![car("c", "a", 10.0)]),
            Frame::new("9", vec![car("b", "a", 9.0)]),
            Frame::new("1", vec![car("a", "a", 1.0)]),
        ];
        let tracks = TrackBuilder::build(&frames);
        assert_eq!(tracks.len(), 1);
        assert_eq!(xs(&tracks[0]), vec![1.0, 9.0, 10.0]);
        let indices: Vec<usize> = tracks[0].samples().iter().map(|s| s.frame_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn orders_lexicographic_frames() {
        let frames = vec![
            Frame::new("f10", vec![car("c", "a", 10.0)]),
            Frame::new("f9", vec![car("b", "a", 9.0)]),
        ];
        let tracks = TrackBuilder::build(&frames);
        assert_eq!(xs(&tracks[0]), vec![10.0, 9.0]);
    }

    #[test]
    fn groups_by_instance_and_skips_untracked() {
        let frames = vec![
            Frame::new(
                "0",
                vec![
                    car("a0", "a", 0.0),
                    car("b0", "b", 5.0),
                    AnnotatedObject::new("loose", "vehicle.car", [0.0; 3]),
                ],
            ),
            Frame::new("1", vec![car("b1", "b", 6.0), car("a1", "a", 1.0)]),
        ];
        let tracks = TrackBuilder::build(&frames);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].instance_token(), "a");
        assert_eq!(xs(&tracks[0]), vec![0.0, 1.0]);
        assert_eq!(tracks[1].instance_token(), "b");
        assert_eq!(xs(&tracks[1]), vec![5.0, 6.0]);
        assert_eq!(tracks[0].class_name(), Some("vehicle.car"));
    }

    #[test]
    fn duplicate_in_frame_keeps_first() {
        let frames = vec![Frame::new("0", vec![car("first", "a", 0.0), car("second", "a", 9.0)])];
        let tracks = TrackBuilder::build(&frames);
        assert_eq!(tracks[0].len(), 1);
        assert_eq!(tracks[0].samples()[0].object.token, "first");
    }

    #[test]
    fn sample_timestamp_prefers_object() {
        let frames = vec![
            Frame::new("0", vec![car("a", "a", 0.0).with_timestamp(Timestamp::from_millis(5))])
                .with_timestamp(Timestamp::from_millis(1)),
            Frame::new("1", vec![car("b", "a", 1.0)]).with_timestamp(Timestamp::from_millis(100)),
        ];
        let tracks = TrackBuilder::build(&frames);
        let s = tracks[0].samples();
        assert_eq!(s[0].timestamp, Some(Timestamp::from_millis(5)));
        assert_eq!(s[1].timestamp, Some(Timestamp::from_millis(100)));
        assert!((s[0].seconds_until(&s[1], 0.1) - 0.095).abs() < 1e-12);
    }

    #[test]
    fn seconds_from_frame_gap() {
        let frames = vec![
            Frame::new("0", vec![car("a", "a", 0.0)]),
            Frame::new("1", vec![]),
            Frame::new("2", vec![car("c", "a", 2.0)]),
        ];
        let tracks = TrackBuilder::build(&frames);
        let s = tracks[0].samples();
        assert!((s[0].seconds_until(&s[1], 0.1) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn empty_input() {
        assert!(TrackBuilder::build(&[]).is_empty());
    }
}
