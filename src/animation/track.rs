//! Keyframe channels.

use cgmath::{Quaternion, Vector3};

/// Describes the interpolation behaviour between keyframes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Interpolation {
    /// Immediate change between keyframe values.
    Discrete,

    /// Linear interpolation between keyframe values.
    ///
    /// Vectors are lerped, rotations are slerped.
    Linear,
}

impl Default for Interpolation {
    fn default() -> Self {
        Interpolation::Linear
    }
}

/// An index into the frames of a track.
enum FrameRef {
    /// The time is before the start of the frames.
    Unstarted,

    /// The time lies between the given frame index and the next one.
    InProgress(usize),

    /// The time is at or after the last frame.
    Ended,
}

/// Values that can be blended between two keyframes.
pub trait Interpolate: Copy {
    /// Blends `self` towards `other` by `s` in `[0.0, 1.0]`.
    fn interpolate(
        self,
        other: Self,
        s: f32,
    ) -> Self;
}

impl Interpolate for Vector3<f32> {
    fn interpolate(
        self,
        other: Self,
        s: f32,
    ) -> Self {
        self + (other - self) * s
    }
}

impl Interpolate for Quaternion<f32> {
    fn interpolate(
        self,
        other: Self,
        s: f32,
    ) -> Self {
        self.slerp(other, s)
    }
}

/// A channel of keyframes sorted by start time.
///
/// Keyframe times are unique: inserting at an existing time hands back the
/// value already stored there.
#[derive(Clone, Debug, PartialEq)]
pub struct Track<T> {
    /// The keyframe time values, in ascending order.
    times: Vec<f32>,

    /// The keyframe values, parallel to `times`.
    values: Vec<T>,
}

impl<T> Default for Track<T> {
    fn default() -> Self {
        Track {
            times: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Interpolate> Track<T> {
    /// Creates an empty track.
    pub fn new() -> Self {
        Track::default()
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns `true` if the track holds no keyframe.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last keyframe, `0.0` for an empty track.
    pub fn length(&self) -> f32 {
        self.times.last().cloned().unwrap_or(0.0)
    }

    /// Returns the keyframe value at `time`, creating it with `default` if
    /// there is none. An existing value is never overwritten.
    pub fn insert(
        &mut self,
        time: f32,
        default: T,
    ) -> &mut T {
        let index = match self.times.iter().position(|&t| t >= time) {
            Some(i) if self.times[i] == time => i,
            Some(i) => {
                self.times.insert(i, time);
                self.values.insert(i, default);
                i
            }
            None => {
                self.times.push(time);
                self.values.push(default);
                self.times.len() - 1
            }
        };
        &mut self.values[index]
    }

    /// Removes the keyframe starting exactly at `time`.
    pub fn remove(
        &mut self,
        time: f32,
    ) -> Option<T> {
        let index = self.times.iter().position(|&t| t == time)?;
        self.times.remove(index);
        Some(self.values.remove(index))
    }

    /// Returns the keyframe value starting exactly at `time`.
    pub fn get(
        &self,
        time: f32,
    ) -> Option<&T> {
        self.times
            .iter()
            .position(|&t| t == time)
            .map(|i| &self.values[i])
    }

    /// Iterates over `(time, value)` pairs in time order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (f32, &'a T)> + 'a {
        self.times.iter().cloned().zip(self.values.iter())
    }

    fn frame_at_time(
        &self,
        t: f32,
    ) -> FrameRef {
        if t < self.times[0] {
            return FrameRef::Unstarted;
        }

        if t >= self.times[self.times.len() - 1] {
            return FrameRef::Ended;
        }

        let mut i = 0;
        while t > self.times[i + 1] {
            i += 1;
        }

        FrameRef::InProgress(i)
    }

    /// Computes the channel value at `time`.
    ///
    /// Times before the first keyframe hold the first value, times after the
    /// last keyframe hold the last one. Returns `None` for an empty track.
    pub fn sample(
        &self,
        time: f32,
        interpolation: Interpolation,
    ) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let frame_index = match self.frame_at_time(time) {
            FrameRef::Unstarted => return Some(self.values[0]),
            FrameRef::Ended => return Some(self.values[self.values.len() - 1]),
            FrameRef::InProgress(i) => i,
        };

        match interpolation {
            Interpolation::Discrete => Some(self.values[frame_index]),
            Interpolation::Linear => {
                let frame_start_time = self.times[frame_index];
                let frame_end_time = self.times[frame_index + 1];
                // Interpolation constant in range `[0.0, 1.0]` between `frame[i]`
                // and `frame[i + 1]`.
                let s = (time - frame_start_time) / (frame_end_time - frame_start_time);
                let start = self.values[frame_index];
                let end = self.values[frame_index + 1];
                Some(start.interpolate(end, s))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3};

    fn v(
        x: f32,
        y: f32,
        z: f32,
    ) -> Vector3<f32> {
        Vector3::new(x, y, z)
    }

    #[test]
    fn insert_keeps_time_order() {
        let mut track = Track::new();
        *track.insert(2.0, v(0.0, 0.0, 0.0)) = v(2.0, 0.0, 0.0);
        *track.insert(0.0, v(0.0, 0.0, 0.0)) = v(0.0, 0.0, 0.0);
        *track.insert(1.0, v(0.0, 0.0, 0.0)) = v(1.0, 0.0, 0.0);

        let times: Vec<f32> = track.iter().map(|(t, _)| t).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(track.length(), 2.0);
    }

    #[test]
    fn insert_at_existing_time_is_not_overwritten() {
        let mut track = Track::new();
        *track.insert(1.0, v(0.0, 0.0, 0.0)) = v(5.0, 5.0, 5.0);
        let existing = *track.insert(1.0, v(9.0, 9.0, 9.0));

        assert_eq!(existing, v(5.0, 5.0, 5.0));
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn remove_missing_time_is_a_no_op() {
        let mut track = Track::new();
        track.insert(1.0, v(1.0, 1.0, 1.0));

        assert_eq!(track.remove(0.5), None);
        assert_eq!(track.len(), 1);
        assert_eq!(track.remove(1.0), Some(v(1.0, 1.0, 1.0)));
        assert!(track.is_empty());
    }

    #[test]
    fn sample_clamps_outside_the_keyframes() {
        let mut track = Track::new();
        *track.insert(1.0, v(0.0, 0.0, 0.0)) = v(1.0, 0.0, 0.0);
        *track.insert(3.0, v(0.0, 0.0, 0.0)) = v(3.0, 0.0, 0.0);

        assert_eq!(track.sample(0.0, Interpolation::Linear), Some(v(1.0, 0.0, 0.0)));
        assert_eq!(track.sample(10.0, Interpolation::Linear), Some(v(3.0, 0.0, 0.0)));
        assert_eq!(track.sample(2.0, Interpolation::Linear), Some(v(2.0, 0.0, 0.0)));
    }

    #[test]
    fn discrete_holds_previous_keyframe() {
        let mut track = Track::new();
        *track.insert(0.0, v(0.0, 0.0, 0.0)) = v(0.0, 0.0, 0.0);
        *track.insert(1.0, v(0.0, 0.0, 0.0)) = v(1.0, 0.0, 0.0);

        assert_eq!(track.sample(0.75, Interpolation::Discrete), Some(v(0.0, 0.0, 0.0)));
    }

    #[test]
    fn empty_track_has_no_sample() {
        let track: Track<Vector3<f32>> = Track::new();
        assert_eq!(track.sample(0.5, Interpolation::Linear), None);
        assert_eq!(track.length(), 0.0);
    }

    #[test]
    fn rotations_are_slerped() {
        let mut track = Track::new();
        let identity = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        *track.insert(0.0, identity) = identity;
        *track.insert(1.0, identity) = Quaternion::from_angle_y(Deg(90.0));

        let half = track.sample(0.5, Interpolation::Linear).unwrap();
        let expected = Quaternion::from_angle_y(Deg(45.0));
        assert!((half.s - expected.s).abs() < 1e-5);
        assert!((half.v.y - expected.v.y).abs() < 1e-5);
    }
}
