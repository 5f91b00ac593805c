/// Evenly spaced sample times over `[frame_begin, frame_end)`.
///
/// Sample `i` sits at `frame_begin + (frame_end - frame_begin) * i / frame_count`,
/// so `frame_end` is only reached when the range is empty.
pub fn sample_frames(frame_begin: f64, frame_end: f64, frame_count: u32) -> FrameSamples {
    FrameSamples {
        frame_begin,
        frame_end,
        frame_count,
        next: 0,
    }
}

/// Lazy, restartable sequence of frame times; cloning restarts from the
/// clone's current position.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSamples {
    frame_begin: f64,
    frame_end: f64,
    frame_count: u32,
    next: u32,
}

impl FrameSamples {
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Frame time of sample `index`, independent of iteration state.
    pub fn at(&self, index: u32) -> Option<f64> {
        (index < self.frame_count).then(|| {
            let span = self.frame_end - self.frame_begin;
            self.frame_begin + span * f64::from(index) / f64::from(self.frame_count)
        })
    }
}

impl Iterator for FrameSamples {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let t = self.at(self.next)?;
        self.next += 1;
        Some(t)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.frame_count - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for FrameSamples {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_samples_over_ten_frames() {
        let got: Vec<f64> = sample_frames(0.0, 10.0, 5).collect();
        assert_eq!(got, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn sampling_is_pure() {
        let a: Vec<f64> = sample_frames(3.5, 47.25, 13).collect();
        let b: Vec<f64> = sample_frames(3.5, 47.25, 13).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 13);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
        assert!(a.iter().all(|&t| (3.5..47.25).contains(&t)));
    }

    #[test]
    fn single_sample_is_frame_begin() {
        let got: Vec<f64> = sample_frames(12.0, 30.0, 1).collect();
        assert_eq!(got, vec![12.0]);
        let got: Vec<f64> = sample_frames(7.0, 7.0, 1).collect();
        assert_eq!(got, vec![7.0]);
    }

    #[test]
    fn zero_samples_is_empty() {
        assert_eq!(sample_frames(0.0, 10.0, 0).count(), 0);
    }

    #[test]
    fn len_tracks_iteration() {
        let mut s = sample_frames(0.0, 1.0, 4);
        assert_eq!(s.len(), 4);
        s.next();
        assert_eq!(s.len(), 3);
        let rest = s.clone();
        assert_eq!(rest.collect::<Vec<_>>(), s.collect::<Vec<_>>());
    }
}
