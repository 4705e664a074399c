use std::collections::VecDeque;

use crate::media::frame::Frame;

/// Fixed-capacity store of the most recent frames, oldest evicted first.
#[derive(Debug)]
pub struct FrameRingBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl FrameRingBuffer {
    /// A capacity of zero keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.capacity
    }

    pub fn push(&mut self, frame: Frame) {
        if self.capacity == 0 {
            return;
        }
        while self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Copy of the contents, oldest to newest. The buffer keeps filling afterwards.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use image::RgbaImage;

    use super::*;

    fn frame(ms: u64) -> Frame {
        Frame::from_image(RgbaImage::new(1, 1), Duration::from_millis(ms)).unwrap()
    }

    #[test]
    fn evicts_oldest_first() {
        let mut ring = FrameRingBuffer::new(3);
        for ms in 0..5 {
            ring.push(frame(ms));
        }
        assert!(ring.is_full());
        let times: Vec<_> = ring
            .snapshot()
            .iter()
            .map(|f| f.captured_at().as_millis())
            .collect();
        assert_eq!(times, vec![2, 3, 4]);
    }

    #[test]
    fn partial_fill_and_clear() {
        let mut ring = FrameRingBuffer::new(23);
        ring.push(frame(1));
        assert_eq!(ring.len(), 1);
        assert!(!ring.is_full());
        ring.clear();
        assert!(ring.is_empty());
    }

    #[test]
    fn zero_capacity_stays_empty() {
        let mut ring = FrameRingBuffer::new(0);
        ring.push(frame(1));
        assert!(ring.is_empty());
    }
}
