use crate::capture::live_photo::LivePhoto;
use crate::encode::artifact::VideoArtifact;
use crate::foundation::error::{StripError, StripResult};
use crate::media::frame::Frame;
use crate::strip::layout::MAX_SLOTS;

/// One photo position: the still and, for captured Live Photos, its clip.
#[derive(Clone, Debug, Default)]
pub struct Slot {
    pub still: Option<Frame>,
    pub live_clip: Option<VideoArtifact>,
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        self.still.is_none()
    }

    pub fn has_clip(&self) -> bool {
        self.live_clip.is_some()
    }

    fn clear(&mut self) {
        self.still = None;
        self.live_clip = None;
    }
}

/// Fixed-capacity slot storage. Only the first `active` slots are shown on the strip.
///
/// Shrinking the active count hides slots without dropping their contents, so growing it again
/// brings them back.
#[derive(Clone, Debug)]
pub struct SlotBoard {
    slots: [Slot; MAX_SLOTS],
    active: usize,
}

impl Default for SlotBoard {
    fn default() -> Self {
        Self {
            slots: Default::default(),
            active: MAX_SLOTS,
        }
    }
}

impl SlotBoard {
    pub const CAPACITY: usize = MAX_SLOTS;

    pub fn new(active: usize) -> StripResult<Self> {
        let mut board = Self::default();
        board.set_active_count(active)?;
        Ok(board)
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn set_active_count(&mut self, n: usize) -> StripResult<()> {
        if !(1..=Self::CAPACITY).contains(&n) {
            return Err(StripError::validation(format!(
                "active slot count must be 1..={}, got {n}",
                Self::CAPACITY
            )));
        }
        self.active = n;
        Ok(())
    }

    /// The visible slots, in strip order.
    pub fn active(&self) -> &[Slot] {
        &self.slots[..self.active]
    }

    /// Any slot within capacity, visible or not.
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    fn slot_mut(&mut self, index: usize) -> StripResult<&mut Slot> {
        let active = self.active;
        self.slots
            .get_mut(index)
            .filter(|_| index < active)
            .ok_or_else(|| {
                StripError::validation(format!("slot {index} is outside the {active} active slots"))
            })
    }

    /// Place an uploaded still; an existing clip in that slot is dropped.
    pub fn place_still(&mut self, index: usize, still: Frame) -> StripResult<()> {
        let slot = self.slot_mut(index)?;
        slot.still = Some(still);
        slot.live_clip = None;
        Ok(())
    }

    pub fn place_live_photo(&mut self, index: usize, photo: LivePhoto) -> StripResult<()> {
        let slot = self.slot_mut(index)?;
        slot.still = Some(photo.still);
        slot.live_clip = photo.clip;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> StripResult<()> {
        self.slot_mut(index)?.clear();
        Ok(())
    }

    /// Empty every slot, visible or hidden.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(Slot::clear);
    }

    /// First visible slot without a still.
    pub fn next_empty(&self) -> Option<usize> {
        self.active().iter().position(Slot::is_empty)
    }

    pub fn filled_count(&self) -> usize {
        self.active().iter().filter(|s| !s.is_empty()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled_count() == self.active
    }

    pub fn clip_count(&self) -> usize {
        self.active().iter().filter(|s| s.has_clip()).count()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use image::RgbaImage;

    use super::*;

    fn frame(v: u8) -> Frame {
        Frame::from_image(RgbaImage::from_pixel(2, 2, image::Rgba([v, v, v, 255])), Duration::ZERO)
            .unwrap()
    }

    #[test]
    fn shrinking_keeps_hidden_contents() {
        let mut board = SlotBoard::new(4).unwrap();
        for i in 0..4 {
            board.place_still(i, frame(i as u8)).unwrap();
        }
        board.set_active_count(2).unwrap();
        assert_eq!(board.active().len(), 2);
        assert!(board.place_still(3, frame(9)).is_err());
        board.set_active_count(4).unwrap();
        assert_eq!(board.filled_count(), 4);
        let hidden = board.get(3).and_then(|s| s.still.as_ref()).unwrap();
        assert_eq!(hidden.decode().unwrap().get_pixel(0, 0)[0], 3);
    }

    #[test]
    fn next_empty_and_remove() {
        let mut board = SlotBoard::new(3).unwrap();
        board.place_still(0, frame(1)).unwrap();
        assert_eq!(board.next_empty(), Some(1));
        board.place_still(1, frame(1)).unwrap();
        board.place_still(2, frame(1)).unwrap();
        assert!(board.is_complete());
        board.remove(1).unwrap();
        assert_eq!(board.next_empty(), Some(1));
        board.clear();
        assert_eq!(board.filled_count(), 0);
    }

    #[test]
    fn live_photo_without_clip_fills_still_only() {
        let mut board = SlotBoard::new(2).unwrap();
        board.place_live_photo(0, LivePhoto::still_only(frame(5))).unwrap();
        assert_eq!(board.filled_count(), 1);
        assert_eq!(board.clip_count(), 0);
    }

    #[test]
    fn rejects_bad_counts() {
        assert!(SlotBoard::new(0).is_err());
        assert!(SlotBoard::new(5).is_err());
    }
}
