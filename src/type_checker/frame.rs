//! Frame layout and static-link bookkeeping.
//!
//! Every function (and the synthetic top-level `main`) owns one frame: an
//! ordered list of slots for its parameters and locals. At code generation
//! time each frame becomes a struct whose field 0 is the static link to the
//! lexically enclosing frame, so a slot at `offset` lives in field
//! `offset + 1`.

use log::debug;

use super::types::Ty;

pub type FrameId = usize;

pub const MAIN_FRAME: FrameId = 0;

#[derive(Debug, Clone)]
pub struct Frame {
    /// Symbol of the function owning the frame (`main` for top level).
    pub name: String,
    /// Function nesting depth; `main` is level 0.
    pub level: usize,
    pub parent: Option<FrameId>,
    pub slots: Vec<Ty>,
    /// Set once the owning body has been fully checked.
    pub finalized: bool,
}

/// Where a variable lives: which frame, at what nesting level, which slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLocation {
    pub frame: FrameId,
    pub level: usize,
    pub offset: usize,
}

impl SlotLocation {
    /// Index of the slot inside the frame struct, after the static link.
    pub fn field_index(&self) -> u32 {
        self.offset as u32 + 1
    }
}

#[derive(Debug)]
pub struct FrameLayout {
    frames: Vec<Frame>,
    stack: Vec<FrameId>,
}

impl FrameLayout {
    pub fn new() -> Self {
        FrameLayout {
            frames: vec![Frame {
                name: String::from("main"),
                level: 0,
                parent: None,
                slots: vec![],
                finalized: false,
            }],
            stack: vec![MAIN_FRAME],
        }
    }

    /// Creates the frame of a function declared in the current frame.
    pub fn declare(&mut self, name: &str) -> FrameId {
        let parent = self.current();
        self.frames.push(Frame {
            name: name.to_string(),
            level: self.current_level() + 1,
            parent: Some(parent),
            slots: vec![],
            finalized: false,
        });
        self.frames.len() - 1
    }

    pub fn enter(&mut self, frame: FrameId) {
        self.stack.push(frame);
    }

    /// Leaves the current function frame, fixing its shape.
    pub fn exit(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(id) = self.stack.pop() {
            let frame = &mut self.frames[id];
            frame.finalized = true;
            debug!(
                "finalized frame `{}` at level {} with {} slot(s)",
                frame.name,
                frame.level,
                frame.slots.len()
            );
        }
    }

    /// Appends a slot of type `ty` to the current frame.
    pub fn allocate(&mut self, ty: Ty) -> SlotLocation {
        let id = self.current();
        let frame = &mut self.frames[id];
        frame.slots.push(ty);
        SlotLocation {
            frame: id,
            level: frame.level,
            offset: frame.slots.len() - 1,
        }
    }

    pub fn current(&self) -> FrameId {
        self.stack.last().copied().unwrap_or(MAIN_FRAME)
    }

    pub fn current_level(&self) -> usize {
        self.frames[self.current()].level
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    pub fn frames(&self) -> impl Iterator<Item = (FrameId, &Frame)> {
        self.frames.iter().enumerate()
    }

    /// Marks `main` finished once the whole program is checked.
    pub fn finish(&mut self) {
        self.frames[MAIN_FRAME].finalized = true;
    }
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::new()
    }
}

/// Static-link hops needed to reach a frame at level `target` from code at `from`.
pub fn static_link_hops(from: usize, target: usize) -> usize {
    from.saturating_sub(target)
}
