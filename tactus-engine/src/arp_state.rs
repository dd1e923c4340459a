/// A generated note that has not been released yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundingNote {
    pub note: u8,
    pub channel: u8,
    /// Absolute elapsed frame at which the note-off is due.
    pub off_frame: u64,
}

/// Arpeggiator play state: runtime state carried across blocks on the audio thread.
#[derive(Debug, Clone, Default)]
pub struct ArpPlayState {
    pub base_note: Option<u8>,     // Held note the arpeggio is built on
    pub base_channel: u8,          // Channel the held note arrived on
    pub step_index: u32,           // Logical position in the walk
    pub sounding: Option<SoundingNote>, // Last emitted note, until its note-off
}

impl ArpPlayState {
    /// Capture `note` as the base note. Only one note is tracked: returns
    /// false (and changes nothing) while another note is held.
    pub fn hold(&mut self, note: u8, channel: u8) -> bool {
        if self.base_note.is_some() {
            return false;
        }
        self.base_note = Some(note);
        self.base_channel = channel;
        true
    }

    /// Release the base note if `note` is the one being held.
    pub fn release(&mut self, note: u8) -> bool {
        if self.base_note == Some(note) {
            self.base_note = None;
            true
        } else {
            false
        }
    }
}
