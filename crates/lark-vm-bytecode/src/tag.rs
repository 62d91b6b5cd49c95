//! Container tags that carry action streams

use serde::{Deserialize, Serialize};

use crate::action::ActionBlock;
use crate::decoder::decode_stream;
use crate::error::{BytecodeError, Result};
use crate::reader::ByteReader;

/// `DoAction`: a frame's action stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoAction {
    /// Decoded records
    pub actions: ActionBlock,
}

impl DoAction {
    /// Decode a tag body
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(body);
        Ok(Self {
            actions: decode_stream(&mut reader)?,
        })
    }
}

/// `DoInitAction`: actions run once when a sprite is first instantiated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoInitAction {
    /// Character id of the sprite
    pub sprite_id: u16,
    /// Decoded records
    pub actions: ActionBlock,
}

impl DoInitAction {
    /// Decode a tag body: sprite id, then the record stream
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(body);
        let sprite_id = reader.u16()?;
        Ok(Self {
            sprite_id,
            actions: decode_stream(&mut reader)?,
        })
    }
}

/// `ExportAssets`: names exported characters for linkage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportAssets {
    /// `(character id, export name)` pairs
    pub entries: Vec<(u16, String)>,
}

impl ExportAssets {
    /// Decode a tag body
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(body);
        let count = reader.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = reader.u16()?;
            entries.push((id, reader.cstr()?));
        }
        Ok(Self { entries })
    }
}

/// Transition bits of a button condition.
///
/// The first wire byte is the low byte of the word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonConditions(pub u16);

impl ButtonConditions {
    /// Idle to over-up
    pub const IDLE_TO_OVER_UP: u16 = 0x0001;
    /// Over-up to idle
    pub const OVER_UP_TO_IDLE: u16 = 0x0002;
    /// Over-up to over-down
    pub const OVER_UP_TO_OVER_DOWN: u16 = 0x0004;
    /// Over-down to over-up (release)
    pub const OVER_DOWN_TO_OVER_UP: u16 = 0x0008;
    /// Over-down to out-down
    pub const OVER_DOWN_TO_OUT_DOWN: u16 = 0x0010;
    /// Out-down to over-down
    pub const OUT_DOWN_TO_OVER_DOWN: u16 = 0x0020;
    /// Out-down to idle (release outside)
    pub const OUT_DOWN_TO_IDLE: u16 = 0x0040;
    /// Idle to over-down
    pub const IDLE_TO_OVER_DOWN: u16 = 0x0080;
    /// Over-down to idle
    pub const OVER_DOWN_TO_IDLE: u16 = 0x0100;
    const KEY_PRESS_SHIFT: u16 = 9;

    /// Raw condition word
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True if any transition in `mask` is set
    pub fn matches(self, mask: u16) -> bool {
        self.0 & mask & 0x01FF != 0
    }

    /// Key code that triggers the entry, 0 for none
    pub fn key_press(self) -> u8 {
        ((self.0 >> Self::KEY_PRESS_SHIFT) & 0x7F) as u8
    }
}

/// One entry of a button's condition/action list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonCondAction {
    /// Offset to the next entry; zero on the last one
    pub size: u16,
    /// Triggering transitions
    pub conditions: ButtonConditions,
    /// Records run when a condition matches
    pub actions: ActionBlock,
}

impl ButtonCondAction {
    const HEADER_LEN: u16 = 4;

    /// The final entry of a list has a zero size
    pub fn is_last(&self) -> bool {
        self.size == 0
    }
}

/// Decode a button's condition/action list.
///
/// Entries repeat until one declares a zero size; that entry's records run
/// to the end of the data.
pub fn decode_button_cond_actions(data: &[u8]) -> Result<Vec<ButtonCondAction>> {
    let mut reader = ByteReader::new(data);
    let mut entries = Vec::new();
    while !reader.is_empty() {
        let at = reader.absolute_position();
        let size = reader.u16()?;
        let conditions = ButtonConditions(reader.u16()?);
        let body_len = if size == 0 {
            reader.remaining()
        } else if size < ButtonCondAction::HEADER_LEN {
            return Err(BytecodeError::InvalidConditionSize { size, offset: at });
        } else {
            (size - ButtonCondAction::HEADER_LEN) as usize
        };
        let mut body = reader.sub_reader(body_len)?;
        let actions = decode_stream(&mut body)?;
        entries.push(ButtonCondAction {
            size,
            conditions,
            actions,
        });
        if size == 0 {
            break;
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    #[test]
    fn test_do_init_action() {
        let tag = DoInitAction::decode(&[0x2A, 0x00, 0x06, 0x00]).unwrap();
        assert_eq!(tag.sprite_id, 42);
        assert_eq!(tag.actions.len(), 1);
    }

    #[test]
    fn test_export_assets() {
        let tag = ExportAssets::decode(&[1, 0, 7, 0, b'b', b'g', 0]).unwrap();
        assert_eq!(tag.entries, vec![(7, "bg".to_string())]);
    }

    #[test]
    fn test_button_cond_actions() {
        // entry 1: size 6 (header + Play + terminator), release transition
        // entry 2: last, key press 'A' (65), Stop
        let data = [
            6, 0, 0x08, 0x00, 0x06, 0x00, //
            0, 0, 0x00, 65 << 1, 0x07, 0x00,
        ];
        let entries = decode_button_cond_actions(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].is_last());
        assert!(
            entries[0]
                .conditions
                .matches(ButtonConditions::OVER_DOWN_TO_OVER_UP)
        );
        assert_eq!(entries[0].actions.get(0).unwrap().action, Action::Play);
        assert!(entries[1].is_last());
        assert_eq!(entries[1].conditions.key_press(), 65);
        assert_eq!(entries[1].actions.get(0).unwrap().action, Action::Stop);
    }

    #[test]
    fn test_button_cond_size_too_small() {
        let err = decode_button_cond_actions(&[2, 0, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            BytecodeError::InvalidConditionSize { size: 2, offset: 0 }
        ));
    }
}
