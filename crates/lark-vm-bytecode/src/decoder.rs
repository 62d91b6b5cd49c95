//! Action record decoder
//!
//! Each record is `{code: u8; if code >= 0x80 { length: u16 }; operands}`.
//! Operands are parsed from a reader over exactly `length` bytes, so the
//! stream stays synchronized whether or not the code is understood.
//! `DefineFunction`, `DefineFunction2` and `With` are followed by a body
//! whose size is one of their operands; the body is decoded as a nested
//! block and counted in the record's size.

use tracing::{trace, warn};

use crate::action::{
    Action, ActionBlock, ActionRecord, FunctionDef, FunctionDef2, PreloadFlags, PushValue,
    RegisterParam,
};
use crate::error::{BytecodeError, Result};
use crate::opcode::{ActionCode, has_length};
use crate::reader::ByteReader;

/// Deepest allowed nesting of `With` and function bodies
pub const MAX_NESTING: usize = 64;

/// Decode a top-level record stream, stopping at the zero terminator.
///
/// A stream that ends without a terminator is accepted as ending there.
pub fn decode_actions(data: &[u8]) -> Result<ActionBlock> {
    let mut reader = ByteReader::new(data);
    decode_stream(&mut reader)
}

/// Decode a nested body (function or `With`), which spans the whole slice.
///
/// A zero byte inside the body is skipped rather than ending it.
pub fn decode_block(data: &[u8]) -> Result<ActionBlock> {
    let mut reader = ByteReader::new(data);
    decode_body(&mut reader, 0)
}

/// Decode records from `reader` until a terminator or the end of input
pub fn decode_stream(reader: &mut ByteReader<'_>) -> Result<ActionBlock> {
    let mut records = Vec::new();
    while !reader.is_empty() {
        let start = reader.position();
        match decode_record_at(reader, 0)? {
            Some(record) => records.push(record),
            None => return Ok(ActionBlock::new(records, start as u32)),
        }
    }
    Ok(ActionBlock::new(records, reader.position() as u32))
}

fn decode_body(body: &mut ByteReader<'_>, depth: usize) -> Result<ActionBlock> {
    let mut records = Vec::new();
    while !body.is_empty() {
        let at = body.absolute_position();
        match decode_record_at(body, depth)? {
            Some(record) => records.push(record),
            None if body.is_empty() => {}
            None => warn!(
                offset = at,
                remaining = body.remaining(),
                "terminator inside action body skipped"
            ),
        }
    }
    Ok(ActionBlock::new(records, body.position() as u32))
}

/// Decode one record. Returns `None` for the zero terminator.
pub fn decode_record(reader: &mut ByteReader<'_>) -> Result<Option<ActionRecord>> {
    decode_record_at(reader, 0)
}

fn decode_record_at(reader: &mut ByteReader<'_>, depth: usize) -> Result<Option<ActionRecord>> {
    let offset = reader.position();
    let header_at = reader.absolute_position();
    let code = reader.u8()?;
    if code == 0 {
        return Ok(None);
    }

    let length = if has_length(code) { reader.u16()? } else { 0 };
    if reader.remaining() < length as usize {
        return Err(BytecodeError::Truncated {
            code,
            offset: header_at,
            declared: length as usize,
            available: reader.remaining(),
        });
    }
    let mut operands = reader.sub_reader(length as usize)?;
    let mut site = BodySite {
        outer: &mut *reader,
        code,
        header_at,
        depth,
    };
    let action = parse_action(code, length, &mut operands, &mut site)?;

    if !operands.is_empty() {
        warn!(
            action = action.name(),
            unread = operands.remaining(),
            offset = header_at,
            "action record has unread operand bytes"
        );
    }
    if let Action::NotImplemented { code, length } = action {
        warn!(code, length, offset = header_at, "action not implemented");
    }

    let size = reader.position() - offset;
    trace!(action = action.name(), offset, size, "decoded action");
    Ok(Some(ActionRecord {
        offset: offset as u32,
        size: size as u32,
        action,
    }))
}

/// Where a record's trailing body is read from
struct BodySite<'r, 'a> {
    outer: &'r mut ByteReader<'a>,
    code: u8,
    header_at: usize,
    depth: usize,
}

impl BodySite<'_, '_> {
    /// Split off and decode the `size`-byte body that follows the record
    fn read_body(&mut self, size: u16) -> Result<ActionBlock> {
        if self.depth >= MAX_NESTING {
            return Err(BytecodeError::NestingTooDeep {
                offset: self.header_at,
                limit: MAX_NESTING,
            });
        }
        if self.outer.remaining() < size as usize {
            return Err(BytecodeError::Truncated {
                code: self.code,
                offset: self.header_at,
                declared: size as usize,
                available: self.outer.remaining(),
            });
        }
        let mut body = self.outer.sub_reader(size as usize)?;
        decode_body(&mut body, self.depth + 1)
    }
}

fn parse_action(
    code: u8,
    length: u16,
    ops: &mut ByteReader<'_>,
    site: &mut BodySite<'_, '_>,
) -> Result<Action> {
    let Some(known) = ActionCode::from_byte(code) else {
        return Ok(Action::NotImplemented { code, length });
    };

    let action = match known {
        ActionCode::NextFrame => Action::NextFrame,
        ActionCode::PreviousFrame => Action::PreviousFrame,
        ActionCode::Play => Action::Play,
        ActionCode::Stop => Action::Stop,
        ActionCode::ToggleQuality => Action::ToggleQuality,
        ActionCode::StopSounds => Action::StopSounds,
        ActionCode::Add => Action::Add,
        ActionCode::Subtract => Action::Subtract,
        ActionCode::Multiply => Action::Multiply,
        ActionCode::Divide => Action::Divide,
        ActionCode::Equals => Action::Equals,
        ActionCode::Less => Action::Less,
        ActionCode::And => Action::And,
        ActionCode::Or => Action::Or,
        ActionCode::Not => Action::Not,
        ActionCode::StringEquals => Action::StringEquals,
        ActionCode::StringLength => Action::StringLength,
        ActionCode::StringExtract => Action::StringExtract,
        ActionCode::Pop => Action::Pop,
        ActionCode::ToInteger => Action::ToInteger,
        ActionCode::GetVariable => Action::GetVariable,
        ActionCode::SetVariable => Action::SetVariable,
        ActionCode::StringAdd => Action::StringAdd,
        ActionCode::GetProperty => Action::GetProperty,
        ActionCode::SetProperty => Action::SetProperty,
        ActionCode::CloneSprite => Action::CloneSprite,
        ActionCode::RemoveSprite => Action::RemoveSprite,
        ActionCode::Trace => Action::Trace,
        ActionCode::StringLess => Action::StringLess,
        ActionCode::Throw => Action::Throw,
        ActionCode::CastOp => Action::CastOp,
        ActionCode::ImplementsOp => Action::ImplementsOp,
        ActionCode::MbStringLength => Action::MbStringLength,
        ActionCode::CharToAscii => Action::CharToAscii,
        ActionCode::AsciiToChar => Action::AsciiToChar,
        ActionCode::GetTime => Action::GetTime,
        ActionCode::MbStringExtract => Action::MbStringExtract,
        ActionCode::MbCharToAscii => Action::MbCharToAscii,
        ActionCode::MbAsciiToChar => Action::MbAsciiToChar,
        ActionCode::Delete => Action::Delete,
        ActionCode::Delete2 => Action::Delete2,
        ActionCode::DefineLocal => Action::DefineLocal,
        ActionCode::CallFunction => Action::CallFunction,
        ActionCode::Return => Action::Return,
        ActionCode::Modulo => Action::Modulo,
        ActionCode::NewObject => Action::NewObject,
        ActionCode::DefineLocal2 => Action::DefineLocal2,
        ActionCode::InitArray => Action::InitArray,
        ActionCode::InitObject => Action::InitObject,
        ActionCode::TypeOf => Action::TypeOf,
        ActionCode::Enumerate => Action::Enumerate,
        ActionCode::Add2 => Action::Add2,
        ActionCode::Less2 => Action::Less2,
        ActionCode::Equals2 => Action::Equals2,
        ActionCode::ToNumber => Action::ToNumber,
        ActionCode::ToString => Action::ToString,
        ActionCode::PushDuplicate => Action::PushDuplicate,
        ActionCode::StackSwap => Action::StackSwap,
        ActionCode::GetMember => Action::GetMember,
        ActionCode::SetMember => Action::SetMember,
        ActionCode::Increment => Action::Increment,
        ActionCode::Decrement => Action::Decrement,
        ActionCode::CallMethod => Action::CallMethod,
        ActionCode::NewMethod => Action::NewMethod,
        ActionCode::InstanceOf => Action::InstanceOf,
        ActionCode::Enumerate2 => Action::Enumerate2,
        ActionCode::BitAnd => Action::BitAnd,
        ActionCode::BitOr => Action::BitOr,
        ActionCode::BitXor => Action::BitXor,
        ActionCode::BitLShift => Action::BitLShift,
        ActionCode::BitRShift => Action::BitRShift,
        ActionCode::BitURShift => Action::BitURShift,
        ActionCode::StrictEquals => Action::StrictEquals,
        ActionCode::Greater => Action::Greater,
        ActionCode::StringGreater => Action::StringGreater,
        ActionCode::Extends => Action::Extends,
        ActionCode::Call => Action::Call,

        ActionCode::GotoFrame => Action::GotoFrame(ops.u16()?),
        ActionCode::GetUrl => Action::GetUrl {
            url: ops.cstr()?,
            target: ops.cstr()?,
        },
        ActionCode::StoreRegister => Action::StoreRegister(ops.u8()?),
        ActionCode::ConstantPool => {
            let count = ops.u16()?;
            let mut pool = Vec::with_capacity(count as usize);
            for _ in 0..count {
                pool.push(ops.cstr()?);
            }
            Action::ConstantPool(pool)
        }
        ActionCode::GoToLabel => Action::GoToLabel(ops.cstr()?),
        ActionCode::Push => Action::Push(parse_push(ops)?),
        ActionCode::Jump => Action::Jump(ops.i16()?),
        ActionCode::If => Action::If(ops.i16()?),
        ActionCode::GetUrl2 => Action::GetUrl2 { flags: ops.u8()? },
        ActionCode::GotoFrame2 => {
            let flags = ops.u8()?;
            let scene_bias = if flags & 0x02 != 0 {
                Some(ops.u16()?)
            } else {
                None
            };
            Action::GotoFrame2 {
                play: flags & 0x01 != 0,
                scene_bias,
            }
        }
        ActionCode::With => {
            let size = ops.u16()?;
            Action::With(site.read_body(size)?)
        }
        ActionCode::DefineFunction => {
            let name = ops.cstr()?;
            let count = ops.u16()?;
            let mut params = Vec::with_capacity(count as usize);
            for _ in 0..count {
                params.push(ops.cstr()?);
            }
            let code_size = ops.u16()?;
            let body = site.read_body(code_size)?;
            Action::DefineFunction(FunctionDef { name, params, body })
        }
        ActionCode::DefineFunction2 => {
            let name = ops.cstr()?;
            let count = ops.u16()?;
            let register_count = ops.u8()?;
            let flags = PreloadFlags::new(ops.u16()?);
            let mut params = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let register = ops.u8()?;
                let name = ops.cstr()?;
                params.push(RegisterParam {
                    register: (register != 0).then_some(register),
                    name,
                });
            }
            let code_size = ops.u16()?;
            let body = site.read_body(code_size)?;
            Action::DefineFunction2(FunctionDef2 {
                name,
                register_count,
                flags,
                params,
                body,
            })
        }

        ActionCode::SetTarget2
        | ActionCode::StartDrag
        | ActionCode::EndDrag
        | ActionCode::RandomNumber
        | ActionCode::TargetPath
        | ActionCode::WaitForFrame
        | ActionCode::SetTarget
        | ActionCode::WaitForFrame2
        | ActionCode::Try => Action::NotImplemented { code, length },
    };
    Ok(action)
}

fn parse_push(ops: &mut ByteReader<'_>) -> Result<Vec<PushValue>> {
    let mut values = Vec::new();
    while !ops.is_empty() {
        let at = ops.absolute_position();
        let tag = ops.u8()?;
        let value = match tag {
            0 => PushValue::Str(ops.cstr()?),
            1 => PushValue::Float(ops.f32()?),
            2 => PushValue::Null,
            3 => PushValue::Undefined,
            4 => PushValue::Register(ops.u8()?),
            5 => PushValue::Boolean(ops.u8()? != 0),
            6 => PushValue::Double(ops.f64()?),
            7 => PushValue::Integer(ops.i32()?),
            8 => PushValue::Constant(ops.u8()? as u16),
            9 => PushValue::Constant(ops.u16()?),
            _ => return Err(BytecodeError::InvalidPushType { tag, offset: at }),
        };
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminator_only() {
        let block = decode_actions(&[0]).unwrap();
        assert!(block.is_empty());
        assert_eq!(block.byte_len(), 0);
    }

    #[test]
    fn test_single_byte_actions() {
        let block = decode_actions(&[0x06, 0x07, 0x00]).unwrap();
        let actions: Vec<_> = block.actions().cloned().collect();
        assert_eq!(actions, vec![Action::Play, Action::Stop]);
        assert_eq!(block.get(1).unwrap().offset, 1);
        assert_eq!(block.byte_len(), 2);
    }

    #[test]
    fn test_unknown_long_record_is_skipped() {
        // 0xF0 with 3 operand bytes, then Play
        let block = decode_actions(&[0xF0, 0x03, 0x00, 0xAA, 0xBB, 0xCC, 0x06, 0x00]).unwrap();
        assert_eq!(block.len(), 2);
        assert_eq!(
            block.get(0).unwrap().action,
            Action::NotImplemented {
                code: 0xF0,
                length: 3
            }
        );
        assert_eq!(block.get(0).unwrap().size, 6);
        assert_eq!(block.get(1).unwrap().action, Action::Play);
    }

    #[test]
    fn test_truncated_record() {
        let err = decode_actions(&[0x99, 0x02, 0x00, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            BytecodeError::Truncated {
                code: 0x99,
                declared: 2,
                available: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_operand_overrun_is_fatal() {
        // Jump declares one byte but needs two
        let err = decode_actions(&[0x99, 0x01, 0x00, 0x05, 0x06, 0x00]).unwrap_err();
        assert!(matches!(err, BytecodeError::UnexpectedEnd { .. }));
    }

    #[test]
    fn test_push_values() {
        let mut bytes = vec![0x96, 0x00, 0x00];
        let mut payload = vec![0u8];
        payload.extend_from_slice(b"hi\0");
        payload.extend_from_slice(&[7, 0x2A, 0, 0, 0]);
        payload.extend_from_slice(&[5, 1, 2, 3, 8, 4, 4, 9]);
        bytes[1] = payload.len() as u8;
        bytes.extend_from_slice(&payload);
        bytes.push(0);
        let block = decode_actions(&bytes).unwrap();
        assert_eq!(
            block.get(0).unwrap().action,
            Action::Push(vec![
                PushValue::Str("hi".into()),
                PushValue::Integer(42),
                PushValue::Boolean(true),
                PushValue::Null,
                PushValue::Undefined,
                PushValue::Constant(4),
                PushValue::Register(9),
            ])
        );
    }

    #[test]
    fn test_bad_push_type() {
        let err = decode_actions(&[0x96, 0x01, 0x00, 0x0C, 0x00]).unwrap_err();
        assert!(matches!(err, BytecodeError::InvalidPushType { tag: 12, offset: 3 }));
    }
}
