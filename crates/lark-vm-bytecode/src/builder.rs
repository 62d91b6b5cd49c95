//! Raw action stream assembler
//!
//! Produces the wire encoding directly so tests and benches can describe
//! streams, including malformed ones, without hand-counting bytes.

use crate::action::{PreloadFlags, PushValue};
use crate::opcode::ActionCode;

/// Builder for encoded action streams
#[derive(Debug, Clone, Default)]
pub struct ActionStreamBuilder {
    bytes: Vec<u8>,
}

impl ActionStreamBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Emit an operand-less action
    pub fn action(mut self, code: ActionCode) -> Self {
        self.bytes.push(code.to_byte());
        self
    }

    /// Emit a raw record: `code`, and for codes >= 0x80 a length and `payload`
    pub fn record(mut self, code: u8, payload: &[u8]) -> Self {
        self.bytes.push(code);
        if code >= 0x80 {
            self.bytes
                .extend_from_slice(&(payload.len() as u16).to_le_bytes());
            self.bytes.extend_from_slice(payload);
        }
        self
    }

    /// Emit raw bytes verbatim
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Emit `ActionPush`
    pub fn push(self, values: &[PushValue]) -> Self {
        let mut payload = Vec::new();
        for value in values {
            match value {
                PushValue::Str(s) => {
                    payload.push(0);
                    push_cstr(&mut payload, s);
                }
                PushValue::Float(f) => {
                    payload.push(1);
                    payload.extend_from_slice(&f.to_le_bytes());
                }
                PushValue::Null => payload.push(2),
                PushValue::Undefined => payload.push(3),
                PushValue::Register(r) => payload.extend_from_slice(&[4, *r]),
                PushValue::Boolean(b) => payload.extend_from_slice(&[5, *b as u8]),
                PushValue::Double(d) => {
                    payload.push(6);
                    let bits = d.to_bits();
                    payload.extend_from_slice(&((bits >> 32) as u32).to_le_bytes());
                    payload.extend_from_slice(&(bits as u32).to_le_bytes());
                }
                PushValue::Integer(i) => {
                    payload.push(7);
                    payload.extend_from_slice(&i.to_le_bytes());
                }
                PushValue::Constant(c) if *c <= u8::MAX as u16 => {
                    payload.extend_from_slice(&[8, *c as u8]);
                }
                PushValue::Constant(c) => {
                    payload.push(9);
                    payload.extend_from_slice(&c.to_le_bytes());
                }
            }
        }
        self.record(ActionCode::Push.to_byte(), &payload)
    }

    /// Push a string
    pub fn push_str(self, s: &str) -> Self {
        self.push(&[PushValue::Str(s.to_string())])
    }

    /// Push an integer
    pub fn push_int(self, i: i32) -> Self {
        self.push(&[PushValue::Integer(i)])
    }

    /// Emit `ActionJump`
    pub fn jump(self, offset: i16) -> Self {
        self.record(ActionCode::Jump.to_byte(), &offset.to_le_bytes())
    }

    /// Emit `ActionIf`
    pub fn branch_if(self, offset: i16) -> Self {
        self.record(ActionCode::If.to_byte(), &offset.to_le_bytes())
    }

    /// Emit `ActionStoreRegister`
    pub fn store_register(self, register: u8) -> Self {
        self.record(ActionCode::StoreRegister.to_byte(), &[register])
    }

    /// Emit `ActionConstantPool`
    pub fn constant_pool(self, entries: &[&str]) -> Self {
        let mut payload = (entries.len() as u16).to_le_bytes().to_vec();
        for entry in entries {
            push_cstr(&mut payload, entry);
        }
        self.record(ActionCode::ConstantPool.to_byte(), &payload)
    }

    /// Emit `ActionDefineFunction` followed by `body` (without terminator)
    pub fn define_function(self, name: &str, params: &[&str], body: ActionStreamBuilder) -> Self {
        let body = body.into_body();
        let mut payload = Vec::new();
        push_cstr(&mut payload, name);
        payload.extend_from_slice(&(params.len() as u16).to_le_bytes());
        for param in params {
            push_cstr(&mut payload, param);
        }
        payload.extend_from_slice(&(body.len() as u16).to_le_bytes());
        self.record(ActionCode::DefineFunction.to_byte(), &payload)
            .raw(&body)
    }

    /// Emit `ActionDefineFunction2` followed by `body`.
    ///
    /// A register of 0 binds the parameter by name.
    pub fn define_function2(
        self,
        name: &str,
        register_count: u8,
        flags: PreloadFlags,
        params: &[(u8, &str)],
        body: ActionStreamBuilder,
    ) -> Self {
        let body = body.into_body();
        let mut payload = Vec::new();
        push_cstr(&mut payload, name);
        payload.extend_from_slice(&(params.len() as u16).to_le_bytes());
        payload.push(register_count);
        payload.extend_from_slice(&flags.bits().to_le_bytes());
        for (register, param) in params {
            payload.push(*register);
            push_cstr(&mut payload, param);
        }
        payload.extend_from_slice(&(body.len() as u16).to_le_bytes());
        self.record(ActionCode::DefineFunction2.to_byte(), &payload)
            .raw(&body)
    }

    /// Emit `ActionWith` followed by `body`
    pub fn with_body(self, body: ActionStreamBuilder) -> Self {
        let body = body.into_body();
        self.record(ActionCode::With.to_byte(), &(body.len() as u16).to_le_bytes())
            .raw(&body)
    }

    /// Encoded bytes without a terminator, for nested bodies
    pub fn into_body(self) -> Vec<u8> {
        self.bytes
    }

    /// Encoded bytes followed by the zero terminator
    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.push(0);
        self.bytes
    }
}

fn push_cstr(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::decoder::decode_actions;

    #[test]
    fn test_builder_function_body_is_counted_in_record_size() {
        let body = ActionStreamBuilder::new()
            .push_int(1)
            .action(ActionCode::Return);
        let body_len = body.len();
        let bytes = ActionStreamBuilder::new()
            .define_function("f", &["a", "b"], body)
            .action(ActionCode::Play)
            .finish();
        let block = decode_actions(&bytes).unwrap();
        assert_eq!(block.len(), 2);
        let record = block.get(0).unwrap();
        match &record.action {
            Action::DefineFunction(def) => {
                assert_eq!(def.name, "f");
                assert_eq!(def.params, vec!["a", "b"]);
                assert_eq!(def.body.len(), 2);
                assert_eq!(def.body.byte_len() as usize, body_len);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(block.get(1).unwrap().offset, record.end());
    }
}
