//! Decoded action records

use serde::{Deserialize, Serialize};

use crate::opcode::ActionCode;

/// A value pushed by `ActionPush`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PushValue {
    /// Type 0: NUL-terminated string
    Str(String),
    /// Type 1: single precision float
    Float(f32),
    /// Type 2
    Null,
    /// Type 3
    Undefined,
    /// Type 4: contents of a register
    Register(u8),
    /// Type 5
    Boolean(bool),
    /// Type 6: double (word-swapped on the wire)
    Double(f64),
    /// Type 7: 32-bit integer
    Integer(i32),
    /// Types 8 and 9: constant pool index
    Constant(u16),
}

/// Preload and suppress bits of `DefineFunction2`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreloadFlags(pub u16);

impl PreloadFlags {
    /// Preload `this` into a register
    pub const PRELOAD_THIS: u16 = 0x0001;
    /// Do not create `this`
    pub const SUPPRESS_THIS: u16 = 0x0002;
    /// Preload `arguments` into a register
    pub const PRELOAD_ARGUMENTS: u16 = 0x0004;
    /// Do not create `arguments`
    pub const SUPPRESS_ARGUMENTS: u16 = 0x0008;
    /// Preload `super` into a register
    pub const PRELOAD_SUPER: u16 = 0x0010;
    /// Do not create `super`
    pub const SUPPRESS_SUPER: u16 = 0x0020;
    /// Preload `_root` into a register
    pub const PRELOAD_ROOT: u16 = 0x0040;
    /// Preload `_parent` into a register
    pub const PRELOAD_PARENT: u16 = 0x0080;
    /// Preload `_global` into a register
    pub const PRELOAD_GLOBAL: u16 = 0x0100;

    /// Wrap a raw flag word
    pub const fn new(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw flag word
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    fn has(self, mask: u16) -> bool {
        self.0 & mask != 0
    }

    /// `this` is preloaded and not suppressed
    pub fn preload_this(self) -> bool {
        self.has(Self::PRELOAD_THIS) && !self.suppress_this()
    }

    /// `this` is suppressed
    pub fn suppress_this(self) -> bool {
        self.has(Self::SUPPRESS_THIS)
    }

    /// `arguments` is preloaded and not suppressed
    pub fn preload_arguments(self) -> bool {
        self.has(Self::PRELOAD_ARGUMENTS) && !self.suppress_arguments()
    }

    /// `arguments` is suppressed
    pub fn suppress_arguments(self) -> bool {
        self.has(Self::SUPPRESS_ARGUMENTS)
    }

    /// `super` is preloaded and not suppressed
    pub fn preload_super(self) -> bool {
        self.has(Self::PRELOAD_SUPER) && !self.suppress_super()
    }

    /// `super` is suppressed
    pub fn suppress_super(self) -> bool {
        self.has(Self::SUPPRESS_SUPER)
    }

    /// `_root` is preloaded
    pub fn preload_root(self) -> bool {
        self.has(Self::PRELOAD_ROOT)
    }

    /// `_parent` is preloaded
    pub fn preload_parent(self) -> bool {
        self.has(Self::PRELOAD_PARENT)
    }

    /// `_global` is preloaded
    pub fn preload_global(self) -> bool {
        self.has(Self::PRELOAD_GLOBAL)
    }
}

/// A `DefineFunction2` parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterParam {
    /// Register the argument is stored in; `None` binds it by name
    pub register: Option<u8>,
    /// Parameter name
    pub name: String,
}

/// Body of `ActionDefineFunction`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name, empty for anonymous functions
    pub name: String,
    /// Parameter names in declared order
    pub params: Vec<String>,
    /// Function body
    pub body: ActionBlock,
}

/// Body of `ActionDefineFunction2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef2 {
    /// Function name, empty for anonymous functions
    pub name: String,
    /// Number of registers the body expects
    pub register_count: u8,
    /// Preload/suppress flags
    pub flags: PreloadFlags,
    /// Parameters in declared order
    pub params: Vec<RegisterParam>,
    /// Function body
    pub body: ActionBlock,
}

/// A decoded action.
///
/// Each variant carries only the operands its record encodes. Stack-based
/// actions carry nothing; their inputs are popped at execution time.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    // Timeline
    NextFrame,
    PreviousFrame,
    Play,
    Stop,
    ToggleQuality,
    StopSounds,
    GotoFrame(u16),
    GotoFrame2 {
        play: bool,
        scene_bias: Option<u16>,
    },
    GoToLabel(String),
    GetUrl {
        url: String,
        target: String,
    },
    GetUrl2 {
        flags: u8,
    },
    GetProperty,
    SetProperty,
    CloneSprite,
    RemoveSprite,
    Call,
    Trace,
    GetTime,

    // Stack
    Push(Vec<PushValue>),
    Pop,
    PushDuplicate,
    StackSwap,
    StoreRegister(u8),
    ConstantPool(Vec<String>),

    // Arithmetic
    Add,
    Add2,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Increment,
    Decrement,
    BitAnd,
    BitOr,
    BitXor,
    BitLShift,
    BitRShift,
    BitURShift,

    // Comparison and logic
    Equals,
    Equals2,
    StrictEquals,
    Less,
    Less2,
    Greater,
    And,
    Or,
    Not,

    // Strings
    StringAdd,
    StringEquals,
    StringLess,
    StringGreater,
    StringLength,
    StringExtract,
    MbStringLength,
    MbStringExtract,
    CharToAscii,
    AsciiToChar,
    MbCharToAscii,
    MbAsciiToChar,

    // Coercion and types
    ToNumber,
    ToString,
    ToInteger,
    TypeOf,
    InstanceOf,
    CastOp,
    ImplementsOp,
    Extends,

    // Variables and members
    GetVariable,
    SetVariable,
    DefineLocal,
    DefineLocal2,
    Delete,
    Delete2,
    GetMember,
    SetMember,
    Enumerate,
    Enumerate2,

    // Objects and calls
    NewObject,
    NewMethod,
    InitArray,
    InitObject,
    CallFunction,
    CallMethod,
    Return,
    Throw,

    // Control flow
    Jump(i16),
    If(i16),
    With(ActionBlock),
    DefineFunction(FunctionDef),
    DefineFunction2(FunctionDef2),

    /// A record without a parser. Its operands were skipped.
    NotImplemented {
        code: u8,
        length: u16,
    },
}

impl Action {
    /// Display name, used in logs and disassembly
    pub fn name(&self) -> &'static str {
        match self {
            Action::NotImplemented { code, .. } => ActionCode::from_byte(*code)
                .map(ActionCode::name)
                .unwrap_or("Unknown"),
            Action::NextFrame => "NextFrame",
            Action::PreviousFrame => "PreviousFrame",
            Action::Play => "Play",
            Action::Stop => "Stop",
            Action::ToggleQuality => "ToggleQuality",
            Action::StopSounds => "StopSounds",
            Action::GotoFrame(_) => "GotoFrame",
            Action::GotoFrame2 { .. } => "GotoFrame2",
            Action::GoToLabel(_) => "GoToLabel",
            Action::GetUrl { .. } => "GetUrl",
            Action::GetUrl2 { .. } => "GetUrl2",
            Action::GetProperty => "GetProperty",
            Action::SetProperty => "SetProperty",
            Action::CloneSprite => "CloneSprite",
            Action::RemoveSprite => "RemoveSprite",
            Action::Call => "Call",
            Action::Trace => "Trace",
            Action::GetTime => "GetTime",
            Action::Push(_) => "Push",
            Action::Pop => "Pop",
            Action::PushDuplicate => "PushDuplicate",
            Action::StackSwap => "StackSwap",
            Action::StoreRegister(_) => "StoreRegister",
            Action::ConstantPool(_) => "ConstantPool",
            Action::Add => "Add",
            Action::Add2 => "Add2",
            Action::Subtract => "Subtract",
            Action::Multiply => "Multiply",
            Action::Divide => "Divide",
            Action::Modulo => "Modulo",
            Action::Increment => "Increment",
            Action::Decrement => "Decrement",
            Action::BitAnd => "BitAnd",
            Action::BitOr => "BitOr",
            Action::BitXor => "BitXor",
            Action::BitLShift => "BitLShift",
            Action::BitRShift => "BitRShift",
            Action::BitURShift => "BitURShift",
            Action::Equals => "Equals",
            Action::Equals2 => "Equals2",
            Action::StrictEquals => "StrictEquals",
            Action::Less => "Less",
            Action::Less2 => "Less2",
            Action::Greater => "Greater",
            Action::And => "And",
            Action::Or => "Or",
            Action::Not => "Not",
            Action::StringAdd => "StringAdd",
            Action::StringEquals => "StringEquals",
            Action::StringLess => "StringLess",
            Action::StringGreater => "StringGreater",
            Action::StringLength => "StringLength",
            Action::StringExtract => "StringExtract",
            Action::MbStringLength => "MbStringLength",
            Action::MbStringExtract => "MbStringExtract",
            Action::CharToAscii => "CharToAscii",
            Action::AsciiToChar => "AsciiToChar",
            Action::MbCharToAscii => "MbCharToAscii",
            Action::MbAsciiToChar => "MbAsciiToChar",
            Action::ToNumber => "ToNumber",
            Action::ToString => "ToString",
            Action::ToInteger => "ToInteger",
            Action::TypeOf => "TypeOf",
            Action::InstanceOf => "InstanceOf",
            Action::CastOp => "CastOp",
            Action::ImplementsOp => "ImplementsOp",
            Action::Extends => "Extends",
            Action::GetVariable => "GetVariable",
            Action::SetVariable => "SetVariable",
            Action::DefineLocal => "DefineLocal",
            Action::DefineLocal2 => "DefineLocal2",
            Action::Delete => "Delete",
            Action::Delete2 => "Delete2",
            Action::GetMember => "GetMember",
            Action::SetMember => "SetMember",
            Action::Enumerate => "Enumerate",
            Action::Enumerate2 => "Enumerate2",
            Action::NewObject => "NewObject",
            Action::NewMethod => "NewMethod",
            Action::InitArray => "InitArray",
            Action::InitObject => "InitObject",
            Action::CallFunction => "CallFunction",
            Action::CallMethod => "CallMethod",
            Action::Return => "Return",
            Action::Throw => "Throw",
            Action::Jump(_) => "Jump",
            Action::If(_) => "If",
            Action::With(_) => "With",
            Action::DefineFunction(_) => "DefineFunction",
            Action::DefineFunction2(_) => "DefineFunction2",
        }
    }
}

/// A decoded action together with its position in the encoded stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Byte offset of the record header within its block
    pub offset: u32,
    /// Encoded size: header, operands, and any nested body that follows
    pub size: u32,
    /// The decoded action
    pub action: Action,
}

impl ActionRecord {
    /// Offset of the first byte after this record
    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.size
    }
}

/// Where a branch lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    /// Continue at this record index
    Record(usize),
    /// At or past the end of the block
    End,
    /// Before the block start or between record boundaries
    Invalid(i64),
}

/// An ordered sequence of records decoded from one stream or nested body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionBlock {
    records: Vec<ActionRecord>,
    byte_len: u32,
}

impl ActionBlock {
    /// Build a block from records and the byte length of the encoded span
    pub fn new(records: Vec<ActionRecord>, byte_len: u32) -> Self {
        Self { records, byte_len }
    }

    /// Empty block
    pub fn empty() -> Self {
        Self::default()
    }

    /// Records in stream order
    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    /// Record at `index`
    pub fn get(&self, index: usize) -> Option<&ActionRecord> {
        self.records.get(index)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the block has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encoded size of the block, excluding any terminator
    pub fn byte_len(&self) -> u32 {
        self.byte_len
    }

    /// Iterate over the decoded actions
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.records.iter().map(|r| &r.action)
    }

    /// Resolve a branch taken by the record at `index`.
    ///
    /// The offset is relative to the end of the branching record.
    pub fn resolve_jump(&self, index: usize, offset: i16) -> JumpTarget {
        let Some(record) = self.records.get(index) else {
            return JumpTarget::End;
        };
        let target = record.end() as i64 + offset as i64;
        if target < 0 {
            return JumpTarget::Invalid(target);
        }
        if target >= self.byte_len as i64 {
            return JumpTarget::End;
        }
        match self
            .records
            .binary_search_by_key(&(target as u32), |r| r.offset)
        {
            Ok(i) => JumpTarget::Record(i),
            Err(_) => JumpTarget::Invalid(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> ActionBlock {
        // Jump(3 bytes hdr + 2 operand) @0, Pop @5, Play @6, Stop @7
        ActionBlock::new(
            vec![
                ActionRecord {
                    offset: 0,
                    size: 5,
                    action: Action::Jump(1),
                },
                ActionRecord {
                    offset: 5,
                    size: 1,
                    action: Action::Pop,
                },
                ActionRecord {
                    offset: 6,
                    size: 1,
                    action: Action::Play,
                },
                ActionRecord {
                    offset: 7,
                    size: 1,
                    action: Action::Stop,
                },
            ],
            8,
        )
    }

    #[test]
    fn test_resolve_forward_and_backward() {
        let b = block();
        assert_eq!(b.resolve_jump(0, 0), JumpTarget::Record(1));
        assert_eq!(b.resolve_jump(0, 1), JumpTarget::Record(2));
        assert_eq!(b.resolve_jump(2, -7), JumpTarget::Record(0));
    }

    #[test]
    fn test_resolve_out_of_block() {
        let b = block();
        assert_eq!(b.resolve_jump(0, 3), JumpTarget::End);
        assert_eq!(b.resolve_jump(0, 100), JumpTarget::End);
        assert_eq!(b.resolve_jump(0, -6), JumpTarget::Invalid(-1));
        assert_eq!(b.resolve_jump(0, -2), JumpTarget::Invalid(3));
    }

    #[test]
    fn test_suppress_overrides_preload() {
        let flags = PreloadFlags::new(
            PreloadFlags::PRELOAD_THIS | PreloadFlags::SUPPRESS_THIS | PreloadFlags::PRELOAD_GLOBAL,
        );
        assert!(!flags.preload_this());
        assert!(flags.suppress_this());
        assert!(flags.preload_global());
        assert!(!flags.preload_root());
    }

    #[test]
    fn test_not_implemented_name() {
        let action = Action::NotImplemented {
            code: 0x8F,
            length: 4,
        };
        assert_eq!(action.name(), "Try");
        let unknown = Action::NotImplemented {
            code: 0xF0,
            length: 0,
        };
        assert_eq!(unknown.name(), "Unknown");
    }
}
