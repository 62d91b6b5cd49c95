//! Action codes

use serde::{Deserialize, Serialize};

macro_rules! action_codes {
    ($($(#[$doc:meta])* $name:ident = $byte:literal,)*) => {
        /// AVM1 action codes
        ///
        /// Codes below 0x80 carry no operands; codes at or above 0x80 are
        /// followed by a 16-bit length and that many operand bytes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum ActionCode {
            $($(#[$doc])* $name = $byte,)*
        }

        impl ActionCode {
            /// Convert from raw byte
            pub fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// Get the name of this action code
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }
    };
}

action_codes! {
    // ==================== Timeline ====================
    /// Advance the target clip one frame
    NextFrame = 0x04,
    /// Rewind the target clip one frame
    PreviousFrame = 0x05,
    /// Start playback
    Play = 0x06,
    /// Stop playback
    Stop = 0x07,
    /// Toggle rendering quality
    ToggleQuality = 0x08,
    /// Stop all sounds
    StopSounds = 0x09,

    // ==================== SWF4 arithmetic ====================
    /// Numeric add
    Add = 0x0A,
    /// Subtract
    Subtract = 0x0B,
    /// Multiply
    Multiply = 0x0C,
    /// Divide
    Divide = 0x0D,
    /// Numeric equality
    Equals = 0x0E,
    /// Numeric less-than
    Less = 0x0F,
    /// Logical and
    And = 0x10,
    /// Logical or
    Or = 0x11,
    /// Logical not
    Not = 0x12,

    // ==================== Strings ====================
    /// String equality
    StringEquals = 0x13,
    /// String length
    StringLength = 0x14,
    /// Substring
    StringExtract = 0x15,

    // ==================== Stack / variables ====================
    /// Discard top of stack
    Pop = 0x17,
    /// Truncate to integer
    ToInteger = 0x18,
    /// Read a variable by name
    GetVariable = 0x1C,
    /// Write a variable by name
    SetVariable = 0x1D,
    /// Change the target clip by path on the stack
    SetTarget2 = 0x20,
    /// String concatenation
    StringAdd = 0x21,
    /// Read a clip property
    GetProperty = 0x22,
    /// Write a clip property
    SetProperty = 0x23,
    /// Duplicate a sprite
    CloneSprite = 0x24,
    /// Remove a sprite
    RemoveSprite = 0x25,
    /// Print to the trace log
    Trace = 0x26,
    /// Start dragging a clip
    StartDrag = 0x27,
    /// Stop dragging
    EndDrag = 0x28,
    /// String less-than
    StringLess = 0x29,
    /// Throw the top of stack
    Throw = 0x2A,
    /// Checked cast
    CastOp = 0x2B,
    /// Declare implemented interfaces
    ImplementsOp = 0x2C,
    /// Random integer
    RandomNumber = 0x30,
    /// Multibyte string length
    MbStringLength = 0x31,
    /// First character code
    CharToAscii = 0x32,
    /// Character from code
    AsciiToChar = 0x33,
    /// Milliseconds since start
    GetTime = 0x34,
    /// Multibyte substring
    MbStringExtract = 0x35,
    /// Multibyte character code
    MbCharToAscii = 0x36,
    /// Multibyte character from code
    MbAsciiToChar = 0x37,

    // ==================== SWF5 ====================
    /// Delete a member
    Delete = 0x3A,
    /// Delete a variable
    Delete2 = 0x3B,
    /// Define a local with a value
    DefineLocal = 0x3C,
    /// Call a function by name
    CallFunction = 0x3D,
    /// Return from a function
    Return = 0x3E,
    /// Modulo
    Modulo = 0x3F,
    /// Construct by name
    NewObject = 0x40,
    /// Declare a local
    DefineLocal2 = 0x41,
    /// Array literal
    InitArray = 0x42,
    /// Object literal
    InitObject = 0x43,
    /// typeof
    TypeOf = 0x44,
    /// Path of a clip
    TargetPath = 0x45,
    /// Enumerate variable members
    Enumerate = 0x46,
    /// Typed add
    Add2 = 0x47,
    /// Typed less-than
    Less2 = 0x48,
    /// Abstract equality
    Equals2 = 0x49,
    /// Convert to number
    ToNumber = 0x4A,
    /// Convert to string
    ToString = 0x4B,
    /// Duplicate top of stack
    PushDuplicate = 0x4C,
    /// Swap the two top values
    StackSwap = 0x4D,
    /// Read a member
    GetMember = 0x4E,
    /// Write a member
    SetMember = 0x4F,
    /// Add one
    Increment = 0x50,
    /// Subtract one
    Decrement = 0x51,
    /// Call a method
    CallMethod = 0x52,
    /// Construct by member
    NewMethod = 0x53,
    /// instanceof
    InstanceOf = 0x54,
    /// Enumerate object members
    Enumerate2 = 0x55,
    /// Bitwise and
    BitAnd = 0x60,
    /// Bitwise or
    BitOr = 0x61,
    /// Bitwise xor
    BitXor = 0x62,
    /// Left shift
    BitLShift = 0x63,
    /// Signed right shift
    BitRShift = 0x64,
    /// Unsigned right shift
    BitURShift = 0x65,
    /// Strict equality
    StrictEquals = 0x66,
    /// Typed greater-than
    Greater = 0x67,
    /// String greater-than
    StringGreater = 0x68,
    /// Set up inheritance
    Extends = 0x69,

    // ==================== Records with operands ====================
    /// Jump to a frame number
    GotoFrame = 0x81,
    /// Load a URL
    GetUrl = 0x83,
    /// Copy top of stack into a register
    StoreRegister = 0x87,
    /// Define the constant pool
    ConstantPool = 0x88,
    /// Skip actions unless a frame is loaded
    WaitForFrame = 0x8A,
    /// Change the target clip by name
    SetTarget = 0x8B,
    /// Jump to a frame label
    GoToLabel = 0x8C,
    /// Stack-based WaitForFrame
    WaitForFrame2 = 0x8D,
    /// Register-based function definition
    DefineFunction2 = 0x8E,
    /// try/catch/finally
    Try = 0x8F,
    /// Scope extension
    With = 0x94,
    /// Push values
    Push = 0x96,
    /// Unconditional branch
    Jump = 0x99,
    /// Stack-based URL load
    GetUrl2 = 0x9A,
    /// Function definition
    DefineFunction = 0x9B,
    /// Conditional branch
    If = 0x9D,
    /// Call a frame's actions
    Call = 0x9E,
    /// Stack-based frame jump
    GotoFrame2 = 0x9F,
}

impl ActionCode {
    /// Convert to raw byte
    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Whether records with this code carry a length field
    #[inline]
    pub fn has_length(self) -> bool {
        has_length(self.to_byte())
    }
}

/// Whether a raw action byte is followed by a 16-bit length
#[inline]
pub const fn has_length(byte: u8) -> bool {
    byte >= 0x80
}
