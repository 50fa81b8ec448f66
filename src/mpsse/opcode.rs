//! MPSSE command opcodes
//!
//! Values follow the FTDI command processor reference (AN 108).
//! Naming: `Pos`/`Neg` is the clock edge, `In` suffix on duplex commands
//! names the edge data is sampled on (output happens on the opposite edge).

/// Operand layout following an opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    /// Opcode only
    None,
    /// Value byte + direction byte
    PinSet,
    /// 3-bit length (len-1)
    BitLength,
    /// 3-bit length (len-1) + data byte
    BitLengthWithData,
    /// 16-bit little-endian length (len-1)
    ByteLength,
    /// 16-bit little-endian length (len-1) + `len` payload bytes
    ByteLengthWithPayload,
    /// Fixed number of operand bytes
    Fixed(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Opcode {
    ClockDataOutMsbPos = 0x10,
    ClockDataOutMsbNeg = 0x11,
    ClockBitsOutMsbPos = 0x12,
    ClockBitsOutMsbNeg = 0x13,
    ClockDataOutLsbPos = 0x18,
    ClockDataOutLsbNeg = 0x19,
    ClockBitsOutLsbPos = 0x1A,
    ClockBitsOutLsbNeg = 0x1B,

    ClockDataInMsbPos = 0x20,
    ClockBitsInMsbPos = 0x22,
    ClockDataInMsbNeg = 0x24,
    ClockBitsInMsbNeg = 0x26,
    ClockDataInLsbPos = 0x28,
    ClockBitsInLsbPos = 0x2A,
    ClockDataInLsbNeg = 0x2C,
    ClockBitsInLsbNeg = 0x2E,

    ClockDataMsbPosIn = 0x31,
    ClockBitsMsbPosIn = 0x33,
    ClockDataMsbNegIn = 0x34,
    ClockBitsMsbNegIn = 0x36,
    ClockDataLsbPosIn = 0x39,
    ClockBitsLsbPosIn = 0x3B,
    ClockDataLsbNegIn = 0x3C,
    ClockBitsLsbNegIn = 0x3E,

    ClockTmsOutPos = 0x4A,
    ClockTmsOutNeg = 0x4B,
    ClockTmsOutPosInPos = 0x6A,
    ClockTmsOutNegInPos = 0x6B,
    ClockTmsOutPosInNeg = 0x6E,
    ClockTmsOutNegInNeg = 0x6F,

    SetDataBitsLow = 0x80,
    GetDataBitsLow = 0x81,
    SetDataBitsHigh = 0x82,
    GetDataBitsHigh = 0x83,

    EnableLoopback = 0x84,
    DisableLoopback = 0x85,
    SetClockDivisor = 0x86,
    SendImmediate = 0x87,
    WaitOnIoHigh = 0x88,
    WaitOnIoLow = 0x89,

    // FT232H, FT2232H & FT4232H only from here on
    DisableClockDivideBy5 = 0x8A,
    EnableClockDivideBy5 = 0x8B,
    Enable3PhaseClocking = 0x8C,
    Disable3PhaseClocking = 0x8D,
    ClockBitsNoData = 0x8E,
    ClockBytesNoData = 0x8F,

    // CPU (host emulation) mode
    ReadShortAddress = 0x90,
    ReadExtendedAddress = 0x91,
    WriteShortAddress = 0x92,
    WriteExtendedAddress = 0x93,

    ClockUntilIoHigh = 0x94,
    ClockUntilIoLow = 0x95,
    EnableAdaptiveClocking = 0x96,
    DisableAdaptiveClocking = 0x97,
    ClockBytesUntilIoHigh = 0x9C,
    ClockBytesUntilIoLow = 0x9D,

    // FT232H only
    SetOpenDrain = 0x9E,
}

impl Opcode {
    const ALL: [Opcode; 57] = [
        Self::ClockDataOutMsbPos, Self::ClockDataOutMsbNeg, Self::ClockBitsOutMsbPos, Self::ClockBitsOutMsbNeg,
        Self::ClockDataOutLsbPos, Self::ClockDataOutLsbNeg, Self::ClockBitsOutLsbPos, Self::ClockBitsOutLsbNeg,
        Self::ClockDataInMsbPos, Self::ClockBitsInMsbPos, Self::ClockDataInMsbNeg, Self::ClockBitsInMsbNeg,
        Self::ClockDataInLsbPos, Self::ClockBitsInLsbPos, Self::ClockDataInLsbNeg, Self::ClockBitsInLsbNeg,
        Self::ClockDataMsbPosIn, Self::ClockBitsMsbPosIn, Self::ClockDataMsbNegIn, Self::ClockBitsMsbNegIn,
        Self::ClockDataLsbPosIn, Self::ClockBitsLsbPosIn, Self::ClockDataLsbNegIn, Self::ClockBitsLsbNegIn,
        Self::ClockTmsOutPos, Self::ClockTmsOutNeg, Self::ClockTmsOutPosInPos, Self::ClockTmsOutNegInPos,
        Self::ClockTmsOutPosInNeg, Self::ClockTmsOutNegInNeg,
        Self::SetDataBitsLow, Self::GetDataBitsLow, Self::SetDataBitsHigh, Self::GetDataBitsHigh,
        Self::EnableLoopback, Self::DisableLoopback, Self::SetClockDivisor, Self::SendImmediate,
        Self::WaitOnIoHigh, Self::WaitOnIoLow,
        Self::DisableClockDivideBy5, Self::EnableClockDivideBy5, Self::Enable3PhaseClocking,
        Self::Disable3PhaseClocking, Self::ClockBitsNoData, Self::ClockBytesNoData,
        Self::ReadShortAddress, Self::ReadExtendedAddress, Self::WriteShortAddress, Self::WriteExtendedAddress,
        Self::ClockUntilIoHigh, Self::ClockUntilIoLow, Self::EnableAdaptiveClocking,
        Self::DisableAdaptiveClocking, Self::ClockBytesUntilIoHigh, Self::ClockBytesUntilIoLow,
        Self::SetOpenDrain,
    ];

    /// Get the opcode byte
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Decode a raw opcode byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.bits() == byte)
    }

    /// Operand layout following this opcode
    pub fn operands(self) -> Operands {
        use Opcode::*;
        match self {
            ClockDataOutMsbPos | ClockDataOutMsbNeg | ClockDataOutLsbPos | ClockDataOutLsbNeg
            | ClockDataMsbPosIn | ClockDataMsbNegIn | ClockDataLsbPosIn | ClockDataLsbNegIn => {
                Operands::ByteLengthWithPayload
            }
            ClockDataInMsbPos | ClockDataInMsbNeg | ClockDataInLsbPos | ClockDataInLsbNeg
            | ClockBytesNoData | ClockBytesUntilIoHigh | ClockBytesUntilIoLow => Operands::ByteLength,
            ClockBitsOutMsbPos | ClockBitsOutMsbNeg | ClockBitsOutLsbPos | ClockBitsOutLsbNeg
            | ClockBitsMsbPosIn | ClockBitsMsbNegIn | ClockBitsLsbPosIn | ClockBitsLsbNegIn
            | ClockTmsOutPos | ClockTmsOutNeg | ClockTmsOutPosInPos | ClockTmsOutNegInPos
            | ClockTmsOutPosInNeg | ClockTmsOutNegInNeg => Operands::BitLengthWithData,
            ClockBitsInMsbPos | ClockBitsInMsbNeg | ClockBitsInLsbPos | ClockBitsInLsbNeg
            | ClockBitsNoData => Operands::BitLength,
            SetDataBitsLow | SetDataBitsHigh | SetOpenDrain => Operands::PinSet,
            SetClockDivisor => Operands::Fixed(2),
            ReadShortAddress => Operands::Fixed(1),
            ReadExtendedAddress | WriteShortAddress => Operands::Fixed(2),
            WriteExtendedAddress => Operands::Fixed(3),
            GetDataBitsLow | GetDataBitsHigh | EnableLoopback | DisableLoopback | SendImmediate
            | WaitOnIoHigh | WaitOnIoLow | DisableClockDivideBy5 | EnableClockDivideBy5
            | Enable3PhaseClocking | Disable3PhaseClocking | ClockUntilIoHigh | ClockUntilIoLow
            | EnableAdaptiveClocking | DisableAdaptiveClocking => Operands::None,
        }
    }

    /// Whether the engine answers this command with response bytes
    pub fn produces_input(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            ClockDataInMsbPos | ClockDataInMsbNeg | ClockDataInLsbPos | ClockDataInLsbNeg
                | ClockBitsInMsbPos | ClockBitsInMsbNeg | ClockBitsInLsbPos | ClockBitsInLsbNeg
                | ClockDataMsbPosIn | ClockDataMsbNegIn | ClockDataLsbPosIn | ClockDataLsbNegIn
                | ClockBitsMsbPosIn | ClockBitsMsbNegIn | ClockBitsLsbPosIn | ClockBitsLsbNegIn
                | ClockTmsOutPosInPos | ClockTmsOutNegInPos | ClockTmsOutPosInNeg | ClockTmsOutNegInNeg
                | GetDataBitsLow | GetDataBitsHigh | ReadShortAddress | ReadExtendedAddress
        )
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

macro_rules! opcode_family {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $opcode:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl From<$name> for Opcode {
            fn from(mode: $name) -> Opcode {
                match mode {
                    $($name::$variant => Opcode::$opcode),+
                }
            }
        }
    };
}

opcode_family! {
    /// Clock whole bytes out, no input
    ClockDataOut {
        MsbPos => ClockDataOutMsbPos,
        MsbNeg => ClockDataOutMsbNeg,
        LsbPos => ClockDataOutLsbPos,
        LsbNeg => ClockDataOutLsbNeg,
    }
}

opcode_family! {
    /// Clock whole bytes in, no output
    ClockDataIn {
        MsbPos => ClockDataInMsbPos,
        MsbNeg => ClockDataInMsbNeg,
        LsbPos => ClockDataInLsbPos,
        LsbNeg => ClockDataInLsbNeg,
    }
}

opcode_family! {
    /// Clock whole bytes in and out simultaneously
    ClockData {
        /// Sample on +ve edge, output on -ve edge
        MsbPosIn => ClockDataMsbPosIn,
        /// Sample on -ve edge, output on +ve edge
        MsbNegIn => ClockDataMsbNegIn,
        LsbPosIn => ClockDataLsbPosIn,
        LsbNegIn => ClockDataLsbNegIn,
    }
}

opcode_family! {
    /// Clock up to 8 bits out
    ClockBitsOut {
        MsbPos => ClockBitsOutMsbPos,
        MsbNeg => ClockBitsOutMsbNeg,
        LsbPos => ClockBitsOutLsbPos,
        LsbNeg => ClockBitsOutLsbNeg,
    }
}

opcode_family! {
    /// Clock up to 8 bits in
    ClockBitsIn {
        MsbPos => ClockBitsInMsbPos,
        MsbNeg => ClockBitsInMsbNeg,
        LsbPos => ClockBitsInLsbPos,
        LsbNeg => ClockBitsInLsbNeg,
    }
}

opcode_family! {
    /// Clock up to 8 bits in and out simultaneously
    ClockBits {
        MsbPosIn => ClockBitsMsbPosIn,
        MsbNegIn => ClockBitsMsbNegIn,
        LsbPosIn => ClockBitsLsbPosIn,
        LsbNegIn => ClockBitsLsbNegIn,
    }
}

opcode_family! {
    /// Clock TMS out
    ClockTmsOut {
        PosEdge => ClockTmsOutPos,
        NegEdge => ClockTmsOutNeg,
    }
}

opcode_family! {
    /// Clock TMS out while reading TDO
    ClockTms {
        OutPosInPos => ClockTmsOutPosInPos,
        OutNegInPos => ClockTmsOutNegInPos,
        OutPosInNeg => ClockTmsOutPosInNeg,
        OutNegInNeg => ClockTmsOutNegInNeg,
    }
}
