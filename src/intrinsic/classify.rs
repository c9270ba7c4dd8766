//! Name-based recognition of indirect-call intrinsics.

use serde::Serialize;

pub const CALL_INDIRECT_PREFIX: &str = "CallIndirect";
pub const TAIL_CALL_INDIRECT_PREFIX: &str = "TailCallIndirect";

/// What kind of intrinsic a declaration denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntrinsicKind {
    /// Not an indirect-call intrinsic; lowered by the general pipeline.
    None,
    DirectIndirectCall,
    TailIndirectCall,
}

impl IntrinsicKind {
    pub fn is_intrinsic(self) -> bool {
        self != IntrinsicKind::None
    }

    pub fn is_tail(self) -> bool {
        self == IntrinsicKind::TailIndirectCall
    }
}

/// Calling convention of the call site, as written into the signature header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum CallingConvention {
    #[default]
    Default,
    C,
    Standard,
    FastCall,
    HasThis,
    ThisCall,
}

/// Suffixes checked in order; the first match wins.
const CONVENTION_SUFFIXES: [(&str, CallingConvention); 5] = [
    ("CDecl", CallingConvention::C),
    ("StdCall", CallingConvention::Standard),
    ("FastCall", CallingConvention::FastCall),
    ("HasThis", CallingConvention::HasThis),
    ("ThisCall", CallingConvention::ThisCall),
];

impl CallingConvention {
    /// Signature header byte (ECMA-335 II.23.2.3).
    pub fn header_byte(self) -> u8 {
        match self {
            CallingConvention::Default => 0x00,
            CallingConvention::C => 0x01,
            CallingConvention::Standard => 0x02,
            CallingConvention::ThisCall => 0x03,
            CallingConvention::FastCall => 0x04,
            CallingConvention::HasThis => 0x20,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CallingConvention::Default => "default",
            CallingConvention::C => "cdecl",
            CallingConvention::Standard => "stdcall",
            CallingConvention::FastCall => "fastcall",
            CallingConvention::HasThis => "hasthis",
            CallingConvention::ThisCall => "thiscall",
        }
    }
}

/// Classify a declaration by name.
pub fn classify(name: &str) -> IntrinsicKind {
    if name.starts_with(CALL_INDIRECT_PREFIX) {
        IntrinsicKind::DirectIndirectCall
    } else if name.starts_with(TAIL_CALL_INDIRECT_PREFIX) {
        IntrinsicKind::TailIndirectCall
    } else {
        IntrinsicKind::None
    }
}

/// Calling convention denoted by the name's suffix. Unrecognized suffixes
/// fall back to `Default`.
pub fn convention_of(name: &str) -> CallingConvention {
    CONVENTION_SUFFIXES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map(|&(_, convention)| convention)
        .unwrap_or(CallingConvention::Default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(classify("CallIndirect"), IntrinsicKind::DirectIndirectCall);
        assert_eq!(classify("CallIndirectStdCall"), IntrinsicKind::DirectIndirectCall);
        assert_eq!(classify("TailCallIndirect"), IntrinsicKind::TailIndirectCall);
        assert_eq!(classify("TailCallIndirectCDecl"), IntrinsicKind::TailIndirectCall);
    }

    #[test]
    fn test_classify_misses() {
        for name in ["Foo", "", "callIndirect", "MyCallIndirect", "TailCall", "CallIndirec"] {
            assert_eq!(classify(name), IntrinsicKind::None, "{}", name);
        }
        assert!(!IntrinsicKind::None.is_intrinsic());
    }

    #[test]
    fn test_conventions() {
        assert_eq!(convention_of("CallIndirectCDecl"), CallingConvention::C);
        assert_eq!(convention_of("CallIndirectStdCall"), CallingConvention::Standard);
        assert_eq!(convention_of("CallIndirectFastCall"), CallingConvention::FastCall);
        assert_eq!(convention_of("CallIndirectHasThis"), CallingConvention::HasThis);
        assert_eq!(convention_of("CallIndirectThisCall"), CallingConvention::ThisCall);
        assert_eq!(convention_of("CallIndirect"), CallingConvention::Default);
        assert_eq!(convention_of("CallIndirectStdcall"), CallingConvention::Default);
    }

    #[test]
    fn test_convention_is_independent_of_kind() {
        assert_eq!(convention_of("FooStdCall"), CallingConvention::Standard);
    }

    #[test]
    fn test_suffix_priority() {
        // Only one suffix can be a true suffix of a name, so use names whose
        // tails overlap with the other checks.
        assert_eq!(convention_of("CDecl"), CallingConvention::C);
        assert_eq!(convention_of("CallIndirectStdCallCDecl"), CallingConvention::C);
        assert_eq!(convention_of("CallIndirectThisCallHasThis"), CallingConvention::HasThis);

        let order: Vec<_> = CONVENTION_SUFFIXES.iter().map(|(suffix, _)| *suffix).collect();
        assert_eq!(order, ["CDecl", "StdCall", "FastCall", "HasThis", "ThisCall"]);
    }

    #[test]
    fn test_header_bytes() {
        assert_eq!(CallingConvention::Default.header_byte(), 0x00);
        assert_eq!(CallingConvention::C.header_byte(), 0x01);
        assert_eq!(CallingConvention::Standard.header_byte(), 0x02);
        assert_eq!(CallingConvention::ThisCall.header_byte(), 0x03);
        assert_eq!(CallingConvention::FastCall.header_byte(), 0x04);
        assert_eq!(CallingConvention::HasThis.header_byte(), 0x20);
    }
}
