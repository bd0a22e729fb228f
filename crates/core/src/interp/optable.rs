//! Static operator table.
//!
//! Entries are sorted by operator name in byte order so that [`find_op`]
//! can binary search them.

use crate::model::PDFObject;

/// Expected dynamic type of one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Int,
    Num,
    String,
    Name,
    Array,
    /// Dictionary or name.
    Props,
    /// Number or name.
    Scn,
}

impl ArgType {
    /// True when `arg` satisfies this type.
    pub fn check(self, arg: &PDFObject) -> bool {
        match self {
            Self::Int => matches!(arg, PDFObject::Int(_)),
            Self::Num => arg.is_num(),
            Self::String => matches!(arg, PDFObject::String(_)),
            Self::Name => matches!(arg, PDFObject::Name(_)),
            Self::Array => matches!(arg, PDFObject::Array(_)),
            Self::Props => matches!(arg, PDFObject::Dict(_) | PDFObject::Name(_)),
            Self::Scn => arg.is_num() || matches!(arg, PDFObject::Name(_)),
        }
    }
}

/// Handler selected by an operator name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    MoveSetShowText,
    MoveShowText,
    FillStroke,
    EoFillStroke,
    BeginMarkedContent,
    BeginImage,
    BeginText,
    BeginIgnoreUndef,
    SetStrokeColorSpace,
    MarkPoint,
    XObject,
    EndImage,
    EndMarkedContent,
    EndText,
    EndIgnoreUndef,
    Fill,
    SetStrokeGray,
    ImageData,
    SetLineCap,
    SetStrokeCmykColor,
    SetMiterLimit,
    Restore,
    SetStrokeRgbColor,
    Stroke,
    SetStrokeColor,
    SetStrokeColorN,
    TextNextLine,
    TextMoveSet,
    ShowSpaceText,
    SetTextLeading,
    SetCharSpacing,
    TextMove,
    SetFont,
    ShowText,
    SetTextMatrix,
    SetTextRender,
    SetTextRise,
    SetWordSpacing,
    SetHorizScaling,
    Clip,
    EoClip,
    CloseFillStroke,
    CloseEoFillStroke,
    CurveTo,
    Concat,
    SetFillColorSpace,
    SetDash,
    SetCharWidth,
    SetCacheDevice,
    EoFill,
    SetFillGray,
    SetExtGState,
    ClosePath,
    SetFlat,
    SetLineJoin,
    SetFillCmykColor,
    LineTo,
    MoveTo,
    EndPath,
    Save,
    Rectangle,
    SetFillRgbColor,
    SetRenderingIntent,
    CloseStroke,
    SetFillColor,
    SetFillColorN,
    ShFill,
    CurveTo1,
    SetLineWidth,
    CurveTo2,
}

/// One row of the operator table.
#[derive(Debug)]
pub struct OpSpec {
    pub name: &'static str,
    /// Fixed arity when positive or zero; `-n` accepts at most `n` operands.
    pub num_args: i32,
    pub tchk: &'static [ArgType],
    pub op: Op,
}

/// Upper bound on operands of any operator.
pub const MAX_ARGS: usize = 33;

use ArgType::{Array, Int, Name, Num, Props, Scn, String as Str};

const NUM1: &[ArgType] = &[Num];
const NUM2: &[ArgType] = &[Num, Num];
const NUM3: &[ArgType] = &[Num, Num, Num];
const NUM4: &[ArgType] = &[Num, Num, Num, Num];
const NUM6: &[ArgType] = &[Num, Num, Num, Num, Num, Num];
const SCN: &[ArgType] = &[Scn; MAX_ARGS];

macro_rules! op {
    ($name:literal, $n:expr, $tchk:expr, $op:ident) => {
        OpSpec {
            name: $name,
            num_args: $n,
            tchk: $tchk,
            op: Op::$op,
        }
    };
}

/// Every operator understood by the interpreter.
pub static OP_TABLE: &[OpSpec] = &[
    op!("\"", 3, &[Num, Num, Str], MoveSetShowText),
    op!("'", 1, &[Str], MoveShowText),
    op!("B", 0, &[], FillStroke),
    op!("B*", 0, &[], EoFillStroke),
    op!("BDC", 2, &[Name, Props], BeginMarkedContent),
    op!("BI", 0, &[], BeginImage),
    op!("BMC", 1, &[Name], BeginMarkedContent),
    op!("BT", 0, &[], BeginText),
    op!("BX", 0, &[], BeginIgnoreUndef),
    op!("CS", 1, &[Name], SetStrokeColorSpace),
    op!("DP", 2, &[Name, Props], MarkPoint),
    op!("Do", 1, &[Name], XObject),
    op!("EI", 0, &[], EndImage),
    op!("EMC", 0, &[], EndMarkedContent),
    op!("ET", 0, &[], EndText),
    op!("EX", 0, &[], EndIgnoreUndef),
    op!("F", 0, &[], Fill),
    op!("G", 1, NUM1, SetStrokeGray),
    op!("ID", 0, &[], ImageData),
    op!("J", 1, &[Int], SetLineCap),
    op!("K", 4, NUM4, SetStrokeCmykColor),
    op!("M", 1, NUM1, SetMiterLimit),
    op!("MP", 1, &[Name], MarkPoint),
    op!("Q", 0, &[], Restore),
    op!("RG", 3, NUM3, SetStrokeRgbColor),
    op!("S", 0, &[], Stroke),
    op!("SC", -4, NUM4, SetStrokeColor),
    op!("SCN", -33, SCN, SetStrokeColorN),
    op!("T*", 0, &[], TextNextLine),
    op!("TD", 2, NUM2, TextMoveSet),
    op!("TJ", 1, &[Array], ShowSpaceText),
    op!("TL", 1, NUM1, SetTextLeading),
    op!("Tc", 1, NUM1, SetCharSpacing),
    op!("Td", 2, NUM2, TextMove),
    op!("Tf", 2, &[Name, Num], SetFont),
    op!("Tj", 1, &[Str], ShowText),
    op!("Tm", 6, NUM6, SetTextMatrix),
    op!("Tr", 1, &[Int], SetTextRender),
    op!("Ts", 1, NUM1, SetTextRise),
    op!("Tw", 1, NUM1, SetWordSpacing),
    op!("Tz", 1, NUM1, SetHorizScaling),
    op!("W", 0, &[], Clip),
    op!("W*", 0, &[], EoClip),
    op!("b", 0, &[], CloseFillStroke),
    op!("b*", 0, &[], CloseEoFillStroke),
    op!("c", 6, NUM6, CurveTo),
    op!("cm", 6, NUM6, Concat),
    op!("cs", 1, &[Name], SetFillColorSpace),
    op!("d", 2, &[Array, Num], SetDash),
    op!("d0", 2, NUM2, SetCharWidth),
    op!("d1", 6, NUM6, SetCacheDevice),
    op!("f", 0, &[], Fill),
    op!("f*", 0, &[], EoFill),
    op!("g", 1, NUM1, SetFillGray),
    op!("gs", 1, &[Name], SetExtGState),
    op!("h", 0, &[], ClosePath),
    op!("i", 1, NUM1, SetFlat),
    op!("j", 1, &[Int], SetLineJoin),
    op!("k", 4, NUM4, SetFillCmykColor),
    op!("l", 2, NUM2, LineTo),
    op!("m", 2, NUM2, MoveTo),
    op!("n", 0, &[], EndPath),
    op!("q", 0, &[], Save),
    op!("re", 4, NUM4, Rectangle),
    op!("rg", 3, NUM3, SetFillRgbColor),
    op!("ri", 1, &[Name], SetRenderingIntent),
    op!("s", 0, &[], CloseStroke),
    op!("sc", -4, NUM4, SetFillColor),
    op!("scn", -33, SCN, SetFillColorN),
    op!("sh", 1, &[Name], ShFill),
    op!("v", 4, NUM4, CurveTo1),
    op!("w", 1, NUM1, SetLineWidth),
    op!("y", 4, NUM4, CurveTo2),
];

/// Looks up an operator by name.
pub fn find_op(name: &str) -> Option<&'static OpSpec> {
    OP_TABLE
        .binary_search_by(|spec| spec.name.as_bytes().cmp(name.as_bytes()))
        .ok()
        .map(|i| &OP_TABLE[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        for pair in OP_TABLE.windows(2) {
            assert!(
                pair[0].name.as_bytes() < pair[1].name.as_bytes(),
                "{:?} must sort before {:?}",
                pair[0].name,
                pair[1].name
            );
        }
        assert_eq!(OP_TABLE.len(), 73);
    }

    #[test]
    fn test_find_every_entry() {
        for spec in OP_TABLE {
            let found = find_op(spec.name).unwrap();
            assert_eq!(found.name, spec.name);
        }
        assert!(find_op("BDCX").is_none());
        assert!(find_op("").is_none());
    }

    #[test]
    fn test_type_lists_cover_arity() {
        for spec in OP_TABLE {
            assert!(
                spec.tchk.len() >= spec.num_args.unsigned_abs() as usize,
                "{} declares fewer types than operands",
                spec.name
            );
        }
    }

    #[test]
    fn test_arg_checks() {
        assert!(ArgType::Num.check(&PDFObject::Int(1)));
        assert!(ArgType::Num.check(&PDFObject::Real(1.5)));
        assert!(!ArgType::Int.check(&PDFObject::Real(1.5)));
        assert!(ArgType::Props.check(&PDFObject::name("P0")));
        assert!(ArgType::Scn.check(&PDFObject::name("P0")));
        assert!(!ArgType::Scn.check(&PDFObject::String(b"x".to_vec())));
        assert!(ArgType::String.check(&PDFObject::String(Vec::new())));
        assert!(!ArgType::Name.check(&PDFObject::String(b"P0".to_vec())));
        assert!(ArgType::Array.check(&PDFObject::Array(Vec::new())));
        assert!(!ArgType::Array.check(&PDFObject::Null));
    }
}
