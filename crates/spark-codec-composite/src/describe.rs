//! 结构化诊断输出：递归渲染复合解码器的成员名与各成员的子编解码器。
//!
//! 输出形如：
//!
//! ```text
//! Order
//!   id: u64
//!   customer: Customer
//!     name: String
//!     email: String
//!   tags: List<String>
//! ```
//!
//! 子编解码器若具备 [`StructuralDescribe`] 能力即在 `depth + 1` 处递归，否则写出其扁平
//! `label`。不做环检测。

use std::fmt;

use crate::codec::{StructuralDescribe, ValueCodec};
use crate::decoder::CompositeDecoder;

/// 每层缩进。
pub const INDENT: &str = "  ";

/// 写出 `depth` 层缩进。
pub fn write_indent(out: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        out.write_str(INDENT)?;
    }
    Ok(())
}

/// 描述任意子编解码器：能递归的递归，否则回退到扁平文本。
pub fn describe_codec(codec: &dyn ValueCodec, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
    match codec.as_structural() {
        Some(structural) => structural.describe(out, depth),
        None => writeln!(out, "{}", codec.label()),
    }
}

impl<T: 'static> StructuralDescribe for CompositeDecoder<T> {
    fn describe(&self, out: &mut dyn fmt::Write, depth: usize) -> fmt::Result {
        writeln!(out, "{}", self.type_name())?;
        for (member, codec) in self.members().iter().zip(self.codecs()) {
            write_indent(out, depth + 1)?;
            write!(out, "{}: ", member.name())?;
            describe_codec(codec.as_ref(), out, depth + 1)?;
        }
        Ok(())
    }
}

impl<T: 'static> fmt::Display for CompositeDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.describe(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opaque;

    impl ValueCodec for Opaque {
        fn value_type(&self) -> crate::ValueType {
            crate::ValueType::of::<Opaque>()
        }

        fn decode_value(
            &self,
            _cursor: &mut dyn crate::Cursor,
        ) -> Result<crate::DynValue, crate::DecodeError> {
            Err(crate::DecodeError::malformed("opaque"))
        }
    }

    #[test]
    fn flat_codecs_fall_back_to_label() {
        let mut out = String::new();
        describe_codec(&Opaque, &mut out, 3).expect("string sink");
        assert_eq!(out, "Opaque\n");
    }

    #[test]
    fn indent_is_two_spaces_per_level() {
        let mut out = String::new();
        write_indent(&mut out, 2).expect("string sink");
        assert_eq!(out, "    ");
    }
}
